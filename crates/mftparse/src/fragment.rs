//! Recovery of well-formed XML fragments embedded in free-form text
//!
//! Fragments are located with a two-pointer scan over tag boundaries: an
//! opening boundary `<tag` (followed by whitespace, `>` or `/`) is paired with
//! the next `</tag>` after it. Same-named elements never nest in the documents
//! this targets, so the first closing boundary always ends the candidate.
//! Every candidate must parse on its own; the rest are dropped.

use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::xml::{Config, Parser};

/// Tags recovered when the caller names none
pub const DEFAULT_TAGS: [&str; 3] = ["project", "resource", "webuser"];

/// Extract every well-formed `<tag ...>...</tag>` fragment from `text`
pub fn extract_fragments(text: &str, tag: &str) -> Vec<String> {
    extract_fragments_with_config(text, tag, Config::default())
}

/// Extract fragments, validating each candidate under `config`
#[instrument(skip(text, config), fields(bytes = text.len()))]
pub fn extract_fragments_with_config(text: &str, tag: &str, config: Config) -> Vec<String> {
    if !is_tag_name(tag) {
        debug!("not a usable tag name");
        return Vec::new();
    }
    let scan = scan(text, tag, config);
    debug!(
        found = scan.fragments.len(),
        close_searches = scan.close_searches,
        "recovered fragments"
    );
    scan.fragments
}

struct Scan {
    fragments: Vec<String>,
    close_searches: usize,
}

fn scan(text: &str, tag: &str, config: Config) -> Scan {
    let open = format!("<{tag}");
    let mut closes = Closes::new(text, tag);
    let mut fragments = Vec::new();
    let mut from = 0;

    while let Some(start) = find_opening(text, from, &open) {
        let body = start + open.len();
        let Some(end) = closes.after(body) else {
            // no closing boundary after this opening, so none after later ones either
            break;
        };

        let candidate = text.get(start..end).unwrap_or_default();
        match Parser::with_config(candidate.as_bytes(), config).parse() {
            Ok(_) => {
                fragments.push(candidate.to_string());
                from = end;
            }
            Err(err) => {
                debug!(offset = start, error = %err, "dropping candidate fragment");
                // retry from the next opening inside the rejected span
                from = body;
            }
        }
    }

    Scan {
        fragments,
        close_searches: closes.searches,
    }
}

/// Closing boundaries of one tag, each located once
///
/// Openings that fail to parse are retried from inside the rejected span, so
/// many openings share the same first closing boundary.
struct Closes<'t> {
    text: &'t str,
    close: String,
    /// End offset of the last boundary found
    next: Option<usize>,
    searches: usize,
}

impl<'t> Closes<'t> {
    fn new(text: &'t str, tag: &str) -> Self {
        Self {
            text,
            close: format!("</{tag}>"),
            next: None,
            searches: 0,
        }
    }

    /// End offset of the first closing boundary starting at or after `from`
    fn after(&mut self, from: usize) -> Option<usize> {
        if let Some(end) = self.next {
            if end - self.close.len() >= from {
                return Some(end);
            }
        }
        self.searches += 1;
        let end = from + self.text.get(from..)?.find(&self.close)? + self.close.len();
        self.next = Some(end);
        Some(end)
    }
}

/// Byte offset of the next opening boundary at or after `from`
fn find_opening(text: &str, mut from: usize, open: &str) -> Option<usize> {
    loop {
        let start = from + text.get(from..)?.find(open)?;
        let after = text.as_bytes().get(start + open.len()).copied()?;
        if matches!(after, b' ' | b'\t' | b'\r' | b'\n' | b'>' | b'/') {
            return Some(start);
        }
        from = start + 1;
    }
}

fn is_tag_name(tag: &str) -> bool {
    !tag.is_empty()
        && !tag
            .bytes()
            .any(|b| b.is_ascii_whitespace() || matches!(b, b'<' | b'>' | b'/' | b'"' | b'\''))
}

/// File name for the `index`-th (1-based) fragment of `tag`
pub fn fragment_file_name(tag: &str, index: usize) -> String {
    format!("{tag}_{index}.xml")
}

/// Fragments grouped by tag, in the order the tags were requested
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FragmentSet {
    groups: IndexMap<String, Vec<String>>,
}

/// A fragment together with its deterministic file name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NamedFragment<'a> {
    pub tag: &'a str,
    /// 1-based position within the tag group
    pub index: usize,
    pub xml: &'a str,
}

impl NamedFragment<'_> {
    pub fn file_name(&self) -> String {
        fragment_file_name(self.tag, self.index)
    }
}

impl FragmentSet {
    /// Fragments recovered for `tag`, empty if the tag was not requested
    pub fn get(&self, tag: &str) -> &[String] {
        self.groups.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    /// Requested tags with their fragments
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(tag, fragments)| (tag.as_str(), fragments.as_slice()))
    }

    /// Every fragment with its file name, grouped by tag
    pub fn named(&self) -> impl Iterator<Item = NamedFragment<'_>> {
        self.groups.iter().flat_map(|(tag, fragments)| {
            fragments
                .iter()
                .enumerate()
                .map(move |(i, xml)| NamedFragment {
                    tag: tag.as_str(),
                    index: i + 1,
                    xml: xml.as_str(),
                })
        })
    }

    /// Total number of fragments across all tags
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run fragment recovery once per tag
pub fn collect_fragments<S: AsRef<str>>(text: &str, tags: &[S]) -> FragmentSet {
    collect_fragments_with_config(text, tags, Config::default())
}

pub fn collect_fragments_with_config<S: AsRef<str>>(
    text: &str,
    tags: &[S],
    config: Config,
) -> FragmentSet {
    let mut groups = IndexMap::new();
    for tag in tags {
        let tag = tag.as_ref();
        if !groups.contains_key(tag) {
            groups.insert(
                tag.to_string(),
                extract_fragments_with_config(text, tag, config),
            );
        }
    }
    FragmentSet { groups }
}
