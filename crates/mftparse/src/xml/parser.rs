//! Recursive-descent XML parser
//!
//! Accepts exactly one document: an optional BOM, a prolog of whitespace,
//! comments, processing instructions and at most one DOCTYPE, a single root
//! element, then trailing comments or processing instructions. Anything else
//! is malformed input.

use indexmap::IndexMap;

use crate::cursor::Cursor;
use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::xml::model::{Content, Document, Element};

const BOM: &[u8] = b"\xEF\xBB\xBF";
const CDATA_OPEN: &[u8] = b"<![CDATA[";

/// Parser limits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_size: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    pub const fn unlimited() -> Self {
        Self::new(0, 0)
    }

    pub const fn new(max_depth: u16, max_size: usize) -> Self {
        Self {
            max_depth,
            max_size,
        }
    }
}

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
    /// Internal general entities declared in the DOCTYPE
    entities: IndexMap<String, String>,
}

/// Where a run of element content stopped
enum Stop {
    /// At the `<` of a child start tag
    Child,
    /// After the element's own end tag
    End,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    pub fn with_config(input: &'a [u8], config: Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
            entities: IndexMap::new(),
        }
    }

    /// Parse the whole input as one document
    pub fn parse(&mut self) -> Result<Document> {
        self.check_size()?;
        self.cursor.eat(BOM);

        self.skip_misc(true)?;
        match self.cursor.current() {
            Some(b'<') => {}
            Some(_) => return Err(self.error_here("text before root element")),
            None => return Err(self.error_here("missing root element")),
        }
        let root = self.parse_element()?;

        self.skip_misc(false)?;
        if !self.cursor.is_eof() {
            return Err(self.error_here("content after root element"));
        }
        Ok(Document { root })
    }

    fn check_size(&self) -> Result<()> {
        let max = self.config.max_size;
        if max > 0 && self.cursor.rest().len() > max {
            return Err(Error::new(ErrorKind::MaxSizeExceeded { max }, Span::empty()));
        }
        Ok(())
    }

    fn skip_misc(&mut self, mut doctype_allowed: bool) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if doctype_allowed && self.cursor.starts_with(b"<!DOCTYPE") {
                self.skip_doctype()?;
                doctype_allowed = false;
            } else {
                return Ok(());
            }
        }
    }

    /// Root element and its subtree
    ///
    /// Open elements live on an explicit stack, so nesting depth is bounded by
    /// memory and `max_depth`, not by the call stack.
    fn parse_element(&mut self) -> Result<Element> {
        let mut open: Vec<(Element, Pos)> = Vec::new();
        let mut at_start_tag = true;
        loop {
            let finished = if at_start_tag {
                let at = self.cursor.position();
                let (element, empty) = self.parse_start_tag(open.len() + 1)?;
                if empty {
                    Some(element)
                } else {
                    open.push((element, at));
                    None
                }
            } else {
                None
            };

            let finished = match finished {
                Some(element) => Some(element),
                None => {
                    let Some((element, at)) = open.last_mut() else {
                        return Err(self.error_here("missing root element"));
                    };
                    match self.parse_content(&mut element.children, &element.name, *at)? {
                        Stop::Child => None,
                        Stop::End => open.pop().map(|(element, _)| element),
                    }
                }
            };

            at_start_tag = finished.is_none();
            if let Some(element) = finished {
                match open.last_mut() {
                    Some((parent, _)) => parent.children.push(Content::Element(element)),
                    None => return Ok(element),
                }
            }
        }
    }

    /// Start tag at `depth`; the flag is set for `<name/>`
    fn parse_start_tag(&mut self, depth: usize) -> Result<(Element, bool)> {
        self.expect(b"<")?;
        self.check_depth(depth)?;

        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;
        let empty = self.cursor.eat(b"/>");
        if !empty {
            self.expect(b">")?;
        }
        let element = Element {
            name,
            attributes,
            children: Vec::new(),
        };
        Ok((element, empty))
    }

    /// Content of the element `name` up to its end tag or the next child
    fn parse_content(
        &mut self,
        children: &mut Vec<Content>,
        name: &str,
        open: Pos,
    ) -> Result<Stop> {
        loop {
            if self.cursor.is_eof() {
                return Err(Error::malformed(
                    open,
                    format!("unterminated element <{name}>"),
                ));
            }

            if self.cursor.eat(b"</") {
                let close = self.parse_name()?;
                if close != name {
                    return Err(self.error_here(&format!(
                        "mismatched closing tag: expected </{name}>, found </{close}>"
                    )));
                }
                self.cursor.skip_whitespace();
                self.expect(b">")?;
                return Ok(Stop::End);
            }

            if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.cursor.starts_with(CDATA_OPEN) {
                let text = self.parse_cdata()?;
                push_text(children, text);
            } else if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!") {
                return Err(self.error_here("unexpected markup declaration"));
            } else if self.cursor.current() == Some(b'<') {
                return Ok(Stop::Child);
            } else {
                let text = self.parse_text()?;
                if !text.trim().is_empty() {
                    push_text(children, text);
                }
            }
        }
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        let max = self.config.max_depth;
        if max > 0 && depth > usize::from(max) {
            return Err(Error::new(
                ErrorKind::MaxDepthExceeded { max },
                Span::at(self.cursor.position()),
            ));
        }
        Ok(())
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attributes = IndexMap::new();
        loop {
            let separated = self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/' | b'>') => return Ok(attributes),
                Some(_) if !separated => {
                    return Err(self.error_here("expected whitespace before attribute"));
                }
                Some(_) => {}
                None => return Err(self.error_here("unexpected end of input in tag")),
            }

            let at = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect(b"=")?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attributes.contains_key(&name) {
                return Err(Error::malformed(at, format!("duplicate attribute: {name}")));
            }
            attributes.insert(name, value);
        }
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.error_here("expected quoted attribute value")),
        };
        self.cursor.bump();

        let at = self.cursor.position();
        let raw = self.cursor.take_while(|b| b != quote && b != b'<');
        match self.cursor.current() {
            Some(b) if b == quote => {
                self.cursor.bump();
                // literal line breaks and tabs read as spaces; &#10; and friends survive
                let normalized = utf8(raw, at)?
                    .replace("\r\n", " ")
                    .replace(['\t', '\n', '\r'], " ");
                decode_entities(&normalized, &self.entities, at)
            }
            Some(_) => Err(self.error_here("'<' not allowed in attribute value")),
            None => Err(self.error_here("unterminated attribute value")),
        }
    }

    fn parse_text(&mut self) -> Result<String> {
        let at = self.cursor.position();
        let raw = self.cursor.take_while(|b| b != b'<');
        decode_entities(utf8(raw, at)?, &self.entities, at)
    }

    fn parse_cdata(&mut self) -> Result<String> {
        self.cursor.bump_by(CDATA_OPEN.len());
        let at = self.cursor.position();
        match self.cursor.take_until(b"]]>") {
            Some(raw) => utf8(raw, at).map(str::to_string),
            None => Err(self.error_here("unterminated CDATA section")),
        }
    }

    fn parse_name(&mut self) -> Result<String> {
        let at = self.cursor.position();
        match self.cursor.current() {
            Some(b) if is_name_start(b) => {}
            Some(_) => return Err(Error::malformed(at, "invalid name")),
            None => return Err(Error::malformed(at, "expected name")),
        }
        let raw = self.cursor.take_while(is_name_char);
        utf8(raw, at).map(str::to_string)
    }

    fn skip_comment(&mut self) -> Result<()> {
        self.skip_delimited(b"<!--", b"-->", "unterminated comment")
    }

    fn skip_processing_instruction(&mut self) -> Result<()> {
        self.skip_delimited(b"<?", b"?>", "unterminated processing instruction")
    }

    fn skip_delimited(&mut self, open: &[u8], close: &[u8], message: &str) -> Result<()> {
        self.cursor.bump_by(open.len());
        match self.cursor.take_until(close) {
            Some(_) => Ok(()),
            None => Err(self.error_here(message)),
        }
    }

    /// Skip the DOCTYPE, keeping the internal general entities it declares
    ///
    /// Only entities whose replacement text is plain characters (no `&`, `<`
    /// or `%`) are kept; a reference to any other entity, including external
    /// and parameter entities, is rejected as an unknown entity.
    fn skip_doctype(&mut self) -> Result<()> {
        // '>' inside an internal subset does not end the declaration
        let mut subset = None;
        while let Some(b) = self.cursor.current() {
            self.cursor.bump();
            match b {
                b'[' => subset = Some(self.cursor.offset()),
                b']' => {
                    if let Some(start) = subset.take() {
                        let declarations = self.cursor.since(start);
                        let declarations = declarations
                            .get(..declarations.len().saturating_sub(1))
                            .unwrap_or_default();
                        let at = self.cursor.position();
                        self.declare_entities(utf8(declarations, at)?);
                    }
                }
                b'>' if subset.is_none() => return Ok(()),
                _ => {}
            }
        }
        Err(self.error_here("unterminated doctype"))
    }

    fn declare_entities(&mut self, subset: &str) {
        let mut rest = subset;
        while let Some(found) = rest.find("<!ENTITY") {
            rest = rest.get(found + "<!ENTITY".len()..).unwrap_or_default();
            let Some((name, value)) = entity_declaration(rest) else {
                continue;
            };
            if !value.contains(['&', '<', '%']) {
                // the first declaration of a name is binding
                self.entities
                    .entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
    }

    fn expect(&mut self, token: &[u8]) -> Result<()> {
        if self.cursor.eat(token) {
            return Ok(());
        }
        let found = match self.cursor.current() {
            Some(b) => format!("'{}'", char::from(b).escape_default()),
            None => "end of input".to_string(),
        };
        Err(self.error_here(&format!(
            "expected '{}', found {found}",
            String::from_utf8_lossy(token)
        )))
    }

    fn error_here(&self, message: &str) -> Error {
        Error::malformed(self.cursor.position(), message)
    }
}

fn push_text(children: &mut Vec<Content>, text: String) {
    match children.last_mut() {
        Some(Content::Text(last)) => last.push_str(&text),
        _ => children.push(Content::Text(text)),
    }
}

fn utf8(bytes: &[u8], at: Pos) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| Error::malformed(at, "invalid utf-8"))
}

/// Name and literal value of `<!ENTITY name "value"`, with `rest` starting after `<!ENTITY`
fn entity_declaration(rest: &str) -> Option<(&str, &str)> {
    let (name, tail) = rest.trim_start().split_once(char::is_whitespace)?;
    if name.starts_with('%') {
        return None;
    }
    let tail = tail.trim_start();
    let quote = tail.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    let (value, _) = tail.get(1..)?.split_once(quote)?;
    Some((name, value))
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || b.is_ascii_digit() || matches!(b, b'-' | b'.')
}

/// Resolve entity and character references in `raw`
fn decode_entities(raw: &str, entities: &IndexMap<String, String>, at: Pos) -> Result<String> {
    let Some(first) = raw.find('&') else {
        return Ok(raw.to_string());
    };

    let mut out = String::with_capacity(raw.len());
    out.push_str(raw.get(..first).unwrap_or_default());
    let mut rest = raw.get(first..).unwrap_or_default();

    while let Some(reference) = rest.strip_prefix('&') {
        let Some((entity, tail)) = reference.split_once(';') else {
            return Err(Error::malformed(at, "unterminated entity reference"));
        };
        match entity {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            _ => match entities.get(entity) {
                Some(value) => out.push_str(value),
                None => out.push(char_reference(entity).ok_or_else(|| {
                    Error::malformed(at, format!("invalid entity reference: &{entity};"))
                })?),
            },
        }

        let next = tail.find('&').unwrap_or(tail.len());
        out.push_str(tail.get(..next).unwrap_or_default());
        rest = tail.get(next..).unwrap_or_default();
    }

    Ok(out)
}

fn char_reference(entity: &str) -> Option<char> {
    let code = match entity.strip_prefix("#x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => entity.strip_prefix('#')?.parse().ok()?,
    };
    char::from_u32(code).filter(|&ch| is_xml_char(ch))
}

/// The `Char` production: tab, newline, carriage return and U+0020 upward,
/// without U+FFFE and U+FFFF (surrogates are not `char`s)
fn is_xml_char(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r') || (ch >= ' ' && !matches!(ch, '\u{FFFE}' | '\u{FFFF}'))
}
