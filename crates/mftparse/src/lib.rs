//! mftparse - structured-text extraction for MFT project tooling
//!
//! - Flatten MFT project XML into [`ActionRecord`]s
//! - Recover the first Markdown table from LLM output as a [`ParsedTable`]
//! - Recover well-formed XML fragments embedded in LLM output
//! - Run summary, comparison and authoring requests against an injected
//!   [`Generate`] capability
//!
//! # Quick Start
//!
//! ```
//! use mftparse::{extract_actions, extract_fragments, parse_first_table};
//! # fn main() -> Result<(), mftparse::Error> {
//! let actions = extract_actions(
//!     r#"<project><module name="Main"><sftp label="Fetch" host="h"/></module></project>"#,
//! )?;
//! assert_eq!(actions[0].action, "sftp");
//!
//! let table = parse_first_table("| Tool | Protocol |\n|---|---|\n| MOVEit | FTPS |");
//! assert_eq!(table.header, ["Tool", "Protocol"]);
//!
//! let fragments = extract_fragments("see <webuser id=\"7\"/> and <webuser>x</webuser>", "webuser");
//! assert_eq!(fragments, ["<webuser>x</webuser>"]);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod cursor;
pub use cursor::Cursor;

pub mod xml;
pub use xml::{
    Config as XmlConfig, Content as XmlContent, Document as XmlDocument, Element as XmlElement,
    Parser as XmlParser,
};

pub mod actions;
pub use actions::{
    extract_actions, extract_actions_with_config, ActionRecord, DEFAULT_LABEL,
    DEFAULT_MODULE_NAME,
};

pub mod table;
pub use table::{parse_first_table, ParsedTable};

pub mod fragment;
pub use fragment::{
    collect_fragments, collect_fragments_with_config, extract_fragments,
    extract_fragments_with_config, fragment_file_name, FragmentSet, NamedFragment, DEFAULT_TAGS,
};

pub mod llm;
pub use llm::{Generate, ScriptedGenerator};

pub mod prompt;
pub use prompt::{comparison_prompt, summary_prompt, KNOWN_TOOLS};

pub mod workflow;
pub use workflow::{Artifacts, Comparison, ProjectSummary, Workflow, WorkflowConfig};

pub mod render;

/// Parse an XML document with default limits
pub fn from_xml_str(s: &str) -> Result<XmlDocument> {
    XmlParser::new(s.as_bytes()).parse()
}

/// Check that `s` is a single well-formed XML document
pub fn is_well_formed(s: &str) -> bool {
    from_xml_str(s).is_ok()
}
