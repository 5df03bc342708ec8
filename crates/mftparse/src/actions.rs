//! Flattening of MFT project documents into action records
//!
//! A project document groups its steps into `module` elements directly under
//! the root. Every direct child element of a module is one action:
//!
//! ```text
//! <project>
//!   <module name="Main">
//!     <sftp label="Fetch" host="partner.example" />
//!     <delete label="Cleanup" path="/inbox/*.csv" />
//!   </module>
//! </project>
//! ```

use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::xml::{Config, Element, Parser};

/// Module name used when a `module` element carries no `name`
pub const DEFAULT_MODULE_NAME: &str = "Unnamed";
/// Label used when an action element carries no `label`
pub const DEFAULT_LABEL: &str = "No Label";

const MODULE_TAG: &str = "module";

/// One action step of a project module
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionRecord {
    #[cfg_attr(feature = "serde", serde(rename = "Module"))]
    pub module: String,
    /// Lower-cased tag name of the action element
    #[cfg_attr(feature = "serde", serde(rename = "Action"))]
    pub action: String,
    #[cfg_attr(feature = "serde", serde(rename = "Label"))]
    pub label: String,
    /// Every attribute of the action element, `label` included
    #[cfg_attr(feature = "serde", serde(rename = "Details"))]
    pub details: IndexMap<String, String>,
}

impl ActionRecord {
    fn from_element(module: &str, element: &Element) -> Self {
        Self {
            module: module.to_string(),
            action: element.name.to_lowercase(),
            label: element
                .attr("label")
                .unwrap_or(DEFAULT_LABEL)
                .to_string(),
            details: element.attributes.clone(),
        }
    }

    /// Attribute value of the source element
    pub fn detail(&self, name: &str) -> Option<&str> {
        self.details.get(name).map(String::as_str)
    }
}

/// Extract action records from a project document with default parser limits
pub fn extract_actions(xml: &str) -> Result<Vec<ActionRecord>> {
    extract_actions_with_config(xml, Config::default())
}

/// Extract action records from a project document
///
/// Fails with a malformed-input error when the document is not well-formed;
/// no records are returned in that case.
#[instrument(skip_all, fields(bytes = xml.len()))]
pub fn extract_actions_with_config(xml: &str, config: Config) -> Result<Vec<ActionRecord>> {
    let document = Parser::with_config(xml.as_bytes(), config).parse()?;

    let mut records = Vec::new();
    for module in document.root.children_named(MODULE_TAG) {
        let name = module.attr("name").unwrap_or(DEFAULT_MODULE_NAME);
        records.extend(
            module
                .child_elements()
                .map(|element| ActionRecord::from_element(name, element)),
        );
    }

    debug!(records = records.len(), "extracted project actions");
    Ok(records)
}
