//! Request workflows composing extraction, prompting and recovery
//!
//! Each workflow runs one request against an injected [`Generate`]
//! capability. A response without a table or without fragments is a normal
//! outcome; only unusable requests and generation failures are errors.

use tracing::{debug, info, instrument};

use crate::actions::{extract_actions_with_config, ActionRecord};
use crate::error::{Error, Result};
use crate::fragment::{collect_fragments_with_config, FragmentSet, DEFAULT_TAGS};
use crate::llm::Generate;
use crate::prompt::{comparison_prompt, summary_prompt};
use crate::table::{parse_first_table, ParsedTable};
use crate::xml::Config;

/// Per-request settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Limits for project documents and recovered fragments
    pub xml: Config,
    /// Tags recovered by [`Workflow::author_artifacts`]
    pub fragment_tags: Vec<String>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            xml: Config::default(),
            fragment_tags: DEFAULT_TAGS.iter().map(|tag| (*tag).to_string()).collect(),
        }
    }
}

/// Summary of a project file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectSummary {
    pub actions: Vec<ActionRecord>,
    pub text: String,
    /// First table of the response, empty if there was none
    pub table: ParsedTable,
}

/// Tool comparison
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub text: String,
    pub table: ParsedTable,
}

/// Generated MFT artifacts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifacts {
    pub text: String,
    pub fragments: FragmentSet,
}

/// Runs requests against a generation capability
#[derive(Clone, Debug)]
pub struct Workflow<G> {
    generator: G,
    config: WorkflowConfig,
}

impl<G: Generate> Workflow<G> {
    pub fn new(generator: G) -> Self {
        Self::with_config(generator, WorkflowConfig::default())
    }

    pub fn with_config(generator: G, config: WorkflowConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Extract a project's actions and ask for a summary of them
    #[instrument(skip_all)]
    pub fn summarize_project(&self, xml: &str) -> Result<ProjectSummary> {
        let actions = extract_actions_with_config(xml, self.config.xml)?;
        if actions.is_empty() {
            return Err(Error::invalid_request("project defines no module actions"));
        }

        let text = self.generate(&summary_prompt(&actions))?;
        let table = parse_first_table(&text);
        info!(
            actions = actions.len(),
            table_rows = table.rows.len(),
            "project summarized"
        );
        Ok(ProjectSummary {
            actions,
            text,
            table,
        })
    }

    /// Ask for a comparison of the selected tools
    #[instrument(skip_all, fields(tools = tools.len()))]
    pub fn compare_tools<S: AsRef<str>>(&self, tools: &[S], requirements: &str) -> Result<Comparison> {
        if tools.iter().all(|tool| tool.as_ref().trim().is_empty()) {
            return Err(Error::invalid_request("select at least one tool"));
        }
        if requirements.trim().is_empty() {
            return Err(Error::invalid_request("requirements are empty"));
        }

        let selected: Vec<&str> = tools
            .iter()
            .map(|tool| tool.as_ref())
            .filter(|tool| !tool.trim().is_empty())
            .collect();
        let text = self.generate(&comparison_prompt(&selected, requirements))?;
        let table = parse_first_table(&text);
        if table.is_empty() {
            debug!("comparison response carries no table");
        }
        Ok(Comparison { text, table })
    }

    /// Send a free-form request and recover the XML artifacts in the answer
    #[instrument(skip_all)]
    pub fn author_artifacts(&self, prompt: &str) -> Result<Artifacts> {
        if prompt.trim().is_empty() {
            return Err(Error::invalid_request("prompt is empty"));
        }

        let text = self.generate(prompt.trim())?;
        let fragments =
            collect_fragments_with_config(&text, &self.config.fragment_tags, self.config.xml);
        info!(fragments = fragments.len(), "artifacts recovered");
        Ok(Artifacts { text, fragments })
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        debug!(prompt_bytes = prompt.len(), "sending prompt");
        let text = self.generator.generate(prompt)?;
        if text.trim().is_empty() {
            return Err(Error::generation("no textual output"));
        }
        Ok(text)
    }
}
