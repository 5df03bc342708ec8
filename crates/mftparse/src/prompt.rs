//! Prompt construction for the text generation service

use crate::actions::ActionRecord;

/// MFT products offered for comparison
pub const KNOWN_TOOLS: [&str; 9] = [
    "GoAnywhere MFT",
    "Axway SecureTransport",
    "IBM Sterling MFT",
    "Globalscape EFT",
    "Progress MOVEit",
    "Cleo (CIC)",
    "Seeburger",
    "TIBCO MFT",
    "AWS Transfer family",
];

const SUMMARY_INSTRUCTIONS: &str = "Summarize the following GoAnywhere project actions. \
Group by module, explain each action briefly, and highlight key details like source/target \
paths, protocols (SFTP, Blob, MQ), file patterns, archive steps, deletions, and post-transfer \
actions. Format as readable text and include a Markdown table that does not show the module \
name. The table shows source type/protocol/path details, target type/protocol/path details \
and the file pattern, so the flow can be rebuilt in another tool from scratch:";

const COMPARISON_INSTRUCTIONS: &str =
    "Answer with a short overview followed by a single Markdown table with one column per tool.";

/// Prompt asking for a readable summary of a project's actions
pub fn summary_prompt(actions: &[ActionRecord]) -> String {
    let mut prompt = String::from(SUMMARY_INSTRUCTIONS);
    prompt.push_str("\n\n");
    for record in actions {
        prompt.push_str(&format!(
            "- Module: {} | Action: {} | Label: {} | Details: {}\n",
            record.module,
            record.action,
            record.label,
            format_details(record)
        ));
    }
    prompt
}

fn format_details(record: &ActionRecord) -> String {
    record
        .details
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prompt asking to compare `tools` against free-text requirements
pub fn comparison_prompt<S: AsRef<str>>(tools: &[S], requirements: &str) -> String {
    let tools = tools
        .iter()
        .map(|tool| tool.as_ref().trim())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Compare the following MFT tools: {tools} based on these requirements: {}\n\n{COMPARISON_INSTRUCTIONS}",
        requirements.trim()
    )
}
