#![allow(clippy::indexing_slicing)]

use std::fs;
use std::path::Path;

use mftparse::{collect_fragments, extract_actions, parse_first_table, DEFAULT_TAGS};

fn fixture(path: &str) -> Result<String, std::io::Error> {
    fs::read_to_string(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(path))
}

#[test]
fn test_valid_fixtures() -> Result<(), Box<dyn std::error::Error>> {
    let valid_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/valid");
    for entry in fs::read_dir(valid_dir)? {
        let path = entry?.path();
        let content = fs::read_to_string(&path)?;
        if let Err(err) = extract_actions(&content) {
            return Err(std::io::Error::other(format!(
                "Failed to extract from valid file {path:?}: {err}"
            ))
            .into());
        }
    }
    Ok(())
}

#[test]
fn test_invalid_fixtures() -> Result<(), Box<dyn std::error::Error>> {
    let invalid_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/invalid");
    for entry in fs::read_dir(invalid_dir)? {
        let path = entry?.path();
        let content = fs::read_to_string(&path)?;
        match extract_actions(&content) {
            Err(err) if err.is_malformed_input() => {}
            other => {
                return Err(std::io::Error::other(format!(
                    "Should reject invalid file {path:?}, got {other:?}"
                ))
                .into());
            }
        }
    }
    Ok(())
}

#[test]
fn test_nightly_transfer_actions() -> Result<(), Box<dyn std::error::Error>> {
    let records = extract_actions(&fixture("valid/nightly_transfer.xml")?)?;
    let actions: Vec<(&str, &str, &str)> = records
        .iter()
        .map(|r| (r.module.as_str(), r.action.as_str(), r.label.as_str()))
        .collect();
    assert_eq!(
        actions,
        vec![
            ("Main", "sftp", "Download partner files"),
            ("Main", "copy", "Archive"),
            ("Main", "callmodule", "Notify"),
            ("Notify", "sendemail", "Done"),
            ("Unnamed", "delete", "Cleanup"),
            ("Unnamed", "print", "No Label"),
        ]
    );

    assert_eq!(records[1].detail("destDir"), Some("/archive/&daily"));
    assert_eq!(records[5].detail("message"), Some("no label here"));
    Ok(())
}

#[test]
fn test_cdata_fixture() -> Result<(), Box<dyn std::error::Error>> {
    let records = extract_actions(&fixture("valid/cdata_and_comments.xml")?)?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, "runscript");
    assert_eq!(records[0].label, "Rename");
    Ok(())
}

#[test]
fn test_comparison_response_table() -> Result<(), Box<dyn std::error::Error>> {
    let table = parse_first_table(&fixture("responses/comparison.md")?);
    assert_eq!(table.header, ["Feature", "GoAnywhere MFT", "Progress MOVEit"]);
    assert_eq!(
        table.rows,
        vec![
            vec!["SFTP", "Yes", "Yes"],
            vec!["FTPS", "Yes", "Yes"],
            vec!["Azure Blob", "Yes (native)", ""],
            vec!["HIPAA", "Supported", "Supported"],
        ]
    );
    Ok(())
}

#[test]
fn test_workflow_response_fragments() -> Result<(), Box<dyn std::error::Error>> {
    let set = collect_fragments(&fixture("responses/workflow.md")?, &DEFAULT_TAGS);
    assert_eq!(set.len(), 3);
    assert!(set.get("project")[0].starts_with("<project name=\"PartnerPickup\""));
    assert!(set.get("resource")[0].contains("<port>22</port>"));
    assert_eq!(
        set.get("webuser"),
        ["<webuser name=\"partner01\"><email>ops@partner.example</email></webuser>"]
    );

    let files: Vec<String> = set.named().map(|f| f.file_name()).collect();
    assert_eq!(files, ["project_1.xml", "resource_1.xml", "webuser_1.xml"]);
    Ok(())
}
