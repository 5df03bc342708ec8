use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../mftparse/tests/fixtures")
        .join(path)
}

fn mftparse() -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("mftparse")?;
    cmd.env("RUST_LOG", "info").env_remove("MFTPARSE_LLM_COMMAND");
    Ok(cmd)
}

#[test]
fn actions_prints_json_records() -> TestResult {
    mftparse()?
        .arg("actions")
        .arg(fixture("valid/nightly_transfer.xml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Module\": \"Main\""))
        .stdout(predicate::str::contains("\"Action\": \"sendemail\""))
        .stdout(predicate::str::contains("\"Label\": \"No Label\""));
    Ok(())
}

#[test]
fn actions_reads_stdin() -> TestResult {
    let output = mftparse()?
        .arg("actions")
        .write_stdin("<root><module><copy label=\"x\"/></module></root>")
        .output()?;
    assert!(output.status.success());
    let records: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(records[0]["Module"], "Unnamed");
    assert_eq!(records[0]["Details"]["label"], "x");
    Ok(())
}

#[test]
fn actions_rejects_malformed_xml() -> TestResult {
    mftparse()?
        .arg("actions")
        .write_stdin("<root><module>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unterminated element"));
    Ok(())
}

#[test]
fn actions_enforces_depth_limit() -> TestResult {
    mftparse()?
        .args(["--max-depth", "2", "actions"])
        .arg(fixture("valid/nightly_transfer.xml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("nesting deeper than 2 elements"));
    Ok(())
}

#[test]
fn empty_stdin_is_an_error() -> TestResult {
    mftparse()?
        .arg("actions")
        .write_stdin("  \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input provided on stdin"));
    Ok(())
}

#[test]
fn table_as_csv() -> TestResult {
    mftparse()?
        .args(["table", "--format", "csv"])
        .arg(fixture("responses/comparison.md"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Feature,GoAnywhere MFT,Progress MOVEit\r\nSFTP,Yes,Yes\r\n",
        ));
    Ok(())
}

#[test]
fn table_as_markdown_to_file() -> TestResult {
    let dir = tempdir()?;
    let out = dir.path().join("table.md");
    mftparse()?
        .arg("table")
        .arg("-o")
        .arg(&out)
        .write_stdin("| Tool | Protocol |\n|---|---|\n| GoAnywhere | SFTP |\n| MOVEit | FTPS |")
        .assert()
        .success()
        .stdout("");
    assert_eq!(
        fs::read_to_string(out)?,
        "| Tool | Protocol |\n| --- | --- |\n| GoAnywhere | SFTP |\n| MOVEit | FTPS |\n"
    );
    Ok(())
}

#[test]
fn missing_table_is_logged_not_failed() -> TestResult {
    mftparse()?
        .args(["table", "--format", "json"])
        .write_stdin("Nothing tabular here.")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"header\": []"))
        .stderr(predicate::str::contains("no table found"));
    Ok(())
}

#[test]
fn fragments_are_written_per_tag() -> TestResult {
    let dir = tempdir()?;
    let out_dir = dir.path().join("xml");
    mftparse()?
        .arg("fragments")
        .arg(fixture("responses/workflow.md"))
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("project_1.xml"))
        .stderr(predicate::str::contains("wrote"));

    assert!(fs::read_to_string(out_dir.join("project_1.xml"))?.starts_with("<project"));
    assert!(fs::read_to_string(out_dir.join("resource_1.xml"))?.contains("<port>22</port>"));
    assert_eq!(
        fs::read_to_string(out_dir.join("webuser_1.xml"))?,
        "<webuser name=\"partner01\"><email>ops@partner.example</email></webuser>"
    );
    Ok(())
}

#[test]
fn fragments_respect_selected_tags() -> TestResult {
    let dir = tempdir()?;
    mftparse()?
        .args(["fragments", "--tag", "webuser", "--out-dir"])
        .arg(dir.path())
        .arg(fixture("responses/workflow.md"))
        .assert()
        .success();
    let mut names: Vec<String> = fs::read_dir(dir.path())?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    names.sort();
    assert_eq!(names, ["webuser_1.xml"]);
    Ok(())
}

#[test]
fn fragments_without_matches_create_nothing() -> TestResult {
    let dir = tempdir()?;
    let out_dir = dir.path().join("none");
    mftparse()?
        .arg("fragments")
        .arg("--out-dir")
        .arg(&out_dir)
        .write_stdin("plain text <project>never closed")
        .assert()
        .success()
        .stderr(predicate::str::contains("no XML fragments found"));
    assert!(!out_dir.exists());
    Ok(())
}

#[test]
fn prompt_compare_lists_tools() -> TestResult {
    mftparse()?
        .args([
            "prompt",
            "compare",
            "--tool",
            "GoAnywhere MFT",
            "--tool",
            "TIBCO MFT",
            "--requirements",
            "SFTP and AS2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Compare the following MFT tools: GoAnywhere MFT, TIBCO MFT based on these requirements: SFTP and AS2",
        ));
    Ok(())
}

#[test]
fn prompt_summarize_lists_actions() -> TestResult {
    mftparse()?
        .args(["prompt", "summarize"])
        .arg(fixture("valid/nightly_transfer.xml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("- Module: Main | Action: sftp"));
    Ok(())
}

#[test]
fn llm_command_is_required() -> TestResult {
    mftparse()?
        .args(["compare", "--tool", "Seeburger", "--requirements", "EDI"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--llm-command"));
    Ok(())
}

#[cfg(unix)]
mod llm {
    use super::*;

    fn replay(path: &str) -> String {
        format!("cat > /dev/null; cat '{}'", fixture(path).display())
    }

    #[test]
    fn compare_as_json() -> TestResult {
        let output = mftparse()?
            .args(["compare", "-t", "GoAnywhere MFT", "-t", "Progress MOVEit"])
            .args(["-r", "cloud targets", "--format", "json", "--llm-command"])
            .arg(replay("responses/comparison.md"))
            .output()?;
        assert!(output.status.success());
        let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(report["table"]["header"][2], "Progress MOVEit");
        assert_eq!(report["table"]["rows"][2][2], "");
        Ok(())
    }

    #[test]
    fn summarize_as_html_from_env_command() -> TestResult {
        mftparse()?
            .env(
                "MFTPARSE_LLM_COMMAND",
                "cat > /dev/null; printf '| Source | Target |\\n|---|---|\\n| SFTP | <archive> |\\n'",
            )
            .args(["summarize", "--format", "html"])
            .arg(fixture("valid/nightly_transfer.xml"))
            .assert()
            .success()
            .stdout(predicate::str::contains("<title>Project Summary</title>"))
            .stdout(predicate::str::contains("<td>&lt;archive&gt;</td>"));
        Ok(())
    }

    #[test]
    fn summarize_sends_prompt_on_stdin() -> TestResult {
        mftparse()?
            .args(["summarize", "--llm-command", "cat"])
            .arg(fixture("valid/nightly_transfer.xml"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Summarize the following GoAnywhere project actions."))
            .stdout(predicate::str::contains("Label: Download partner files"));
        Ok(())
    }

    #[test]
    fn author_writes_artifacts() -> TestResult {
        let dir = tempdir()?;
        mftparse()?
            .args(["author", "--prompt", "nightly partner pickup", "--llm-command"])
            .arg(replay("responses/workflow.md"))
            .arg("--out-dir")
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Sure! Below are the artifacts"));
        for name in ["project_1.xml", "resource_1.xml", "webuser_1.xml"] {
            assert!(dir.path().join(name).is_file(), "{name}");
        }
        Ok(())
    }

    #[test]
    fn failing_command_reports_exit_status() -> TestResult {
        mftparse()?
            .args(["author", "-p", "anything", "--llm-command", "exit 7"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("exited with"));
        Ok(())
    }

    #[test]
    fn silent_command_is_a_generation_error() -> TestResult {
        mftparse()?
            .args(["compare", "-t", "Cleo (CIC)", "-r", "AS2", "--llm-command", "cat > /dev/null"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("no textual output"));
        Ok(())
    }
}
