use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{anyhow, bail, Context, Result};
use mftparse::Generate;
use tracing::debug;

/// Runs a shell command per prompt: prompt on stdin, response on stdout
#[derive(Clone, Debug)]
pub struct CommandGenerator {
    command: String,
}

impl CommandGenerator {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn run(&self, prompt: &str) -> Result<String> {
        let mut child = shell(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to start LLM command `{}`", self.command))?;

        // fed from a separate thread so a chatty command cannot fill its stdout pipe first
        let stdin = child.stdin.take();
        let input = prompt.as_bytes().to_vec();
        let writer = thread::spawn(move || -> io::Result<()> {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(&input) {
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        });

        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to wait for LLM command `{}`", self.command))?;
        writer
            .join()
            .map_err(|_| anyhow!("prompt writer thread panicked"))?
            .context("failed to write prompt to LLM command")?;

        if !output.status.success() {
            bail!("LLM command `{}` exited with {}", self.command, output.status);
        }
        debug!(bytes = output.stdout.len(), "LLM command finished");
        String::from_utf8(output.stdout).context("LLM command produced non UTF-8 output")
    }
}

impl Generate for CommandGenerator {
    fn generate(&self, prompt: &str) -> mftparse::Result<String> {
        self.run(prompt)
            .map_err(|err| mftparse::Error::generation(format!("{err:#}")))
    }
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", command]);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}
