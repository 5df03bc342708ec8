use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mftparse::{
    collect_fragments_with_config, comparison_prompt, extract_actions_with_config,
    parse_first_table, render, summary_prompt, FragmentSet, ParsedTable, Workflow,
    WorkflowConfig, XmlConfig, DEFAULT_TAGS,
};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

mod generator;

use generator::CommandGenerator;

#[derive(Debug, Parser)]
#[command(
    name = "mftparse",
    version,
    about = "Extract actions, tables and XML fragments for MFT project tooling"
)]
struct Cli {
    #[command(flatten)]
    limits: Limits,
    /// Output file (defaults to stdout)
    #[arg(short, long, global = true, value_name = "OUTPUT")]
    output: Option<PathBuf>,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Args)]
struct Limits {
    /// Maximum XML nesting depth (0 = unlimited)
    #[arg(long, global = true, default_value_t = 128)]
    max_depth: u16,
    /// Maximum XML input size in bytes (0 = unlimited)
    #[arg(long, global = true, default_value_t = 10 * 1024 * 1024)]
    max_size: usize,
}

impl Limits {
    fn config(&self) -> XmlConfig {
        XmlConfig::new(self.max_depth, self.max_size)
    }
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Print the actions of a project file as JSON
    Actions {
        /// Project XML (defaults to stdin)
        input: Option<PathBuf>,
    },
    /// Print the first Markdown table found in a text
    Table {
        /// Response text (defaults to stdin)
        input: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = TableFormat::Markdown)]
        format: TableFormat,
    },
    /// Write the XML fragments found in a text to files
    Fragments {
        /// Response text (defaults to stdin)
        input: Option<PathBuf>,
        #[command(flatten)]
        emit: Emit,
    },
    /// Print a prompt without sending it
    #[command(subcommand)]
    Prompt(PromptCmd),
    /// Summarize a project file through the LLM command
    Summarize {
        /// Project XML (defaults to stdin)
        input: Option<PathBuf>,
        #[command(flatten)]
        llm: Llm,
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
    /// Compare MFT tools through the LLM command
    Compare {
        #[command(flatten)]
        request: CompareRequest,
        #[command(flatten)]
        llm: Llm,
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
    /// Ask the LLM command for MFT artifacts and write the XML it returns
    Author {
        /// What to build
        #[arg(short, long)]
        prompt: String,
        #[command(flatten)]
        llm: Llm,
        #[command(flatten)]
        emit: Emit,
    },
}

#[derive(Debug, Subcommand)]
enum PromptCmd {
    /// Summary prompt for a project file
    Summarize {
        /// Project XML (defaults to stdin)
        input: Option<PathBuf>,
    },
    /// Comparison prompt for the selected tools
    Compare {
        #[command(flatten)]
        request: CompareRequest,
    },
}

#[derive(Debug, Args)]
struct CompareRequest {
    /// Tool to compare (repeatable)
    #[arg(short, long = "tool", value_name = "TOOL", required = true)]
    tools: Vec<String>,
    /// Free-text requirements
    #[arg(short, long)]
    requirements: String,
}

#[derive(Debug, Args)]
struct Llm {
    /// Shell command that reads a prompt on stdin and answers on stdout
    #[arg(long, env = "MFTPARSE_LLM_COMMAND", value_name = "CMD")]
    llm_command: String,
}

#[derive(Debug, Args)]
struct Emit {
    /// Tag to recover (repeatable)
    #[arg(long = "tag", value_name = "TAG", default_values = DEFAULT_TAGS)]
    tags: Vec<String>,
    /// Directory receiving `<tag>_<n>.xml` files
    #[arg(long, value_name = "DIR", default_value = "xml_outputs")]
    out_dir: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TableFormat {
    Json,
    Csv,
    Html,
    #[value(alias = "md")]
    Markdown,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
    Html,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Err(err) = run(Cli::parse()) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.limits.config();
    let output = match cli.command {
        Cmd::Actions { input } => {
            let records = extract_actions_with_config(&read_input(&input)?, config)?;
            info!("extracted {} actions", records.len());
            serde_json::to_string_pretty(&records)? + "\n"
        }
        Cmd::Table { input, format } => {
            let table = parse_first_table(&read_input(&input)?);
            if table.is_empty() {
                info!("no table found");
            }
            render_table(&table, format)?
        }
        Cmd::Fragments { input, emit } => {
            let fragments =
                collect_fragments_with_config(&read_input(&input)?, &emit.tags, config);
            let written = write_fragments(&fragments, &emit.out_dir)?;
            listing(&written)
        }
        Cmd::Prompt(PromptCmd::Summarize { input }) => {
            let records = extract_actions_with_config(&read_input(&input)?, config)?;
            summary_prompt(&records)
        }
        Cmd::Prompt(PromptCmd::Compare { request }) => {
            comparison_prompt(&request.tools, &request.requirements)
        }
        Cmd::Summarize { input, llm, format } => {
            let xml = read_input(&input)?;
            let summary = workflow(&llm, config, None).summarize_project(&xml)?;
            match format {
                ReportFormat::Text => summary.text,
                ReportFormat::Json => json_line(&json!({
                    "actions": summary.actions,
                    "text": summary.text,
                    "table": summary.table,
                }))?,
                ReportFormat::Html => {
                    render::html_report("Project Summary", &summary.text, &summary.table)
                }
            }
        }
        Cmd::Compare {
            request,
            llm,
            format,
        } => {
            let comparison = workflow(&llm, config, None)
                .compare_tools(&request.tools, &request.requirements)?;
            match format {
                ReportFormat::Text => comparison.text,
                ReportFormat::Json => json_line(&json!({
                    "text": comparison.text,
                    "table": comparison.table,
                }))?,
                ReportFormat::Html => {
                    render::html_report("MFT Comparison", &comparison.text, &comparison.table)
                }
            }
        }
        Cmd::Author { prompt, llm, emit } => {
            let artifacts = workflow(&llm, config, Some(emit.tags)).author_artifacts(&prompt)?;
            write_fragments(&artifacts.fragments, &emit.out_dir)?;
            artifacts.text
        }
    };

    write_output(cli.output.as_deref(), output.as_bytes())
}

fn workflow(llm: &Llm, xml: XmlConfig, tags: Option<Vec<String>>) -> Workflow<CommandGenerator> {
    let mut config = WorkflowConfig {
        xml,
        ..WorkflowConfig::default()
    };
    if let Some(tags) = tags {
        config.fragment_tags = tags;
    }
    Workflow::with_config(CommandGenerator::new(llm.llm_command.as_str()), config)
}

fn render_table(table: &ParsedTable, format: TableFormat) -> Result<String> {
    Ok(match format {
        TableFormat::Json => json_line(table)?,
        TableFormat::Csv => render::to_csv(table),
        TableFormat::Html => render::to_html_table(table),
        TableFormat::Markdown => render::to_markdown(table),
    })
}

fn json_line<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)? + "\n")
}

fn listing(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| format!("{}\n", path.display()))
        .collect()
}

fn write_fragments(fragments: &FragmentSet, out_dir: &Path) -> Result<Vec<PathBuf>> {
    if fragments.is_empty() {
        info!("no XML fragments found");
        return Ok(Vec::new());
    }
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(fragments.len());
    for fragment in fragments.named() {
        let path = out_dir.join(fragment.file_name());
        fs::write(&path, fragment.xml)
            .with_context(|| format!("failed to write fragment {}", path.display()))?;
        info!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn read_input(path: &Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            if buffer.trim().is_empty() {
                bail!("no input provided on stdin");
            }
            Ok(buffer)
        }
    }
}

fn write_output(path: Option<&Path>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(data).context("failed to write stdout")?;
            Ok(())
        }
    }
}
