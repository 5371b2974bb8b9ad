use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tabwriter::TabWriter;

use redline_io::prelude::*;
use redline_io::batch_json::parse_batch_json_value;
use redline_io::reader::{stats, to_minified_json, to_pretty_json};
use redline_io::{BatchFormat, apply_to_path, extract, parse_batch, read_page, render_batch};

mod config;
mod schema;

use config::Config;

#[derive(Debug, Parser)]
#[command(name = "redline", version, about = "Tracked-change redlining for .docx documents")]
struct Cli {
    /// Config file (default: ./redline.config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the block model of a document as JSON.
    Extract {
        document: PathBuf,
        /// Output minified JSON
        #[arg(long)]
        min: bool,
    },
    /// Print block count, estimated size and recommended page count.
    Stats {
        document: PathBuf,
        #[arg(long)]
        page_budget: Option<usize>,
    },
    /// Print one page of blocks with the full outline.
    Read {
        document: PathBuf,
        /// Zero-based page index
        page: usize,
        #[arg(long)]
        page_budget: Option<usize>,
        #[arg(long)]
        min: bool,
    },
    /// Print the heading outline as an aligned table.
    Outline { document: PathBuf },
    /// Check an edit batch against a document. Exits 1 when invalid.
    Validate {
        document: PathBuf,
        /// Edit batch (.json, or .md authoring syntax)
        edits: PathBuf,
        #[command(flatten)]
        checks: CheckArgs,
        /// Print the full report as JSON on stdout
        #[arg(long)]
        diagnostics_json: bool,
    },
    /// Render an edit batch into a document as tracked changes and comments.
    Apply {
        document: PathBuf,
        edits: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        checks: CheckArgs,
        /// Skip records with fatal issues instead of rejecting the batch
        #[arg(long)]
        skip_invalid: bool,
        /// Write edits directly instead of as revisions
        #[arg(long)]
        no_track_changes: bool,
        #[arg(long)]
        author_name: Option<String>,
        #[arg(long)]
        author_email: Option<String>,
        /// Revision timestamp (RFC 3339); defaults to now
        #[arg(long)]
        date: Option<String>,
    },
    /// Combine edit batches from several authors. Exits 1 on fatal conflicts.
    Merge {
        #[arg(required = true)]
        edits: Vec<PathBuf>,
        #[arg(long, default_value = "error")]
        policy: MergePolicy,
        /// Write the merged batch here (format by extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Canonical JSON (sorted keys, minified)
        #[arg(long)]
        canonical: bool,
    },
    /// Convert an edit batch between JSON and the markdown authoring syntax.
    Convert {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        canonical: bool,
    },
}

#[derive(Debug, clap::Args)]
struct CheckArgs {
    /// Promote advisory issues to fatal
    #[arg(long)]
    strict: bool,
    /// Advisory check to skip (repeatable)
    #[arg(long = "suppress", value_name = "CHECK")]
    suppress: Vec<String>,
    /// Largest tolerated shrink of a replaced block, 0..1
    #[arg(long)]
    max_reduction: Option<f64>,
}

impl CheckArgs {
    fn validate_options(&self, config: &Config) -> ValidateOptions {
        let defaults = ValidateOptions::default();
        ValidateOptions {
            strict: config.strict(self.strict),
            max_reduction: self
                .max_reduction
                .or(config.max_reduction)
                .unwrap_or(defaults.max_reduction),
            suppress: config.suppress(&self.suppress),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;
    let page_options = |flag: Option<usize>| {
        let mut opts = PageOptions::default();
        if let Some(budget) = flag.or(config.page_budget) {
            opts.page_budget = budget;
        }
        opts
    };

    match cli.cmd {
        Command::Extract { document, min } => {
            let model = extract(&document)?;
            println!("{}", json(&model, min)?);
        }
        Command::Stats {
            document,
            page_budget,
        } => {
            let model = extract(&document)?;
            println!("{}", to_pretty_json(&stats(&model, page_options(page_budget)))?);
        }
        Command::Read {
            document,
            page,
            page_budget,
            min,
        } => {
            let model = extract(&document)?;
            let page = read_page(&model, page, page_options(page_budget))?;
            println!("{}", json(&page, min)?);
        }
        Command::Outline { document } => {
            let model = extract(&document)?;
            let mut tw = TabWriter::new(std::io::stdout());
            writeln!(tw, "blockId\tlevel\ttext")?;
            for entry in model.outline() {
                writeln!(tw, "{}\t{}\t{}", entry.id, entry.level, entry.text)?;
            }
            tw.flush()?;
        }
        Command::Validate {
            document,
            edits,
            checks,
            diagnostics_json,
        } => {
            let model = extract(&document)?;
            let batch = read_batch(&edits)?;
            let report = validate(&model, &batch, &checks.validate_options(&config));

            if diagnostics_json {
                println!("{}", to_pretty_json(&report)?);
            } else {
                print_issues(&report.issues);
                if report.valid {
                    println!("OK");
                }
            }
            return Ok(exit_code(report.valid));
        }
        Command::Apply {
            document,
            edits,
            output,
            checks,
            skip_invalid,
            no_track_changes,
            author_name,
            author_email,
            date,
        } => {
            let batch = read_batch(&edits)?;
            let checked = checks.validate_options(&config);
            let defaults = ApplyOptions::default();
            let opts = ApplyOptions {
                strict: checked.strict,
                skip_invalid,
                track_changes: !no_track_changes,
                author_name: author_name
                    .or_else(|| config.author_name.clone())
                    .unwrap_or(defaults.author_name),
                author_email: author_email.or_else(|| config.author_email.clone()),
                date,
                max_reduction: checked.max_reduction,
                suppress: checked.suppress,
            };

            match apply_to_path(&document, &batch, &opts, &output) {
                Ok(result) => println!("{}", to_pretty_json(&result)?),
                Err(RedlineError::Apply(ApplyError::Rejected { issues })) => {
                    print_issues(&issues);
                    eprintln!("batch rejected; {} was not written", output.display());
                    return Ok(ExitCode::FAILURE);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Merge {
            edits,
            policy,
            output,
            canonical,
        } => {
            let batches = edits
                .iter()
                .map(|path| read_batch(path))
                .collect::<Result<Vec<_>>>()?;
            let outcome = merge(&batches, policy)?;

            match (&outcome.merged, &output) {
                (Some(merged), Some(path)) => {
                    let rendered = render_batch(merged, BatchFormat::from_path(path), canonical)?;
                    write_text(path, &rendered)?;
                    println!("{}", to_pretty_json(&outcome.conflicts)?);
                }
                (Some(merged), None) if canonical => {
                    println!("{}", render_batch(merged, BatchFormat::Json, true)?);
                }
                _ => println!("{}", to_pretty_json(&outcome)?),
            }
            if outcome.is_fatal() {
                eprintln!("{} conflict(s) under policy '{policy}'", outcome.conflicts.len());
            }
            return Ok(exit_code(!outcome.is_fatal()));
        }
        Command::Convert {
            input,
            output,
            canonical,
        } => {
            let batch = read_batch(&input)?;
            let rendered = render_batch(&batch, BatchFormat::from_path(&output), canonical)?;
            write_text(&output, &rendered)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn json<T: serde::Serialize>(value: &T, min: bool) -> Result<String> {
    Ok(if min {
        to_minified_json(value)?
    } else {
        to_pretty_json(value)?
    })
}

/// JSON batches pass the schema gate first; markdown goes straight to the parser.
fn read_batch(path: &Path) -> Result<EditBatch> {
    let src = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let loaded = match BatchFormat::from_path(path) {
        BatchFormat::Json => {
            let value: serde_json::Value = serde_json::from_str(&src)
                .with_context(|| format!("{}: invalid JSON", path.display()))?;
            schema::check_batch(&value).with_context(|| path.display().to_string())?;
            parse_batch_json_value(value).with_context(|| path.display().to_string())?
        }
        BatchFormat::Markdown => match parse_batch(&src, BatchFormat::Markdown, path) {
            Ok(loaded) => loaded.batch,
            Err(RedlineError::Authoring { errors, .. }) => {
                for e in &errors {
                    eprintln!("{}:{}: {e}", path.display(), e.line);
                }
                bail!("{}: {} authoring error(s)", path.display(), errors.len());
            }
            Err(e) => return Err(e.into()),
        },
    };
    Ok(loaded)
}

fn print_issues(issues: &[ValidationIssue]) {
    for issue in issues {
        let label = match issue.severity {
            Severity::Fatal => "error",
            Severity::Advisory => "warning",
        };
        match &issue.path {
            Some(path) => eprintln!("{label}[{}] {path}: {}", issue.code, issue.message),
            None => eprintln!("{label}[{}] {}", issue.code, issue.message),
        }
    }
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    let mut text = text.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))
}
