//! Command-line interface for docwalk.

use std::cell::Cell;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;

use crate::config::{parse_date_bound, PARAM_DATE_FROM, PARAM_DATE_TO, PLUGIN_DIR_ENV};
use crate::error::{DocwalkError, Result};
use crate::event::{NodeEvent, Tag};
use crate::manager::ParserManager;
use crate::params::Parameters;
use crate::pipeline::{Exporter, Fragment, Framing, Importer, Input, Transformer};
use crate::writer::{HtmlWriter, TextWriter, Writer};

/// docwalk - Walk documents, mailboxes and archives and extract their text.
#[derive(Parser)]
#[command(name = "docwalk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format of the extract command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Html,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract text from one or more documents into a single output.
    Extract {
        /// Documents to read (format chosen by file extension)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only mail sent on or after this date (YYYY-MM-DD)
        #[arg(long)]
        after: Option<String>,

        /// Only mail sent on or before this date (YYYY-MM-DD)
        #[arg(long)]
        before: Option<String>,

        /// Skip mail whose subject matches this regular expression
        #[arg(long)]
        skip_subject: Option<String>,

        /// Stop after this many mail messages
        #[arg(long)]
        max_headers: Option<usize>,

        /// Directory with plugin manifests
        #[arg(long, env = PLUGIN_DIR_ENV)]
        plugin_dir: Option<PathBuf>,

        /// Wrap text output at this width (0 disables wrapping)
        #[arg(long, default_value_t = 0)]
        wrap: usize,
    },

    /// List supported formats and their file extensions.
    Formats {
        /// Directory with plugin manifests
        #[arg(long, env = PLUGIN_DIR_ENV)]
        plugin_dir: Option<PathBuf>,
    },
}

/// Options of one extract invocation.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub skip_subject: Option<String>,
    pub max_headers: Option<usize>,
    pub plugin_dir: Option<PathBuf>,
    pub wrap: usize,
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            files,
            format,
            output,
            after,
            before,
            skip_subject,
            max_headers,
            plugin_dir,
            wrap,
        } => extract_command(
            &files,
            &ExtractOptions {
                format,
                output,
                after,
                before,
                skip_subject,
                max_headers,
                plugin_dir,
                wrap,
            },
        ),
        Commands::Formats { plugin_dir } => formats_command(plugin_dir.as_deref()),
    }
}

fn load_manager(plugin_dir: Option<&Path>) -> Result<ParserManager> {
    match plugin_dir {
        Some(dir) => ParserManager::with_plugin_dir(dir),
        None => Ok(ParserManager::with_builtin()),
    }
}

/// Build the mail date window from `--after` / `--before`.
fn date_parameters(after: Option<&str>, before: Option<&str>) -> Result<Parameters> {
    let mut parameters = Parameters::new();
    if let Some(after) = after {
        parameters = parameters.with_uint(PARAM_DATE_FROM, parse_date_bound(after, false)?);
    }
    if let Some(before) = before {
        parameters = parameters.with_uint(PARAM_DATE_TO, parse_date_bound(before, true)?);
    }
    Ok(parameters)
}

/// Skip mail headers (and so whole messages) whose subject matches.
fn subject_filter(pattern: &str) -> Result<Transformer> {
    let regex = Regex::new(pattern)?;
    Ok(Transformer::filter(move |event: &NodeEvent| {
        event.tag() == &Tag::MailHeader && regex.is_match(event.string_attribute("subject"))
    }))
}

/// Cancel the traversal at the first mail header past `limit`.
///
/// The count spans every input of the chain.
fn header_limit(limit: usize) -> Transformer {
    let seen = Rc::new(Cell::new(0_usize));
    Transformer::new(move |event: &mut NodeEvent| {
        if event.tag() == &Tag::MailHeader {
            seen.set(seen.get() + 1);
            if seen.get() > limit {
                event.set_cancel();
            }
        }
    })
}

/// Execute the extract command.
pub fn extract_command(files: &[PathBuf], options: &ExtractOptions) -> Result<()> {
    // Validate everything before reading any document
    let parameters = date_parameters(options.after.as_deref(), options.before.as_deref())?;
    let manager = Arc::new(load_manager(options.plugin_dir.as_deref())?);

    for file in files {
        let name = file.to_string_lossy();
        if !manager.supports(&name) {
            return Err(DocwalkError::FormatNotSupported {
                name: name.into_owned(),
                available: manager.available_formats(),
            });
        }
    }

    let mut fragment = Fragment::new(Importer::new(Arc::clone(&manager)).with_parameters(parameters));
    if let Some(pattern) = options.skip_subject.as_deref() {
        fragment = fragment.then(subject_filter(pattern)?);
    }
    if let Some(limit) = options.max_headers {
        fragment = fragment.then(header_limit(limit));
    }

    let sink: Box<dyn Write> = match &options.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    };
    let writer: Box<dyn Writer> = match options.format {
        OutputFormat::Text => Box::new(TextWriter::new().with_wrap(options.wrap)),
        OutputFormat::Html => Box::new(HtmlWriter::new()),
    };
    let exporter = Exporter::new(writer, sink).with_framing(Framing::Session);
    let mut chain = fragment.build([exporter.clone()])?;

    // Progress goes to the terminal only when stdout is not the output
    let pb = options.output.as_ref().map(|_| {
        let pb = ProgressBar::new_spinner();
        #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .expect("valid template"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    });

    let mut result = Ok(());
    for file in files {
        if let Some(pb) = &pb {
            pb.set_message(format!("Reading {}...", file.display()));
        }

        let run = Input::from_file(file).and_then(|input| chain.set_input(input));
        match run {
            Ok(summary) if summary.is_cancelled() => {
                tracing::info!(file = %file.display(), "Header limit reached, stopping");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }

    let closed = exporter.close();
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }
    result?;
    closed?;

    if let Some(path) = &options.output {
        println!(
            "{} {} ({} files, {} nodes written)",
            style("Saved to:").green().bold(),
            path.display(),
            chain.runs(),
            exporter.events_written()
        );
    }

    Ok(())
}

/// Execute the formats command.
fn formats_command(plugin_dir: Option<&Path>) -> Result<()> {
    let manager = load_manager(plugin_dir)?;

    println!("{}", style("Supported formats").bold());
    for format in manager.available_formats() {
        println!(
            "  {} {}",
            style(format!("{format:<8}")).cyan(),
            manager.extensions_for(&format).join(", ")
        );
    }
    Ok(())
}
