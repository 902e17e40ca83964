// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blattwerk — page-level PDF tools on the command line.
//
// Entry point. Parses arguments, loads settings, initialises logging, and
// runs one tool.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use blattwerk_core::EditorConfig;
use blattwerk_core::human_errors::humanize_error;
use blattwerk_core::types::Rect;
use blattwerk_document::NumberPosition;

use commands::OrganizeToken;

#[derive(Parser, Debug)]
#[command(name = "blattwerk", version)]
#[command(about = "Merge, split, extract, remove, rotate, crop, organize and number PDF pages")]
struct Cli {
    /// Settings file (JSON). Missing files fall back to defaults.
    #[arg(long, global = true, default_value = "blattwerk.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Destination of a tool's result.
#[derive(Args, Debug, Clone)]
pub struct OutputArg {
    /// Output file. Defaults to a name derived from the tool, in the current
    /// directory.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Join documents in the order given.
    Merge {
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        #[command(flatten)]
        output: OutputArg,
    },
    /// Split into several documents, zipped when there is more than one.
    Split {
        input: PathBuf,
        /// Pages per output document.
        #[arg(long, conflicts_with = "range", required_unless_present = "range")]
        every: Option<String>,
        /// One output document per range expression, e.g. "1-3,5".
        #[arg(long)]
        range: Vec<String>,
        #[command(flatten)]
        output: OutputArg,
    },
    /// Keep only the given pages.
    Extract {
        input: PathBuf,
        #[arg(long)]
        pages: String,
        #[command(flatten)]
        output: OutputArg,
    },
    /// Drop the given pages.
    Remove {
        input: PathBuf,
        #[arg(long)]
        pages: String,
        #[command(flatten)]
        output: OutputArg,
    },
    /// Turn pages by a multiple of 90 degrees (clockwise).
    Rotate {
        input: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        degrees: i64,
        /// Pages to turn; all when omitted.
        #[arg(long)]
        pages: Option<String>,
        #[command(flatten)]
        output: OutputArg,
    },
    /// Crop pages to a rectangle measured from the top-left of the page as
    /// displayed.
    Crop {
        input: PathBuf,
        /// X,Y,WIDTH,HEIGHT in display units.
        #[arg(long, value_parser = commands::parse_rect)]
        rect: Rect,
        /// Display units per point the rectangle was measured at.
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
        /// Pages to crop; all when omitted.
        #[arg(long)]
        pages: Option<String>,
        #[command(flatten)]
        output: OutputArg,
    },
    /// Rebuild the page order, e.g. "3,1:90,blank,2".
    Organize {
        input: PathBuf,
        /// Page numbers (optionally ":DEGREES") or "blank", comma separated.
        #[arg(long, required = true, value_delimiter = ',', value_parser = commands::parse_organize_token)]
        order: Vec<OrganizeToken>,
        #[command(flatten)]
        output: OutputArg,
    },
    /// Stamp page numbers.
    Number {
        input: PathBuf,
        /// One of top|middle|bottom followed by left|center|right.
        #[arg(long, default_value = "bottom-center")]
        position: NumberPosition,
        /// Label text; {n} is the page number, {p} the count of numbered pages.
        #[arg(long, default_value = "{n}")]
        format: String,
        #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
        start: i64,
        /// Pages to number; all when omitted.
        #[arg(long)]
        pages: Option<String>,
        /// Mirror left/right positions on even pages.
        #[arg(long)]
        facing: bool,
        #[arg(long)]
        bold: bool,
        #[arg(long)]
        italic: bool,
        #[arg(long, default_value = "#000000")]
        color: String,
        #[command(flatten)]
        output: OutputArg,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, config_error) = match EditorConfig::load(&cli.config) {
        Ok(config) => (config, None),
        Err(err) => (EditorConfig::default(), Some(err)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    if let Some(err) = config_error {
        return report(&err);
    }

    tracing::debug!(command = ?cli.command, "Blattwerk starting");

    match commands::run(cli.command, config).await {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => report(&err),
    }
}

fn report(err: &blattwerk_core::BlattwerkError) -> ExitCode {
    tracing::error!(error = %err, "command failed");
    let human = humanize_error(err);
    eprintln!("error: {}", human.message);
    eprintln!("  {}", human.suggestion);
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn split_needs_exactly_one_mode() {
        assert!(Cli::try_parse_from(["blattwerk", "split", "in.pdf"]).is_err());
        assert!(
            Cli::try_parse_from(["blattwerk", "split", "in.pdf", "--every", "2", "--range", "1"])
                .is_err()
        );
        let cli = Cli::try_parse_from([
            "blattwerk", "split", "in.pdf", "--range", "1-2", "--range", "3",
        ])
        .expect("parse");
        assert!(matches!(cli.command, Command::Split { ref range, .. } if range.len() == 2));
    }

    #[test]
    fn negative_rotation_and_organize_tokens_parse() {
        let cli = Cli::try_parse_from(["blattwerk", "rotate", "in.pdf", "--degrees", "-90"])
            .expect("parse");
        assert!(matches!(cli.command, Command::Rotate { degrees: -90, .. }));

        let cli = Cli::try_parse_from([
            "blattwerk", "organize", "in.pdf", "--order", "3,1:90,blank",
        ])
        .expect("parse");
        let Command::Organize { order, .. } = cli.command else {
            panic!("wrong command");
        };
        assert_eq!(
            order,
            vec![
                OrganizeToken::Page { number: 3, degrees: 0 },
                OrganizeToken::Page { number: 1, degrees: 90 },
                OrganizeToken::Blank,
            ]
        );
    }
}
