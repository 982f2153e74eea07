mod logger;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sheetkit_io_xlsx::SpecReadOptions;
use sheetkit_layout::conf::{
    C_FONT_NAME_DEFAULT, C_LINK_LABEL_DEFAULT, N_BLOCK_SPACING_DEFAULT, N_FONT_SIZE_DEFAULT,
};
use sheetkit_layout::{ReportLayout, SpecPivotOptions, SpecReflowOptions, SpecStyleOptions};

#[derive(Parser, Debug)]
#[command(name = "sheetkit", about = "Re-lay spreadsheet tables for reading and printing.")]
struct Cli {
    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Repeat banner/header/data/blank blocks, one per source row.
    Reflow(ReflowArgs),
    /// Turn every complete source row into a vertical label/value list.
    Pivot(PivotArgs),
}

/// Arguments shared by both pipelines.
#[derive(Args, Debug)]
struct CommonArgs {
    /// Source workbook.
    input: PathBuf,

    /// Output workbook (overwritten).
    output: PathBuf,

    /// Retained column, in output order (repeatable).
    #[arg(long = "column", value_name = "NAME", required = true)]
    columns: Vec<String>,

    /// Source worksheet; defaults to the first one.
    #[arg(long, value_name = "NAME")]
    sheet: Option<String>,

    #[arg(long, value_name = "NAME", default_value = C_FONT_NAME_DEFAULT)]
    font_name: String,

    #[arg(long, value_name = "PT", default_value_t = N_FONT_SIZE_DEFAULT)]
    font_size: i64,
}

impl CommonArgs {
    fn read_options(&self) -> SpecReadOptions {
        SpecReadOptions {
            sheet_name: self.sheet.clone(),
            ..Default::default()
        }
    }

    fn style_options(&self) -> SpecStyleOptions {
        SpecStyleOptions {
            font_name: self.font_name.clone(),
            font_size: self.font_size,
        }
    }
}

#[derive(Args, Debug)]
struct ReflowArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Banner text placed above every header row.
    #[arg(long, value_name = "TEXT")]
    banner: Option<String>,
}

impl ReflowArgs {
    fn to_options(&self) -> SpecReflowOptions {
        SpecReflowOptions {
            banner_text: self.banner.clone(),
            read_options: self.common.read_options(),
            style_options: self.common.style_options(),
            ..SpecReflowOptions::with_columns(self.common.columns.iter().cloned())
        }
    }
}

#[derive(Args, Debug)]
struct PivotArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Link placed above every record.
    #[arg(long, value_name = "TEXT")]
    link: Option<String>,

    /// Label cell of the link row.
    #[arg(long, value_name = "TEXT", default_value = C_LINK_LABEL_DEFAULT)]
    link_label: String,

    /// Blank spacers between page breaks.
    #[arg(long, value_name = "N", default_value_t = N_BLOCK_SPACING_DEFAULT)]
    spacing: usize,
}

impl PivotArgs {
    fn to_options(&self) -> SpecPivotOptions {
        SpecPivotOptions {
            link_text: self.link.clone(),
            link_label: self.link_label.clone(),
            block_spacing: self.spacing,
            read_options: self.common.read_options(),
            style_options: self.common.style_options(),
            ..SpecPivotOptions::with_columns(self.common.columns.iter().cloned())
        }
    }
}

fn run(cli: &Cli) -> Result<ReportLayout> {
    match &cli.command {
        Command::Reflow(args) => sheetkit_layout::reflow(
            &args.common.input,
            &args.common.output,
            &args.to_options(),
        )
        .with_context(|| format!("reflow {} failed", args.common.input.display())),
        Command::Pivot(args) => sheetkit_layout::pivot(
            &args.common.input,
            &args.common.output,
            &args.to_options(),
        )
        .with_context(|| format!("pivot {} failed", args.common.input.display())),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(logger::derive_level_filter(cli.verbose, cli.quiet));

    match run(&cli) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
