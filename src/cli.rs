use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sheetaudit")]
#[command(about = "Forensic spreadsheet auditor for xlsx workbooks", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit a workbook for structural red flags
    Analyze {
        /// Path to the .xlsx or .xlsm file
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (defaults to discovering .sheetaudit.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Stop scanning after this many cells
        #[arg(long = "max-cells")]
        max_cells: Option<usize>,

        /// Increase verbosity level (can be repeated: -v, -vv)
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbosity: u8,
    },

    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

impl From<OutputFormat> for crate::io::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => crate::io::OutputFormat::Json,
            OutputFormat::Markdown => crate::io::OutputFormat::Markdown,
            OutputFormat::Terminal => crate::io::OutputFormat::Terminal,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_defaults_to_terminal_format() {
        let cli = Cli::try_parse_from(["sheetaudit", "analyze", "book.xlsx"]).unwrap();
        match cli.command {
            Commands::Analyze {
                path,
                format,
                output,
                max_cells,
                verbosity,
                ..
            } => {
                assert_eq!(path, PathBuf::from("book.xlsx"));
                assert_eq!(format, OutputFormat::Terminal);
                assert!(output.is_none());
                assert!(max_cells.is_none());
                assert_eq!(verbosity, 0);
            }
            _ => panic!("expected analyze command"),
        }
    }

    #[test]
    fn analyze_accepts_json_and_cell_ceiling() {
        let cli = Cli::try_parse_from([
            "sheetaudit",
            "analyze",
            "book.xlsx",
            "--format",
            "json",
            "--max-cells",
            "1000",
            "-vv",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze {
                format,
                max_cells,
                verbosity,
                ..
            } => {
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(max_cells, Some(1000));
                assert_eq!(verbosity, 2);
            }
            _ => panic!("expected analyze command"),
        }
    }

    #[test]
    fn init_parses_force_flag() {
        let cli = Cli::try_parse_from(["sheetaudit", "init", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Init { force: true }));
    }

    #[test]
    fn missing_path_is_an_error() {
        assert!(Cli::try_parse_from(["sheetaudit", "analyze"]).is_err());
    }
}
