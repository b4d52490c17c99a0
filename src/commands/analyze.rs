use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::analysis;
use crate::config::AuditConfig;
use crate::io::{self, JsonWriter, MarkdownWriter, OutputWriter};

pub struct AnalyzeConfig {
    pub path: PathBuf,
    pub format: crate::cli::OutputFormat,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub max_cells: Option<usize>,
}

pub fn handle_analyze(options: AnalyzeConfig) -> Result<()> {
    let mut config = match &options.config {
        Some(path) => AuditConfig::from_toml(&fs::read_to_string(path)?)?,
        None => AuditConfig::discover(&options.path)?,
    };
    if let Some(ceiling) = options.max_cells {
        config.thresholds.max_cells = ceiling;
    }

    let workbook = io::load_workbook(&options.path, &config)?;
    log::info!(
        "loaded {} ({} sheets, {} formula cells)",
        workbook.filename,
        workbook.sheets.len(),
        workbook.formula_cells().len()
    );

    let report = analysis::analyze_workbook(&workbook, &config);

    match options.output {
        Some(path) => {
            let file = fs::File::create(&path)?;
            // Terminal output is for humans at a tty; a file target gets
            // markdown instead.
            let mut writer: Box<dyn OutputWriter> = match options.format {
                crate::cli::OutputFormat::Json => Box::new(JsonWriter::new(file)),
                crate::cli::OutputFormat::Markdown | crate::cli::OutputFormat::Terminal => {
                    Box::new(MarkdownWriter::new(file))
                }
            };
            writer.write_report(&report)?;
            log::info!("report written to {}", path.display());
        }
        None => {
            let mut writer = io::create_writer(options.format.into());
            writer.write_report(&report)?;
        }
    }
    Ok(())
}
