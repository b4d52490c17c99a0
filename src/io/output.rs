use crate::core::{AuditReport, FindingKind, RiskLevel, Severity};
use colored::*;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

pub trait OutputWriter {
    fn write_report(&mut self, report: &AuditReport) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_report(&mut self, report: &AuditReport) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_report(&mut self, report: &AuditReport) -> anyhow::Result<()> {
        self.write_header(report)?;
        self.write_summary(report)?;
        self.write_red_flags(report)?;
        self.write_narrative(report)?;
        Ok(())
    }
}

impl<W: Write> MarkdownWriter<W> {
    fn write_header(&mut self, report: &AuditReport) -> anyhow::Result<()> {
        writeln!(self.writer, "# Spreadsheet Audit: {}", report.filename)?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "Generated: {}",
            report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_summary(&mut self, report: &AuditReport) -> anyhow::Result<()> {
        let risk = &report.risk_assessment;

        writeln!(self.writer, "## Summary")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Metric | Value |")?;
        writeln!(self.writer, "|--------|-------|")?;
        self.write_summary_row(
            "Risk",
            &format!("{} ({}/100)", risk.risk_level, risk.score),
        )?;
        self.write_summary_row("Sheets", &report.sheets.len().to_string())?;
        self.write_summary_row(
            "Formulas",
            &report.complexity_metrics.total_formulas.to_string(),
        )?;
        self.write_summary_row("Purpose", &report.inferred_purpose)?;
        self.write_summary_row(
            "Circular references",
            &report.circular_references.len().to_string(),
        )?;
        self.write_summary_row(
            "Formula inconsistencies",
            &report.formula_inconsistencies.len().to_string(),
        )?;
        self.write_summary_row(
            "Hardcoded overrides",
            &report.hardcoded_overrides.len().to_string(),
        )?;
        self.write_summary_row("Error cells", &report.errors_found.len().to_string())?;
        self.write_summary_row(
            "Hidden sheets",
            &report.hidden_content.hidden_sheets.len().to_string(),
        )?;
        self.write_summary_row("Contains VBA", if report.has_vba { "yes" } else { "no" })?;
        if report.truncated {
            self.write_summary_row("Scan truncated", "yes")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_summary_row(&mut self, metric: &str, value: &str) -> anyhow::Result<()> {
        writeln!(self.writer, "| {metric} | {value} |")?;
        Ok(())
    }

    fn write_red_flags(&mut self, report: &AuditReport) -> anyhow::Result<()> {
        let risk = &report.risk_assessment;
        if risk.risk_factors.is_empty() {
            return Ok(());
        }

        writeln!(self.writer, "## Red Flags")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Factor | Points | Detail |")?;
        writeln!(self.writer, "|--------|--------|--------|")?;
        for factor in &risk.risk_factors {
            writeln!(
                self.writer,
                "| {} | {} | {} |",
                factor.name, factor.points, factor.detail
            )?;
        }
        writeln!(self.writer)?;

        if !risk.high_risk_cells.is_empty() {
            writeln!(
                self.writer,
                "### High-Risk Cells ({})",
                risk.high_risk_cells.len()
            )?;
            writeln!(self.writer)?;
            for cell in &risk.high_risk_cells {
                writeln!(
                    self.writer,
                    "- `{}` - {} ({})",
                    cell.cell,
                    kind_label(cell.kind),
                    cell.severity
                )?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_narrative(&mut self, report: &AuditReport) -> anyhow::Result<()> {
        writeln!(self.writer, "## Assessment")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", report.narrative)?;
        Ok(())
    }
}

pub struct TerminalWriter;

impl Default for TerminalWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalWriter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputWriter for TerminalWriter {
    fn write_report(&mut self, report: &AuditReport) -> anyhow::Result<()> {
        print_header(report);
        print_risk(report);
        print_findings(report);
        print_narrative(report);
        Ok(())
    }
}

fn print_header(report: &AuditReport) {
    let title = format!("Spreadsheet Audit: {}", report.filename);
    println!("{}", title.bold().blue());
    println!("{}", "=".repeat(title.len()).blue());
    println!();
    println!(
        "  Sheets: {}  Formulas: {}  Purpose: {}",
        report.sheets.len(),
        report.complexity_metrics.total_formulas,
        report.inferred_purpose
    );
    if report.truncated {
        println!("  {}", "Scan truncated at cell ceiling".yellow());
    }
    println!();
}

fn print_risk(report: &AuditReport) {
    let risk = &report.risk_assessment;
    let level = match risk.risk_level {
        RiskLevel::Low => risk.risk_level.to_string().green(),
        RiskLevel::Medium => risk.risk_level.to_string().yellow(),
        RiskLevel::High | RiskLevel::Critical => risk.risk_level.to_string().red().bold(),
    };
    println!("Risk: {} ({}/100)", level, risk.score);
    for factor in &risk.risk_factors {
        println!("  +{:<3} {} - {}", factor.points, factor.name, factor.detail);
    }
    println!();
}

fn print_findings(report: &AuditReport) {
    let cells = &report.risk_assessment.high_risk_cells;
    if cells.is_empty() {
        return;
    }
    println!("{} ({}):", "High-risk cells".bold(), cells.len());
    for cell in cells {
        println!(
            "  {} {} ({})",
            severity_tag(cell.severity),
            cell.cell,
            kind_label(cell.kind)
        );
    }
    println!();
}

fn print_narrative(report: &AuditReport) {
    println!("{}", "Assessment".bold());
    println!("{}", report.narrative);
}

fn severity_tag(severity: Severity) -> ColoredString {
    let tag = format!("[{severity}]");
    match severity {
        Severity::Critical => tag.red().bold(),
        Severity::High => tag.red(),
        Severity::Medium => tag.yellow(),
        Severity::Low | Severity::Info => tag.normal(),
    }
}

fn kind_label(kind: FindingKind) -> &'static str {
    match kind {
        FindingKind::CircularReference => "circular reference",
        FindingKind::FormulaInconsistency => "formula inconsistency",
        FindingKind::HardcodedOverride => "hardcoded override",
        FindingKind::HiddenContent => "hidden content",
        FindingKind::ExcelError => "error value",
        FindingKind::VolatileFunctionCluster => "volatile functions",
    }
}

pub fn create_writer(format: OutputFormat) -> Box<dyn OutputWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(std::io::stdout())),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(std::io::stdout())),
        OutputFormat::Terminal => Box::new(TerminalWriter::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditConfig;
    use crate::core::Workbook;

    fn empty_report() -> AuditReport {
        let workbook = Workbook::new("empty.xlsx");
        crate::analysis::analyze_workbook(&workbook, &AuditConfig::default())
    }

    #[test]
    fn json_writer_emits_stable_field_names() {
        let report = empty_report();
        let mut buf = Vec::new();
        JsonWriter::new(&mut buf).write_report(&report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        for field in [
            "\"filename\"",
            "\"risk_assessment\"",
            "\"circular_references\"",
            "\"formula_inconsistencies\"",
            "\"hardcoded_overrides\"",
            "\"hidden_content\"",
            "\"narrative\"",
        ] {
            assert!(text.contains(field), "missing {field}");
        }
    }

    #[test]
    fn json_output_round_trips() {
        let report = empty_report();
        let mut buf = Vec::new();
        JsonWriter::new(&mut buf).write_report(&report).unwrap();
        let parsed: AuditReport = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed.filename, report.filename);
        assert_eq!(parsed.risk_assessment.score, report.risk_assessment.score);
    }

    #[test]
    fn markdown_writer_includes_summary_and_assessment() {
        let report = empty_report();
        let mut buf = Vec::new();
        MarkdownWriter::new(&mut buf).write_report(&report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("# Spreadsheet Audit: empty.xlsx"));
        assert!(text.contains("## Summary"));
        assert!(text.contains("## Assessment"));
    }

    #[test]
    fn clean_workbook_markdown_has_no_red_flags_section() {
        let report = empty_report();
        let mut buf = Vec::new();
        MarkdownWriter::new(&mut buf).write_report(&report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(!text.contains("## Red Flags"));
    }

    #[test]
    fn finding_kinds_have_labels() {
        let kinds = [
            FindingKind::CircularReference,
            FindingKind::FormulaInconsistency,
            FindingKind::HardcodedOverride,
            FindingKind::HiddenContent,
            FindingKind::ExcelError,
            FindingKind::VolatileFunctionCluster,
        ];
        for kind in kinds {
            assert!(!kind_label(kind).is_empty());
        }
    }
}
