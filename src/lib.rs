// Export modules for library usage
pub mod analysis;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod formula;
pub mod graph;
pub mod io;
pub mod risk;

// Re-export commonly used types
pub use crate::core::{
    AuditReport, Cell, CellRef, CellValue, ComplexityMetrics, FindingKind, FindingSet,
    HiddenContentReport, HighRiskCell, InconsistencyFinding, OverrideFinding, RiskAssessment,
    RiskFactor, RiskLevel, Severity, Sheet, SheetVisibility, Workbook,
};

pub use crate::analysis::analyze_workbook;
pub use crate::config::{AuditConfig, CONFIG_FILE_NAME};
pub use crate::error::{AuditError, AuditResult};
pub use crate::graph::DependencyGraph;
pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};
pub use crate::io::xlsx::load_workbook;
pub use crate::risk::assess;
