//! CLI command implementations.
//!
//! - **analyze**: audit a workbook and emit the structured report
//! - **init**: write a starter configuration file

pub mod analyze;
pub mod init;

pub use analyze::handle_analyze;
pub use init::init_config;
