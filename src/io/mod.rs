pub mod output;
pub mod xlsx;

pub use output::{create_writer, JsonWriter, MarkdownWriter, OutputFormat, OutputWriter};
pub use xlsx::load_workbook;
