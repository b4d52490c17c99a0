pub mod parser;
pub mod pattern;

pub use parser::{functions_in, nesting_depth, normalize_reference, references_in};
pub use pattern::normalize_pattern;
