use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::config::CONFIG_FILE_NAME;

const DEFAULT_CONFIG: &str = r#"# sheetaudit configuration

[thresholds]
# Fraction of a column that must share one pattern before minorities are flagged.
dominance_ratio = 0.7
minority_max = 2
min_column_formulas = 3

# Hardcoded override detection.
min_populated_cells = 5
formula_fraction = 0.7
round_number_threshold = 10000.0

# Scan ceilings.
max_cells = 50000
hidden_row_scan_limit = 1000
hidden_col_scan_limit = 50

[scoring]
# Risk level boundaries on the 0-100 score.
critical_threshold = 60
high_threshold = 40
medium_threshold = 20
"#;

pub fn init_config(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    fs::write(&config_path, DEFAULT_CONFIG)?;
    println!("Created {CONFIG_FILE_NAME} configuration file");

    Ok(())
}
