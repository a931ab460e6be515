//! CLI Exit Code Registry
//!
//! Single source of truth for all `stocksight` exit codes. Exit codes are
//! part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                              |
//! |---------|-----------|------------------------------------------|
//! | 0       | Universal | Success                                  |
//! | 1       | Universal | General error (unspecified)              |
//! | 2       | Universal | CLI usage error (bad args)               |
//! | 60-69   | analysis  | Config, input and output failures        |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Map it in [`analysis_exit_code`] if it comes from the engine

use stocksight_analysis::AnalysisError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
/// Also what clap exits with on a parse failure.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Analysis (60-69)
// =============================================================================

/// Invalid config file or parameters (bad TOML, thresholds out of order,
/// `window_days <= 0`).
pub const EXIT_INVALID_CONFIG: u8 = 60;

/// An input snapshot could not be read or parsed (missing file, missing key
/// column, broken CSV quoting).
pub const EXIT_INPUT: u8 = 61;

/// Result or export file could not be written.
pub const EXIT_OUTPUT: u8 = 62;

/// Map an engine error to its exit code.
pub fn analysis_exit_code(err: &AnalysisError) -> u8 {
    match err {
        AnalysisError::ConfigParse(_)
        | AnalysisError::ConfigValidation(_)
        | AnalysisError::Parameter(_) => EXIT_INVALID_CONFIG,
        AnalysisError::MissingColumn { .. } | AnalysisError::Csv(_) | AnalysisError::Source(_) => EXIT_INPUT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_documented_codes() {
        assert_eq!(analysis_exit_code(&AnalysisError::Parameter("x".into())), 60);
        assert_eq!(analysis_exit_code(&AnalysisError::ConfigParse("x".into())), 60);
        assert_eq!(
            analysis_exit_code(&AnalysisError::MissingColumn {
                table: "stock".into(),
                column: "product_id".into()
            }),
            61
        );
        assert_eq!(analysis_exit_code(&AnalysisError::Source("x".into())), 61);
    }

    #[test]
    fn codes_are_distinct() {
        let codes = [EXIT_SUCCESS, EXIT_ERROR, EXIT_USAGE, EXIT_INVALID_CONFIG, EXIT_INPUT, EXIT_OUTPUT];
        let unique: std::collections::BTreeSet<u8> = codes.iter().copied().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
