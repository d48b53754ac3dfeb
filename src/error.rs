use std::path::PathBuf;
use thiserror::Error;

/// Fatal pipeline errors. Everything here halts the run before any output is
/// written; recoverable data problems (bad transaction dates, filtered rows)
/// are handled in-band and never surface as errors.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("missing required input file: {}", .0.display())]
    MissingInput(PathBuf),

    /// Strict price-date parsing failure. The transaction path coerces bad
    /// dates to null instead; see the sanitizer.
    #[error("unparseable date {value:?} at {file} line {line}")]
    DateParse {
        file: String,
        line: usize,
        value: String,
    },

    #[error("schema error in {file}: {reason}")]
    Schema { file: String, reason: String },
}
