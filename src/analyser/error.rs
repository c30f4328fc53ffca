//! Error types for the analyser.

use thiserror::Error;

/// Analyser error types.
///
/// Every variant is fatal to the current query; nothing is retried or
/// silently defaulted.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Malformed IPv4 literal
    #[error("invalid IPv4 address: {0}")]
    AddressParse(String),

    /// Malformed CIDR literal
    #[error("invalid CIDR subnet: {0}")]
    SubnetParse(String),

    /// Quantile outside the closed unit interval
    #[error("quantile {0} outside [0,1]")]
    InvalidQuantile(f64),

    /// Thresholding attempted with zero distinct sources
    #[error("no source metrics: no connection pairs survived filtering")]
    EmptyPopulation,

    /// Failure reading the delimited input
    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for analyser operations.
pub type Result<T> = std::result::Result<T, ScanError>;
