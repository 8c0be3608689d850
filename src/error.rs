use std::fmt;

use thiserror::Error;

/// Pipeline stage that produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reading and validating the compound table.
    Input,
    /// Feature standardization.
    Standardize,
    /// Nonlinear 2-D embedding.
    Embed,
    /// Centroid-based partitioning.
    Partition,
    /// Per-cluster exemplar selection.
    Exemplar,
    /// Merging results back onto the compound table.
    Assemble,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Input => "input",
            Stage::Standardize => "standardize",
            Stage::Embed => "embed",
            Stage::Partition => "partition",
            Stage::Exemplar => "exemplar",
            Stage::Assemble => "assemble",
        };
        f.write_str(name)
    }
}

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or non-numeric descriptor values, or a schema mismatch.
    #[error("{stage}: invalid input: {message}")]
    InvalidInput {
        /// Stage that rejected the input.
        stage: Stage,
        /// Human-readable explanation.
        message: String,
    },

    /// Fewer rows than the neighborhood size or cluster count requires.
    #[error("{stage}: insufficient samples: need at least {required}, but dataset has {n_items}")]
    InsufficientSamples {
        /// Stage that needed more rows.
        stage: Stage,
        /// Minimum number of rows.
        required: usize,
        /// Number of rows supplied.
        n_items: usize,
    },

    /// The data cannot be meaningfully separated (e.g. every point identical).
    #[error("{stage}: degenerate input: {message}")]
    DegenerateInput {
        /// Stage that detected the degeneracy.
        stage: Stage,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// I/O failure while reading input or writing output.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV.
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed configuration file.
    #[error("config: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_input(stage: Stage, message: impl Into<String>) -> Self {
        Error::InvalidInput {
            stage,
            message: message.into(),
        }
    }

    /// The stage that failed, for algorithmic errors.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::InvalidInput { stage, .. }
            | Error::InsufficientSamples { stage, .. }
            | Error::DegenerateInput { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_stage() {
        let err = Error::InsufficientSamples {
            stage: Stage::Partition,
            required: 12,
            n_items: 5,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("partition:"), "{msg}");
        assert!(msg.contains("12") && msg.contains('5'));
        assert_eq!(err.stage(), Some(Stage::Partition));
    }

    #[test]
    fn parameter_errors_have_no_stage() {
        let err = Error::InvalidParameter {
            name: "min_dist",
            message: "must be non-negative",
        };
        assert_eq!(err.stage(), None);
    }
}
