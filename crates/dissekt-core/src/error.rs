//! Error types for the dissekt-core library.
//!
//! Analyzers return these internally; none of them escape [`crate::analyze`].
//! An underrun becomes a terminal "Unrecognized data" field, a malformed
//! structure becomes an error-colored field, and an abort stops the current
//! format early.

use thiserror::Error;

/// Result type alias for dissekt operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all dissekt operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A fixed-size read would run past the end of the buffer
    #[error("read of {needed} bytes at offset {offset} exceeds buffer of {available} bytes")]
    Underrun {
        /// Offset where the read started
        offset: usize,
        /// Number of bytes requested
        needed: usize,
        /// Total length of the buffer
        available: usize,
    },

    /// A structure violates its format in a way the analyzer cannot walk past
    #[error("malformed data at offset {offset}: {details}")]
    Malformed {
        /// Offset of the offending structure
        offset: usize,
        /// Description of the violation
        details: String,
    },

    /// The analysis was stopped to bound output on pathological input
    #[error("analysis aborted: {reason}")]
    Aborted {
        /// Why the analysis stopped
        reason: String,
    },
}

impl Error {
    /// Creates a new underrun error
    pub fn underrun(offset: usize, needed: usize, available: usize) -> Self {
        Self::Underrun {
            offset,
            needed,
            available,
        }
    }

    /// Creates a new malformed data error
    pub fn malformed(offset: usize, details: impl Into<String>) -> Self {
        Self::Malformed {
            offset,
            details: details.into(),
        }
    }

    /// Creates a new abort error
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }

    /// Returns the buffer offset the error refers to, if any
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Underrun { offset, .. } | Self::Malformed { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Returns true if the error stops the whole format analysis, not just
    /// the structure being walked
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::underrun(10, 4, 12);
        assert!(err.to_string().contains("offset 10"));
        assert!(err.to_string().contains("12 bytes"));
    }

    #[test]
    fn test_offset() {
        assert_eq!(Error::underrun(7, 1, 7).offset(), Some(7));
        assert_eq!(Error::malformed(3, "bad class").offset(), Some(3));
        assert_eq!(Error::aborted("too many tags").offset(), None);
    }

    #[test]
    fn test_is_abort() {
        assert!(Error::aborted("x").is_abort());
        assert!(!Error::underrun(0, 1, 0).is_abort());
    }
}
