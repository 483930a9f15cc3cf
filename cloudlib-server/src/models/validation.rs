//! Validation error types

use std::fmt;

/// Validation error for incoming books
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format (e.g., ISBN)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Number outside the accepted range
    OutOfRange { field: &'static str, reason: &'static str },

    /// A book inside a batch failed validation
    InBatch { index: usize, error: Box<ValidationError> },
}

impl ValidationError {
    /// Attach the position of the offending book in its batch
    pub fn at(self, index: usize) -> Self {
        Self::InBatch {
            index,
            error: Box::new(self),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } | Self::OutOfRange { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::InBatch { index, error } => write!(f, "book #{}: {}", index, error),
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "title",
            max: 512,
        };
        assert_eq!(
            err.to_string(),
            "title exceeds maximum length of 512 characters"
        );
    }

    #[test]
    fn batch_errors_name_the_index() {
        let err = ValidationError::Empty { field: "isbn" }.at(3);
        assert_eq!(err.to_string(), "book #3: isbn cannot be empty");
    }
}
