use std::fmt::Display;

use error_stack::Context;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum KernelError {
    Concurrency,
    Timeout,
    /// A parent or target resource does not exist.
    NotFound,
    /// Input could not be interpreted (malformed key list, failed patch operation).
    Malformed,
    /// Business rules rejected the input. Violations are attached to the report.
    Validation,
    Internal,
}

impl Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelError::Concurrency => write!(f, "Concurrency error"),
            KernelError::Timeout => write!(f, "Process timed out"),
            KernelError::NotFound => write!(f, "Resource not found"),
            KernelError::Malformed => write!(f, "Malformed input"),
            KernelError::Validation => write!(f, "Validation failed"),
            KernelError::Internal => write!(f, "Internal kernel error"),
        }
    }
}

impl Context for KernelError {}
