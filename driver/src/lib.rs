use error_stack::ResultExt;

use kernel::KernelError;

use crate::error::DriverError;

pub mod database;
pub mod error;

/// Reads `key` from the environment, loading `.env` on first use.
pub fn env(key: &str) -> error_stack::Result<String, KernelError> {
    dotenvy::var(key)
        .map_err(DriverError::from)
        .change_context(KernelError::Internal)
        .attach_printable_lazy(|| format!("environment variable `{key}` is not available"))
}

pub fn env_or(key: &str, default: &str) -> String {
    dotenvy::var(key).unwrap_or_else(|_| default.to_string())
}
