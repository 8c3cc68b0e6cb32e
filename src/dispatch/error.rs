// src/dispatch/error.rs

use std::fmt;

/// Why a message did not reach (or was refused by) its receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Nobody is listening on the other end.
    Unreachable,
    /// The target exists but its executor is gone (e.g. after navigation).
    ExecutorMissing,
    /// The receiver got the message and refused it.
    Rejected(String),
}

impl DeliveryError {
    /// Errors after which the target's executor must be reinstalled.
    pub fn invalidates_target(&self) -> bool {
        matches!(self, Self::Unreachable | Self::ExecutorMissing)
    }
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => f.write_str("receiving end does not exist"),
            Self::ExecutorMissing => f.write_str("executor not installed in target"),
            Self::Rejected(reason) => write!(f, "message rejected: {}", reason),
        }
    }
}

impl std::error::Error for DeliveryError {}
