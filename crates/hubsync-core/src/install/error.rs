//! Per-library install errors.
//!
//! None of these abort a sync pass; the orchestrator logs them against the
//! machine name and moves on to the next catalog entry.

use thiserror::Error;

use crate::error::ErrorClass;
use crate::hub::HubError;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("{machine_name}: download failed: {source}")]
    Fetch {
        machine_name: String,
        #[source]
        source: HubError,
    },

    #[error("{machine_name}: could not stage archive: {message}")]
    Write {
        machine_name: String,
        message: String,
    },

    #[error("{machine_name}: package validation failed: {message}")]
    Validation {
        machine_name: String,
        message: String,
    },

    #[error("{machine_name}: package storage failed: {message}")]
    Storage {
        machine_name: String,
        message: String,
    },

    #[error("{machine_name}: post-install check failed: {message}")]
    PostInstallCheck {
        machine_name: String,
        message: String,
    },
}

impl InstallError {
    pub fn write(machine_name: &str, msg: impl std::fmt::Display) -> Self {
        Self::Write {
            machine_name: machine_name.to_string(),
            message: msg.to_string(),
        }
    }

    pub fn validation(machine_name: &str, msg: impl std::fmt::Display) -> Self {
        Self::Validation {
            machine_name: machine_name.to_string(),
            message: msg.to_string(),
        }
    }

    pub fn storage(machine_name: &str, msg: impl std::fmt::Display) -> Self {
        Self::Storage {
            machine_name: machine_name.to_string(),
            message: msg.to_string(),
        }
    }

    pub fn post_install_check(machine_name: &str, msg: impl std::fmt::Display) -> Self {
        Self::PostInstallCheck {
            machine_name: machine_name.to_string(),
            message: msg.to_string(),
        }
    }

    pub fn machine_name(&self) -> &str {
        match self {
            Self::Fetch { machine_name, .. }
            | Self::Write { machine_name, .. }
            | Self::Validation { machine_name, .. }
            | Self::Storage { machine_name, .. }
            | Self::PostInstallCheck { machine_name, .. } => machine_name,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Fetch { source, .. } => source.class(),
            Self::Write { .. } => ErrorClass::Filesystem,
            Self::Validation { .. } => ErrorClass::Validation,
            Self::Storage { .. } => ErrorClass::Storage,
            Self::PostInstallCheck { .. } => ErrorClass::Consistency,
        }
    }
}
