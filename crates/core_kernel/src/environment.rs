//! Deployment environment
//!
//! Every aggregate and every system event is scoped to one of the platform's
//! deployment environments. The environment travels with the data rather than
//! being ambient configuration, so records from different environments can
//! share storage without bleeding into each other.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The deployment environment a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeploymentEnvironment {
    Development,
    Staging,
    Production,
}

impl DeploymentEnvironment {
    /// Returns the canonical lowercase-camel name
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentEnvironment::Development => "development",
            DeploymentEnvironment::Staging => "staging",
            DeploymentEnvironment::Production => "production",
        }
    }
}

impl fmt::Display for DeploymentEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown environment name
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown deployment environment: {0}")]
pub struct ParseEnvironmentError(pub String);

impl FromStr for DeploymentEnvironment {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(DeploymentEnvironment::Development),
            "staging" => Ok(DeploymentEnvironment::Staging),
            "production" => Ok(DeploymentEnvironment::Production),
            other => Err(ParseEnvironmentError(other.to_string())),
        }
    }
}
