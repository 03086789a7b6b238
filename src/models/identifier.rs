use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable key for "which coding problem is this".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemIdentifier(String);

impl ProblemIdentifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProblemIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProblemIdentifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for ProblemIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
