use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// Named accent colors understood by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Warning,
    Danger,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Good, Severity::Warning, Severity::Danger];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Good => "good",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = BuildError;

    /// Strict parse: only the three platform tokens are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str() == s)
            .ok_or_else(|| BuildError::UnknownSeverity(s.to_string()))
    }
}

/// Collapse the two color inputs into the single `color` slot.
///
/// Severity wins when both are set. A free-form color is passed through
/// untouched; blank strings count as absent.
pub fn reconcile_color(severity: Option<Severity>, color: Option<String>) -> Option<String> {
    match (severity, color) {
        (Some(sev), _) => Some(sev.as_str().to_string()),
        (None, Some(c)) if !c.trim().is_empty() => Some(c),
        (None, _) => None,
    }
}
