//! Strongly-typed identifiers for quizgate

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a quiz category panel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PanelId(String);

impl PanelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PanelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PanelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of an outstanding confirmation prompt.
///
/// Allocated by whoever raises the prompt; answers carrying a stale id are
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PromptId(u64);

impl PromptId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// The id following this one
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prompt-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_id_equality() {
        let id1 = PanelId::new("history");
        let id2 = PanelId::from("history");
        let id3 = PanelId::new("geography");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn prompt_ids_advance() {
        let first = PromptId::new(1);
        assert_eq!(first.next(), PromptId::new(2));
        assert_eq!(first.to_string(), "prompt-1");
    }

    #[test]
    fn panel_id_serializes_as_plain_string() {
        let id = PanelId::new("sport");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"sport\"");
        let parsed: PanelId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
