use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncollError};

/// A query word: lemma and an optional part of speech.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub v: String,
    #[serde(default)]
    pub pos: String,
}

impl Word {
    pub fn new<S: Into<String>>(v: S) -> Self {
        Word {
            v: v.into(),
            pos: String::new(),
        }
    }

    pub fn with_pos<S: Into<String>>(mut self, pos: S) -> Self {
        self.pos = pos.into();
        self
    }

    pub fn is_valid(&self) -> bool {
        !self.v.trim().is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(SyncollError::invalid_argument("invalid word value"))
        }
    }

    /// The part of speech, `None` when not given.
    pub fn pos(&self) -> Option<&str> {
        if self.pos.is_empty() {
            None
        } else {
            Some(&self.pos)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity() {
        assert!(Word::new("team").is_valid());
        assert!(!Word::new("").is_valid());
        assert!(!Word::new("  ").is_valid());
        assert!(Word::new("").validate().unwrap_err().is_client_error());
        assert_eq!(Word::new("team").pos(), None);
        assert_eq!(Word::new("team").with_pos("NOUN").pos(), Some("NOUN"));
    }
}
