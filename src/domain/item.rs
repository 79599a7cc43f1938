use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of digest bytes kept for an item key (12 hex chars).
const ITEM_KEY_BYTES: usize = 6;

/// Stable, content-derived identifier for a practice item.
///
/// The key is the join point between the external content catalog and the
/// review history, so it must only depend on the topic and question text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
  /// Compute the key for a question under a topic.
  ///
  /// Uses SHA256 of `topic:question` and keeps the first 12 hex chars.
  pub fn from_content(topic: &str, question: &str) -> Self {
    let input = format!("{}:{}", topic, question);
    let hash = Sha256::digest(input.as_bytes());
    Self(hex::encode(&hash[..ITEM_KEY_BYTES]))
  }

  /// Wrap a key that was computed earlier (e.g. read back from a catalog).
  pub fn from_key(key: impl Into<String>) -> Self {
    Self(key.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ItemId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for ItemId {
  fn from(key: &str) -> Self {
    Self::from_key(key)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_same_content_same_key() {
    let a = ItemId::from_content("Python Basics", "What is Python?");
    let b = ItemId::from_content("Python Basics", "What is Python?");
    assert_eq!(a, b);
  }

  #[test]
  fn test_key_is_12_hex_chars() {
    let id = ItemId::from_content("Python Basics", "What is Python?");
    assert_eq!(id.as_str().len(), 12);
    assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
  }

  #[test]
  fn test_topic_changes_key() {
    let a = ItemId::from_content("Python Basics", "What is a list?");
    let b = ItemId::from_content("Data Structures", "What is a list?");
    assert_ne!(a, b);
  }

  #[test]
  fn test_question_changes_key() {
    let a = ItemId::from_content("Python Basics", "What is a list?");
    let b = ItemId::from_content("Python Basics", "What is a tuple?");
    assert_ne!(a, b);
  }

  #[test]
  fn test_from_key_roundtrip() {
    let id = ItemId::from_content("Rust", "What is a borrow?");
    let again = ItemId::from_key(id.to_string());
    assert_eq!(id, again);
  }

  #[test]
  fn test_serializes_as_plain_string() {
    let id = ItemId::from_key("abc123def456");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123def456\"");
    let parsed: ItemId = serde_json::from_str("\"abc123def456\"").unwrap();
    assert_eq!(parsed, id);
  }
}
