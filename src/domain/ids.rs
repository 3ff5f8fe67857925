//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers the export engine receives from the
//! business-data layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Book identifier newtype wrapper
///
/// Identifies the target collection whose responses are exported. The backend
/// issues these as opaque strings (usually UUIDs).
///
/// # Examples
///
/// ```
/// use keepsake::domain::ids::BookId;
/// use std::str::FromStr;
///
/// let book_id = BookId::from_str("3f1c7a52-9d0e-4c1b-a6f4-0b8e2d9c5e71").unwrap();
/// assert_eq!(book_id.as_str(), "3f1c7a52-9d0e-4c1b-a6f4-0b8e2d9c5e71");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(String);

impl BookId {
    /// Creates a new BookId from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(BookId)` if the ID is non-blank, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Book ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the book ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sanitized form of the ID, safe to embed in a file name
    pub fn to_file_component(&self) -> String {
        to_file_component(&self.0)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for BookId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Replaces characters that are unsafe in file names with underscores
///
/// Letters (any script), digits, `-`, `.` and `_` are kept; runs of
/// replacement underscores collapse into one and leading/trailing
/// underscores or dots are trimmed. An input with nothing left yields
/// `"unknown"`.
pub fn to_file_component(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut last_was_underscore = false;

    for c in raw.trim().chars() {
        let keep = c.is_alphanumeric() || c == '-' || c == '.';
        if keep {
            result.push(c);
            last_was_underscore = false;
        } else if !last_was_underscore {
            result.push('_');
            last_was_underscore = true;
        }
    }

    let trimmed = result.trim_matches(|c| c == '_' || c == '.');
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_id_creation() {
        let id = BookId::new("3f1c7a52-9d0e-4c1b-a6f4-0b8e2d9c5e71").unwrap();
        assert_eq!(id.as_str(), "3f1c7a52-9d0e-4c1b-a6f4-0b8e2d9c5e71");
    }

    #[test]
    fn test_book_id_empty_fails() {
        assert!(BookId::new("").is_err());
        assert!(BookId::new("   ").is_err());
    }

    #[test]
    fn test_book_id_display_and_parse() {
        let id: BookId = "book-42".parse().unwrap();
        assert_eq!(format!("{}", id), "book-42");
    }

    #[test]
    fn test_file_component_sanitizes_paths() {
        assert_eq!(to_file_component("../etc/passwd"), "etc_passwd");
        assert_eq!(to_file_component("My Mother"), "My_Mother");
        assert_eq!(to_file_component("a//b  c"), "a_b_c");
        assert_eq!(to_file_component("Мама"), "Мама");
        assert_eq!(to_file_component("///"), "unknown");
    }

    #[test]
    fn test_book_id_serialization() {
        let id = BookId::new("book-42").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"book-42\"");
        let deserialized: BookId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
