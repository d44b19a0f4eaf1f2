//! Document structure for indexing.
//!
//! Documents are schema-less collections of named text fields. Extracted
//! text from PDF or Office files arrives here as plain strings; the
//! extraction itself happens before documents reach the index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A document represents a single item to be indexed.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Document {
    fields: BTreeMap<String, String>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Document {
            fields: BTreeMap::new(),
        }
    }

    /// Add (or replace) a text field.
    pub fn add_text<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.fields.insert(name.into(), value.into());
    }

    /// Get a field value from the document.
    pub fn get_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Check if the document has a field.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Get all fields, ordered by name.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Create a builder for constructing documents.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }
}

/// Builder for [`Document`].
///
/// ```
/// use docindex::document::Document;
///
/// let doc = Document::builder()
///     .add_text("path", "/reports/q1.pdf")
///     .add_text("content", "Quarterly revenue grew")
///     .build();
///
/// assert_eq!(doc.get_field("path"), Some("/reports/q1.pdf"));
/// assert_eq!(doc.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    document: Document,
}

impl DocumentBuilder {
    /// Create a new document builder.
    pub fn new() -> Self {
        DocumentBuilder {
            document: Document::new(),
        }
    }

    /// Add a text field.
    pub fn add_text<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.document.add_text(name, value);
        self
    }

    /// Build the document.
    pub fn build(self) -> Document {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_text_replaces_existing_value() {
        let mut doc = Document::new();
        assert!(doc.is_empty());

        doc.add_text("title", "Draft");
        doc.add_text("title", "Final");

        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get_field("title"), Some("Final"));
        assert!(!doc.has_field("content"));
    }

    #[test]
    fn test_fields_are_ordered() {
        let doc = Document::builder()
            .add_text("title", "t")
            .add_text("content", "c")
            .build();

        let names: Vec<&str> = doc.fields().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["content", "title"]);
    }
}
