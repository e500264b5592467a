// src/schema/diff.rs

use std::collections::HashSet;

use super::types::SchemaSpec;

/// Result of comparing a parsed header row against a [`SchemaSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderDiff {
    /// Required columns absent from the header, in schema order.
    pub missing: Vec<String>,
    /// Header columns outside the schema, in header order. A repeated
    /// column counts as unexpected from its second occurrence on.
    pub unexpected: Vec<String>,
}

impl HeaderDiff {
    pub fn is_exact(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// Compare `headers` with the schema as unordered sets.
pub fn diff_headers(schema: &SchemaSpec, headers: &[String]) -> HeaderDiff {
    let mut seen: HashSet<&str> = HashSet::with_capacity(headers.len());
    let mut unexpected = Vec::new();

    for h in headers {
        let first_time = seen.insert(h.as_str());
        if !first_time || !schema.contains(h) {
            unexpected.push(h.clone());
        }
    }

    let missing = schema
        .required_columns
        .iter()
        .filter(|c| !seen.contains(c.as_str()))
        .cloned()
        .collect();

    HeaderDiff {
        missing,
        unexpected,
    }
}
