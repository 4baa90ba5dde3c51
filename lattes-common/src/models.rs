//! Domain models

use serde::{Deserialize, Serialize};

/// Researcher row. `full_name` is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Researcher {
    pub id: i64,
    pub full_name: String,
}

/// Publication title joined with its researcher's name, as returned by searches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PublicationHit {
    pub title: String,
    pub researcher: String,
}

/// Data extracted from one curriculum document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurriculumRecord {
    /// `None` when the document has no general-data node or no name on it
    pub full_name: Option<String>,
    /// Publication titles in traversal order, duplicates preserved
    pub titles: Vec<String>,
}

impl CurriculumRecord {
    /// True when the record carries both a researcher name and at least one title
    pub fn is_persistable(&self) -> bool {
        self.full_name.is_some() && !self.titles.is_empty()
    }
}
