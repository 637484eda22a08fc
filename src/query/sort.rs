//! Sorting of search results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NavigatorError, Result};

use super::QueryPair;

/// Fields the issue search can sort on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortField {
    CreationDate,
    #[default]
    UpdateDate,
    CloseDate,
    Assignee,
    Severity,
    Status,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CreationDate => "CREATION_DATE",
            SortField::UpdateDate => "UPDATE_DATE",
            SortField::CloseDate => "CLOSE_DATE",
            SortField::Assignee => "ASSIGNEE",
            SortField::Severity => "SEVERITY",
            SortField::Status => "STATUS",
        }
    }

    /// Default label shown next to the sort control.
    pub fn label(&self) -> &'static str {
        match self {
            SortField::CreationDate => "Creation Date",
            SortField::UpdateDate => "Update Date",
            SortField::CloseDate => "Close Date",
            SortField::Assignee => "Assignee",
            SortField::Severity => "Severity",
            SortField::Status => "Status",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = NavigatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATION_DATE" => Ok(SortField::CreationDate),
            "UPDATE_DATE" => Ok(SortField::UpdateDate),
            "CLOSE_DATE" => Ok(SortField::CloseDate),
            "ASSIGNEE" => Ok(SortField::Assignee),
            "SEVERITY" => Ok(SortField::Severity),
            "STATUS" => Ok(SortField::Status),
            _ => Err(NavigatorError::InvalidSortField(s.to_string())),
        }
    }
}

/// Sort order of the result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sorting {
    pub field: SortField,
    pub ascending: bool,
    pub label: String,
}

impl Default for Sorting {
    fn default() -> Self {
        Self::new(SortField::default(), false)
    }
}

impl Sorting {
    pub fn new(field: SortField, ascending: bool) -> Self {
        Self {
            field,
            ascending,
            label: field.label().to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Restore sorting from route pairs (`sort`, `asc`).
    ///
    /// Without a usable `sort` pair the default sorting applies. `asc`
    /// defaults to descending.
    pub fn from_pairs(pairs: &[QueryPair]) -> Self {
        let value_of = |key: &str| {
            pairs
                .iter()
                .find(|p| p.key == key)
                .and_then(|p| p.value.as_deref())
        };

        let Some(field) = value_of("sort").and_then(|v| v.parse::<SortField>().ok()) else {
            return Self::default();
        };
        let ascending = value_of("asc").is_some_and(|v| v.eq_ignore_ascii_case("true"));
        Self::new(field, ascending)
    }

    /// Same field and direction as the default, whatever the label.
    pub fn is_default(&self) -> bool {
        let default = Self::default();
        self.field == default.field && self.ascending == default.ascending
    }

    pub fn to_pairs(&self) -> Vec<QueryPair> {
        vec![
            QueryPair::new("sort", self.field.as_str()),
            QueryPair::new("asc", self.ascending.to_string()),
        ]
    }
}
