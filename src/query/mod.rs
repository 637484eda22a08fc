//! Route fragment codec and the filter query it carries.
//!
//! A navigator route looks like `statuses=OPEN,REOPENED|severities=BLOCKER`.
//! The same pairs are sent to the server joined with `&` instead of `|`.
//! Values are percent-escaped with the URI component set; keys are kept raw.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

pub mod sort;

pub use sort::{SortField, Sorting};

/// Characters escaped in values: everything but the URI component
/// unreserved set.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Route keys that drive the navigator rather than filter issues.
pub const CONTROL_KEYS: &[&str] = &["id", "sort", "asc", "pageIndex", "pageSize"];

/// Pair separator of an encoded query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// Navigable, bookmarkable route state.
    Route,
    /// Outgoing request parameters.
    Request,
}

impl Separator {
    pub const fn as_char(self) -> char {
        match self {
            Separator::Route => '|',
            Separator::Request => '&',
        }
    }
}

/// One `key=value` token of an encoded query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPair {
    pub key: String,
    /// `None` when the token had no `=`.
    pub value: Option<String>,
}

impl QueryPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn is_control(&self) -> bool {
        CONTROL_KEYS.contains(&self.key.as_str())
    }
}

/// Split a fragment into ordered pairs.
///
/// Malformed tokens are tolerated: a token without `=` keeps its key with no
/// value, and invalid percent escapes decode lossily.
pub fn decode(fragment: &str, separator: Separator) -> Vec<QueryPair> {
    fragment
        .split(separator.as_char())
        .filter(|token| !token.is_empty())
        .map(|token| match token.split_once('=') {
            Some((key, value)) => QueryPair {
                key: key.to_string(),
                value: Some(percent_decode_str(value).decode_utf8_lossy().into_owned()),
            },
            None => QueryPair {
                key: token.to_string(),
                value: None,
            },
        })
        .collect()
}

pub fn encode(pairs: &[QueryPair], separator: Separator) -> String {
    let mut out = String::new();
    for (i, pair) in pairs.iter().enumerate() {
        if i > 0 {
            out.push(separator.as_char());
        }
        out.push_str(&pair.key);
        if let Some(value) = &pair.value {
            out.push('=');
            out.extend(utf8_percent_encode(value, COMPONENT));
        }
    }
    out
}

/// Re-encode a fragment from one separator to the other.
pub fn convert(fragment: &str, from: Separator, to: Separator) -> String {
    encode(&decode(fragment, from), to)
}

/// Pairs describing a view: filter fields, then the sorting unless it is the
/// default one.
pub fn route_pairs(query: &Query, sorting: &Sorting) -> Vec<QueryPair> {
    let mut pairs = query.to_pairs();
    if !sorting.is_default() {
        pairs.extend(sorting.to_pairs());
    }
    pairs
}

/// Filter mapping (field name to value) restored from route pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    fields: BTreeMap<String, String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the filter query from route pairs.
    ///
    /// Control keys and value-less tokens are ignored. When a field appears
    /// more than once the first occurrence wins.
    pub fn from_pairs(pairs: &[QueryPair]) -> Self {
        let mut fields = BTreeMap::new();
        for pair in pairs.iter().filter(|p| !p.is_control()) {
            if let Some(value) = &pair.value {
                fields
                    .entry(pair.key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        Self { fields }
    }

    pub fn parse(fragment: &str) -> Self {
        Self::from_pairs(&decode(fragment, Separator::Route))
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.fields.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_pairs(&self) -> Vec<QueryPair> {
        self.fields
            .iter()
            .map(|(k, v)| QueryPair::new(k.clone(), v.clone()))
            .collect()
    }

    pub fn to_fragment(&self) -> String {
        encode(&self.to_pairs(), Separator::Route)
    }
}
