//! Keywords and keyword lists
//!
//! A `Keyword` is a query string plus a literal/regex flag. Two keywords are
//! equal when their normalized query strings and literal flags are equal,
//! which makes `Keyword` usable as the key of the result ledger.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single search term
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Keyword {
    query: String,
    literal: bool,
}

impl Keyword {
    /// Create a keyword. Surrounding whitespace is not part of the query.
    pub fn new(query: impl AsRef<str>, literal: bool) -> Self {
        Self {
            query: query.as_ref().trim().to_string(),
            literal,
        }
    }

    /// Literal (exact term) keyword
    pub fn literal(query: impl AsRef<str>) -> Self {
        Self::new(query, true)
    }

    /// Regular-expression keyword
    pub fn regex(query: impl AsRef<str>) -> Self {
        Self::new(query, false)
    }

    /// Normalized query string
    pub fn query(&self) -> &str {
        &self.query
    }

    /// True for literal keywords
    pub fn is_literal(&self) -> bool {
        self.literal
    }

    /// True for regular-expression keywords
    pub fn is_regex(&self) -> bool {
        !self.literal
    }

    /// Query string shortened for progress and log display
    pub fn display_query(&self) -> String {
        const MAX: usize = 50;
        if self.query.chars().count() > MAX {
            let head: String = self.query.chars().take(MAX - 1).collect();
            format!("{}...", head)
        } else {
            self.query.clone()
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.literal {
            write!(f, "{}", self.query)
        } else {
            write!(f, "/{}/", self.query)
        }
    }
}

/// A named, ordered set of keywords
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordList {
    name: String,
    keywords: Vec<Keyword>,
    /// Post a user-facing message for every new hit from this list
    pub ingest_messages: bool,
}

impl KeywordList {
    /// Create a list. Duplicate keywords keep their first position.
    pub fn new(
        name: impl Into<String>,
        keywords: impl IntoIterator<Item = Keyword>,
        ingest_messages: bool,
    ) -> Self {
        let mut ordered: Vec<Keyword> = Vec::new();
        for keyword in keywords {
            if keyword.query().is_empty() || ordered.contains(&keyword) {
                continue;
            }
            ordered.push(keyword);
        }
        Self {
            name: name.into(),
            keywords: ordered,
            ingest_messages,
        }
    }

    /// List name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keywords in list order
    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    /// Number of keywords
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    /// True if the list has no keywords
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Append a keyword unless already present. Returns true if added.
    pub fn add(&mut self, keyword: Keyword) -> bool {
        if keyword.query().is_empty() || self.keywords.contains(&keyword) {
            return false;
        }
        self.keywords.push(keyword);
        true
    }
}
