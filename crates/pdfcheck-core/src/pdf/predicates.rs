//! Page-count comparison.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::document::PdfDocument;
use crate::error::UsageError;

/// How a page count is compared against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    /// Strictly greater than the threshold.
    Greater,
    /// Strictly less than the threshold.
    Less,
    /// Exactly the threshold.
    Equal,
}

impl Comparator {
    /// Apply the comparison.
    pub fn compare(self, value: usize, threshold: usize) -> bool {
        match self {
            Comparator::Greater => value > threshold,
            Comparator::Less => value < threshold,
            Comparator::Equal => value == threshold,
        }
    }
}

impl FromStr for Comparator {
    type Err = UsageError;

    /// Tokens are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Comparator::Greater, Comparator::Less, Comparator::Equal]
            .into_iter()
            .find(|c| c.token().eq_ignore_ascii_case(s))
            .ok_or_else(|| UsageError::InvalidComparator(s.to_string()))
    }
}

impl Comparator {
    fn token(self) -> &'static str {
        match self {
            Comparator::Greater => "greater",
            Comparator::Less => "less",
            Comparator::Equal => "equal",
        }
    }
}

/// Compare the document's page count with `threshold`.
pub fn page_count(doc: &PdfDocument, threshold: usize, comparator: Comparator) -> bool {
    comparator.compare(doc.page_count(), threshold)
}
