//! Page selector syntax: `all`, `4`, `1-2,3`.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::error::{ContentError, UsageError};

lazy_static! {
    /// One selector item: `3` or `1-2`, whitespace allowed around the dash
    static ref SELECTOR_ITEM: Regex = Regex::new(r"^(\d+)(?:\s*-\s*(\d+))?$").unwrap();
}

/// An inclusive range of 1-based page numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    pub start: usize,
    pub end: usize,
}

/// A parsed page selector.
///
/// Parsing only checks syntax. Page numbers are checked against a document
/// when the selector is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelector {
    /// Every page of the document.
    All,
    /// Explicit pages and ranges.
    Spans(Vec<PageSpan>),
}

impl PageSelector {
    /// Parse an optional selector. `None` selects every page.
    pub fn from_option(selector: Option<&str>) -> Result<Self, UsageError> {
        match selector {
            None => Ok(PageSelector::All),
            Some(s) => s.parse(),
        }
    }

    /// Resolve to sorted, de-duplicated 0-based page indices.
    ///
    /// Page `0` or a page past the end is an error, never an empty match.
    pub fn resolve(&self, page_count: usize) -> Result<Vec<usize>, ContentError> {
        let spans = match self {
            PageSelector::All => return Ok((0..page_count).collect()),
            PageSelector::Spans(spans) => spans,
        };

        let mut pages = Vec::new();
        for span in spans {
            for page in [span.start, span.end] {
                if page == 0 || page > page_count {
                    return Err(ContentError::PageOutOfRange {
                        page,
                        count: page_count,
                    });
                }
            }
            pages.extend((span.start - 1)..span.end);
        }

        pages.sort_unstable();
        pages.dedup();
        trace!("Selector {} resolved to {:?}", self, pages);
        Ok(pages)
    }
}

impl FromStr for PageSelector {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || UsageError::InvalidSelector(s.to_string());

        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(PageSelector::All);
        }

        let mut spans = Vec::new();
        for item in s.split(',') {
            let caps = SELECTOR_ITEM.captures(item.trim()).ok_or_else(invalid)?;
            let start: usize = caps[1].parse().map_err(|_| invalid())?;
            let end: usize = match caps.get(2) {
                Some(end) => end.as_str().parse().map_err(|_| invalid())?,
                None => start,
            };

            if end < start {
                return Err(invalid());
            }
            spans.push(PageSpan { start, end });
        }

        Ok(PageSelector::Spans(spans))
    }
}

impl fmt::Display for PageSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSelector::All => f.write_str("all"),
            PageSelector::Spans(spans) => {
                for (i, span) in spans.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if span.start == span.end {
                        write!(f, "{}", span.start)?;
                    } else {
                        write!(f, "{}-{}", span.start, span.end)?;
                    }
                }
                Ok(())
            }
        }
    }
}
