//! Page selection for documents with form-feed page breaks

use crate::error::ExtractorError;
use std::collections::BTreeSet;
use std::str::FromStr;

/// Page separator in extracted text
pub const PAGE_BREAK: char = '\x0c';

/// Set of 1-based page numbers, e.g. `"1,3-5"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<usize>,
}

impl PageSelection {
    /// Parse a comma separated list of pages and inclusive ranges
    pub fn parse(expression: &str) -> Result<Self, ExtractorError> {
        let invalid = || ExtractorError::InvalidPageSelection(expression.to_string());
        let mut pages = BTreeSet::new();

        for part in expression.split(',').map(str::trim) {
            if part.is_empty() {
                return Err(invalid());
            }
            match part.split_once('-') {
                Some((start, end)) => {
                    let start = parse_page(start).ok_or_else(invalid)?;
                    let end = parse_page(end).ok_or_else(invalid)?;
                    if start > end {
                        return Err(invalid());
                    }
                    pages.extend(start..=end);
                }
                None => {
                    pages.insert(parse_page(part).ok_or_else(invalid)?);
                }
            }
        }

        Ok(Self { pages })
    }

    /// Selected page numbers in ascending order
    pub fn pages(&self) -> impl Iterator<Item = usize> + '_ {
        self.pages.iter().copied()
    }

    /// Keep only the selected pages of `text`, joined by page breaks
    pub fn apply(&self, text: &str) -> Result<String, ExtractorError> {
        let all: Vec<&str> = text.split(PAGE_BREAK).collect();
        let mut kept = Vec::with_capacity(self.pages.len());
        for page in self.pages() {
            let content = all.get(page - 1).ok_or(ExtractorError::PageOutOfRange {
                page,
                pages: all.len(),
            })?;
            kept.push(*content);
        }
        Ok(kept.join(&PAGE_BREAK.to_string()))
    }
}

impl FromStr for PageSelection {
    type Err = ExtractorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_page(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|page| *page > 0)
}
