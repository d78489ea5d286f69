//! Split documents into extraction segments
//!
//! The strategy depends on the file extension:
//!
//! | extension                         | strategy                         | limit |
//! |-----------------------------------|----------------------------------|-------|
//! | pdf, docx, csv, tsv, txt          | lines                            | 1024  |
//! | json                              | `{...}` objects                  | 512   |
//! | xml                               | text between tags                | 512   |
//! | md                                | paragraphs, lines, sentences     | 512   |
//! | jpg, jpeg, png, gif, webp         | whole document                   | -     |
//! | xlsx and anything else            | lines                            | 512   |

use ldo_domain::{DocumentUnit, Segment};
use regex::Regex;
use std::sync::LazyLock;

/// Limit for line-oriented text formats (chars)
pub const LINES_MAX_SEGMENT_SIZE: usize = 1024;

/// Limit for every other format (chars)
pub const DEFAULT_MAX_SEGMENT_SIZE: usize = 512;

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]+\}").expect("static pattern"));

static XML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.*?>").expect("static pattern"));

/// How a document is cut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStrategy {
    /// Lines combined up to the limit
    Lines(usize),
    /// `{...}` matches combined up to the limit
    JsonObjects(usize),
    /// Text between XML tags combined up to the limit
    XmlText(usize),
    /// Paragraphs, then lines, then sentences, then chars
    Recursive(usize),
    /// One segment for the whole document
    Whole,
}

impl SegmentStrategy {
    /// Strategy for a lower-cased file extension
    pub fn for_extension(extension: &str) -> Self {
        match extension {
            "pdf" | "docx" | "csv" | "tsv" | "txt" => Self::Lines(LINES_MAX_SEGMENT_SIZE),
            "json" => Self::JsonObjects(DEFAULT_MAX_SEGMENT_SIZE),
            "xml" => Self::XmlText(DEFAULT_MAX_SEGMENT_SIZE),
            "md" => Self::Recursive(DEFAULT_MAX_SEGMENT_SIZE),
            "jpg" | "jpeg" | "png" | "gif" | "webp" => Self::Whole,
            _ => Self::Lines(DEFAULT_MAX_SEGMENT_SIZE),
        }
    }
}

/// Cuts documents into segments according to their extension
#[derive(Debug, Clone, Copy, Default)]
pub struct Segmenter;

impl Segmenter {
    /// Create a segmenter
    pub fn new() -> Self {
        Self
    }

    /// Segment a document; segments inherit the document metadata
    pub fn segment(&self, document: &DocumentUnit) -> Vec<Segment> {
        let strategy = SegmentStrategy::for_extension(&document.extension());

        let pieces = match strategy {
            SegmentStrategy::Whole => {
                let mut segment = Segment::new(0, document.text.clone());
                segment.metadata = document.metadata.clone();
                segment.whole_document = true;
                return vec![segment];
            }
            SegmentStrategy::Lines(limit) => combine_until_limit(document.text.lines(), limit, "\n"),
            SegmentStrategy::JsonObjects(limit) => combine_until_limit(
                JSON_OBJECT.find_iter(&document.text).map(|m| m.as_str()),
                limit,
                "\n",
            ),
            SegmentStrategy::XmlText(limit) => combine_until_limit(
                XML_TAG
                    .split(&document.text)
                    .map(str::trim)
                    .filter(|s| !s.is_empty()),
                limit,
                " ",
            ),
            SegmentStrategy::Recursive(limit) => {
                let units = recursive_units(&document.text, limit, 0);
                combine_until_limit(units.iter().map(String::as_str), limit, "\n\n")
            }
        };

        pieces
            .into_iter()
            .filter(|piece| !piece.trim().is_empty())
            .enumerate()
            .map(|(index, text)| {
                let mut segment = Segment::new(index, text);
                segment.metadata = document.metadata.clone();
                segment
            })
            .collect()
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Combine elements until they reach the size limit
fn combine_until_limit<'a, I>(elements: I, limit: usize, delimiter: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let limit = limit.max(1);
    let delimiter_len = char_len(delimiter);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for element in elements {
        let element_len = char_len(element);

        if element_len > limit {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            chunks.extend(split_at_char_limit(element, limit));
            continue;
        }

        let needed = if current.is_empty() {
            element_len
        } else {
            current_len + delimiter_len + element_len
        };
        if needed > limit {
            chunks.push(std::mem::take(&mut current));
            current.push_str(element);
            current_len = element_len;
        } else {
            if !current.is_empty() {
                current.push_str(delimiter);
            }
            current.push_str(element);
            current_len = needed;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Split text at char-count boundaries
fn split_at_char_limit(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(limit.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Break text down until every unit fits the limit
fn recursive_units(text: &str, limit: usize, level: usize) -> Vec<String> {
    if char_len(text) <= limit {
        return vec![text.to_string()];
    }
    let parts: Vec<&str> = match level {
        0 => text.split("\n\n").collect(),
        1 => text.lines().collect(),
        2 => text.split_inclusive(['.', '!', '?']).collect(),
        _ => return split_at_char_limit(text, limit),
    };
    parts
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .flat_map(|part| recursive_units(part.trim(), limit, level + 1))
        .collect()
}
