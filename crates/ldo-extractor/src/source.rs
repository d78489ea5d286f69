//! Filesystem document source
//!
//! Reads text-based documents from a file or a folder tree, cleans them and
//! hands them to the pipeline as [`DocumentUnit`]s.

use crate::error::ExtractorError;
use crate::pages::PageSelection;
use crate::segmenter::Segmenter;
use ldo_domain::traits::DocumentSource;
use ldo_domain::{DocumentUnit, Segment};
use regex::Regex;
use scraper::Html;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extensions read as UTF-8 text
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "csv", "tsv", "json", "xml", "html", "htm"];

static WEB_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://|www\.|mailto:|\S+\.com|\S+\.org|\S+\.gov|\S+\.br").expect("static pattern")
});

/// Elements whose text never reaches the document
const HIDDEN_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Elements that start a new line
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol",
    "p", "pre", "section", "table", "tr", "ul",
];

/// Loads documents from the local filesystem
#[derive(Debug, Clone, Default)]
pub struct FsDocumentSource {
    pages: Option<PageSelection>,
    segmenter: Segmenter,
}

impl FsDocumentSource {
    /// Create a source that keeps every page
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the selected pages of every document
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = Some(pages);
        self
    }

    /// Whether an extension can be read
    pub fn is_supported(extension: &str) -> bool {
        SUPPORTED_EXTENSIONS.contains(&extension)
    }

    fn collect_files(&self, path: &Path) -> Result<Vec<PathBuf>, ExtractorError> {
        if path.is_file() {
            let extension = extension_of(path);
            if !Self::is_supported(&extension) {
                return Err(ExtractorError::UnsupportedFormat(path.display().to_string()));
            }
            return Ok(vec![path.to_path_buf()]);
        }

        if !path.exists() {
            return Err(ExtractorError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|e| ExtractorError::Io {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| path.to_path_buf()),
                source: io::Error::from(e),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let extension = extension_of(entry.path());
            if Self::is_supported(&extension) {
                files.push(entry.into_path());
            } else {
                warn!(path = %entry.path().display(), "Skipping unsupported document");
            }
        }
        Ok(files)
    }

    fn load_file(&self, index: usize, path: &Path) -> Result<DocumentUnit, ExtractorError> {
        let raw = fs::read_to_string(path).map_err(|source| ExtractorError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let selected = match &self.pages {
            Some(pages) => pages.apply(&raw)?,
            None => raw,
        };

        let extension = extension_of(path);
        let text = match extension.as_str() {
            "html" | "htm" => drop_web_address_lines(&html_to_text(&selected)),
            _ => drop_web_address_lines(&selected),
        };

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!(path = %path.display(), chars = text.chars().count(), "Loaded document");

        Ok(DocumentUnit::new(index, path.display().to_string(), text)
            .with_metadata("file_name", file_name)
            .with_metadata("file_path", path.display().to_string())
            .with_metadata("extension", extension))
    }
}

impl DocumentSource for FsDocumentSource {
    type Error = ExtractorError;

    fn load_documents(&self, path: &Path) -> Result<Vec<DocumentUnit>, Self::Error> {
        let files = self.collect_files(path)?;
        let documents = files
            .iter()
            .enumerate()
            .map(|(index, file)| self.load_file(index, file))
            .collect::<Result<Vec<_>, _>>()?;

        info!(path = %path.display(), documents = documents.len(), "Documents loaded");
        Ok(documents)
    }

    fn segment(&self, document: &DocumentUnit) -> Vec<Segment> {
        self.segmenter.segment(document)
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Remove every line that carries a URL, e-mail link or web domain
pub fn drop_web_address_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !WEB_ADDRESS.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse markup into text, keeping one line per block element
///
/// Entities are decoded by the parser. Script, style and head content and
/// comments are dropped.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        if let Some(element) = node.value().as_element() {
            match element.name() {
                name if BLOCK_ELEMENTS.contains(&name) => text.push('\n'),
                "td" | "th" => text.push(' '),
                _ => {}
            }
        } else if let Some(fragment) = node.value().as_text() {
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
            });
            if !hidden {
                text.push_str(fragment);
            }
        }
    }

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
