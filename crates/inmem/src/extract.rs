//! Text extractors and format detection
//!
//! Extractors turn file content into text, split it into chunks and write
//! one document per chunk (numbered from 1) to the index service.

use keyhunt_core::{Document, ExtractError, FileRecord, FormatDetector, IndexService, StringExtractor, TextExtractor};
use regex::Regex;
use std::sync::{Arc, OnceLock};

/// Maximum characters per chunk document
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Shortest printable run kept by the strings extractor
const MIN_STRING_LEN: usize = 4;

/// Split text into chunks of at most `max_chars` characters, breaking at
/// the last whitespace of a window when there is one
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        let window_end = rest
            .char_indices()
            .nth(max_chars)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        if window_end == rest.len() {
            chunks.push(rest.to_string());
            break;
        }
        let split = rest[..window_end]
            .rfind(char::is_whitespace)
            .filter(|&idx| idx > 0)
            .unwrap_or(window_end);
        chunks.push(rest[..split].trim_end().to_string());
        rest = rest[split..].trim_start();
    }

    chunks
}

fn write_chunks(
    index: &dyn IndexService,
    file: &FileRecord,
    text: &str,
    chunk_size: usize,
) -> Result<usize, ExtractError> {
    let chunks = chunk_text(text, chunk_size);
    if chunks.is_empty() {
        return Err(ExtractError::Failed(format!("no text in {}", file.name)));
    }
    let count = chunks.len();
    for (n, chunk) in chunks.into_iter().enumerate() {
        index.add_document(Document::chunk(file, n as u32 + 1, chunk))?;
    }
    Ok(count)
}

// ============================================================================
// PlainTextExtractor
// ============================================================================

/// Extractor for plain text formats
pub struct PlainTextExtractor {
    index: Arc<dyn IndexService>,
    chunk_size: usize,
}

impl PlainTextExtractor {
    /// Create an extractor writing to `index`
    pub fn new(index: Arc<dyn IndexService>) -> Self {
        Self {
            index,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain-text"
    }

    fn is_supported(&self, _file: &FileRecord, detected_format: Option<&str>) -> bool {
        matches!(
            detected_format,
            Some(f) if (f.starts_with("text/") && f != "text/html")
                || f == "application/json"
                || f == "application/xml"
        )
    }

    fn index(&self, file: &FileRecord) -> Result<(), ExtractError> {
        let text = String::from_utf8_lossy(file.content());
        write_chunks(self.index.as_ref(), file, &text, self.chunk_size).map(|_| ())
    }
}

// ============================================================================
// HtmlTextExtractor
// ============================================================================

fn html_patterns() -> Option<&'static (Regex, Regex)> {
    static PATTERNS: OnceLock<Option<(Regex, Regex)>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            let blocks = Regex::new(r"(?is)<(script|style)\b.*?</(script|style)\s*>").ok()?;
            let tags = Regex::new(r"(?s)<[^>]*>").ok()?;
            Some((blocks, tags))
        })
        .as_ref()
}

/// Extractor for HTML: drops scripts, styles and tags
pub struct HtmlTextExtractor {
    index: Arc<dyn IndexService>,
    chunk_size: usize,
}

impl HtmlTextExtractor {
    /// Create an extractor writing to `index`
    pub fn new(index: Arc<dyn IndexService>) -> Self {
        Self {
            index,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Visible text of an HTML document
    pub fn visible_text(html: &str) -> String {
        let stripped = match html_patterns() {
            Some((blocks, tags)) => {
                let without_blocks = blocks.replace_all(html, " ");
                tags.replace_all(&without_blocks, " ").into_owned()
            }
            None => html.to_string(),
        };
        stripped
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&")
    }
}

impl TextExtractor for HtmlTextExtractor {
    fn name(&self) -> &str {
        "html"
    }

    fn is_supported(&self, _file: &FileRecord, detected_format: Option<&str>) -> bool {
        matches!(detected_format, Some("text/html") | Some("application/xhtml+xml"))
    }

    fn index(&self, file: &FileRecord) -> Result<(), ExtractError> {
        let html = String::from_utf8_lossy(file.content());
        let text = Self::visible_text(&html);
        write_chunks(self.index.as_ref(), file, &text, self.chunk_size).map(|_| ())
    }
}

// ============================================================================
// AsciiStringExtractor
// ============================================================================

/// Heuristic extractor keeping runs of printable ASCII, like `strings(1)`
pub struct AsciiStringExtractor {
    index: Arc<dyn IndexService>,
    chunk_size: usize,
}

impl AsciiStringExtractor {
    /// Create an extractor writing to `index`
    pub fn new(index: Arc<dyn IndexService>) -> Self {
        Self {
            index,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Printable runs of at least four characters, one per line
    pub fn strings(content: &[u8]) -> String {
        let mut out = String::new();
        for run in content.split(|b| !(b.is_ascii_graphic() || *b == b' ' || *b == b'\t')) {
            if run.len() >= MIN_STRING_LEN {
                // printable ASCII is valid UTF-8
                out.push_str(&String::from_utf8_lossy(run));
                out.push('\n');
            }
        }
        out
    }
}

impl StringExtractor for AsciiStringExtractor {
    fn index(&self, file: &FileRecord) -> Result<(), ExtractError> {
        let text = Self::strings(file.content());
        if text.trim().is_empty() {
            self.index.add_document(Document::metadata_only(file))?;
            return Ok(());
        }
        write_chunks(self.index.as_ref(), file, &text, self.chunk_size).map(|_| ())
    }
}

// ============================================================================
// ExtensionFormatDetector
// ============================================================================

const MAGIC: &[(&[u8], &str)] = &[
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
    (b"7z\xbc\xaf\x27\x1c", "application/x-7z-compressed"),
    (b"Rar!\x1a\x07", "application/x-rar-compressed"),
    (b"BZh", "application/x-bzip2"),
    (b"%PDF-", "application/pdf"),
    (b"\x89PNG", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
];

const EXTENSIONS: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("log", "text/plain"),
    ("csv", "text/csv"),
    ("md", "text/markdown"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("xhtml", "application/xhtml+xml"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("tar", "application/x-tar"),
    ("gz", "application/gzip"),
    ("tgz", "application/gzip"),
    ("zip", "application/zip"),
    ("7z", "application/x-7z-compressed"),
    ("rar", "application/x-rar-compressed"),
    ("bz2", "application/x-bzip2"),
];

/// Detects formats from magic bytes, then the file extension, then by
/// sniffing for NUL-free UTF-8
#[derive(Debug, Default)]
pub struct ExtensionFormatDetector;

impl ExtensionFormatDetector {
    /// Create a detector
    pub fn new() -> Self {
        Self
    }
}

impl FormatDetector for ExtensionFormatDetector {
    fn detect(&self, file: &FileRecord) -> Result<Option<String>, ExtractError> {
        let content = file.content();
        if let Some((_, mime)) = MAGIC.iter().find(|(magic, _)| content.starts_with(magic)) {
            return Ok(Some(mime.to_string()));
        }

        if let Some(ext) = file.extension() {
            if let Some((_, mime)) = EXTENSIONS.iter().find(|(e, _)| *e == ext) {
                return Ok(Some(mime.to_string()));
            }
        }

        let sample = &content[..content.len().min(4096)];
        if !sample.is_empty() && !sample.contains(&0) && std::str::from_utf8(sample).is_ok() {
            return Ok(Some("text/plain".to_string()));
        }
        Ok(None)
    }
}
