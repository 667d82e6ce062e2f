//! Term tokenizer for the in-memory index
//!
//! - Lowercase
//! - Split on non-alphanumeric characters
//! - Drop empty tokens

/// Tokenize text into index terms
///
/// # Example
///
/// ```
/// use keyhunt_inmem::tokenizer::tokenize;
///
/// assert_eq!(tokenize("Hello, World!"), vec!["hello", "world"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// True if `needle` occurs as a run of consecutive tokens in `haystack`
pub fn contains_phrase(haystack: &[String], needle: &[String]) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}
