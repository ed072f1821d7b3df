//! Text normalization applied to every preview page.

use std::sync::LazyLock;

use regex::Regex;

static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());

static LINE_BREAKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\r\n\t]+").unwrap());

/// From the scheme to the next whitespace or the end of the text.
static URLS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S*").unwrap());

/// Normalize one storage page without touching its outer spaces.
///
/// Collapses runs of spaces, drops carriage returns, newlines and tabs
/// (adjacent lines are joined with no separator) and strips URLs. Spaces
/// are collapsed again afterwards so removals never leave a double space.
pub fn normalize_page(text: &str) -> String {
    let text = SPACE_RUNS.replace_all(text, " ");
    let text = LINE_BREAKS.replace_all(&text, "");
    let text = URLS.replace_all(&text, "");
    SPACE_RUNS.replace_all(&text, " ").into_owned()
}

/// Normalize a standalone string: [`normalize_page`] plus trimming of
/// leading and trailing spaces. Idempotent.
pub fn normalize_text(text: &str) -> String {
    normalize_page(text).trim_matches(' ').to_string()
}

/// Cut `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &mut String, max_chars: usize) {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(idx);
    }
}
