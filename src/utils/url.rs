// src/utils/url.rs

//! URL manipulation utilities.

/// Canonicalize a chapter URL so equivalent links compare equal.
///
/// Drops the query string and fragment, then trailing slashes and
/// surrounding whitespace. Applying it twice gives the same result.
///
/// # Examples
/// ```
/// use chapter_notifier::utils::url::normalize;
///
/// assert_eq!(
///     normalize("https://example.com/c/12/?from=home#top"),
///     "https://example.com/c/12"
/// );
/// ```
pub fn normalize(url: &str) -> String {
    let trimmed = url.trim_start();
    let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
    trimmed[..end]
        .trim_end_matches(|c: char| c == '/' || c.is_whitespace())
        .to_string()
}

/// Resolve a potentially relative link against the page it came from.
///
/// Falls back to the raw link if either side does not parse.
pub fn resolve(base: &str, href: &str) -> String {
    url::Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
