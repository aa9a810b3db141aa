//! Chapter candidate extracted from the listing page.

use serde::{Deserialize, Serialize};

use crate::utils::text::clean_title;
use crate::utils::url::normalize;

/// A chapter seen on the page this cycle, not yet checked against history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    /// Normalized chapter URL
    pub identifier: String,

    /// Display title (may be empty, in which case it is never announced)
    pub title: String,

    /// Chapter number label, when the page shows one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

impl Candidate {
    /// Build a candidate from a raw link and title.
    pub fn new(url: &str, title: &str) -> Self {
        Self {
            identifier: normalize(url),
            title: clean_title(title),
            number: None,
        }
    }

    /// Attach a chapter number; blank labels are dropped.
    pub fn with_number(mut self, number: &str) -> Self {
        let number = clean_title(number);
        self.number = if number.is_empty() { None } else { Some(number) };
        self
    }

    /// `"number: title"` when a number exists, otherwise just the title.
    pub fn heading(&self) -> String {
        match &self.number {
            Some(number) => format!("{}: {}", number, self.title),
            None => self.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_and_cleans() {
        let c = Candidate::new("https://example.com/c/12/?ref=home", "  Ch 12\n  & more ");
        assert_eq!(c.identifier, "https://example.com/c/12");
        assert_eq!(c.title, "Ch 12 & more");
        assert!(c.number.is_none());
    }

    #[test]
    fn test_new_does_not_decode_twice() {
        let c = Candidate::new("/c/9", "Use &lt;br&gt; tags");
        assert_eq!(c.title, "Use &lt;br&gt; tags");
    }

    #[test]
    fn test_heading() {
        let plain = Candidate::new("/c/1", "Prologue");
        assert_eq!(plain.heading(), "Prologue");

        let numbered = Candidate::new("/c/2", "The Return").with_number(" Chapter 2 ");
        assert_eq!(numbered.heading(), "Chapter 2: The Return");

        let blank = Candidate::new("/c/3", "Epilogue").with_number("   ");
        assert_eq!(blank.number, None);
    }
}
