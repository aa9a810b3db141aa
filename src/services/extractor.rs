// src/services/extractor.rs

//! Chapter extraction from listing HTML.
//!
//! The listing is expected newest first; only the first `max_items` entries
//! are read. An entry's link comes from the configured attribute on the
//! entry element itself, or on the first descendant carrying it.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Candidate, CompiledSelectors, ExtractorConfig};
use crate::utils::url::resolve;

/// Turns raw page content into an ordered list of candidates.
pub trait Extractor: Send + Sync {
    fn extract(&self, page: &str) -> Result<Vec<Candidate>>;
}

/// CSS-selector based extractor.
pub struct SelectorExtractor {
    base_url: String,
    selectors: CompiledSelectors,
    link_attr: String,
    link_fallback: Selector,
    max_items: usize,
}

impl SelectorExtractor {
    /// Build an extractor; relative links are resolved against `base_url`.
    pub fn new(config: &ExtractorConfig, base_url: impl Into<String>) -> Result<Self> {
        let fallback = format!("[{}]", config.link_attr);
        let link_fallback =
            Selector::parse(&fallback).map_err(|e| AppError::selector(&fallback, format!("{e:?}")))?;

        Ok(Self {
            base_url: base_url.into(),
            selectors: config.compile()?,
            link_attr: config.link_attr.clone(),
            link_fallback,
            max_items: config.max_items,
        })
    }

    fn link_of(&self, item: ElementRef<'_>) -> Option<String> {
        item.value()
            .attr(&self.link_attr)
            .or_else(|| {
                item.select(&self.link_fallback)
                    .next()
                    .and_then(|el| el.value().attr(&self.link_attr))
            })
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(|href| resolve(&self.base_url, href))
    }

    fn text_of(item: ElementRef<'_>, selector: &Selector) -> String {
        item.select(selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default()
    }
}

impl Extractor for SelectorExtractor {
    fn extract(&self, page: &str) -> Result<Vec<Candidate>> {
        if page.trim().is_empty() {
            return Err(AppError::extract("page content is empty"));
        }

        let document = Html::parse_document(page);
        let mut candidates = Vec::new();

        for item in document.select(&self.selectors.item).take(self.max_items) {
            let Some(link) = self.link_of(item) else {
                log::debug!("Skipping entry without '{}' attribute", self.link_attr);
                continue;
            };

            let title = Self::text_of(item, &self.selectors.title);
            let mut candidate = Candidate::new(&link, &title);
            if let Some(number_sel) = &self.selectors.number {
                candidate = candidate.with_number(&Self::text_of(item, number_sel));
            }
            candidates.push(candidate);
        }

        log::debug!("Extracted {} candidates", candidates.len());
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <div class="chapter-card-desktop">
            <a class="chapter-link-desktop" href="/title/42/chapter/13/?from=list">
              <div class="chapter-number">Chapter 13</div>
              <div class="chapter-title">  The &amp; Return </div>
            </a>
          </div>
          <div class="chapter-card-desktop">
            <a class="chapter-link-desktop" href="https://example.com/title/42/chapter/12">
              <div class="chapter-number">Chapter 12</div>
              <div class="chapter-title">Departure</div>
            </a>
          </div>
          <div class="chapter-card-desktop">
            <a class="chapter-link-desktop" href="  ">
              <div class="chapter-title">No link</div>
            </a>
          </div>
          <div class="chapter-card-desktop">
            <a class="chapter-link-desktop" href="/title/42/chapter/11">
              <div class="chapter-number">Chapter 11</div>
            </a>
          </div>
        </body></html>
    "#;

    fn extractor(config: &ExtractorConfig) -> SelectorExtractor {
        SelectorExtractor::new(config, "https://example.com/title/42").unwrap()
    }

    #[test]
    fn test_extracts_in_page_order() {
        let candidates = extractor(&ExtractorConfig::default())
            .extract(LISTING)
            .unwrap();

        let ids: Vec<_> = candidates.iter().map(|c| c.identifier.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "https://example.com/title/42/chapter/13",
                "https://example.com/title/42/chapter/12",
                "https://example.com/title/42/chapter/11",
            ]
        );
        assert_eq!(candidates[0].title, "The & Return");
        assert_eq!(candidates[0].number.as_deref(), Some("Chapter 13"));
        assert_eq!(candidates[2].title, "");
    }

    #[test]
    fn test_entities_decoded_once() {
        let html = r#"
            <div class="chapter-card-desktop">
              <a class="chapter-link-desktop" href="/c/5">
                <div class="chapter-title">Use &amp;lt;br&amp;gt; tags</div>
              </a>
            </div>
        "#;
        let candidates = extractor(&ExtractorConfig::default()).extract(html).unwrap();
        assert_eq!(candidates[0].title, "Use &lt;br&gt; tags");
    }

    #[test]
    fn test_respects_max_items() {
        let config = ExtractorConfig {
            max_items: 1,
            ..ExtractorConfig::default()
        };
        let candidates = extractor(&config).extract(LISTING).unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_link_from_descendant() {
        let config = ExtractorConfig {
            item_selector: "li.chapter".to_string(),
            title_selector: "a".to_string(),
            number_selector: None,
            ..ExtractorConfig::default()
        };
        let html = r#"<ul><li class="chapter"><a href="/c/7">Seven</a></li></ul>"#;

        let candidates = extractor(&config).extract(html).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].identifier, "https://example.com/c/7");
        assert_eq!(candidates[0].title, "Seven");
        assert_eq!(candidates[0].number, None);
    }

    #[test]
    fn test_no_matches_is_empty_not_error() {
        let candidates = extractor(&ExtractorConfig::default())
            .extract("<html><body><p>maintenance</p></body></html>")
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_blank_page_is_extract_error() {
        let err = extractor(&ExtractorConfig::default())
            .extract("   ")
            .unwrap_err();
        assert!(matches!(err, AppError::Extract(_)));
    }
}
