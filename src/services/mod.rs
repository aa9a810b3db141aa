//! Service layer for the notifier.
//!
//! The three collaborators of a poll cycle, each behind a trait so the loop
//! can run against fixtures:
//! - Page fetching (`Fetcher`, `HttpFetcher`)
//! - Chapter extraction (`Extractor`, `SelectorExtractor`)
//! - Delivery (`Notifier`, `TelegramNotifier`)

mod extractor;
mod fetcher;
mod notifier;

pub use extractor::{Extractor, SelectorExtractor};
pub use fetcher::{Fetcher, HttpFetcher};
pub use notifier::{Notifier, TelegramNotifier, render_message};
