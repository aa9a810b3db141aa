// src/models/mod.rs

//! Domain models for the notifier.

mod candidate;
mod config;
mod record;

// Re-export all public types
pub use candidate::Candidate;
pub use config::{
    CompiledSelectors, Config, ExtractorConfig, MessageConfig, NotifyOrder, PollConfig,
    StorageConfig, TargetConfig, TelegramConfig,
};
pub use record::{NotifiedRecord, SeenSet};
