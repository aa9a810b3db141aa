// src/config.rs

//! Configuration loading utilities.
//!
//! Values come from the TOML file first; environment variables, when set to
//! a non-blank value, override them:
//!
//! | Variable             | Field                   |
//! |----------------------|-------------------------|
//! | `TARGET_URL`         | `target.url`            |
//! | `TELEGRAM_BOT_TOKEN` | `telegram.bot_token`    |
//! | `TELEGRAM_CHAT_ID`   | `telegram.chat_id`      |
//! | `POLL_INTERVAL_SECS` | `poll.interval_secs`    |
//! | `STATE_DIR`          | `storage.dir`           |

use std::path::{Path, PathBuf};

use crate::models::Config;

/// Load configuration from a TOML file, then apply the process environment.
///
/// Falls back to defaults if the file cannot be loaded.
pub fn load(path: &Path) -> Config {
    let mut config = Config::load_or_default(path);
    apply_env(&mut config, |key| std::env::var(key).ok());
    config
}

/// Override config fields from an environment lookup.
pub fn apply_env<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("TARGET_URL") {
        config.target.url = url;
    }
    if let Some(token) = get("TELEGRAM_BOT_TOKEN") {
        config.telegram.bot_token = token;
    }
    if let Some(chat_id) = get("TELEGRAM_CHAT_ID") {
        config.telegram.chat_id = chat_id;
    }
    if let Some(raw) = get("POLL_INTERVAL_SECS") {
        match raw.trim().parse() {
            Ok(secs) => config.poll.interval_secs = secs,
            Err(e) => log::warn!("Ignoring POLL_INTERVAL_SECS={raw:?}: {e}"),
        }
    }
    if let Some(dir) = get("STATE_DIR") {
        config.storage.dir = PathBuf::from(dir);
    }
}
