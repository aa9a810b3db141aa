// src/lib.rs

//! Chapter Notifier Library
//!
//! Polls a chapter listing page, works out which chapters have not been
//! announced yet, sends one Telegram message per new chapter and records
//! them so they are not announced twice.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
