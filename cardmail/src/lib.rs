//! cardmail library
//!
//! Business-card-to-email engine: card extraction and drafting through a
//! generative model, per-user contacts with folders and a trash
//! lifecycle, public share snapshots and `mailto:` handoff.

pub mod ai;
pub mod app;
pub mod cache;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod feed;
pub mod mailto;
pub mod services;
pub mod storage;
