//! Guild Dispatch Bot Library
//!
//! Command dispatch for a chat community bot.
//!
//! This crate provides the core functionality for:
//! - Filtering inbound chat messages and resolving per-community prefixes
//! - Expanding community aliases and running standard or custom commands
//! - Persisting per-community configuration, one JSON file per community
//! - Counting and tracking command results

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod store;
