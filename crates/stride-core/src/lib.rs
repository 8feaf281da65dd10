//! # stride-core
//!
//! Core types, traits, configuration, and error handling for the Stride bot.

pub mod config;
pub mod draft;
pub mod error;
pub mod event;
pub mod marker;
pub mod message;
pub mod model;
pub mod recurrence;
pub mod traits;
