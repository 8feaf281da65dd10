//! # stride-channels
//!
//! MAX Bot API transport: long-polling for updates, sending and editing
//! messages, and the keyboard/text renderers for every screen the bot
//! shows.

pub mod max;
pub mod ui;

pub use max::MaxChannel;
