// FACTSHORTS Core Library
// Caption-speech synchronization and short-form narration rendering.

pub mod caption;
pub mod config;
pub mod facts;
pub mod narration;
pub mod render;
pub mod server;
