//! Stage plumbing shared by every part of the reader.

pub mod cancel;
pub mod chain;
pub mod config;
pub mod pipe;
pub mod runtime;
pub mod state;
