//! Shared utilities for the dow-rs CLI

pub mod tree;

pub use tree::*;
