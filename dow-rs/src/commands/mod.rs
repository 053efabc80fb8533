//! Command implementations, one module per file family

pub mod chunky;
pub mod rsh;
pub mod whm;
pub mod wtp;
