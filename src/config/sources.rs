//! Configuration sources, applied lowest to highest precedence.

pub mod environment;
pub mod explicit_file;
pub mod global_file;
