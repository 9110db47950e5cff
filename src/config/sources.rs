//! Configuration sources, lowest precedence first.

pub(crate) mod env;
pub(crate) mod global_file;
