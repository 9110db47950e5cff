//! Merge rules for configuration sources.

pub(crate) mod merge_policy;
