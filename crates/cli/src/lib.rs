//! Support library for the `logmerge` binary.

pub mod load;
