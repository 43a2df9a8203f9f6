//! ADIF logbook codec.
//!
//! Parses tag-delimited ADIF documents into flat field maps, applies the
//! common-mistake fixups logging programs are known for, and writes merged
//! records back out as ADIF or WSJT-X `.log` CSV. String in, string out;
//! no file or path handling.

pub mod error;
pub mod fixup;
pub mod parse;
pub mod write;

pub use error::AdifError;
pub use fixup::fixup;
pub use parse::{decode_bytes, parse};
pub use write::{write, write_wsjtx_csv};
