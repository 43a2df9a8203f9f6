//! CLI exit code registry.
//!
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                        |
//! |------|------------------------------------------------|
//! | 0    | Success, no unresolved conflicts               |
//! | 1    | General error (IO, write failure)              |
//! | 2    | CLI usage error (clap)                         |
//! | 3    | Invalid merge config                           |
//! | 4    | Input file parse failure                       |
//! | 5    | Merge completed with unresolved conflicts      |

/// Success - merge completed, no unresolved conflicts.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - IO failure, unwritable output.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments (emitted by clap itself).
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

/// Merge config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// An input file could not be parsed as ADIF.
pub const EXIT_PARSE: u8 = 4;

/// Merge completed and outputs were written, but some fields could not be
/// reconciled; see the problem report.
pub const EXIT_CONFLICTS: u8 = 5;
