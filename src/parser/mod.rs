//! Parser module
//!
//! Command-at-a-time parsing with in-line substitution, plus the
//! standalone substitutor and the backslash escape table.

pub mod command;
pub mod context;
pub mod escapes;
pub mod subst;

pub use command::{find_matching_bracket, parse_command};
pub use context::{ParseContext, ParseError, ParseStatus};
pub use subst::{substitute, SubstFlags};
