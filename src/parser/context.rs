//! Parse Context and Statuses
//!
//! A `ParseContext` is an iterator state over a script's bytes: the
//! current offset, the current line, and the most recently parsed
//! command. The parser hands back one of four statuses; the incomplete
//! and error cases additionally leave a descriptor list in the
//! interpreter's result slot so an interactive caller can decide to
//! read more input.

use thiserror::Error;

use crate::interp::Code;
use crate::value::Value;

/// Outcome of one `parse_command` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// A command was parsed into `ParseContext::words`.
    Ok,
    /// No more commands in the script.
    Done,
    /// Input ended inside a brace, quote, or bracket; the result slot
    /// holds `{INCOMPLETE start end}`.
    Incomplete,
    /// Structural error; the result slot holds `{ERROR start end message}`.
    Error,
    /// A substitution evaluated during parsing finished with a non-OK
    /// code; the result slot already reflects it.
    Abort(Code),
}

/// A structural parse failure with its byte span.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub start: usize,
    pub end: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, start: usize, end: usize) -> Self {
        Self { message: message.into(), start, end }
    }

    /// The `{ERROR start end message}` descriptor.
    pub fn descriptor(&self) -> Value {
        Value::list(vec![
            Value::string("ERROR"),
            Value::int(self.start as i64),
            Value::int(self.end as i64),
            Value::string(self.message.clone()),
        ])
    }
}

/// The `{INCOMPLETE start end}` descriptor.
pub fn incomplete_descriptor(start: usize, end: usize) -> Value {
    Value::list(vec![
        Value::string("INCOMPLETE"),
        Value::int(start as i64),
        Value::int(end as i64),
    ])
}

/// Iterator state over a script.
pub struct ParseContext<'a> {
    pub src: &'a str,
    pub pos: usize,
    /// 1-based line of `pos`.
    pub line: usize,
    /// Line on which the current command started.
    pub cmd_line: usize,
    /// Words of the most recently parsed command.
    pub words: Vec<Value>,
}

impl<'a> ParseContext<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0, line: 1, cmd_line: 1, words: Vec::new() }
    }
}

/// Failure modes while assembling a single word.
pub(crate) enum WordFail {
    Incomplete(usize, usize),
    Syntax(ParseError),
    Abort(Code),
}
