//! Result Codes and Return Options
//!
//! The evaluator's result protocol: every command and script evaluation
//! finishes with exactly one of five codes. Codes are ordinary return
//! values inspected at every call site, never Rust errors or panics;
//! that is what lets `catch`, `try`, and the loop builtins cooperate,
//! and it keeps the interpreter reentrant when a host embeds several.
//!
//! Alongside the code travels the return-options dictionary (`-code`,
//! `-level`, `-errorcode`, `-errorinfo`, plus user keys) observable via
//! `catch` and `try`.

use crate::value::{Dict, Value};

/// Completion code of a command or script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    Ok,
    Error,
    Return,
    Break,
    Continue,
}

impl Code {
    pub fn to_int(self) -> i64 {
        match self {
            Code::Ok => 0,
            Code::Error => 1,
            Code::Return => 2,
            Code::Break => 3,
            Code::Continue => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Code::Ok => "ok",
            Code::Error => "error",
            Code::Return => "return",
            Code::Break => "break",
            Code::Continue => "continue",
        }
    }

    /// Accepts the symbolic names or the integers 0 through 4.
    pub fn from_spec(spec: &str) -> Result<Code, String> {
        match spec {
            "ok" => return Ok(Code::Ok),
            "error" => return Ok(Code::Error),
            "return" => return Ok(Code::Return),
            "break" => return Ok(Code::Break),
            "continue" => return Ok(Code::Continue),
            _ => {}
        }
        match spec.trim().parse::<i64>() {
            Ok(0) => Ok(Code::Ok),
            Ok(1) => Ok(Code::Error),
            Ok(2) => Ok(Code::Return),
            Ok(3) => Ok(Code::Break),
            Ok(4) => Ok(Code::Continue),
            _ => Err(format!(
                "bad completion code \"{}\": must be ok, error, return, break, continue, or an integer",
                spec
            )),
        }
    }
}

/// Auxiliary options accompanying a result code.
#[derive(Debug, Clone)]
pub struct ReturnOptions {
    /// The `-code` a `return` asked for, applied once `-level` reaches 0.
    pub code: Code,
    /// Remaining procedure boundaries a `return` should unwind.
    pub level: i64,
    pub errorcode: Option<Value>,
    pub errorinfo: Option<Value>,
    /// User-supplied keys, in the order given.
    pub extra: Vec<(String, Value)>,
}

impl Default for ReturnOptions {
    fn default() -> Self {
        Self {
            code: Code::Ok,
            level: 0,
            errorcode: None,
            errorinfo: None,
            extra: Vec::new(),
        }
    }
}

impl ReturnOptions {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Materialize the options dictionary for an observed result code,
    /// as `catch` and `try` hand it to scripts.
    pub fn to_dict(&self, actual: Code) -> Value {
        let mut map = Dict::new();
        match actual {
            Code::Error => {
                map.insert("-code".to_string(), Value::int(1));
                map.insert("-level".to_string(), Value::int(0));
                map.insert(
                    "-errorcode".to_string(),
                    self.errorcode.clone().unwrap_or_else(|| Value::string("NONE")),
                );
                if let Some(info) = &self.errorinfo {
                    map.insert("-errorinfo".to_string(), info.clone());
                }
            }
            Code::Return => {
                map.insert("-code".to_string(), Value::int(self.code.to_int()));
                map.insert("-level".to_string(), Value::int(self.level));
                if let Some(ec) = &self.errorcode {
                    map.insert("-errorcode".to_string(), ec.clone());
                }
                if let Some(info) = &self.errorinfo {
                    map.insert("-errorinfo".to_string(), info.clone());
                }
            }
            other => {
                map.insert("-code".to_string(), Value::int(other.to_int()));
                map.insert("-level".to_string(), Value::int(0));
            }
        }
        for (k, v) in &self.extra {
            map.insert(k.clone(), v.clone());
        }
        Value::dict(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_spec() {
        assert_eq!(Code::from_spec("ok").unwrap(), Code::Ok);
        assert_eq!(Code::from_spec("2").unwrap(), Code::Return);
        assert!(Code::from_spec("7").is_err());
        assert!(Code::from_spec("maybe").is_err());
    }

    #[test]
    fn test_error_dict_defaults() {
        let opts = ReturnOptions::default();
        let d = opts.to_dict(Code::Error);
        let map = d.as_dict().unwrap();
        assert_eq!(map.get("-code").unwrap().as_str(), "1");
        assert_eq!(map.get("-errorcode").unwrap().as_str(), "NONE");
    }
}
