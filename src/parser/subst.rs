//! Standalone Substitutor
//!
//! Performs backslash, variable, and command substitution over an
//! arbitrary string, each independently selectable. No other
//! tokenization happens here: braces, quotes, and whitespace are
//! ordinary bytes in this mode. Semantics of each enabled substitution
//! match the command parser exactly.

use crate::interp::eval::eval_script;
use crate::interp::{Code, Interp};
use crate::parser::command::{find_matching_bracket, scan_varname};
use crate::parser::escapes::backslash;
use crate::value::Value;

/// Which substitutions to perform.
#[derive(Debug, Clone, Copy)]
pub struct SubstFlags {
    pub backslashes: bool,
    pub variables: bool,
    pub commands: bool,
}

impl Default for SubstFlags {
    fn default() -> Self {
        Self { backslashes: true, variables: true, commands: true }
    }
}

/// Substitute over `s`, leaving the result in the interpreter's result
/// slot. A `break` inside a command substitution stops substitution at
/// that point; a `continue` drops just that substitution; a `return`
/// substitutes its value.
pub fn substitute(interp: &mut Interp, s: &str, flags: SubstFlags) -> Code {
    let src = s.as_bytes();
    let mut out = String::new();
    let mut span = 0usize;
    let mut i = 0usize;

    while i < src.len() {
        match src[i] {
            b'\\' if flags.backslashes => {
                out.push_str(&s[span..i]);
                let (decoded, next) = backslash(src, i);
                out.push_str(&decoded);
                i = next;
                span = next;
            }
            b'$' if flags.variables => {
                let scanned = match scan_varname(src, i) {
                    Ok(sc) => sc,
                    Err(e) => return interp.error(e.message),
                };
                match scanned {
                    None => i += 1,
                    Some((start, end, next)) => {
                        out.push_str(&s[span..i]);
                        let name = &s[start..end];
                        match interp.var_get(name) {
                            Ok(v) => out.push_str(v.as_str()),
                            Err(msg) => return interp.error(msg),
                        }
                        i = next;
                        span = next;
                    }
                }
            }
            b'[' if flags.commands => {
                out.push_str(&s[span..i]);
                let close = match find_matching_bracket(src, i) {
                    Some(c) => c,
                    None => return interp.error("missing close-bracket"),
                };
                let code = eval_script(interp, &s[i + 1..close]);
                match code {
                    Code::Ok | Code::Return => out.push_str(interp.result().as_str()),
                    Code::Continue => {}
                    Code::Break => {
                        interp.set_result(Value::string(out));
                        return Code::Ok;
                    }
                    Code::Error => return Code::Error,
                }
                i = close + 1;
                span = i;
            }
            _ => i += 1,
        }
    }
    out.push_str(&s[span..]);
    interp.set_result(Value::string(out));
    Code::Ok
}
