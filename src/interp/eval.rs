//! Evaluator
//!
//! Drives the parser over a script one command at a time, dispatches
//! each command through the registry, and propagates result codes.
//! `OK` continues, `ERROR` aborts with a trace line appended once,
//! and `RETURN`/`BREAK`/`CONTINUE` propagate to whichever caller
//! consumes them (procedure invocation and the loop builtins).

use crate::interp::interp::Interp;
use crate::interp::proc_call::invoke_proc;
use crate::interp::registry::{CommandEntry, CommandKind};
use crate::interp::result::Code;
use crate::parser::{parse_command, ParseContext, ParseStatus};
use crate::value::{format_element, Value};

/// Evaluate a script in the current scope.
pub fn eval_script(interp: &mut Interp, script: &str) -> Code {
    if interp.nesting + interp.frames.len() >= interp.limits.max_nesting {
        return interp.error("too many nested evaluations");
    }
    interp.nesting += 1;
    let code = eval_loop(interp, script);
    interp.nesting -= 1;
    code
}

fn eval_loop(interp: &mut Interp, script: &str) -> Code {
    let mut ctx = ParseContext::new(script);
    let mut last = Value::empty();
    loop {
        match parse_command(interp, &mut ctx) {
            ParseStatus::Done => {
                interp.set_result(last);
                return Code::Ok;
            }
            ParseStatus::Ok => {
                if ctx.words.is_empty() {
                    continue;
                }
                let words = std::mem::take(&mut ctx.words);
                interp.frames[interp.active].line = Some(ctx.cmd_line);
                match exec_command(interp, &words) {
                    Code::Ok => last = interp.result(),
                    Code::Error => {
                        add_error_trace(interp, &words);
                        return Code::Error;
                    }
                    other => return other,
                }
            }
            ParseStatus::Incomplete | ParseStatus::Error => return Code::Error,
            ParseStatus::Abort(code) => return code,
        }
    }
}

/// Execute one parsed command. An empty command is a no-op with an
/// empty result.
pub fn exec_command(interp: &mut Interp, words: &[Value]) -> Code {
    if words.is_empty() {
        interp.reset_result();
        return Code::Ok;
    }
    interp.opts.reset();
    interp.errorinfo_pending = false;
    let name = words[0].as_str().to_string();
    match interp.find_command(&name) {
        Some(entry) => invoke_entry(interp, entry, words),
        None => match interp.find_command("unknown") {
            Some(fallback) => {
                let mut argv = Vec::with_capacity(words.len() + 1);
                argv.push(Value::string("unknown"));
                argv.extend_from_slice(words);
                invoke_entry(interp, fallback, &argv)
            }
            None => interp.error(format!("invalid command name \"{}\"", name)),
        },
    }
}

fn invoke_entry(interp: &mut Interp, entry: CommandEntry, words: &[Value]) -> Code {
    match entry.kind {
        CommandKind::Builtin(f) => f(interp, words),
        CommandKind::Proc { ref params, ref body } => {
            invoke_proc(interp, &entry.name, params, body, words, None)
        }
    }
}

/// Append the single "while executing" frame to `-errorinfo` on the
/// initial unwind; later evaluators see the flag and leave it alone.
fn add_error_trace(interp: &mut Interp, words: &[Value]) {
    if interp.errorinfo_pending {
        return;
    }
    interp.errorinfo_pending = true;
    if let Some(info) = interp.opts.errorinfo.take() {
        let text = command_text(words);
        interp.opts.errorinfo = Some(Value::string(format!(
            "{}\n    while executing\n\"{}\"",
            info.as_str(),
            text
        )));
    }
}

/// A printable reconstruction of the command, truncated for traces.
fn command_text(words: &[Value]) -> String {
    let mut out = String::new();
    for (i, w) in words.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format_element(w.as_str()));
        if out.len() > 150 {
            out.truncate(150);
            while !out.is_char_boundary(out.len()) {
                out.pop();
            }
            out.push_str("...");
            break;
        }
    }
    out
}
