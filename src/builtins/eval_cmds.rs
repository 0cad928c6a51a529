//! Script Re-entry Builtins
//!
//! `eval`, `uplevel`, `subst`, `apply`, and `tailcall`: the commands
//! that feed text back into the evaluator or move evaluation to a
//! different frame.

use crate::interp::proc_call::invoke_proc;
use crate::interp::resolver::normalize_ns;
use crate::interp::{Code, Interp};
use crate::parser::SubstFlags;
use crate::value::{format_element, Value};

/// Join arguments the way `concat` does: trimmed, empties dropped,
/// separated by single spaces.
pub fn concat_args(args: &[Value]) -> String {
    let mut out = String::new();
    for arg in args {
        let t = arg
            .as_str()
            .trim_matches(|c: char| c.is_ascii_whitespace());
        if t.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(t);
    }
    out
}

pub fn cmd_eval(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.error("wrong # args: should be \"eval arg ?arg ...?\"");
    }
    if argv.len() == 2 {
        return interp.eval_value(&argv[1].clone());
    }
    let script = concat_args(&argv[1..]);
    interp.eval(&script)
}

pub fn cmd_uplevel(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.error("wrong # args: should be \"uplevel ?level? command ?arg ...?\"");
    }
    // The first argument is a level when it looks like one and a script
    // remains after it.
    let first = argv[1].as_str();
    let looks_like_level = first.starts_with('#')
        || first.bytes().next().map_or(false, |b| b.is_ascii_digit());
    let (target, rest) = if looks_like_level && argv.len() > 2 {
        match interp.parse_level(first) {
            Ok(t) => (t, &argv[2..]),
            Err(e) => return interp.error(e),
        }
    } else {
        match interp.active_level().checked_sub(1) {
            Some(t) => (t, &argv[1..]),
            None => return interp.error("bad level \"1\""),
        }
    };
    let script = if rest.len() == 1 {
        rest[0].as_str().to_string()
    } else {
        concat_args(rest)
    };
    interp.with_active(target, |interp| interp.eval(&script))
}

pub fn cmd_subst(interp: &mut Interp, argv: &[Value]) -> Code {
    let mut flags = SubstFlags::default();
    let mut i = 1;
    while i < argv.len() - 1 {
        match argv[i].as_str() {
            "-nobackslashes" => flags.backslashes = false,
            "-nocommands" => flags.commands = false,
            "-novariables" => flags.variables = false,
            other => {
                return interp.error(format!(
                    "bad switch \"{}\": must be -nobackslashes, -nocommands, or -novariables",
                    other
                ))
            }
        }
        i += 1;
    }
    if i != argv.len() - 1 {
        return interp.error(
            "wrong # args: should be \"subst ?-nobackslashes? ?-nocommands? ?-novariables? string\"",
        );
    }
    let s = argv[i].clone();
    interp.subst(&s, flags)
}

pub fn cmd_apply(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.error("wrong # args: should be \"apply lambdaExpr ?arg ...?\"");
    }
    let lambda = argv[1].clone();
    let parts = match lambda.as_list() {
        Ok(p) => p,
        Err(_) => {
            return interp.error(format!(
                "can't interpret \"{}\" as a lambda expression",
                lambda.as_str()
            ))
        }
    };
    if parts.len() < 2 || parts.len() > 3 {
        return interp.error(format!(
            "can't interpret \"{}\" as a lambda expression",
            lambda.as_str()
        ));
    }
    let params = parts[0].clone();
    let body = parts[1].clone();
    let ns = parts
        .get(2)
        .map(|v| normalize_ns(v.as_str()))
        .unwrap_or_else(|| "::".to_string());

    // The display name in argument errors reads as the apply call did.
    let display = format!("apply {}", format_element(lambda.as_str()));
    let mut call: Vec<Value> = Vec::with_capacity(argv.len() - 1);
    call.push(Value::string(display));
    call.extend_from_slice(&argv[2..]);

    let cmd_name = if ns == "::" {
        "::apply".to_string()
    } else {
        format!("{}::apply", ns)
    };
    invoke_proc(interp, &cmd_name, &params, &body, &call, Some(lambda))
}

pub fn cmd_tailcall(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.error("wrong # args: should be \"tailcall command ?arg ...?\"");
    }
    let in_proc = {
        let frame = &interp.frames[interp.active_level()];
        frame.invocation.is_some() && !frame.ns_frame
    };
    if !in_proc {
        return interp.error("tailcall can only be called from a proc or lambda");
    }
    interp.tailcall = Some(argv[1..].to_vec());
    interp.opts.code = Code::Ok;
    interp.opts.level = 1;
    interp.reset_result();
    Code::Return
}
