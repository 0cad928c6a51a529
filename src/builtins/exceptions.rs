//! Exception Builtins
//!
//! `error`, `throw`, `catch`, `return`, and `try`. Together with the
//! evaluator's code propagation these implement the language's whole
//! exception story: errors are just a result code plus the
//! return-options dictionary traveling beside the result slot.

use crate::interp::result::ReturnOptions;
use crate::interp::{Code, Interp};
use crate::value::Value;

pub fn cmd_error(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 || argv.len() > 4 {
        return interp.error("wrong # args: should be \"error message ?errorCode? ?errorInfo?\"");
    }
    let code = interp.error(argv[1].as_str().to_string());
    if let Some(ec) = argv.get(2) {
        if !ec.is_empty() {
            interp.opts.errorcode = Some(ec.clone());
        }
    }
    if let Some(info) = argv.get(3) {
        if !info.is_empty() {
            interp.opts.errorinfo = Some(info.clone());
            interp.errorinfo_pending = true;
        }
    }
    code
}

pub fn cmd_throw(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 3 {
        return interp.error("wrong # args: should be \"throw type message\"");
    }
    let ty = argv[1].clone();
    interp.error_with_code(argv[2].as_str().to_string(), ty)
}

pub fn cmd_catch(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 || argv.len() > 4 {
        return interp
            .error("wrong # args: should be \"catch script ?resultVarName? ?optionVarName?\"");
    }
    let code = interp.eval_value(&argv[1].clone());
    let result = interp.result();
    let options = interp.return_options(code);

    if let Some(var) = argv.get(2) {
        if let Err(e) = interp.var_set(var.as_str(), result) {
            return interp.error(format!(
                "couldn't save command result in variable: {}",
                e
            ));
        }
    }
    if let Some(var) = argv.get(3) {
        if let Err(e) = interp.var_set(var.as_str(), options) {
            return interp.error(format!(
                "couldn't store return options in variable: {}",
                e
            ));
        }
    }
    interp.ok(Value::int(code.to_int()))
}

pub fn cmd_return(interp: &mut Interp, argv: &[Value]) -> Code {
    let mut code = Code::Ok;
    let mut level: i64 = 1;
    let mut errorcode: Option<Value> = None;
    let mut errorinfo: Option<Value> = None;
    let mut extra: Vec<(String, Value)> = Vec::new();

    let mut i = 1;
    while i + 1 < argv.len() {
        let key = argv[i].as_str();
        if !key.starts_with('-') {
            break;
        }
        let value = &argv[i + 1];
        match key {
            "-code" => match Code::from_spec(value.as_str()) {
                Ok(c) => code = c,
                Err(e) => return interp.error(e),
            },
            "-level" => match value.as_int() {
                Ok(l) if l >= 0 => level = l,
                _ => {
                    return interp.error(format!(
                        "bad -level value: expected non-negative integer but got \"{}\"",
                        value.as_str()
                    ))
                }
            },
            "-errorcode" => errorcode = Some(value.clone()),
            "-errorinfo" => errorinfo = Some(value.clone()),
            _ => extra.push((key.to_string(), value.clone())),
        }
        i += 2;
    }

    let result = match argv.len() - i {
        0 => Value::empty(),
        1 => argv[i].clone(),
        _ => {
            return interp.error(
                "wrong # args: should be \"return ?-option value ...? ?result?\"",
            )
        }
    };

    interp.opts.code = code;
    interp.opts.level = level.max(1);
    interp.opts.errorcode = errorcode;
    if let Some(info) = errorinfo {
        interp.opts.errorinfo = Some(info);
        interp.errorinfo_pending = true;
    }
    interp.opts.extra = extra;
    interp.set_result(result);
    Code::Return
}

/// One parsed `try` handler.
struct Handler {
    /// `None` matches on error-code prefix (`trap`), `Some` on a
    /// completion code (`on`).
    on_code: Option<Code>,
    trap_prefix: Vec<String>,
    result_var: Option<String>,
    opts_var: Option<String>,
    script: Value,
}

pub fn cmd_try(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.error(
            "wrong # args: should be \"try body ?handler ...? ?finally script?\"",
        );
    }
    let body = argv[1].clone();

    let mut handlers: Vec<Handler> = Vec::new();
    let mut finally: Option<Value> = None;
    let mut i = 2;
    while i < argv.len() {
        match argv[i].as_str() {
            "on" => {
                if i + 3 >= argv.len() {
                    return interp.error(
                        "wrong # args to on clause: must be \"... on code variableList script\"",
                    );
                }
                let on_code = match Code::from_spec(argv[i + 1].as_str()) {
                    Ok(c) => c,
                    Err(e) => return interp.error(e),
                };
                match parse_varspec(interp, &argv[i + 2]) {
                    Ok((rv, ov)) => handlers.push(Handler {
                        on_code: Some(on_code),
                        trap_prefix: Vec::new(),
                        result_var: rv,
                        opts_var: ov,
                        script: argv[i + 3].clone(),
                    }),
                    Err(code) => return code,
                }
                i += 4;
            }
            "trap" => {
                if i + 3 >= argv.len() {
                    return interp.error(
                        "wrong # args to trap clause: must be \"... trap pattern variableList script\"",
                    );
                }
                let prefix = match argv[i + 1].as_list() {
                    Ok(items) => items.iter().map(|v| v.as_str().to_string()).collect(),
                    Err(e) => return interp.error(e),
                };
                match parse_varspec(interp, &argv[i + 2]) {
                    Ok((rv, ov)) => handlers.push(Handler {
                        on_code: None,
                        trap_prefix: prefix,
                        result_var: rv,
                        opts_var: ov,
                        script: argv[i + 3].clone(),
                    }),
                    Err(code) => return code,
                }
                i += 4;
            }
            "finally" => {
                if i + 1 >= argv.len() || i + 2 != argv.len() {
                    return interp.error(
                        "wrong # args to finally clause: must be \"... finally script\"",
                    );
                }
                finally = Some(argv[i + 1].clone());
                i += 2;
            }
            other => {
                return interp.error(format!(
                    "bad handler \"{}\": must be \"on code variableList script\", \"trap pattern variableList script\", or \"finally script\"",
                    other
                ))
            }
        }
    }
    if handlers
        .last()
        .map_or(false, |h| h.script.as_str() == "-")
    {
        return interp.error("last non-finally clause must not have a body of \"-\"");
    }

    // Evaluate the body; a RETURN unwinds one level here, and reaching
    // level zero substitutes the code the `return` asked for.
    let body_code = interp.eval_value(&body);
    let mut effective = body_code;
    if body_code == Code::Return {
        interp.opts.level -= 1;
        if interp.opts.level <= 0 {
            interp.opts.level = 0;
            effective = interp.opts.code;
        }
    }
    let body_result = interp.result();
    let body_opts_dict = interp.return_options(effective);
    let saved_opts: ReturnOptions = interp.opts.clone();

    // First matching handler decides; a `-` script falls through to the
    // next handler while keeping this handler's variable bindings.
    let mut outcome_code = effective;
    let mut outcome_result = body_result.clone();
    let mut restore_opts = true;

    let matched = handlers.iter().position(|h| handler_matches(h, effective, &saved_opts));
    if let Some(first) = matched {
        let (rv, ov) = (
            handlers[first].result_var.clone(),
            handlers[first].opts_var.clone(),
        );
        if let Some(var) = rv {
            if let Err(e) = interp.var_set(&var, body_result.clone()) {
                return interp.error(e);
            }
        }
        if let Some(var) = ov {
            if let Err(e) = interp.var_set(&var, body_opts_dict.clone()) {
                return interp.error(e);
            }
        }
        // Walk past `-` bodies to the script that actually runs.
        let mut run = first;
        while handlers[run].script.as_str() == "-" {
            run += 1;
        }
        let script = handlers[run].script.clone();
        outcome_code = interp.eval_value(&script);
        outcome_result = interp.result();
        restore_opts = false;
    }

    if let Some(fin) = finally {
        let fin_code = interp.eval_value(&fin);
        if fin_code != Code::Ok {
            // A non-OK finally supersedes everything before it.
            return fin_code;
        }
    }

    if restore_opts && effective != Code::Ok {
        // Re-raise the body's outcome with its options intact.
        interp.opts = saved_opts;
        if effective == Code::Error {
            interp.errorinfo_pending = true;
        }
    }
    interp.set_result(outcome_result);
    outcome_code
}

fn handler_matches(h: &Handler, effective: Code, opts: &ReturnOptions) -> bool {
    match h.on_code {
        Some(code) => code == effective,
        None => {
            if effective != Code::Error {
                return false;
            }
            let errorcode = opts
                .errorcode
                .clone()
                .unwrap_or_else(|| Value::string("NONE"));
            let parts: Vec<String> = match errorcode.as_list() {
                Ok(items) => items.iter().map(|v| v.as_str().to_string()).collect(),
                Err(_) => vec![errorcode.as_str().to_string()],
            };
            h.trap_prefix.len() <= parts.len()
                && h.trap_prefix.iter().zip(parts.iter()).all(|(a, b)| a == b)
        }
    }
}

/// A handler's `variableList`: up to two names, for the result and the
/// options dictionary.
fn parse_varspec(
    interp: &mut Interp,
    spec: &Value,
) -> Result<(Option<String>, Option<String>), Code> {
    let items = spec.as_list().map_err(|e| interp.error(e))?;
    if items.len() > 2 {
        return Err(interp.error(format!(
            "too many names in \"try\" handler variable list \"{}\"",
            spec.as_str()
        )));
    }
    Ok((
        items.first().map(|v| v.as_str().to_string()),
        items.get(1).map(|v| v.as_str().to_string()),
    ))
}
