//! Procedure Invocation
//!
//! Binds a call's arguments against the parameter specification
//! (required names, `{name default}` pairs, a trailing `args` rest
//! parameter), pushes a frame in the procedure's defining namespace,
//! evaluates the body, and applies the return protocol: a `RETURN`
//! whose level reaches zero is consumed, handing back the code the
//! `return` command asked for; deeper levels keep unwinding.

use crate::interp::eval::{eval_script, exec_command};
use crate::interp::frame::{Frame, Var};
use crate::interp::interp::Interp;
use crate::interp::resolver::namespace_of;
use crate::interp::result::Code;
use crate::value::Value;

/// Invoke a procedure. `cmd_name` is the canonical name (its prefix is
/// the defining namespace); `argv[0]` is the name as called, used in
/// error messages.
pub fn invoke_proc(
    interp: &mut Interp,
    cmd_name: &str,
    params: &Value,
    body: &Value,
    argv: &[Value],
    lambda: Option<Value>,
) -> Code {
    let spec = match params.as_list() {
        Ok(spec) => spec,
        Err(e) => return interp.error(e),
    };

    let mut locals: Vec<(String, Value)> = Vec::with_capacity(spec.len());
    let args = &argv[1..];
    let mut consumed = 0usize;

    for (pi, param) in spec.iter().enumerate() {
        let fields = match param.as_list() {
            Ok(f) => f,
            Err(e) => return interp.error(e),
        };
        if fields.is_empty() {
            return interp.error(format!(
                "argument with no name in \"{}\"",
                params.as_str()
            ));
        }
        if fields.len() > 2 {
            return interp.error(format!(
                "too many fields in argument specifier \"{}\"",
                param.as_str()
            ));
        }
        let pname = fields[0].as_str();
        let last = pi == spec.len() - 1;

        if last && pname == "args" && fields.len() == 1 {
            locals.push(("args".to_string(), Value::list(args[consumed..].to_vec())));
            consumed = args.len();
        } else if consumed < args.len() {
            locals.push((pname.to_string(), args[consumed].clone()));
            consumed += 1;
        } else if fields.len() == 2 {
            locals.push((pname.to_string(), fields[1].clone()));
        } else {
            return wrong_num_args(interp, argv[0].as_str(), &spec);
        }
    }
    if consumed < args.len() {
        return wrong_num_args(interp, argv[0].as_str(), &spec);
    }

    let mut frame = Frame::new(namespace_of(cmd_name), false);
    frame.invocation = Some(Value::list(argv.to_vec()));
    frame.lambda = lambda;
    for (name, value) in locals {
        frame.vars.insert(name, Var::Scalar(value));
    }
    if let Err(e) = interp.push_frame(frame) {
        return interp.error(e);
    }

    let body_text = body.as_str().to_string();
    let code = eval_script(interp, &body_text);
    let code = match code {
        Code::Return => {
            interp.opts.level -= 1;
            if interp.opts.level <= 0 {
                interp.opts.level = 0;
                let effective = interp.opts.code;
                interp.opts.code = Code::Ok;
                if effective == Code::Error && interp.opts.errorinfo.is_none() {
                    interp.opts.errorinfo = Some(interp.result());
                }
                effective
            } else {
                Code::Return
            }
        }
        Code::Break => interp.error("invoked \"break\" outside of a loop"),
        Code::Continue => interp.error("invoked \"continue\" outside of a loop"),
        other => other,
    };
    interp.pop_frame();

    if code == Code::Ok {
        if let Some(call) = interp.tailcall.take() {
            return exec_command(interp, &call);
        }
    } else {
        interp.tailcall = None;
    }
    code
}

/// The `wrong # args: should be "..."` surface, decorated the way the
/// parameter spec reads: optionals in question marks, a rest parameter
/// as `?arg ...?`.
pub fn wrong_num_args(interp: &mut Interp, name: &str, spec: &[Value]) -> Code {
    let mut usage = String::from(name);
    for (pi, param) in spec.iter().enumerate() {
        let fields = param.as_list().unwrap_or_default();
        let pname = fields
            .first()
            .map(|f| f.as_str().to_string())
            .unwrap_or_else(|| param.as_str().to_string());
        usage.push(' ');
        let last = pi == spec.len() - 1;
        if last && pname == "args" && fields.len() <= 1 {
            usage.push_str("?arg ...?");
        } else if fields.len() == 2 {
            usage.push('?');
            usage.push_str(&pname);
            usage.push('?');
        } else {
            usage.push_str(&pname);
        }
    }
    interp.error(format!("wrong # args: should be \"{}\"", usage))
}
