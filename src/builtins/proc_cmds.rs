//! Procedure and Introspection Builtins
//!
//! `proc`, `rename`, and the `info` ensemble subset that reflects the
//! registry and the frame stack.

use crate::interp::registry::CommandKind;
use crate::interp::{Code, Interp};
use crate::util::glob_match;
use crate::value::Value;

pub fn cmd_proc(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 4 {
        return interp.error("wrong # args: should be \"proc name args body\"");
    }
    // Validate the parameter specification up front so a bad spec fails
    // at definition time, not first call.
    let spec = match argv[2].as_list() {
        Ok(spec) => spec,
        Err(e) => return interp.error(e),
    };
    for param in spec.iter() {
        match param.as_list() {
            Ok(fields) => {
                if fields.is_empty() {
                    return interp.error(format!(
                        "argument with no name in \"{}\"",
                        argv[2].as_str()
                    ));
                }
                if fields.len() > 2 {
                    return interp.error(format!(
                        "too many fields in argument specifier \"{}\"",
                        param.as_str()
                    ));
                }
            }
            Err(e) => return interp.error(e),
        }
    }
    match interp.define_proc(argv[1].as_str(), argv[2].clone(), argv[3].clone()) {
        Ok(_) => interp.ok(Value::empty()),
        Err(e) => interp.error(e),
    }
}

pub fn cmd_rename(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 3 {
        return interp.error("wrong # args: should be \"rename oldName newName\"");
    }
    match interp.rename_command(argv[1].as_str(), argv[2].as_str()) {
        Ok(()) => interp.ok(Value::empty()),
        Err(e) => interp.error(e),
    }
}

/// Find a proc entry by name or fail with the caller's message shape.
fn proc_parts(interp: &Interp, name: &str) -> Result<(Value, Value), String> {
    match interp.find_command(name) {
        Some(entry) => match entry.kind {
            CommandKind::Proc { params, body } => Ok((params, body)),
            CommandKind::Builtin(_) => Err(format!("\"{}\" isn't a procedure", name)),
        },
        None => Err(format!("\"{}\" isn't a procedure", name)),
    }
}

pub fn cmd_info(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.error("wrong # args: should be \"info subcommand ?arg ...?\"");
    }
    let sub = argv[1].as_str().to_string();
    match sub.as_str() {
        "exists" => {
            if argv.len() != 3 {
                return interp.error("wrong # args: should be \"info exists varName\"");
            }
            let found = interp.var_exists(argv[2].as_str());
            interp.ok(Value::boolean(found))
        }
        "commands" | "procs" => {
            if argv.len() > 3 {
                return interp.error(format!(
                    "wrong # args: should be \"info {} ?pattern?\"",
                    sub
                ));
            }
            let pattern = argv.get(2).map(|v| v.as_str().to_string());
            let mut names: Vec<String> = Vec::new();
            let mut push_from = |interp: &Interp, ns: &str| {
                if let Some(node) = interp.root.find(ns) {
                    for (tail, entry) in &node.commands {
                        if sub == "procs" && !entry.is_proc() {
                            continue;
                        }
                        if !names.contains(tail) {
                            names.push(tail.clone());
                        }
                    }
                }
            };
            let current = interp.current_ns();
            push_from(interp, &current);
            if sub == "commands" && current != "::" {
                push_from(interp, "::");
            }
            let out: Vec<Value> = names
                .into_iter()
                .filter(|n| pattern.as_ref().map_or(true, |p| glob_match(p, n, false)))
                .map(Value::string)
                .collect();
            interp.ok(Value::list(out))
        }
        "body" | "args" => {
            if argv.len() != 3 {
                return interp.error(format!(
                    "wrong # args: should be \"info {} procname\"",
                    sub
                ));
            }
            match proc_parts(interp, argv[2].as_str()) {
                Ok((params, body)) => {
                    if sub == "body" {
                        interp.ok(body)
                    } else {
                        // Parameter names without their defaults.
                        let spec = match params.as_list() {
                            Ok(s) => s,
                            Err(e) => return interp.error(e),
                        };
                        let mut names = Vec::with_capacity(spec.len());
                        for p in spec.iter() {
                            let fields = match p.as_list() {
                                Ok(f) => f,
                                Err(e) => return interp.error(e),
                            };
                            names.push(
                                fields.first().cloned().unwrap_or_else(Value::empty),
                            );
                        }
                        interp.ok(Value::list(names))
                    }
                }
                Err(e) => interp.error(e),
            }
        }
        "default" => {
            if argv.len() != 5 {
                return interp
                    .error("wrong # args: should be \"info default procname arg varname\"");
            }
            let (params, _) = match proc_parts(interp, argv[2].as_str()) {
                Ok(parts) => parts,
                Err(e) => return interp.error(e),
            };
            let spec = match params.as_list() {
                Ok(s) => s,
                Err(e) => return interp.error(e),
            };
            let wanted = argv[3].as_str();
            for p in spec.iter() {
                let fields = match p.as_list() {
                    Ok(f) => f,
                    Err(e) => return interp.error(e),
                };
                if fields.first().map(|f| f.as_str()) == Some(wanted) {
                    let (has_default, value) = match fields.get(1) {
                        Some(d) => (true, d.clone()),
                        None => (false, Value::empty()),
                    };
                    if let Err(e) = interp.var_set(argv[4].as_str(), value) {
                        return interp.error(e);
                    }
                    return interp.ok(Value::boolean(has_default));
                }
            }
            interp.error(format!(
                "procedure \"{}\" doesn't have an argument \"{}\"",
                argv[2].as_str(),
                wanted
            ))
        }
        "level" => match argv.len() {
            2 => {
                let level = interp.active_level();
                interp.ok(Value::int(level as i64))
            }
            3 => {
                let n = match argv[2].as_int() {
                    Ok(n) => n,
                    Err(e) => return interp.error(e),
                };
                let idx = if n > 0 { n } else { interp.active_level() as i64 + n };
                let bad = || format!("bad level \"{}\"", n);
                if idx < 0 || idx as usize >= interp.frame_count() {
                    return interp.error(bad());
                }
                match interp.frames[idx as usize].invocation.clone() {
                    Some(inv) => interp.ok(inv),
                    None => interp.error(bad()),
                }
            }
            _ => interp.error("wrong # args: should be \"info level ?number?\""),
        },
        "vars" | "locals" | "globals" => {
            if argv.len() > 3 {
                return interp.error(format!(
                    "wrong # args: should be \"info {} ?pattern?\"",
                    sub
                ));
            }
            let pattern = argv.get(2).map(|v| v.as_str().to_string());
            let names: Vec<String> = match sub.as_str() {
                "globals" => interp
                    .root
                    .vars
                    .iter()
                    .filter(|(_, v)| v.is_some())
                    .map(|(k, _)| k.clone())
                    .collect(),
                "locals" => {
                    let frame = &interp.frames[interp.active_level()];
                    if frame.ns_frame {
                        Vec::new()
                    } else {
                        frame.vars.keys().cloned().collect()
                    }
                }
                _ => interp.frame_var_names(interp.active_level()),
            };
            let out: Vec<Value> = names
                .into_iter()
                .filter(|n| pattern.as_ref().map_or(true, |p| glob_match(p, n, false)))
                .map(Value::string)
                .collect();
            interp.ok(Value::list(out))
        }
        other => interp.error(format!(
            "unknown or ambiguous subcommand \"{}\": must be args, body, commands, default, exists, globals, level, locals, procs, or vars",
            other
        )),
    }
}
