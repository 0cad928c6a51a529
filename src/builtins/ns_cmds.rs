//! Namespace Builtin
//!
//! The `namespace` ensemble: evaluation inside a namespace, tree
//! introspection, deletion, export patterns, and name resolution
//! helpers (`qualifiers`, `tail`, `which`).

use crate::interp::frame::Frame;
use crate::interp::resolver::{normalize_ns, qualify, split_qualified};
use crate::interp::{Code, Interp};
use crate::util::glob_match;
use crate::value::Value;

/// Resolve a namespace spec against the current namespace: absolute
/// paths stand, relative ones append.
fn resolve_ns_spec(interp: &Interp, spec: &str) -> String {
    if spec.starts_with("::") {
        return normalize_ns(spec);
    }
    let current = interp.current_ns();
    let mut combined = current;
    for seg in spec.split("::").filter(|s| !s.is_empty()) {
        combined = qualify(&combined, seg);
    }
    normalize_ns(&combined)
}

pub fn cmd_namespace(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.error("wrong # args: should be \"namespace subcommand ?arg ...?\"");
    }
    let sub = argv[1].as_str().to_string();
    match sub.as_str() {
        "current" => {
            if argv.len() != 2 {
                return interp.error("wrong # args: should be \"namespace current\"");
            }
            let ns = interp.current_ns();
            interp.ok(Value::string(ns))
        }
        "eval" => {
            if argv.len() < 4 {
                return interp.error(
                    "wrong # args: should be \"namespace eval name arg ?arg ...?\"",
                );
            }
            let path = resolve_ns_spec(interp, argv[2].as_str());
            interp.root.make(&path);
            let script = if argv.len() == 4 {
                argv[3].as_str().to_string()
            } else {
                super::eval_cmds::concat_args(&argv[3..])
            };
            let frame = Frame::new(path, true);
            if let Err(e) = interp.push_frame(frame) {
                return interp.error(e);
            }
            let code = interp.eval(&script);
            interp.pop_frame();
            code
        }
        "exists" => {
            if argv.len() != 3 {
                return interp.error("wrong # args: should be \"namespace exists name\"");
            }
            let path = resolve_ns_spec(interp, argv[2].as_str());
            let found = interp.root.find(&path).is_some();
            interp.ok(Value::boolean(found))
        }
        "delete" => {
            for spec in &argv[2..] {
                let path = resolve_ns_spec(interp, spec.as_str());
                if path == "::" {
                    return interp.error("can't remove namespace ::");
                }
                if !interp.root.remove(&path) {
                    return interp.error(format!(
                        "unknown namespace \"{}\" in namespace delete command",
                        spec.as_str()
                    ));
                }
            }
            interp.ok(Value::empty())
        }
        "parent" => {
            let path = match argv.get(2) {
                Some(spec) => resolve_ns_spec(interp, spec.as_str()),
                None => interp.current_ns(),
            };
            if path == "::" {
                return interp.ok(Value::empty());
            }
            let parent = split_qualified(&path)
                .map(|(ns, _)| ns)
                .unwrap_or_else(|| "::".to_string());
            interp.ok(Value::string(parent))
        }
        "children" => {
            let path = match argv.get(2) {
                Some(spec) => resolve_ns_spec(interp, spec.as_str()),
                None => interp.current_ns(),
            };
            let pattern = argv.get(3).map(|v| v.as_str().to_string());
            let Some(node) = interp.root.find(&path) else {
                return interp.error(format!("namespace \"{}\" not found", path));
            };
            let mut out = Vec::new();
            for child in node.children.values() {
                let keep = match &pattern {
                    None => true,
                    Some(p) if p.contains("::") => glob_match(p, &child.path, false),
                    Some(p) => {
                        let tail = child.path.rsplit("::").next().unwrap_or("");
                        glob_match(p, tail, false)
                    }
                };
                if keep {
                    out.push(Value::string(child.path.clone()));
                }
            }
            interp.ok(Value::list(out))
        }
        "qualifiers" => {
            if argv.len() != 3 {
                return interp.error("wrong # args: should be \"namespace qualifiers string\"");
            }
            let name = argv[2].as_str();
            let out = match name.rfind("::") {
                Some(idx) => &name[..idx],
                None => "",
            };
            interp.ok(Value::string(out))
        }
        "tail" => {
            if argv.len() != 3 {
                return interp.error("wrong # args: should be \"namespace tail string\"");
            }
            let name = argv[2].as_str();
            let out = match name.rfind("::") {
                Some(idx) => &name[idx + 2..],
                None => name,
            };
            interp.ok(Value::string(out))
        }
        "export" => {
            let mut i = 2;
            let mut clear = false;
            if argv.get(i).map_or(false, |v| v.as_str() == "-clear") {
                clear = true;
                i += 1;
            }
            let current = interp.current_ns();
            let node = interp.root.make(&current);
            if clear {
                node.exports.clear();
            }
            if i == argv.len() && !clear {
                let patterns: Vec<Value> =
                    node.exports.iter().map(|p| Value::string(p.clone())).collect();
                return interp.ok(Value::list(patterns));
            }
            for p in &argv[i..] {
                node.exports.push(p.as_str().to_string());
            }
            interp.ok(Value::empty())
        }
        "which" => {
            let mut i = 2;
            let mut kind = "-command";
            if let Some(first) = argv.get(i) {
                if first.as_str().starts_with('-') {
                    kind = match first.as_str() {
                        "-command" => "-command",
                        "-variable" => "-variable",
                        other => {
                            return interp.error(format!(
                                "invalid option \"{}\": should be -command or -variable",
                                other
                            ))
                        }
                    };
                    i += 1;
                }
            }
            if argv.len() - i != 1 {
                return interp.error(
                    "wrong # args: should be \"namespace which ?-command? ?-variable? name\"",
                );
            }
            let name = argv[i].as_str().to_string();
            let out = if kind == "-command" {
                interp
                    .find_command(&name)
                    .map(|e| e.name)
                    .unwrap_or_default()
            } else {
                which_variable(interp, &name)
            };
            interp.ok(Value::string(out))
        }
        other => interp.error(format!(
            "unknown or ambiguous subcommand \"{}\": must be children, current, delete, eval, exists, export, parent, qualifiers, tail, or which",
            other
        )),
    }
}

fn which_variable(interp: &Interp, name: &str) -> String {
    if let Some((ns, tail)) = split_qualified(name) {
        if interp
            .root
            .find(&ns)
            .map_or(false, |n| n.vars.contains_key(&tail))
        {
            return qualify(&ns, &tail);
        }
        return String::new();
    }
    let current = interp.current_ns();
    if interp
        .root
        .find(&current)
        .map_or(false, |n| n.vars.contains_key(name))
    {
        return qualify(&current, name);
    }
    if interp.root.vars.contains_key(name) {
        return qualify("::", name);
    }
    String::new()
}
