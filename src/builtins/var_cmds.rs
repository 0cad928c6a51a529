//! Variable Builtins
//!
//! `set`, `unset`, `incr`, `append`, and the link-installing commands
//! `upvar`, `global`, and `variable`. Links are how a frame reaches
//! variables that live elsewhere: another frame for `upvar`, a
//! namespace's persistent table for `global` and `variable`.

use crate::interp::resolver::{normalize_ns, split_qualified, tail_of};
use crate::interp::{Code, Interp};
use crate::value::Value;

pub fn cmd_set(interp: &mut Interp, argv: &[Value]) -> Code {
    match argv.len() {
        2 => match interp.var_get(argv[1].as_str()) {
            Ok(v) => interp.ok(v),
            Err(e) => interp.error(e),
        },
        3 => {
            let value = argv[2].clone();
            match interp.var_set(argv[1].as_str(), value.clone()) {
                Ok(()) => interp.ok(value),
                Err(e) => interp.error(e),
            }
        }
        _ => interp.error("wrong # args: should be \"set varName ?newValue?\""),
    }
}

pub fn cmd_unset(interp: &mut Interp, argv: &[Value]) -> Code {
    let mut i = 1;
    let mut complain = true;
    while i < argv.len() {
        match argv[i].as_str() {
            "-nocomplain" => {
                complain = false;
                i += 1;
            }
            "--" => {
                i += 1;
                break;
            }
            _ => break,
        }
    }
    while i < argv.len() {
        if let Err(e) = interp.var_unset(argv[i].as_str()) {
            if complain {
                return interp.error(e);
            }
        }
        i += 1;
    }
    interp.ok(Value::empty())
}

pub fn cmd_incr(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 || argv.len() > 3 {
        return interp.error("wrong # args: should be \"incr varName ?increment?\"");
    }
    let name = argv[1].as_str().to_string();
    let step = match argv.get(2) {
        Some(v) => match v.as_int() {
            Ok(i) => i,
            Err(e) => return interp.error(e),
        },
        None => 1,
    };
    // An unset variable starts from zero.
    let current = match interp.var_get(&name) {
        Ok(v) => match v.as_int() {
            Ok(i) => i,
            Err(e) => return interp.error(e),
        },
        Err(_) => 0,
    };
    let next = Value::int(current.wrapping_add(step));
    match interp.var_set(&name, next.clone()) {
        Ok(()) => interp.ok(next),
        Err(e) => interp.error(e),
    }
}

pub fn cmd_append(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.error("wrong # args: should be \"append varName ?value ...?\"");
    }
    let name = argv[1].as_str().to_string();
    let mut text = interp
        .var_get(&name)
        .map(|v| v.as_str().to_string())
        .unwrap_or_default();
    for v in &argv[2..] {
        text.push_str(v.as_str());
    }
    let value = Value::string(text);
    match interp.var_set(&name, value.clone()) {
        Ok(()) => interp.ok(value),
        Err(e) => interp.error(e),
    }
}

pub fn cmd_upvar(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 3 {
        return interp
            .error("wrong # args: should be \"upvar ?level? otherVar localVar ?otherVar localVar ...?\"");
    }
    // The first argument is a level iff consuming it leaves an even
    // number of remaining arguments.
    let rest = argv.len() - 1;
    let (target, pairs) = if (rest - 1) % 2 == 0 && rest - 1 >= 2 {
        match interp.parse_level(argv[1].as_str()) {
            Ok(t) => (t, &argv[2..]),
            Err(e) => return interp.error(e),
        }
    } else {
        if rest % 2 != 0 {
            return interp.error(
                "wrong # args: should be \"upvar ?level? otherVar localVar ?otherVar localVar ...?\"",
            );
        }
        match interp.active_level().checked_sub(1) {
            Some(t) => (t, &argv[1..]),
            None => return interp.error("bad level \"1\""),
        }
    };
    for pair in pairs.chunks(2) {
        let src = pair[0].as_str();
        let dst = pair[1].as_str();
        let outcome = match split_qualified(src) {
            Some((ns, tail)) => interp.link_ns_var(dst, &ns, &tail),
            None => interp.link_frame_var(dst, target, src),
        };
        if let Err(e) = outcome {
            return interp.error(e);
        }
    }
    interp.ok(Value::empty())
}

pub fn cmd_global(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.error("wrong # args: should be \"global varName ?varName ...?\"");
    }
    for name in &argv[1..] {
        let name = name.as_str();
        let (ns, tail) = match split_qualified(name) {
            Some((ns, tail)) => (ns, tail),
            None => ("::".to_string(), name.to_string()),
        };
        if let Err(e) = interp.link_ns_var(&tail, &ns, &tail) {
            return interp.error(e);
        }
    }
    interp.ok(Value::empty())
}

pub fn cmd_variable(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.error("wrong # args: should be \"variable ?name value...? name ?value?\"");
    }
    let mut i = 1;
    while i < argv.len() {
        let name = argv[i].as_str().to_string();
        let value = argv.get(i + 1).cloned();
        i += 2;

        let (ns, tail) = match split_qualified(&name) {
            Some((ns, tail)) => (ns, tail),
            None => (normalize_ns(&interp.current_ns()), name.clone()),
        };
        if tail.is_empty() {
            return interp.error(format!("can't define \"{}\": no variable name", name));
        }
        {
            let node = interp.root.make(&ns);
            let slot = node.vars.entry(tail.clone()).or_insert(None);
            // A given value initializes only a variable that does not
            // exist yet.
            if slot.is_none() {
                if let Some(v) = value {
                    *slot = Some(v);
                }
            }
        }
        if let Err(e) = interp.link_ns_var(tail_of(&name), &ns, &tail) {
            return interp.error(e);
        }
    }
    interp.ok(Value::empty())
}

#[cfg(test)]
mod tests {
    use crate::interp::{Code, Interp};

    fn run(script: &str) -> String {
        let mut interp = Interp::new();
        interp.eval(script);
        interp.result().as_str().to_string()
    }

    #[test]
    fn test_set_read_write() {
        assert_eq!(run("set x 5"), "5");
        assert_eq!(run("set x 5; set x"), "5");
        assert_eq!(
            run("catch {set nope} msg; set msg"),
            "can't read \"nope\": no such variable"
        );
    }

    #[test]
    fn test_unset() {
        assert_eq!(run("set x 1; unset x; info exists x"), "0");
        assert_eq!(
            run("catch {unset nope} msg; set msg"),
            "can't unset \"nope\": no such variable"
        );
        assert_eq!(run("unset -nocomplain nope; concat done"), "done");
    }

    #[test]
    fn test_incr() {
        assert_eq!(run("set n 5; incr n"), "6");
        assert_eq!(run("set n 5; incr n -2"), "3");
        assert_eq!(run("incr fresh; set fresh"), "1");
        assert_eq!(run("set s abc; catch {incr s}"), "1");
    }

    #[test]
    fn test_append() {
        assert_eq!(run("set s ab; append s cd ef"), "abcdef");
        assert_eq!(run("append fresh x; set fresh"), "x");
    }

    #[test]
    fn test_upvar_level_detection() {
        let mut interp = Interp::new();
        let code = interp.eval(
            "proc f {} { upvar 1 a b; set b 2 }; set a 1; f; set a",
        );
        assert_eq!(code, Code::Ok);
        assert_eq!(interp.result().as_str(), "2");

        // Without a level word the pair binds one frame up.
        let code = interp.eval(
            "proc g {} { upvar c d; set d 9 }; set c 0; g; set c",
        );
        assert_eq!(code, Code::Ok);
        assert_eq!(interp.result().as_str(), "9");
    }

    #[test]
    fn test_upvar_qualified_source() {
        assert_eq!(
            run("set ::g 1; proc f {} { upvar ::g h; incr h }; f; set ::g"),
            "2"
        );
    }

    #[test]
    fn test_variable_initializes_once() {
        assert_eq!(
            run("namespace eval ::c { variable n 1 }; \
                 namespace eval ::c { variable n 99 }; set ::c::n"),
            "1"
        );
    }
}
