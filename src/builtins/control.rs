//! Control-Flow Builtins
//!
//! `if`, `while`, `for`, `foreach`, `lmap`, `switch`, `break`, and
//! `continue`. The loop commands consume the loop codes: a `BREAK`
//! from a body ends the loop with an empty OK result, a `CONTINUE`
//! moves to the next iteration, anything else propagates to the
//! caller.

use crate::interp::expr::eval_expr_bool;
use crate::interp::{Code, Interp};
use crate::util::glob_match;
use crate::util::regex;
use crate::value::Value;

pub fn cmd_if(interp: &mut Interp, argv: &[Value]) -> Code {
    let mut i = 1;
    loop {
        if i >= argv.len() {
            return interp.error(format!(
                "wrong # args: no expression after \"{}\" argument",
                argv[0].as_str()
            ));
        }
        let cond_text = argv[i].as_str().to_string();
        i += 1;
        if i < argv.len() && argv[i].as_str() == "then" {
            i += 1;
        }
        if i >= argv.len() {
            return interp.error(format!(
                "wrong # args: no script following \"{}\" argument",
                cond_text
            ));
        }
        let body = argv[i].clone();
        i += 1;

        let taken = match eval_expr_bool(interp, &cond_text) {
            Ok(b) => b,
            Err(code) => return code,
        };
        if taken {
            return interp.eval_value(&body);
        }

        // No else clause: the missing branch yields an empty result.
        if i >= argv.len() {
            return interp.ok(Value::empty());
        }
        match argv[i].as_str() {
            "elseif" => {
                i += 1;
                continue;
            }
            "else" => {
                i += 1;
                if i != argv.len() - 1 {
                    return interp.error(
                        "wrong # args: extra words after \"else\" clause in \"if\" command",
                    );
                }
                let body = argv[i].clone();
                return interp.eval_value(&body);
            }
            _ => {
                // Bare else body.
                if i != argv.len() - 1 {
                    return interp.error(
                        "wrong # args: extra words after \"else\" clause in \"if\" command",
                    );
                }
                let body = argv[i].clone();
                return interp.eval_value(&body);
            }
        }
    }
}

pub fn cmd_while(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 3 {
        return interp.error("wrong # args: should be \"while test command\"");
    }
    let test = argv[1].as_str().to_string();
    let body = argv[2].clone();
    loop {
        match eval_expr_bool(interp, &test) {
            Ok(true) => {}
            Ok(false) => break,
            Err(code) => return code,
        }
        match interp.eval_value(&body) {
            Code::Ok | Code::Continue => {}
            Code::Break => break,
            other => return other,
        }
    }
    interp.ok(Value::empty())
}

pub fn cmd_for(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 5 {
        return interp.error("wrong # args: should be \"for start test next command\"");
    }
    let test = argv[2].as_str().to_string();
    match interp.eval_value(&argv[1].clone()) {
        Code::Ok => {}
        other => return other,
    }
    let next = argv[3].clone();
    let body = argv[4].clone();
    loop {
        match eval_expr_bool(interp, &test) {
            Ok(true) => {}
            Ok(false) => break,
            Err(code) => return code,
        }
        match interp.eval_value(&body) {
            Code::Ok | Code::Continue => {}
            Code::Break => break,
            other => return other,
        }
        match interp.eval_value(&next) {
            Code::Ok => {}
            Code::Break => break,
            other => return other,
        }
    }
    interp.ok(Value::empty())
}

/// Shared driver for `foreach` and `lmap`. Iterates N parallel
/// varlist/list pairs; exhausted lists supply empty strings.
fn foreach_driver(interp: &mut Interp, argv: &[Value], collect: bool) -> Code {
    let name = argv[0].as_str().to_string();
    if argv.len() < 4 || argv.len() % 2 != 0 {
        return interp.error(format!(
            "wrong # args: should be \"{} varList list ?varList list ...? command\"",
            name
        ));
    }
    let body = argv[argv.len() - 1].clone();

    let mut pairs: Vec<(Vec<String>, std::rc::Rc<Vec<Value>>)> = Vec::new();
    let mut iterations = 0usize;
    for chunk in argv[1..argv.len() - 1].chunks(2) {
        let vars = match chunk[0].as_list() {
            Ok(items) => items.iter().map(|v| v.as_str().to_string()).collect::<Vec<_>>(),
            Err(e) => return interp.error(e),
        };
        if vars.is_empty() {
            return interp.error(format!("{} varlist is empty", name));
        }
        let list = match chunk[1].as_list() {
            Ok(items) => items,
            Err(e) => return interp.error(e),
        };
        iterations = iterations.max((list.len() + vars.len() - 1) / vars.len());
        pairs.push((vars, list));
    }

    let mut collected: Vec<Value> = Vec::new();
    for iter in 0..iterations {
        for (vars, list) in &pairs {
            for (k, var) in vars.iter().enumerate() {
                let idx = iter * vars.len() + k;
                let value = list.get(idx).cloned().unwrap_or_else(Value::empty);
                if let Err(e) = interp.var_set(var, value) {
                    return interp.error(e);
                }
            }
        }
        match interp.eval_value(&body) {
            Code::Ok => {
                if collect {
                    collected.push(interp.result());
                }
            }
            Code::Continue => {}
            Code::Break => break,
            other => return other,
        }
    }
    if collect {
        interp.ok(Value::list(collected))
    } else {
        interp.ok(Value::empty())
    }
}

pub fn cmd_foreach(interp: &mut Interp, argv: &[Value]) -> Code {
    foreach_driver(interp, argv, false)
}

pub fn cmd_lmap(interp: &mut Interp, argv: &[Value]) -> Code {
    foreach_driver(interp, argv, true)
}

pub fn cmd_switch(interp: &mut Interp, argv: &[Value]) -> Code {
    #[derive(Clone, Copy, PartialEq)]
    enum Mode {
        Exact,
        Glob,
        Regexp,
    }
    let mut mode = Mode::Exact;
    let mut nocase = false;
    let mut matchvar: Option<String> = None;
    let mut indexvar: Option<String> = None;

    let mut i = 1;
    while i < argv.len() {
        let word = argv[i].as_str();
        if !word.starts_with('-') {
            break;
        }
        match word {
            "-exact" => mode = Mode::Exact,
            "-glob" => mode = Mode::Glob,
            "-regexp" => mode = Mode::Regexp,
            "-nocase" => nocase = true,
            "-matchvar" => {
                i += 1;
                match argv.get(i) {
                    Some(v) => matchvar = Some(v.as_str().to_string()),
                    None => {
                        return interp.error("missing variable name argument to -matchvar option")
                    }
                }
            }
            "-indexvar" => {
                i += 1;
                match argv.get(i) {
                    Some(v) => indexvar = Some(v.as_str().to_string()),
                    None => {
                        return interp.error("missing variable name argument to -indexvar option")
                    }
                }
            }
            "--" => {
                i += 1;
                break;
            }
            other => {
                return interp.error(format!(
                    "bad option \"{}\": must be -exact, -glob, -indexvar, -matchvar, -nocase, -regexp, or --",
                    other
                ))
            }
        }
        i += 1;
    }
    if (matchvar.is_some() || indexvar.is_some()) && mode != Mode::Regexp {
        return interp.error(format!(
            "{} option requires -regexp option",
            if matchvar.is_some() { "-matchvar" } else { "-indexvar" }
        ));
    }
    if i >= argv.len() {
        return interp.error(
            "wrong # args: should be \"switch ?-option ...? string ?pattern body ...?\"",
        );
    }
    let subject = argv[i].as_str().to_string();
    i += 1;

    // Pattern/body pairs, either inline or as one braced list.
    let pairs: Vec<Value> = if argv.len() - i == 1 {
        match argv[i].as_list() {
            Ok(items) => items.iter().cloned().collect(),
            Err(e) => return interp.error(e),
        }
    } else {
        argv[i..].to_vec()
    };
    if pairs.is_empty() || pairs.len() % 2 != 0 {
        return interp.error("extra switch pattern with no body");
    }

    let fold = |s: &str| if nocase { s.to_lowercase() } else { s.to_string() };
    let mut chosen: Option<usize> = None;
    for (n, pair) in pairs.chunks(2).enumerate() {
        let pattern = pair[0].as_str();
        let is_last = (n + 1) * 2 == pairs.len();
        if pattern == "default" {
            if !is_last {
                return interp.error("the \"default\" clause must be the last one");
            }
            chosen = Some(n);
            break;
        }
        let hit = match mode {
            Mode::Exact => fold(pattern) == fold(&subject),
            Mode::Glob => glob_match(pattern, &subject, nocase),
            Mode::Regexp => match regex::match_captures(pattern, &subject, nocase) {
                Ok(Some(caps)) => {
                    if let Some(var) = &matchvar {
                        let items: Vec<Value> =
                            caps.iter().map(|(s, _)| Value::string(s.clone())).collect();
                        if let Err(e) = interp.var_set(var, Value::list(items)) {
                            return interp.error(e);
                        }
                    }
                    if let Some(var) = &indexvar {
                        let items: Vec<Value> = caps
                            .iter()
                            .map(|(_, (a, b))| {
                                Value::list(vec![Value::int(*a), Value::int(*b)])
                            })
                            .collect();
                        if let Err(e) = interp.var_set(var, Value::list(items)) {
                            return interp.error(e);
                        }
                    }
                    true
                }
                Ok(None) => false,
                Err(e) => return interp.error(e),
            },
        };
        if hit {
            chosen = Some(n);
            break;
        }
    }

    let Some(mut body_idx) = chosen else {
        return interp.ok(Value::empty());
    };
    // A body of `-` falls through to the next pattern's body.
    while pairs[body_idx * 2 + 1].as_str() == "-" {
        body_idx += 1;
        if body_idx * 2 + 1 >= pairs.len() {
            return interp.error(format!(
                "no body specified for pattern \"{}\"",
                pairs[(body_idx - 1) * 2].as_str()
            ));
        }
    }
    let body = pairs[body_idx * 2 + 1].clone();
    interp.eval_value(&body)
}

pub fn cmd_break(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 1 {
        return interp.error("wrong # args: should be \"break\"");
    }
    interp.reset_result();
    Code::Break
}

pub fn cmd_continue(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 1 {
        return interp.error("wrong # args: should be \"continue\"");
    }
    interp.reset_result();
    Code::Continue
}
