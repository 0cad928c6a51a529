//! Dictionary Builtin
//!
//! The `dict` ensemble over the ordered-mapping view of values. Keys
//! are strings compared by bytes; iteration order is insertion order.

use std::rc::Rc;

use crate::interp::{Code, Interp};
use crate::util::glob_match;
use crate::value::{Dict, Value};

fn dict_of(interp: &mut Interp, v: &Value) -> Result<Rc<Dict>, Code> {
    v.as_dict().map_err(|e| interp.error(e))
}

/// Follow a key path through nested dictionaries.
fn dig(interp: &mut Interp, base: &Value, path: &[Value]) -> Result<Value, Code> {
    let mut current = base.clone();
    for key in path {
        let map = dict_of(interp, &current)?;
        match map.get(key.as_str()) {
            Some(v) => current = v.clone(),
            None => {
                return Err(interp.error(format!(
                    "key \"{}\" not known in dictionary",
                    key.as_str()
                )))
            }
        }
    }
    Ok(current)
}

/// Rebuild a dictionary with the value at a key path replaced. Missing
/// intermediate dictionaries are created.
fn put(base: &Value, path: &[Value], value: Value) -> Result<Value, String> {
    let map = base.as_dict()?;
    let mut map: Dict = (*map).clone();
    let key = path[0].as_str().to_string();
    if path.len() == 1 {
        map.insert(key, value);
    } else {
        let inner = map
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Value::dict(Dict::new()));
        map.insert(key, put(&inner, &path[1..], value)?);
    }
    Ok(Value::dict(map))
}

/// Rebuild with a key path removed. Intermediate keys must exist; a
/// missing final key is accepted unchanged.
fn remove(base: &Value, path: &[Value]) -> Result<Value, String> {
    let map = base.as_dict()?;
    let mut map: Dict = (*map).clone();
    let key = path[0].as_str();
    if path.len() == 1 {
        map.shift_remove(key);
    } else {
        let inner = map
            .get(key)
            .cloned()
            .ok_or_else(|| format!("key \"{}\" not known in dictionary", key))?;
        map.insert(key.to_string(), remove(&inner, &path[1..])?);
    }
    Ok(Value::dict(map))
}

pub fn cmd_dict(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.error("wrong # args: should be \"dict subcommand ?arg ...?\"");
    }
    let sub = argv[1].as_str().to_string();
    match sub.as_str() {
        "create" => {
            if argv.len() % 2 != 0 {
                return interp
                    .error("wrong # args: should be \"dict create ?key value ...?\"");
            }
            let mut map = Dict::new();
            for pair in argv[2..].chunks(2) {
                map.insert(pair[0].as_str().to_string(), pair[1].clone());
            }
            interp.ok(Value::dict(map))
        }
        "get" => {
            if argv.len() < 3 {
                return interp
                    .error("wrong # args: should be \"dict get dictionary ?key ...?\"");
            }
            let base = argv[2].clone();
            match dig(interp, &base, &argv[3..]) {
                Ok(v) => interp.ok(v),
                Err(code) => code,
            }
        }
        "set" => {
            if argv.len() < 5 {
                return interp.error(
                    "wrong # args: should be \"dict set dictVarName key ?key ...? value\"",
                );
            }
            let name = argv[2].as_str().to_string();
            let base = interp
                .var_get(&name)
                .unwrap_or_else(|_| Value::dict(Dict::new()));
            let value = argv[argv.len() - 1].clone();
            match put(&base, &argv[3..argv.len() - 1], value) {
                Ok(updated) => match interp.var_set(&name, updated.clone()) {
                    Ok(()) => interp.ok(updated),
                    Err(e) => interp.error(e),
                },
                Err(e) => interp.error(e),
            }
        }
        "unset" => {
            if argv.len() < 4 {
                return interp.error(
                    "wrong # args: should be \"dict unset dictVarName key ?key ...?\"",
                );
            }
            let name = argv[2].as_str().to_string();
            let base = interp
                .var_get(&name)
                .unwrap_or_else(|_| Value::dict(Dict::new()));
            match remove(&base, &argv[3..]) {
                Ok(updated) => match interp.var_set(&name, updated.clone()) {
                    Ok(()) => interp.ok(updated),
                    Err(e) => interp.error(e),
                },
                Err(e) => interp.error(e),
            }
        }
        "exists" => {
            if argv.len() < 4 {
                return interp.error(
                    "wrong # args: should be \"dict exists dictionary key ?key ...?\"",
                );
            }
            let base = argv[2].clone();
            let found = dig(interp, &base, &argv[3..]).is_ok();
            interp.ok(Value::boolean(found))
        }
        "keys" | "values" => {
            if argv.len() < 3 || argv.len() > 4 {
                return interp.error(format!(
                    "wrong # args: should be \"dict {} dictionary ?pattern?\"",
                    sub
                ));
            }
            let map = match dict_of(interp, &argv[2].clone()) {
                Ok(m) => m,
                Err(code) => return code,
            };
            let pattern = argv.get(3).map(|v| v.as_str().to_string());
            let mut out = Vec::new();
            for (k, v) in map.iter() {
                let probe = if sub == "keys" { k.as_str() } else { v.as_str() };
                if pattern
                    .as_ref()
                    .map_or(true, |p| glob_match(p, probe, false))
                {
                    out.push(if sub == "keys" {
                        Value::string(k.clone())
                    } else {
                        v.clone()
                    });
                }
            }
            interp.ok(Value::list(out))
        }
        "size" => {
            if argv.len() != 3 {
                return interp.error("wrong # args: should be \"dict size dictionary\"");
            }
            match dict_of(interp, &argv[2].clone()) {
                Ok(m) => interp.ok(Value::int(m.len() as i64)),
                Err(code) => code,
            }
        }
        "merge" => {
            let mut map = Dict::new();
            for d in &argv[2..] {
                let part = match dict_of(interp, &d.clone()) {
                    Ok(m) => m,
                    Err(code) => return code,
                };
                for (k, v) in part.iter() {
                    map.insert(k.clone(), v.clone());
                }
            }
            interp.ok(Value::dict(map))
        }
        "for" => {
            if argv.len() != 5 {
                return interp.error(
                    "wrong # args: should be \"dict for {keyVarName valueVarName} dictionary script\"",
                );
            }
            let vars = match argv[2].as_list() {
                Ok(items) => items,
                Err(e) => return interp.error(e),
            };
            if vars.len() != 2 {
                return interp.error("must have exactly two variable names");
            }
            let (kvar, vvar) = (vars[0].as_str().to_string(), vars[1].as_str().to_string());
            let map = match dict_of(interp, &argv[3].clone()) {
                Ok(m) => m,
                Err(code) => return code,
            };
            let body = argv[4].clone();
            for (k, v) in map.iter() {
                if let Err(e) = interp.var_set(&kvar, Value::string(k.clone())) {
                    return interp.error(e);
                }
                if let Err(e) = interp.var_set(&vvar, v.clone()) {
                    return interp.error(e);
                }
                match interp.eval_value(&body) {
                    Code::Ok | Code::Continue => {}
                    Code::Break => break,
                    other => return other,
                }
            }
            interp.ok(Value::empty())
        }
        "append" => {
            if argv.len() < 4 {
                return interp.error(
                    "wrong # args: should be \"dict append dictVarName key ?string ...?\"",
                );
            }
            let name = argv[2].as_str().to_string();
            let base = interp
                .var_get(&name)
                .unwrap_or_else(|_| Value::dict(Dict::new()));
            let map = match dict_of(interp, &base) {
                Ok(m) => m,
                Err(code) => return code,
            };
            let key = argv[3].as_str();
            let mut text = map
                .get(key)
                .map(|v| v.as_str().to_string())
                .unwrap_or_default();
            for part in &argv[4..] {
                text.push_str(part.as_str());
            }
            let mut map: Dict = (*map).clone();
            map.insert(key.to_string(), Value::string(text));
            let updated = Value::dict(map);
            match interp.var_set(&name, updated.clone()) {
                Ok(()) => interp.ok(updated),
                Err(e) => interp.error(e),
            }
        }
        "lappend" => {
            if argv.len() < 4 {
                return interp.error(
                    "wrong # args: should be \"dict lappend dictVarName key ?value ...?\"",
                );
            }
            let name = argv[2].as_str().to_string();
            let base = interp
                .var_get(&name)
                .unwrap_or_else(|_| Value::dict(Dict::new()));
            let map = match dict_of(interp, &base) {
                Ok(m) => m,
                Err(code) => return code,
            };
            let key = argv[3].as_str();
            let mut items: Vec<Value> = match map.get(key) {
                Some(v) => match v.as_list() {
                    Ok(items) => items.iter().cloned().collect(),
                    Err(e) => return interp.error(e),
                },
                None => Vec::new(),
            };
            items.extend_from_slice(&argv[4..]);
            let mut map: Dict = (*map).clone();
            map.insert(key.to_string(), Value::list(items));
            let updated = Value::dict(map);
            match interp.var_set(&name, updated.clone()) {
                Ok(()) => interp.ok(updated),
                Err(e) => interp.error(e),
            }
        }
        "incr" => {
            if argv.len() < 4 || argv.len() > 5 {
                return interp.error(
                    "wrong # args: should be \"dict incr dictVarName key ?increment?\"",
                );
            }
            let name = argv[2].as_str().to_string();
            let base = interp
                .var_get(&name)
                .unwrap_or_else(|_| Value::dict(Dict::new()));
            let map = match dict_of(interp, &base) {
                Ok(m) => m,
                Err(code) => return code,
            };
            let key = argv[3].as_str();
            let step = match argv.get(4) {
                Some(v) => match v.as_int() {
                    Ok(i) => i,
                    Err(e) => return interp.error(e),
                },
                None => 1,
            };
            let current = match map.get(key) {
                Some(v) => match v.as_int() {
                    Ok(i) => i,
                    Err(e) => return interp.error(e),
                },
                None => 0,
            };
            let mut map: Dict = (*map).clone();
            map.insert(key.to_string(), Value::int(current.wrapping_add(step)));
            let updated = Value::dict(map);
            match interp.var_set(&name, updated.clone()) {
                Ok(()) => interp.ok(updated),
                Err(e) => interp.error(e),
            }
        }
        other => interp.error(format!(
            "unknown or ambiguous subcommand \"{}\": must be append, create, exists, for, get, incr, keys, lappend, merge, set, size, unset, or values",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(script: &str) -> String {
        let mut interp = Interp::new();
        interp.eval(script);
        interp.result().as_str().to_string()
    }

    #[test]
    fn test_create_get_exists() {
        assert_eq!(run("dict create a 1 b 2"), "a 1 b 2");
        assert_eq!(run("dict get {a 1 b 2} b"), "2");
        assert_eq!(run("dict get {a {x 10}} a x"), "10");
        assert_eq!(run("dict exists {a 1} a"), "1");
        assert_eq!(run("dict exists {a 1} b"), "0");
        assert_eq!(run("catch {dict get {a 1} b} msg; set msg"),
                   "key \"b\" not known in dictionary");
    }

    #[test]
    fn test_set_unset_nested() {
        assert_eq!(run("set d {a 1}; dict set d b 2; set d"), "a 1 b 2");
        assert_eq!(run("set d {}; dict set d a x 10; dict get $d a x"), "10");
        assert_eq!(run("set d {a 1 b 2}; dict unset d a; set d"), "b 2");
        assert_eq!(run("set d {a 1}; dict unset d missing; set d"), "a 1");
    }

    #[test]
    fn test_keys_values_size() {
        assert_eq!(run("dict keys {a 1 b 2}"), "a b");
        assert_eq!(run("dict values {a 1 b 2}"), "1 2");
        assert_eq!(run("dict keys {aa 1 ab 2 b 3} a*"), "aa ab");
        assert_eq!(run("dict size {a 1 b 2}"), "2");
    }

    #[test]
    fn test_merge_order() {
        assert_eq!(run("dict merge {a 1 b 2} {b 20 c 3}"), "a 1 b 20 c 3");
    }

    #[test]
    fn test_for_iterates_in_order() {
        assert_eq!(
            run("set out {}; dict for {k v} {a 1 b 2} { lappend out $k=$v }; set out"),
            "a=1 b=2"
        );
    }

    #[test]
    fn test_mutators() {
        assert_eq!(run("set d {a x}; dict append d a yz; dict get $d a"), "xyz");
        assert_eq!(run("set d {}; dict lappend d l 1; dict lappend d l 2; dict get $d l"), "1 2");
        assert_eq!(run("set d {n 5}; dict incr d n 3; dict get $d n"), "8");
        assert_eq!(run("set d {}; dict incr d n; dict get $d n"), "1");
    }

    #[test]
    fn test_duplicate_keys_keep_first_position() {
        assert_eq!(run("dict get {a 1 b 2 a 3} a"), "3");
        assert_eq!(run("dict keys {a 1 b 2 a 3}"), "a b");
    }
}
