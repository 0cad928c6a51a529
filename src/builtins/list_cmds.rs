//! List Builtins
//!
//! The list family: constructors, accessors, in-place variable editors
//! (`lappend`, `lset`), searching and sorting. Indices everywhere
//! accept the `end±N` forms.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::interp::{Code, Interp};
use crate::util::glob_match;
use crate::util::regex;
use crate::value::{parse_index, Value};

fn list_of(interp: &mut Interp, v: &Value) -> Result<Rc<Vec<Value>>, Code> {
    v.as_list().map_err(|e| interp.error(e))
}

pub fn cmd_list(interp: &mut Interp, argv: &[Value]) -> Code {
    interp.ok(Value::list(argv[1..].to_vec()))
}

pub fn cmd_llength(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 2 {
        return interp.error("wrong # args: should be \"llength list\"");
    }
    match list_of(interp, &argv[1].clone()) {
        Ok(items) => interp.ok(Value::int(items.len() as i64)),
        Err(code) => code,
    }
}

/// Index arguments: `lindex l 1 2` and `lindex l {1 2}` are the same
/// path; a single argument that parses as a multi-element list is a
/// path.
fn index_path(argv: &[Value]) -> Vec<Value> {
    if argv.len() == 1 {
        if let Ok(items) = argv[0].as_list() {
            if items.len() > 1 {
                return items.iter().cloned().collect();
            }
        }
        return vec![argv[0].clone()];
    }
    argv.to_vec()
}

pub fn cmd_lindex(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.error("wrong # args: should be \"lindex list ?index ...?\"");
    }
    let mut current = argv[1].clone();
    if argv.len() == 2 {
        return interp.ok(current);
    }
    for spec in index_path(&argv[2..]) {
        let items = match list_of(interp, &current) {
            Ok(items) => items,
            Err(code) => return code,
        };
        let idx = match parse_index(spec.as_str(), items.len()) {
            Ok(i) => i,
            Err(e) => return interp.error(e),
        };
        if idx < 0 || idx as usize >= items.len() {
            return interp.ok(Value::empty());
        }
        current = items[idx as usize].clone();
    }
    interp.ok(current)
}

pub fn cmd_lrange(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 4 {
        return interp.error("wrong # args: should be \"lrange list first last\"");
    }
    let items = match list_of(interp, &argv[1].clone()) {
        Ok(items) => items,
        Err(code) => return code,
    };
    let first = match parse_index(argv[2].as_str(), items.len()) {
        Ok(i) => i.max(0) as usize,
        Err(e) => return interp.error(e),
    };
    let last = match parse_index(argv[3].as_str(), items.len()) {
        Ok(i) => i,
        Err(e) => return interp.error(e),
    };
    if last < first as i64 || first >= items.len() {
        return interp.ok(Value::list(Vec::new()));
    }
    let end = (last as usize).min(items.len() - 1);
    interp.ok(Value::list(items[first..=end].to_vec()))
}

pub fn cmd_lappend(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.error("wrong # args: should be \"lappend varName ?value ...?\"");
    }
    let name = argv[1].as_str().to_string();
    let current = interp.var_get(&name).unwrap_or_else(|_| Value::list(Vec::new()));
    let mut items: Vec<Value> = match list_of(interp, &current) {
        Ok(items) => items.iter().cloned().collect(),
        Err(code) => return code,
    };
    items.extend_from_slice(&argv[2..]);
    let value = Value::list(items);
    match interp.var_set(&name, value.clone()) {
        Ok(()) => interp.ok(value),
        Err(e) => interp.error(e),
    }
}

pub fn cmd_linsert(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 3 {
        return interp.error("wrong # args: should be \"linsert list index ?element ...?\"");
    }
    let items = match list_of(interp, &argv[1].clone()) {
        Ok(items) => items,
        Err(code) => return code,
    };
    let idx = match parse_index(argv[2].as_str(), items.len()) {
        Ok(i) => i.clamp(0, items.len() as i64) as usize,
        Err(e) => return interp.error(e),
    };
    let mut out = Vec::with_capacity(items.len() + argv.len() - 3);
    out.extend_from_slice(&items[..idx]);
    out.extend_from_slice(&argv[3..]);
    out.extend_from_slice(&items[idx..]);
    interp.ok(Value::list(out))
}

pub fn cmd_lreplace(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 4 {
        return interp
            .error("wrong # args: should be \"lreplace list first last ?element ...?\"");
    }
    let items = match list_of(interp, &argv[1].clone()) {
        Ok(items) => items,
        Err(code) => return code,
    };
    let first = match parse_index(argv[2].as_str(), items.len()) {
        Ok(i) => i.clamp(0, items.len() as i64) as usize,
        Err(e) => return interp.error(e),
    };
    let last = match parse_index(argv[3].as_str(), items.len()) {
        Ok(i) => i,
        Err(e) => return interp.error(e),
    };
    let delete_end = if last < first as i64 {
        first
    } else {
        ((last + 1) as usize).min(items.len())
    };
    let mut out = Vec::new();
    out.extend_from_slice(&items[..first]);
    out.extend_from_slice(&argv[4..]);
    out.extend_from_slice(&items[delete_end..]);
    interp.ok(Value::list(out))
}

pub fn cmd_lset(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 3 {
        return interp
            .error("wrong # args: should be \"lset listVar ?index? ?index ...? value\"");
    }
    let name = argv[1].as_str().to_string();
    let value = argv[argv.len() - 1].clone();
    let current = match interp.var_get(&name) {
        Ok(v) => v,
        Err(e) => return interp.error(e),
    };
    let path_args = &argv[2..argv.len() - 1];
    if path_args.is_empty() {
        match interp.var_set(&name, value.clone()) {
            Ok(()) => return interp.ok(value),
            Err(e) => return interp.error(e),
        }
    }
    let path = index_path(path_args);
    match lset_rec(&current, &path, &value) {
        Ok(updated) => match interp.var_set(&name, updated.clone()) {
            Ok(()) => interp.ok(updated),
            Err(e) => interp.error(e),
        },
        Err(e) => interp.error(e),
    }
}

fn lset_rec(list: &Value, path: &[Value], value: &Value) -> Result<Value, String> {
    let items = list.as_list()?;
    let idx = parse_index(path[0].as_str(), items.len())?;
    if idx < 0 || idx as usize > items.len() {
        return Err("list index out of range".to_string());
    }
    let idx = idx as usize;
    let mut out: Vec<Value> = items.iter().cloned().collect();
    if path.len() == 1 {
        if idx == out.len() {
            out.push(value.clone());
        } else {
            out[idx] = value.clone();
        }
    } else {
        if idx == out.len() {
            return Err("list index out of range".to_string());
        }
        out[idx] = lset_rec(&items[idx], &path[1..], value)?;
    }
    Ok(Value::list(out))
}

pub fn cmd_lreverse(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() != 2 {
        return interp.error("wrong # args: should be \"lreverse list\"");
    }
    match list_of(interp, &argv[1].clone()) {
        Ok(items) => {
            let mut out: Vec<Value> = items.iter().cloned().collect();
            out.reverse();
            interp.ok(Value::list(out))
        }
        Err(code) => code,
    }
}

pub fn cmd_concat(interp: &mut Interp, argv: &[Value]) -> Code {
    let joined = super::eval_cmds::concat_args(&argv[1..]);
    interp.ok(Value::string(joined))
}

pub fn cmd_join(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 || argv.len() > 3 {
        return interp.error("wrong # args: should be \"join list ?joinString?\"");
    }
    let items = match list_of(interp, &argv[1].clone()) {
        Ok(items) => items,
        Err(code) => return code,
    };
    let sep = argv.get(2).map_or_else(|| " ".to_string(), |v| v.as_str().to_string());
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(&sep);
        }
        out.push_str(item.as_str());
    }
    interp.ok(Value::string(out))
}

pub fn cmd_split(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 || argv.len() > 3 {
        return interp.error("wrong # args: should be \"split string ?splitChars?\"");
    }
    let text = argv[1].as_str();
    let seps: Vec<char> = argv
        .get(2)
        .map_or_else(|| " \t\n\r".chars().collect(), |v| v.as_str().chars().collect());

    let mut out: Vec<Value> = Vec::new();
    if seps.is_empty() {
        // Every character becomes its own element.
        for c in text.chars() {
            out.push(Value::string(c.to_string()));
        }
    } else {
        let mut current = String::new();
        for c in text.chars() {
            if seps.contains(&c) {
                out.push(Value::string(std::mem::take(&mut current)));
            } else {
                current.push(c);
            }
        }
        out.push(Value::string(current));
    }
    interp.ok(Value::list(out))
}

// ----------------------------------------------------------------------
// lsearch
// ----------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq)]
enum MatchMode {
    Exact,
    Glob,
    Regexp,
}

pub fn cmd_lsearch(interp: &mut Interp, argv: &[Value]) -> Code {
    let mut mode = MatchMode::Glob;
    let mut all = false;
    let mut inline = false;
    let mut negate = false;
    let mut nocase = false;

    let mut i = 1;
    while i < argv.len() && argv[i].as_str().starts_with('-') {
        match argv[i].as_str() {
            "-exact" => mode = MatchMode::Exact,
            "-glob" => mode = MatchMode::Glob,
            "-regexp" => mode = MatchMode::Regexp,
            "-all" => all = true,
            "-inline" => inline = true,
            "-not" => negate = true,
            "-nocase" => nocase = true,
            "--" => {
                i += 1;
                break;
            }
            other => {
                return interp.error(format!(
                    "bad option \"{}\": must be -all, -exact, -glob, -inline, -nocase, -not, -regexp, or --",
                    other
                ))
            }
        }
        i += 1;
    }
    if argv.len() - i != 2 {
        return interp.error("wrong # args: should be \"lsearch ?-option ...? list pattern\"");
    }
    let items = match list_of(interp, &argv[i].clone()) {
        Ok(items) => items,
        Err(code) => return code,
    };
    let pattern = argv[i + 1].as_str().to_string();

    let mut found: Vec<(usize, Value)> = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        let text = item.as_str();
        let hit = match mode {
            MatchMode::Exact => {
                if nocase {
                    text.eq_ignore_ascii_case(&pattern)
                } else {
                    text == pattern
                }
            }
            MatchMode::Glob => glob_match(&pattern, text, nocase),
            MatchMode::Regexp => match regex::is_match(&pattern, text, nocase) {
                Ok(m) => m,
                Err(e) => return interp.error(e),
            },
        };
        if hit != negate {
            found.push((idx, item.clone()));
            if !all {
                break;
            }
        }
    }

    let result = match (all, inline) {
        (true, true) => Value::list(found.into_iter().map(|(_, v)| v).collect()),
        (true, false) => {
            Value::list(found.into_iter().map(|(i, _)| Value::int(i as i64)).collect())
        }
        (false, true) => found
            .into_iter()
            .next()
            .map(|(_, v)| v)
            .unwrap_or_else(Value::empty),
        (false, false) => Value::int(found.first().map_or(-1, |(i, _)| *i as i64)),
    };
    interp.ok(result)
}

// ----------------------------------------------------------------------
// lsort
// ----------------------------------------------------------------------

#[derive(Clone)]
enum SortKey {
    Text(String),
    Int(i64),
    Real(f64),
}

fn key_cmp(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
        (SortKey::Int(x), SortKey::Int(y)) => x.cmp(y),
        (SortKey::Real(x), SortKey::Real(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

pub fn cmd_lsort(interp: &mut Interp, argv: &[Value]) -> Code {
    #[derive(Clone, Copy, PartialEq)]
    enum KeyMode {
        Ascii,
        Integer,
        Real,
    }
    let mut key_mode = KeyMode::Ascii;
    let mut decreasing = false;
    let mut nocase = false;
    let mut unique = false;
    let mut index: Option<String> = None;

    let mut i = 1;
    while i < argv.len() - 1 {
        match argv[i].as_str() {
            "-ascii" => key_mode = KeyMode::Ascii,
            "-integer" => key_mode = KeyMode::Integer,
            "-real" => key_mode = KeyMode::Real,
            "-increasing" => decreasing = false,
            "-decreasing" => decreasing = true,
            "-nocase" => nocase = true,
            "-unique" => unique = true,
            "-index" => {
                i += 1;
                if i >= argv.len() - 1 {
                    return interp.error("\"-index\" option must be followed by list index");
                }
                index = Some(argv[i].as_str().to_string());
            }
            other => {
                return interp.error(format!(
                    "bad option \"{}\": must be -ascii, -decreasing, -increasing, -index, -integer, -nocase, -real, or -unique",
                    other
                ))
            }
        }
        i += 1;
    }
    if argv.len() < 2 {
        return interp.error("wrong # args: should be \"lsort ?-option value ...? list\"");
    }
    let items = match list_of(interp, &argv[argv.len() - 1].clone()) {
        Ok(items) => items,
        Err(code) => return code,
    };

    // Decorate with the sort key; `-index` resolves its `end±N` form
    // against each element's own length at this point.
    let mut decorated: Vec<(SortKey, Value)> = Vec::with_capacity(items.len());
    for item in items.iter() {
        let source = match &index {
            None => item.clone(),
            Some(spec) => {
                let sub = match item.as_list() {
                    Ok(sub) => sub,
                    Err(e) => return interp.error(e),
                };
                let idx = match parse_index(spec, sub.len()) {
                    Ok(i) => i,
                    Err(e) => return interp.error(e),
                };
                if idx < 0 || idx as usize >= sub.len() {
                    return interp.error(format!(
                        "element {} missing from sublist \"{}\"",
                        spec,
                        item.as_str()
                    ));
                }
                sub[idx as usize].clone()
            }
        };
        let key = match key_mode {
            KeyMode::Ascii => {
                let s = source.as_str();
                SortKey::Text(if nocase { s.to_lowercase() } else { s.to_string() })
            }
            KeyMode::Integer => match source.as_int() {
                Ok(n) => SortKey::Int(n),
                Err(e) => return interp.error(e),
            },
            KeyMode::Real => match source.as_double() {
                Ok(d) => SortKey::Real(d),
                Err(e) => return interp.error(e),
            },
        };
        decorated.push((key, item.clone()));
    }

    decorated.sort_by(|a, b| {
        let ord = key_cmp(&a.0, &b.0);
        if decreasing {
            ord.reverse()
        } else {
            ord
        }
    });

    let mut out: Vec<(SortKey, Value)> = Vec::with_capacity(decorated.len());
    for pair in decorated {
        if unique {
            if let Some(prev) = out.last() {
                if key_cmp(&prev.0, &pair.0) == Ordering::Equal {
                    // Later duplicates replace earlier ones.
                    *out.last_mut().expect("non-empty") = pair;
                    continue;
                }
            }
        }
        out.push(pair);
    }
    interp.ok(Value::list(out.into_iter().map(|(_, v)| v).collect()))
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
    fn test_list_and_llength() {
        assert_eq!(run("list a {b c} d"), "a {b c} d");
        assert_eq!(run("llength {a {b c} d}"), "3");
        assert_eq!(run("llength {}"), "0");
    }

    #[test]
    fn test_lindex() {
        assert_eq!(run("lindex {a b c} 1"), "b");
        assert_eq!(run("lindex {a b c} end"), "c");
        assert_eq!(run("lindex {a b c} end-1"), "b");
        assert_eq!(run("lindex {a b c} 5"), "");
        assert_eq!(run("lindex {a b c}"), "a b c");
        assert_eq!(run("lindex {{a b} {c d}} 1 0"), "c");
        assert_eq!(run("lindex {{a b} {c d}} {1 0}"), "c");
    }

    #[test]
    fn test_lrange() {
        assert_eq!(run("lrange {a b c d e} 1 3"), "b c d");
        assert_eq!(run("lrange {a b c d e} 2 end"), "c d e");
        assert_eq!(run("lrange {a b c} 2 1"), "");
        assert_eq!(run("lrange {a b c} 0 99"), "a b c");
    }

    #[test]
    fn test_lappend_creates_variable() {
        assert_eq!(run("lappend fresh a b; set fresh"), "a b");
        assert_eq!(run("set l {x}; lappend l {y z}; set l"), "x {y z}");
    }

    #[test]
    fn test_linsert_lreplace() {
        assert_eq!(run("linsert {a b c} 1 X Y"), "a X Y b c");
        assert_eq!(run("linsert {a b c} end Z"), "a b Z");
        assert_eq!(run("lreplace {a b c d} 1 2 X"), "a X d");
        assert_eq!(run("lreplace {a b c} 1 0 X"), "a X b c");
        assert_eq!(run("lreplace {a b c} 0 end"), "");
    }

    #[test]
    fn test_lset() {
        assert_eq!(run("set l {a b c}; lset l 1 X; set l"), "a X c");
        assert_eq!(run("set l {{a b} {c d}}; lset l 1 0 X; set l"), "{a b} {X d}");
        assert_eq!(run("set l {a}; lset l 1 b; set l"), "a b");
        assert_eq!(run("set l {a b}; catch {lset l 9 X}"), "1");
    }

    #[test]
    fn test_lreverse_join_split() {
        assert_eq!(run("lreverse {a b c}"), "c b a");
        assert_eq!(run("join {a b c} -"), "a-b-c");
        assert_eq!(run("join {a b c}"), "a b c");
        assert_eq!(run("split a,b,,c ,"), "a b {} c");
        assert_eq!(run("split abc {}"), "a b c");
        assert_eq!(run("llength [split {a b} ]"), "2");
    }

    #[test]
    fn test_concat_trims() {
        assert_eq!(run("concat { a b } {} {c}"), "a b c");
    }

    #[test]
    fn test_lsearch_modes() {
        assert_eq!(run("lsearch {a b c} b"), "1");
        assert_eq!(run("lsearch {a b c} x"), "-1");
        assert_eq!(run("lsearch {apple banana} b*"), "1");
        assert_eq!(run("lsearch -exact {a* b} a*"), "0");
        assert_eq!(run("lsearch -regexp {foo bar12} {[0-9]+$}"), "1");
        assert_eq!(run("lsearch -all {a b a c a} a"), "0 2 4");
        assert_eq!(run("lsearch -inline {aa bb cc} b*"), "bb");
        assert_eq!(run("lsearch -all -inline {aa bb ab} a*"), "aa ab");
        assert_eq!(run("lsearch -not {a b c} a"), "1");
        assert_eq!(run("lsearch -nocase {Alpha Beta} beta"), "1");
    }

    #[test]
    fn test_lsort_modes() {
        assert_eq!(run("lsort {banana apple cherry}"), "apple banana cherry");
        assert_eq!(run("lsort -integer {10 9 2}"), "2 9 10");
        assert_eq!(run("lsort -real {2.5 1.5 10.0}"), "1.5 2.5 10.0");
        assert_eq!(run("lsort -decreasing {a c b}"), "c b a");
        assert_eq!(run("lsort -unique {b a b a}"), "a b");
        assert_eq!(run("lsort -nocase {b A c}"), "A b c");
        assert_eq!(run("lsort -index 1 {{x 2} {y 1} {z 3}}"), "{y 1} {x 2} {z 3}");
        assert_eq!(run("lsort -index end {{x 2} {y 1 0} {z 3}}"), "{y 1 0} {x 2} {z 3}");
        assert_eq!(run("catch {lsort -integer {a b}}"), "1");
    }
}
