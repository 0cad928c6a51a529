//! List Syntax
//!
//! Parsing and formatting of the list string form. The grammar mirrors
//! the word-level rules of the script parser: elements are separated by
//! whitespace, a braced element is taken verbatim (nested braces count,
//! a backslash suppresses the brace effect and is kept), a quoted or
//! bare element processes backslash escapes. `format_list` quotes each
//! element so that parsing the result yields the same elements byte for
//! byte.

use crate::parser::escapes::backslash;
use crate::value::Value;

fn is_list_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c')
}

/// Split a string into its list elements.
pub fn parse_list(s: &str) -> Result<Vec<Value>, String> {
    let src = s.as_bytes();
    let mut items = Vec::new();
    let mut i = 0;

    while i < src.len() {
        while i < src.len() && is_list_space(src[i]) {
            i += 1;
        }
        if i >= src.len() {
            break;
        }
        match src[i] {
            b'{' => {
                let start = i + 1;
                let mut depth = 1usize;
                let mut j = start;
                while j < src.len() {
                    match src[j] {
                        b'\\' => {
                            j += 2;
                            continue;
                        }
                        b'{' => depth += 1,
                        b'}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    j += 1;
                }
                if depth != 0 || j >= src.len() {
                    return Err("unmatched open brace in list".to_string());
                }
                items.push(Value::string(&s[start..j]));
                i = j + 1;
                if i < src.len() && !is_list_space(src[i]) {
                    return Err(format!(
                        "list element in braces followed by \"{}\" instead of space",
                        s[i..].chars().next().unwrap_or(' ')
                    ));
                }
            }
            b'"' => {
                let mut out = String::new();
                let mut j = i + 1;
                let mut span = j;
                let mut closed = false;
                while j < src.len() {
                    match src[j] {
                        b'\\' => {
                            out.push_str(&s[span..j]);
                            let (decoded, next) = backslash(src, j);
                            out.push_str(&decoded);
                            j = next;
                            span = j;
                        }
                        b'"' => {
                            out.push_str(&s[span..j]);
                            j += 1;
                            closed = true;
                            break;
                        }
                        _ => j += 1,
                    }
                }
                if !closed {
                    return Err("unmatched open quote in list".to_string());
                }
                if j < src.len() && !is_list_space(src[j]) {
                    return Err(format!(
                        "list element in quotes followed by \"{}\" instead of space",
                        s[j..].chars().next().unwrap_or(' ')
                    ));
                }
                items.push(Value::string(out));
                i = j;
            }
            _ => {
                let mut out = String::new();
                let mut span = i;
                let mut j = i;
                while j < src.len() && !is_list_space(src[j]) {
                    if src[j] == b'\\' {
                        out.push_str(&s[span..j]);
                        let (decoded, next) = backslash(src, j);
                        out.push_str(&decoded);
                        j = next;
                        span = j;
                    } else {
                        j += 1;
                    }
                }
                out.push_str(&s[span..j]);
                items.push(Value::string(out));
                i = j;
            }
        }
    }
    Ok(items)
}

/// True when the content can be wrapped in braces and read back
/// verbatim: braces balance, no close before open, and no trailing
/// backslash that would eat the closing brace.
fn brace_quotable(s: &str) -> bool {
    let src = s.as_bytes();
    let mut depth = 0i64;
    let mut i = 0;
    while i < src.len() {
        match src[i] {
            b'\\' => {
                if i + 1 >= src.len() {
                    return false;
                }
                i += 1;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
        i += 1;
    }
    depth == 0
}

/// Quote a single element for inclusion in a list string.
pub fn format_element(s: &str) -> String {
    if s.is_empty() {
        return "{}".to_string();
    }
    let plain = !s.starts_with('#')
        && !s.bytes().any(|b| {
            matches!(
                b,
                b' ' | b'\t'
                    | b'\n'
                    | b'\r'
                    | b'\x0b'
                    | b'\x0c'
                    | b'{'
                    | b'}'
                    | b'['
                    | b']'
                    | b'$'
                    | b'"'
                    | b';'
                    | b'\\'
            )
        });
    if plain {
        return s.to_string();
    }
    if brace_quotable(s) {
        return format!("{{{}}}", s);
    }
    // Backslash quoting as a last resort.
    let mut out = String::with_capacity(s.len() * 2);
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\x0b' => out.push_str("\\v"),
            '\x0c' => out.push_str("\\f"),
            ' ' | '{' | '}' | '[' | ']' | '$' | '"' | ';' | '\\' | '#' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Format values as a list string, one element per value.
pub fn format_list(items: &[Value]) -> String {
    let mut out = String::new();
    for (n, item) in items.iter().enumerate() {
        if n > 0 {
            out.push(' ');
        }
        out.push_str(&format_element(item.as_str()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(s: &str) -> Vec<String> {
        parse_list(s)
            .unwrap()
            .iter()
            .map(|v| v.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_parse_simple() {
        assert_eq!(strs("a b c"), ["a", "b", "c"]);
        assert_eq!(strs("  a\t b\n"), ["a", "b"]);
        assert!(strs("").is_empty());
    }

    #[test]
    fn test_parse_braced() {
        assert_eq!(strs("{a b} c"), ["a b", "c"]);
        assert_eq!(strs("{a {b c}} d"), ["a {b c}", "d"]);
        assert_eq!(strs("{}"), [""]);
        assert_eq!(strs(r"{a \{ b}"), [r"a \{ b"]);
    }

    #[test]
    fn test_parse_quoted() {
        assert_eq!(strs("\"a b\" c"), ["a b", "c"]);
        assert_eq!(strs("\"a\\tb\""), ["a\tb"]);
    }

    #[test]
    fn test_parse_bare_escapes() {
        assert_eq!(strs(r"a\ b c"), ["a b", "c"]);
        assert_eq!(strs(r"\{x"), ["{x"]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_list("{a b").is_err());
        assert!(parse_list("\"a b").is_err());
        assert!(parse_list("{a}b").is_err());
    }

    #[test]
    fn test_format_element() {
        assert_eq!(format_element("abc"), "abc");
        assert_eq!(format_element(""), "{}");
        assert_eq!(format_element("a b"), "{a b}");
        assert_eq!(format_element("{"), "\\{");
        assert_eq!(format_element("a{b"), "a\\{b");
        assert_eq!(format_element("#x"), "{#x}");
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            vec!["a", "b c", "", "{", "x}y", "a\nb", "end\\"],
            vec!["nested {deep {braces}}", "$v", "[cmd]", ";"],
        ];
        for case in cases {
            let items: Vec<Value> = case.iter().map(|s| Value::string(*s)).collect();
            let formatted = format_list(&items);
            let parsed = parse_list(&formatted).unwrap();
            let back: Vec<String> =
                parsed.iter().map(|v| v.as_str().to_string()).collect();
            assert_eq!(back, case, "through {:?}", formatted);
        }
    }
}
