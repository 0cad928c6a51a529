//! String Builtins
//!
//! The `string` ensemble (character-indexed, Unicode-aware) and
//! `format`. Character indices accept the same `end±N` forms as list
//! indices.

use crate::interp::{Code, Interp};
use crate::util::glob_match;
use crate::value::{parse_index, Value};

fn chars_of(v: &Value) -> Vec<char> {
    v.as_str().chars().collect()
}

pub fn cmd_string(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.error("wrong # args: should be \"string subcommand ?arg ...?\"");
    }
    let sub = argv[1].as_str().to_string();
    match sub.as_str() {
        "length" => {
            if argv.len() != 3 {
                return interp.error("wrong # args: should be \"string length string\"");
            }
            interp.ok(Value::int(argv[2].as_str().chars().count() as i64))
        }
        "index" => {
            if argv.len() != 4 {
                return interp.error("wrong # args: should be \"string index string charIndex\"");
            }
            let chars = chars_of(&argv[2]);
            let idx = match parse_index(argv[3].as_str(), chars.len()) {
                Ok(i) => i,
                Err(e) => return interp.error(e),
            };
            if idx < 0 || idx as usize >= chars.len() {
                return interp.ok(Value::empty());
            }
            interp.ok(Value::string(chars[idx as usize].to_string()))
        }
        "range" => {
            if argv.len() != 5 {
                return interp.error("wrong # args: should be \"string range string first last\"");
            }
            let chars = chars_of(&argv[2]);
            let first = match parse_index(argv[3].as_str(), chars.len()) {
                Ok(i) => i.max(0) as usize,
                Err(e) => return interp.error(e),
            };
            let last = match parse_index(argv[4].as_str(), chars.len()) {
                Ok(i) => i,
                Err(e) => return interp.error(e),
            };
            if chars.is_empty() || last < first as i64 || first >= chars.len() {
                return interp.ok(Value::empty());
            }
            let end = (last as usize).min(chars.len() - 1);
            interp.ok(Value::string(chars[first..=end].iter().collect::<String>()))
        }
        "compare" | "equal" => {
            let mut nocase = false;
            let mut length: Option<usize> = None;
            let mut i = 2;
            while i < argv.len() - 2 {
                match argv[i].as_str() {
                    "-nocase" => nocase = true,
                    "-length" => {
                        i += 1;
                        if i >= argv.len() - 2 {
                            break;
                        }
                        match argv[i].as_int() {
                            Ok(n) => length = Some(n.max(0) as usize),
                            Err(e) => return interp.error(e),
                        }
                    }
                    other => {
                        return interp.error(format!(
                            "bad option \"{}\": must be -nocase or -length",
                            other
                        ))
                    }
                }
                i += 1;
            }
            if argv.len() - i != 2 {
                return interp.error(format!(
                    "wrong # args: should be \"string {} ?-nocase? ?-length int? string1 string2\"",
                    sub
                ));
            }
            let mut a = argv[i].as_str().to_string();
            let mut b = argv[i + 1].as_str().to_string();
            if nocase {
                a = a.to_lowercase();
                b = b.to_lowercase();
            }
            if let Some(n) = length {
                a = a.chars().take(n).collect();
                b = b.chars().take(n).collect();
            }
            if sub == "equal" {
                interp.ok(Value::boolean(a == b))
            } else {
                let ord = a.cmp(&b);
                interp.ok(Value::int(match ord {
                    std::cmp::Ordering::Less => -1,
                    std::cmp::Ordering::Equal => 0,
                    std::cmp::Ordering::Greater => 1,
                }))
            }
        }
        "match" => {
            let mut nocase = false;
            let mut i = 2;
            if i < argv.len() && argv[i].as_str() == "-nocase" {
                nocase = true;
                i += 1;
            }
            if argv.len() - i != 2 {
                return interp
                    .error("wrong # args: should be \"string match ?-nocase? pattern string\"");
            }
            let hit = glob_match(argv[i].as_str(), argv[i + 1].as_str(), nocase);
            interp.ok(Value::boolean(hit))
        }
        "tolower" | "toupper" | "totitle" => {
            if argv.len() != 3 {
                return interp.error(format!(
                    "wrong # args: should be \"string {} string\"",
                    sub
                ));
            }
            let s = argv[2].as_str();
            let out = match sub.as_str() {
                "tolower" => s.to_lowercase(),
                "toupper" => s.to_uppercase(),
                _ => {
                    let mut chars = s.chars();
                    match chars.next() {
                        Some(first) => {
                            first.to_uppercase().collect::<String>()
                                + &chars.as_str().to_lowercase()
                        }
                        None => String::new(),
                    }
                }
            };
            interp.ok(Value::string(out))
        }
        "trim" | "trimleft" | "trimright" => {
            if argv.len() < 3 || argv.len() > 4 {
                return interp.error(format!(
                    "wrong # args: should be \"string {} string ?chars?\"",
                    sub
                ));
            }
            let set: Vec<char> = argv
                .get(3)
                .map_or_else(|| " \t\n\r\x0b\x0c".chars().collect(), |v| v.as_str().chars().collect());
            let pred = |c: char| set.contains(&c);
            let s = argv[2].as_str();
            let out = match sub.as_str() {
                "trim" => s.trim_matches(pred),
                "trimleft" => s.trim_start_matches(pred),
                _ => s.trim_end_matches(pred),
            };
            interp.ok(Value::string(out))
        }
        "first" | "last" => {
            if argv.len() != 4 {
                return interp.error(format!(
                    "wrong # args: should be \"string {} needleString haystackString\"",
                    sub
                ));
            }
            let needle = argv[2].as_str();
            let hay = argv[3].as_str();
            let byte_pos = if sub == "first" {
                hay.find(needle)
            } else {
                hay.rfind(needle)
            };
            let idx = match byte_pos {
                Some(b) => hay[..b].chars().count() as i64,
                None => -1,
            };
            interp.ok(Value::int(idx))
        }
        "repeat" => {
            if argv.len() != 4 {
                return interp.error("wrong # args: should be \"string repeat string count\"");
            }
            let count = match argv[3].as_int() {
                Ok(n) => n.max(0) as usize,
                Err(e) => return interp.error(e),
            };
            interp.ok(Value::string(argv[2].as_str().repeat(count)))
        }
        "reverse" => {
            if argv.len() != 3 {
                return interp.error("wrong # args: should be \"string reverse string\"");
            }
            interp.ok(Value::string(argv[2].as_str().chars().rev().collect::<String>()))
        }
        "map" => {
            let mut nocase = false;
            let mut i = 2;
            if i < argv.len() && argv[i].as_str() == "-nocase" {
                nocase = true;
                i += 1;
            }
            if argv.len() - i != 2 {
                return interp
                    .error("wrong # args: should be \"string map ?-nocase? mapping string\"");
            }
            let mapping = match argv[i].as_list() {
                Ok(items) => items,
                Err(e) => return interp.error(e),
            };
            if mapping.len() % 2 != 0 {
                return interp.error("char map list unbalanced");
            }
            let pairs: Vec<(String, String)> = mapping
                .chunks(2)
                .map(|p| (p[0].as_str().to_string(), p[1].as_str().to_string()))
                .collect();
            let text = argv[i + 1].as_str();
            let mut out = String::new();
            let mut pos = 0;
            'outer: while pos < text.len() {
                for (from, to) in &pairs {
                    if from.is_empty() {
                        continue;
                    }
                    let hit = if nocase {
                        text[pos..]
                            .get(..from.len())
                            .map_or(false, |s| s.eq_ignore_ascii_case(from))
                    } else {
                        text[pos..].starts_with(from.as_str())
                    };
                    if hit {
                        out.push_str(to);
                        pos += from.len();
                        continue 'outer;
                    }
                }
                let c = text[pos..].chars().next().expect("in bounds");
                out.push(c);
                pos += c.len_utf8();
            }
            interp.ok(Value::string(out))
        }
        "is" => {
            if argv.len() < 4 {
                return interp
                    .error("wrong # args: should be \"string is class ?-strict? string\"");
            }
            let class = argv[2].as_str().to_string();
            let mut i = 3;
            let mut strict = false;
            if argv[i].as_str() == "-strict" {
                strict = true;
                i += 1;
            }
            if argv.len() - i != 1 {
                return interp
                    .error("wrong # args: should be \"string is class ?-strict? string\"");
            }
            let s = argv[i].as_str();
            if s.is_empty() {
                return interp.ok(Value::boolean(!strict));
            }
            let result = match class.as_str() {
                "alpha" => s.chars().all(|c| c.is_alphabetic()),
                "digit" => s.chars().all(|c| c.is_ascii_digit()),
                "alnum" => s.chars().all(|c| c.is_alphanumeric()),
                "space" => s.chars().all(|c| c.is_whitespace()),
                "upper" => s.chars().all(|c| c.is_uppercase()),
                "lower" => s.chars().all(|c| c.is_lowercase()),
                "integer" => crate::value::parse_int(s).is_ok(),
                "double" => crate::value::parse_double(s).is_ok(),
                "boolean" => crate::value::parse_bool(s).is_ok(),
                "true" => crate::value::parse_bool(s) == Ok(true),
                "false" => crate::value::parse_bool(s) == Ok(false),
                other => {
                    return interp.error(format!(
                        "bad class \"{}\": must be alnum, alpha, boolean, digit, double, false, integer, lower, space, true, or upper",
                        other
                    ))
                }
            };
            interp.ok(Value::boolean(result))
        }
        "cat" => {
            let mut out = String::new();
            for v in &argv[2..] {
                out.push_str(v.as_str());
            }
            interp.ok(Value::string(out))
        }
        other => interp.error(format!(
            "unknown or ambiguous subcommand \"{}\": must be cat, compare, equal, first, index, is, last, length, map, match, range, repeat, reverse, tolower, totitle, toupper, trim, trimleft, or trimright",
            other
        )),
    }
}

// ----------------------------------------------------------------------
// format
// ----------------------------------------------------------------------

#[derive(Default, Clone, Copy)]
struct Spec {
    minus: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alt: bool,
    width: usize,
    precision: Option<usize>,
}

pub fn cmd_format(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.error("wrong # args: should be \"format formatString ?arg ...?\"");
    }
    let template = argv[1].as_str().to_string();
    let args = &argv[2..];
    let mut next_arg = 0usize;
    let mut out = String::new();

    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            let c = template[i..].chars().next().expect("in bounds");
            out.push(c);
            i += c.len_utf8();
            continue;
        }
        i += 1;
        if i >= bytes.len() {
            return interp.error("format string ended in middle of field specifier");
        }
        if bytes[i] == b'%' {
            out.push('%');
            i += 1;
            continue;
        }

        let mut spec = Spec::default();
        loop {
            match bytes.get(i) {
                Some(b'-') => spec.minus = true,
                Some(b'+') => spec.plus = true,
                Some(b' ') => spec.space = true,
                Some(b'0') => spec.zero = true,
                Some(b'#') => spec.alt = true,
                _ => break,
            }
            i += 1;
        }
        let mut take_arg = |interp: &mut Interp| -> Result<Value, Code> {
            if next_arg >= args.len() {
                return Err(
                    interp.error("not enough arguments for all format specifiers")
                );
            }
            let v = args[next_arg].clone();
            next_arg += 1;
            Ok(v)
        };
        if bytes.get(i) == Some(&b'*') {
            i += 1;
            match take_arg(interp) {
                Ok(v) => match v.as_int() {
                    Ok(n) => spec.width = n.max(0) as usize,
                    Err(e) => return interp.error(e),
                },
                Err(code) => return code,
            }
        } else {
            while bytes.get(i).map_or(false, |b| b.is_ascii_digit()) {
                spec.width = spec.width * 10 + (bytes[i] - b'0') as usize;
                i += 1;
            }
        }
        if bytes.get(i) == Some(&b'.') {
            i += 1;
            let mut prec = 0usize;
            if bytes.get(i) == Some(&b'*') {
                i += 1;
                match take_arg(interp) {
                    Ok(v) => match v.as_int() {
                        Ok(n) => prec = n.max(0) as usize,
                        Err(e) => return interp.error(e),
                    },
                    Err(code) => return code,
                }
            } else {
                while bytes.get(i).map_or(false, |b| b.is_ascii_digit()) {
                    prec = prec * 10 + (bytes[i] - b'0') as usize;
                    i += 1;
                }
            }
            spec.precision = Some(prec);
        }

        let Some(&conv) = bytes.get(i) else {
            return interp.error("format string ended in middle of field specifier");
        };
        i += 1;
        let arg = match take_arg(interp) {
            Ok(v) => v,
            Err(code) => return code,
        };
        let piece = match format_one(conv, spec, &arg) {
            Ok(p) => p,
            Err(e) => return interp.error(e),
        };
        out.push_str(&piece);
    }
    interp.ok(Value::string(out))
}

fn format_one(conv: u8, spec: Spec, arg: &Value) -> Result<String, String> {
    let body = match conv {
        b'd' | b'i' => {
            let n = arg.as_int()?;
            signed_body(n.unsigned_abs().to_string(), n < 0, spec)
        }
        b'u' => (arg.as_int()? as u64).to_string(),
        b'x' => prefixed(format!("{:x}", arg.as_int()? as u64), "0x", spec),
        b'X' => prefixed(format!("{:X}", arg.as_int()? as u64), "0X", spec),
        b'o' => prefixed(format!("{:o}", arg.as_int()? as u64), "0o", spec),
        b'c' => {
            let n = arg.as_int()?;
            char::from_u32(n as u32)
                .map(|c| c.to_string())
                .unwrap_or_default()
        }
        b's' => {
            let s = arg.as_str();
            match spec.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s.to_string(),
            }
        }
        b'f' => {
            let d = arg.as_double()?;
            let prec = spec.precision.unwrap_or(6);
            signed_body(format!("{:.*}", prec, d.abs()), d < 0.0, spec)
        }
        b'e' | b'E' => {
            let d = arg.as_double()?;
            let prec = spec.precision.unwrap_or(6);
            let s = exp_form(d.abs(), prec, conv == b'E');
            signed_body(s, d < 0.0, spec)
        }
        b'g' | b'G' => {
            let d = arg.as_double()?;
            let prec = spec.precision.unwrap_or(6).max(1);
            let s = general_form(d.abs(), prec, conv == b'G');
            signed_body(s, d < 0.0, spec)
        }
        other => {
            return Err(format!(
                "bad field specifier \"{}\"",
                char::from_u32(other as u32).unwrap_or('?')
            ))
        }
    };
    Ok(pad(body, spec))
}

/// Apply sign flags and, for `%0`, digit-aware zero padding.
fn signed_body(digits: String, negative: bool, spec: Spec) -> String {
    let sign = if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    };
    if spec.zero && !spec.minus && sign.len() + digits.len() < spec.width {
        let fill = spec.width - sign.len() - digits.len();
        return format!("{}{}{}", sign, "0".repeat(fill), digits);
    }
    format!("{}{}", sign, digits)
}

fn prefixed(digits: String, prefix: &str, spec: Spec) -> String {
    if spec.alt && digits != "0" {
        format!("{}{}", prefix, digits)
    } else {
        digits
    }
}

fn pad(body: String, spec: Spec) -> String {
    let len = body.chars().count();
    if len >= spec.width {
        return body;
    }
    let fill = " ".repeat(spec.width - len);
    if spec.minus {
        body + &fill
    } else {
        fill + &body
    }
}

/// C-style `%e`: one digit, point, `prec` digits, `e±NN`.
fn exp_form(d: f64, prec: usize, upper: bool) -> String {
    if d == 0.0 {
        let mantissa = format!("{:.*}", prec, 0.0);
        return format!("{}{}+00", mantissa, if upper { "E" } else { "e" });
    }
    let mut exp = d.abs().log10().floor() as i32;
    let mut mant = d / 10f64.powi(exp);
    // Rounding at the precision can carry into a new digit.
    let rounded = format!("{:.*}", prec, mant);
    if rounded.starts_with("10") {
        mant /= 10.0;
        exp += 1;
    }
    let mantissa = format!("{:.*}", prec, mant);
    let e = if upper { "E" } else { "e" };
    if exp < 0 {
        format!("{}{}-{:02}", mantissa, e, -exp)
    } else {
        format!("{}{}+{:02}", mantissa, e, exp)
    }
}

/// C-style `%g`: the shorter of `%e` and `%f`, trailing zeros trimmed.
fn general_form(d: f64, prec: usize, upper: bool) -> String {
    if d == 0.0 {
        return "0".to_string();
    }
    let exp = d.abs().log10().floor() as i32;
    let mut s = if exp < -4 || exp >= prec as i32 {
        let raw = exp_form(d, prec.saturating_sub(1), upper);
        // Trim trailing zeros in the mantissa.
        match raw.split_once(if upper { 'E' } else { 'e' }) {
            Some((mant, tail)) => {
                let mant = mant.trim_end_matches('0').trim_end_matches('.');
                format!("{}{}{}", mant, if upper { "E" } else { "e" }, tail)
            }
            None => raw,
        }
    } else {
        let digits = (prec as i32 - 1 - exp).max(0) as usize;
        format!("{:.*}", digits, d)
    };
    if s.contains('.') && !s.contains('e') && !s.contains('E') {
        s = s.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    s
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
    fn test_format_ints() {
        assert_eq!(run("format %d 42"), "42");
        assert_eq!(run("format %5d 42"), "   42");
        assert_eq!(run("format %-5d| 42"), "42   |");
        assert_eq!(run("format %05d 42"), "00042");
        assert_eq!(run("format %+d 42"), "+42");
        assert_eq!(run("format %d -7"), "-7");
        assert_eq!(run("format %x 255"), "ff");
        assert_eq!(run("format %#x 255"), "0xff");
        assert_eq!(run("format %X 255"), "FF");
        assert_eq!(run("format %o 8"), "10");
    }

    #[test]
    fn test_format_strings() {
        assert_eq!(run("format %s hello"), "hello");
        assert_eq!(run("format %8s hi"), "      hi");
        assert_eq!(run("format %-8s| hi"), "hi      |");
        assert_eq!(run("format %.2s hello"), "he");
        assert_eq!(run("format %c 65"), "A");
        assert_eq!(run("format %% "), "%");
    }

    #[test]
    fn test_format_floats() {
        assert_eq!(run("format %f 1.5"), "1.500000");
        assert_eq!(run("format %.2f 3.14159"), "3.14");
        assert_eq!(run("format %e 1500.0"), "1.500000e+03");
        assert_eq!(run("format %.1e 0.0025"), "2.5e-03");
        assert_eq!(run("format %g 0.0001"), "0.0001");
        assert_eq!(run("format %g 100000000.0"), "1e+08");
    }

    #[test]
    fn test_format_star_and_errors() {
        assert_eq!(run("format %*d 6 42"), "    42");
        assert_eq!(
            run("format %d"),
            "not enough arguments for all format specifiers"
        );
    }

    #[test]
    fn test_string_subcommands() {
        assert_eq!(run("string length héllo"), "5");
        assert_eq!(run("string index abcde 1"), "b");
        assert_eq!(run("string index abcde end"), "e");
        assert_eq!(run("string range abcde 1 3"), "bcd");
        assert_eq!(run("string range abcde 2 end"), "cde");
        assert_eq!(run("string toupper abc"), "ABC");
        assert_eq!(run("string totitle hELLO"), "Hello");
        assert_eq!(run("string trim {  hi  }"), "hi");
        assert_eq!(run("string trimleft xxhixx x"), "hixx");
        assert_eq!(run("string repeat ab 3"), "ababab");
        assert_eq!(run("string reverse abc"), "cba");
        assert_eq!(run("string first lo hello"), "3");
        assert_eq!(run("string last l hello"), "3");
        assert_eq!(run("string compare apple banana"), "-1");
        assert_eq!(run("string equal -nocase AbC abc"), "1");
        assert_eq!(run("string match {a*c} abbbc"), "1");
        assert_eq!(run("string map {ab X} abcab"), "XcX");
        assert_eq!(run("string is integer 42"), "1");
        assert_eq!(run("string is integer 4x"), "0");
        assert_eq!(run("string is double 1.5"), "1");
        assert_eq!(run("string is alpha abc"), "1");
        assert_eq!(run("string is alpha {}"), "1");
        assert_eq!(run("string is alpha -strict {}"), "0");
        assert_eq!(run("string cat a b c"), "abc")
    }
}
