//! Command Parser
//!
//! Reads a script one command at a time, assembling each word with the
//! substitution rules of the language: braced words are verbatim,
//! quoted and bare words process backslash escapes, `$var` reads, and
//! `[...]` command substitutions evaluated in the current scope. A word
//! prefixed `{*}` is split as a list into separate words after
//! substitution.
//!
//! Substitution during parsing is what makes fexpr-style commands work:
//! a command receives braced arguments unparsed and decides itself
//! whether to evaluate them.

use crate::interp::eval::eval_script;
use crate::interp::{Code, Interp};
use crate::parser::context::{
    incomplete_descriptor, ParseContext, ParseError, ParseStatus, WordFail,
};
use crate::parser::escapes::backslash;
use crate::value::Value;

/// Bytes that end a word (and `\n`/`;` also end the command).
fn is_word_term(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b';')
}

fn count_nl(s: &str) -> usize {
    s.bytes().filter(|&b| b == b'\n').count()
}

/// Parse the next command from `ctx` into `ctx.words`.
pub fn parse_command(interp: &mut Interp, ctx: &mut ParseContext) -> ParseStatus {
    ctx.words.clear();
    let src = ctx.src.as_bytes();

    // Between commands: spaces, tabs, newlines, semicolons, line
    // continuations, and comments (comments are only recognized where a
    // command name may begin, which is exactly here).
    loop {
        if ctx.pos >= src.len() {
            return ParseStatus::Done;
        }
        match src[ctx.pos] {
            b' ' | b'\t' | b'\r' => ctx.pos += 1,
            b'\n' => {
                ctx.pos += 1;
                ctx.line += 1;
            }
            b';' => ctx.pos += 1,
            b'\\' if ctx.pos + 1 < src.len() && src[ctx.pos + 1] == b'\n' => {
                ctx.pos += 2;
                ctx.line += 1;
                while ctx.pos < src.len() && matches!(src[ctx.pos], b' ' | b'\t') {
                    ctx.pos += 1;
                }
            }
            b'#' => {
                while ctx.pos < src.len() && src[ctx.pos] != b'\n' {
                    if src[ctx.pos] == b'\\' && ctx.pos + 1 < src.len() {
                        if src[ctx.pos + 1] == b'\n' {
                            ctx.line += 1;
                        }
                        ctx.pos += 2;
                    } else {
                        ctx.pos += 1;
                    }
                }
            }
            _ => break,
        }
    }
    ctx.cmd_line = ctx.line;

    loop {
        // Separators within the command.
        while ctx.pos < src.len() {
            match src[ctx.pos] {
                b' ' | b'\t' | b'\r' => ctx.pos += 1,
                b'\\' if ctx.pos + 1 < src.len() && src[ctx.pos + 1] == b'\n' => {
                    ctx.pos += 2;
                    ctx.line += 1;
                    while ctx.pos < src.len() && matches!(src[ctx.pos], b' ' | b'\t') {
                        ctx.pos += 1;
                    }
                }
                b'\n' => {
                    ctx.pos += 1;
                    ctx.line += 1;
                    return ParseStatus::Ok;
                }
                b';' => {
                    ctx.pos += 1;
                    return ParseStatus::Ok;
                }
                _ => break,
            }
        }
        if ctx.pos >= src.len() {
            return ParseStatus::Ok;
        }

        match parse_word(interp, ctx) {
            Ok((value, expand)) => {
                if expand {
                    match value.as_list() {
                        Ok(items) => ctx.words.extend(items.iter().cloned()),
                        Err(e) => return ParseStatus::Abort(interp.error(e)),
                    }
                } else {
                    ctx.words.push(value);
                }
            }
            Err(WordFail::Incomplete(start, end)) => {
                interp.set_result(incomplete_descriptor(start, end));
                return ParseStatus::Incomplete;
            }
            Err(WordFail::Syntax(e)) => {
                interp.set_result(e.descriptor());
                return ParseStatus::Error;
            }
            Err(WordFail::Abort(code)) => return ParseStatus::Abort(code),
        }
    }
}

/// Word accumulator that keeps a lone substitution's value intact so a
/// word that is exactly `$v` or `[cmd]` passes the value through
/// without flattening its internal representation.
enum WordAcc {
    Empty,
    Single(Value),
    Text(String),
}

impl WordAcc {
    fn push_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        match self {
            WordAcc::Empty => *self = WordAcc::Text(s.to_string()),
            WordAcc::Single(v) => {
                let mut t = v.as_str().to_string();
                t.push_str(s);
                *self = WordAcc::Text(t);
            }
            WordAcc::Text(t) => t.push_str(s),
        }
    }

    fn push_value(&mut self, v: Value) {
        match self {
            WordAcc::Empty => *self = WordAcc::Single(v),
            WordAcc::Single(prev) => {
                let mut t = prev.as_str().to_string();
                t.push_str(v.as_str());
                *self = WordAcc::Text(t);
            }
            WordAcc::Text(t) => t.push_str(v.as_str()),
        }
    }

    fn finish(self) -> Value {
        match self {
            WordAcc::Empty => Value::empty(),
            WordAcc::Single(v) => v,
            WordAcc::Text(t) => Value::string(t),
        }
    }
}

fn parse_word(
    interp: &mut Interp,
    ctx: &mut ParseContext,
) -> Result<(Value, bool), WordFail> {
    let src = ctx.src.as_bytes();
    let mut expand = false;
    if ctx.pos + 3 < src.len()
        && &src[ctx.pos..ctx.pos + 3] == b"{*}"
        && !is_word_term(src[ctx.pos + 3])
    {
        expand = true;
        ctx.pos += 3;
    }
    let value = match src.get(ctx.pos) {
        Some(b'{') => parse_braced(ctx)?,
        Some(b'"') => parse_quoted(interp, ctx)?,
        _ => parse_bare(interp, ctx)?,
    };
    Ok((value, expand))
}

/// A braced word: verbatim up to the matching close brace. A backslash
/// suppresses the nesting effect of a following brace and is kept.
fn parse_braced(ctx: &mut ParseContext) -> Result<Value, WordFail> {
    let src = ctx.src.as_bytes();
    let start = ctx.pos;
    let mut depth = 1usize;
    let mut i = start + 1;
    while i < src.len() {
        match src[i] {
            b'\\' => {
                i += 2;
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
        i += 1;
    }
    if depth != 0 || i >= src.len() {
        return Err(WordFail::Incomplete(start, src.len()));
    }
    let content = &ctx.src[start + 1..i];
    ctx.line += count_nl(content);
    ctx.pos = i + 1;
    if ctx.pos < src.len() && !is_word_term(src[ctx.pos]) {
        return Err(WordFail::Syntax(ParseError::new(
            "extra characters after close-brace",
            ctx.pos,
            ctx.pos + 1,
        )));
    }
    Ok(Value::string(content))
}

fn parse_quoted(
    interp: &mut Interp,
    ctx: &mut ParseContext,
) -> Result<Value, WordFail> {
    let src = ctx.src.as_bytes();
    let open = ctx.pos;
    ctx.pos += 1;
    let mut acc = WordAcc::Empty;
    let mut span = ctx.pos;
    loop {
        if ctx.pos >= src.len() {
            return Err(WordFail::Incomplete(open, src.len()));
        }
        match src[ctx.pos] {
            b'"' => {
                acc.push_str(&ctx.src[span..ctx.pos]);
                ctx.pos += 1;
                break;
            }
            b'\\' => {
                acc.push_str(&ctx.src[span..ctx.pos]);
                if ctx.pos + 1 < src.len() && src[ctx.pos + 1] == b'\n' {
                    ctx.line += 1;
                }
                let (decoded, next) = backslash(src, ctx.pos);
                acc.push_str(&decoded);
                ctx.pos = next;
                span = next;
            }
            b'$' => {
                acc.push_str(&ctx.src[span..ctx.pos]);
                match var_substitute(interp, ctx)? {
                    Some(v) => acc.push_value(v),
                    None => acc.push_str("$"),
                }
                span = ctx.pos;
            }
            b'[' => {
                acc.push_str(&ctx.src[span..ctx.pos]);
                let v = cmd_substitute(interp, ctx)?;
                acc.push_value(v);
                span = ctx.pos;
            }
            b'\n' => {
                ctx.line += 1;
                ctx.pos += 1;
            }
            _ => ctx.pos += 1,
        }
    }
    if ctx.pos < src.len() && !is_word_term(src[ctx.pos]) {
        return Err(WordFail::Syntax(ParseError::new(
            "extra characters after close-quote",
            ctx.pos,
            ctx.pos + 1,
        )));
    }
    Ok(acc.finish())
}

fn parse_bare(
    interp: &mut Interp,
    ctx: &mut ParseContext,
) -> Result<Value, WordFail> {
    let src = ctx.src.as_bytes();
    let mut acc = WordAcc::Empty;
    let mut span = ctx.pos;
    while ctx.pos < src.len() {
        let b = src[ctx.pos];
        if is_word_term(b) {
            break;
        }
        match b {
            b'\\' => {
                // A line continuation ends the word; the separator skip
                // in the command loop consumes it.
                if ctx.pos + 1 < src.len() && src[ctx.pos + 1] == b'\n' {
                    break;
                }
                acc.push_str(&ctx.src[span..ctx.pos]);
                let (decoded, next) = backslash(src, ctx.pos);
                acc.push_str(&decoded);
                ctx.pos = next;
                span = next;
            }
            b'$' => {
                acc.push_str(&ctx.src[span..ctx.pos]);
                match var_substitute(interp, ctx)? {
                    Some(v) => acc.push_value(v),
                    None => acc.push_str("$"),
                }
                span = ctx.pos;
            }
            b'[' => {
                acc.push_str(&ctx.src[span..ctx.pos]);
                let v = cmd_substitute(interp, ctx)?;
                acc.push_value(v);
                span = ctx.pos;
            }
            _ => ctx.pos += 1,
        }
    }
    acc.push_str(&ctx.src[span..ctx.pos]);
    Ok(acc.finish())
}

/// Scan a variable name after `$`. Returns the name's byte range, or
/// `None` when no valid name follows (the `$` is then literal).
pub(crate) fn scan_varname(
    src: &[u8],
    dollar: usize,
) -> Result<Option<(usize, usize, usize)>, ParseError> {
    let mut i = dollar + 1;
    if i < src.len() && src[i] == b'{' {
        let name_start = i + 1;
        let mut j = name_start;
        while j < src.len() && src[j] != b'}' {
            j += 1;
        }
        if j >= src.len() {
            return Err(ParseError::new(
                "missing close-brace for variable name",
                dollar,
                src.len(),
            ));
        }
        return Ok(Some((name_start, j, j + 1)));
    }
    let start = i;
    while i < src.len() {
        let b = src[i];
        if b.is_ascii_alphanumeric() || b == b'_' {
            i += 1;
        } else if b == b':' && i + 1 < src.len() && src[i + 1] == b':' {
            i += 2;
        } else {
            break;
        }
    }
    if i == start {
        return Ok(None);
    }
    Ok(Some((start, i, i)))
}

/// `$name` / `${name}`: read the variable in the current scope.
/// `Ok(None)` means the `$` did not introduce a name.
fn var_substitute(
    interp: &mut Interp,
    ctx: &mut ParseContext,
) -> Result<Option<Value>, WordFail> {
    let src = ctx.src.as_bytes();
    match scan_varname(src, ctx.pos).map_err(WordFail::Syntax)? {
        None => {
            ctx.pos += 1;
            Ok(None)
        }
        Some((start, end, next)) => {
            let name = &ctx.src[start..end];
            ctx.pos = next;
            match interp.var_get(name) {
                Ok(v) => Ok(Some(v)),
                Err(msg) => Err(WordFail::Abort(interp.error(msg))),
            }
        }
    }
}

/// `[script]`: evaluate the bracketed text in the current scope; its
/// result is the substitution's value. Any non-OK code aborts the parse
/// and propagates.
fn cmd_substitute(interp: &mut Interp, ctx: &mut ParseContext) -> Result<Value, WordFail> {
    let src = ctx.src.as_bytes();
    let open = ctx.pos;
    let close = match find_matching_bracket(src, open) {
        Some(c) => c,
        None => return Err(WordFail::Incomplete(open, src.len())),
    };
    let script = &ctx.src[open + 1..close];
    ctx.line += count_nl(script);
    let code = eval_script(interp, script);
    if code != Code::Ok {
        return Err(WordFail::Abort(code));
    }
    ctx.pos = close + 1;
    Ok(interp.result())
}

/// Find the `]` matching the `[` at `open`. Nested brackets count;
/// brackets inside braces and double quotes do not, and a backslash
/// hides the next byte everywhere.
pub fn find_matching_bracket(src: &[u8], open: usize) -> Option<usize> {
    debug_assert_eq!(src[open], b'[');
    let mut depth = 1usize;
    let mut brace_depth = 0usize;
    let mut in_quote = false;
    let mut i = open + 1;
    while i < src.len() {
        let b = src[i];
        if b == b'\\' {
            i += 2;
            continue;
        }
        if brace_depth > 0 {
            match b {
                b'{' => brace_depth += 1,
                b'}' => brace_depth -= 1,
                _ => {}
            }
            i += 1;
            continue;
        }
        if in_quote {
            if b == b'"' {
                in_quote = false;
            }
            i += 1;
            continue;
        }
        match b {
            b'{' => brace_depth = 1,
            b'"' => in_quote = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_matching_bracket() {
        let s = b"[set x [incr y]] tail";
        assert_eq!(find_matching_bracket(s, 0), Some(15));
        assert_eq!(find_matching_bracket(b"[a {]} b]", 0), Some(8));
        assert_eq!(find_matching_bracket(b"[a \"]\" b]", 0), Some(8));
        assert_eq!(find_matching_bracket(b"[a \\] b]", 0), Some(7));
        assert_eq!(find_matching_bracket(b"[never", 0), None);
    }

    #[test]
    fn test_scan_varname() {
        let (s, e, n) = scan_varname(b"$abc-", 0).unwrap().unwrap();
        assert_eq!((s, e, n), (1, 4, 4));
        let (s, e, n) = scan_varname(b"$a::b ", 0).unwrap().unwrap();
        assert_eq!((s, e, n), (1, 5, 5));
        let (s, e, n) = scan_varname(b"${a b}x", 0).unwrap().unwrap();
        assert_eq!((s, e, n), (2, 5, 6));
        assert!(scan_varname(b"$ x", 0).unwrap().is_none());
        assert!(scan_varname(b"$", 0).unwrap().is_none());
        assert!(scan_varname(b"${abc", 0).is_err());
    }

    #[test]
    fn test_varname_single_colon_stops() {
        let (s, e, _) = scan_varname(b"$a:b", 0).unwrap().unwrap();
        assert_eq!(&b"$a:b"[s..e], b"a");
    }
}
