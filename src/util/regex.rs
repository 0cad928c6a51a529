//! Regex Matching
//!
//! Thin wrapper over `regex-lite` for `switch -regexp` and
//! `lsearch -regexp`: compile with optional case folding and report
//! capture groups with character ranges, the shape `-matchvar` and
//! `-indexvar` expose to scripts.

use regex_lite::Regex;

/// One capture: the matched text and its inclusive character range,
/// `("", (-1, -1))` for a group that did not participate.
pub type Capture = (String, (i64, i64));

pub fn compile(pattern: &str, nocase: bool) -> Result<Regex, String> {
    let source = if nocase {
        format!("(?i){}", pattern)
    } else {
        pattern.to_string()
    };
    Regex::new(&source)
        .map_err(|e| format!("couldn't compile regular expression pattern: {}", e))
}

/// Match and collect captures. `Ok(None)` means no match.
pub fn match_captures(
    pattern: &str,
    text: &str,
    nocase: bool,
) -> Result<Option<Vec<Capture>>, String> {
    let re = compile(pattern, nocase)?;
    let Some(caps) = re.captures(text) else {
        return Ok(None);
    };
    let mut out = Vec::with_capacity(caps.len());
    for i in 0..caps.len() {
        match caps.get(i) {
            Some(m) => {
                let start = text[..m.start()].chars().count() as i64;
                let len = m.as_str().chars().count() as i64;
                out.push((m.as_str().to_string(), (start, start + len - 1)));
            }
            None => out.push((String::new(), (-1, -1))),
        }
    }
    Ok(Some(out))
}

/// Boolean match.
pub fn is_match(pattern: &str, text: &str, nocase: bool) -> Result<bool, String> {
    Ok(compile(pattern, nocase)?.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_match() {
        assert!(is_match("^a+b$", "aaab", false).unwrap());
        assert!(!is_match("^a+b$", "ba", false).unwrap());
        assert!(is_match("ABC", "xabcx", true).unwrap());
    }

    #[test]
    fn test_captures() {
        let caps = match_captures("^([a-z]+)([0-9]+)$", "ab12", false)
            .unwrap()
            .unwrap();
        assert_eq!(caps[0].0, "ab12");
        assert_eq!(caps[1].0, "ab");
        assert_eq!(caps[2].0, "12");
        assert_eq!(caps[1].1, (0, 1));
        assert_eq!(caps[2].1, (2, 3));
    }

    #[test]
    fn test_unmatched_group() {
        let caps = match_captures("(a)|(b)", "b", false).unwrap().unwrap();
        assert_eq!(caps[1], (String::new(), (-1, -1)));
        assert_eq!(caps[2].0, "b");
    }

    #[test]
    fn test_bad_pattern() {
        assert!(is_match("(unclosed", "x", false).is_err());
    }
}
