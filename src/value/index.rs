//! Index Arithmetic
//!
//! Shared parsing of the index forms accepted wherever lists and
//! strings are indexed: `N`, `N+M`, `N-M`, `end`, `end+M`, `end-M`.
//! The result may lie outside `0..len`; callers clamp or reject as
//! their operation requires.

/// Resolve an index expression against a collection of length `len`.
pub fn parse_index(spec: &str, len: usize) -> Result<i64, String> {
    let err = || {
        format!(
            "bad index \"{}\": must be integer?[+-]integer? or end?[+-]integer?",
            spec
        )
    };
    let t = spec.trim_matches(|c: char| c.is_ascii_whitespace());
    if t.is_empty() {
        return Err(err());
    }
    let end = len as i64 - 1;

    if let Some(rest) = t.strip_prefix("end") {
        if rest.is_empty() {
            return Ok(end);
        }
        let (sign, digits) = match rest.as_bytes()[0] {
            b'+' => (1i64, &rest[1..]),
            b'-' => (-1i64, &rest[1..]),
            _ => return Err(err()),
        };
        let n: i64 = digits.parse().map_err(|_| err())?;
        return Ok(end + sign * n);
    }

    // N, or N+M / N-M with the sign separating two integers. A leading
    // sign belongs to the first integer.
    let bytes = t.as_bytes();
    let first_end = {
        let mut i = 0;
        if matches!(bytes[0], b'+' | b'-') {
            i = 1;
        }
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };
    if first_end == 0 || (first_end == 1 && !bytes[0].is_ascii_digit()) {
        return Err(err());
    }
    let base: i64 = t[..first_end].parse().map_err(|_| err())?;
    if first_end == t.len() {
        return Ok(base);
    }
    let (sign, digits) = match bytes[first_end] {
        b'+' => (1i64, &t[first_end + 1..]),
        b'-' => (-1i64, &t[first_end + 1..]),
        _ => return Err(err()),
    };
    let n: i64 = digits.parse().map_err(|_| err())?;
    Ok(base + sign * n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain() {
        assert_eq!(parse_index("0", 5).unwrap(), 0);
        assert_eq!(parse_index("4", 5).unwrap(), 4);
        assert_eq!(parse_index("-1", 5).unwrap(), -1);
        assert_eq!(parse_index("9", 5).unwrap(), 9);
    }

    #[test]
    fn test_end_forms() {
        assert_eq!(parse_index("end", 5).unwrap(), 4);
        assert_eq!(parse_index("end-1", 5).unwrap(), 3);
        assert_eq!(parse_index("end+2", 5).unwrap(), 6);
        assert_eq!(parse_index("end", 0).unwrap(), -1);
    }

    #[test]
    fn test_arithmetic_forms() {
        assert_eq!(parse_index("1+2", 5).unwrap(), 3);
        assert_eq!(parse_index("3-1", 5).unwrap(), 2);
        assert_eq!(parse_index("-1+4", 5).unwrap(), 3);
    }

    #[test]
    fn test_rejects() {
        assert!(parse_index("abc", 5).is_err());
        assert!(parse_index("end*2", 5).is_err());
        assert!(parse_index("1+", 5).is_err());
        assert!(parse_index("", 5).is_err());
        assert!(parse_index("+", 5).is_err());
    }
}
