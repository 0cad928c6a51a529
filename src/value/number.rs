//! Numeric Conversions
//!
//! String <-> number conversions with the radix prefixes and boolean
//! words the command language accepts. All integers are signed 64-bit;
//! all floating point is IEEE-754 binary64.

/// Parse a signed 64-bit integer. Accepts optional surrounding
/// whitespace, a sign, and the radix prefixes `0x`/`0X`, `0o`/`0O`,
/// `0b`/`0B`. Plain leading zeros are decimal.
pub fn parse_int(s: &str) -> Result<i64, String> {
    let err = || format!("expected integer but got \"{}\"", s);
    let t = s.trim_matches(|c: char| c.is_ascii_whitespace());
    if t.is_empty() {
        return Err(err());
    }
    let (neg, rest) = match t.as_bytes()[0] {
        b'+' => (false, &t[1..]),
        b'-' => (true, &t[1..]),
        _ => (false, t),
    };
    let (radix, digits) = if rest.len() > 2 {
        match &rest[..2] {
            "0x" | "0X" => (16, &rest[2..]),
            "0o" | "0O" => (8, &rest[2..]),
            "0b" | "0B" => (2, &rest[2..]),
            _ => (10, rest),
        }
    } else {
        (10, rest)
    };
    if digits.is_empty() {
        return Err(err());
    }
    let mag = u64::from_str_radix(digits, radix).map_err(|_| err())?;
    if neg {
        if mag > i64::MAX as u64 + 1 {
            return Err(format!("integer value too large to represent: \"{}\"", s));
        }
        Ok((mag as i128).wrapping_neg() as i64)
    } else {
        if mag > i64::MAX as u64 {
            return Err(format!("integer value too large to represent: \"{}\"", s));
        }
        Ok(mag as i64)
    }
}

/// Parse a double. `Inf`, `-Inf` and `NaN` are accepted in any case.
pub fn parse_double(s: &str) -> Result<f64, String> {
    let t = s.trim_matches(|c: char| c.is_ascii_whitespace());
    if t.is_empty() {
        return Err(format!("expected floating-point number but got \"{}\"", s));
    }
    t.parse::<f64>()
        .map_err(|_| format!("expected floating-point number but got \"{}\"", s))
}

/// Parse a boolean: the words true/false/yes/no/on/off (any case) or
/// any numeric value (nonzero is true).
pub fn parse_bool(s: &str) -> Result<bool, String> {
    let t = s.trim_matches(|c: char| c.is_ascii_whitespace());
    match t.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => return Ok(true),
        "0" | "false" | "no" | "off" => return Ok(false),
        _ => {}
    }
    if let Ok(i) = parse_int(t) {
        return Ok(i != 0);
    }
    if let Ok(d) = parse_double(t) {
        return Ok(d != 0.0);
    }
    Err(format!("expected boolean value but got \"{}\"", s))
}

/// Format a double so it reads back as a double: a fractionless finite
/// value gets a trailing `.0`, very large and very small magnitudes use
/// exponent form with an explicit sign.
pub fn format_double(d: f64) -> String {
    if d.is_nan() {
        return "NaN".to_string();
    }
    if d.is_infinite() {
        return if d > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }
    let abs = d.abs();
    if abs != 0.0 && !(1e-4..1e17).contains(&abs) {
        let s = format!("{:e}", d);
        // Rust writes "1e30"; normalize to "1e+30".
        if let Some(epos) = s.find('e') {
            let (mant, exp) = s.split_at(epos);
            let exp = &exp[1..];
            if exp.starts_with('-') {
                return format!("{}e-{}", mant, &exp[1..]);
            }
            return format!("{}e+{}", mant, exp);
        }
        return s;
    }
    let s = format!("{}", d);
    if s.contains('.') || s.contains('e') {
        s
    } else {
        format!("{}.0", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_radixes() {
        assert_eq!(parse_int("42").unwrap(), 42);
        assert_eq!(parse_int("-42").unwrap(), -42);
        assert_eq!(parse_int("+7").unwrap(), 7);
        assert_eq!(parse_int("0xff").unwrap(), 255);
        assert_eq!(parse_int("0o17").unwrap(), 15);
        assert_eq!(parse_int("0b101").unwrap(), 5);
        assert_eq!(parse_int("007").unwrap(), 7);
    }

    #[test]
    fn test_parse_int_extremes() {
        assert_eq!(parse_int("9223372036854775807").unwrap(), i64::MAX);
        assert_eq!(parse_int("-9223372036854775808").unwrap(), i64::MIN);
        assert!(parse_int("9223372036854775808").is_err());
    }

    #[test]
    fn test_parse_int_rejects() {
        assert!(parse_int("").is_err());
        assert!(parse_int("12ab").is_err());
        assert!(parse_int("1.5").is_err());
        assert!(parse_int("0x").is_err());
    }

    #[test]
    fn test_parse_double() {
        assert_eq!(parse_double("2.5").unwrap(), 2.5);
        assert_eq!(parse_double("1e3").unwrap(), 1000.0);
        assert!(parse_double("inf").unwrap().is_infinite());
        assert!(parse_double("NaN").unwrap().is_nan());
        assert!(parse_double("abc").is_err());
    }

    #[test]
    fn test_format_double() {
        assert_eq!(format_double(1.0), "1.0");
        assert_eq!(format_double(2.5), "2.5");
        assert_eq!(format_double(-0.25), "-0.25");
        assert_eq!(format_double(f64::INFINITY), "Inf");
        assert_eq!(format_double(1e30), "1e+30");
        assert_eq!(format_double(1e-30), "1e-30");
    }
}
