//! Name Resolution
//!
//! Splitting and canonicalizing the `::`-qualified names used for both
//! commands and variables. A qualified name splits at its *last* `::`:
//! the prefix names the namespace (made absolute if it is not), the
//! remainder is the simple tail. Canonical names always begin with `::`.

/// True when the name contains a `::` qualifier anywhere.
pub fn is_qualified(name: &str) -> bool {
    name.contains("::")
}

/// Normalize a namespace path to absolute form: `a::b` becomes
/// `::a::b`, empty and `::` become `::`. Redundant separators collapse.
pub fn normalize_ns(path: &str) -> String {
    let mut out = String::from("::");
    for seg in path.split("::").filter(|s| !s.is_empty()) {
        if out.len() > 2 {
            out.push_str("::");
        }
        out.push_str(seg);
    }
    out
}

/// Split a qualified name into `(absolute namespace, tail)`. Returns
/// `None` for unqualified names. The tail may be empty (`::a::`), which
/// callers reject where a simple name is required.
pub fn split_qualified(name: &str) -> Option<(String, String)> {
    let idx = name.rfind("::")?;
    let prefix = &name[..idx];
    let tail = &name[idx + 2..];
    Some((normalize_ns(prefix), tail.to_string()))
}

/// The canonical absolute name of `tail` defined inside `ns`.
pub fn qualify(ns: &str, tail: &str) -> String {
    if ns == "::" {
        format!("::{}", tail)
    } else {
        format!("{}::{}", ns, tail)
    }
}

/// The namespace component of a canonical absolute name.
pub fn namespace_of(canonical: &str) -> String {
    match split_qualified(canonical) {
        Some((ns, _)) => ns,
        None => "::".to_string(),
    }
}

/// The simple tail of a possibly-qualified name.
pub fn tail_of(name: &str) -> &str {
    match name.rfind("::") {
        Some(idx) => &name[idx + 2..],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_ns(""), "::");
        assert_eq!(normalize_ns("::"), "::");
        assert_eq!(normalize_ns("a"), "::a");
        assert_eq!(normalize_ns("a::b"), "::a::b");
        assert_eq!(normalize_ns("::a::b"), "::a::b");
        assert_eq!(normalize_ns("::::a"), "::a");
    }

    #[test]
    fn test_split() {
        assert_eq!(split_qualified("x"), None);
        assert_eq!(
            split_qualified("::x"),
            Some(("::".to_string(), "x".to_string()))
        );
        assert_eq!(
            split_qualified("a::b"),
            Some(("::a".to_string(), "b".to_string()))
        );
        assert_eq!(
            split_qualified("::a::b::c"),
            Some(("::a::b".to_string(), "c".to_string()))
        );
        assert_eq!(
            split_qualified("::a::"),
            Some(("::a".to_string(), "".to_string()))
        );
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("::", "set"), "::set");
        assert_eq!(qualify("::a", "b"), "::a::b");
        assert_eq!(namespace_of("::a::b"), "::a");
        assert_eq!(namespace_of("::b"), "::");
        assert_eq!(tail_of("::a::b"), "b");
        assert_eq!(tail_of("b"), "b");
    }
}
