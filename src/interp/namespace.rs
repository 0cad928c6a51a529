//! Namespaces
//!
//! A tree of nodes rooted at `::`, each holding persistent variables,
//! a command table, export patterns, and children. Creation is lazy:
//! making `::a::b::c` creates any missing ancestors. Deletion removes
//! the whole subtree with its variables and commands.

use indexmap::IndexMap;

use crate::interp::registry::CommandEntry;
use crate::interp::resolver::normalize_ns;
use crate::value::Value;

pub struct Namespace {
    /// Absolute path, `::` for the root.
    pub path: String,
    /// Persistent variables; `None` marks declared-but-unset.
    pub vars: IndexMap<String, Option<Value>>,
    pub commands: IndexMap<String, CommandEntry>,
    /// Glob-style export patterns, in declaration order.
    pub exports: Vec<String>,
    pub children: IndexMap<String, Namespace>,
}

impl Namespace {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            vars: IndexMap::new(),
            commands: IndexMap::new(),
            exports: Vec::new(),
            children: IndexMap::new(),
        }
    }

    /// Walk to a descendant by absolute path.
    pub fn find(&self, path: &str) -> Option<&Namespace> {
        let norm = normalize_ns(path);
        let mut node = self;
        for seg in norm.split("::").filter(|s| !s.is_empty()) {
            node = node.children.get(seg)?;
        }
        Some(node)
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut Namespace> {
        let norm = normalize_ns(path);
        let mut node = self;
        for seg in norm.split("::").filter(|s| !s.is_empty()) {
            node = node.children.get_mut(seg)?;
        }
        Some(node)
    }

    /// Walk to a descendant, creating missing nodes along the way.
    pub fn make(&mut self, path: &str) -> &mut Namespace {
        let norm = normalize_ns(path);
        let mut node = self;
        for seg in norm.split("::").filter(|s| !s.is_empty()) {
            let child_path = if node.path == "::" {
                format!("::{}", seg)
            } else {
                format!("{}::{}", node.path, seg)
            };
            node = node
                .children
                .entry(seg.to_string())
                .or_insert_with(|| Namespace::new(child_path));
        }
        node
    }

    /// Remove the descendant named by `path` and its whole subtree.
    /// The root itself cannot be removed.
    pub fn remove(&mut self, path: &str) -> bool {
        let norm = normalize_ns(path);
        let segs: Vec<&str> = norm.split("::").filter(|s| !s.is_empty()).collect();
        let Some((last, parents)) = segs.split_last() else {
            return false;
        };
        let mut node = self;
        for seg in parents {
            match node.children.get_mut(*seg) {
                Some(n) => node = n,
                None => return false,
            }
        }
        node.children.shift_remove(*last).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_creation() {
        let mut root = Namespace::new("::");
        root.make("::a::b::c");
        assert!(root.find("::a").is_some());
        assert!(root.find("::a::b").is_some());
        assert_eq!(root.find("::a::b::c").unwrap().path, "::a::b::c");
        assert!(root.find("::a::x").is_none());
    }

    #[test]
    fn test_find_root() {
        let root = Namespace::new("::");
        assert_eq!(root.find("::").unwrap().path, "::");
    }

    #[test]
    fn test_remove_subtree() {
        let mut root = Namespace::new("::");
        root.make("::a::b");
        root.make("::a::c");
        assert!(root.remove("::a::b"));
        assert!(root.find("::a::b").is_none());
        assert!(root.find("::a::c").is_some());
        assert!(root.remove("::a"));
        assert!(root.find("::a").is_none());
        assert!(!root.remove("::"));
    }
}
