//! Call Frames and Variables
//!
//! Frames form a push/pop stack. The *size* of the stack is its
//! physical depth; the *active level* is the frame visible as current
//! for variable resolution, temporarily redirected by `uplevel` and
//! `upvar` and restored on return.
//!
//! A variable is a direct slot, a link to a variable in another frame,
//! or a link into a namespace's persistent table. Links are stored as
//! `(target, name)` indirections resolved on access, never as owning
//! pointers, so a popped frame can never leave a dangling reference.

use indexmap::IndexMap;

use crate::interp::interp::Interp;
use crate::interp::resolver::split_qualified;
use crate::value::Value;

#[derive(Debug, Clone)]
pub enum Var {
    Scalar(Value),
    FrameLink { frame: usize, name: String },
    NsLink { ns: String, name: String },
}

pub struct Frame {
    pub vars: IndexMap<String, Var>,
    /// Absolute path of the namespace this frame executes in.
    pub ns: String,
    /// Namespace frames (the global frame, `namespace eval` bodies)
    /// fall through to the namespace's variable table for unqualified
    /// names not shadowed locally.
    pub ns_frame: bool,
    /// The command and arguments being evaluated, as a list value.
    pub invocation: Option<Value>,
    /// Lambda value for `apply`-introduced frames.
    pub lambda: Option<Value>,
    pub line: Option<usize>,
    /// Active level to restore when this frame pops.
    pub prev_active: usize,
}

impl Frame {
    pub fn new(ns: impl Into<String>, ns_frame: bool) -> Self {
        Self {
            vars: IndexMap::new(),
            ns: ns.into(),
            ns_frame,
            invocation: None,
            lambda: None,
            line: None,
            prev_active: 0,
        }
    }
}

/// Resolved write target of a variable name within a frame.
enum Target {
    Local(usize, String),
    Ns(String, String),
    Dangling,
}

impl Interp {
    /// Read a variable by possibly-qualified name in the active scope.
    pub fn var_get(&self, name: &str) -> Result<Value, String> {
        let missing = || format!("can't read \"{}\": no such variable", name);
        if let Some((ns, tail)) = split_qualified(name) {
            return self.ns_var_read(&ns, &tail).ok_or_else(missing);
        }
        self.frame_var_read(self.active, name).ok_or_else(missing)
    }

    /// Write a variable by possibly-qualified name in the active scope.
    pub fn var_set(&mut self, name: &str, value: Value) -> Result<(), String> {
        if let Some((ns, tail)) = split_qualified(name) {
            if tail.is_empty() {
                return Err(format!("can't set \"{}\": no such variable", name));
            }
            return match self.root.find_mut(&ns) {
                Some(node) => {
                    node.vars.insert(tail, Some(value));
                    Ok(())
                }
                None => Err(format!(
                    "can't set \"{}\": parent namespace doesn't exist",
                    name
                )),
            };
        }
        match self.resolve_target(self.active, name) {
            Target::Local(frame, slot) => {
                self.frames[frame].vars.insert(slot, Var::Scalar(value));
                Ok(())
            }
            Target::Ns(ns, tail) => match self.root.find_mut(&ns) {
                Some(node) => {
                    node.vars.insert(tail, Some(value));
                    Ok(())
                }
                None => Err(format!(
                    "can't set \"{}\": parent namespace doesn't exist",
                    name
                )),
            },
            Target::Dangling => Err(format!("can't set \"{}\": no such variable", name)),
        }
    }

    /// Remove a variable. Unsetting through a link removes the target;
    /// the link itself stays behind.
    pub fn var_unset(&mut self, name: &str) -> Result<(), String> {
        let missing = || format!("can't unset \"{}\": no such variable", name);
        if let Some((ns, tail)) = split_qualified(name) {
            let node = self.root.find_mut(&ns).ok_or_else(missing)?;
            return match node.vars.get(&tail) {
                Some(Some(_)) => {
                    node.vars.shift_remove(&tail);
                    Ok(())
                }
                _ => Err(missing()),
            };
        }
        match self.resolve_target(self.active, name) {
            Target::Local(frame, slot) => {
                if matches!(self.frames[frame].vars.get(&slot), Some(Var::Scalar(_))) {
                    self.frames[frame].vars.shift_remove(&slot);
                    Ok(())
                } else {
                    Err(missing())
                }
            }
            Target::Ns(ns, tail) => {
                let node = self.root.find_mut(&ns).ok_or_else(missing)?;
                match node.vars.get(&tail) {
                    Some(Some(_)) => {
                        node.vars.shift_remove(&tail);
                        Ok(())
                    }
                    _ => Err(missing()),
                }
            }
            Target::Dangling => Err(missing()),
        }
    }

    pub fn var_exists(&self, name: &str) -> bool {
        if let Some((ns, tail)) = split_qualified(name) {
            return self.ns_var_read(&ns, &tail).is_some();
        }
        self.frame_var_read(self.active, name).is_some()
    }

    /// Install `local` in the active frame as a link to `name` in the
    /// frame at absolute index `frame`. Chains flatten at creation, so
    /// every stored link points at its ultimate slot.
    pub fn link_frame_var(
        &mut self,
        local: &str,
        frame: usize,
        name: &str,
    ) -> Result<(), String> {
        let link = self.flatten_link(frame, name);
        if let Var::FrameLink { frame: tf, name: tn } = &link {
            if *tf == self.active && tn == local {
                return Err(format!(
                    "can't upvar from variable to itself (\"{}\")",
                    local
                ));
            }
        }
        self.install_link(local, link)
    }

    /// Install `local` in the active frame as a link to a namespace
    /// variable, creating the namespace if needed.
    pub fn link_ns_var(&mut self, local: &str, ns: &str, name: &str) -> Result<(), String> {
        self.root.make(ns);
        let ns = crate::interp::resolver::normalize_ns(ns);
        self.install_link(local, Var::NsLink { ns, name: name.to_string() })
    }

    fn install_link(&mut self, local: &str, link: Var) -> Result<(), String> {
        let frame = &mut self.frames[self.active];
        if let Some(Var::Scalar(_)) = frame.vars.get(local) {
            return Err(format!("variable \"{}\" already exists", local));
        }
        frame.vars.insert(local.to_string(), link);
        Ok(())
    }

    /// Push a frame, making it active. Fails when the evaluation
    /// ceiling is reached.
    pub fn push_frame(&mut self, mut frame: Frame) -> Result<(), String> {
        if self.frames.len() + self.nesting >= self.limits.max_nesting {
            return Err("too many nested evaluations".to_string());
        }
        frame.prev_active = self.active;
        self.frames.push(frame);
        self.active = self.frames.len() - 1;
        Ok(())
    }

    pub fn pop_frame(&mut self) {
        if let Some(frame) = self.frames.pop() {
            self.active = frame.prev_active.min(self.frames.len().saturating_sub(1));
        }
    }

    /// Physical depth of the stack.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// The frame index visible as current.
    pub fn active_level(&self) -> usize {
        self.active
    }

    /// Interpret a level spec: `#N` is an absolute frame index, a bare
    /// integer is relative to the active frame.
    pub fn parse_level(&self, spec: &str) -> Result<usize, String> {
        let bad = || format!("bad level \"{}\"", spec);
        if let Some(abs) = spec.strip_prefix('#') {
            let n: usize = abs.parse().map_err(|_| bad())?;
            if n > self.active {
                return Err(bad());
            }
            return Ok(n);
        }
        let n: usize = spec.parse().map_err(|_| bad())?;
        self.active.checked_sub(n).ok_or_else(bad)
    }

    /// Namespace the active frame executes in.
    pub fn current_ns(&self) -> String {
        self.frames[self.active].ns.clone()
    }

    // ------------------------------------------------------------------
    // Internal resolution
    // ------------------------------------------------------------------

    fn ns_var_read(&self, ns: &str, name: &str) -> Option<Value> {
        self.root.find(ns)?.vars.get(name)?.clone()
    }

    pub(crate) fn frame_var_read(&self, idx: usize, name: &str) -> Option<Value> {
        let frame = self.frames.get(idx)?;
        match frame.vars.get(name) {
            Some(Var::Scalar(v)) => Some(v.clone()),
            Some(Var::FrameLink { frame: f, name: n }) => self.frame_var_read(*f, n),
            Some(Var::NsLink { ns, name: n }) => self.ns_var_read(ns, n),
            None => {
                if frame.ns_frame {
                    self.ns_var_read(&frame.ns, name)
                } else {
                    None
                }
            }
        }
    }

    /// Resolve where a write to `name` in frame `idx` lands.
    fn resolve_target(&self, idx: usize, name: &str) -> Target {
        let Some(frame) = self.frames.get(idx) else {
            return Target::Dangling;
        };
        match frame.vars.get(name) {
            Some(Var::Scalar(_)) => Target::Local(idx, name.to_string()),
            Some(Var::FrameLink { frame: f, name: n }) => self.resolve_target(*f, n),
            Some(Var::NsLink { ns, name: n }) => Target::Ns(ns.clone(), n.clone()),
            None => {
                if frame.ns_frame {
                    Target::Ns(frame.ns.clone(), name.to_string())
                } else {
                    Target::Local(idx, name.to_string())
                }
            }
        }
    }

    /// Flatten a link chain starting at (frame, name) to its ultimate
    /// slot, so stored links are always one hop.
    fn flatten_link(&self, frame: usize, name: &str) -> Var {
        match self.frames.get(frame).and_then(|f| f.vars.get(name)) {
            Some(Var::FrameLink { frame: f, name: n }) => self.flatten_link(*f, n),
            Some(Var::NsLink { ns, name: n }) => {
                Var::NsLink { ns: ns.clone(), name: n.clone() }
            }
            _ => Var::FrameLink { frame, name: name.to_string() },
        }
    }

    /// Variable names visible in the frame at `idx`.
    pub fn frame_var_names(&self, idx: usize) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        if let Some(frame) = self.frames.get(idx) {
            names.extend(frame.vars.keys().cloned());
            if frame.ns_frame {
                if let Some(node) = self.root.find(&frame.ns) {
                    for (k, v) in &node.vars {
                        if v.is_some() && !frame.vars.contains_key(k) {
                            names.push(k.clone());
                        }
                    }
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_global_frame_vars_are_namespace_vars() {
        let mut interp = Interp::new();
        interp.var_set("x", Value::int(1)).unwrap();
        assert_eq!(interp.var_get("x").unwrap().as_str(), "1");
        assert_eq!(interp.var_get("::x").unwrap().as_str(), "1");
    }

    #[test]
    fn test_proc_frame_vars_are_local() {
        let mut interp = Interp::new();
        interp.push_frame(Frame::new("::", false)).unwrap();
        interp.var_set("x", Value::int(5)).unwrap();
        assert!(interp.var_get("::x").is_err());
        interp.pop_frame();
        assert!(!interp.var_exists("x"));
    }

    #[test]
    fn test_frame_link_reads_and_writes_target() {
        let mut interp = Interp::new();
        interp.push_frame(Frame::new("::", false)).unwrap();
        interp.var_set("x", Value::int(1)).unwrap();
        interp.push_frame(Frame::new("::", false)).unwrap();
        interp.link_frame_var("y", 1, "x").unwrap();
        assert_eq!(interp.var_get("y").unwrap().as_str(), "1");
        interp.var_set("y", Value::int(2)).unwrap();
        interp.pop_frame();
        assert_eq!(interp.var_get("x").unwrap().as_str(), "2");
    }

    #[test]
    fn test_link_to_missing_var_creates_on_write() {
        let mut interp = Interp::new();
        interp.push_frame(Frame::new("::", false)).unwrap();
        interp.push_frame(Frame::new("::", false)).unwrap();
        interp.link_frame_var("y", 1, "fresh").unwrap();
        assert!(interp.var_get("y").is_err());
        interp.var_set("y", Value::int(9)).unwrap();
        interp.pop_frame();
        assert_eq!(interp.var_get("fresh").unwrap().as_str(), "9");
    }

    #[test]
    fn test_self_link_rejected() {
        let mut interp = Interp::new();
        interp.push_frame(Frame::new("::", false)).unwrap();
        let err = interp
            .link_frame_var("x", interp.active_level(), "x")
            .unwrap_err();
        assert!(err.contains("can't upvar"));
    }

    #[test]
    fn test_link_chains_flatten() {
        let mut interp = Interp::new();
        interp.push_frame(Frame::new("::", false)).unwrap();
        interp.var_set("x", Value::int(7)).unwrap();
        interp.push_frame(Frame::new("::", false)).unwrap();
        interp.link_frame_var("y", 1, "x").unwrap();
        interp.push_frame(Frame::new("::", false)).unwrap();
        interp.link_frame_var("z", 2, "y").unwrap();
        match interp.frames[3].vars.get("z") {
            Some(Var::FrameLink { frame, name }) => {
                assert_eq!((*frame, name.as_str()), (1, "x"));
            }
            other => panic!("expected flattened frame link, got {:?}", other),
        }
        assert_eq!(interp.var_get("z").unwrap().as_str(), "7");
    }

    #[test]
    fn test_ns_link() {
        let mut interp = Interp::new();
        interp.push_frame(Frame::new("::", false)).unwrap();
        interp.link_ns_var("v", "::app", "v").unwrap();
        interp.var_set("v", Value::string("hi")).unwrap();
        assert_eq!(interp.var_get("::app::v").unwrap().as_str(), "hi");
    }

    #[test]
    fn test_unset_through_link_keeps_link() {
        let mut interp = Interp::new();
        interp.push_frame(Frame::new("::", false)).unwrap();
        interp.var_set("x", Value::int(1)).unwrap();
        interp.push_frame(Frame::new("::", false)).unwrap();
        interp.link_frame_var("y", 1, "x").unwrap();
        interp.var_unset("y").unwrap();
        assert!(interp.var_get("y").is_err());
        interp.var_set("y", Value::int(3)).unwrap();
        interp.pop_frame();
        assert_eq!(interp.var_get("x").unwrap().as_str(), "3");
    }

    #[test]
    fn test_parse_level_forms() {
        let mut interp = Interp::new();
        interp.push_frame(Frame::new("::", false)).unwrap();
        interp.push_frame(Frame::new("::", false)).unwrap();
        assert_eq!(interp.parse_level("1").unwrap(), 1);
        assert_eq!(interp.parse_level("2").unwrap(), 0);
        assert_eq!(interp.parse_level("#0").unwrap(), 0);
        assert_eq!(interp.parse_level("#2").unwrap(), 2);
        assert!(interp.parse_level("3").is_err());
        assert!(interp.parse_level("#9").is_err());
        assert!(interp.parse_level("up").is_err());
    }
}
