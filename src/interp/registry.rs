//! Command Registry
//!
//! Each namespace owns a unified name -> entry table holding builtins
//! and user procedures alike. Canonical names as stored are always
//! absolute. Rename can re-home an entry across namespaces; renaming to
//! the empty string deletes.

use crate::interp::interp::Interp;
use crate::interp::resolver::{normalize_ns, qualify, split_qualified};
use crate::interp::Code;
use crate::value::Value;

/// A native command implementation.
pub type BuiltinFn = fn(&mut Interp, &[Value]) -> Code;

#[derive(Clone)]
pub enum CommandKind {
    Builtin(BuiltinFn),
    Proc { params: Value, body: Value },
}

#[derive(Clone)]
pub struct CommandEntry {
    /// Canonical absolute name, always starting with `::`.
    pub name: String,
    pub kind: CommandKind,
}

impl CommandEntry {
    pub fn is_proc(&self) -> bool {
        matches!(self.kind, CommandKind::Proc { .. })
    }
}

impl Interp {
    /// Register a native command. Unqualified names land in the current
    /// namespace; qualified names create their namespace as needed.
    pub fn register(&mut self, name: &str, f: BuiltinFn) {
        let (ns, tail) = self.registration_target(name);
        let canonical = qualify(&ns, &tail);
        let node = self.root.make(&ns);
        node.commands
            .insert(tail, CommandEntry { name: canonical, kind: CommandKind::Builtin(f) });
    }

    /// Define (or redefine) a procedure. Returns its canonical name.
    pub fn define_proc(
        &mut self,
        name: &str,
        params: Value,
        body: Value,
    ) -> Result<String, String> {
        let (ns, tail) = self.registration_target(name);
        if tail.is_empty() {
            return Err(format!("bad proc name \"{}\"", name));
        }
        let canonical = qualify(&ns, &tail);
        let node = self.root.make(&ns);
        node.commands.insert(
            tail,
            CommandEntry { name: canonical.clone(), kind: CommandKind::Proc { params, body } },
        );
        Ok(canonical)
    }

    /// Resolve a command name: qualified names look only in the named
    /// namespace; unqualified names try the current namespace, then the
    /// global one.
    pub fn find_command(&self, name: &str) -> Option<CommandEntry> {
        if let Some((ns, tail)) = split_qualified(name) {
            return self.root.find(&ns)?.commands.get(&tail).cloned();
        }
        let current = self.current_ns();
        if current != "::" {
            if let Some(node) = self.root.find(&current) {
                if let Some(entry) = node.commands.get(name) {
                    return Some(entry.clone());
                }
            }
        }
        self.root.commands.get(name).cloned()
    }

    /// Rename `old` to `new`, re-homing across namespaces when the new
    /// name is qualified. An empty `new` deletes the command.
    pub fn rename_command(&mut self, old: &str, new: &str) -> Result<(), String> {
        let (old_ns, old_tail) = self.lookup_target(old);
        let exists = self
            .root
            .find(&old_ns)
            .map_or(false, |n| n.commands.contains_key(&old_tail));
        if !exists {
            return Err(format!(
                "can't rename \"{}\": command doesn't exist",
                old
            ));
        }
        if new.is_empty() {
            let node = self.root.find_mut(&old_ns).expect("checked above");
            node.commands.shift_remove(&old_tail);
            return Ok(());
        }
        let (new_ns, new_tail) = self.registration_target(new);
        if new_tail.is_empty() {
            return Err(format!("can't rename to \"{}\": bad command name", new));
        }
        let taken = self
            .root
            .find(&new_ns)
            .map_or(false, |n| n.commands.contains_key(&new_tail));
        if taken {
            return Err(format!(
                "can't rename to \"{}\": command already exists",
                new
            ));
        }
        let mut entry = {
            let node = self.root.find_mut(&old_ns).expect("checked above");
            node.commands.shift_remove(&old_tail).expect("checked above")
        };
        entry.name = qualify(&new_ns, &new_tail);
        self.root.make(&new_ns).commands.insert(new_tail, entry);
        Ok(())
    }

    /// Remove a command by name. Returns whether it existed.
    pub fn delete_command(&mut self, name: &str) -> bool {
        let (ns, tail) = self.lookup_target(name);
        match self.root.find_mut(&ns) {
            Some(node) => node.commands.shift_remove(&tail).is_some(),
            None => false,
        }
    }

    /// Command names in the given namespace (`None` means current).
    pub fn command_names(&self, ns: Option<&str>) -> Vec<String> {
        let path = ns.map_or_else(|| self.current_ns(), normalize_ns);
        match self.root.find(&path) {
            Some(node) => node.commands.keys().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Where a registration by this name goes: `(namespace, tail)`.
    fn registration_target(&self, name: &str) -> (String, String) {
        match split_qualified(name) {
            Some((ns, tail)) => (ns, tail),
            None => (self.current_ns(), name.to_string()),
        }
    }

    /// Where a lookup by this name resolves, mirroring `find_command`'s
    /// order but yielding the location.
    fn lookup_target(&self, name: &str) -> (String, String) {
        if let Some((ns, tail)) = split_qualified(name) {
            return (ns, tail);
        }
        let current = self.current_ns();
        if current != "::" {
            if let Some(node) = self.root.find(&current) {
                if node.commands.contains_key(name) {
                    return (current, name.to_string());
                }
            }
        }
        ("::".to_string(), name.to_string())
    }
}
