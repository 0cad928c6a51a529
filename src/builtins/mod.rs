//! Builtin commands
//!
//! Registration of the builtin command set into a fresh interpreter.
//! Everything here is a client of the core: each command receives its
//! argument values unparsed and decides itself what to evaluate.

use std::collections::HashMap;

use crate::interp::registry::BuiltinFn;
use crate::interp::Interp;

pub mod control;
pub mod dict_cmds;
pub mod eval_cmds;
pub mod exceptions;
pub mod expr_cmd;
pub mod list_cmds;
pub mod ns_cmds;
pub mod proc_cmds;
pub mod string_cmds;
pub mod var_cmds;

lazy_static::lazy_static! {
    static ref BUILTINS: HashMap<&'static str, BuiltinFn> = {
        let mut m: HashMap<&'static str, BuiltinFn> = HashMap::new();
        // Control flow
        m.insert("if", control::cmd_if as BuiltinFn);
        m.insert("while", control::cmd_while);
        m.insert("for", control::cmd_for);
        m.insert("foreach", control::cmd_foreach);
        m.insert("lmap", control::cmd_lmap);
        m.insert("break", control::cmd_break);
        m.insert("continue", control::cmd_continue);
        m.insert("switch", control::cmd_switch);
        // Exceptions
        m.insert("error", exceptions::cmd_error);
        m.insert("throw", exceptions::cmd_throw);
        m.insert("catch", exceptions::cmd_catch);
        m.insert("return", exceptions::cmd_return);
        m.insert("try", exceptions::cmd_try);
        // Script re-entry
        m.insert("eval", eval_cmds::cmd_eval);
        m.insert("uplevel", eval_cmds::cmd_uplevel);
        m.insert("subst", eval_cmds::cmd_subst);
        m.insert("apply", eval_cmds::cmd_apply);
        m.insert("tailcall", eval_cmds::cmd_tailcall);
        // Variables
        m.insert("set", var_cmds::cmd_set);
        m.insert("unset", var_cmds::cmd_unset);
        m.insert("incr", var_cmds::cmd_incr);
        m.insert("append", var_cmds::cmd_append);
        m.insert("upvar", var_cmds::cmd_upvar);
        m.insert("global", var_cmds::cmd_global);
        m.insert("variable", var_cmds::cmd_variable);
        // Lists
        m.insert("list", list_cmds::cmd_list);
        m.insert("llength", list_cmds::cmd_llength);
        m.insert("lindex", list_cmds::cmd_lindex);
        m.insert("lrange", list_cmds::cmd_lrange);
        m.insert("lappend", list_cmds::cmd_lappend);
        m.insert("linsert", list_cmds::cmd_linsert);
        m.insert("lreplace", list_cmds::cmd_lreplace);
        m.insert("lset", list_cmds::cmd_lset);
        m.insert("lreverse", list_cmds::cmd_lreverse);
        m.insert("lsearch", list_cmds::cmd_lsearch);
        m.insert("lsort", list_cmds::cmd_lsort);
        m.insert("concat", list_cmds::cmd_concat);
        m.insert("join", list_cmds::cmd_join);
        m.insert("split", list_cmds::cmd_split);
        // Dictionaries
        m.insert("dict", dict_cmds::cmd_dict);
        // Strings
        m.insert("string", string_cmds::cmd_string);
        m.insert("format", string_cmds::cmd_format);
        // Math
        m.insert("expr", expr_cmd::cmd_expr);
        // Procedures and introspection
        m.insert("proc", proc_cmds::cmd_proc);
        m.insert("rename", proc_cmds::cmd_rename);
        m.insert("info", proc_cmds::cmd_info);
        // Namespaces
        m.insert("namespace", ns_cmds::cmd_namespace);
        m
    };
}

/// Register every builtin into the interpreter's global namespace.
pub fn register_all(interp: &mut Interp) {
    for (name, f) in BUILTINS.iter() {
        interp.register(name, *f);
    }
}
