//! Tcl Environment
//!
//! Main entry point for embedding the interpreter. Ties together the
//! parser, evaluator, and builtin set behind a one-call facade: build a
//! `Tcl`, feed it scripts, read back `TclOutcome`s.

use crate::interp::{Code, EvalLimits, Interp};
use crate::value::Value;

/// Options for creating a Tcl environment.
#[derive(Default)]
pub struct TclOptions {
    /// Evaluation limits (recursion ceiling).
    pub limits: Option<EvalLimits>,
}

/// What one script evaluation produced.
#[derive(Debug, Clone)]
pub struct TclOutcome {
    pub result: String,
    pub code: Code,
    /// Stack trace for errors, from the `-errorinfo` return option.
    pub error_info: Option<String>,
}

impl TclOutcome {
    /// True when the failure was an unterminated brace, quote, or
    /// bracket; an interactive caller should read more input and try
    /// again with the longer script.
    pub fn is_incomplete(&self) -> bool {
        if self.code != Code::Error {
            return false;
        }
        Value::string(self.result.clone())
            .as_list()
            .map_or(false, |items| {
                items.len() == 3 && items[0].as_str() == "INCOMPLETE"
            })
    }
}

/// The main Tcl environment.
pub struct Tcl {
    interp: Interp,
}

impl Tcl {
    /// Create a new environment with all builtins registered.
    pub fn new(options: TclOptions) -> Self {
        let limits = options.limits.unwrap_or_default();
        Self { interp: Interp::with_limits(limits) }
    }

    /// Evaluate a script at top level.
    pub fn eval(&mut self, script: &str) -> TclOutcome {
        let code = self.interp.eval(script);
        let code = match code {
            // A top-level `return` simply ends the script with its value.
            Code::Return => Code::Ok,
            Code::Break => self.interp.error("invoked \"break\" outside of a loop"),
            Code::Continue => self.interp.error("invoked \"continue\" outside of a loop"),
            other => other,
        };
        let error_info = if code == Code::Error {
            let opts = self.interp.return_options(code);
            opts.as_dict()
                .ok()
                .and_then(|d| d.get("-errorinfo").map(|v| v.as_str().to_string()))
        } else {
            None
        };
        TclOutcome {
            result: self.interp.result().as_str().to_string(),
            code,
            error_info,
        }
    }

    /// Direct access to the interpreter, for registering host commands
    /// and reaching values beyond their string forms.
    pub fn interp(&mut self) -> &mut Interp {
        &mut self.interp
    }
}

impl Default for Tcl {
    fn default() -> Self {
        Self::new(TclOptions::default())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn run(script: &str) -> String {
        Tcl::default().eval(script).result
    }

    fn run_code(script: &str) -> (String, Code) {
        let outcome = Tcl::default().eval(script);
        (outcome.result, outcome.code)
    }

    // ------------------------------------------------------------------
    // End-to-end scenarios
    // ------------------------------------------------------------------

    #[test]
    fn test_arithmetic_across_commands() {
        let (r, c) = run_code("set a 1; set b 2; expr {$a + $b}");
        assert_eq!((r.as_str(), c), ("3", Code::Ok));
    }

    #[test]
    fn test_proc_defaults_and_rest() {
        let (r, c) =
            run_code("proc f {x {y 10} args} { return [list $x $y $args] } ; f 1");
        assert_eq!((r.as_str(), c), ("1 10 {}", Code::Ok));
        let (r, c) =
            run_code("proc f {x {y 10} args} { return [list $x $y $args] } ; f 1 2 3 4");
        assert_eq!((r.as_str(), c), ("1 2 {3 4}", Code::Ok));
    }

    #[test]
    fn test_foreach_lappend() {
        let (r, c) = run_code("set L {a b c}; foreach e $L { lappend R $e }; set R");
        assert_eq!((r.as_str(), c), ("a b c", Code::Ok));
    }

    #[test]
    fn test_catch_with_options() {
        let (r, c) =
            run_code("catch { error oops INFO } r o; list $r [dict get $o -errorcode]");
        assert_eq!((r.as_str(), c), ("oops INFO", Code::Ok));
    }

    #[test]
    fn test_try_trap() {
        let (r, c) =
            run_code("try { error bad BAD } trap BAD {e} { return caught-$e }");
        assert_eq!((r.as_str(), c), ("caught-bad", Code::Ok));
    }

    #[test]
    fn test_namespace_variable() {
        let (r, c) = run_code("namespace eval ::n { variable v 7 } ; set ::n::v");
        assert_eq!((r.as_str(), c), ("7", Code::Ok));
    }

    #[test]
    fn test_upvar_stays_in_frame() {
        let script = "proc outer {} { set x 1; inner }; \
                      proc inner {} { upvar 1 x y; set y 2 }; \
                      outer ; info exists ::x";
        let (r, c) = run_code(script);
        assert_eq!((r.as_str(), c), ("0", Code::Ok));
    }

    #[test]
    fn test_upvar_modifies_caller() {
        let script = "proc outer {} { set x 1; inner; set x }; \
                      proc inner {} { upvar 1 x y; set y 2 }; \
                      outer";
        assert_eq!(run(script), "2");
    }

    #[test]
    fn test_command_substitution_in_quotes() {
        let (r, c) = run_code("set s \"a[set q hi]b\"");
        assert_eq!((r.as_str(), c), ("ahib", Code::Ok));
    }

    #[test]
    fn test_switch_regexp_matchvar() {
        let script =
            "switch -regexp -matchvar m -- ab12 {^([a-z]+)([0-9]+)$ {list $m}}";
        let (r, c) = run_code(script);
        assert_eq!((r.as_str(), c), ("{ab12 ab 12}", Code::Ok));
    }

    // ------------------------------------------------------------------
    // Universal invariants
    // ------------------------------------------------------------------

    #[test]
    fn test_brace_round_trip() {
        // Braced strings survive byte for byte.
        assert_eq!(run("set x {a $b [c] \\n}; set x"), "a $b [c] \\n");
    }

    #[test]
    fn test_braces_block_substitution() {
        let mut tcl = Tcl::default();
        let out = tcl.eval("set x {[set q 1]$q\\n}");
        assert_eq!(out.result, "[set q 1]$q\\n");
        let exists = tcl.eval("info exists q");
        assert_eq!(exists.result, "0");
    }

    #[test]
    fn test_expansion_preserves_length() {
        assert_eq!(run("set L {a {b c} d}; llength [list {*}$L]"), "3");
        assert_eq!(run("list {*}{}"), "");
        assert_eq!(run("list a {*}{b c} d"), "a b c d");
    }

    #[test]
    fn test_catch_totality() {
        assert_eq!(run("catch { nosuchcommand } r; set r"),
                   "invalid command name \"nosuchcommand\"");
        assert_eq!(run("catch { expr {1/0} }"), "1");
        assert_eq!(run("catch { break }"), "3");
        assert_eq!(run("catch { return hi }"), "2");
        assert_eq!(run("catch { set ok } "), "1");
        assert_eq!(run("catch { concat fine }"), "0");
    }

    #[test]
    fn test_uplevel_conservation() {
        let script = "proc p {} { set x local; uplevel 1 { set x 7 }; set x }; \
                      set x outer; list [p] $x";
        assert_eq!(run(script), "local 7");
    }

    #[test]
    fn test_qualified_registration() {
        let mut tcl = Tcl::default();
        tcl.eval("proc ::a::b::f {} { return hi }");
        assert_eq!(tcl.eval("a::b::f").result, "hi");
        assert_eq!(tcl.eval("namespace eval ::a::b { namespace which f }").result, "::a::b::f");
    }

    #[test]
    fn test_parser_idempotent_on_braced_words() {
        assert_eq!(run("set w {balanced {nested} braces}; set w"),
                   "balanced {nested} braces");
    }

    // ------------------------------------------------------------------
    // Boundary behaviors
    // ------------------------------------------------------------------

    #[test]
    fn test_empty_script() {
        let (r, c) = run_code("");
        assert_eq!((r.as_str(), c), ("", Code::Ok));
    }

    #[test]
    fn test_comment_only_script() {
        let (r, c) = run_code("# nothing here\n   \n# more\n");
        assert_eq!((r.as_str(), c), ("", Code::Ok));
    }

    #[test]
    fn test_dollar_at_end_is_literal() {
        assert_eq!(run("set x a$"), "a$");
    }

    #[test]
    fn test_backslash_newline_collapses() {
        assert_eq!(run("list a\\\n\t   b"), "a b");
        assert_eq!(run("set x \"a\\\n   b\""), "a b");
    }

    #[test]
    fn test_incomplete_detection() {
        let mut tcl = Tcl::default();
        let out = tcl.eval("set x {unterminated");
        assert_eq!(out.code, Code::Error);
        assert!(out.is_incomplete());
        let out = tcl.eval("set x \"open");
        assert!(out.is_incomplete());
        let out = tcl.eval("set x [cmd");
        assert!(out.is_incomplete());
        let out = tcl.eval("set x oops}");
        assert!(!out.is_incomplete());
    }

    // ------------------------------------------------------------------
    // Control flow and errors
    // ------------------------------------------------------------------

    #[test]
    fn test_if_elseif_else() {
        assert_eq!(run("if {0} { set r a } elseif {1} { set r b } else { set r c }"), "b");
        assert_eq!(run("if {0} { set r a }"), "");
        assert_eq!(run("if {1} then { set r yes }"), "yes");
    }

    #[test]
    fn test_while_loop() {
        assert_eq!(run("set i 0; set s 0; while {$i < 5} { incr s $i; incr i }; set s"), "10");
        assert_eq!(run("set i 0; while {1} { incr i; if {$i >= 3} { break } }; set i"), "3");
        assert_eq!(
            run("set s {}; set i 0; while {$i < 5} { incr i; \
                 if {$i == 2} { continue }; append s $i }; set s"),
            "1345"
        );
    }

    #[test]
    fn test_for_loop() {
        assert_eq!(run("set s {}; for {set i 0} {$i < 3} {incr i} { append s $i }; set s"), "012");
    }

    #[test]
    fn test_foreach_parallel_lists() {
        assert_eq!(
            run("set out {}; foreach {a b} {1 2 3} c {x y} { lappend out $a-$b-$c }; set out"),
            "1-2-x 3--y"
        );
    }

    #[test]
    fn test_lmap() {
        assert_eq!(run("lmap x {1 2 3} { expr {$x * 2} }"), "2 4 6");
        assert_eq!(run("lmap x {1 2 3 4} { if {$x % 2} { continue }; set x }"), "2 4");
        assert_eq!(run("lmap x {1 2 3 4} { if {$x > 2} { break }; set x }"), "1 2");
    }

    #[test]
    fn test_error_leaves_errorinfo() {
        let mut tcl = Tcl::default();
        let out = tcl.eval("proc boom {} { error kaboom }; boom");
        assert_eq!(out.code, Code::Error);
        assert_eq!(out.result, "kaboom");
        let info = out.error_info.expect("errorinfo present");
        assert!(info.starts_with("kaboom"));
        assert!(info.contains("while executing"));
    }

    #[test]
    fn test_return_code_option() {
        let (r, c) = run_code(
            "proc f {} { return -code error -errorcode {X Y} boom }; \
             catch {f} msg opts; list $msg [dict get $opts -errorcode]",
        );
        assert_eq!((r.as_str(), c), ("boom {X Y}", Code::Ok));
    }

    #[test]
    fn test_return_level_two() {
        let script = "proc inner {} { return -level 2 deep }; \
                      proc outer {} { inner; return shallow }; \
                      outer";
        assert_eq!(run(script), "deep");
    }

    #[test]
    fn test_try_on_fallthrough() {
        let script = "try { error x } on break {} - on error {e} { set r handled-$e }";
        assert_eq!(run(script), "handled-x");
    }

    #[test]
    fn test_try_finally_runs() {
        let script = "set log {}; \
                      catch { try { error oops } finally { append log F } }; \
                      set log";
        assert_eq!(run(script), "F");
    }

    #[test]
    fn test_try_finally_supersedes() {
        let (r, c) = run_code("try { set x ok } finally { error fin }");
        assert_eq!((r.as_str(), c), ("fin", Code::Error));
    }

    #[test]
    fn test_switch_basics() {
        assert_eq!(run("switch b {a {set r 1} b {set r 2} default {set r 3}}"), "2");
        assert_eq!(run("switch zz {a {set r 1} default {set r 3}}"), "3");
        assert_eq!(run("switch -glob a.txt {*.tcl {set r t} *.txt {set r x}}"), "x");
        assert_eq!(run("switch b {a {set r 1} b - c {set r 23}}"), "23");
        assert_eq!(run("switch -nocase B {b {set r low}}"), "low");
        assert_eq!(run("switch x {a {set r 1}}"), "");
    }

    #[test]
    fn test_too_many_nested_evaluations() {
        let mut tcl = Tcl::default();
        let out = tcl.eval("proc r {} { r }; r");
        assert_eq!(out.code, Code::Error);
        assert_eq!(out.result, "too many nested evaluations");
    }

    #[test]
    fn test_unknown_hook() {
        let script = "proc unknown {name args} { return handled-$name }; nosuch a b";
        assert_eq!(run(script), "handled-nosuch");
    }

    #[test]
    fn test_invalid_command_message() {
        let (r, c) = run_code("definitely-not-a-command");
        assert_eq!(c, Code::Error);
        assert_eq!(r, "invalid command name \"definitely-not-a-command\"");
    }

    // ------------------------------------------------------------------
    // Namespaces, procs, tailcall
    // ------------------------------------------------------------------

    #[test]
    fn test_namespace_scoping() {
        let script = "namespace eval ::counter { variable n 0 }; \
                      proc ::counter::bump {} { variable n; incr n }; \
                      counter::bump; counter::bump; set ::counter::n";
        assert_eq!(run(script), "2");
    }

    #[test]
    fn test_namespace_delete() {
        let script = "namespace eval ::tmp { variable v 1 }; \
                      namespace delete ::tmp; namespace exists ::tmp";
        assert_eq!(run(script), "0");
    }

    #[test]
    fn test_global_command() {
        let script = "set g 5; proc f {} { global g; incr g }; f; set g";
        assert_eq!(run(script), "6");
    }

    #[test]
    fn test_apply() {
        assert_eq!(run("apply {{x y} {expr {$x + $y}}} 3 4"), "7");
        assert_eq!(run("apply {{} {return const}}"), "const");
    }

    #[test]
    fn test_tailcall() {
        let script = "proc a {} { tailcall b }; proc b {} { return from-b }; a";
        assert_eq!(run(script), "from-b");
    }

    #[test]
    fn test_rename_and_delete() {
        let script = "proc f {} { return one }; rename f g; g";
        assert_eq!(run(script), "one");
        let (r, c) = run_code("proc f {} {}; rename f {}; f");
        assert_eq!(c, Code::Error);
        assert_eq!(r, "invalid command name \"f\"");
    }

    #[test]
    fn test_wrong_num_args_message() {
        let (r, _) = run_code("proc f {x {y 1} args} {}; f");
        assert_eq!(r, "wrong # args: should be \"f x ?y? ?arg ...?\"");
    }

    #[test]
    fn test_info_level() {
        assert_eq!(run("proc f {} { info level }; f"), "1");
        assert_eq!(run("info level"), "0");
        assert_eq!(run("proc f {a b} { info level 1 }; f 1 2"), "f 1 2");
    }

    // ------------------------------------------------------------------
    // Substitution details
    // ------------------------------------------------------------------

    #[test]
    fn test_subst_flags() {
        assert_eq!(run("set a 1; subst -nocommands {$a [b]}"), "1 [b]");
        assert_eq!(run("set a 1; subst -novariables {$a}"), "$a");
        assert_eq!(run("subst -novariables -nocommands {a\\tb}"), "a\tb");
    }

    #[test]
    fn test_variable_substitution_forms() {
        assert_eq!(run("set a 5; set x ${a}b"), "5b");
        assert_eq!(run("set ::top 9; proc f {} { set ::top }; f"), "9");
        assert_eq!(run("namespace eval ::q { variable v 3 }; set x $::q::v"), "3");
    }

    #[test]
    fn test_backslash_escapes_in_words() {
        assert_eq!(run("set x a\\x41b"), "aAb");
        assert_eq!(run("set x \\u00e9"), "é");
        assert_eq!(run("set x a\\tb"), "a\tb");
        assert_eq!(run("set x \\q"), "q");
    }

    #[test]
    fn test_semicolons_and_comments() {
        assert_eq!(run("set a 1; set b 2; set a"), "1");
        assert_eq!(run("set a 1\n# comment about a\nset a"), "1");
        // A # mid-command is a literal word; list quoting braces it.
        assert_eq!(run("list a # b"), "a {#} b");
    }

    #[test]
    fn test_nested_command_substitution() {
        assert_eq!(run("set x [expr {1 + [expr {2 + 3}]}]"), "6");
    }

    #[test]
    fn test_eval_concat() {
        assert_eq!(run("eval set q 12"), "12");
        assert_eq!(run("eval {set q 12}; set q"), "12");
    }

    #[test]
    fn test_uplevel_absolute() {
        let script = "proc f {} { uplevel #0 { set topvar 1 } }; f; set topvar";
        assert_eq!(run(script), "1");
    }

    #[test]
    fn test_error_code_defaults_to_none() {
        assert_eq!(run("catch {error x} r o; dict get $o -errorcode"), "NONE");
    }
}
