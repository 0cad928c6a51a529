//! Interpreter State
//!
//! The `Interp` owns everything evaluation mutates: the frame stack,
//! the namespace tree, the result slot, and the return-options record.
//! It performs no I/O and no system calls; hosts extend it purely by
//! registering commands.

use crate::interp::eval::{eval_script, exec_command};
use crate::interp::frame::Frame;
use crate::interp::namespace::Namespace;
use crate::interp::result::{Code, ReturnOptions};
use crate::parser::{substitute, SubstFlags};
use crate::value::Value;

/// Evaluation ceilings.
#[derive(Debug, Clone)]
pub struct EvalLimits {
    /// Combined frame depth and script-eval depth allowed before
    /// evaluation aborts with "too many nested evaluations".
    pub max_nesting: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self { max_nesting: 1000 }
    }
}

pub struct Interp {
    pub(crate) frames: Vec<Frame>,
    /// Frame index visible as current for variable resolution.
    pub(crate) active: usize,
    pub(crate) root: Namespace,
    pub(crate) result: Value,
    pub(crate) opts: ReturnOptions,
    pub(crate) limits: EvalLimits,
    /// Script-eval recursion depth (frames tracked separately).
    pub(crate) nesting: usize,
    /// Set once the unwinding error has had its trace line appended.
    pub(crate) errorinfo_pending: bool,
    /// Command queued by `tailcall`, dispatched after its proc's frame
    /// pops.
    pub(crate) tailcall: Option<Vec<Value>>,
}

impl Interp {
    /// A fresh interpreter with all builtin commands registered.
    pub fn new() -> Self {
        Self::with_limits(EvalLimits::default())
    }

    pub fn with_limits(limits: EvalLimits) -> Self {
        let mut interp = Self {
            frames: vec![Frame::new("::", true)],
            active: 0,
            root: Namespace::new("::"),
            result: Value::empty(),
            opts: ReturnOptions::default(),
            limits,
            nesting: 0,
            errorinfo_pending: false,
            tailcall: None,
        };
        crate::builtins::register_all(&mut interp);
        interp
    }

    // ------------------------------------------------------------------
    // Result slot
    // ------------------------------------------------------------------

    pub fn result(&self) -> Value {
        self.result.clone()
    }

    pub fn set_result(&mut self, v: Value) {
        self.result = v;
    }

    pub fn reset_result(&mut self) {
        self.result = Value::empty();
    }

    /// Set the result and return `Code::Ok`.
    pub fn ok(&mut self, v: Value) -> Code {
        self.result = v;
        Code::Ok
    }

    /// Raise an error: result becomes the message, `-errorcode` resets
    /// (it surfaces as NONE), and `-errorinfo` starts from the message.
    pub fn error(&mut self, msg: impl Into<String>) -> Code {
        let msg = msg.into();
        self.opts.errorcode = None;
        self.opts.errorinfo = Some(Value::string(msg.clone()));
        self.errorinfo_pending = false;
        self.result = Value::string(msg);
        Code::Error
    }

    /// Raise an error carrying an explicit `-errorcode` list.
    pub fn error_with_code(&mut self, msg: impl Into<String>, errorcode: Value) -> Code {
        let code = self.error(msg);
        self.opts.errorcode = Some(errorcode);
        code
    }

    /// The options dictionary for an observed result code.
    pub fn return_options(&self, code: Code) -> Value {
        self.opts.to_dict(code)
    }

    // ------------------------------------------------------------------
    // Evaluation entry points
    // ------------------------------------------------------------------

    /// Evaluate a script in the current scope.
    pub fn eval(&mut self, script: &str) -> Code {
        eval_script(self, script)
    }

    /// Evaluate a script value in the current scope.
    pub fn eval_value(&mut self, script: &Value) -> Code {
        let text = script.as_str().to_string();
        eval_script(self, &text)
    }

    /// Evaluate with the global frame temporarily active, so unqualified
    /// names resolve at top level.
    pub fn eval_global(&mut self, script: &str) -> Code {
        let saved = self.active;
        self.active = 0;
        let code = eval_script(self, script);
        self.active = saved.min(self.frames.len().saturating_sub(1));
        code
    }

    /// Execute an already-parsed command: element 0 is the command
    /// name, the rest its arguments.
    pub fn exec(&mut self, words: &[Value]) -> Code {
        exec_command(self, words)
    }

    /// Perform backslash/variable/command substitution over a value.
    pub fn subst(&mut self, s: &Value, flags: SubstFlags) -> Code {
        let text = s.as_str().to_string();
        substitute(self, &text, flags)
    }

    // ------------------------------------------------------------------
    // Scope plumbing shared by uplevel and friends
    // ------------------------------------------------------------------

    /// Run `f` with the active level redirected to `level`, restoring
    /// it afterwards.
    pub(crate) fn with_active<R>(
        &mut self,
        level: usize,
        f: impl FnOnce(&mut Interp) -> R,
    ) -> R {
        let saved = self.active;
        self.active = level;
        let out = f(self);
        self.active = saved.min(self.frames.len().saturating_sub(1));
        out
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}
