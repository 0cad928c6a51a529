//! Interpreter module
//!
//! The evaluator and everything it owns: frames, variables, namespaces,
//! the command registry, procedure invocation, result-code plumbing,
//! and the expression engine.

pub mod eval;
pub mod expr;
pub mod frame;
#[allow(clippy::module_inception)]
pub mod interp;
pub mod namespace;
pub mod proc_call;
pub mod registry;
pub mod resolver;
pub mod result;

pub use eval::{eval_script, exec_command};
pub use frame::{Frame, Var};
pub use interp::{EvalLimits, Interp};
pub use namespace::Namespace;
pub use registry::{BuiltinFn, CommandEntry, CommandKind};
pub use result::{Code, ReturnOptions};
