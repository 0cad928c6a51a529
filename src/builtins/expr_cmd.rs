//! The `expr` Builtin
//!
//! A thin entry into the expression engine. Multiple arguments join
//! with spaces first, so `expr 1 + 2` and `expr {1 + 2}` agree.

use crate::interp::expr::eval_expr_value;
use crate::interp::{Code, Interp};
use crate::value::Value;

pub fn cmd_expr(interp: &mut Interp, argv: &[Value]) -> Code {
    if argv.len() < 2 {
        return interp.error("wrong # args: should be \"expr arg ?arg ...?\"");
    }
    let text = if argv.len() == 2 {
        argv[1].as_str().to_string()
    } else {
        argv[1..]
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    };
    match eval_expr_value(interp, &text) {
        Ok(v) => interp.ok(v),
        Err(code) => code,
    }
}
