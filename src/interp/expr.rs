//! Expression Engine
//!
//! Parses and evaluates the expression language used by `expr` and by
//! the condition arguments of `if`, `while`, and `for`. Parsing builds
//! a small AST; evaluation walks it with interpreter access so `$var`
//! reads, `[script]` substitutions, and quoted strings resolve in the
//! current scope, and so `&&`, `||`, and `?:` stay lazy.
//!
//! Arithmetic is signed 64-bit with wraparound, promoting to double
//! when either operand is one. Integer division truncates toward
//! negative infinity and the remainder takes the divisor's sign.

use crate::interp::eval::eval_script;
use crate::interp::interp::Interp;
use crate::interp::result::Code;
use crate::parser::command::{find_matching_bracket, scan_varname};
use crate::parser::{substitute, SubstFlags};
use crate::value::{format_double, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Pow,
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    StrEq,
    StrNe,
    In,
    NotIn,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinOp {
    fn symbol(self) -> &'static str {
        match self {
            BinOp::Pow => "**",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::StrEq => "eq",
            BinOp::StrNe => "ne",
            BinOp::In => "in",
            BinOp::NotIn => "ni",
            BinOp::BitAnd => "&",
            BinOp::BitXor => "^",
            BinOp::BitOr => "|",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum UnOp {
    Neg,
    Plus,
    Not,
    BitNot,
}

#[derive(Debug, Clone)]
enum Expr {
    Lit(Value),
    Quoted(String),
    Var(String),
    Script(String),
    Func(String, Vec<Expr>),
    Unary(UnOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}

/// Numeric view of an operand.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Dbl(f64),
}

fn num_of(v: &Value) -> Option<Num> {
    if let Ok(i) = v.as_int() {
        return Some(Num::Int(i));
    }
    if let Ok(d) = v.as_double() {
        return Some(Num::Dbl(d));
    }
    None
}

fn num_value(n: Num) -> Value {
    match n {
        Num::Int(i) => Value::int(i),
        Num::Dbl(d) => Value::double(d),
    }
}

// ----------------------------------------------------------------------
// Parsing
// ----------------------------------------------------------------------

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

type PResult<T> = Result<T, String>;

/// Parse an expression source into its AST.
fn parse(src: &str) -> PResult<Expr> {
    let mut p = Parser { src, bytes: src.as_bytes(), pos: 0 };
    let expr = p.parse_ternary()?;
    p.skip_ws();
    if p.pos < p.bytes.len() {
        return Err(format!(
            "extra tokens at end of expression \"{}\"",
            &src[p.pos..]
        ));
    }
    Ok(expr)
}

impl<'a> Parser<'a> {
    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len()
            && matches!(self.bytes[self.pos], b' ' | b'\t' | b'\n' | b'\r')
        {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Consume `tok` if next, where `tok` must not be the prefix of a
    /// longer operator that also matches here.
    fn eat(&mut self, tok: &str) -> bool {
        if self.bytes[self.pos..].starts_with(tok.as_bytes()) {
            self.pos += tok.len();
            true
        } else {
            false
        }
    }

    /// Consume a word operator (`eq`, `in`, ...) only when it is not
    /// the start of a longer bareword.
    fn eat_word(&mut self, word: &str) -> bool {
        let end = self.pos + word.len();
        if !self.bytes[self.pos..].starts_with(word.as_bytes()) {
            return false;
        }
        if let Some(&b) = self.bytes.get(end) {
            if b.is_ascii_alphanumeric() || b == b'_' {
                return false;
            }
        }
        self.pos = end;
        true
    }

    fn parse_ternary(&mut self) -> PResult<Expr> {
        let cond = self.parse_or()?;
        self.skip_ws();
        if self.peek() == Some(b'?') {
            self.pos += 1;
            let then = self.parse_ternary()?;
            self.skip_ws();
            if self.peek() != Some(b':') {
                return Err("missing \":\" in ternary expression".to_string());
            }
            self.pos += 1;
            let other = self.parse_ternary()?;
            return Ok(Expr::Ternary(Box::new(cond), Box::new(then), Box::new(other)));
        }
        Ok(cond)
    }

    fn parse_or(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_and()?;
        loop {
            self.skip_ws();
            if self.eat("||") {
                let rhs = self.parse_and()?;
                lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_bitor()?;
        loop {
            self.skip_ws();
            if self.eat("&&") {
                let rhs = self.parse_bitor()?;
                lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_bitor(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_bitxor()?;
        loop {
            self.skip_ws();
            if self.peek() == Some(b'|') && self.bytes.get(self.pos + 1) != Some(&b'|') {
                self.pos += 1;
                let rhs = self.parse_bitxor()?;
                lhs = Expr::Binary(BinOp::BitOr, Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_bitxor(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_bitand()?;
        loop {
            self.skip_ws();
            if self.peek() == Some(b'^') {
                self.pos += 1;
                let rhs = self.parse_bitand()?;
                lhs = Expr::Binary(BinOp::BitXor, Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_bitand(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_in()?;
        loop {
            self.skip_ws();
            if self.peek() == Some(b'&') && self.bytes.get(self.pos + 1) != Some(&b'&') {
                self.pos += 1;
                let rhs = self.parse_in()?;
                lhs = Expr::Binary(BinOp::BitAnd, Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_in(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_streq()?;
        loop {
            self.skip_ws();
            if self.eat_word("in") {
                let rhs = self.parse_streq()?;
                lhs = Expr::Binary(BinOp::In, Box::new(lhs), Box::new(rhs));
            } else if self.eat_word("ni") {
                let rhs = self.parse_streq()?;
                lhs = Expr::Binary(BinOp::NotIn, Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_streq(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_eqne()?;
        loop {
            self.skip_ws();
            if self.eat_word("eq") {
                let rhs = self.parse_eqne()?;
                lhs = Expr::Binary(BinOp::StrEq, Box::new(lhs), Box::new(rhs));
            } else if self.eat_word("ne") {
                let rhs = self.parse_eqne()?;
                lhs = Expr::Binary(BinOp::StrNe, Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_eqne(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_rel()?;
        loop {
            self.skip_ws();
            if self.eat("==") {
                let rhs = self.parse_rel()?;
                lhs = Expr::Binary(BinOp::Eq, Box::new(lhs), Box::new(rhs));
            } else if self.eat("!=") {
                let rhs = self.parse_rel()?;
                lhs = Expr::Binary(BinOp::Ne, Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_rel(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_shift()?;
        loop {
            self.skip_ws();
            let op = if self.eat("<=") {
                BinOp::Le
            } else if self.eat(">=") {
                BinOp::Ge
            } else if self.peek() == Some(b'<') && self.bytes.get(self.pos + 1) != Some(&b'<') {
                self.pos += 1;
                BinOp::Lt
            } else if self.peek() == Some(b'>') && self.bytes.get(self.pos + 1) != Some(&b'>') {
                self.pos += 1;
                BinOp::Gt
            } else {
                return Ok(lhs);
            };
            let rhs = self.parse_shift()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_shift(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_addsub()?;
        loop {
            self.skip_ws();
            if self.eat("<<") {
                let rhs = self.parse_addsub()?;
                lhs = Expr::Binary(BinOp::Shl, Box::new(lhs), Box::new(rhs));
            } else if self.eat(">>") {
                let rhs = self.parse_addsub()?;
                lhs = Expr::Binary(BinOp::Shr, Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_addsub(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_muldiv()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    let rhs = self.parse_muldiv()?;
                    lhs = Expr::Binary(BinOp::Add, Box::new(lhs), Box::new(rhs));
                }
                Some(b'-') => {
                    self.pos += 1;
                    let rhs = self.parse_muldiv()?;
                    lhs = Expr::Binary(BinOp::Sub, Box::new(lhs), Box::new(rhs));
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_muldiv(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'*') if self.bytes.get(self.pos + 1) != Some(&b'*') => {
                    self.pos += 1;
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Binary(BinOp::Mul, Box::new(lhs), Box::new(rhs));
                }
                Some(b'/') => {
                    self.pos += 1;
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Binary(BinOp::Div, Box::new(lhs), Box::new(rhs));
                }
                Some(b'%') => {
                    self.pos += 1;
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Binary(BinOp::Mod, Box::new(lhs), Box::new(rhs));
                }
                _ => return Ok(lhs),
            }
        }
    }

    /// Unary operators bind looser than `**`: `-2**2` is `-(2**2)`.
    fn parse_unary(&mut self) -> PResult<Expr> {
        self.skip_ws();
        match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                Ok(Expr::Unary(UnOp::Neg, Box::new(self.parse_unary()?)))
            }
            Some(b'+') => {
                self.pos += 1;
                Ok(Expr::Unary(UnOp::Plus, Box::new(self.parse_unary()?)))
            }
            Some(b'!') if self.bytes.get(self.pos + 1) != Some(&b'=') => {
                self.pos += 1;
                Ok(Expr::Unary(UnOp::Not, Box::new(self.parse_unary()?)))
            }
            Some(b'~') => {
                self.pos += 1;
                Ok(Expr::Unary(UnOp::BitNot, Box::new(self.parse_unary()?)))
            }
            _ => self.parse_pow(),
        }
    }

    fn parse_pow(&mut self) -> PResult<Expr> {
        let lhs = self.parse_primary()?;
        self.skip_ws();
        if self.eat("**") {
            // Right associative; the exponent may carry its own sign.
            let rhs = self.parse_unary()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        self.skip_ws();
        let Some(b) = self.peek() else {
            return Err("missing operand".to_string());
        };
        match b {
            b'(' => {
                self.pos += 1;
                let inner = self.parse_ternary()?;
                self.skip_ws();
                if self.peek() != Some(b')') {
                    return Err("unbalanced parenthesis".to_string());
                }
                self.pos += 1;
                Ok(inner)
            }
            b'$' => {
                match scan_varname(self.bytes, self.pos)
                    .map_err(|e| e.message)?
                {
                    Some((start, end, next)) => {
                        let name = self.src[start..end].to_string();
                        self.pos = next;
                        Ok(Expr::Var(name))
                    }
                    None => Err("missing operand".to_string()),
                }
            }
            b'[' => {
                let close = find_matching_bracket(self.bytes, self.pos)
                    .ok_or_else(|| "missing close-bracket".to_string())?;
                let script = self.src[self.pos + 1..close].to_string();
                self.pos = close + 1;
                Ok(Expr::Script(script))
            }
            b'"' => {
                let mut i = self.pos + 1;
                while i < self.bytes.len() {
                    match self.bytes[i] {
                        b'\\' => i += 2,
                        b'"' => break,
                        _ => i += 1,
                    }
                }
                if i >= self.bytes.len() {
                    return Err("missing close-quote".to_string());
                }
                let content = self.src[self.pos + 1..i].to_string();
                self.pos = i + 1;
                Ok(Expr::Quoted(content))
            }
            b'{' => {
                let mut depth = 1usize;
                let mut i = self.pos + 1;
                while i < self.bytes.len() {
                    match self.bytes[i] {
                        b'\\' => {
                            i += 2;
                            continue;
                        }
                        b'{' => depth += 1,
                        b'}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                if depth != 0 || i >= self.bytes.len() {
                    return Err("missing close-brace".to_string());
                }
                let content = self.src[self.pos + 1..i].to_string();
                self.pos = i + 1;
                Ok(Expr::Lit(Value::string(content)))
            }
            b'0'..=b'9' => self.parse_number(),
            b'.' if self
                .bytes
                .get(self.pos + 1)
                .map_or(false, |b| b.is_ascii_digit()) =>
            {
                self.parse_number()
            }
            _ if b.is_ascii_alphabetic() || b == b'_' => self.parse_bareword(),
            _ => Err(format!(
                "invalid character \"{}\" in expression",
                &self.src[self.pos..]
                    .chars()
                    .next()
                    .map(String::from)
                    .unwrap_or_default()
            )),
        }
    }

    fn parse_number(&mut self) -> PResult<Expr> {
        let start = self.pos;
        let bytes = self.bytes;
        if bytes[self.pos] == b'0'
            && matches!(
                bytes.get(self.pos + 1),
                Some(b'x') | Some(b'X') | Some(b'o') | Some(b'O') | Some(b'b') | Some(b'B')
            )
        {
            self.pos += 2;
            while self
                .peek()
                .map_or(false, |b| b.is_ascii_alphanumeric())
            {
                self.pos += 1;
            }
            let text = &self.src[start..self.pos];
            return crate::value::parse_int(text).map(|i| Expr::Lit(Value::int(i)));
        }
        let mut is_double = false;
        while self.peek().map_or(false, |b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some(b'.') {
            is_double = true;
            self.pos += 1;
            while self.peek().map_or(false, |b| b.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let mut look = self.pos + 1;
            if matches!(bytes.get(look), Some(b'+') | Some(b'-')) {
                look += 1;
            }
            if bytes.get(look).map_or(false, |b| b.is_ascii_digit()) {
                is_double = true;
                self.pos = look;
                while self.peek().map_or(false, |b| b.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
        }
        let text = &self.src[start..self.pos];
        if is_double {
            crate::value::parse_double(text).map(|d| Expr::Lit(Value::double(d)))
        } else {
            crate::value::parse_int(text).map(|i| Expr::Lit(Value::int(i)))
        }
    }

    fn parse_bareword(&mut self) -> PResult<Expr> {
        let start = self.pos;
        while self
            .peek()
            .map_or(false, |b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.pos += 1;
        }
        let word = &self.src[start..self.pos];
        self.skip_ws();
        if self.peek() == Some(b'(') {
            self.pos += 1;
            let mut args = Vec::new();
            self.skip_ws();
            if self.peek() == Some(b')') {
                self.pos += 1;
            } else {
                loop {
                    args.push(self.parse_ternary()?);
                    self.skip_ws();
                    match self.peek() {
                        Some(b',') => self.pos += 1,
                        Some(b')') => {
                            self.pos += 1;
                            break;
                        }
                        _ => {
                            return Err(format!(
                                "missing close parenthesis in call to \"{}\"",
                                word
                            ))
                        }
                    }
                }
            }
            return Ok(Expr::Func(word.to_string(), args));
        }
        match word.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" => Ok(Expr::Lit(Value::int(1))),
            "false" | "no" | "off" => Ok(Expr::Lit(Value::int(0))),
            "inf" => Ok(Expr::Lit(Value::double(f64::INFINITY))),
            "nan" => Ok(Expr::Lit(Value::double(f64::NAN))),
            _ => Err(format!("invalid bareword \"{}\"", word)),
        }
    }
}

// ----------------------------------------------------------------------
// Evaluation
// ----------------------------------------------------------------------

/// Evaluate an expression source; the error path leaves the message in
/// the result slot and yields the failing code.
pub fn eval_expr_value(interp: &mut Interp, text: &str) -> Result<Value, Code> {
    let ast = match parse(text) {
        Ok(ast) => ast,
        Err(msg) => return Err(interp.error(msg)),
    };
    eval_node(interp, &ast)
}

/// Evaluate an expression as a condition.
pub fn eval_expr_bool(interp: &mut Interp, text: &str) -> Result<bool, Code> {
    let v = eval_expr_value(interp, text)?;
    truthy(interp, &v)
}

fn truthy(interp: &mut Interp, v: &Value) -> Result<bool, Code> {
    v.as_bool().map_err(|e| interp.error(e))
}

fn operand_num(interp: &mut Interp, v: &Value, op: &str) -> Result<Num, Code> {
    num_of(v).ok_or_else(|| {
        interp.error(format!(
            "can't use non-numeric string as operand of \"{}\"",
            op
        ))
    })
}

fn operand_int(interp: &mut Interp, v: &Value, op: &str) -> Result<i64, Code> {
    match num_of(v) {
        Some(Num::Int(i)) => Ok(i),
        Some(Num::Dbl(_)) => Err(interp.error(format!(
            "can't use floating-point value as operand of \"{}\"",
            op
        ))),
        None => Err(interp.error(format!(
            "can't use non-numeric string as operand of \"{}\"",
            op
        ))),
    }
}

fn eval_node(interp: &mut Interp, expr: &Expr) -> Result<Value, Code> {
    match expr {
        Expr::Lit(v) => Ok(v.clone()),
        Expr::Quoted(s) => {
            match substitute(interp, s, SubstFlags::default()) {
                Code::Ok => Ok(interp.result()),
                code => Err(code),
            }
        }
        Expr::Var(name) => interp.var_get(name).map_err(|e| interp.error(e)),
        Expr::Script(script) => {
            let script = script.clone();
            match eval_script(interp, &script) {
                Code::Ok => Ok(interp.result()),
                code => Err(code),
            }
        }
        Expr::Func(name, args) => {
            let mut vals = Vec::with_capacity(args.len());
            for a in args {
                vals.push(eval_node(interp, a)?);
            }
            math_function(interp, name, &vals)
        }
        Expr::Unary(op, e) => {
            let v = eval_node(interp, e)?;
            match op {
                UnOp::Neg => match operand_num(interp, &v, "-")? {
                    Num::Int(i) => Ok(Value::int(i.wrapping_neg())),
                    Num::Dbl(d) => Ok(Value::double(-d)),
                },
                UnOp::Plus => Ok(num_value(operand_num(interp, &v, "+")?)),
                UnOp::Not => Ok(Value::boolean(!truthy(interp, &v)?)),
                UnOp::BitNot => Ok(Value::int(!operand_int(interp, &v, "~")?)),
            }
        }
        Expr::Binary(op, l, r) => eval_binary(interp, *op, l, r),
        Expr::Ternary(c, t, f) => {
            let cond = eval_node(interp, c)?;
            if truthy(interp, &cond)? {
                eval_node(interp, t)
            } else {
                eval_node(interp, f)
            }
        }
    }
}

fn eval_binary(interp: &mut Interp, op: BinOp, l: &Expr, r: &Expr) -> Result<Value, Code> {
    // Lazy operators first.
    match op {
        BinOp::And => {
            let lv = eval_node(interp, l)?;
            if !truthy(interp, &lv)? {
                return Ok(Value::int(0));
            }
            let rv = eval_node(interp, r)?;
            return Ok(Value::boolean(truthy(interp, &rv)?));
        }
        BinOp::Or => {
            let lv = eval_node(interp, l)?;
            if truthy(interp, &lv)? {
                return Ok(Value::int(1));
            }
            let rv = eval_node(interp, r)?;
            return Ok(Value::boolean(truthy(interp, &rv)?));
        }
        _ => {}
    }

    let lv = eval_node(interp, l)?;
    let rv = eval_node(interp, r)?;
    let sym = op.symbol();

    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::Pow => {
            let ln = operand_num(interp, &lv, sym)?;
            let rn = operand_num(interp, &rv, sym)?;
            arith(interp, op, ln, rn)
        }
        BinOp::Shl | BinOp::Shr | BinOp::BitAnd | BinOp::BitXor | BinOp::BitOr => {
            let li = operand_int(interp, &lv, sym)?;
            let ri = operand_int(interp, &rv, sym)?;
            match op {
                BinOp::Shl => {
                    if ri < 0 {
                        return Err(interp.error("negative shift argument"));
                    }
                    Ok(Value::int(if ri >= 64 { 0 } else { li.wrapping_shl(ri as u32) }))
                }
                BinOp::Shr => {
                    if ri < 0 {
                        return Err(interp.error("negative shift argument"));
                    }
                    Ok(Value::int(if ri >= 64 { li >> 63 } else { li >> ri }))
                }
                BinOp::BitAnd => Ok(Value::int(li & ri)),
                BinOp::BitXor => Ok(Value::int(li ^ ri)),
                BinOp::BitOr => Ok(Value::int(li | ri)),
                _ => unreachable!(),
            }
        }
        BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::Eq | BinOp::Ne => {
            let ord = match (num_of(&lv), num_of(&rv)) {
                (Some(ln), Some(rn)) => numeric_cmp(ln, rn),
                _ => Some(lv.as_str().cmp(rv.as_str())),
            };
            let result = match (op, ord) {
                (BinOp::Eq, ord) => ord == Some(std::cmp::Ordering::Equal),
                (BinOp::Ne, ord) => ord != Some(std::cmp::Ordering::Equal),
                (_, None) => false,
                (BinOp::Lt, Some(o)) => o == std::cmp::Ordering::Less,
                (BinOp::Gt, Some(o)) => o == std::cmp::Ordering::Greater,
                (BinOp::Le, Some(o)) => o != std::cmp::Ordering::Greater,
                (BinOp::Ge, Some(o)) => o != std::cmp::Ordering::Less,
                _ => unreachable!(),
            };
            Ok(Value::boolean(result))
        }
        BinOp::StrEq => Ok(Value::boolean(lv.as_str() == rv.as_str())),
        BinOp::StrNe => Ok(Value::boolean(lv.as_str() != rv.as_str())),
        BinOp::In | BinOp::NotIn => {
            let items = rv.as_list().map_err(|e| interp.error(e))?;
            let found = items.iter().any(|it| it.as_str() == lv.as_str());
            Ok(Value::boolean(if op == BinOp::In { found } else { !found }))
        }
        BinOp::And | BinOp::Or => unreachable!("handled above"),
    }
}

/// NaN compares unequal and unordered.
fn numeric_cmp(l: Num, r: Num) -> Option<std::cmp::Ordering> {
    match (l, r) {
        (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
        (a, b) => {
            let (a, b) = (dbl(a), dbl(b));
            a.partial_cmp(&b)
        }
    }
}

fn dbl(n: Num) -> f64 {
    match n {
        Num::Int(i) => i as f64,
        Num::Dbl(d) => d,
    }
}

fn arith(interp: &mut Interp, op: BinOp, l: Num, r: Num) -> Result<Value, Code> {
    if let (Num::Int(a), Num::Int(b)) = (l, r) {
        return match op {
            BinOp::Add => Ok(Value::int(a.wrapping_add(b))),
            BinOp::Sub => Ok(Value::int(a.wrapping_sub(b))),
            BinOp::Mul => Ok(Value::int(a.wrapping_mul(b))),
            BinOp::Div => {
                if b == 0 {
                    return Err(interp.error("divide by zero"));
                }
                Ok(Value::int(floor_div(a, b)))
            }
            BinOp::Mod => {
                if b == 0 {
                    return Err(interp.error("divide by zero"));
                }
                Ok(Value::int(floor_mod(a, b)))
            }
            BinOp::Pow => {
                if b < 0 {
                    Ok(Value::double((a as f64).powf(b as f64)))
                } else {
                    Ok(Value::int(int_pow(a, b as u64)))
                }
            }
            _ => unreachable!(),
        };
    }
    let (a, b) = (dbl(l), dbl(r));
    match op {
        BinOp::Add => Ok(Value::double(a + b)),
        BinOp::Sub => Ok(Value::double(a - b)),
        BinOp::Mul => Ok(Value::double(a * b)),
        BinOp::Div => {
            if b == 0.0 {
                return Err(interp.error("divide by zero"));
            }
            Ok(Value::double(a / b))
        }
        BinOp::Mod => Err(interp.error(
            "can't use floating-point value as operand of \"%\"",
        )),
        BinOp::Pow => Ok(Value::double(a.powf(b))),
        _ => unreachable!(),
    }
}

/// Division truncating toward negative infinity.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        q.wrapping_sub(1)
    } else {
        q
    }
}

/// Remainder taking the divisor's sign.
fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        r.wrapping_add(b)
    } else {
        r
    }
}

fn int_pow(mut base: i64, mut exp: u64) -> i64 {
    let mut acc: i64 = 1;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = acc.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exp >>= 1;
    }
    acc
}

fn math_function(interp: &mut Interp, name: &str, args: &[Value]) -> Result<Value, Code> {
    let want = |interp: &mut Interp, n: usize| -> Result<(), Code> {
        if args.len() < n {
            Err(interp.error(format!("too few arguments for math function \"{}\"", name)))
        } else if args.len() > n {
            Err(interp.error(format!("too many arguments for math function \"{}\"", name)))
        } else {
            Ok(())
        }
    };
    let num1 = |interp: &mut Interp| -> Result<Num, Code> {
        operand_num(interp, &args[0], name)
    };
    let dbl1 = |interp: &mut Interp| -> Result<f64, Code> {
        num1(interp).map(dbl)
    };

    match name {
        "abs" => {
            want(interp, 1)?;
            match num1(interp)? {
                Num::Int(i) => Ok(Value::int(i.wrapping_abs())),
                Num::Dbl(d) => Ok(Value::double(d.abs())),
            }
        }
        "bool" => {
            want(interp, 1)?;
            Ok(Value::boolean(truthy(interp, &args[0])?))
        }
        "double" => {
            want(interp, 1)?;
            Ok(Value::double(dbl1(interp)?))
        }
        "int" | "wide" | "entier" => {
            want(interp, 1)?;
            match num1(interp)? {
                Num::Int(i) => Ok(Value::int(i)),
                Num::Dbl(d) => to_int(interp, d),
            }
        }
        "round" => {
            want(interp, 1)?;
            match num1(interp)? {
                Num::Int(i) => Ok(Value::int(i)),
                Num::Dbl(d) => {
                    let r = if d >= 0.0 { (d + 0.5).floor() } else { (d - 0.5).ceil() };
                    to_int(interp, r)
                }
            }
        }
        "ceil" => {
            want(interp, 1)?;
            Ok(Value::double(dbl1(interp)?.ceil()))
        }
        "floor" => {
            want(interp, 1)?;
            Ok(Value::double(dbl1(interp)?.floor()))
        }
        "sqrt" | "exp" | "log" | "log10" | "sin" | "cos" | "tan" | "asin" | "acos"
        | "atan" | "sinh" | "cosh" | "tanh" => {
            want(interp, 1)?;
            let x = dbl1(interp)?;
            let y = match name {
                "sqrt" => x.sqrt(),
                "exp" => x.exp(),
                "log" => x.ln(),
                "log10" => x.log10(),
                "sin" => x.sin(),
                "cos" => x.cos(),
                "tan" => x.tan(),
                "asin" => x.asin(),
                "acos" => x.acos(),
                "atan" => x.atan(),
                "sinh" => x.sinh(),
                "cosh" => x.cosh(),
                "tanh" => x.tanh(),
                _ => unreachable!(),
            };
            domain_checked(interp, x, y)
        }
        "atan2" | "pow" | "fmod" | "hypot" => {
            want(interp, 2)?;
            let x = operand_num(interp, &args[0], name).map(dbl)?;
            let y = operand_num(interp, &args[1], name).map(dbl)?;
            let r = match name {
                "atan2" => x.atan2(y),
                "pow" => x.powf(y),
                "fmod" => {
                    if y == 0.0 {
                        return Err(interp.error("divide by zero"));
                    }
                    x % y
                }
                "hypot" => x.hypot(y),
                _ => unreachable!(),
            };
            domain_checked(interp, x, r)
        }
        "max" | "min" => {
            if args.is_empty() {
                return Err(interp.error(format!(
                    "too few arguments for math function \"{}\"",
                    name
                )));
            }
            let mut best = operand_num(interp, &args[0], name)?;
            for a in &args[1..] {
                let n = operand_num(interp, a, name)?;
                let better = match numeric_cmp(n, best) {
                    Some(std::cmp::Ordering::Greater) => name == "max",
                    Some(std::cmp::Ordering::Less) => name == "min",
                    _ => false,
                };
                if better {
                    best = n;
                }
            }
            Ok(num_value(best))
        }
        _ => Err(interp.error(format!("unknown math function \"{}\"", name))),
    }
}

fn to_int(interp: &mut Interp, d: f64) -> Result<Value, Code> {
    if d.is_nan() || d < i64::MIN as f64 || d > i64::MAX as f64 {
        return Err(interp.error(format!(
            "integer value too large to represent: \"{}\"",
            format_double(d)
        )));
    }
    Ok(Value::int(d.trunc() as i64))
}

/// A NaN produced from non-NaN input is a domain failure.
fn domain_checked(interp: &mut Interp, input: f64, result: f64) -> Result<Value, Code> {
    if result.is_nan() && !input.is_nan() {
        return Err(interp.error("domain error: argument not in valid range"));
    }
    Ok(Value::double(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> String {
        let mut interp = Interp::new();
        match eval_expr_value(&mut interp, src) {
            Ok(v) => v.as_str().to_string(),
            Err(_) => format!("ERR {}", interp.result().as_str()),
        }
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1 + 2 * 3"), "7");
        assert_eq!(eval("(1 + 2) * 3"), "9");
        assert_eq!(eval("2 ** 3 ** 2"), "512");
        assert_eq!(eval("-2 ** 2"), "-4");
        assert_eq!(eval("1 << 3 | 1"), "9");
    }

    #[test]
    fn test_floor_division() {
        assert_eq!(eval("-7 / 2"), "-4");
        assert_eq!(eval("-7 % 2"), "1");
        assert_eq!(eval("7 % -2"), "-1");
        assert_eq!(eval("7 / 2"), "3");
    }

    #[test]
    fn test_doubles() {
        assert_eq!(eval("1 + 2.5"), "3.5");
        assert_eq!(eval("10 / 4.0"), "2.5");
        assert_eq!(eval("1e2 + 1"), "101.0");
    }

    #[test]
    fn test_string_ops() {
        assert_eq!(eval("\"abc\" eq \"abc\""), "1");
        assert_eq!(eval("\"abc\" ne \"abd\""), "1");
        assert_eq!(eval("{b} in {a b c}"), "1");
        assert_eq!(eval("{d} ni {a b c}"), "1");
        assert_eq!(eval("\"apple\" < \"banana\""), "1");
    }

    #[test]
    fn test_numeric_string_compare() {
        assert_eq!(eval("\"10\" > \"9\""), "1");
        assert_eq!(eval("10 == 10.0"), "1");
    }

    #[test]
    fn test_lazy() {
        assert_eq!(eval("0 && [nosuchcmd]"), "0");
        assert_eq!(eval("1 || [nosuchcmd]"), "1");
        assert_eq!(eval("1 ? 5 : [nosuchcmd]"), "5");
    }

    #[test]
    fn test_ternary_and_not() {
        assert_eq!(eval("3 > 2 ? \"yes\" : \"no\""), "yes");
        assert_eq!(eval("!0"), "1");
        assert_eq!(eval("!3"), "0");
        assert_eq!(eval("~0"), "-1");
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("abs(-5)"), "5");
        assert_eq!(eval("abs(-5.5)"), "5.5");
        assert_eq!(eval("int(7.9)"), "7");
        assert_eq!(eval("round(2.5)"), "3");
        assert_eq!(eval("round(-2.5)"), "-3");
        assert_eq!(eval("max(3, 1, 2)"), "3");
        assert_eq!(eval("min(3, 1, 2)"), "1");
        assert_eq!(eval("sqrt(9.0)"), "3.0");
        assert_eq!(eval("pow(2, 10)"), "1024.0");
    }

    #[test]
    fn test_errors() {
        assert_eq!(eval("1 / 0"), "ERR divide by zero");
        assert_eq!(
            eval("sqrt(-1)"),
            "ERR domain error: argument not in valid range"
        );
        assert_eq!(
            eval("\"pear\" + 1"),
            "ERR can't use non-numeric string as operand of \"+\""
        );
        assert_eq!(
            eval("1.5 % 2"),
            "ERR can't use floating-point value as operand of \"%\""
        );
    }

    #[test]
    fn test_booleans() {
        assert_eq!(eval("true && on"), "1");
        assert_eq!(eval("false || off"), "0");
    }
}
