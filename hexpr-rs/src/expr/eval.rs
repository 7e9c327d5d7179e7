//! Evaluator core.
//!
//! A single-pass precedence climber: every level parses its operands and
//! applies its operator straight away, so no syntax tree is built.  Levels,
//! loosest first:
//!
//! ```text
//! ,   = += -= ...   ?:   ||   &&   |   ^   &   == !=   < <= > >=
//! << >>   + -   * / %   unary + - ! ~ ++ --   postfix [] . ++ --   primary
//! ```
//!
//! A `fx` ("side effects") flag is passed down every level.  It is cleared
//! for the right operand of a short-circuited `&&`/`||`; the operand is
//! still evaluated but assignments and increments inside it leave the
//! variables alone and prompts are not shown.

use std::f64::consts::PI;

use rand::rngs::OsRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::builtins::{call_builtin, is_keyword, Builtin, RESERVED};
use super::dialog::DialogProvider;
use super::error::ExprError;
use super::lexer::{Lexer, Token};
use super::symbols::{Symbol, SymbolResolver};
use super::value::Value;
use crate::config::EvalOptions;
use crate::var::VarStore;

// ── Evaluator ─────────────────────────────────────────────────────────────────

/// Evaluates expressions against a host's symbols and its own variables.
///
/// Variables persist from one [`evaluate`](Evaluator::evaluate) call to the
/// next.  An evaluator is single-threaded; use one per thread.
pub struct Evaluator<R: SymbolResolver> {
    resolver: R,
    vars: VarStore,
    dialog: Option<Box<dyn DialogProvider>>,
    rng: Xoshiro256PlusPlus,
    options: EvalOptions,
    last_error: Option<String>,
}

impl<R: SymbolResolver> Evaluator<R> {
    pub fn new(resolver: R) -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Evaluator {
            resolver,
            vars: VarStore::new(),
            dialog: None,
            rng: Xoshiro256PlusPlus::from_seed(seed),
            options: EvalOptions::default(),
            last_error: None,
        }
    }

    /// Provider for `get_int`, `get_string` and `get_bool`.
    pub fn with_dialog(mut self, dialog: Box<dyn DialogProvider>) -> Self {
        self.dialog = Some(dialog);
        self
    }

    pub fn with_options(mut self, options: EvalOptions) -> Self {
        self.options = options;
        self
    }

    /// Start from an existing set of variables.
    pub fn with_vars(mut self, vars: VarStore) -> Self {
        self.vars = vars;
        self
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut EvalOptions {
        &mut self.options
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn vars(&self) -> &VarStore {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut VarStore {
        &mut self.vars
    }

    pub fn into_vars(self) -> VarStore {
        self.vars
    }

    /// Make `rand()` deterministic.
    pub fn seed_rand(&mut self, seed: u64) {
        self.rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    }

    /// Message of the most recent failed evaluation, cleared by a
    /// successful one.  Honours [`EvalOptions::legacy_messages`].
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Evaluate one expression with the evaluator's own options.
    pub fn evaluate(&mut self, text: &str) -> Result<Value, ExprError> {
        let options = self.options.clone();
        self.evaluate_with(text, &options)
    }

    /// Evaluate one expression with `options` in place of the evaluator's.
    pub fn evaluate_with(&mut self, text: &str, options: &EvalOptions) -> Result<Value, ExprError> {
        let result = self.run(text, options);
        self.last_error = match &result {
            Ok(_) => None,
            Err(e) => {
                let msg = e.message(options.legacy_messages);
                log::debug!("evaluating {text:?} failed: {msg}");
                Some(msg)
            }
        };
        result
    }

    fn run(&mut self, text: &str, options: &EvalOptions) -> Result<Value, ExprError> {
        let separator = options.digit_separators.then_some(options.separator);
        let mut lexer = Lexer::new(text)
            .with_radix(options.radix)
            .with_separator(separator);
        let tok = lexer.next_token()?;
        let mut s = Session {
            lexer,
            tok,
            resolver: &self.resolver,
            vars: &mut self.vars,
            dialog: self.dialog.as_mut(),
            rng: &mut self.rng,
            max_depth: options.max_depth,
            depth: 0,
            step_target: false,
        };
        let result = s
            .comma(options.side_effects)
            .map_err(|e| e.or_missing(|| "Expected expression".to_owned()))?;
        if s.tok != Token::Eof {
            return Err(ExprError::syntax(format!(
                "Unexpected {} after end of expression",
                s.tok
            )));
        }
        Ok(result.value)
    }
}

impl Default for Evaluator<super::symbols::NoSymbols> {
    fn default() -> Self {
        Evaluator::new(super::symbols::NoSymbols)
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// The result of a level, remembering the variable it came from so that
/// assignment and `++`/`--` can write back to it.
struct Operand {
    value: Value,
    lvalue: Option<String>,
}

impl Operand {
    fn rvalue(value: Value) -> Self {
        Operand {
            value,
            lvalue: None,
        }
    }

    fn lvalue(name: String, value: Value) -> Self {
        Operand {
            value,
            lvalue: Some(name),
        }
    }
}

/// What an introspection function's argument named.
enum Target {
    Var(String, Value),
    Sym(Symbol),
    Missing(String),
}

/// How far [`Session::skip_operand`] goes.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// The `if` branch: up to the matching `:`.
    Colon,
    /// The `else` branch: up to whatever ends a ternary operand.
    Else,
}

#[derive(Clone, Copy)]
enum BinOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
}

impl BinOp {
    fn apply(self, a: &Value, b: &Value) -> Result<Value, ExprError> {
        use std::cmp::Ordering::*;
        match self {
            BinOp::Mul => a.mul(b),
            BinOp::Div => a.div(b),
            BinOp::Rem => a.rem(b),
            BinOp::Add => a.add(b),
            BinOp::Sub => a.sub(b),
            BinOp::Shl => a.shift_left(b),
            BinOp::Shr => a.shift_right(b),
            BinOp::BitAnd => a.bit_and(b),
            BinOp::BitXor => a.bit_xor(b),
            BinOp::BitOr => a.bit_or(b),
            cmp => {
                let ord = a.compare(b)?;
                Ok(Value::Bool(match cmp {
                    BinOp::Lt => ord == Some(Less),
                    BinOp::Le => matches!(ord, Some(Less | Equal)),
                    BinOp::Gt => ord == Some(Greater),
                    BinOp::Ge => matches!(ord, Some(Greater | Equal)),
                    BinOp::Eq => ord == Some(Equal),
                    _ => ord != Some(Equal),
                }))
            }
        }
    }

    fn missing(self) -> &'static str {
        match self {
            BinOp::Mul => "Expected 2nd operand for multiplication",
            BinOp::Div => "Expected 2nd operand for division",
            BinOp::Rem => "Expected 2nd operand of modulus",
            BinOp::Add => "Expected 2nd operand for addition",
            BinOp::Sub => "Expected 2nd operand of subtraction",
            BinOp::Shl => "Expected 2nd operand of shift left",
            BinOp::Shr => "Expected 2nd operand of shift right",
            BinOp::BitAnd => "Expected 2nd operand of bitwise AND (&)",
            BinOp::BitXor => "Expected 2nd operand of exclusive OR (^)",
            BinOp::BitOr => "Expected 2nd operand of bitwise OR (|)",
            _ => "Expected 2nd operand for comparison",
        }
    }

    /// The operator behind a compound assignment.
    fn compound(tok: &Token) -> Option<BinOp> {
        Some(match tok {
            Token::PlusAssign => BinOp::Add,
            Token::MinusAssign => BinOp::Sub,
            Token::StarAssign => BinOp::Mul,
            Token::SlashAssign => BinOp::Div,
            Token::PercentAssign => BinOp::Rem,
            Token::AmpAssign => BinOp::BitAnd,
            Token::PipeAssign => BinOp::BitOr,
            Token::CaretAssign => BinOp::BitXor,
            Token::ShlAssign => BinOp::Shl,
            Token::ShrAssign => BinOp::Shr,
            _ => return None,
        })
    }
}

type Parsed = Result<Operand, ExprError>;

/// State for one evaluation.
struct Session<'a, R: SymbolResolver> {
    lexer: Lexer,
    /// The one token of lookahead.
    tok: Token,
    resolver: &'a R,
    vars: &'a mut VarStore,
    dialog: Option<&'a mut Box<dyn DialogProvider>>,
    rng: &'a mut Xoshiro256PlusPlus,
    max_depth: usize,
    depth: usize,
    /// `++`/`--` is waiting for its target; an unbound name becomes a new
    /// variable so the step reports the type error.
    step_target: bool,
}

impl<R: SymbolResolver> Session<'_, R> {
    /// Move to the next token, returning the current one.
    fn bump(&mut self) -> Result<Token, ExprError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.tok, next))
    }

    fn expect(&mut self, tok: Token, msg: &str) -> Result<(), ExprError> {
        if self.tok != tok {
            return Err(ExprError::syntax(msg));
        }
        self.bump()?;
        Ok(())
    }

    fn lookup(&self, name: &str, parent: Option<&Symbol>, index: usize) -> Option<Symbol> {
        let found = self.resolver.resolve(name, parent, index);
        log::trace!(
            "resolve {name:?} index {index} -> {:?}",
            found.as_ref().map(|s| &s.value)
        );
        found
    }

    /// Run one level of right recursion under the depth limit.
    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> Parsed) -> Parsed {
        if self.depth >= self.max_depth {
            return Err(ExprError::TooComplex);
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // ── Comma and assignment ──────────────────────────────────────────────────

    fn comma(&mut self, fx: bool) -> Parsed {
        let mut result = self.assign(fx)?;
        while self.tok == Token::Comma {
            self.bump()?;
            result = self
                .assign(fx)
                .map_err(|e| e.or_missing(|| "Expected another expression after comma".into()))?;
        }
        Ok(result)
    }

    fn assign(&mut self, fx: bool) -> Parsed {
        let lhs = self.ternary(fx)?;
        let Some(symbol) = self.tok.assign_symbol() else {
            return Ok(lhs);
        };
        let plain = self.tok == Token::Assign;
        let Some(name) = lhs.lvalue else {
            return Err(ExprError::type_error(if plain {
                "Assignment requires a variable name on the left of the equals sign".to_owned()
            } else {
                format!("Variable name required on the left of {symbol}")
            }));
        };
        let op = self.bump()?;
        let rhs = self.nested(|s| s.assign(fx)).map_err(|e| {
            e.or_missing(|| {
                if plain {
                    "Expected expression for assignment".to_owned()
                } else {
                    format!("Expected expression for {symbol}")
                }
            })
        })?;
        let value = match BinOp::compound(&op) {
            None => rhs.value,
            Some(bin) => bin.apply(&lhs.value, &rhs.value).map_err(|e| match e {
                ExprError::Type(_) => {
                    ExprError::type_error(format!("Incompatible types for {symbol}"))
                }
                other => other,
            })?,
        };
        if fx {
            log::trace!("{name} {symbol} -> {value:?}");
            self.vars.set(name, value.clone());
        }
        Ok(Operand::rvalue(value))
    }

    // ── Ternary ───────────────────────────────────────────────────────────────

    fn ternary(&mut self, fx: bool) -> Parsed {
        let cond = self.logical_or(fx)?;
        if self.tok != Token::Question {
            return Ok(cond);
        }
        let Value::Bool(taken) = cond.value else {
            return Err(ExprError::type_error(
                "Condition for ternary operator must be BOOLEAN",
            ));
        };
        self.bump()?;
        let if_missing = || "Expected \"if\" expression for conditional (?:) operator".to_owned();
        let else_missing = || "Expected \"else\" expression for conditional (?:) operator".to_owned();
        let colon = "Expected colon (:) for conditional (?:) operator";
        let result = if taken {
            let v = self
                .nested(|s| s.comma(fx))
                .map_err(|e| e.or_missing(if_missing))?;
            self.expect(Token::Colon, colon)?;
            self.skip_operand(Stop::Else)
                .map_err(|e| e.or_missing(else_missing))?;
            v
        } else {
            self.skip_operand(Stop::Colon)
                .map_err(|e| e.or_missing(if_missing))?;
            self.expect(Token::Colon, colon)?;
            self.nested(|s| s.ternary(fx))
                .map_err(|e| e.or_missing(else_missing))?
        };
        Ok(Operand::rvalue(result.value))
    }

    /// Step over the untaken branch of `?:`.  Its tokens must lex and its
    /// brackets must balance; nothing in it is evaluated.
    fn skip_operand(&mut self, stop: Stop) -> Result<(), ExprError> {
        fn unclosed(open: &Token) -> ExprError {
            if *open == Token::LBracket {
                ExprError::syntax("Closing bracket (]) expected")
            } else {
                ExprError::syntax("Closing parenthesis expected")
            }
        }
        let mut open: Vec<Token> = Vec::new();
        let mut pending = 0usize;
        let mut skipped = false;
        loop {
            let top = open.is_empty();
            match &self.tok {
                Token::Eof => match open.last() {
                    None => break,
                    Some(t) => return Err(unclosed(t)),
                },
                Token::LParen | Token::LBracket => open.push(self.tok.clone()),
                Token::RParen | Token::RBracket => {
                    let want = if self.tok == Token::RParen {
                        Token::LParen
                    } else {
                        Token::LBracket
                    };
                    match open.pop() {
                        None => break,
                        Some(t) if t == want => {}
                        Some(t) => return Err(unclosed(&t)),
                    }
                }
                Token::Question if top => pending += 1,
                Token::Colon if top && pending > 0 => pending -= 1,
                Token::Colon if top => break,
                Token::Comma if top && stop == Stop::Else => break,
                t if top && stop == Stop::Else && t.is_assign() => break,
                _ => {}
            }
            skipped = true;
            self.bump()?;
        }
        if skipped {
            Ok(())
        } else {
            Err(ExprError::NotImplemented)
        }
    }

    // ── Logical ───────────────────────────────────────────────────────────────

    fn logical_or(&mut self, fx: bool) -> Parsed {
        let mut lhs = self.logical_and(fx)?;
        while self.tok == Token::Or {
            self.bump()?;
            let short = lhs.value == Value::Bool(true);
            let rhs = self
                .logical_and(fx && !short)
                .map_err(|e| e.or_missing(|| "Expected 2nd operand for OR (||)".into()))?;
            let (Value::Bool(a), Value::Bool(b)) = (&lhs.value, &rhs.value) else {
                return Err(ExprError::type_error("Operands for OR (||) must be BOOLEAN"));
            };
            lhs = Operand::rvalue(Value::Bool(*a || *b));
        }
        Ok(lhs)
    }

    fn logical_and(&mut self, fx: bool) -> Parsed {
        let mut lhs = self.bit_or(fx)?;
        while self.tok == Token::And {
            self.bump()?;
            let short = lhs.value == Value::Bool(false);
            let rhs = self
                .bit_or(fx && !short)
                .map_err(|e| e.or_missing(|| "Expected 2nd operand for AND (&&)".into()))?;
            let (Value::Bool(a), Value::Bool(b)) = (&lhs.value, &rhs.value) else {
                return Err(ExprError::type_error("Operands for AND (&&) must be BOOLEAN"));
            };
            lhs = Operand::rvalue(Value::Bool(*a && *b));
        }
        Ok(lhs)
    }

    // ── Binary levels ─────────────────────────────────────────────────────────

    /// One left-associative level: `next (op next)*`.
    fn binary(
        &mut self,
        fx: bool,
        next: fn(&mut Self, bool) -> Parsed,
        op_of: fn(&Token) -> Option<BinOp>,
    ) -> Parsed {
        let mut lhs = next(self, fx)?;
        while let Some(op) = op_of(&self.tok) {
            self.bump()?;
            let rhs = next(self, fx).map_err(|e| e.or_missing(|| op.missing().to_owned()))?;
            lhs = Operand::rvalue(op.apply(&lhs.value, &rhs.value)?);
        }
        Ok(lhs)
    }

    fn bit_or(&mut self, fx: bool) -> Parsed {
        self.binary(fx, Self::bit_xor, |t| (*t == Token::Pipe).then_some(BinOp::BitOr))
    }

    fn bit_xor(&mut self, fx: bool) -> Parsed {
        self.binary(fx, Self::bit_and, |t| (*t == Token::Caret).then_some(BinOp::BitXor))
    }

    fn bit_and(&mut self, fx: bool) -> Parsed {
        self.binary(fx, Self::equality, |t| (*t == Token::Ampersand).then_some(BinOp::BitAnd))
    }

    fn equality(&mut self, fx: bool) -> Parsed {
        self.binary(fx, Self::relational, |t| match t {
            Token::Eq => Some(BinOp::Eq),
            Token::Ne => Some(BinOp::Ne),
            _ => None,
        })
    }

    fn relational(&mut self, fx: bool) -> Parsed {
        self.binary(fx, Self::shift, |t| match t {
            Token::Lt => Some(BinOp::Lt),
            Token::Le => Some(BinOp::Le),
            Token::Gt => Some(BinOp::Gt),
            Token::Ge => Some(BinOp::Ge),
            _ => None,
        })
    }

    fn shift(&mut self, fx: bool) -> Parsed {
        self.binary(fx, Self::additive, |t| match t {
            Token::ShiftLeft => Some(BinOp::Shl),
            Token::ShiftRight => Some(BinOp::Shr),
            _ => None,
        })
    }

    fn additive(&mut self, fx: bool) -> Parsed {
        self.binary(fx, Self::multiplicative, |t| match t {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            _ => None,
        })
    }

    fn multiplicative(&mut self, fx: bool) -> Parsed {
        self.binary(fx, Self::unary, |t| match t {
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::Percent => Some(BinOp::Rem),
            _ => None,
        })
    }

    // ── Unary and postfix ─────────────────────────────────────────────────────

    /// Operands nest through here, so this is one of the places the depth
    /// limit is enforced.
    fn unary(&mut self, fx: bool) -> Parsed {
        self.nested(|s| s.prefixed(fx))
    }

    fn prefixed(&mut self, fx: bool) -> Parsed {
        type Apply = fn(&Value) -> Result<Value, ExprError>;
        let (apply, missing): (Apply, &str) = match self.tok {
            Token::Minus => (Value::negate, "Expected number after minus"),
            Token::Plus => (Value::unary_plus, "Expected number after +"),
            Token::Bang => (Value::logical_not, "Expected boolean for NOT (!)"),
            Token::Tilde => (Value::bit_not, "Expected integer for bitwise NOT (~)"),
            Token::Inc => return self.pre_step(fx, 1, "Pre-increment (++)"),
            Token::Dec => return self.pre_step(fx, -1, "Pre-decrement (--)"),
            _ => return self.postfix(fx),
        };
        self.bump()?;
        let operand = self
            .unary(fx)
            .map_err(|e| e.or_missing(|| missing.to_owned()))?;
        Ok(Operand::rvalue(apply(&operand.value)?))
    }

    /// `++x` / `--x`: the new value.
    fn pre_step(&mut self, fx: bool, delta: i64, what: &str) -> Parsed {
        self.bump()?;
        let not_var = || ExprError::type_error(format!("{what} requires an integer variable"));
        self.step_target = matches!(&self.tok, Token::Ident(n) if self.is_unbound(n));
        let operand = self.unary(fx);
        self.step_target = false;
        let operand = match operand {
            Err(ExprError::NotImplemented) => return Err(not_var()),
            other => other?,
        };
        let (Some(name), Value::Int(n)) = (operand.lvalue, operand.value) else {
            return Err(not_var());
        };
        let new = n.wrapping_add(delta);
        if fx {
            self.vars.set(name, new);
        }
        Ok(Operand::rvalue(Value::Int(new)))
    }

    fn postfix(&mut self, fx: bool) -> Parsed {
        let mut operand = self.primary(fx)?;
        loop {
            match self.tok {
                Token::LBracket => {
                    if !matches!(operand.value, Value::Str(_)) {
                        return Err(ExprError::symbol("Unexpected array index"));
                    }
                    let index = self.index(fx, "Array index must be an integer")?;
                    operand = Operand::rvalue(operand.value.char_at(index)?);
                }
                Token::Dot => {
                    return Err(ExprError::symbol(
                        "Dot operator (.) must only be used with struct",
                    ))
                }
                Token::Inc | Token::Dec => {
                    let (delta, what) = if self.tok == Token::Inc {
                        (1, "Post-increment (++)")
                    } else {
                        (-1, "Post-decrement (--)")
                    };
                    self.bump()?;
                    let (Some(name), Value::Int(n)) = (operand.lvalue.take(), &operand.value) else {
                        return Err(ExprError::type_error(format!(
                            "{what} requires an integer variable"
                        )));
                    };
                    if fx {
                        self.vars.set(name, n.wrapping_add(delta));
                    }
                    operand = Operand::rvalue(Value::Int(*n));
                }
                _ => return Ok(operand),
            }
        }
    }

    /// `[expr]` with an integer inside.
    fn index(&mut self, fx: bool, not_int: &str) -> Result<i64, ExprError> {
        self.bump()?;
        let index = self
            .comma(fx)
            .map_err(|e| e.or_missing(|| "Expected array index".into()))?;
        let Value::Int(i) = index.value else {
            return Err(ExprError::type_error(not_int));
        };
        self.expect(Token::RBracket, "Closing bracket (]) expected")?;
        Ok(i)
    }

    // ── Primary ───────────────────────────────────────────────────────────────

    fn primary(&mut self, fx: bool) -> Parsed {
        let starts_operand = matches!(
            self.tok,
            Token::Int(_)
                | Token::Real(_)
                | Token::Str(_)
                | Token::Ident(_)
                | Token::Quoted(_)
                | Token::LParen
        );
        if !starts_operand {
            return Err(ExprError::NotImplemented);
        }
        match self.bump()? {
            Token::Int(n) => Ok(Operand::rvalue(Value::Int(n))),
            Token::Real(x) => Ok(Operand::rvalue(Value::Real(x))),
            Token::Str(s) => Ok(Operand::rvalue(Value::Str(s))),
            Token::Quoted(name) => self.name(name, fx),
            Token::Ident(word) => self.word(word, fx),
            _ => {
                let inner = self
                    .comma(fx)
                    .map_err(|e| e.or_missing(|| "Expected expression after (".into()))?;
                self.expect(Token::RParen, "Closing parenthesis expected")?;
                Ok(Operand::rvalue(inner.value))
            }
        }
    }

    /// An identifier: keyword, function, variable or symbol.
    fn word(&mut self, word: String, fx: bool) -> Parsed {
        let lower = word.to_lowercase();
        match lower.as_str() {
            "true" => Ok(Operand::rvalue(Value::Bool(true))),
            "false" => Ok(Operand::rvalue(Value::Bool(false))),
            "pi" => Ok(Operand::rvalue(Value::Real(PI))),
            w if RESERVED.contains(&w) => {
                Err(ExprError::syntax(format!("\"{w}\" is a reserved symbol")))
            }
            "sizeof" | "addressof" | "string" | "defined" => self.introspect(&lower, fx),
            w => match Builtin::lookup(w) {
                Some(b) => self.call(b, fx),
                None => self.name(word, fx),
            },
        }
    }

    /// Not a keyword, function, variable or host symbol.
    fn is_unbound(&self, word: &str) -> bool {
        !is_keyword(&word.to_lowercase())
            && self.vars.get(word).is_none()
            && self.lookup(word, None, 0).is_none()
    }

    /// A variable, a host symbol, or a new variable about to be assigned.
    fn name(&mut self, name: String, fx: bool) -> Parsed {
        let step = std::mem::take(&mut self.step_target);
        if let Some(v) = self.vars.get(&name) {
            let v = v.clone();
            return Ok(Operand::lvalue(name, v));
        }
        if let Some(sym) = self.lookup(&name, None, 0) {
            return Ok(Operand::rvalue(self.navigate(sym, fx)?));
        }
        let name = if self.tok == Token::LBracket {
            let i = self.index(fx, "Array index must be an integer")?;
            format!("{name}[{i}]")
        } else {
            name
        };
        if let Some(v) = self.vars.get(&name) {
            let v = v.clone();
            return Ok(Operand::lvalue(name, v));
        }
        if step || self.tok.is_assign() || matches!(self.tok, Token::Inc | Token::Dec) {
            return Ok(Operand::lvalue(name, Value::None));
        }
        Err(ExprError::symbol(format!("Unknown symbol \"{name}\"")))
    }

    /// Follow `.member` and `[index]` from a container down to a scalar.
    fn navigate(&mut self, mut sym: Symbol, fx: bool) -> Result<Value, ExprError> {
        loop {
            match sym.value {
                Value::Struct => {
                    if self.tok != Token::Dot {
                        return Err(ExprError::syntax("Dot operator (.) expected after struct"));
                    }
                    sym = self.member(&sym)?;
                }
                Value::Array | Value::Blob => {
                    if self.tok != Token::LBracket {
                        return Err(ExprError::syntax("Array index expected after for"));
                    }
                    sym = self.element(&sym, fx)?;
                }
                _ => return Ok(sym.value),
            }
        }
    }

    /// `.name` after a struct.
    fn member(&mut self, parent: &Symbol) -> Result<Symbol, ExprError> {
        self.bump()?;
        let name = match self.bump()? {
            Token::Ident(n) | Token::Quoted(n) => n,
            _ => return Err(ExprError::syntax("Symbol expected")),
        };
        self.lookup(&name, Some(parent), 0)
            .ok_or_else(|| ExprError::symbol("Unrecognised member name for struct"))
    }

    /// `[index]` after an array or blob.
    fn element(&mut self, parent: &Symbol, fx: bool) -> Result<Symbol, ExprError> {
        let index = self.index(fx, "Array (for) index must be an integer")?;
        let invalid = || {
            if parent.value == Value::Blob {
                ExprError::symbol("Invalid index into \"none\" DATA element")
            } else {
                ExprError::symbol("Invalid array (for) index")
            }
        };
        let index = usize::try_from(index).map_err(|_| invalid())?;
        self.lookup("", Some(parent), index).ok_or_else(invalid)
    }

    // ── Introspection ─────────────────────────────────────────────────────────

    /// `sizeof`, `addressof`, `string` and `defined`.
    fn introspect(&mut self, func: &str, fx: bool) -> Parsed {
        let parens = self.tok == Token::LParen;
        if parens {
            self.bump()?;
        } else if func != "defined" {
            return Err(ExprError::syntax(format!(
                "Opening parenthesis expected after \"{func}\""
            )));
        }
        let name = match self.bump()? {
            Token::Ident(n) if is_keyword(&n.to_lowercase()) => n.to_lowercase(),
            Token::Ident(n) | Token::Quoted(n) => n,
            _ => return Err(ExprError::syntax("Symbol expected")),
        };
        let target = self.target(name, fx)?;
        if parens {
            self.expect(
                Token::RParen,
                &format!("Closing parenthesis expected for \"{func}\""),
            )?;
        }
        let value = match (func, target) {
            ("defined", Target::Missing(_)) => Value::Bool(false),
            ("defined", _) => Value::Bool(true),
            ("sizeof", Target::Var(_, v)) => Value::Int(v.var_size()),
            ("sizeof", Target::Sym(s)) => Value::Int(s.size),
            ("addressof", Target::Sym(s)) => Value::Int(s.address),
            ("addressof", Target::Var(name, _) | Target::Missing(name)) => {
                return Err(ExprError::symbol(format!("Symbol \"{name}\" not in file")))
            }
            (_, Target::Var(_, v)) => Value::Str(v.to_string()),
            (_, Target::Sym(s)) => Value::Str(s.text),
            (_, Target::Missing(name)) => {
                return Err(ExprError::symbol(format!("Unknown symbol \"{name}\"")))
            }
        };
        Ok(Operand::rvalue(value))
    }

    /// The restricted symbol expression inside an introspection call:
    /// a name followed by any chain of `.member` and `[index]`.
    fn target(&mut self, name: String, fx: bool) -> Result<Target, ExprError> {
        if let Some(v) = self.vars.get(&name) {
            let v = v.clone();
            return Ok(Target::Var(name, v));
        }
        if let Some(mut sym) = self.lookup(&name, None, 0) {
            loop {
                match self.tok {
                    Token::Dot if sym.value == Value::Struct => sym = self.member(&sym)?,
                    Token::Dot => {
                        return Err(ExprError::symbol(
                            "Dot operator (.) must only be used with struct",
                        ))
                    }
                    Token::LBracket if matches!(sym.value, Value::Array | Value::Blob) => {
                        sym = self.element(&sym, fx)?
                    }
                    Token::LBracket => {
                        return Err(ExprError::symbol("Array index on non-array symbol"))
                    }
                    _ => return Ok(Target::Sym(sym)),
                }
            }
        }
        if self.tok == Token::LBracket {
            let i = self.index(fx, "Array index must be an integer")?;
            let full = format!("{name}[{i}]");
            if let Some(v) = self.vars.get(&full) {
                let v = v.clone();
                return Ok(Target::Var(full, v));
            }
            return Ok(Target::Missing(full));
        }
        Ok(Target::Missing(name))
    }

    // ── Function calls ────────────────────────────────────────────────────────

    fn call(&mut self, b: Builtin, fx: bool) -> Parsed {
        let name = b.name();
        if self.tok != Token::LParen {
            return Err(ExprError::syntax(format!(
                "Opening parenthesis expected after \"{name}\""
            )));
        }
        self.bump()?;
        let (min, max) = b.arity();
        let mut args = Vec::new();
        if max != Some(0) {
            loop {
                let i = args.len();
                let arg = self
                    .assign(fx)
                    .map_err(|e| e.or_missing(|| b.missing_arg(i)))?;
                b.check_arg(i, &arg.value)?;
                args.push(arg.value);
                if self.tok == Token::Comma && max.map_or(true, |m| args.len() < m) {
                    self.bump()?;
                    continue;
                }
                if args.len() < min {
                    return Err(b.missing_comma());
                }
                break;
            }
        }
        if self.tok != Token::RParen {
            return Err(b.unclosed(args.len()));
        }
        self.bump()?;
        let value = match call_builtin(b, &args) {
            Some(result) => result?,
            None => self.host_call(b, &args, fx)?,
        };
        Ok(Operand::rvalue(value))
    }

    /// Functions that need the evaluator's state or the host.
    fn host_call(&mut self, b: Builtin, args: &[Value], fx: bool) -> Result<Value, ExprError> {
        let int = |i: usize, default: i64| args.get(i).and_then(Value::as_int).unwrap_or(default);
        let text = |i: usize, default: &'static str| {
            args.get(i).and_then(Value::as_str).unwrap_or(default).to_owned()
        };
        let name = b.name();
        match b {
            Builtin::Rand => Ok(Value::Int(self.rng.gen::<i64>())),
            Builtin::Get => {
                let (address, count) = (int(0, 0), int(1, 0));
                if !(1..=8).contains(&count) {
                    return Err(ExprError::domain("Byte count for \"get\" must be from 1 to 8"));
                }
                let bytes = self.resolver.read_bytes(address, count as usize)?;
                let mut buf = [0u8; 8];
                for (dst, src) in buf.iter_mut().zip(&bytes) {
                    *dst = *src;
                }
                Ok(Value::Int(i64::from_le_bytes(buf)))
            }
            Builtin::GetInt => {
                let (prompt, initial) = (text(0, ""), int(1, 0));
                let (min, max) = (int(2, i64::MIN), int(3, i64::MAX));
                if !fx {
                    return Ok(Value::Int(initial));
                }
                log::trace!("prompt for integer: {prompt:?}");
                self.dialog(name)?
                    .get_integer(&prompt, initial, min, max)
                    .map(Value::Int)
                    .ok_or_else(|| cancelled(name))
            }
            Builtin::GetString => {
                let (prompt, initial) = (text(0, ""), text(1, ""));
                if !fx {
                    return Ok(Value::Str(initial));
                }
                log::trace!("prompt for string: {prompt:?}");
                self.dialog(name)?
                    .get_string(&prompt, &initial)
                    .map(Value::Str)
                    .ok_or_else(|| cancelled(name))
            }
            Builtin::GetBool => {
                let (prompt, yes, no) = (text(0, ""), text(1, "Yes"), text(2, "No"));
                if !fx {
                    return Ok(Value::Bool(false));
                }
                log::trace!("prompt for yes/no: {prompt:?}");
                self.dialog(name)?
                    .get_boolean(&prompt, &yes, &no)
                    .map(Value::Bool)
                    .ok_or_else(|| cancelled(name))
            }
            other => Err(ExprError::host(format!("\"{}\" is not available", other.name()))),
        }
    }

    fn dialog(&mut self, func: &str) -> Result<&mut Box<dyn DialogProvider>, ExprError> {
        match self.dialog.as_deref_mut() {
            Some(d) => Ok(d),
            None => Err(ExprError::host(format!("No dialog available for \"{func}\""))),
        }
    }
}

fn cancelled(func: &str) -> ExprError {
    ExprError::host(format!("Input cancelled for \"{func}\""))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::dialog::{Answer, ScriptedDialog};
    use crate::expr::symbols::NoSymbols;

    fn eval(text: &str) -> Result<Value, ExprError> {
        Evaluator::default().evaluate(text)
    }

    fn err(text: &str) -> String {
        eval(text).unwrap_err().to_string()
    }

    #[test]
    fn precedence() {
        assert_eq!(eval("1 + 2 * 3"), Ok(Value::Int(7)));
        assert_eq!(eval("(1 + 2) * 3"), Ok(Value::Int(9)));
        assert_eq!(eval("1 << 2 + 1"), Ok(Value::Int(8)));
        assert_eq!(eval("6 & 3 == 3"), Err(ExprError::type_error("Bitwise AND requires integer operands")));
        assert_eq!(
            eval("1 < 2 == 2 > 1"),
            Err(ExprError::type_error("Illegal operand types for comparison"))
        );
        assert_eq!(eval("2 + 3 == 10 / 2"), Ok(Value::Bool(true)));
        assert_eq!(eval("10 - 4 - 3"), Ok(Value::Int(3)));
        assert_eq!(eval("1, 2, 3"), Ok(Value::Int(3)));
    }

    #[test]
    fn assignment_is_right_associative() {
        let mut ev = Evaluator::new(NoSymbols);
        assert_eq!(ev.evaluate("a = b = 4"), Ok(Value::Int(4)));
        assert_eq!(ev.vars().get("a"), Some(&Value::Int(4)));
        assert_eq!(ev.vars().get("b"), Some(&Value::Int(4)));
        assert_eq!(ev.evaluate("a -= b += 1"), Ok(Value::Int(-1)));
    }

    #[test]
    fn nested_ternary_skips_untaken() {
        assert_eq!(eval("false ? true ? 1 : 2 : 3"), Ok(Value::Int(3)));
        assert_eq!(eval("true ? 1 : false ? 2 : 3"), Ok(Value::Int(1)));
        assert_eq!(eval("true ? 1 : nope(2)[0]"), Ok(Value::Int(1)));
        assert_eq!(err("true ? 1 : (2]"), "Closing parenthesis expected");
        assert_eq!(err("false ? [1) : 2"), "Closing bracket (]) expected");
        assert_eq!(err("true ? 1 : 2 ]"), "Unexpected ] after end of expression");
        assert_eq!(err("true ? 1 : (2"), "Closing parenthesis expected");
        assert_eq!(err("true ? 1 :"), "Expected \"else\" expression for conditional (?:) operator");
    }

    #[test]
    fn trailing_tokens() {
        assert_eq!(err("1 2"), "Unexpected 2 after end of expression");
        assert_eq!(err(")"), "Expected expression");
    }

    #[test]
    fn depth_limit() {
        let deep = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(eval(&deep), Err(ExprError::TooComplex));
        let ok = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        assert_eq!(eval(&ok), Ok(Value::Int(1)));
        assert_eq!(eval(&"-".repeat(1000)), Err(ExprError::TooComplex));
        assert_eq!(eval(&("a = ".repeat(3000) + "1")), Err(ExprError::TooComplex));
        assert_eq!(eval(&("false ? 1 : ".repeat(3000) + "1")), Err(ExprError::TooComplex));
        assert_eq!(eval(&("true ? ".repeat(3000) + "1")), Err(ExprError::TooComplex));
        assert_eq!(eval(&("a = ".repeat(20) + "1")), Ok(Value::Int(1)));
    }

    #[test]
    fn suppressed_prompt_returns_initial() {
        let mut ev = Evaluator::new(NoSymbols);
        assert_eq!(ev.evaluate("false && get_int(\"n\", 5) == 5"), Ok(Value::Bool(false)));
        assert_eq!(err("get_int(\"n\")"), "No dialog available for \"get_int\"");

        let mut ev = Evaluator::new(NoSymbols)
            .with_dialog(Box::new(ScriptedDialog::new([Answer::Int(7), Answer::Cancel])));
        assert_eq!(ev.evaluate("getint(\"n\", 0, 0, 9)"), Ok(Value::Int(7)));
        assert_eq!(
            ev.evaluate("get_string(\"s\")").unwrap_err().to_string(),
            "Input cancelled for \"get_string\""
        );
    }

    #[test]
    fn last_error_follows_legacy_option() {
        let mut ev = Evaluator::new(NoSymbols);
        assert!(ev.evaluate("2 *").is_err());
        assert_eq!(ev.last_error(), Some("Expected 2nd operand for multiplication"));
        ev.options_mut().legacy_messages = true;
        assert!(ev.evaluate("2 *").is_err());
        assert_eq!(ev.last_error(), Some("Not implemented"));
        assert!(ev.evaluate("2 * 2").is_ok());
        assert_eq!(ev.last_error(), None);
    }

    #[test]
    fn seeded_rand_repeats() {
        let mut a = Evaluator::new(NoSymbols);
        let mut b = Evaluator::new(NoSymbols);
        a.seed_rand(42);
        b.seed_rand(42);
        for _ in 0..3 {
            assert_eq!(a.evaluate("rand()"), b.evaluate("rand()"));
        }
    }
}
