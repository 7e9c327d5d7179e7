//! Built-in functions.
//!
//! The evaluator parses the argument list itself, checking each argument
//! with [`Builtin::check_arg`] as soon as it is evaluated, and then hands the
//! values to [`call_builtin`].  The few functions that need the host or the
//! evaluator's state (`rand`, `get` and the prompts) are answered by the
//! evaluator.

use std::cmp::Ordering;

use super::ebcdic;
use super::error::ExprError;
use super::value::{sar, shl, Value};
use crate::datetime;
use crate::format::parse_int_prefix;

/// Words that start something other than a symbol.
const CONSTANTS: &[&str] = &["true", "false", "pi"];
const INTROSPECTION: &[&str] = &["sizeof", "addressof", "string", "defined"];
/// Reserved for template control statements.
pub const RESERVED: &[&str] = &["end", "next", "index", "member"];

/// True for any keyword (lower-case `word`).
pub fn is_keyword(word: &str) -> bool {
    CONSTANTS.contains(&word)
        || INTROSPECTION.contains(&word)
        || RESERVED.contains(&word)
        || Builtin::lookup(word).is_some()
}

// ── Builtin ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    // Numeric
    Abs,
    Min,
    Max,
    Fact,
    Pow,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Exp,
    Log,
    Int,
    Rand,
    // Bits
    Flip,
    Reverse,
    Rol,
    Ror,
    Asr,
    // Dates
    Date,
    Time,
    Now,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    // Strings
    Atoi,
    Atof,
    Strlen,
    Left,
    Right,
    Mid,
    Ltrim,
    Rtrim,
    Strchr,
    Strstr,
    Strcmp,
    Stricmp,
    Asc2Ebc,
    Ebc2Asc,
    // Host
    Get,
    GetInt,
    GetString,
    GetBool,
}

const ORDINALS: [&str; 3] = ["1st", "2nd", "3rd"];

impl Builtin {
    /// Find a function by its lower-case name.
    pub fn lookup(name: &str) -> Option<Builtin> {
        use Builtin::*;
        Some(match name {
            "abs" => Abs,
            "min" => Min,
            "max" => Max,
            "fact" => Fact,
            "pow" => Pow,
            "sqrt" => Sqrt,
            "sin" => Sin,
            "cos" => Cos,
            "tan" => Tan,
            "asin" => Asin,
            "acos" => Acos,
            "atan" => Atan,
            "exp" => Exp,
            "log" => Log,
            "int" => Int,
            "rand" => Rand,
            "flip" => Flip,
            "reverse" => Reverse,
            "rol" => Rol,
            "ror" => Ror,
            "asr" => Asr,
            "date" => Date,
            "time" => Time,
            "now" => Now,
            "year" => Year,
            "month" => Month,
            "day" => Day,
            "hour" => Hour,
            "minute" => Minute,
            "second" => Second,
            "atoi" => Atoi,
            "atof" => Atof,
            "strlen" => Strlen,
            "left" => Left,
            "right" => Right,
            "mid" => Mid,
            "ltrim" => Ltrim,
            "rtrim" => Rtrim,
            "strchr" => Strchr,
            "strstr" => Strstr,
            "strcmp" => Strcmp,
            "stricmp" => Stricmp,
            "asc2ebc" => Asc2Ebc,
            "ebc2asc" => Ebc2Asc,
            "get" => Get,
            "get_int" | "getint" => GetInt,
            "get_string" | "getstring" => GetString,
            "get_bool" | "getbool" => GetBool,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        use Builtin::*;
        match self {
            Abs => "abs",
            Min => "min",
            Max => "max",
            Fact => "fact",
            Pow => "pow",
            Sqrt => "sqrt",
            Sin => "sin",
            Cos => "cos",
            Tan => "tan",
            Asin => "asin",
            Acos => "acos",
            Atan => "atan",
            Exp => "exp",
            Log => "log",
            Int => "int",
            Rand => "rand",
            Flip => "flip",
            Reverse => "reverse",
            Rol => "rol",
            Ror => "ror",
            Asr => "asr",
            Date => "date",
            Time => "time",
            Now => "now",
            Year => "year",
            Month => "month",
            Day => "day",
            Hour => "hour",
            Minute => "minute",
            Second => "second",
            Atoi => "atoi",
            Atof => "atof",
            Strlen => "strlen",
            Left => "left",
            Right => "right",
            Mid => "mid",
            Ltrim => "ltrim",
            Rtrim => "rtrim",
            Strchr => "strchr",
            Strstr => "strstr",
            Strcmp => "strcmp",
            Stricmp => "stricmp",
            Asc2Ebc => "asc2ebc",
            Ebc2Asc => "ebc2asc",
            Get => "get",
            GetInt => "get_int",
            GetString => "get_string",
            GetBool => "get_bool",
        }
    }

    /// Minimum and maximum argument counts; `None` for no maximum.
    pub fn arity(self) -> (usize, Option<usize>) {
        use Builtin::*;
        match self {
            Rand | Now => (0, Some(0)),
            Min | Max => (1, None),
            Pow | Flip | Left | Right | Strchr | Strstr | Strcmp | Stricmp | Get => (2, Some(2)),
            Reverse | GetString => (1, Some(2)),
            Rol | Ror | Asr | GetBool => (1, Some(3)),
            Mid => (2, Some(3)),
            GetInt => (1, Some(4)),
            _ => (1, Some(1)),
        }
    }

    /// Message for an argument that is absent where an expression should be.
    pub fn missing_arg(self, index: usize) -> String {
        let name = self.name();
        match (self, index) {
            (Builtin::Strlen, _) => format!("Expected string parameter to \"{name}\""),
            (Builtin::Pow, 1) => format!("Expected comma and 2nd parameter for \"{name}\""),
            (Builtin::Min | Builtin::Max, i) if i > 0 => format!("Expected parameter for \"{name}\""),
            (Builtin::Ltrim | Builtin::Rtrim, _) => format!("Expected 1st parameter to \"{name}\""),
            _ if self.arity() == (1, Some(1)) => format!("Expected parameter for \"{name}\""),
            (_, i) => format!("Expected {} parameter to \"{name}\"", ORDINALS[i.min(2)]),
        }
    }

    /// Error for a closing parenthesis where a required 2nd argument belongs.
    pub fn missing_comma(self) -> ExprError {
        let msg = format!("Expected comma and 2nd parameter for \"{}\"", self.name());
        if self == Builtin::Mid {
            ExprError::Missing(msg)
        } else {
            ExprError::syntax(msg)
        }
    }

    /// Error when the argument list doesn't end where it may.
    pub fn unclosed(self, supplied: usize) -> ExprError {
        if self == Builtin::Mid && supplied == 2 {
            ExprError::syntax("Closing parenthesis/3rd parameter expected for \"mid\"")
        } else {
            ExprError::syntax(format!("Closing parenthesis expected for \"{}\"", self.name()))
        }
    }

    /// Type-check argument `index` as soon as it has been evaluated.
    pub fn check_arg(self, index: usize, v: &Value) -> Result<(), ExprError> {
        use Builtin::*;
        let name = self.name();
        let (ok, msg) = match self {
            Abs | Min | Max | Pow | Sqrt | Sin | Cos | Tan | Asin | Acos | Atan | Exp | Log => {
                (v.is_numeric(), format!("Parameter for \"{name}\" must be numeric"))
            }
            Fact => (is_int(v), format!("Parameter for \"{name}\" must be an integer")),
            Flip => (is_int(v), format!("Parameters for \"{name}\" must be integers")),
            Reverse if index == 0 => (is_int(v), format!("First parameter for \"{name}\" must be an integer")),
            Reverse => (is_int(v), format!("Bits (2nd) parameter for \"{name}\" must be an integer")),
            Rol | Ror | Asr => (
                is_int(v),
                format!("{} parameter for \"{name}\" must be an integer", ORDINALS[index.min(2)]),
            ),
            Int => (
                matches!(v, Value::Int(_) | Value::Real(_) | Value::Bool(_)),
                format!("Parameter for \"{name}\" must be numeric or boolean"),
            ),
            Date => (is_str(v), format!("Parameter for \"{name}\" must be a date string")),
            Time => (is_str(v), format!("Parameter for \"{name}\" must be a time string")),
            Year | Month | Day | Hour | Minute | Second => {
                (v.is_numeric(), format!("Parameter for \"{name}\" must be a number"))
            }
            Atoi | Atof | Strlen | Ltrim | Rtrim | Asc2Ebc | Ebc2Asc => {
                (is_str(v), format!("Parameter for \"{name}\" must be a string"))
            }
            Left | Right | Mid | Strchr | Strstr | Strcmp | Stricmp if index == 0 => {
                (is_str(v), format!("First parameter for \"{name}\" must be a string"))
            }
            Strstr | Strcmp | Stricmp => {
                (is_str(v), format!("Second parameter for \"{name}\" must be an string"))
            }
            Left | Right | Mid | Strchr if index == 1 => {
                (is_int(v), format!("Second parameter for \"{name}\" must be an integer"))
            }
            Mid => (is_int(v), format!("Third parameter for \"{name}\" must be an integer")),
            Get => (is_int(v), format!("Parameters for \"{name}\" must be integers")),
            GetInt | GetString | GetBool if index == 0 => {
                (is_str(v), format!("First parameter for \"{name}\" must be a string"))
            }
            GetInt => (is_int(v), format!("Parameters after the prompt for \"{name}\" must be integers")),
            GetString => (is_str(v), format!("Second parameter for \"{name}\" must be a string")),
            GetBool => (is_str(v), format!("Button text for \"{name}\" must be a string")),
            Rand | Now | Left | Right | Strchr => (true, String::new()),
        };
        if ok {
            Ok(())
        } else {
            Err(ExprError::Type(msg))
        }
    }
}

fn is_int(v: &Value) -> bool {
    matches!(v, Value::Int(_))
}

fn is_str(v: &Value) -> bool {
    matches!(v, Value::Str(_))
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

/// Evaluate a built-in on already-checked arguments.
///
/// Returns `None` for the functions the evaluator answers itself.
pub fn call_builtin(b: Builtin, args: &[Value]) -> Option<Result<Value, ExprError>> {
    use Builtin::*;
    let v = match b {
        Rand | Get | GetInt | GetString | GetBool => return None,

        // ── Numeric ─────────────────────────────────────────────────────────
        Abs => match &args[0] {
            Value::Int(n) => Value::Int(n.wrapping_abs()),
            other => Value::Real(real(other).abs()),
        },
        Min => extreme(args, Ordering::Less),
        Max => extreme(args, Ordering::Greater),
        Fact => {
            let n = int(&args[0]);
            if n > 99 {
                return Some(Err(ExprError::domain("Parameter for \"fact\" is too big")));
            }
            Value::Int((2..=n.max(1)).fold(1i64, |acc, k| acc.wrapping_mul(k)))
        }
        Pow => return Some(pow(&args[0], &args[1])),
        Sqrt => return Some(sqrt(&args[0])),
        Sin => Value::Real(real(&args[0]).sin()),
        Cos => Value::Real(real(&args[0]).cos()),
        Tan => Value::Real(real(&args[0]).tan()),
        Asin => Value::Real(real(&args[0]).asin()),
        Acos => Value::Real(real(&args[0]).acos()),
        Atan => Value::Real(real(&args[0]).atan()),
        Exp => Value::Real(real(&args[0]).exp()),
        Log => Value::Real(real(&args[0]).ln()),
        Int => Value::Int(match &args[0] {
            Value::Int(n) => *n,
            Value::Real(x) => *x as i64,
            Value::Bool(b) => i64::from(*b),
            _ => 0,
        }),

        // ── Bits ────────────────────────────────────────────────────────────
        Flip => {
            let bytes = int(&args[1]).clamp(0, 8) as usize;
            let le = int(&args[0]).to_le_bytes();
            let mut out = [0u8; 8];
            for i in 0..bytes {
                out[bytes - 1 - i] = le[i];
            }
            Value::Int(i64::from_le_bytes(out))
        }
        Reverse => {
            let bits = args.get(1).map_or(64, int).clamp(0, 64);
            if bits == 0 {
                Value::Int(0)
            } else {
                Value::Int(((int(&args[0]) as u64).reverse_bits() >> (64 - bits)) as i64)
            }
        }
        Rol | Ror | Asr => {
            let v = int(&args[0]);
            let mut shift = args.get(1).map_or(1, int);
            let size = args.get(2).map_or(64, int).clamp(0, 64);
            if shift > 64 {
                shift = 0;
            }
            let r = match b {
                Rol => shl(v, shift) | sar(v, size - shift),
                Ror => sar(v, shift) | shl(v, size - shift),
                _ => sar(v, shift),
            };
            Value::Int(mask(r, size))
        }

        // ── Dates ───────────────────────────────────────────────────────────
        Date => Value::Date(datetime::parse_date(text(&args[0])).unwrap_or(datetime::INVALID_DATE)),
        Time => Value::Date(datetime::parse_time(text(&args[0])).unwrap_or(datetime::INVALID_DATE)),
        Now => Value::Date(datetime::now()),
        Year => Value::Real((real(&args[0]) * 365.25).round()),
        Month => Value::Real((real(&args[0]) * 365.25 / 12.0).round()),
        Day => Value::Real(real(&args[0]).round()),
        Hour => Value::Real(real(&args[0]) / 24.0),
        Minute => Value::Real(real(&args[0]) / 1440.0),
        Second => Value::Real(real(&args[0]) / 86_400.0),

        // ── Strings ─────────────────────────────────────────────────────────
        Atoi => Value::Int(parse_int_prefix(text(&args[0]), 10)),
        Atof => Value::Real(parse_real_prefix(text(&args[0]))),
        Strlen => Value::Int(text(&args[0]).chars().count() as i64),
        Left => {
            let n = count(&args[1]);
            Value::Str(text(&args[0]).chars().take(n).collect())
        }
        Right => {
            let chars: Vec<char> = text(&args[0]).chars().collect();
            let n = count(&args[1]).min(chars.len());
            Value::Str(chars[chars.len() - n..].iter().collect())
        }
        Mid => {
            let start = count(&args[1]);
            let n = args.get(2).map_or(usize::MAX, count);
            Value::Str(text(&args[0]).chars().skip(start).take(n).collect())
        }
        Ltrim => Value::Str(text(&args[0]).trim_start().to_owned()),
        Rtrim => Value::Str(text(&args[0]).trim_end().to_owned()),
        Strchr => {
            let s = text(&args[0]);
            let code = int(&args[1]);
            // Searching for NUL finds the terminator.
            let pos = if code == 0 {
                Some(s.chars().count())
            } else {
                u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .and_then(|c| s.chars().position(|x| x == c))
            };
            Value::Int(pos.map_or(-1, |p| p as i64))
        }
        Strstr => {
            let (s, sub) = (text(&args[0]), text(&args[1]));
            Value::Int(s.find(sub).map_or(-1, |byte| s[..byte].chars().count() as i64))
        }
        Strcmp => Value::Int(ordering(text(&args[0]).cmp(text(&args[1])))),
        Stricmp => Value::Int(ordering(
            text(&args[0])
                .to_lowercase()
                .cmp(&text(&args[1]).to_lowercase()),
        )),
        Asc2Ebc => Value::Str(ebcdic::str_to_ebcdic(text(&args[0]))),
        Ebc2Asc => Value::Str(ebcdic::str_from_ebcdic(text(&args[0]))),
    };
    Some(Ok(v))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn int(v: &Value) -> i64 {
    v.as_int().unwrap_or(0)
}

fn real(v: &Value) -> f64 {
    v.as_real().unwrap_or(0.0)
}

fn text(v: &Value) -> &str {
    v.as_str().unwrap_or("")
}

/// A character count; negative counts are zero.
fn count(v: &Value) -> usize {
    usize::try_from(int(v)).unwrap_or(0)
}

fn ordering(o: Ordering) -> i64 {
    match o {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

/// Keep the low `bits` bits.
fn mask(v: i64, bits: i64) -> i64 {
    match bits {
        64.. => v,
        ..=0 => 0,
        b => v & ((1i64 << b) - 1),
    }
}

/// `min`/`max`: an integer result only when every argument is an integer.
fn extreme(args: &[Value], want: Ordering) -> Value {
    if args.iter().all(|a| matches!(a, Value::Int(_))) {
        let best = args.iter().map(int).reduce(|a, b| if b.cmp(&a) == want { b } else { a });
        return Value::Int(best.unwrap_or(0));
    }
    let best = args
        .iter()
        .map(real)
        .reduce(|a, b| if b.partial_cmp(&a) == Some(want) { b } else { a });
    Value::Real(best.unwrap_or(0.0))
}

fn pow(base: &Value, exp: &Value) -> Result<Value, ExprError> {
    if let (Value::Int(b), Value::Int(e)) = (base, exp) {
        return Ok(Value::Int(match (*b, *e) {
            (b, e) if e >= 0 => b.wrapping_pow(u32::try_from(e).unwrap_or(u32::MAX)),
            (1, _) => 1,
            (-1, e) => if e % 2 == 0 { 1 } else { -1 },
            _ => 0,
        }));
    }
    let r = real(base).powf(real(exp));
    if r.is_nan() {
        return Err(ExprError::domain("Invalid parameters to pow"));
    }
    Ok(Value::Real(r))
}

fn sqrt(v: &Value) -> Result<Value, ExprError> {
    let negative = ExprError::domain("Parameter for \"sqrt\" must not be negative");
    match v {
        Value::Int(n) if *n < 0 => Err(negative),
        Value::Int(n) => Ok(Value::Int(isqrt(*n as u64) as i64)),
        other => {
            let x = real(other);
            if x < 0.0 {
                Err(negative)
            } else {
                Ok(Value::Real(x.sqrt()))
            }
        }
    }
}

/// Floor of the square root.
fn isqrt(n: u64) -> u64 {
    let mut r = (n as f64).sqrt() as u64;
    while r.checked_mul(r).map_or(true, |sq| sq > n) {
        r -= 1;
    }
    while (r + 1).checked_mul(r + 1).is_some_and(|sq| sq <= n) {
        r += 1;
    }
    r
}

/// Leading real number of `s`, like C `atof`; 0 when there is none.
fn parse_real_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if bytes.get(end) == Some(&b'.') {
        end += 1;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
    }
    if end == digits_start || &s[digits_start..end] == "." {
        return 0.0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut e = end + 1;
        if matches!(bytes.get(e), Some(b'+' | b'-')) {
            e += 1;
        }
        if bytes.get(e).is_some_and(u8::is_ascii_digit) {
            while bytes.get(e).is_some_and(u8::is_ascii_digit) {
                e += 1;
            }
            end = e;
        }
    }
    s[..end].parse().unwrap_or(0.0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Value>) -> Value {
        let b = Builtin::lookup(name).unwrap();
        for (i, a) in args.iter().enumerate() {
            b.check_arg(i, a).unwrap();
        }
        call_builtin(b, &args).unwrap().unwrap()
    }

    #[test]
    fn lookup_aliases() {
        assert_eq!(Builtin::lookup("getint"), Some(Builtin::GetInt));
        assert_eq!(Builtin::lookup("get_int"), Some(Builtin::GetInt));
        assert_eq!(Builtin::lookup("nope"), None);
        assert!(is_keyword("sizeof"));
        assert!(is_keyword("member"));
        assert!(!is_keyword("add"));
    }

    #[test]
    fn fact_wraps() {
        assert_eq!(call("fact", vec![Value::Int(20)]), Value::Int(2432902008176640000));
        assert_eq!(call("fact", vec![Value::Int(21)]), Value::Int(-4249290049419214848));
        assert_eq!(call("fact", vec![Value::Int(99)]), Value::Int(0));
        assert_eq!(call("fact", vec![Value::Int(-1)]), Value::Int(1));
        let err = call_builtin(Builtin::Fact, &[Value::Int(100)]).unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Parameter for \"fact\" is too big");
    }

    #[test]
    fn bit_functions() {
        assert_eq!(call("flip", vec![Value::Int(0xFF), Value::Int(2)]), Value::Int(0xFF00));
        assert_eq!(
            call("flip", vec![Value::Int(0xFEDCBA9876543210u64 as i64), Value::Int(8)]),
            Value::Int(0x1032547698BADCFE)
        );
        assert_eq!(call("reverse", vec![Value::Int(1), Value::Int(3)]), Value::Int(4));
        assert_eq!(call("reverse", vec![Value::Int(1), Value::Int(-1)]), Value::Int(0));
        assert_eq!(call("rol", vec![Value::Int(-1), Value::Int(3), Value::Int(4)]), Value::Int(15));
        assert_eq!(call("ror", vec![Value::Int(1)]), Value::Int(i64::MIN));
        assert_eq!(call("asr", vec![Value::Int(8), Value::Int(3), Value::Int(4)]), Value::Int(1));
        assert_eq!(
            call("asr", vec![Value::Int(i64::MIN), Value::Int(65)]),
            Value::Int(i64::MIN)
        );
    }

    #[test]
    fn pow_cases() {
        assert_eq!(call("pow", vec![Value::Int(2), Value::Int(10)]), Value::Int(1024));
        assert_eq!(call("pow", vec![Value::Int(2), Value::Int(-1)]), Value::Int(0));
        assert_eq!(call("pow", vec![Value::Real(2.0), Value::Int(-1)]), Value::Real(0.5));
        let err = call_builtin(Builtin::Pow, &[Value::Real(-2.0), Value::Real(0.5)])
            .unwrap()
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameters to pow");
    }

    #[test]
    fn integer_sqrt() {
        assert_eq!(call("sqrt", vec![Value::Int(4611686018427387904)]), Value::Int(2147483648));
        assert_eq!(call("sqrt", vec![Value::Int(15)]), Value::Int(3));
        assert_eq!(call("sqrt", vec![Value::Int(i64::MAX)]), Value::Int(3037000499));
    }

    #[test]
    fn string_functions() {
        let s = |x: &str| Value::Str(x.into());
        assert_eq!(call("mid", vec![s("TEST"), Value::Int(1), Value::Int(2)]), s("ES"));
        assert_eq!(call("right", vec![s("TEST"), Value::Int(9)]), s("TEST"));
        assert_eq!(call("strchr", vec![s("TEST"), Value::Int('S' as i64)]), Value::Int(2));
        assert_eq!(call("strchr", vec![s("TEST"), Value::Int(0)]), Value::Int(4));
        assert_eq!(call("strstr", vec![s("TEST"), s("X")]), Value::Int(-1));
        assert_eq!(call("stricmp", vec![s("A"), s("a")]), Value::Int(0));
        assert_eq!(call("strcmp", vec![s("AA"), s("A")]), Value::Int(1));
        assert_eq!(call("atoi", vec![s("-23xyz")]), Value::Int(-23));
        assert_eq!(call("atof", vec![s(" 1.5e2 apples")]), Value::Real(150.0));
        assert_eq!(call("atof", vec![s("abc")]), Value::Real(0.0));
    }

    #[test]
    fn argument_messages() {
        let check = |b: Builtin, i: usize, v: Value| b.check_arg(i, &v).unwrap_err().to_string();
        assert_eq!(
            check(Builtin::Stricmp, 1, Value::Int(1)),
            "Second parameter for \"stricmp\" must be an string"
        );
        assert_eq!(
            check(Builtin::Asr, 2, Value::Str("X".into())),
            "3rd parameter for \"asr\" must be an integer"
        );
        assert_eq!(
            check(Builtin::Mid, 2, Value::Str("X".into())),
            "Third parameter for \"mid\" must be an integer"
        );
        assert_eq!(Builtin::Mid.missing_arg(2), "Expected 3rd parameter to \"mid\"");
        assert_eq!(Builtin::Abs.missing_arg(0), "Expected parameter for \"abs\"");
        assert_eq!(Builtin::Min.missing_arg(0), "Expected 1st parameter to \"min\"");
        assert_eq!(Builtin::Min.missing_arg(1), "Expected parameter for \"min\"");
    }
}
