//! Runtime value type for the expression language.
//!
//! Unlike a scripting language there is no implicit string/number coercion:
//! every operator checks the operand kinds and fails with its own message.
//! `Blob`, `Struct` and `Array` are markers only; the data behind them is
//! reached by asking the [`SymbolResolver`](super::SymbolResolver) again with
//! the container as parent.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;

use super::error::ExprError;
use crate::datetime::{self, INVALID_DATE};

/// A value produced by any (sub)expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absence of a value, e.g. an unknown symbol.
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Real(f64),
    /// Fractional days since 1899-12-30 (OLE automation date).
    Date(f64),
    Str(String),
    Blob,
    Struct,
    Array,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => Ok(()),
            Value::Bool(true) => f.write_str("TRUE"),
            Value::Bool(false) => f.write_str("FALSE"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Real(x) => write!(f, "{x}"),
            Value::Date(d) => match datetime::ole_to_naive(*d) {
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
                None => f.write_str(datetime::INVALID_DATE_TEXT),
            },
            Value::Str(s) => f.write_str(s),
            Value::Blob | Value::Struct | Value::Array => Ok(()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<u8> for Value {
    fn from(n: u8) -> Self {
        Value::Int(n as i64)
    }
}

/// Characters become their code, as in C.
impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Int(c as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Real(x)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Real(x as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::Date(datetime::naive_to_ole(dt))
    }
}

impl Value {
    /// The sentinel date that marks a failed conversion.
    pub fn invalid_date() -> Self {
        Value::Date(INVALID_DATE)
    }

    /// Type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NONE",
            Value::Bool(_) => "BOOLEAN",
            Value::Int(_) => "INT",
            Value::Real(_) => "REAL",
            Value::Date(_) => "DATE",
            Value::Str(_) => "STRING",
            Value::Blob => "BLOB",
            Value::Struct => "STRUCT",
            Value::Array => "ARRAY",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Real(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::Blob | Value::Struct | Value::Array)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view of Int and Real.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Real(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Storage size in bytes when the value lives in a variable.
    ///
    /// Strings count two bytes per UTF-16 unit.
    pub fn var_size(&self) -> i64 {
        match self {
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Real(_) | Value::Date(_) => 8,
            Value::Str(s) => 2 * s.encode_utf16().count() as i64,
            Value::None | Value::Blob | Value::Struct | Value::Array => 0,
        }
    }

    /// Character code at `index`, for `str[index]`.
    pub fn char_at(&self, index: i64) -> Result<Value, ExprError> {
        let Value::Str(s) = self else {
            return Err(ExprError::symbol("Unexpected array index"));
        };
        usize::try_from(index)
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(Value::from)
            .ok_or_else(|| ExprError::symbol("Index on string out of bounds"))
    }

    // ── Arithmetic ────────────────────────────────────────────────────────────

    pub fn add(&self, rhs: &Value) -> Result<Value, ExprError> {
        Ok(match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(*b)),
            (Value::Str(a), Value::Str(b)) => Value::Str(format!("{a}{b}")),
            (Value::Date(d), n) | (n, Value::Date(d)) if n.is_numeric() => {
                Value::Date(d + n.as_real().unwrap_or_default())
            }
            (a, b) => match (a.as_real(), b.as_real()) {
                (Some(x), Some(y)) => Value::Real(x + y),
                _ => return Err(ExprError::type_error("Illegal operand types for addition")),
            },
        })
    }

    pub fn sub(&self, rhs: &Value) -> Result<Value, ExprError> {
        Ok(match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_sub(*b)),
            (Value::Date(a), Value::Date(b)) => Value::Real(a - b),
            (Value::Date(d), n) if n.is_numeric() => {
                Value::Date(d - n.as_real().unwrap_or_default())
            }
            (a, b) => match (a.as_real(), b.as_real()) {
                (Some(x), Some(y)) => Value::Real(x - y),
                _ => {
                    return Err(ExprError::type_error("Illegal operand types for subtraction"))
                }
            },
        })
    }

    pub fn mul(&self, rhs: &Value) -> Result<Value, ExprError> {
        Ok(match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_mul(*b)),
            (a, b) => match (a.as_real(), b.as_real()) {
                (Some(x), Some(y)) => Value::Real(x * y),
                _ => {
                    return Err(ExprError::type_error(
                        "Illegal operand types for multiplication",
                    ))
                }
            },
        })
    }

    pub fn div(&self, rhs: &Value) -> Result<Value, ExprError> {
        match (self, rhs) {
            (Value::Int(_), Value::Int(0)) => Err(ExprError::domain("Integer divide by zero")),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_div(*b))),
            (a, b) => match (a.as_real(), b.as_real()) {
                (Some(_), Some(y)) if y == 0.0 => Err(ExprError::domain("Divide by zero")),
                (Some(x), Some(y)) => Ok(Value::Real(x / y)),
                _ => Err(ExprError::type_error("Illegal operand types for division")),
            },
        }
    }

    pub fn rem(&self, rhs: &Value) -> Result<Value, ExprError> {
        match (self, rhs) {
            (Value::Int(_), Value::Int(0)) => {
                Err(ExprError::domain("Divide by zero (modulus operation)"))
            }
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_rem(*b))),
            _ => Err(ExprError::type_error("Modulus operands must be integers")),
        }
    }

    // ── Bitwise ───────────────────────────────────────────────────────────────

    pub fn shift_left(&self, rhs: &Value) -> Result<Value, ExprError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(shl(*a, *b))),
            _ => Err(ExprError::type_error("Left shift operands must be integers")),
        }
    }

    pub fn shift_right(&self, rhs: &Value) -> Result<Value, ExprError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(sar(*a, *b))),
            _ => Err(ExprError::type_error("Right shift operands must be integers")),
        }
    }

    pub fn bit_and(&self, rhs: &Value) -> Result<Value, ExprError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a & b)),
            _ => Err(ExprError::type_error("Bitwise AND requires integer operands")),
        }
    }

    pub fn bit_xor(&self, rhs: &Value) -> Result<Value, ExprError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a ^ b)),
            _ => Err(ExprError::type_error("Exclusive OR (^) requires integer operands")),
        }
    }

    pub fn bit_or(&self, rhs: &Value) -> Result<Value, ExprError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a | b)),
            _ => Err(ExprError::type_error("Bitwise OR requires integer operands")),
        }
    }

    // ── Unary ─────────────────────────────────────────────────────────────────

    pub fn negate(&self) -> Result<Value, ExprError> {
        match self {
            Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
            Value::Real(x) => Ok(Value::Real(-x)),
            _ => Err(ExprError::type_error("Invalid operand for negation")),
        }
    }

    pub fn unary_plus(&self) -> Result<Value, ExprError> {
        match self {
            Value::Int(_) | Value::Real(_) => Ok(self.clone()),
            _ => Err(ExprError::type_error("Invalid operand for unary +")),
        }
    }

    pub fn logical_not(&self) -> Result<Value, ExprError> {
        match self {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            _ => Err(ExprError::type_error("NOT operator must have a BOOLEAN operand")),
        }
    }

    pub fn bit_not(&self) -> Result<Value, ExprError> {
        match self {
            Value::Int(n) => Ok(Value::Int(!n)),
            _ => Err(ExprError::type_error(
                "Bitwise NOT operator must have an INTEGER operand",
            )),
        }
    }

    // ── Comparison ────────────────────────────────────────────────────────────

    /// Order two values for the comparison operators.
    ///
    /// Strings compare by code point, dates by day count and numbers after
    /// promotion to real.  `Ok(None)` means the operands are unordered (NaN).
    pub fn compare(&self, rhs: &Value) -> Result<Option<Ordering>, ExprError> {
        match (self, rhs) {
            (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
            (Value::Date(a), Value::Date(b)) => Ok(a.partial_cmp(b)),
            (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
            (a, b) => match (a.as_real(), b.as_real()) {
                (Some(x), Some(y)) => Ok(x.partial_cmp(&y)),
                _ => Err(ExprError::type_error("Illegal operand types for comparison")),
            },
        }
    }
}

// ── Shift helpers ─────────────────────────────────────────────────────────────

/// Left shift that yields 0 when `n` is outside `0..64`.
pub(crate) fn shl(v: i64, n: i64) -> i64 {
    if (0..64).contains(&n) {
        ((v as u64) << n) as i64
    } else {
        0
    }
}

/// Arithmetic right shift that fills with the sign bit when `n` is outside
/// `0..64`.
pub(crate) fn sar(v: i64, n: i64) -> i64 {
    if (0..64).contains(&n) {
        v >> n
    } else if v < 0 {
        -1
    } else {
        0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Real(123.456).to_string(), "123.456");
        assert_eq!(Value::Bool(true).to_string(), "TRUE");
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(Value::None.to_string(), "");
        assert_eq!(Value::invalid_date().to_string(), "##Invalid date##");
    }

    #[test]
    fn char_is_its_code() {
        assert_eq!(Value::from('X'), Value::Int(0x58));
    }

    #[test]
    fn clone_is_deep() {
        let a = Value::from("test string value");
        let b = a.clone();
        if let (Value::Str(x), Value::Str(y)) = (&a, &b) {
            assert_ne!(x.as_ptr(), y.as_ptr());
            assert_eq!(x, y);
        } else {
            panic!("expected strings");
        }
    }

    #[test]
    fn add_promotes() {
        assert_eq!(Value::Int(1).add(&Value::Int(1)), Ok(Value::Int(2)));
        assert_eq!(Value::Int(1).add(&Value::Real(1.0)), Ok(Value::Real(2.0)));
        assert_eq!(Value::from("Y").add(&Value::from("Y")), Ok(Value::from("YY")));
        assert_eq!(Value::Date(10.0).add(&Value::Int(1)), Ok(Value::Date(11.0)));
        assert_eq!(Value::Real(1.5).add(&Value::Date(10.0)), Ok(Value::Date(11.5)));
    }

    #[test]
    fn add_rejects_booleans() {
        let e = Value::Bool(true).add(&Value::Bool(false)).unwrap_err();
        assert_eq!(e.to_string(), "Illegal operand types for addition");
    }

    #[test]
    fn date_minus_date_is_real() {
        assert_eq!(Value::Date(5.0).sub(&Value::Date(4.0)), Ok(Value::Real(1.0)));
        assert_eq!(Value::Date(5.0).sub(&Value::Real(1.5)), Ok(Value::Date(3.5)));
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(
            Value::Int(2).div(&Value::Int(0)).unwrap_err().to_string(),
            "Integer divide by zero"
        );
        assert_eq!(
            Value::Real(2.0).div(&Value::Int(0)).unwrap_err().to_string(),
            "Divide by zero"
        );
        assert_eq!(
            Value::Int(2).rem(&Value::Int(0)).unwrap_err().to_string(),
            "Divide by zero (modulus operation)"
        );
    }

    #[test]
    fn integer_division_truncates() {
        assert_eq!(Value::Int(7).div(&Value::Int(2)), Ok(Value::Int(3)));
        assert_eq!(Value::Int(i64::MIN).div(&Value::Int(-1)), Ok(Value::Int(i64::MIN)));
    }

    #[test]
    fn compare_kinds() {
        assert_eq!(
            Value::from("A").compare(&Value::from("a")),
            Ok(Some(Ordering::Less))
        );
        assert_eq!(Value::Int(1).compare(&Value::Real(1.0)), Ok(Some(Ordering::Equal)));
        assert!(Value::Bool(true).compare(&Value::Bool(true)).is_err());
        assert!(Value::from("X").compare(&Value::Int(1)).is_err());
        assert_eq!(Value::Real(f64::NAN).compare(&Value::Real(1.0)), Ok(None));
    }

    #[test]
    fn shifts_out_of_range() {
        assert_eq!(shl(1, 64), 0);
        assert_eq!(shl(1, -1), 0);
        assert_eq!(sar(-8, 70), -1);
        assert_eq!(sar(8, 70), 0);
        assert_eq!(sar(-8, 1), -4);
    }

    #[test]
    fn var_sizes() {
        assert_eq!(Value::Int(1).var_size(), 8);
        assert_eq!(Value::Bool(true).var_size(), 1);
        assert_eq!(Value::from("string_var").var_size(), 20);
    }

    #[test]
    fn string_indexing() {
        let s = Value::from("TEST");
        assert_eq!(s.char_at(1), Ok(Value::Int('E' as i64)));
        assert_eq!(
            s.char_at(30).unwrap_err().to_string(),
            "Index on string out of bounds"
        );
        assert_eq!(
            s.char_at(-1).unwrap_err().to_string(),
            "Index on string out of bounds"
        );
    }
}
