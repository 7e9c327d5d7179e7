//! Evaluation errors.
//!
//! Every variant displays as the exact diagnostic text a user sees.  The
//! variants group the messages by kind so that hosts can react to, say,
//! a cancelled prompt differently from a typo.

use thiserror::Error;

/// Text shown for operand-less positions when legacy messages are requested.
pub const LEGACY_MISSING: &str = "Not implemented";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    /// Bad character, escape, number or string in the source text.
    #[error("{0}")]
    Lexical(String),

    /// A required token (parenthesis, bracket, colon, comma, member name) is
    /// absent or a reserved word was used.
    #[error("{0}")]
    Syntax(String),

    /// Operand or parameter of the wrong type, or a non-assignable target.
    #[error("{0}")]
    Type(String),

    /// Unknown symbol, bad member, bad index.
    #[error("{0}")]
    Symbol(String),

    /// Divide by zero, negative square root and friends.
    #[error("{0}")]
    Domain(String),

    /// The host refused or cancelled a request.
    #[error("{0}")]
    Host(String),

    /// An operand was expected where nothing usable starts.
    ///
    /// Produced by the primary level; callers that know what they were
    /// looking for replace it with [`ExprError::Missing`].
    #[error("Not implemented")]
    NotImplemented,

    /// An operand was expected; the text says which one.
    #[error("{0}")]
    Missing(String),

    /// Nesting exceeded `EvalOptions::max_depth`.
    #[error("Expression too complex")]
    TooComplex,
}

impl ExprError {
    pub fn lexical(msg: impl Into<String>) -> Self {
        ExprError::Lexical(msg.into())
    }

    pub fn syntax(msg: impl Into<String>) -> Self {
        ExprError::Syntax(msg.into())
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        ExprError::Type(msg.into())
    }

    pub fn symbol(msg: impl Into<String>) -> Self {
        ExprError::Symbol(msg.into())
    }

    pub fn domain(msg: impl Into<String>) -> Self {
        ExprError::Domain(msg.into())
    }

    pub fn host(msg: impl Into<String>) -> Self {
        ExprError::Host(msg.into())
    }

    /// Replace a bare [`ExprError::NotImplemented`] with a specific
    /// "missing operand" message.  Any other error passes through so the
    /// innermost diagnosis wins.
    pub fn or_missing(self, msg: impl FnOnce() -> String) -> Self {
        match self {
            ExprError::NotImplemented => ExprError::Missing(msg()),
            other => other,
        }
    }

    /// Message text, optionally in the legacy wording.
    pub fn message(&self, legacy: bool) -> String {
        match self {
            ExprError::Missing(_) if legacy => LEGACY_MISSING.to_owned(),
            other => other.to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_message() {
        let e = ExprError::domain("Integer divide by zero");
        assert_eq!(e.to_string(), "Integer divide by zero");
        assert_eq!(ExprError::TooComplex.to_string(), "Expression too complex");
    }

    #[test]
    fn or_missing_only_rewrites_not_implemented() {
        let e = ExprError::NotImplemented.or_missing(|| "Expected array index".into());
        assert_eq!(e, ExprError::Missing("Expected array index".into()));

        let e = ExprError::syntax("Closing parenthesis expected")
            .or_missing(|| "unused".into());
        assert_eq!(e.to_string(), "Closing parenthesis expected");
    }

    #[test]
    fn legacy_wording() {
        let e = ExprError::Missing("Expected 2nd operand for addition".into());
        assert_eq!(e.message(false), "Expected 2nd operand for addition");
        assert_eq!(e.message(true), "Not implemented");
        assert_eq!(ExprError::NotImplemented.message(false), "Not implemented");
    }
}
