//! The expression language.
//!
//! C-like expressions over integers, reals, booleans, strings and dates,
//! with access to the fields of a binary template through a host-supplied
//! [`SymbolResolver`]:
//!
//! - Arithmetic, bitwise, comparison and logical operators with C precedence
//! - Assignment (`=`, `+=`, …), `++`/`--` and the comma operator
//! - `sizeof`, `addressof`, `string` and `defined` on template fields
//! - ~50 built-in functions (numeric, bit twiddling, dates, strings, prompts)
//!
//! # Quick start
//!
//! ```rust
//! use hexpr::expr::{Evaluator, Symbol, SymbolTable, Value};
//!
//! let mut table = SymbolTable::new();
//! table.insert("count", Symbol::new(6, 4, 0x10));
//!
//! let mut ev = Evaluator::new(table);
//! assert_eq!(ev.evaluate("x = count * 7").unwrap(), Value::Int(42));
//! assert_eq!(ev.evaluate("addressof(count) + x").unwrap(), Value::Int(58));
//! ```

pub mod builtins;
pub mod dialog;
pub mod ebcdic;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod symbols;
pub mod value;

// Re-exports for convenience.
pub use builtins::Builtin;
pub use dialog::{Answer, DialogProvider, ScriptedDialog};
pub use error::ExprError;
pub use eval::Evaluator;
pub use lexer::{Lexer, Token};
pub use symbols::{NoSymbols, Symbol, SymbolResolver, SymbolTable};
pub use value::Value;
