//! hexpr: the expression language of a hex editor's binary templates.
//!
//! [`expr`] evaluates expressions; [`format`] renders the resulting values
//! for display; [`config`] loads the options both of them use.

pub mod cli;
pub mod config;
pub mod datetime;
pub mod expr;
pub mod format;
pub mod var;
