//! # Functional weight language
//!
//! Arc weights and transition rates are small expressions evaluated against a
//! marking snapshot:
//!
//! * numeric literals and `+ - * /` with the usual precedence;
//! * `#(P)` total tokens in place `P`, `#(P, T)` tokens of colour `T` in `P`;
//! * `cap(P)` capacity of `P`;
//! * `floor(e)`, `ceil(e)`;
//! * relational (`== != < <= > >=`) and boolean (`&& || !`) operators, where
//!   true is `1` and false is `0`.
//!
//! ```rust
//! use petri_engine::expr::evaluate;
//! use petri_engine::net::{PetriNet, Place, State};
//!
//! let mut net = PetriNet::new();
//! net.add_place(Place::new("P0", "P0")).unwrap();
//! let result = evaluate("2 * (1 + 2)", &net, &State::default());
//! assert_eq!(result.result(), Some(6.0));
//! ```
use thiserror::Error;

pub mod ast;
pub mod eval;
pub mod parser;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use eval::{EvalResult, Evaluator, evaluate};
pub use parser::parse;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("cannot parse {input:?}: {message}")]
    Parse { input: String, message: String },
    #[error("unknown place {0}")]
    UnknownPlace(String),
    #[error("unknown token {0}")]
    UnknownToken(String),
    #[error("division by zero")]
    DivisionByZero,
}

/// Integer value of a weight that is a plain literal, `None` for anything functional.
pub fn constant_weight(input: &str) -> Option<i64> {
    input.trim().parse::<i64>().ok()
}
