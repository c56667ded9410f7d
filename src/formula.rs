//! Formula Fallback
//!
//! Nomenclature lines may carry an arithmetic length formula for pieces the
//! cut-length engine does not cover. Formulas are parsed into a small typed
//! AST and evaluated against the bay's dimensions and the face thicknesses
//! of labelled frame bars; nothing is evaluated as free text.

mod eval;
mod parse;

pub use eval::{context_variables, FormulaEnv, VariableEnv};

use crate::geometry::floor_length;
use thiserror::Error;

/// Formula parse and evaluation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("Unexpected character '{found}' at offset {offset}")]
    UnexpectedCharacter { offset: usize, found: char },

    #[error("Unexpected {found} at offset {offset}")]
    UnexpectedToken { offset: usize, found: String },

    #[error("Unexpected end of formula")]
    UnexpectedEnd,

    #[error("Invalid number literal: {0}")]
    InvalidNumber(String),

    #[error("Formula nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("Formula is longer than {0} bytes")]
    TooLong(usize),

    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Formula result is not a finite number")]
    NonFinite,
}

/// Which face of a profile a thickness lookup reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Exterior,
    Interior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Formula syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    /// `EXTERIOR_THICKNESS(label)` / `INTERIOR_THICKNESS(label)`
    Thickness { face: Face, label: String },
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// A parsed length formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Formula, FormulaError> {
        Ok(Formula {
            source: source.to_string(),
            expr: parse::parse(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Raw numeric value.
    pub fn evaluate(&self, env: &dyn FormulaEnv) -> Result<f64, FormulaError> {
        eval::evaluate(&self.expr, env)
    }

    /// Evaluated value floored to a non-negative integer length.
    pub fn cut_length(&self, env: &dyn FormulaEnv) -> Result<u32, FormulaError> {
        Ok(floor_length(self.evaluate(env)?))
    }
}
