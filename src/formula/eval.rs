//! Formula evaluation.

use super::{BinaryOp, Expr, Face, FormulaError};
use crate::cutting::Thickness;
use crate::geometry::FrameContext;
use std::collections::BTreeMap;

/// Values a formula may refer to.
pub trait FormulaEnv {
    fn variable(&self, name: &str) -> Option<f64>;

    /// Face thickness of the bar carrying `label`; 0 when unresolved.
    fn thickness(&self, face: Face, label: &str) -> f64;
}

/// Variables from a map, thicknesses from a label lookup.
pub struct VariableEnv<F> {
    variables: BTreeMap<String, f64>,
    lookup: F,
}

impl<F> VariableEnv<F>
where
    F: Fn(&str) -> Option<Thickness>,
{
    pub fn new(variables: BTreeMap<String, f64>, lookup: F) -> Self {
        Self { variables, lookup }
    }
}

impl<F> FormulaEnv for VariableEnv<F>
where
    F: Fn(&str) -> Option<Thickness>,
{
    fn variable(&self, name: &str) -> Option<f64> {
        self.variables.get(name).copied()
    }

    fn thickness(&self, face: Face, label: &str) -> f64 {
        match (self.lookup)(label) {
            Some(t) => match face {
                Face::Exterior => t.exterior,
                Face::Interior => t.interior,
            },
            None => 0.0,
        }
    }
}

/// Bay dimensions exposed to formulas. An unset passage height reads as 0.
pub fn context_variables(ctx: &FrameContext) -> BTreeMap<String, f64> {
    [
        ("BAY_WIDTH", ctx.bay_width),
        ("BAY_HEIGHT", ctx.bay_height),
        ("FIXED_LEFT_WIDTH", ctx.fixed_left_width),
        ("FIXED_RIGHT_WIDTH", ctx.fixed_right_width),
        ("PASSAGE_WIDTH", ctx.passage_width),
        ("PASSAGE_HEIGHT", ctx.passage_height.unwrap_or(0.0)),
        ("MULLIONS_THROUGH", if ctx.mullions_through { 1.0 } else { 0.0 }),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}

pub(super) fn evaluate(expr: &Expr, env: &dyn FormulaEnv) -> Result<f64, FormulaError> {
    let value = match expr {
        Expr::Number(value) => *value,
        Expr::Variable(name) => env
            .variable(name)
            .ok_or_else(|| FormulaError::UnknownVariable(name.clone()))?,
        Expr::Thickness { face, label } => env.thickness(*face, label),
        Expr::Neg(inner) => -evaluate(inner, env)?,
        Expr::Binary { op, lhs, rhs } => {
            let lhs = evaluate(lhs, env)?;
            let rhs = evaluate(rhs, env)?;
            match op {
                BinaryOp::Add => lhs + rhs,
                BinaryOp::Sub => lhs - rhs,
                BinaryOp::Mul => lhs * rhs,
                BinaryOp::Div if rhs == 0.0 => return Err(FormulaError::DivisionByZero),
                BinaryOp::Div => lhs / rhs,
            }
        }
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormulaError::NonFinite)
    }
}
