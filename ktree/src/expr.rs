//! Typed dependency expressions and their tristate interpreter.
//!
//! Expressions are plain data: the tree stores them, and whoever owns the
//! current symbol values evaluates them through the [`Env`] trait.

use std::cmp::Ordering;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::value::{Tristate, Value};

/// Source of symbol values during evaluation.
pub trait Env {
    /// Error raised while looking a value up (e.g. a dependency cycle).
    type Error;

    /// Current value of `name`, or `None` when no such symbol is declared.
    fn lookup(&mut self, name: &str) -> Result<Option<Value>, Self::Error>;
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// Compare two operands.
    ///
    /// Numeric when both sides are numbers, tristate-ordered when both sides
    /// are tristate-like, textual otherwise.
    pub fn apply(self, left: &Value, right: &Value) -> bool {
        let ord = match (left.as_number(), right.as_number()) {
            (Some(l), Some(r)) => l.cmp(&r),
            _ => match (left.as_tristate(), right.as_tristate()) {
                (Some(l), Some(r)) => l.cmp(&r),
                _ => left.text().cmp(&right.text()),
            },
        };
        match self {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Ne => ord != Ordering::Equal,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Ge => ord != Ordering::Less,
        }
    }
}

/// A dependency, default or condition expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// A tristate constant.
    Const(Tristate),
    /// A literal string, number or tristate spelling.
    Literal(String),
    /// Reference to another symbol.
    Symbol(String),
    /// Tristate negation.
    Not(Box<Expr>),
    /// Minimum of all operands; `y` when empty.
    And(Vec<Expr>),
    /// Maximum of all operands; `n` when empty.
    Or(Vec<Expr>),
    /// Comparison of two operands, `y` or `n`.
    Compare {
        /// Operator.
        op: CompareOp,
        /// Left-hand operand.
        left: Box<Expr>,
        /// Right-hand operand.
        right: Box<Expr>,
    },
}

impl Expr {
    /// `y`
    pub fn y() -> Self {
        Expr::Const(Tristate::On)
    }

    /// `m`
    pub fn m() -> Self {
        Expr::Const(Tristate::Module)
    }

    /// `n`
    pub fn n() -> Self {
        Expr::Const(Tristate::Off)
    }

    /// Reference to symbol `name`.
    pub fn sym(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    /// Literal operand.
    pub fn lit(value: impl Into<String>) -> Self {
        Expr::Literal(value.into())
    }

    /// `!expr`
    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    /// `a && b && ...`
    pub fn and(operands: impl IntoIterator<Item = Expr>) -> Self {
        Expr::And(operands.into_iter().collect())
    }

    /// `a || b || ...`
    pub fn or(operands: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Or(operands.into_iter().collect())
    }

    /// `left <op> right`
    pub fn compare(op: CompareOp, left: Expr, right: Expr) -> Self {
        Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Evaluate in tristate logic.
    pub fn eval<E: Env>(&self, env: &mut E) -> Result<Tristate, E::Error> {
        Ok(match self {
            Expr::Const(t) => *t,
            Expr::Literal(s) => Tristate::from_literal(s).unwrap_or(Tristate::Off),
            Expr::Symbol(name) => match env.lookup(name)? {
                Some(Value::Tristate(t)) => t,
                _ => Tristate::Off,
            },
            Expr::Not(inner) => !inner.eval(env)?,
            Expr::And(operands) => {
                let mut acc = Tristate::On;
                for operand in operands {
                    acc = acc.min(operand.eval(env)?);
                    if acc == Tristate::Off {
                        break;
                    }
                }
                acc
            }
            Expr::Or(operands) => {
                let mut acc = Tristate::Off;
                for operand in operands {
                    acc = acc.max(operand.eval(env)?);
                    if acc == Tristate::On {
                        break;
                    }
                }
                acc
            }
            Expr::Compare { op, left, right } => {
                let left = left.operand(env)?;
                let right = right.operand(env)?;
                Tristate::from(op.apply(&left, &right))
            }
        })
    }

    /// Evaluate as a comparison operand or non-tristate default.
    pub fn operand<E: Env>(&self, env: &mut E) -> Result<Value, E::Error> {
        Ok(match self {
            Expr::Literal(s) => Value::String(s.clone()),
            Expr::Symbol(name) => env.lookup(name)?.unwrap_or(Value::N),
            other => Value::Tristate(other.eval(env)?),
        })
    }

    /// Names of all symbols referenced by this expression.
    pub fn symbols(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Const(_) | Expr::Literal(_) => {}
            Expr::Symbol(name) => out.push(name),
            Expr::Not(inner) => inner.collect_symbols(out),
            Expr::And(operands) | Expr::Or(operands) => {
                for operand in operands {
                    operand.collect_symbols(out);
                }
            }
            Expr::Compare { left, right, .. } => {
                left.collect_symbols(out);
                right.collect_symbols(out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, convert::Infallible};

    use super::*;

    struct Table(HashMap<&'static str, Value>);

    impl Env for Table {
        type Error = Infallible;

        fn lookup(&mut self, name: &str) -> Result<Option<Value>, Infallible> {
            Ok(self.0.get(name).cloned())
        }
    }

    fn table() -> Table {
        Table(HashMap::from([
            ("NET", Value::Y),
            ("USB", Value::M),
            ("DEBUG", Value::N),
            ("HZ", Value::Int(250)),
            ("BASE", Value::Hex(0x1000)),
            ("NAME", Value::string("linux")),
        ]))
    }

    fn eval(expr: &Expr) -> Tristate {
        match expr.eval(&mut table()) {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }

    #[test]
    fn test_and_or_not() {
        assert_eq!(eval(&Expr::and([Expr::sym("NET"), Expr::sym("USB")])), Tristate::Module);
        assert_eq!(eval(&Expr::or([Expr::sym("DEBUG"), Expr::sym("USB")])), Tristate::Module);
        assert_eq!(eval(&Expr::not(Expr::sym("DEBUG"))), Tristate::On);
        assert_eq!(eval(&Expr::not(Expr::sym("USB"))), Tristate::Module);
        assert_eq!(eval(&Expr::and([])), Tristate::On);
        assert_eq!(eval(&Expr::or([])), Tristate::Off);
    }

    #[test]
    fn test_unknown_and_non_tristate_symbols_are_off() {
        assert_eq!(eval(&Expr::sym("MISSING")), Tristate::Off);
        assert_eq!(eval(&Expr::sym("HZ")), Tristate::Off);
        assert_eq!(eval(&Expr::lit("m")), Tristate::Module);
    }

    #[test]
    fn test_compare() {
        let hz_ge = Expr::compare(CompareOp::Ge, Expr::sym("HZ"), Expr::lit("100"));
        assert_eq!(eval(&hz_ge), Tristate::On);

        let base_eq = Expr::compare(CompareOp::Eq, Expr::sym("BASE"), Expr::lit("4096"));
        assert_eq!(eval(&base_eq), Tristate::On);

        let usb_lt_y = Expr::compare(CompareOp::Lt, Expr::sym("USB"), Expr::lit("y"));
        assert_eq!(eval(&usb_lt_y), Tristate::On);

        let name_ne = Expr::compare(CompareOp::Ne, Expr::sym("NAME"), Expr::lit("linux"));
        assert_eq!(eval(&name_ne), Tristate::Off);
    }

    #[test]
    fn test_symbols() {
        let expr = Expr::and([
            Expr::sym("A"),
            Expr::not(Expr::sym("B")),
            Expr::compare(CompareOp::Eq, Expr::sym("C"), Expr::lit("1")),
        ]);
        assert_eq!(expr.symbols(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_serde_shape() {
        let expr: Expr = serde_json::from_str(
            r#"{"and": [{"symbol": "NET"}, {"not": {"const": "m"}}]}"#,
        )
        .unwrap();
        assert_eq!(expr, Expr::and([Expr::sym("NET"), Expr::not(Expr::m())]));
    }
}
