//! Side-effect free evaluation of expressions against a net and a state.
use std::collections::BTreeSet;

use crate::net::{PetriNet, State};

use super::ExprError;
use super::ast::{BinaryOp, Expr, UnaryOp};
use super::parser;

/// Outcome of evaluating an expression. Failures are reported in `errors`
/// rather than returned as `Err`, so callers decide how severe they are.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    value: Option<f64>,
    errors: Vec<ExprError>,
    components: BTreeSet<String>,
}

impl EvalResult {
    fn failed(errors: Vec<ExprError>, components: BTreeSet<String>) -> Self {
        Self {
            value: None,
            errors,
            components,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn result(&self) -> Option<f64> {
        self.value
    }

    pub fn errors(&self) -> &[ExprError] {
        &self.errors
    }

    /// Places the expression referenced.
    pub fn components(&self) -> &BTreeSet<String> {
        &self.components
    }

    pub fn into_result(self) -> Result<f64, Vec<ExprError>> {
        match self.value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(self.errors),
        }
    }
}

pub struct Evaluator<'a> {
    net: &'a PetriNet,
    state: &'a State,
}

impl<'a> Evaluator<'a> {
    pub fn new(net: &'a PetriNet, state: &'a State) -> Self {
        Self { net, state }
    }

    pub fn evaluate(&self, input: &str) -> EvalResult {
        match parser::parse(input) {
            Ok(expr) => self.evaluate_expr(&expr),
            Err(err) => EvalResult::failed(vec![err], BTreeSet::new()),
        }
    }

    pub fn evaluate_expr(&self, expr: &Expr) -> EvalResult {
        let components = expr
            .components()
            .into_iter()
            .map(str::to_owned)
            .collect::<BTreeSet<_>>();

        let mut errors = Vec::new();
        self.check_references(expr, &mut errors);
        if !errors.is_empty() {
            return EvalResult::failed(errors, components);
        }

        match self.eval(expr) {
            Ok(value) => EvalResult {
                value: Some(value),
                errors,
                components,
            },
            Err(err) => EvalResult::failed(vec![err], components),
        }
    }

    fn check_references(&self, expr: &Expr, errors: &mut Vec<ExprError>) {
        match expr {
            Expr::Number(_) => {}
            Expr::TokenCount { place, token } => {
                self.check_place(place, errors);
                if let Some(token) = token {
                    if self.net.token(token).is_err() {
                        errors.push(ExprError::UnknownToken(token.clone()));
                    }
                }
            }
            Expr::Capacity(place) => self.check_place(place, errors),
            Expr::Floor(inner) | Expr::Ceil(inner) | Expr::Unary(_, inner) => {
                self.check_references(inner, errors)
            }
            Expr::Binary(_, lhs, rhs) => {
                self.check_references(lhs, errors);
                self.check_references(rhs, errors);
            }
        }
    }

    fn check_place(&self, place: &str, errors: &mut Vec<ExprError>) {
        let unknown = ExprError::UnknownPlace(place.to_owned());
        if self.net.place(place).is_err() && !errors.contains(&unknown) {
            errors.push(unknown);
        }
    }

    fn eval(&self, expr: &Expr) -> Result<f64, ExprError> {
        let value = match expr {
            Expr::Number(n) => *n,
            Expr::TokenCount { place, token: None } => self.state.total(place) as f64,
            Expr::TokenCount {
                place,
                token: Some(token),
            } => self.state.token_count(place, token) as f64,
            Expr::Capacity(place) => self
                .net
                .place(place)
                .map(|place| place.capacity() as f64)
                .map_err(|_| ExprError::UnknownPlace(place.clone()))?,
            Expr::Floor(inner) => self.eval(inner)?.floor(),
            Expr::Ceil(inner) => self.eval(inner)?.ceil(),
            Expr::Unary(UnaryOp::Neg, inner) => -self.eval(inner)?,
            Expr::Unary(UnaryOp::Not, inner) => truth(self.eval(inner)? == 0.0),
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                match op {
                    BinaryOp::Add => lhs + rhs,
                    BinaryOp::Sub => lhs - rhs,
                    BinaryOp::Mul => lhs * rhs,
                    BinaryOp::Div => {
                        if rhs == 0.0 {
                            return Err(ExprError::DivisionByZero);
                        }
                        lhs / rhs
                    }
                    BinaryOp::Eq => truth(lhs == rhs),
                    BinaryOp::Ne => truth(lhs != rhs),
                    BinaryOp::Lt => truth(lhs < rhs),
                    BinaryOp::Le => truth(lhs <= rhs),
                    BinaryOp::Gt => truth(lhs > rhs),
                    BinaryOp::Ge => truth(lhs >= rhs),
                    BinaryOp::And => truth(lhs != 0.0 && rhs != 0.0),
                    BinaryOp::Or => truth(lhs != 0.0 || rhs != 0.0),
                }
            }
        };
        Ok(value)
    }
}

fn truth(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

pub fn evaluate(input: &str, net: &PetriNet, state: &State) -> EvalResult {
    Evaluator::new(net, state).evaluate(input)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::net::{PlaceId, Place, Rgb, Token, TokenId};

    fn net() -> PetriNet {
        let mut net = PetriNet::new();
        net.add_token(Token::new("Default", Rgb::BLACK)).unwrap();
        net.add_token(Token::new("Red", Rgb(255, 0, 0))).unwrap();
        let mut p0 = Place::new("P0", "P0");
        p0.set_capacity(10).unwrap();
        net.add_place(p0).unwrap();
        net.add_place(Place::new("P1", "P1")).unwrap();
        net
    }

    fn state() -> State {
        State::new(BTreeMap::from([(
            PlaceId::from("P0"),
            BTreeMap::from([(TokenId::from("Default"), 3), (TokenId::from("Red"), 4)]),
        )]))
    }

    fn value(input: &str) -> f64 {
        let net = net();
        let state = state();
        evaluate(input, &net, &state).into_result().unwrap()
    }

    #[test]
    fn evaluates_arithmetic() {
        assert_eq!(value("1 + 2 * 3"), 7.0);
        assert_eq!(value("(1 + 2) * 3"), 9.0);
        assert_eq!(value("7 / 2"), 3.5);
        assert_eq!(value("-2 + 5"), 3.0);
        assert_eq!(value("floor(7 / 2)"), 3.0);
        assert_eq!(value("ceil(7 / 2)"), 4.0);
    }

    #[test]
    fn reads_state_and_capacity() {
        assert_eq!(value("#(P0)"), 7.0);
        assert_eq!(value("#(P0, Red)"), 4.0);
        assert_eq!(value("#(P1)"), 0.0);
        assert_eq!(value("cap(P0)"), 10.0);
        assert_eq!(value("cap(P0) - #(P0)"), 3.0);
    }

    #[test]
    fn evaluates_guards() {
        assert_eq!(value("#(P0) > 5"), 1.0);
        assert_eq!(value("#(P0, Red) == 3"), 0.0);
        assert_eq!(value("#(P0) > 5 && #(P1) == 0"), 1.0);
        assert_eq!(value("!(#(P1) == 0) || 0"), 0.0);
    }

    #[test]
    fn reports_unknown_components() {
        let net = net();
        let state = state();
        let result = evaluate("#(P9) + cap(P9) + #(P0, Blue)", &net, &state);
        assert!(result.has_errors());
        assert_eq!(result.result(), None);
        assert_eq!(
            result.errors(),
            &[
                ExprError::UnknownPlace("P9".to_owned()),
                ExprError::UnknownToken("Blue".to_owned()),
            ]
        );
        assert!(result.components().contains("P9"));
    }

    #[test]
    fn reports_division_by_zero() {
        let net = net();
        let state = state();
        let result = evaluate("4 / #(P1)", &net, &state);
        assert_eq!(result.errors(), &[ExprError::DivisionByZero]);
    }

    #[test]
    fn reports_parse_errors() {
        let net = net();
        let state = state();
        let result = evaluate("4 +* 2", &net, &state);
        assert!(matches!(result.errors(), [ExprError::Parse { .. }]));
    }

    #[test]
    fn evaluation_is_deterministic_and_pure() {
        let net = net();
        let state = state();
        let first = evaluate("#(P0) * 2 + cap(P0)", &net, &state);
        let second = evaluate("#(P0) * 2 + cap(P0)", &net, &state);
        assert_eq!(first, second);
        assert_eq!(state, self::state());
    }
}
