//! Runtime: arc and transition enabling, firing, enabling degree and rates.
//!
//! An outbound arc `t -> p` may fire under state `M` iff `p` is unbounded or
//!
//! ```text
//! M(p) + W(t, p) - W(p, t) <= cap(p)
//! ```
//!
//! where `M(p)` is the total over every colour and `W(p, t)` is the weight of
//! the loop-back arc from `p` to the same transition (zero if there is none).
//! Weights are evaluated against `M`; any evaluation failure is reported as
//! [`FireError::WeightExpression`], never as "not enabled". A weight that is
//! NaN or does not fit a [`Weight`] is [`FireError::WeightOutOfRange`],
//! and token sums past [`Weight::MAX`] are [`FireError::Overflow`].
use thiserror::Error;

use crate::expr::{Evaluator, ExprError};
use crate::net::arc::{Arc, ArcKind};
use crate::net::core::{NetError, PetriNet};
use crate::net::ids::{ArcId, PlaceId, TokenId, TransitionId};
use crate::net::structure::{State, Transition, Weight};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FireError {
    #[error(transparent)]
    Net(#[from] NetError),
    #[error("cannot evaluate weight {expr:?} of token {token} on arc {arc}: {errors:?}")]
    WeightExpression {
        arc: ArcId,
        token: TokenId,
        expr: String,
        errors: Vec<ExprError>,
    },
    #[error("weight {expr:?} of token {token} on arc {arc} evaluates to {value}, outside 0..={max}", max = Weight::MAX)]
    WeightOutOfRange {
        arc: ArcId,
        token: TokenId,
        expr: String,
        value: f64,
    },
    #[error("token count at place {place} overflows while evaluating arc {arc}")]
    Overflow { arc: ArcId, place: PlaceId },
    #[error("cannot evaluate rate {expr:?} of transition {transition}: {errors:?}")]
    RateExpression {
        transition: TransitionId,
        expr: String,
        errors: Vec<ExprError>,
    },
    #[error("transition {0} is not enabled under the supplied state")]
    NotEnabled(TransitionId),
}

impl PetriNet {
    /// Whether `arc` may fire under `state`. Inhibitor arcs block while their
    /// place holds any token; inbound arcs need every weighted colour present.
    pub fn can_fire(&self, arc: &Arc, state: &State) -> Result<bool, FireError> {
        match arc.kind() {
            ArcKind::OutboundNormal => self.outbound_can_fire(arc, state),
            ArcKind::InboundNormal => {
                for (token, weight) in self.arc_weights(arc, state)? {
                    if state.token_count(arc.place().as_str(), token.as_str()) < weight {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            ArcKind::InboundInhibitor => Ok(state.total(arc.place().as_str()) == 0),
        }
    }

    pub fn can_fire_arc(&self, arc: &str, state: &State) -> Result<bool, FireError> {
        let arc = self.arc(arc)?;
        self.can_fire(arc, state)
    }

    fn outbound_can_fire(&self, arc: &Arc, state: &State) -> Result<bool, FireError> {
        let place = self.place(arc.place().as_str())?;
        if !place.has_capacity_restriction() {
            return Ok(true);
        }

        let overflow = || FireError::Overflow {
            arc: arc.id(),
            place: place.id().clone(),
        };
        let incoming = self.arc_token_total(arc, state)?;
        let mut outgoing: Weight = 0;
        for loop_back in self
            .arcs_out_of_place(place.id().as_str())
            .filter(|candidate| candidate.transition() == arc.transition())
        {
            outgoing = outgoing
                .checked_add(self.arc_token_total(loop_back, state)?)
                .ok_or_else(overflow)?;
        }
        let current = state.total(place.id().as_str());

        // Widened so neither side can wrap.
        let after = u128::from(current) + u128::from(incoming);
        Ok(after <= u128::from(place.capacity()) + u128::from(outgoing))
    }

    /// Evaluated weight per token, floored. Negative results count as zero
    /// tokens; NaN and values at or past [`Weight::MAX`] are rejected.
    pub fn arc_weights(
        &self,
        arc: &Arc,
        state: &State,
    ) -> Result<Vec<(TokenId, Weight)>, FireError> {
        let evaluator = Evaluator::new(self, state);
        arc.token_weights()
            .iter()
            .map(|(token, expr)| {
                let value = evaluator.evaluate(expr).into_result().map_err(|errors| {
                    log::error!("cannot evaluate weight {:?} on arc {}", expr, arc.id());
                    FireError::WeightExpression {
                        arc: arc.id(),
                        token: token.clone(),
                        expr: expr.clone(),
                        errors,
                    }
                })?;
                if value.is_nan() || value.floor() >= Weight::MAX as f64 {
                    log::error!("weight {:?} on arc {} evaluates to {}", expr, arc.id(), value);
                    return Err(FireError::WeightOutOfRange {
                        arc: arc.id(),
                        token: token.clone(),
                        expr: expr.clone(),
                        value,
                    });
                }
                Ok((token.clone(), value.max(0.0).floor() as Weight))
            })
            .collect()
    }

    fn arc_token_total(&self, arc: &Arc, state: &State) -> Result<Weight, FireError> {
        self.arc_weights(arc, state)?
            .into_iter()
            .try_fold(0, |total: Weight, (_, weight)| total.checked_add(weight))
            .ok_or_else(|| FireError::Overflow {
                arc: arc.id(),
                place: arc.place().clone(),
            })
    }

    pub fn is_transition_enabled(
        &self,
        transition: &str,
        state: &State,
    ) -> Result<bool, FireError> {
        self.transition(transition)?;
        for arc in self.inbound_arcs(transition) {
            if !self.can_fire(arc, state)? {
                return Ok(false);
            }
        }
        for arc in self.outbound_arcs(transition) {
            if !self.can_fire(arc, state)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn enabled_transitions(&self, state: &State) -> Result<Vec<TransitionId>, FireError> {
        let mut enabled = Vec::new();
        for transition in self.transitions() {
            if self.is_transition_enabled(transition.id().as_str(), state)? {
                enabled.push(transition.id().clone());
            }
        }
        Ok(enabled)
    }

    /// State after one firing of `transition`. The net itself is left untouched.
    pub fn fire_transition(&self, state: &State, transition: &str) -> Result<State, FireError> {
        if !self.is_transition_enabled(transition, state)? {
            return Err(FireError::NotEnabled(TransitionId::from(transition)));
        }

        let mut next = state.clone();
        for arc in self.inbound_arcs(transition) {
            if arc.kind() == ArcKind::InboundInhibitor {
                continue;
            }
            for (token, weight) in self.arc_weights(arc, state)? {
                let tokens = next.tokens_mut(arc.place(), &token);
                *tokens = tokens.saturating_sub(weight);
            }
        }
        for arc in self.outbound_arcs(transition) {
            for (token, weight) in self.arc_weights(arc, state)? {
                let tokens = next.tokens_mut(arc.place(), &token);
                *tokens = tokens.checked_add(weight).ok_or_else(|| FireError::Overflow {
                    arc: arc.id(),
                    place: arc.place().clone(),
                })?;
            }
        }

        log::debug!("fired {} giving {:?}", transition, next);
        Ok(next)
    }

    /// Number of concurrent firings the inbound markings allow; zero when disabled.
    pub fn enabling_degree(&self, transition: &str, state: &State) -> Result<Weight, FireError> {
        if !self.is_transition_enabled(transition, state)? {
            return Ok(0);
        }
        let mut degree: Option<Weight> = None;
        for arc in self.inbound_arcs(transition) {
            if arc.kind() != ArcKind::InboundNormal {
                continue;
            }
            for (token, weight) in self.arc_weights(arc, state)? {
                if weight == 0 {
                    continue;
                }
                let available = state.token_count(arc.place().as_str(), token.as_str()) / weight;
                degree = Some(degree.map_or(available, |d| d.min(available)));
            }
        }
        Ok(degree.unwrap_or(1))
    }

    pub fn actual_rate(&self, transition: &str, state: &State) -> Result<f64, FireError> {
        self.transition(transition)?.actual_rate(self, state)
    }
}

impl Transition {
    /// Evaluated rate; infinite servers scale it by the enabling degree.
    pub fn actual_rate(&self, net: &PetriNet, state: &State) -> Result<f64, FireError> {
        let expr = net.rate_expr(self)?;
        let rate = Evaluator::new(net, state)
            .evaluate(expr)
            .into_result()
            .map_err(|errors| FireError::RateExpression {
                transition: self.id().clone(),
                expr: expr.to_owned(),
                errors,
            })?;
        if !self.infinite_server {
            return Ok(rate);
        }
        let degree = net.enabling_degree(self.id().as_str(), state)?;
        Ok(rate * degree as f64)
    }
}
