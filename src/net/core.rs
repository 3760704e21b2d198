//! The net container: indexed components, arc adjacency and lookup.
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::expr::{self, ExprError};
use crate::net::arc::{Arc, ArcDirection};
use crate::net::ids::{ArcId, PlaceId, RateParameterId, TokenId, TransitionId};
use crate::net::structure::{
    DEFAULT_TOKEN, Place, Rate, RateParameter, Rgb, State, Token, Transition, Weight,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Token,
    Place,
    Transition,
    Arc,
    RateParameter,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComponentKind::Token => "token",
            ComponentKind::Place => "place",
            ComponentKind::Transition => "transition",
            ComponentKind::Arc => "arc",
            ComponentKind::RateParameter => "rate parameter",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetError {
    #[error("{kind} {id} not found")]
    ComponentNotFound { kind: ComponentKind, id: String },
    #[error("{kind} {id} already exists")]
    DuplicateId { kind: ComponentKind, id: String },
    #[error("cannot set token count that exceeds the capacity at place {place}: {requested} > {capacity}")]
    CapacityExceeded {
        place: PlaceId,
        requested: Weight,
        capacity: Weight,
    },
    #[error("place {place} holds no {token} tokens to remove")]
    NegativeMarking { place: PlaceId, token: TokenId },
    #[error("invalid arc: {0}")]
    InvalidArc(String),
    #[error("invalid expression {expr:?}: {errors:?}")]
    InvalidExpression {
        expr: String,
        errors: Vec<ExprError>,
    },
    #[error("{kind} {id} is still used by {user}")]
    ComponentInUse {
        kind: ComponentKind,
        id: String,
        user: String,
    },
}

impl NetError {
    fn not_found(kind: ComponentKind, id: &str) -> Self {
        NetError::ComponentNotFound {
            kind,
            id: id.to_owned(),
        }
    }

    fn duplicate(kind: ComponentKind, id: &str) -> Self {
        NetError::DuplicateId {
            kind,
            id: id.to_owned(),
        }
    }
}

/// Anything that can be looked up in a [`PetriNet`] by id.
pub trait Component: Sized {
    const KIND: ComponentKind;

    fn lookup<'a>(net: &'a PetriNet, id: &str) -> Option<&'a Self>;
}

impl Component for Token {
    const KIND: ComponentKind = ComponentKind::Token;

    fn lookup<'a>(net: &'a PetriNet, id: &str) -> Option<&'a Self> {
        net.tokens.get(id)
    }
}

impl Component for Place {
    const KIND: ComponentKind = ComponentKind::Place;

    fn lookup<'a>(net: &'a PetriNet, id: &str) -> Option<&'a Self> {
        net.places.get(id)
    }
}

impl Component for Transition {
    const KIND: ComponentKind = ComponentKind::Transition;

    fn lookup<'a>(net: &'a PetriNet, id: &str) -> Option<&'a Self> {
        net.transitions.get(id)
    }
}

impl Component for Arc {
    const KIND: ComponentKind = ComponentKind::Arc;

    fn lookup<'a>(net: &'a PetriNet, id: &str) -> Option<&'a Self> {
        net.arcs.get(id)
    }
}

impl Component for RateParameter {
    const KIND: ComponentKind = ComponentKind::RateParameter;

    fn lookup<'a>(net: &'a PetriNet, id: &str) -> Option<&'a Self> {
        net.rate_parameters.get(id)
    }
}

#[derive(Clone, Default, PartialEq)]
pub struct PetriNet {
    tokens: IndexMap<TokenId, Token>,
    places: IndexMap<PlaceId, Place>,
    transitions: IndexMap<TransitionId, Transition>,
    arcs: IndexMap<ArcId, Arc>,
    rate_parameters: IndexMap<RateParameterId, RateParameter>,
    place_arcs: IndexMap<PlaceId, IndexSet<ArcId>>,
    transition_arcs: IndexMap<TransitionId, IndexSet<ArcId>>,
}

impl fmt::Debug for PetriNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PetriNet")
            .field("tokens", &self.tokens.keys().collect::<Vec<_>>())
            .field("places", &self.places)
            .field("transitions", &self.transitions)
            .field("arcs", &self.arcs.keys().collect::<Vec<_>>())
            .field("rate_parameters", &self.rate_parameters)
            .finish()
    }
}

impl PetriNet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty net holding a single black `Default` token.
    pub fn with_default_token() -> Self {
        Self::with_token(Token::new(DEFAULT_TOKEN, Rgb::BLACK))
    }

    pub fn with_token(token: Token) -> Self {
        let mut net = Self::new();
        net.tokens.insert(token.id().clone(), token);
        net
    }

    pub fn add_token(&mut self, token: Token) -> Result<(), NetError> {
        if self.tokens.contains_key(token.id()) {
            return Err(NetError::duplicate(ComponentKind::Token, token.id().as_str()));
        }
        self.tokens.insert(token.id().clone(), token);
        Ok(())
    }

    pub fn add_place(&mut self, place: Place) -> Result<(), NetError> {
        if self.places.contains_key(place.id()) {
            return Err(NetError::duplicate(ComponentKind::Place, place.id().as_str()));
        }
        if let Some(token) = place
            .token_counts()
            .keys()
            .find(|token| !self.tokens.contains_key(*token))
        {
            return Err(NetError::not_found(ComponentKind::Token, token.as_str()));
        }
        self.place_arcs.insert(place.id().clone(), IndexSet::new());
        self.places.insert(place.id().clone(), place);
        Ok(())
    }

    pub fn add_transition(&mut self, transition: Transition) -> Result<(), NetError> {
        if self.transitions.contains_key(transition.id()) {
            return Err(NetError::duplicate(
                ComponentKind::Transition,
                transition.id().as_str(),
            ));
        }
        if let Rate::Parameter(parameter) = &transition.rate {
            self.rate_parameter(parameter.as_str())?;
        }
        self.transition_arcs
            .insert(transition.id().clone(), IndexSet::new());
        self.transitions.insert(transition.id().clone(), transition);
        Ok(())
    }

    pub fn add_rate_parameter(&mut self, parameter: RateParameter) -> Result<(), NetError> {
        if self.rate_parameters.contains_key(parameter.id()) {
            return Err(NetError::duplicate(
                ComponentKind::RateParameter,
                parameter.id().as_str(),
            ));
        }
        validate_expression(&parameter.expr)?;
        self.rate_parameters
            .insert(parameter.id().clone(), parameter);
        Ok(())
    }

    /// Both endpoints, every weighted token and every weight expression must be valid.
    pub fn add_arc(&mut self, arc: Arc) -> Result<ArcId, NetError> {
        let id = arc.id();
        if self.arcs.contains_key(&id) {
            return Err(NetError::duplicate(ComponentKind::Arc, id.as_str()));
        }
        if !self.places.contains_key(arc.place()) {
            return Err(NetError::not_found(ComponentKind::Place, arc.place().as_str()));
        }
        if !self.transitions.contains_key(arc.transition()) {
            return Err(NetError::not_found(
                ComponentKind::Transition,
                arc.transition().as_str(),
            ));
        }
        for (token, weight) in arc.token_weights() {
            if !self.tokens.contains_key(token) {
                return Err(NetError::not_found(ComponentKind::Token, token.as_str()));
            }
            validate_expression(weight)?;
        }

        if let Some(arcs) = self.place_arcs.get_mut(arc.place()) {
            arcs.insert(id.clone());
        }
        if let Some(arcs) = self.transition_arcs.get_mut(arc.transition()) {
            arcs.insert(id.clone());
        }
        self.arcs.insert(id.clone(), arc);
        Ok(id)
    }

    /// Typed lookup; fails if `id` is absent or names a component of another kind.
    pub fn component<T: Component>(&self, id: &str) -> Result<&T, NetError> {
        T::lookup(self, id).ok_or_else(|| NetError::not_found(T::KIND, id))
    }

    pub fn token(&self, id: &str) -> Result<&Token, NetError> {
        self.component(id)
    }

    pub fn place(&self, id: &str) -> Result<&Place, NetError> {
        self.component(id)
    }

    pub fn transition(&self, id: &str) -> Result<&Transition, NetError> {
        self.component(id)
    }

    pub fn arc(&self, id: &str) -> Result<&Arc, NetError> {
        self.component(id)
    }

    pub fn rate_parameter(&self, id: &str) -> Result<&RateParameter, NetError> {
        self.component(id)
    }

    pub fn place_mut(&mut self, id: &str) -> Result<&mut Place, NetError> {
        self.places
            .get_mut(id)
            .ok_or_else(|| NetError::not_found(ComponentKind::Place, id))
    }

    pub fn transition_mut(&mut self, id: &str) -> Result<&mut Transition, NetError> {
        self.transitions
            .get_mut(id)
            .ok_or_else(|| NetError::not_found(ComponentKind::Transition, id))
    }

    pub fn set_rate_parameter_expr(
        &mut self,
        id: &str,
        expr: impl Into<String>,
    ) -> Result<(), NetError> {
        let expr = expr.into();
        validate_expression(&expr)?;
        let parameter = self
            .rate_parameters
            .get_mut(id)
            .ok_or_else(|| NetError::not_found(ComponentKind::RateParameter, id))?;
        parameter.expr = expr;
        Ok(())
    }

    /// Sets the marking of one colour in `place`; the token must belong to this net.
    pub fn set_token_count(
        &mut self,
        place: &str,
        token: &str,
        count: Weight,
    ) -> Result<(), NetError> {
        let token = self.token(token)?.id().clone();
        self.place_mut(place)?.set_token_count(token, count)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub fn places(&self) -> impl Iterator<Item = &Place> {
        self.places.values()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.values()
    }

    pub fn arcs(&self) -> impl Iterator<Item = &Arc> {
        self.arcs.values()
    }

    pub fn rate_parameters(&self) -> impl Iterator<Item = &RateParameter> {
        self.rate_parameters.values()
    }

    pub fn contains_default_token(&self) -> bool {
        self.tokens.contains_key(DEFAULT_TOKEN)
    }

    /// Arcs feeding `transition` (place -> transition).
    pub fn inbound_arcs(&self, transition: &str) -> impl Iterator<Item = &Arc> {
        self.transition_arcs_in(transition, ArcDirection::PlaceToTransition)
    }

    /// Arcs leaving `transition` (transition -> place).
    pub fn outbound_arcs(&self, transition: &str) -> impl Iterator<Item = &Arc> {
        self.transition_arcs_in(transition, ArcDirection::TransitionToPlace)
    }

    /// Arcs producing into `place` (transition -> place).
    pub fn arcs_into_place(&self, place: &str) -> impl Iterator<Item = &Arc> {
        self.place_arcs_in(place, ArcDirection::TransitionToPlace)
    }

    /// Arcs consuming from `place` (place -> transition).
    pub fn arcs_out_of_place(&self, place: &str) -> impl Iterator<Item = &Arc> {
        self.place_arcs_in(place, ArcDirection::PlaceToTransition)
    }

    fn transition_arcs_in(
        &self,
        transition: &str,
        direction: ArcDirection,
    ) -> impl Iterator<Item = &Arc> {
        self.transition_arcs
            .get(transition)
            .into_iter()
            .flatten()
            .filter_map(|id| self.arcs.get(id))
            .filter(move |arc| arc.direction() == direction)
    }

    fn place_arcs_in(&self, place: &str, direction: ArcDirection) -> impl Iterator<Item = &Arc> {
        self.place_arcs
            .get(place)
            .into_iter()
            .flatten()
            .filter_map(|id| self.arcs.get(id))
            .filter(move |arc| arc.direction() == direction)
    }

    pub fn remove_arc(&mut self, id: &str) -> Result<Arc, NetError> {
        let arc = self
            .arcs
            .shift_remove(id)
            .ok_or_else(|| NetError::not_found(ComponentKind::Arc, id))?;
        if let Some(arcs) = self.place_arcs.get_mut(arc.place()) {
            arcs.shift_remove(id);
        }
        if let Some(arcs) = self.transition_arcs.get_mut(arc.transition()) {
            arcs.shift_remove(id);
        }
        Ok(arc)
    }

    /// Removes the place together with every arc attached to it.
    pub fn remove_place(&mut self, id: &str) -> Result<Place, NetError> {
        let place = self
            .places
            .shift_remove(id)
            .ok_or_else(|| NetError::not_found(ComponentKind::Place, id))?;
        for arc in self.place_arcs.shift_remove(id).unwrap_or_default() {
            if let Some(arc) = self.arcs.shift_remove(&arc) {
                if let Some(arcs) = self.transition_arcs.get_mut(arc.transition()) {
                    arcs.shift_remove(&arc.id());
                }
            }
        }
        Ok(place)
    }

    /// Removes the transition together with every arc attached to it.
    pub fn remove_transition(&mut self, id: &str) -> Result<Transition, NetError> {
        let transition = self
            .transitions
            .shift_remove(id)
            .ok_or_else(|| NetError::not_found(ComponentKind::Transition, id))?;
        for arc in self.transition_arcs.shift_remove(id).unwrap_or_default() {
            if let Some(arc) = self.arcs.shift_remove(&arc) {
                if let Some(arcs) = self.place_arcs.get_mut(arc.place()) {
                    arcs.shift_remove(&arc.id());
                }
            }
        }
        Ok(transition)
    }

    /// Rejected while any marking or arc weight still refers to the token.
    pub fn remove_token(&mut self, id: &str) -> Result<Token, NetError> {
        if !self.tokens.contains_key(id) {
            return Err(NetError::not_found(ComponentKind::Token, id));
        }
        let in_use = |user: String| NetError::ComponentInUse {
            kind: ComponentKind::Token,
            id: id.to_owned(),
            user,
        };
        if let Some(place) = self.places.values().find(|place| place.token_count(id) > 0) {
            return Err(in_use(format!("place {}", place.id())));
        }
        if let Some(arc) = self
            .arcs
            .values()
            .find(|arc| arc.token_weights().contains_key(id))
        {
            return Err(in_use(format!("arc {}", arc.id())));
        }
        for place in self.places.values_mut() {
            place.remove_token(id);
        }
        self.tokens
            .shift_remove(id)
            .ok_or_else(|| NetError::not_found(ComponentKind::Token, id))
    }

    /// Transitions that referenced the parameter keep its expression as a literal rate.
    pub fn remove_rate_parameter(&mut self, id: &str) -> Result<RateParameter, NetError> {
        let parameter = self
            .rate_parameters
            .shift_remove(id)
            .ok_or_else(|| NetError::not_found(ComponentKind::RateParameter, id))?;
        for transition in self.transitions.values_mut() {
            if matches!(&transition.rate, Rate::Parameter(rate) if rate == parameter.id()) {
                transition.rate = Rate::Normal(parameter.expr.clone());
            }
        }
        Ok(parameter)
    }

    /// Drops a weight entry from an arc, e.g. before removing its token.
    pub fn remove_arc_weight(&mut self, arc: &str, token: &str) -> Result<(), NetError> {
        self.arcs
            .get_mut(arc)
            .ok_or_else(|| NetError::not_found(ComponentKind::Arc, arc))?
            .remove_weight(token);
        Ok(())
    }

    pub fn set_arc_weight(
        &mut self,
        arc: &str,
        token: &str,
        weight: impl Into<String>,
    ) -> Result<(), NetError> {
        let weight = weight.into();
        let token = self.token(token)?.id().clone();
        validate_expression(&weight)?;
        self.arcs
            .get_mut(arc)
            .ok_or_else(|| NetError::not_found(ComponentKind::Arc, arc))?
            .set_weight(token, weight)
    }

    /// Rate expression of `transition`, resolving shared parameters.
    pub fn rate_expr<'a>(&'a self, transition: &'a Transition) -> Result<&'a str, NetError> {
        match &transition.rate {
            Rate::Normal(expr) => Ok(expr.as_str()),
            Rate::Parameter(id) => Ok(self.rate_parameter(id.as_str())?.expr.as_str()),
        }
    }

    /// Snapshot of every place's current marking.
    pub fn initial_state(&self) -> State {
        self.places
            .values()
            .map(|place| {
                let tokens = place
                    .token_counts()
                    .iter()
                    .map(|(token, count)| (token.clone(), *count))
                    .collect();
                (place.id().clone(), tokens)
            })
            .collect()
    }

    pub fn places_len(&self) -> usize {
        self.places.len()
    }

    pub fn transitions_len(&self) -> usize {
        self.transitions.len()
    }

    pub fn arcs_len(&self) -> usize {
        self.arcs.len()
    }
}

pub(crate) fn validate_expression(input: &str) -> Result<(), NetError> {
    expr::parse(input)
        .map(|_| ())
        .map_err(|err| NetError::InvalidExpression {
            expr: input.to_owned(),
            errors: vec![err],
        })
}
