//! Colour unfolding: rewrite a coloured net into an independent net holding a
//! single token colour.
//!
//! Every arc of every transition is visited with its weights in token-id
//! order. Each colour with a positive weight appends `_<token>` to the place
//! name and selects that colour's marking; the derived name becomes the id of
//! the unfolded place, so arcs that derive the same name share one place.
use indexmap::IndexMap;
use itertools::Itertools;
use thiserror::Error;

use crate::expr::constant_weight;
use crate::net::arc::{Arc, ArcKind};
use crate::net::core::PetriNet;
use crate::net::ids::{ArcId, PlaceId, TokenId, TransitionId};
use crate::net::structure::{DEFAULT_TOKEN, Place, Token, Transition, Weight};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnfoldError {
    #[error("cannot unfold a net without tokens")]
    NoTokens,
    #[error("cannot unfold functional weight {expr:?} of token {token} on arc {arc}")]
    FunctionalWeight {
        arc: ArcId,
        token: TokenId,
        expr: String,
    },
}

/// Per-arc outcome of scanning the weights.
struct PlaceData {
    name: String,
    token_count: Weight,
    arc_weight: i64,
}

pub struct Expander<'a> {
    net: &'a PetriNet,
    token: Token,
    places: IndexMap<PlaceId, Place>,
    transitions: IndexMap<TransitionId, Transition>,
    arcs: IndexMap<ArcId, Arc>,
}

impl<'a> Expander<'a> {
    pub fn new(net: &'a PetriNet) -> Result<Self, UnfoldError> {
        let chosen = select_token(net).ok_or(UnfoldError::NoTokens)?;
        Ok(Self {
            net,
            token: Token::new(chosen.id().clone(), chosen.color),
            places: IndexMap::new(),
            transitions: IndexMap::new(),
            arcs: IndexMap::new(),
        })
    }

    /// The token the unfolded net will carry.
    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn unfold(mut self) -> Result<PetriNet, UnfoldError> {
        let net = self.net;
        for transition in net.transitions() {
            let cloned = transition.clone();
            self.transitions.insert(cloned.id().clone(), cloned.clone());
            let id = transition.id().as_str();
            for arc in net.outbound_arcs(id).chain(net.inbound_arcs(id)) {
                self.analyse_arc(&cloned, arc)?;
            }
        }
        Ok(self.assemble())
    }

    fn analyse_arc(&mut self, transition: &Transition, arc: &Arc) -> Result<(), UnfoldError> {
        let net = self.net;
        let original = match net.place(arc.place().as_str()) {
            Ok(place) => place,
            Err(err) => {
                log::error!("skipping arc {}: {}", arc.id(), err);
                return Ok(());
            }
        };
        let data = place_data(arc, original)?;
        let place = self.new_place(original, transition, &data);

        let weights = IndexMap::from([(self.token.id().clone(), data.arc_weight.to_string())]);
        let unfolded = match arc.kind() {
            ArcKind::InboundInhibitor => Arc::inhibitor(place, transition.id().clone()),
            ArcKind::InboundNormal => Arc::inbound(place, transition.id().clone(), weights),
            ArcKind::OutboundNormal => Arc::outbound(transition.id().clone(), place, weights),
        };
        self.arcs.insert(unfolded.id(), unfolded);
        Ok(())
    }

    /// Reuses the place already derived under `data.name`, otherwise copies
    /// `original` with the single-colour marking at the transition's position.
    fn new_place(&mut self, original: &Place, transition: &Transition, data: &PlaceData) -> PlaceId {
        let id = PlaceId::from(data.name.as_str());
        if self.places.contains_key(&id) {
            return id;
        }

        let mut place = original.duplicate(id.clone());
        place.name = data.name.clone();
        place.x = transition.x;
        place.y = transition.y;
        let mut counts = IndexMap::new();
        if data.token_count > 0 {
            counts.insert(self.token.id().clone(), data.token_count);
        }
        if let Err(err) = place.set_token_counts(counts) {
            log::error!("cannot mark unfolded place {}: {}", id, err);
        }
        self.places.insert(id.clone(), place);
        id
    }

    fn assemble(self) -> PetriNet {
        let mut net = PetriNet::new();
        if let Err(err) = net.add_token(self.token) {
            log::error!("{}", err);
        }
        for parameter in self.net.rate_parameters() {
            if let Err(err) = net.add_rate_parameter(parameter.clone()) {
                log::error!("{}", err);
            }
        }
        for place in self.places.into_values() {
            if let Err(err) = net.add_place(place) {
                log::error!("{}", err);
            }
        }
        for transition in self.transitions.into_values() {
            if let Err(err) = net.add_transition(transition) {
                log::error!("{}", err);
            }
        }
        for arc in self.arcs.into_values() {
            if let Err(err) = net.add_arc(arc) {
                log::error!("{}", err);
            }
        }
        log::debug!(
            "unfolded into {} places, {} transitions, {} arcs",
            net.places_len(),
            net.transitions_len(),
            net.arcs_len()
        );
        net
    }
}

/// `Default` if present, else the first black token, else the first token.
fn select_token(net: &PetriNet) -> Option<&Token> {
    net.token(DEFAULT_TOKEN)
        .ok()
        .or_else(|| net.tokens().find(|token| token.is_black()))
        .or_else(|| net.tokens().next())
}

fn place_data(arc: &Arc, place: &Place) -> Result<PlaceData, UnfoldError> {
    if let Some((token, expr)) = arc.first_functional_weight() {
        return Err(UnfoldError::FunctionalWeight {
            arc: arc.id(),
            token: token.clone(),
            expr: expr.to_owned(),
        });
    }
    let mut data = PlaceData {
        name: place.name.clone(),
        token_count: 0,
        arc_weight: 0,
    };
    for (token, expr) in arc.token_weights().iter().sorted_by(|(a, _), (b, _)| a.cmp(b)) {
        let weight = constant_weight(expr).unwrap_or(0);
        if weight > 0 {
            data.name.push('_');
            data.name.push_str(token.as_str());
            data.token_count = place.token_count(token.as_str());
            data.arc_weight = weight;
        }
    }
    Ok(data)
}

impl PetriNet {
    /// Structurally independent single-colour copy of this net.
    pub fn unfold(&self) -> Result<PetriNet, UnfoldError> {
        Expander::new(self)?.unfold()
    }
}
