//! Persisted form of a net.
//!
//! A [`NetDocument`] is a flat, serde-friendly mirror of [`PetriNet`]. Arcs
//! are stored by source and target id; their direction is recovered from
//! which endpoint is a place when the document is turned back into a net.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::net::arc::{Arc, ArcDirection, ArcKind, ArcPoints, ArcType};
use crate::net::core::{NetError, PetriNet};
use crate::net::ids::{ArcId, PlaceId, RateParameterId, TokenId, TransitionId};
use crate::net::structure::{Place, Rate, RateParameter, Rgb, Token, Transition, Weight};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetDocument {
    #[serde(default)]
    pub tokens: Vec<TokenDocument>,
    #[serde(default)]
    pub rate_parameters: Vec<RateParameterDocument>,
    #[serde(default)]
    pub places: Vec<PlaceDocument>,
    #[serde(default)]
    pub transitions: Vec<TransitionDocument>,
    #[serde(default)]
    pub arcs: Vec<ArcDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDocument {
    pub id: TokenId,
    #[serde(default)]
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateParameterDocument {
    pub id: RateParameterId,
    pub expr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDocument {
    pub id: PlaceId,
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub name_offset_x: f64,
    #[serde(default)]
    pub name_offset_y: f64,
    #[serde(default)]
    pub marking_offset_x: f64,
    #[serde(default)]
    pub marking_offset_y: f64,
    #[serde(default)]
    pub capacity: Weight,
    #[serde(default)]
    pub marking: IndexMap<TokenId, Weight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDocument {
    pub id: TransitionId,
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub name_offset_x: f64,
    #[serde(default)]
    pub name_offset_y: f64,
    #[serde(default)]
    pub angle: i32,
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Literal rate, or the referenced parameter's expression when
    /// `rate_parameter` is set.
    #[serde(default = "default_rate")]
    pub rate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_parameter: Option<RateParameterId>,
    #[serde(default)]
    pub timed: bool,
    #[serde(default)]
    pub infinite_server: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcDocument {
    pub id: ArcId,
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default = "default_arc_type")]
    pub arc_type: ArcType,
    #[serde(default)]
    pub points: ArcPoints,
    #[serde(default)]
    pub weights: IndexMap<TokenId, String>,
}

fn default_priority() -> i32 {
    1
}

fn default_rate() -> String {
    "1".to_owned()
}

fn default_arc_type() -> ArcType {
    ArcType::Normal
}

impl From<&PetriNet> for NetDocument {
    fn from(net: &PetriNet) -> Self {
        let tokens = net
            .tokens()
            .map(|token| TokenDocument {
                id: token.id().clone(),
                color: token.color,
            })
            .collect();
        let rate_parameters = net
            .rate_parameters()
            .map(|parameter| RateParameterDocument {
                id: parameter.id().clone(),
                expr: parameter.expr.clone(),
            })
            .collect();
        let places = net
            .places()
            .map(|place| PlaceDocument {
                id: place.id().clone(),
                name: place.name.clone(),
                x: place.x,
                y: place.y,
                name_offset_x: place.name_offset_x,
                name_offset_y: place.name_offset_y,
                marking_offset_x: place.marking_offset_x,
                marking_offset_y: place.marking_offset_y,
                capacity: place.capacity(),
                marking: place.token_counts().clone(),
            })
            .collect();
        let transitions = net
            .transitions()
            .map(|transition| {
                let (rate, rate_parameter) = match &transition.rate {
                    Rate::Normal(expr) => (expr.clone(), None),
                    Rate::Parameter(id) => {
                        let expr = net
                            .rate_parameter(id.as_str())
                            .map(|parameter| parameter.expr.clone())
                            .unwrap_or_default();
                        (expr, Some(id.clone()))
                    }
                };
                TransitionDocument {
                    id: transition.id().clone(),
                    name: transition.name.clone(),
                    x: transition.x,
                    y: transition.y,
                    name_offset_x: transition.name_offset_x,
                    name_offset_y: transition.name_offset_y,
                    angle: transition.angle,
                    priority: transition.priority,
                    rate,
                    rate_parameter,
                    timed: transition.timed,
                    infinite_server: transition.infinite_server,
                }
            })
            .collect();
        let arcs = net
            .arcs()
            .map(|arc| ArcDocument {
                id: arc.id(),
                source: arc.source().to_owned(),
                target: arc.target().to_owned(),
                arc_type: arc.arc_type(),
                points: arc.points().iter().copied().collect(),
                weights: arc.token_weights().clone(),
            })
            .collect();

        Self {
            tokens,
            rate_parameters,
            places,
            transitions,
            arcs,
        }
    }
}

impl TryFrom<NetDocument> for PetriNet {
    type Error = NetError;

    fn try_from(document: NetDocument) -> Result<Self, Self::Error> {
        let mut net = PetriNet::new();
        for token in document.tokens {
            net.add_token(Token::new(token.id, token.color))?;
        }
        for place in document.places {
            net.add_place(place.into_place()?)?;
        }
        for parameter in document.rate_parameters {
            net.add_rate_parameter(RateParameter::new(parameter.id, parameter.expr))?;
        }
        for transition in document.transitions {
            net.add_transition(transition.into_transition()?)?;
        }
        for arc in document.arcs {
            let id = arc.id.clone();
            let added = net.add_arc(arc.into_arc(&net)?)?;
            if added != id {
                log::warn!("arc {} stored as {}", id, added);
            }
        }
        Ok(net)
    }
}

impl PlaceDocument {
    fn into_place(self) -> Result<Place, NetError> {
        let mut place = Place::new(self.id, self.name);
        place.x = self.x;
        place.y = self.y;
        place.name_offset_x = self.name_offset_x;
        place.name_offset_y = self.name_offset_y;
        place.marking_offset_x = self.marking_offset_x;
        place.marking_offset_y = self.marking_offset_y;
        place.set_capacity(self.capacity)?;
        place.set_token_counts(self.marking)?;
        Ok(place)
    }
}

impl TransitionDocument {
    fn into_transition(self) -> Result<Transition, NetError> {
        let rate = match self.rate_parameter {
            Some(parameter) => Rate::Parameter(parameter),
            None => Rate::Normal(self.rate),
        };
        let mut transition = Transition::new(self.id, self.name);
        transition.x = self.x;
        transition.y = self.y;
        transition.name_offset_x = self.name_offset_x;
        transition.name_offset_y = self.name_offset_y;
        transition.angle = self.angle;
        transition.priority = self.priority;
        transition.rate = rate;
        transition.timed = self.timed;
        transition.infinite_server = self.infinite_server;
        Ok(transition)
    }
}

impl ArcDocument {
    fn into_arc(self, net: &PetriNet) -> Result<Arc, NetError> {
        let direction = if net.place(&self.source).is_ok() && net.transition(&self.target).is_ok()
        {
            ArcDirection::PlaceToTransition
        } else if net.transition(&self.source).is_ok() && net.place(&self.target).is_ok() {
            ArcDirection::TransitionToPlace
        } else {
            return Err(NetError::InvalidArc(format!(
                "{} must join a place and a transition",
                self.id
            )));
        };
        let kind = ArcKind::from_parts(direction, self.arc_type).ok_or_else(|| {
            NetError::InvalidArc(format!("{} cannot be an outbound inhibitor", self.id))
        })?;

        let mut arc = match kind {
            ArcKind::InboundNormal => Arc::inbound(self.source, self.target, self.weights),
            ArcKind::InboundInhibitor => {
                if !self.weights.is_empty() {
                    log::warn!("dropping weights of inhibitor arc {}", self.id);
                }
                Arc::inhibitor(self.source, self.target)
            }
            ArcKind::OutboundNormal => Arc::outbound(self.source, self.target, self.weights),
        };
        for point in self.points {
            arc.add_intermediate_point(point);
        }
        Ok(arc)
    }
}
