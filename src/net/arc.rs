//! Arcs between places and transitions.
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::expr::constant_weight;
use crate::net::core::NetError;
use crate::net::ids::{ArcId, PlaceId, TokenId, TransitionId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ArcDirection {
    PlaceToTransition,
    TransitionToPlace,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ArcType {
    Normal,
    Inhibitor,
}

/// Every legal combination of direction and type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ArcKind {
    InboundNormal,
    InboundInhibitor,
    OutboundNormal,
}

impl ArcKind {
    pub fn from_parts(direction: ArcDirection, arc_type: ArcType) -> Option<Self> {
        match (direction, arc_type) {
            (ArcDirection::PlaceToTransition, ArcType::Normal) => Some(ArcKind::InboundNormal),
            (ArcDirection::PlaceToTransition, ArcType::Inhibitor) => {
                Some(ArcKind::InboundInhibitor)
            }
            (ArcDirection::TransitionToPlace, ArcType::Normal) => Some(ArcKind::OutboundNormal),
            (ArcDirection::TransitionToPlace, ArcType::Inhibitor) => None,
        }
    }

    pub fn direction(self) -> ArcDirection {
        match self {
            ArcKind::InboundNormal | ArcKind::InboundInhibitor => ArcDirection::PlaceToTransition,
            ArcKind::OutboundNormal => ArcDirection::TransitionToPlace,
        }
    }

    pub fn arc_type(self) -> ArcType {
        match self {
            ArcKind::InboundInhibitor => ArcType::Inhibitor,
            ArcKind::InboundNormal | ArcKind::OutboundNormal => ArcType::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcPoint {
    pub x: f64,
    pub y: f64,
    pub curved: bool,
}

impl ArcPoint {
    pub fn new(x: f64, y: f64, curved: bool) -> Self {
        Self { x, y, curved }
    }
}

pub type ArcPoints = SmallVec<[ArcPoint; 2]>;

#[derive(Clone, PartialEq)]
pub struct Arc {
    place: PlaceId,
    transition: TransitionId,
    kind: ArcKind,
    token_weights: IndexMap<TokenId, String>,
    points: ArcPoints,
}

impl Arc {
    /// Place -> transition arc consuming `token_weights`.
    pub fn inbound(
        place: impl Into<PlaceId>,
        transition: impl Into<TransitionId>,
        token_weights: IndexMap<TokenId, String>,
    ) -> Self {
        Self::with_kind(place, transition, ArcKind::InboundNormal, token_weights)
    }

    /// Place -> transition arc that blocks while the place holds any token.
    pub fn inhibitor(place: impl Into<PlaceId>, transition: impl Into<TransitionId>) -> Self {
        Self::with_kind(place, transition, ArcKind::InboundInhibitor, IndexMap::new())
    }

    /// Transition -> place arc producing `token_weights`.
    pub fn outbound(
        transition: impl Into<TransitionId>,
        place: impl Into<PlaceId>,
        token_weights: IndexMap<TokenId, String>,
    ) -> Self {
        Self::with_kind(place, transition, ArcKind::OutboundNormal, token_weights)
    }

    fn with_kind(
        place: impl Into<PlaceId>,
        transition: impl Into<TransitionId>,
        kind: ArcKind,
        token_weights: IndexMap<TokenId, String>,
    ) -> Self {
        let token_weights = if kind == ArcKind::InboundInhibitor {
            IndexMap::new()
        } else {
            token_weights
        };
        Self {
            place: place.into(),
            transition: transition.into(),
            kind,
            token_weights,
            points: ArcPoints::new(),
        }
    }

    /// Copy of this arc reattached to new endpoints, keeping kind, weights and points.
    pub fn reconnect(
        &self,
        place: impl Into<PlaceId>,
        transition: impl Into<TransitionId>,
    ) -> Self {
        Self {
            place: place.into(),
            transition: transition.into(),
            kind: self.kind,
            token_weights: self.token_weights.clone(),
            points: self.points.clone(),
        }
    }

    pub fn id(&self) -> ArcId {
        ArcId::between(self.source(), self.target())
    }

    pub fn kind(&self) -> ArcKind {
        self.kind
    }

    pub fn direction(&self) -> ArcDirection {
        self.kind.direction()
    }

    pub fn arc_type(&self) -> ArcType {
        self.kind.arc_type()
    }

    pub fn place(&self) -> &PlaceId {
        &self.place
    }

    pub fn transition(&self) -> &TransitionId {
        &self.transition
    }

    pub fn source(&self) -> &str {
        match self.direction() {
            ArcDirection::PlaceToTransition => self.place.as_str(),
            ArcDirection::TransitionToPlace => self.transition.as_str(),
        }
    }

    pub fn target(&self) -> &str {
        match self.direction() {
            ArcDirection::PlaceToTransition => self.transition.as_str(),
            ArcDirection::TransitionToPlace => self.place.as_str(),
        }
    }

    pub fn token_weights(&self) -> &IndexMap<TokenId, String> {
        &self.token_weights
    }

    /// Weight expression for `token`, `"0"` when the arc carries none.
    pub fn weight_for_token(&self, token: &str) -> &str {
        self.token_weights
            .get(token)
            .map(String::as_str)
            .unwrap_or("0")
    }

    pub fn set_weight(
        &mut self,
        token: impl Into<TokenId>,
        weight: impl Into<String>,
    ) -> Result<(), NetError> {
        if self.kind == ArcKind::InboundInhibitor {
            return Err(NetError::InvalidArc(format!(
                "inhibitor arc {} cannot carry weights",
                self.id()
            )));
        }
        self.token_weights.insert(token.into(), weight.into());
        Ok(())
    }

    pub(crate) fn remove_weight(&mut self, token: &str) {
        self.token_weights.shift_remove(token);
    }

    /// True when any weight is not an integer literal.
    pub fn has_functional_weight(&self) -> bool {
        self.first_functional_weight().is_some()
    }

    /// Functional weight with the smallest token id, if any.
    pub fn first_functional_weight(&self) -> Option<(&TokenId, &str)> {
        self.token_weights
            .iter()
            .filter(|(_, weight)| constant_weight(weight).is_none())
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(token, weight)| (token, weight.as_str()))
    }

    pub fn points(&self) -> &[ArcPoint] {
        &self.points
    }

    pub fn add_intermediate_point(&mut self, point: ArcPoint) {
        self.points.push(point);
    }

    pub fn remove_intermediate_point(&mut self, point: &ArcPoint) -> bool {
        match self.points.iter().position(|candidate| candidate == point) {
            Some(index) => {
                self.points.remove(index);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Arc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arc")
            .field("place", &self.place)
            .field("transition", &self.transition)
            .field("kind", &self.kind)
            .field("token_weights", &self.token_weights)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc() -> Arc {
        Arc::inbound("source", "target", IndexMap::new())
    }

    #[test]
    fn creates_id_from_endpoints() {
        assert_eq!(arc().id().as_str(), "source TO target");
        let out = Arc::outbound("T0", "P0", IndexMap::new());
        assert_eq!(out.id().as_str(), "T0 TO P0");
        assert_eq!(out.source(), "T0");
        assert_eq!(out.target(), "P0");
    }

    #[test]
    fn returns_weight_for_token() {
        let mut arc = arc();
        arc.set_weight("Default", "cap(P0)").unwrap();
        assert_eq!(arc.weight_for_token("Default"), "cap(P0)");
        assert_eq!(arc.weight_for_token("Red"), "0");
    }

    #[test]
    fn detects_functional_weights() {
        let mut arc = arc();
        arc.set_weight("Default", "2").unwrap();
        arc.set_weight("Red", "4").unwrap();
        assert!(!arc.has_functional_weight());
        arc.set_weight("Red", "cap(P0)").unwrap();
        assert!(arc.has_functional_weight());
        arc.set_weight("Blue", "2.5").unwrap();
        assert_eq!(
            arc.first_functional_weight(),
            Some((&TokenId::from("Blue"), "2.5"))
        );
    }

    #[test]
    fn inhibitor_arcs_reject_weights() {
        let mut arc = Arc::inhibitor("P0", "T0");
        assert!(arc.set_weight("Default", "1").is_err());
        assert!(arc.token_weights().is_empty());
        assert_eq!(arc.arc_type(), ArcType::Inhibitor);
    }

    #[test]
    fn removes_the_matching_intermediate_point() {
        let mut arc = arc();
        let first = ArcPoint::new(1.0, 1.0, false);
        let second = ArcPoint::new(2.0, 2.0, false);
        arc.add_intermediate_point(first);
        arc.add_intermediate_point(second);
        assert!(arc.remove_intermediate_point(&first));
        assert_eq!(arc.points(), &[second]);
    }

    #[test]
    fn reconnect_keeps_points_and_weights() {
        let mut arc = arc();
        arc.set_weight("Default", "3").unwrap();
        arc.add_intermediate_point(ArcPoint::new(200.0, 100.0, true));
        let copy = arc.reconnect("P9", "T9");
        assert_eq!(copy.id().as_str(), "P9 TO T9");
        assert_eq!(copy.points(), arc.points());
        assert_eq!(copy.weight_for_token("Default"), "3");
    }

    #[test]
    fn outbound_inhibitor_is_not_a_kind() {
        assert_eq!(
            ArcKind::from_parts(ArcDirection::TransitionToPlace, ArcType::Inhibitor),
            None
        );
    }
}
