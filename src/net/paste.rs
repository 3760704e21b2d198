//! Copy a selection of components back into the same net under fresh names.
use indexmap::IndexMap;

use crate::net::arc::Arc;
use crate::net::core::{NetError, PetriNet};
use crate::net::ids::{ArcId, PlaceId, TransitionId};
use crate::net::structure::{Place, Transition};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub places: Vec<PlaceId>,
    pub transitions: Vec<TransitionId>,
    pub arcs: Vec<ArcId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(mut self, id: impl Into<PlaceId>) -> Self {
        self.places.push(id.into());
        self
    }

    pub fn transition(mut self, id: impl Into<TransitionId>) -> Self {
        self.transitions.push(id.into());
        self
    }

    pub fn arc(mut self, id: impl Into<ArcId>) -> Self {
        self.arcs.push(id.into());
        self
    }
}

/// Original id to copy id for everything a paste created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pasted {
    pub places: IndexMap<PlaceId, PlaceId>,
    pub transitions: IndexMap<TransitionId, TransitionId>,
    pub arcs: IndexMap<ArcId, ArcId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paster {
    place_prefix: String,
    transition_prefix: String,
    offset: (f64, f64),
}

impl Default for Paster {
    fn default() -> Self {
        Self::new("P", "T")
    }
}

impl Paster {
    pub fn new(place_prefix: impl Into<String>, transition_prefix: impl Into<String>) -> Self {
        Self {
            place_prefix: place_prefix.into(),
            transition_prefix: transition_prefix.into(),
            offset: (0.0, 0.0),
        }
    }

    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset = (x, y);
        self
    }

    /// Copies are named `<prefix><n>` with the lowest free `n`. An arc is
    /// re-attached to the copy of each selected endpoint and keeps the
    /// original of any other. Nothing is added unless the whole selection
    /// can be pasted.
    pub fn paste(&self, net: &mut PetriNet, selection: &Selection) -> Result<Pasted, NetError> {
        let mut pasted = Pasted::default();
        let mut places: Vec<Place> = Vec::new();
        let mut transitions: Vec<Transition> = Vec::new();
        let mut arcs: Vec<Arc> = Vec::new();

        for id in &selection.places {
            let original = net.place(id.as_str())?;
            let name = next_name(&self.place_prefix, |name| {
                net.places().any(|place| place.id().as_str() == name || place.name == name)
                    || places.iter().any(|copy| copy.name == name)
            });
            let mut copy = original.duplicate(name.as_str());
            copy.name = name;
            copy.x += self.offset.0;
            copy.y += self.offset.1;
            pasted.places.insert(id.clone(), copy.id().clone());
            places.push(copy);
        }

        for id in &selection.transitions {
            let original = net.transition(id.as_str())?;
            let name = next_name(&self.transition_prefix, |name| {
                net.transitions()
                    .any(|transition| transition.id().as_str() == name || transition.name == name)
                    || transitions.iter().any(|copy| copy.name == name)
            });
            let mut copy = original.duplicate(name.as_str());
            copy.name = name;
            copy.x += self.offset.0;
            copy.y += self.offset.1;
            pasted.transitions.insert(id.clone(), copy.id().clone());
            transitions.push(copy);
        }

        for id in &selection.arcs {
            let original = net.arc(id.as_str())?;
            let place = pasted.places.get(original.place());
            let transition = pasted.transitions.get(original.transition());
            if place.is_none() && transition.is_none() {
                return Err(NetError::InvalidArc(format!(
                    "{id} cannot be pasted without one of its endpoints"
                )));
            }
            let copy = original.reconnect(
                place.unwrap_or(original.place()).clone(),
                transition.unwrap_or(original.transition()).clone(),
            );
            pasted.arcs.insert(id.clone(), copy.id());
            arcs.push(copy);
        }

        for place in places {
            net.add_place(place)?;
        }
        for transition in transitions {
            net.add_transition(transition)?;
        }
        for arc in arcs {
            net.add_arc(arc)?;
        }
        log::debug!(
            "pasted {} places, {} transitions, {} arcs",
            pasted.places.len(),
            pasted.transitions.len(),
            pasted.arcs.len()
        );
        Ok(pasted)
    }
}

fn next_name(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    (0u64..)
        .map(|n| format!("{prefix}{n}"))
        .find(|name| !taken(name))
        .unwrap_or_else(|| prefix.to_owned())
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::net::{ArcPoint, DEFAULT_TOKEN, TokenId};

    fn net() -> PetriNet {
        let mut net = PetriNet::with_default_token();
        let mut place = Place::new("P0", "P0");
        place.x = 10.0;
        place.y = 20.0;
        place.set_capacity(10).unwrap();
        place
            .set_token_count(TokenId::from(DEFAULT_TOKEN), 4)
            .unwrap();
        net.add_place(place).unwrap();
        let mut transition = Transition::new("T0", "T0");
        transition.angle = 45;
        transition.priority = 10;
        net.add_transition(transition).unwrap();
        let mut arc = Arc::inbound(
            "P0",
            "T0",
            IndexMap::from([(TokenId::from(DEFAULT_TOKEN), "2".to_owned())]),
        );
        arc.add_intermediate_point(ArcPoint::new(200.0, 100.0, true));
        net.add_arc(arc).unwrap();
        net
    }

    #[test]
    fn pasted_place_gets_fresh_name_and_offset() {
        let mut net = net();
        let pasted = Paster::default()
            .with_offset(40.0, 20.0)
            .paste(&mut net, &Selection::new().place("P0"))
            .unwrap();
        assert_eq!(pasted.places[&PlaceId::from("P0")], PlaceId::from("P1"));

        let copy = net.place("P1").unwrap();
        assert_eq!(copy.name, "P1");
        assert_eq!((copy.x, copy.y), (50.0, 40.0));
        assert_eq!(copy.capacity(), 10);
        assert_eq!(copy.token_count(DEFAULT_TOKEN), 4);
    }

    #[test]
    fn pasted_transition_keeps_attributes() {
        let mut net = net();
        Paster::default()
            .paste(&mut net, &Selection::new().transition("T0"))
            .unwrap();
        let copy = net.transition("T1").unwrap();
        assert_eq!(copy.name, "T1");
        assert_eq!(copy.angle, 45);
        assert_eq!(copy.priority, 10);
    }

    #[test]
    fn arc_follows_selected_endpoints() {
        let mut net = net();
        let both = Selection::new().place("P0").transition("T0").arc("P0 TO T0");
        Paster::default().paste(&mut net, &both).unwrap();
        assert!(net.arc("P1 TO T1").is_ok());

        let mut net = self::net();
        Paster::default()
            .paste(&mut net, &Selection::new().place("P0").arc("P0 TO T0"))
            .unwrap();
        let copy = net.arc("P1 TO T0").unwrap();
        assert_eq!(copy.weight_for_token(DEFAULT_TOKEN), "2");
        assert_eq!(copy.points(), &[ArcPoint::new(200.0, 100.0, true)]);
        assert_eq!(net.arc("P0 TO T0").unwrap().points().len(), 1);
    }

    #[test]
    fn lowest_free_index_is_used() {
        let mut net = net();
        net.add_place(Place::new("P2", "P2")).unwrap();
        let pasted = Paster::default()
            .paste(&mut net, &Selection::new().place("P0").place("P2"))
            .unwrap();
        assert_eq!(
            pasted.places.values().cloned().collect::<Vec<_>>(),
            vec![PlaceId::from("P1"), PlaceId::from("P3")]
        );
    }

    #[test]
    fn failed_paste_adds_nothing() {
        let mut net = net();
        let before = net.clone();
        let selection = Selection::new().place("P0").arc("P9 TO T0");
        assert!(Paster::default().paste(&mut net, &selection).is_err());
        assert_eq!(net, before);

        let orphan = Selection::new().arc("P0 TO T0");
        assert!(matches!(
            Paster::default().paste(&mut net, &orphan),
            Err(NetError::InvalidArc(_))
        ));
        assert_eq!(net, before);
    }
}
