//! Static net elements: tokens, places, transitions, rates and state snapshots.
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::net::core::NetError;
use crate::net::ids::{PlaceId, RateParameterId, TokenId, TransitionId};

pub type Weight = u64;

pub const DEFAULT_TOKEN: &str = "Default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

/// A token colour class. Two tokens are the same colour iff their ids match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    id: TokenId,
    pub color: Rgb,
}

impl Token {
    pub fn new(id: impl Into<TokenId>, color: Rgb) -> Self {
        Self {
            id: id.into(),
            color,
        }
    }

    pub fn id(&self) -> &TokenId {
        &self.id
    }

    pub fn is_black(&self) -> bool {
        self.color == Rgb::BLACK
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceEvent {
    TokensChanged {
        place: PlaceId,
        counts: IndexMap<TokenId, Weight>,
    },
    CapacityChanged {
        place: PlaceId,
        capacity: Weight,
    },
}

pub type PlaceListener = dyn Fn(&PlaceEvent) + Send + Sync;

pub struct Place {
    id: PlaceId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub name_offset_x: f64,
    pub name_offset_y: f64,
    pub marking_offset_x: f64,
    pub marking_offset_y: f64,
    capacity: Weight,
    token_counts: IndexMap<TokenId, Weight>,
    listeners: Vec<Box<PlaceListener>>,
}

impl Place {
    pub fn new(id: impl Into<PlaceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x: 0.0,
            y: 0.0,
            name_offset_x: 0.0,
            name_offset_y: 0.0,
            marking_offset_x: 0.0,
            marking_offset_y: 0.0,
            capacity: 0,
            token_counts: IndexMap::new(),
            listeners: Vec::new(),
        }
    }

    /// Copies every attribute onto a new identity. Listeners stay with `self`.
    pub fn duplicate(&self, id: impl Into<PlaceId>) -> Self {
        Self {
            id: id.into(),
            name: self.name.clone(),
            x: self.x,
            y: self.y,
            name_offset_x: self.name_offset_x,
            name_offset_y: self.name_offset_y,
            marking_offset_x: self.marking_offset_x,
            marking_offset_y: self.marking_offset_y,
            capacity: self.capacity,
            token_counts: self.token_counts.clone(),
            listeners: Vec::new(),
        }
    }

    pub fn id(&self) -> &PlaceId {
        &self.id
    }

    pub fn capacity(&self) -> Weight {
        self.capacity
    }

    /// A capacity of zero means the place is unbounded.
    pub fn has_capacity_restriction(&self) -> bool {
        self.capacity > 0
    }

    pub fn set_capacity(&mut self, capacity: Weight) -> Result<(), NetError> {
        let stored = self.number_of_tokens_stored();
        if capacity > 0 && stored > capacity {
            return Err(NetError::CapacityExceeded {
                place: self.id.clone(),
                requested: stored,
                capacity,
            });
        }
        self.capacity = capacity;
        self.notify(PlaceEvent::CapacityChanged {
            place: self.id.clone(),
            capacity,
        });
        Ok(())
    }

    pub fn token_count(&self, token: &str) -> Weight {
        self.token_counts.get(token).copied().unwrap_or(0)
    }

    pub fn token_counts(&self) -> &IndexMap<TokenId, Weight> {
        &self.token_counts
    }

    /// Saturates at [`Weight::MAX`].
    pub fn number_of_tokens_stored(&self) -> Weight {
        saturating_total(self.token_counts.values())
    }

    pub fn set_token_count(&mut self, token: TokenId, count: Weight) -> Result<(), NetError> {
        let others: Weight = self
            .token_counts
            .iter()
            .filter(|(id, _)| **id != token)
            .map(|(_, count)| *count)
            .fold(0, Weight::saturating_add);
        self.check_capacity(others.saturating_add(count))?;
        self.token_counts.insert(token, count);
        self.notify_tokens();
        Ok(())
    }

    /// Replaces the whole marking. Rejected without change if the total exceeds capacity.
    pub fn set_token_counts(&mut self, counts: IndexMap<TokenId, Weight>) -> Result<(), NetError> {
        self.check_capacity(saturating_total(counts.values()))?;
        self.token_counts = counts;
        self.notify_tokens();
        Ok(())
    }

    pub fn increment_token_count(&mut self, token: TokenId) -> Result<(), NetError> {
        let count = self.token_count(token.as_str());
        if count == Weight::MAX {
            return Err(NetError::CapacityExceeded {
                place: self.id.clone(),
                requested: count,
                capacity: self.capacity,
            });
        }
        self.set_token_count(token, count + 1)
    }

    pub fn decrement_token_count(&mut self, token: TokenId) -> Result<(), NetError> {
        let count = self.token_count(token.as_str());
        if count == 0 {
            return Err(NetError::NegativeMarking {
                place: self.id.clone(),
                token,
            });
        }
        self.set_token_count(token, count - 1)
    }

    pub fn add_listener(&mut self, listener: impl Fn(&PlaceEvent) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub(crate) fn remove_token(&mut self, token: &str) {
        if self.token_counts.shift_remove(token).is_some() {
            self.notify_tokens();
        }
    }

    fn check_capacity(&self, total: Weight) -> Result<(), NetError> {
        if self.has_capacity_restriction() && total > self.capacity {
            return Err(NetError::CapacityExceeded {
                place: self.id.clone(),
                requested: total,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    fn notify_tokens(&self) {
        if self.listeners.is_empty() {
            return;
        }
        self.notify(PlaceEvent::TokensChanged {
            place: self.id.clone(),
            counts: self.token_counts.clone(),
        });
    }

    fn notify(&self, event: PlaceEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }
}

impl Clone for Place {
    fn clone(&self) -> Self {
        self.duplicate(self.id.clone())
    }
}

impl PartialEq for Place {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.x == other.x
            && self.y == other.y
            && self.name_offset_x == other.name_offset_x
            && self.name_offset_y == other.name_offset_y
            && self.marking_offset_x == other.marking_offset_x
            && self.marking_offset_y == other.marking_offset_y
            && self.capacity == other.capacity
            && self.token_counts == other.token_counts
    }
}

impl fmt::Debug for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Place")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("token_counts", &self.token_counts)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rate {
    /// Rate given directly as an expression, usually a constant.
    Normal(String),
    /// Rate shared with other transitions through a named parameter.
    Parameter(RateParameterId),
}

impl Default for Rate {
    fn default() -> Self {
        Rate::Normal("1".to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateParameter {
    id: RateParameterId,
    pub expr: String,
}

impl RateParameter {
    pub fn new(id: impl Into<RateParameterId>, expr: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            expr: expr.into(),
        }
    }

    pub fn id(&self) -> &RateParameterId {
        &self.id
    }
}

#[derive(Clone, PartialEq)]
pub struct Transition {
    id: TransitionId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub name_offset_x: f64,
    pub name_offset_y: f64,
    pub angle: i32,
    pub priority: i32,
    pub rate: Rate,
    pub timed: bool,
    pub infinite_server: bool,
}

impl Transition {
    pub fn new(id: impl Into<TransitionId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x: 0.0,
            y: 0.0,
            name_offset_x: 0.0,
            name_offset_y: 0.0,
            angle: 0,
            priority: 1,
            rate: Rate::default(),
            timed: false,
            infinite_server: false,
        }
    }

    pub fn duplicate(&self, id: impl Into<TransitionId>) -> Self {
        Self {
            id: id.into(),
            ..self.clone()
        }
    }

    pub fn id(&self) -> &TransitionId {
        &self.id
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transition").field(&self.id).finish()
    }
}

/// Immutable marking snapshot: place -> token -> count.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State(BTreeMap<PlaceId, BTreeMap<TokenId, Weight>>);

impl State {
    pub fn new(tokens: BTreeMap<PlaceId, BTreeMap<TokenId, Weight>>) -> Self {
        Self(tokens)
    }

    pub fn tokens(&self, place: &str) -> Option<&BTreeMap<TokenId, Weight>> {
        self.0.get(place)
    }

    pub fn token_count(&self, place: &str, token: &str) -> Weight {
        self.0
            .get(place)
            .and_then(|tokens| tokens.get(token))
            .copied()
            .unwrap_or(0)
    }

    /// Tokens held by `place` summed across every colour.
    pub fn total(&self, place: &str) -> Weight {
        self.0
            .get(place)
            .map(|tokens| saturating_total(tokens.values()))
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlaceId, &BTreeMap<TokenId, Weight>)> {
        self.0.iter()
    }

    pub fn into_inner(self) -> BTreeMap<PlaceId, BTreeMap<TokenId, Weight>> {
        self.0
    }

    pub(crate) fn tokens_mut(&mut self, place: &PlaceId, token: &TokenId) -> &mut Weight {
        self.0
            .entry(place.clone())
            .or_default()
            .entry(token.clone())
            .or_insert(0)
    }
}

impl FromIterator<(PlaceId, BTreeMap<TokenId, Weight>)> for State {
    fn from_iter<I: IntoIterator<Item = (PlaceId, BTreeMap<TokenId, Weight>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (place, tokens) in self.iter() {
            map.entry(place, tokens);
        }
        map.finish()
    }
}

fn saturating_total<'a>(counts: impl Iterator<Item = &'a Weight>) -> Weight {
    counts.copied().fold(0, Weight::saturating_add)
}
