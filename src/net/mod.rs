//! # Coloured Petri nets
//!
//! A net holds places `P`, transitions `T` and a set of token colours. Every
//! arc joins one place and one transition and maps each colour to a weight
//! expression (see [`crate::expr`]). Places may bound the total number of
//! tokens they hold (`capacity > 0`).
//!
//! * An inbound normal arc `p -> t` is ready when `M(p, c) >= W(p, t, c)` for
//!   every colour `c`.
//! * An inbound inhibitor arc `p -> t` is ready when `p` is empty.
//! * An outbound arc `t -> p` is ready when `p` is unbounded or the tokens it
//!   adds, net of any loop-back arc `p -> t`, keep `p` within its capacity.
//!
//! A transition is enabled when all of its arcs are ready. Firing consumes the
//! inbound weights and produces the outbound ones, giving a new [`State`].
//! [`PetriNet::unfold`] turns a coloured net into a single-colour one.
//!
//! ## Example
//!
//! ```rust
//! use indexmap::IndexMap;
//! use petri_engine::net::*;
//!
//! let weight = || IndexMap::from([(TokenId::from("Default"), "1".to_owned())]);
//!
//! let mut net = PetriNet::with_default_token();
//! let mut p0 = Place::new("P0", "P0");
//! p0.set_token_count(TokenId::from("Default"), 2).unwrap();
//! net.add_place(p0).unwrap();
//! let mut p1 = Place::new("P1", "P1");
//! p1.set_capacity(5).unwrap();
//! net.add_place(p1).unwrap();
//! net.add_transition(Transition::new("T0", "T0")).unwrap();
//! net.add_arc(Arc::inbound("P0", "T0", weight())).unwrap();
//! net.add_arc(Arc::outbound("T0", "P1", weight())).unwrap();
//!
//! let state = net.initial_state();
//! assert_eq!(net.enabled_transitions(&state).unwrap(), vec![TransitionId::from("T0")]);
//! let next = net.fire_transition(&state, "T0").unwrap();
//! assert_eq!(next.token_count("P0", "Default"), 1);
//! assert_eq!(next.token_count("P1", "Default"), 1);
//! ```

pub mod arc;
pub mod core;
pub mod document;
pub mod enable;
pub mod ids;
pub mod io;
pub mod paste;
pub mod structure;
pub mod unfold;

pub use arc::{Arc, ArcDirection, ArcKind, ArcPoint, ArcPoints, ArcType};
pub use self::core::{Component, ComponentKind, NetError, PetriNet};
pub use document::NetDocument;
pub use enable::FireError;
pub use ids::{ArcId, PlaceId, RateParameterId, TokenId, TransitionId};
pub use io::{Format, IoError};
pub use paste::{Pasted, Paster, Selection};
pub use structure::{
    DEFAULT_TOKEN, Place, PlaceEvent, PlaceListener, Rate, RateParameter, Rgb, State, Token,
    Transition, Weight,
};
pub use unfold::{Expander, UnfoldError};
