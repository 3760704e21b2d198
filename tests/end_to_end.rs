//! P0 -> T0 -> P1 firing scenario and capacity behaviour seen through the public API.
use indexmap::IndexMap;
use petri_engine::net::{
    Arc, DEFAULT_TOKEN, FireError, NetError, PetriNet, Place, State, TokenId, Transition,
};

fn weight(w: &str) -> IndexMap<TokenId, String> {
    IndexMap::from([(TokenId::from(DEFAULT_TOKEN), w.to_owned())])
}

fn scenario() -> PetriNet {
    let mut net = PetriNet::with_default_token();
    let mut p0 = Place::new("P0", "P0");
    p0.set_token_count(TokenId::from(DEFAULT_TOKEN), 2).unwrap();
    net.add_place(p0).unwrap();
    let mut p1 = Place::new("P1", "P1");
    p1.set_capacity(5).unwrap();
    net.add_place(p1).unwrap();
    net.add_transition(Transition::new("T0", "T0")).unwrap();
    net.add_arc(Arc::inbound("P0", "T0", weight("1"))).unwrap();
    net.add_arc(Arc::outbound("T0", "P1", weight("1"))).unwrap();
    net
}

#[test]
fn fires_once_from_p0_to_p1() {
    let net = scenario();
    let state = net.initial_state();
    let outbound = net.arc("T0 TO P1").unwrap();
    assert!(net.can_fire(outbound, &state).unwrap());

    let next = net.fire_transition(&state, "T0").unwrap();
    assert_eq!(next.token_count("P0", DEFAULT_TOKEN), 1);
    assert_eq!(next.token_count("P1", DEFAULT_TOKEN), 1);
}

#[test]
fn repeated_firing_drains_p0_then_disables() {
    let net = scenario();
    let mut state = net.initial_state();
    for _ in 0..2 {
        state = net.fire_transition(&state, "T0").unwrap();
    }
    assert_eq!(state.total("P0"), 0);
    assert_eq!(state.total("P1"), 2);
    assert!(!net.is_transition_enabled("T0", &state).unwrap());
    assert!(matches!(
        net.fire_transition(&state, "T0"),
        Err(FireError::NotEnabled(_))
    ));
}

#[test]
fn full_target_blocks_firing() {
    let net = scenario();
    let mut counts = net.initial_state().into_inner();
    counts
        .entry("P1".into())
        .or_default()
        .insert(TokenId::from(DEFAULT_TOKEN), 5);
    let state = State::new(counts);
    assert!(!net.can_fire_arc("T0 TO P1", &state).unwrap());
    assert!(net.enabled_transitions(&state).unwrap().is_empty());
}

#[test]
fn capacity_is_enforced_on_the_model() {
    let mut net = scenario();
    let err = net.set_token_count("P1", DEFAULT_TOKEN, 6).unwrap_err();
    assert!(matches!(err, NetError::CapacityExceeded { .. }));
    assert_eq!(net.place("P1").unwrap().token_count(DEFAULT_TOKEN), 0);
    net.set_token_count("P1", DEFAULT_TOKEN, 5).unwrap();
    assert_eq!(net.place("P1").unwrap().number_of_tokens_stored(), 5);
}

#[test]
fn unbounded_place_accepts_any_number_of_increments() {
    let mut place = Place::new("P", "P");
    for _ in 0..1000 {
        place
            .increment_token_count(TokenId::from(DEFAULT_TOKEN))
            .unwrap();
    }
    assert_eq!(place.token_count(DEFAULT_TOKEN), 1000);
}

#[test]
fn functional_rate_scales_with_marking() {
    let mut net = scenario();
    net.transition_mut("T0").unwrap().rate =
        petri_engine::net::Rate::Normal("#(P0) / 2".to_owned());
    assert_eq!(net.actual_rate("T0", &net.initial_state()).unwrap(), 1.0);
}
