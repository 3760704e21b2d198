use indexmap::IndexMap;
use petri_engine::net::{
    Arc, ArcKind, DEFAULT_TOKEN, PetriNet, Place, Rgb, Token, TokenId, Transition,
};

fn weights(entries: &[(&str, &str)]) -> IndexMap<TokenId, String> {
    entries
        .iter()
        .map(|(token, weight)| (TokenId::from(*token), weight.to_string()))
        .collect()
}

/// Two colours on P, a self-loop through T on Default and a Red-only
/// consumer U feeding Q.
fn coloured() -> PetriNet {
    let mut net = PetriNet::with_default_token();
    net.add_token(Token::new("Red", Rgb(255, 0, 0))).unwrap();

    let mut p = Place::new("P", "P");
    p.set_token_count(TokenId::from(DEFAULT_TOKEN), 3).unwrap();
    p.set_token_count(TokenId::from("Red"), 5).unwrap();
    net.add_place(p).unwrap();
    let mut q = Place::new("Q", "Q");
    q.set_capacity(4).unwrap();
    net.add_place(q).unwrap();

    net.add_transition(Transition::new("T", "T")).unwrap();
    net.add_transition(Transition::new("U", "U")).unwrap();
    net.add_arc(Arc::inbound(
        "P",
        "T",
        weights(&[(DEFAULT_TOKEN, "1"), ("Red", "0")]),
    ))
    .unwrap();
    net.add_arc(Arc::outbound("T", "P", weights(&[(DEFAULT_TOKEN, "1")])))
        .unwrap();
    net.add_arc(Arc::inbound("P", "U", weights(&[("Red", "2")])))
        .unwrap();
    net.add_arc(Arc::outbound("U", "Q", weights(&[("Red", "1")])))
        .unwrap();
    net.add_arc(Arc::inhibitor("Q", "T")).unwrap();
    net
}

fn ids<S: AsRef<str>>(items: impl Iterator<Item = S>) -> Vec<String> {
    let mut ids: Vec<String> = items.map(|id| id.as_ref().to_owned()).collect();
    ids.sort();
    ids
}

#[test]
fn default_colour_selects_its_own_marking() {
    let unfolded = coloured().unfold().unwrap();
    let place = unfolded.place("P_Default").unwrap();
    assert_eq!(place.name, "P_Default");
    assert_eq!(place.token_count(DEFAULT_TOKEN), 3);
    assert_eq!(
        unfolded.tokens().map(|t| t.id().as_str()).collect::<Vec<_>>(),
        vec![DEFAULT_TOKEN]
    );
}

#[test]
fn unfolded_structure() {
    let unfolded = coloured().unfold().unwrap();
    assert_eq!(
        ids(unfolded.places().map(|p| p.id())),
        vec!["P_Default", "P_Red", "Q", "Q_Red"]
    );
    assert_eq!(
        ids(unfolded.arcs().map(|a| a.id())),
        vec![
            "P_Default TO T",
            "P_Red TO U",
            "Q TO T",
            "T TO P_Default",
            "U TO Q_Red",
        ]
    );

    // The Red marking of P is carried by the unfolded token.
    assert_eq!(unfolded.place("P_Red").unwrap().token_count(DEFAULT_TOKEN), 5);
    assert_eq!(unfolded.place("Q_Red").unwrap().capacity(), 4);
    assert_eq!(
        unfolded.arc("P_Red TO U").unwrap().weight_for_token(DEFAULT_TOKEN),
        "2"
    );
    assert_eq!(
        unfolded.arc("Q TO T").unwrap().kind(),
        ArcKind::InboundInhibitor
    );
}

#[test]
fn unfolded_net_is_executable() {
    let unfolded = coloured().unfold().unwrap();
    let state = unfolded.initial_state();
    let enabled = unfolded.enabled_transitions(&state).unwrap();
    assert_eq!(enabled.len(), 2);
    let next = unfolded.fire_transition(&state, "U").unwrap();
    assert_eq!(next.token_count("P_Red", DEFAULT_TOKEN), 3);
    assert_eq!(next.token_count("Q_Red", DEFAULT_TOKEN), 1);
}

#[test]
fn unfolding_is_deterministic() {
    let net = coloured();
    let first = net.unfold().unwrap();
    let second = net.unfold().unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.places().map(|p| p.id().clone()).collect::<Vec<_>>(),
        second.places().map(|p| p.id().clone()).collect::<Vec<_>>()
    );
}

#[test]
fn weight_insertion_order_does_not_matter() {
    let mut reordered = coloured();
    reordered.remove_arc("P TO T").unwrap();
    reordered
        .add_arc(Arc::inbound(
            "P",
            "T",
            weights(&[("Red", "0"), (DEFAULT_TOKEN, "1")]),
        ))
        .unwrap();
    let a = coloured().unfold().unwrap();
    let b = reordered.unfold().unwrap();
    assert_eq!(
        ids(a.places().map(|p| p.id())),
        ids(b.places().map(|p| p.id()))
    );
    assert_eq!(
        a.place("P_Default").unwrap().token_count(DEFAULT_TOKEN),
        b.place("P_Default").unwrap().token_count(DEFAULT_TOKEN)
    );
}
