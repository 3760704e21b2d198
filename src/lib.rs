//! Execution engine for coloured Petri nets: data model, functional weights,
//! enabling and firing, colour unfolding and persistence.
pub mod config;
pub mod expr;
pub mod net;
pub mod options;
