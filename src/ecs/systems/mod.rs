//! Per-frame simulation systems.
//!
//! [`crate::Map::update`] drives them in a fixed order, per actor:
//! controller (FSM sets velocity) -> physics (integration + tile raycasts)
//! -> spatial (grid membership); then detection across all actors; then
//! response per actor. Detection must finish for every actor before any
//! response runs — response reads symmetric pair records built by detection.

pub mod collision;
pub mod controller;
pub mod physics;
pub mod spatial;
