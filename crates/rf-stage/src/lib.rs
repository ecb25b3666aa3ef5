//! # rf-stage — Respin Feature Stage System
//!
//! Defines the canonical presentation moments of a Stick-and-Win respin
//! feature. The engine never plays an animation or a sound itself; it emits
//! STAGES and awaits the collaborator that renders them.
//!
//! ## Philosophy
//!
//! Every respin variant passes through the same semantic phases:
//! - Trigger → layer swap → symbols lock → respins run out or the board fills
//! - Rewards resolve in a fixed order → layer swap back → feature exit

pub mod event;
pub mod stage;
pub mod taxonomy;
pub mod trace;

pub use event::*;
pub use stage::*;
pub use taxonomy::*;
pub use trace::*;
