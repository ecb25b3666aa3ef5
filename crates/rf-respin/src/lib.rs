//! # rf-respin — Stick-and-Win Respin Feature Engine
//!
//! Drives one respin feature activation: trigger symbols lock onto an
//! independent reel layer, the server's reevaluation payloads lock more
//! symbols and count the respin meter down, and once the meter runs out or
//! the board fills every reward is resolved in a fixed order before the
//! board returns to the standard layer.
//!
//! ## Features
//!
//! - **Layer Arena**: Standard and independent layers in one slot arena
//! - **Typed Ledger**: `outcome_type` strings classified once into `RewardKind`
//! - **Ordered Payout**: Credits → Jackpot → Progressive → Bonus, single-flight
//! - **Round Gate**: Reentrancy flag blocking round end while resolving
//! - **Variants**: Blackout (progressive jackpot) and Ladder (multiplier tiers)
//!
//! ## Architecture
//!
//! ```text
//! FeatureSession<H: FeatureHost>
//!     │
//!     ├── ReelLayerController (slot arena, reel spin locks)
//!     ├── SpinBudget (respin meter, blackout)
//!     ├── LadderProgression (ladder variant)
//!     └── RoundGate (resolving flag, running total)
//!           │
//!           v
//!     ReevaluationPayload → RewardLedger → PayoutSequencer → Stage events
//! ```

pub mod board;
pub mod budget;
pub mod config;
pub mod host;
pub mod ladder;
pub mod ledger;
pub mod payload;
pub mod round;
pub mod scenario;
pub mod sequencer;
pub mod session;
pub mod symbols;
pub mod timing;

pub use board::*;
pub use budget::*;
pub use config::*;
pub use host::*;
pub use ladder::*;
pub use ledger::*;
pub use payload::*;
pub use round::*;
pub use scenario::*;
pub use sequencer::*;
pub use session::*;
pub use symbols::*;
pub use timing::*;
