//! Application module: the presentation model driven by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the deck, the slide being
//! shown and what the audio side last reported. `app::ledger` keeps per-track
//! load bookkeeping fed from coordinator events.

mod ledger;
mod model;

pub use ledger::*;
pub use model::*;
