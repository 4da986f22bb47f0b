//! The deck: the ordered slides of a presentation and its finale.
//!
//! A deck is read from a TOML file. Each slide names the track that plays
//! while it is shown; the finale has a track of its own.

mod load;
mod model;

pub use model::*;
