//! serenata: a terminal slideshow where every slide has its own song.
//!
//! The heart of the crate is [`audio::AudioCoordinator`], which preloads a
//! deck's tracks and keeps exactly one of them audible as the presentation
//! moves between slides.

pub mod app;
pub mod audio;
pub mod config;
pub mod deck;
pub mod error;
pub mod runtime;
pub mod ui;
