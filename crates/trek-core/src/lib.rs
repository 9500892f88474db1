//! Core types and operations for the Trek initiative board.
//!
//! This crate is deliberately free of database, CSV and terminal
//! dependencies. It owns the board model and the only operations allowed to
//! change it; persistence is reached through the [`store::BoardStore`] trait.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod board;
pub mod error;
pub mod initiative;
pub mod migrate;
pub mod moves;
pub mod stage;
pub mod store;
pub mod tracker;

pub use board::{Board, Columns};
pub use error::{Error, Result};
pub use initiative::{Initiative, InitiativeId, InitiativePatch, NewInitiative, Status};
pub use stage::Stage;
