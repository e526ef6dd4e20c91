//! UI / rendering layer: everything that touches Ratatui widgets.
//!
//! This layer reads what the engine pushed into the render sink and turns it
//! into cells on the terminal.  No engine state is mutated here.

pub mod layout;
pub mod popup;
pub mod stage;
pub mod storyline;
pub mod theme;
