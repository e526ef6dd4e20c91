//! Core engine – carousel positioning, input normalization, text reveal and
//! the frame clock that drives them.
//!
//! Nothing in this module depends on any TUI or rendering crate.  Output goes
//! through [`sink::RenderSink`]; time comes in as explicit deltas.

pub mod carousel;
pub mod input;
pub mod reveal;
pub mod scheduler;
pub mod scramble;
pub mod sink;
