//! Tempus: stopwatch, time-box planner and notes on top of the Tempus backend
//!
//! The binary in `main.rs` is a terminal UI over these modules; `tempusctl`
//! drives the same stopwatch and stores from the command line.

pub mod app;
pub mod clock;
pub mod config;
pub mod hierarchy;
pub mod persistence;
pub mod session;
pub mod stopwatch;
pub mod store;
pub mod timebox;
pub mod ui;
pub mod validation;
