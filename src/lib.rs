//! Core of the NexStar Alpaca bridge: the result algebra, argument maps,
//! error taxonomy, device/telescope facade, operation table, envelope
//! renderer, NexStar wire codec and transports, and the Celestron driver
//! (spec.md §4, components A-K). `main.rs` wires this into a runnable
//! binary; `tests/` drives it as an external crate the way the teacher's
//! `star_adventurer_control` library is driven by its own `tests/`.

mod astro_math;
pub mod capabilities;
pub mod device;
pub mod driver;
pub mod envelope;
pub mod error;
pub mod join;
pub mod json;
pub mod nexstar;
pub mod operations;
pub mod params;
pub mod server;
pub mod telescope;
