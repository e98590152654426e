//! PlantWater firmware library.
//!
//! Exposes the pure-logic modules for integration testing and the
//! firmware binary. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod fsm;
pub mod ledger;
pub mod pins;
pub mod presentation;
pub mod safety;
pub mod scheduler;
pub mod statistics;

// Hardware-facing modules; the real implementations are guarded by cfg
// attributes inside, with simulation stubs on the host.
pub mod adapters;
pub mod drivers;
pub mod sensors;
