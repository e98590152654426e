//! Application core — pure domain logic, zero I/O.
//!
//! Scheduler orchestration, interlock evaluation, statistics and ledger
//! write-through.  All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
