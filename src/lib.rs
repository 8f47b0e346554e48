//! Atomu air purifier firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  ESP-IDF-specific code is gated behind the `espidf`
//! feature; everything else builds and tests on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod ledger;
pub mod pins;
pub mod scheduler;
pub mod sensors;
