//! Application core: pure domain logic, zero I/O.
//!
//! This module holds the guard-mode rules and the SOS escalation path.  All
//! interaction with the platform happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without a phone.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
