//! Raksha guard-mode and emergency-alert engine.
//!
//! Exposes the pure-logic modules for integration testing and for the
//! presentation layer.  Platform access lives behind the port traits in
//! [`app::ports`]; host implementations are in [`adapters`].

#![deny(unused_must_use)]

pub mod alert;
pub mod app;
pub mod blackout;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod evidence;
pub mod fsm;
pub mod health;
pub mod runtime;
pub mod scheduler;
pub mod sensors;

pub mod adapters;
