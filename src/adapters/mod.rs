//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements          | Connects to                  |
//! |----------------|---------------------|------------------------------|
//! | `config_store` | ConfigPort          | in-memory postcard / JSON file |
//! | `log_sink`     | EventSink           | `log` output                 |
//! | `sim`          | every platform port | scripted host simulation     |
//! | `time`         | Clock               | `Instant` + reactor timers, or virtual time |

pub mod config_store;
pub mod log_sink;
pub mod sim;
pub mod time;
