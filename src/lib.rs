//! # telephony-observer
//!
//! Typed subscription registry for telephony state changes.
//!
//! ## Features
//!
//! - **Event kinds**: network, signal, cell, cellular data, call, SIM and
//!   indicator updates, each bound to one payload type
//! - **Slot selection**: listeners follow one card slot or the default slot
//! - **Repeating and one-shot listeners** with identity-based removal
//! - **State sources**: a seam for the service that produces updates, with an
//!   in-process [`telephony::LocalStateSource`] for development and tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use telephony_observer::config::RegistryConfig;
//! use telephony_observer::observer::{Callback, ObserverRegistry, SimStateChange};
//! use telephony_observer::telephony::{CardType, LocalStateSource, LockReason, SimState, SimStateData};
//!
//! # fn main() -> telephony_observer::Result<()> {
//! let source = Arc::new(LocalStateSource::new());
//! let registry = ObserverRegistry::new(source.clone(), &RegistryConfig::default());
//!
//! let listener = Callback::new(|data: &SimStateData| println!("SIM is now {:?}", data.state));
//! registry.on::<SimStateChange>(None, &listener)?;
//!
//! let data = SimStateData::new(CardType::SingleModeUsimCard, SimState::Ready, LockReason::SimNone);
//! source.update_sim_state(&registry, 0, data)?;
//! registry.off::<SimStateChange>(Some(&listener))?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod observer;
pub mod telephony;

// Re-export commonly used types
pub use config::ObserverConfig;
pub use error::{ObserverError, Result};
pub use observer::{Callback, EventKind, ObserverOptions, ObserverRegistry, Payload};
pub use telephony::{LocalStateSource, StateSource};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
