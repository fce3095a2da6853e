//! Observer subscriptions for telephony state changes.
//!
//! Applications register listeners per event kind, optionally bound to a card
//! slot, and the [`ObserverRegistry`] fans out updates published by a
//! [`crate::telephony::StateSource`].

pub mod callback;
pub mod events;
pub mod registry;

// Re-export main types
pub use callback::{Callback, CallbackId};
pub use events::{
    CallStateChange, CellInfoChange, CellularDataConnectionStateChange, CellularDataFlowChange,
    CfuIndicatorChange, EventKind, IccAccountInfoChange, NetworkStateChange, ObserverEvent,
    ObserverOptions, Payload, SignalInfoChange, SimStateChange, VoiceMailMsgIndicatorChange,
    DEFAULT_SIM_SLOT_ID,
};
pub use registry::{ObserverRegistry, Registration, SubscriptionId, SubscriptionMode};
