//! Telephony state values delivered to observers.
//!
//! These are plain immutable records owned by the radio, data, call and SIM
//! domains. Each enum converts from the raw integer reported by the native
//! services; unknown values collapse to the enum's unknown/none variant.

pub mod call;
pub mod data;
pub mod provider;
pub mod radio;
pub mod sim;

// Re-export main types
pub use call::{CallState, CallStateInfo, CallStatus};
#[allow(deprecated)]
pub use call::CallStateUpdate;
pub use data::{DataConnectState, DataConnectionStateInfo, DataFlowType};
pub use provider::{LocalStateSource, NoopStateSource, SlotState, StateSource};
pub use radio::{
    CellInformation, NetworkState, NetworkType, NsaState, RadioTechnology, RatType, RegState,
    SignalInformation,
};
pub use sim::{CardType, LockReason, SimState, SimStateData};
