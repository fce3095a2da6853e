//! Observable telephony event kinds and their payloads.
//!
//! Every kind has exactly one payload shape. The [`ObserverEvent`] marker types
//! bind a kind to its Rust payload type so typed listeners can only be handed
//! the shape they were written for.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ObserverError;
use crate::telephony::{
    CallStateInfo, CellInformation, DataConnectionStateInfo, DataFlowType, NetworkState,
    SignalInformation, SimStateData,
};

pub const GET_NETWORK_INFO: &str = "ohos.permission.GET_NETWORK_INFO";
pub const LOCATION: &str = "ohos.permission.LOCATION";
pub const APPROXIMATELY_LOCATION: &str = "ohos.permission.APPROXIMATELY_LOCATION";
pub const GET_TELEPHONY_STATE: &str = "ohos.permission.GET_TELEPHONY_STATE";
pub const READ_CALL_LOG: &str = "ohos.permission.READ_CALL_LOG";

/// Slot used when a subscription carries no selector.
pub const DEFAULT_SIM_SLOT_ID: i32 = 0;

/// Kind of telephony event a listener can observe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    NetworkStateChange,
    SignalInfoChange,
    CellInfoChange,
    CellularDataConnectionStateChange,
    CellularDataFlowChange,
    CallStateChange,
    CfuIndicatorChange,
    VoiceMailMsgIndicatorChange,
    SimStateChange,
    IccAccountInfoChange,
}

impl EventKind {
    pub const ALL: [EventKind; 10] = [
        EventKind::NetworkStateChange,
        EventKind::SignalInfoChange,
        EventKind::CellInfoChange,
        EventKind::CellularDataConnectionStateChange,
        EventKind::CellularDataFlowChange,
        EventKind::CallStateChange,
        EventKind::CfuIndicatorChange,
        EventKind::VoiceMailMsgIndicatorChange,
        EventKind::SimStateChange,
        EventKind::IccAccountInfoChange,
    ];

    /// Wire-stable event name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::NetworkStateChange => "networkStateChange",
            EventKind::SignalInfoChange => "signalInfoChange",
            EventKind::CellInfoChange => "cellInfoChange",
            EventKind::CellularDataConnectionStateChange => "cellularDataConnectionStateChange",
            EventKind::CellularDataFlowChange => "cellularDataFlowChange",
            EventKind::CallStateChange => "callStateChange",
            EventKind::CfuIndicatorChange => "cfuIndicatorChange",
            EventKind::VoiceMailMsgIndicatorChange => "voiceMailMsgIndicatorChange",
            EventKind::SimStateChange => "simStateChange",
            EventKind::IccAccountInfoChange => "iccAccountInfoChange",
        }
    }

    /// Observer mask bit used by the native state registry
    pub fn mask(&self) -> u32 {
        match self {
            EventKind::NetworkStateChange => 0x0000_0001,
            EventKind::CallStateChange => 0x0000_0004,
            EventKind::CellInfoChange => 0x0000_0008,
            EventKind::SignalInfoChange => 0x0000_0010,
            EventKind::SimStateChange => 0x0000_0020,
            EventKind::CellularDataConnectionStateChange => 0x0000_0040,
            EventKind::CellularDataFlowChange => 0x0000_0080,
            EventKind::CfuIndicatorChange => 0x0000_0100,
            EventKind::VoiceMailMsgIndicatorChange => 0x0000_0200,
            EventKind::IccAccountInfoChange => 0x0000_0400,
        }
    }

    /// Kinds reserved for system applications
    pub fn is_system_only(&self) -> bool {
        matches!(
            self,
            EventKind::CellInfoChange
                | EventKind::CfuIndicatorChange
                | EventKind::VoiceMailMsgIndicatorChange
        )
    }

    /// Permissions the caller must hold to observe this kind
    pub fn required_permissions(&self) -> &'static [&'static str] {
        match self {
            EventKind::NetworkStateChange => &[GET_NETWORK_INFO],
            EventKind::CellInfoChange => &[LOCATION, APPROXIMATELY_LOCATION],
            EventKind::CfuIndicatorChange | EventKind::VoiceMailMsgIndicatorChange => {
                &[GET_TELEPHONY_STATE]
            }
            _ => &[],
        }
    }

    /// Whether `on`/`once` accept an `ObserverOptions` selector for this kind
    pub fn accepts_slot_selector(&self) -> bool {
        !matches!(self, EventKind::IccAccountInfoChange)
    }

    /// Lowest slot id accepted for this kind. Call state may be observed on
    /// slot -1, which the call manager uses for calls not bound to a card.
    pub fn min_slot_id(&self) -> i32 {
        match self {
            EventKind::CallStateChange => -1,
            _ => 0,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ObserverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ObserverError::invalid_parameter(format!("unknown event type '{}'", s)))
    }
}

/// Slot selector attached to a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserverOptions {
    pub slot_id: i32,
}

impl ObserverOptions {
    pub fn slot(slot_id: i32) -> Self {
        Self { slot_id }
    }
}

/// Payload carried by a published event, one variant per [`EventKind`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Payload {
    NetworkStateChange(NetworkState),
    SignalInfoChange(Vec<SignalInformation>),
    CellInfoChange(Vec<CellInformation>),
    CellularDataConnectionStateChange(DataConnectionStateInfo),
    CellularDataFlowChange(DataFlowType),
    CallStateChange(CallStateInfo),
    CfuIndicatorChange(bool),
    VoiceMailMsgIndicatorChange(bool),
    SimStateChange(SimStateData),
    IccAccountInfoChange,
}

impl Payload {
    /// The only event kind this payload may be delivered for
    pub fn kind(&self) -> EventKind {
        match self {
            Payload::NetworkStateChange(_) => EventKind::NetworkStateChange,
            Payload::SignalInfoChange(_) => EventKind::SignalInfoChange,
            Payload::CellInfoChange(_) => EventKind::CellInfoChange,
            Payload::CellularDataConnectionStateChange(_) => {
                EventKind::CellularDataConnectionStateChange
            }
            Payload::CellularDataFlowChange(_) => EventKind::CellularDataFlowChange,
            Payload::CallStateChange(_) => EventKind::CallStateChange,
            Payload::CfuIndicatorChange(_) => EventKind::CfuIndicatorChange,
            Payload::VoiceMailMsgIndicatorChange(_) => EventKind::VoiceMailMsgIndicatorChange,
            Payload::SimStateChange(_) => EventKind::SimStateChange,
            Payload::IccAccountInfoChange => EventKind::IccAccountInfoChange,
        }
    }
}

/// Binds an event kind to its payload type
pub trait ObserverEvent: 'static {
    const KIND: EventKind;
    type Payload: Send + Sync + 'static;

    /// Borrow the typed payload if `payload` belongs to this kind
    fn extract(payload: &Payload) -> Option<&Self::Payload>;

    fn wrap(value: Self::Payload) -> Payload;
}

macro_rules! observer_event {
    ($(#[$doc:meta])* $name:ident, $payload:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl ObserverEvent for $name {
            const KIND: EventKind = EventKind::$name;
            type Payload = $payload;

            fn extract(payload: &Payload) -> Option<&Self::Payload> {
                match payload {
                    Payload::$name(value) => Some(value),
                    _ => None,
                }
            }

            fn wrap(value: Self::Payload) -> Payload {
                Payload::$name(value)
            }
        }
    };
}

observer_event!(
    /// Registration state of the serving network changed
    NetworkStateChange,
    NetworkState
);
observer_event!(
    /// Signal measurements changed
    SignalInfoChange,
    Vec<SignalInformation>
);
observer_event!(
    /// Observed cells changed (system only)
    CellInfoChange,
    Vec<CellInformation>
);
observer_event!(
    /// Cellular data connection state changed
    CellularDataConnectionStateChange,
    DataConnectionStateInfo
);
observer_event!(
    /// Cellular data flow direction changed
    CellularDataFlowChange,
    DataFlowType
);
observer_event!(
    /// Call state changed
    CallStateChange,
    CallStateInfo
);
observer_event!(
    /// Call forwarding unconditional indicator toggled (system only)
    CfuIndicatorChange,
    bool
);
observer_event!(
    /// Voice mail waiting indicator toggled (system only)
    VoiceMailMsgIndicatorChange,
    bool
);
observer_event!(
    /// SIM state changed
    SimStateChange,
    SimStateData
);

/// SIM account information changed. Carries no data.
#[derive(Debug, Clone, Copy)]
pub struct IccAccountInfoChange;

impl ObserverEvent for IccAccountInfoChange {
    const KIND: EventKind = EventKind::IccAccountInfoChange;
    type Payload = ();

    fn extract(payload: &Payload) -> Option<&Self::Payload> {
        match payload {
            Payload::IccAccountInfoChange => Some(&()),
            _ => None,
        }
    }

    fn wrap(_value: Self::Payload) -> Payload {
        Payload::IccAccountInfoChange
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telephony::{CardType, LockReason, SimState};

    #[test]
    fn test_wire_names_round_trip_through_from_str() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_event_name_is_invalid_parameter() {
        let err = "smsReceived".parse::<EventKind>().unwrap_err();
        assert!(matches!(err, ObserverError::InvalidParameter { .. }));

        // Wire names are case sensitive
        assert!("SimStateChange".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_masks_are_distinct_bits() {
        let combined = EventKind::ALL.iter().fold(0u32, |acc, kind| {
            assert_eq!(acc & kind.mask(), 0);
            acc | kind.mask()
        });
        assert_eq!(combined.count_ones(), 10);
    }

    #[test]
    fn test_system_only_kinds() {
        let system: Vec<EventKind> =
            EventKind::ALL.iter().copied().filter(EventKind::is_system_only).collect();
        assert_eq!(
            system,
            vec![
                EventKind::CellInfoChange,
                EventKind::CfuIndicatorChange,
                EventKind::VoiceMailMsgIndicatorChange
            ]
        );
    }

    #[test]
    fn test_payload_kind_matches_marker() {
        let data = SimStateData::new(CardType::UnknownCard, SimState::Ready, LockReason::SimNone);
        let payload = SimStateChange::wrap(data);

        assert_eq!(payload.kind(), SimStateChange::KIND);
        assert_eq!(SimStateChange::extract(&payload), Some(&data));
        assert_eq!(CallStateChange::extract(&payload), None);
        assert_eq!(IccAccountInfoChange::wrap(()).kind(), EventKind::IccAccountInfoChange);
    }

    #[test]
    fn test_options_wire_name() {
        let options: ObserverOptions = serde_json::from_str(r#"{"slotId":1}"#).unwrap();
        assert_eq!(options, ObserverOptions::slot(1));
    }
}
