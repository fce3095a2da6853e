//! Call state values.

use serde::{Deserialize, Serialize};

/// Call state as seen by observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallState {
    Unknown = -1,
    Idle = 0,
    Ringing = 1,
    Offhook = 2,
    Answered = 3,
}

impl From<i32> for CallState {
    fn from(value: i32) -> Self {
        match value {
            0 => CallState::Idle,
            1 => CallState::Ringing,
            2 => CallState::Offhook,
            3 => CallState::Answered,
            _ => CallState::Unknown,
        }
    }
}

/// Detailed status of a single call as tracked by the call manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallStatus {
    Active = 0,
    Holding = 1,
    Dialing = 2,
    Alerting = 3,
    Incoming = 4,
    Waiting = 5,
    Disconnected = 6,
    Disconnecting = 7,
    Idle = 8,
}

impl CallStatus {
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(CallStatus::Active),
            1 => Some(CallStatus::Holding),
            2 => Some(CallStatus::Dialing),
            3 => Some(CallStatus::Alerting),
            4 => Some(CallStatus::Incoming),
            5 => Some(CallStatus::Waiting),
            6 => Some(CallStatus::Disconnected),
            7 => Some(CallStatus::Disconnecting),
            8 => Some(CallStatus::Idle),
            _ => None,
        }
    }
}

impl CallState {
    /// Collapse a detailed call status into the observer-facing state
    pub fn from_native_status(status: Option<CallStatus>) -> Self {
        match status {
            Some(
                CallStatus::Active
                | CallStatus::Holding
                | CallStatus::Dialing
                | CallStatus::Alerting
                | CallStatus::Disconnecting,
            ) => CallState::Offhook,
            Some(CallStatus::Waiting | CallStatus::Incoming) => CallState::Ringing,
            Some(CallStatus::Disconnected | CallStatus::Idle) => CallState::Idle,
            None => CallState::Unknown,
        }
    }
}

/// Payload of `callStateChange`.
///
/// `number` is empty when the observing application may not read the call log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStateInfo {
    pub state: CallState,
    pub number: String,
}

impl CallStateInfo {
    pub fn new(state: CallState, number: impl Into<String>) -> Self {
        Self {
            state,
            number: number.into(),
        }
    }

    /// Copy with the number blanked out
    pub fn masked(&self) -> Self {
        Self {
            state: self.state,
            number: String::new(),
        }
    }
}

/// Anonymous `{ state, number }` shape used before `CallStateInfo` was named.
#[deprecated(note = "use CallStateInfo")]
pub type CallStateUpdate = CallStateInfo;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_status_mapping() {
        for raw in [0, 1, 2, 3, 7] {
            assert_eq!(CallState::from_native_status(CallStatus::from_raw(raw)), CallState::Offhook);
        }
        for raw in [4, 5] {
            assert_eq!(CallState::from_native_status(CallStatus::from_raw(raw)), CallState::Ringing);
        }
        for raw in [6, 8] {
            assert_eq!(CallState::from_native_status(CallStatus::from_raw(raw)), CallState::Idle);
        }
        assert_eq!(CallState::from_native_status(CallStatus::from_raw(99)), CallState::Unknown);
    }

    #[test]
    #[allow(deprecated)]
    fn test_legacy_shape_is_same_record() {
        let legacy: CallStateUpdate = CallStateInfo::new(CallState::Ringing, "+391234567");
        let json = serde_json::to_value(&legacy).unwrap();

        assert_eq!(json["state"], "RINGING");
        assert_eq!(json["number"], "+391234567");
        assert_eq!(legacy.masked().number, "");
    }
}
