//! Cellular data connection values.

use serde::{Deserialize, Serialize};

use super::radio::RatType;

/// Cellular data connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataConnectState {
    Unknown = -1,
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Suspended = 3,
}

impl From<i32> for DataConnectState {
    fn from(value: i32) -> Self {
        match value {
            0 => DataConnectState::Disconnected,
            1 => DataConnectState::Connecting,
            2 => DataConnectState::Connected,
            3 => DataConnectState::Suspended,
            _ => DataConnectState::Unknown,
        }
    }
}

/// Direction of traffic on the cellular data link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataFlowType {
    None = 0,
    Down = 1,
    Up = 2,
    UpDown = 3,
    Dormant = 4,
}

impl From<i32> for DataFlowType {
    fn from(value: i32) -> Self {
        match value {
            1 => DataFlowType::Down,
            2 => DataFlowType::Up,
            3 => DataFlowType::UpDown,
            4 => DataFlowType::Dormant,
            _ => DataFlowType::None,
        }
    }
}

/// Payload of `cellularDataConnectionStateChange`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConnectionStateInfo {
    pub state: DataConnectState,
    pub network: RatType,
}

impl DataConnectionStateInfo {
    /// Build from the raw values reported by the native data service
    pub fn new(state: i32, network: i32) -> Self {
        Self {
            state: DataConnectState::from(state),
            network: RatType::from(network),
        }
    }
}
