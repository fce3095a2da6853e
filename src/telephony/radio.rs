//! Radio-domain values: network registration, signal strength and cell information.

use serde::{Deserialize, Serialize};

/// Network type reported alongside signal and cell measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkType {
    Unknown = 0,
    Gsm = 1,
    Cdma = 2,
    Wcdma = 3,
    Tdscdma = 4,
    Lte = 5,
    Nr = 6,
}

impl From<i32> for NetworkType {
    fn from(value: i32) -> Self {
        match value {
            1 => NetworkType::Gsm,
            2 => NetworkType::Cdma,
            3 => NetworkType::Wcdma,
            4 => NetworkType::Tdscdma,
            5 => NetworkType::Lte,
            6 => NetworkType::Nr,
            _ => NetworkType::Unknown,
        }
    }
}

/// Radio access technology, exposed to observers as `RatType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RadioTechnology {
    Unknown = 0,
    Gsm = 1,
    #[serde(rename = "1XRTT")]
    OneXRtt = 2,
    Wcdma = 3,
    Hspa = 4,
    Hspap = 5,
    TdScdma = 6,
    Evdo = 7,
    Ehrpd = 8,
    Lte = 9,
    LteCa = 10,
    Iwlan = 11,
    Nr = 12,
}

/// Name used by the observer API for the radio technology of a data connection.
pub type RatType = RadioTechnology;

impl From<i32> for RadioTechnology {
    fn from(value: i32) -> Self {
        match value {
            1 => Self::Gsm,
            2 => Self::OneXRtt,
            3 => Self::Wcdma,
            4 => Self::Hspa,
            5 => Self::Hspap,
            6 => Self::TdScdma,
            7 => Self::Evdo,
            8 => Self::Ehrpd,
            9 => Self::Lte,
            10 => Self::LteCa,
            11 => Self::Iwlan,
            12 => Self::Nr,
            _ => Self::Unknown,
        }
    }
}

/// Registration state of the serving network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegState {
    NoService = 0,
    InService = 1,
    EmergencyCallOnly = 2,
    PowerOff = 3,
}

impl From<i32> for RegState {
    fn from(value: i32) -> Self {
        match value {
            1 => RegState::InService,
            2 => RegState::EmergencyCallOnly,
            3 => RegState::PowerOff,
            _ => RegState::NoService,
        }
    }
}

/// 5G non-standalone attachment state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NsaState {
    NotSupport = 1,
    NoDetect = 2,
    ConnectedDetect = 3,
    IdleDetect = 4,
    DualConnected = 5,
    SaAttached = 6,
}

impl From<i32> for NsaState {
    fn from(value: i32) -> Self {
        match value {
            2 => NsaState::NoDetect,
            3 => NsaState::ConnectedDetect,
            4 => NsaState::IdleDetect,
            5 => NsaState::DualConnected,
            6 => NsaState::SaAttached,
            _ => NsaState::NotSupport,
        }
    }
}

/// One signal measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalInformation {
    pub signal_type: NetworkType,
    pub signal_level: i32,
    #[serde(rename = "dBm")]
    pub d_bm: i32,
}

impl SignalInformation {
    pub fn new(signal_type: i32, signal_level: i32, d_bm: i32) -> Self {
        Self {
            signal_type: NetworkType::from(signal_type),
            signal_level,
            d_bm,
        }
    }
}

/// One observed cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellInformation {
    pub network_type: NetworkType,
    pub signal_information: SignalInformation,
}

impl CellInformation {
    pub fn new(network_type: i32, signal_information: SignalInformation) -> Self {
        Self {
            network_type: NetworkType::from(network_type),
            signal_information,
        }
    }
}

/// Registration state of the serving network and operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkState {
    pub long_operator_name: String,
    pub short_operator_name: String,
    pub plmn_numeric: String,
    pub is_roaming: bool,
    pub reg_state: RegState,
    pub cfg_tech: RadioTechnology,
    pub nsa_state: NsaState,
    pub is_emergency: bool,
}

impl Default for NetworkState {
    fn default() -> Self {
        Self {
            long_operator_name: String::new(),
            short_operator_name: String::new(),
            plmn_numeric: String::new(),
            is_roaming: false,
            reg_state: RegState::NoService,
            cfg_tech: RadioTechnology::Unknown,
            nsa_state: NsaState::NotSupport,
            is_emergency: false,
        }
    }
}
