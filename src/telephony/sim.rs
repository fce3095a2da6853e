//! SIM card values.

use serde::{Deserialize, Serialize};

/// Physical card type in a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardType {
    UnknownCard = -1,
    SingleModeSimCard = 10,
    SingleModeUsimCard = 20,
    SingleModeRuimCard = 30,
    DualModeCgCard = 40,
    CtNationalRoamingCard = 41,
    CuDualModeCard = 42,
    DualModeTelecomLteCard = 43,
    DualModeUgCard = 50,
    SingleModeIsimCard = 60,
}

impl From<i32> for CardType {
    fn from(value: i32) -> Self {
        match value {
            10 => CardType::SingleModeSimCard,
            20 => CardType::SingleModeUsimCard,
            30 => CardType::SingleModeRuimCard,
            40 => CardType::DualModeCgCard,
            41 => CardType::CtNationalRoamingCard,
            42 => CardType::CuDualModeCard,
            43 => CardType::DualModeTelecomLteCard,
            50 => CardType::DualModeUgCard,
            60 => CardType::SingleModeIsimCard,
            _ => CardType::UnknownCard,
        }
    }
}

/// SIM lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimState {
    #[serde(rename = "SIM_STATE_UNKNOWN")]
    Unknown = 0,
    #[serde(rename = "SIM_STATE_NOT_PRESENT")]
    NotPresent = 1,
    #[serde(rename = "SIM_STATE_LOCKED")]
    Locked = 2,
    #[serde(rename = "SIM_STATE_NOT_READY")]
    NotReady = 3,
    #[serde(rename = "SIM_STATE_READY")]
    Ready = 4,
    #[serde(rename = "SIM_STATE_LOADED")]
    Loaded = 5,
}

impl From<i32> for SimState {
    fn from(value: i32) -> Self {
        match value {
            1 => SimState::NotPresent,
            2 => SimState::Locked,
            3 => SimState::NotReady,
            4 => SimState::Ready,
            5 => SimState::Loaded,
            _ => SimState::Unknown,
        }
    }
}

/// Why a SIM is locked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockReason {
    SimNone = 0,
    SimPin = 1,
    SimPuk = 2,
    /// Network personalization
    SimPnPin = 3,
    SimPnPuk = 4,
    /// Network subset personalization
    SimPuPin = 5,
    SimPuPuk = 6,
    /// Service provider personalization
    SimPpPin = 7,
    SimPpPuk = 8,
    /// Corporate personalization
    SimPcPin = 9,
    SimPcPuk = 10,
    /// SIM/USIM personalization
    SimSimPin = 11,
    SimSimPuk = 12,
}

impl From<i32> for LockReason {
    fn from(value: i32) -> Self {
        match value {
            1 => LockReason::SimPin,
            2 => LockReason::SimPuk,
            3 => LockReason::SimPnPin,
            4 => LockReason::SimPnPuk,
            5 => LockReason::SimPuPin,
            6 => LockReason::SimPuPuk,
            7 => LockReason::SimPpPin,
            8 => LockReason::SimPpPuk,
            9 => LockReason::SimPcPin,
            10 => LockReason::SimPcPuk,
            11 => LockReason::SimSimPin,
            12 => LockReason::SimSimPuk,
            _ => LockReason::SimNone,
        }
    }
}

/// Payload of `simStateChange`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStateData {
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub state: SimState,
    pub reason: LockReason,
}

impl SimStateData {
    pub fn new(card_type: CardType, state: SimState, reason: LockReason) -> Self {
        Self {
            card_type,
            state,
            reason,
        }
    }

    /// Build from the raw values reported by the native SIM service
    pub fn from_raw(card_type: i32, state: i32, reason: i32) -> Self {
        Self::new(CardType::from(card_type), SimState::from(state), LockReason::from(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_reason_covers_all_raw_values() {
        let reasons: Vec<LockReason> = (0..13).map(LockReason::from).collect();
        assert_eq!(reasons.first(), Some(&LockReason::SimNone));
        assert_eq!(reasons.last(), Some(&LockReason::SimSimPuk));
        assert_eq!(LockReason::from(13), LockReason::SimNone);
    }

    #[test]
    fn test_sim_state_data_from_raw() {
        let data = SimStateData::from_raw(20, 2, 1);
        assert_eq!(data.card_type, CardType::SingleModeUsimCard);
        assert_eq!(data.state, SimState::Locked);
        assert_eq!(data.reason, LockReason::SimPin);

        let json = serde_json::to_value(data).unwrap();
        assert_eq!(json["type"], "SINGLE_MODE_USIM_CARD");
        assert_eq!(json["state"], "SIM_STATE_LOCKED");
        assert_eq!(json["reason"], "SIM_PIN");
    }

    #[test]
    fn test_unknown_card_type() {
        assert_eq!(CardType::from(11), CardType::UnknownCard);
    }
}
