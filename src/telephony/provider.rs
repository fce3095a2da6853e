//! State sources feeding the observer registry.
//!
//! The registry never produces events itself. A [`StateSource`] is told when
//! listeners start and stop observing a (slot, kind) pair and pushes updates
//! back through [`ObserverRegistry::publish`]. Permission checks and caller
//! privacy rules live on this side of the seam.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info};

use crate::error::{ObserverError, Result};
use crate::observer::events::READ_CALL_LOG;
use crate::observer::{EventKind, ObserverRegistry, Payload};
use crate::telephony::{
    CallStateInfo, CellInformation, DataConnectionStateInfo, DataFlowType, NetworkState,
    SignalInformation, SimStateData,
};

/// Producer side of the observer registry.
///
/// Implementations must not call back into the registry from these methods;
/// the registry holds its subscription lock while calling them.
pub trait StateSource: Send + Sync {
    /// First listener for `kind` on `slot_id` arrived
    fn start_observing(&self, slot_id: i32, kind: EventKind) -> Result<()>;

    /// Last listener for `kind` on `slot_id` left
    fn stop_observing(&self, slot_id: i32, kind: EventKind) -> Result<()>;
}

/// Source that accepts every registration and never emits
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStateSource;

impl StateSource for NoopStateSource {
    fn start_observing(&self, _slot_id: i32, _kind: EventKind) -> Result<()> {
        Ok(())
    }

    fn stop_observing(&self, _slot_id: i32, _kind: EventKind) -> Result<()> {
        Ok(())
    }
}

/// Latest known state of one card slot
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotState {
    pub network_state: Option<NetworkState>,
    pub signal_info: Option<Vec<SignalInformation>>,
    pub cell_info: Option<Vec<CellInformation>>,
    pub data_connection: Option<DataConnectionStateInfo>,
    pub data_flow: Option<DataFlowType>,
    pub call_state: Option<CallStateInfo>,
    pub cfu_indicator: Option<bool>,
    pub voice_mail_indicator: Option<bool>,
    pub sim_state: Option<SimStateData>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// In-process state source for development, tests and the CLI simulator.
///
/// Holds the caller's granted permissions, enforces them when a kind starts
/// being observed, caches the latest state per slot and publishes updates.
#[derive(Debug)]
pub struct LocalStateSource {
    granted: RwLock<HashSet<String>>,
    system_app: AtomicBool,
    connected: AtomicBool,
    observing: Mutex<BTreeSet<(i32, EventKind)>>,
    states: Mutex<BTreeMap<i32, SlotState>>,
}

impl LocalStateSource {
    /// Create a source for an ordinary application with no permissions
    pub fn new() -> Self {
        Self {
            granted: RwLock::new(HashSet::new()),
            system_app: AtomicBool::new(false),
            connected: AtomicBool::new(true),
            observing: Mutex::new(BTreeSet::new()),
            states: Mutex::new(BTreeMap::new()),
        }
    }

    /// Create a source for a system application holding every permission
    pub fn privileged() -> Self {
        let source = Self::new();
        source.set_system_app(true);
        for kind in EventKind::ALL {
            for permission in kind.required_permissions() {
                source.grant(permission);
            }
        }
        source.grant(READ_CALL_LOG);
        source
    }

    pub fn grant(&self, permission: &str) {
        self.granted
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(permission.to_string());
    }

    pub fn revoke(&self, permission: &str) {
        self.granted
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(permission);
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.granted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(permission)
    }

    pub fn set_system_app(&self, system_app: bool) {
        self.system_app.store(system_app, Ordering::SeqCst);
    }

    /// Simulate losing or regaining the connection to the state service
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Whether some listener currently observes `kind` on `slot_id`
    pub fn is_observing(&self, slot_id: i32, kind: EventKind) -> bool {
        lock(&self.observing).contains(&(slot_id, kind))
    }

    /// Latest cached state for every slot that has reported anything
    pub fn snapshot(&self) -> BTreeMap<i32, SlotState> {
        lock(&self.states).clone()
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ObserverError::service_connection("state registry service is unavailable"))
        }
    }

    fn check_access(&self, kind: EventKind) -> Result<()> {
        if kind.is_system_only() && !self.system_app.load(Ordering::SeqCst) {
            return Err(ObserverError::permission_denied(format!(
                "{} is reserved for system applications",
                kind
            )));
        }

        for permission in kind.required_permissions() {
            if !self.has_permission(permission) {
                return Err(ObserverError::permission_denied(*permission));
            }
        }

        Ok(())
    }

    fn record<F>(&self, slot_id: i32, update: F)
    where
        F: FnOnce(&mut SlotState),
    {
        let mut states = lock(&self.states);
        let state = states.entry(slot_id).or_default();
        update(state);
        state.updated_at = Some(Utc::now());
    }

    pub fn update_network_state(
        &self,
        registry: &ObserverRegistry,
        slot_id: i32,
        state: NetworkState,
    ) -> Result<usize> {
        registry.validate_slot(EventKind::NetworkStateChange, slot_id)?;
        self.record(slot_id, |s| s.network_state = Some(state.clone()));
        registry.publish(EventKind::NetworkStateChange, Some(slot_id), Payload::NetworkStateChange(state))
    }

    pub fn update_signal_info(
        &self,
        registry: &ObserverRegistry,
        slot_id: i32,
        signals: Vec<SignalInformation>,
    ) -> Result<usize> {
        registry.validate_slot(EventKind::SignalInfoChange, slot_id)?;
        self.record(slot_id, |s| s.signal_info = Some(signals.clone()));
        registry.publish(EventKind::SignalInfoChange, Some(slot_id), Payload::SignalInfoChange(signals))
    }

    pub fn update_cell_info(
        &self,
        registry: &ObserverRegistry,
        slot_id: i32,
        cells: Vec<CellInformation>,
    ) -> Result<usize> {
        registry.validate_slot(EventKind::CellInfoChange, slot_id)?;
        self.record(slot_id, |s| s.cell_info = Some(cells.clone()));
        registry.publish(EventKind::CellInfoChange, Some(slot_id), Payload::CellInfoChange(cells))
    }

    /// Publishes only when the state or the radio technology changed
    pub fn update_data_connection(
        &self,
        registry: &ObserverRegistry,
        slot_id: i32,
        info: DataConnectionStateInfo,
    ) -> Result<usize> {
        registry.validate_slot(EventKind::CellularDataConnectionStateChange, slot_id)?;
        let previous = lock(&self.states).get(&slot_id).and_then(|s| s.data_connection);
        if previous == Some(info) {
            debug!("Data connection on slot {} unchanged, not publishing", slot_id);
            return Ok(0);
        }

        self.record(slot_id, |s| s.data_connection = Some(info));
        registry.publish(
            EventKind::CellularDataConnectionStateChange,
            Some(slot_id),
            Payload::CellularDataConnectionStateChange(info),
        )
    }

    pub fn update_data_flow(
        &self,
        registry: &ObserverRegistry,
        slot_id: i32,
        flow: DataFlowType,
    ) -> Result<usize> {
        registry.validate_slot(EventKind::CellularDataFlowChange, slot_id)?;
        self.record(slot_id, |s| s.data_flow = Some(flow));
        registry.publish(EventKind::CellularDataFlowChange, Some(slot_id), Payload::CellularDataFlowChange(flow))
    }

    /// The number is blanked unless the caller may read the call log
    pub fn update_call_state(
        &self,
        registry: &ObserverRegistry,
        slot_id: i32,
        info: CallStateInfo,
    ) -> Result<usize> {
        registry.validate_slot(EventKind::CallStateChange, slot_id)?;
        self.record(slot_id, |s| s.call_state = Some(info.clone()));

        let delivered = if self.has_permission(READ_CALL_LOG) {
            info
        } else {
            info.masked()
        };
        registry.publish(EventKind::CallStateChange, Some(slot_id), Payload::CallStateChange(delivered))
    }

    pub fn update_cfu_indicator(
        &self,
        registry: &ObserverRegistry,
        slot_id: i32,
        enabled: bool,
    ) -> Result<usize> {
        registry.validate_slot(EventKind::CfuIndicatorChange, slot_id)?;
        self.record(slot_id, |s| s.cfu_indicator = Some(enabled));
        registry.publish(EventKind::CfuIndicatorChange, Some(slot_id), Payload::CfuIndicatorChange(enabled))
    }

    pub fn update_voice_mail_indicator(
        &self,
        registry: &ObserverRegistry,
        slot_id: i32,
        waiting: bool,
    ) -> Result<usize> {
        registry.validate_slot(EventKind::VoiceMailMsgIndicatorChange, slot_id)?;
        self.record(slot_id, |s| s.voice_mail_indicator = Some(waiting));
        registry.publish(
            EventKind::VoiceMailMsgIndicatorChange,
            Some(slot_id),
            Payload::VoiceMailMsgIndicatorChange(waiting),
        )
    }

    pub fn update_sim_state(
        &self,
        registry: &ObserverRegistry,
        slot_id: i32,
        data: SimStateData,
    ) -> Result<usize> {
        registry.validate_slot(EventKind::SimStateChange, slot_id)?;
        self.record(slot_id, |s| s.sim_state = Some(data));
        registry.publish(EventKind::SimStateChange, Some(slot_id), Payload::SimStateChange(data))
    }

    pub fn update_icc_account(&self, registry: &ObserverRegistry) -> Result<usize> {
        registry.publish(EventKind::IccAccountInfoChange, None, Payload::IccAccountInfoChange)
    }

    /// Route a payload to the matching `update_*` method
    pub fn update(&self, registry: &ObserverRegistry, slot_id: i32, payload: Payload) -> Result<usize> {
        match payload {
            Payload::NetworkStateChange(state) => self.update_network_state(registry, slot_id, state),
            Payload::SignalInfoChange(signals) => self.update_signal_info(registry, slot_id, signals),
            Payload::CellInfoChange(cells) => self.update_cell_info(registry, slot_id, cells),
            Payload::CellularDataConnectionStateChange(info) => {
                self.update_data_connection(registry, slot_id, info)
            }
            Payload::CellularDataFlowChange(flow) => self.update_data_flow(registry, slot_id, flow),
            Payload::CallStateChange(info) => self.update_call_state(registry, slot_id, info),
            Payload::CfuIndicatorChange(enabled) => self.update_cfu_indicator(registry, slot_id, enabled),
            Payload::VoiceMailMsgIndicatorChange(waiting) => {
                self.update_voice_mail_indicator(registry, slot_id, waiting)
            }
            Payload::SimStateChange(data) => self.update_sim_state(registry, slot_id, data),
            Payload::IccAccountInfoChange => self.update_icc_account(registry),
        }
    }
}

impl Default for LocalStateSource {
    fn default() -> Self {
        Self::new()
    }
}

impl StateSource for LocalStateSource {
    fn start_observing(&self, slot_id: i32, kind: EventKind) -> Result<()> {
        self.ensure_connected()?;
        self.check_access(kind)?;

        if lock(&self.observing).insert((slot_id, kind)) {
            info!("Started observing {} on slot {}", kind, slot_id);
        }
        Ok(())
    }

    fn stop_observing(&self, slot_id: i32, kind: EventKind) -> Result<()> {
        self.ensure_connected()?;

        if lock(&self.observing).remove(&(slot_id, kind)) {
            info!("Stopped observing {} on slot {}", kind, slot_id);
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
