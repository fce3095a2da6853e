//! Simulate command implementation.
//!
//! Replays a JSON script of subscribe, unsubscribe and publish steps against a
//! fresh registry backed by a [`LocalStateSource`]:
//!
//! ```json
//! {
//!   "steps": [
//!     { "action": "subscribe", "event": "simStateChange", "listener": "a", "options": { "slotId": 1 } },
//!     { "action": "publish", "slotId": 1,
//!       "payload": { "type": "simStateChange", "data": { "type": "UNKNOWN_CARD", "state": "SIM_STATE_READY", "reason": "SIM_NONE" } } },
//!     { "action": "unsubscribe", "event": "simStateChange" }
//!   ]
//! }
//! ```

use clap::Args;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::fs;
use tracing::{debug, info};

use crate::config::{ObserverConfig, RegistryConfig};
use crate::error::{ObserverError, Result};
use crate::observer::{
    Callback, ObserverOptions, ObserverRegistry, Payload, Registration, SubscriptionMode,
};
use crate::telephony::{LocalStateSource, SlotState};

/// Arguments for the simulate command
#[derive(Args)]
pub struct SimulateArgs {
    /// Script file to replay
    pub script: PathBuf,

    /// Permission granted to the simulated caller (repeatable)
    #[arg(long)]
    pub grant: Vec<String>,

    /// Run as a system application
    #[arg(long)]
    pub system: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Step {
    Subscribe {
        event: String,
        listener: String,
        #[serde(default)]
        options: Option<ObserverOptions>,
        #[serde(default)]
        once: bool,
    },
    Unsubscribe {
        event: String,
        #[serde(default)]
        listener: Option<String>,
    },
    Publish {
        #[serde(default, rename = "slotId")]
        slot_id: Option<i32>,
        payload: Payload,
    },
    SetDefaultSlot {
        #[serde(rename = "slotId")]
        slot_id: i32,
    },
    Grant {
        permission: String,
    },
    Revoke {
        permission: String,
    },
    SetConnected {
        connected: bool,
    },
}

impl Step {
    fn action(&self) -> &'static str {
        match self {
            Step::Subscribe { .. } => "subscribe",
            Step::Unsubscribe { .. } => "unsubscribe",
            Step::Publish { .. } => "publish",
            Step::SetDefaultSlot { .. } => "setDefaultSlot",
            Step::Grant { .. } => "grant",
            Step::Revoke { .. } => "revoke",
            Step::SetConnected { .. } => "setConnected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub listener: String,
    pub payload: Payload,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub index: usize,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub deliveries: Vec<Delivery>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub steps: Vec<StepOutcome>,
    pub remaining_subscriptions: usize,
    pub registrations: Vec<Registration>,
    pub slots: std::collections::BTreeMap<i32, SlotState>,
}

/// Replays scripts against one registry, recording deliveries per step
pub struct Simulator {
    source: Arc<LocalStateSource>,
    registry: ObserverRegistry,
    listeners: HashMap<String, Callback<Payload>>,
    inbox: Arc<Mutex<Vec<Delivery>>>,
}

impl Simulator {
    pub fn new(source: Arc<LocalStateSource>, config: &RegistryConfig) -> Self {
        let registry = ObserverRegistry::new(source.clone(), config);
        Self {
            source,
            registry,
            listeners: HashMap::new(),
            inbox: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn run(&mut self, script: &Script) -> SimulationReport {
        let steps = script
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let result = self.apply(step);
                let deliveries = std::mem::take(
                    &mut *self.inbox.lock().unwrap_or_else(PoisonError::into_inner),
                );
                let (code, error) = match result {
                    Ok(()) => (None, None),
                    Err(e) => {
                        debug!("Step {} ({}) failed: {}", index, step.action(), e);
                        (Some(e.code()), Some(e.to_string()))
                    }
                };
                StepOutcome {
                    index,
                    action: step.action(),
                    code,
                    error,
                    deliveries,
                }
            })
            .collect();

        SimulationReport {
            steps,
            remaining_subscriptions: self.registry.subscription_count(),
            registrations: self.registry.registrations(),
            slots: self.source.snapshot(),
        }
    }

    fn apply(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::Subscribe {
                event,
                listener,
                options,
                once,
            } => {
                let callback = self.listener(listener);
                let mode = if *once {
                    SubscriptionMode::OneShot
                } else {
                    SubscriptionMode::Repeating
                };
                self.registry.subscribe(event, *options, &callback, mode)?;
            }
            Step::Unsubscribe { event, listener } => {
                let callback = match listener {
                    Some(name) => Some(self.listeners.get(name).cloned().ok_or_else(|| {
                        ObserverError::invalid_parameter(format!("unknown listener '{}'", name))
                    })?),
                    None => None,
                };
                self.registry.unsubscribe(event, callback.as_ref())?;
            }
            Step::Publish { slot_id, payload } => {
                let slot = slot_id.unwrap_or_else(|| self.registry.default_slot_id());
                self.source.update(&self.registry, slot, payload.clone())?;
            }
            Step::SetDefaultSlot { slot_id } => self.registry.set_default_slot_id(*slot_id)?,
            Step::Grant { permission } => self.source.grant(permission),
            Step::Revoke { permission } => self.source.revoke(permission),
            Step::SetConnected { connected } => self.source.set_connected(*connected),
        }
        Ok(())
    }

    /// Named listeners keep their identity across steps
    fn listener(&mut self, name: &str) -> Callback<Payload> {
        let inbox = self.inbox.clone();
        self.listeners
            .entry(name.to_string())
            .or_insert_with(|| {
                let listener = name.to_string();
                Callback::new(move |payload: &Payload| {
                    inbox
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(Delivery {
                            listener: listener.clone(),
                            payload: payload.clone(),
                        });
                })
            })
            .clone()
    }
}

/// Run the simulate command
pub async fn run(args: SimulateArgs, config: &ObserverConfig) -> anyhow::Result<()> {
    let content = fs::read_to_string(&args.script).await?;
    let script: Script = serde_json::from_str(&content)?;
    info!("Replaying {} steps from {}", script.steps.len(), args.script.display());

    let source = Arc::new(LocalStateSource::new());
    source.set_system_app(args.system);
    for permission in &args.grant {
        source.grant(permission);
    }

    let report = Simulator::new(source, &config.registry).run(&script);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report)?;
    }

    Ok(())
}

fn print_report(report: &SimulationReport) -> anyhow::Result<()> {
    for step in &report.steps {
        match (&step.code, &step.error) {
            (Some(code), Some(error)) => {
                println!("[{:>3}] {:<15} error {} ({})", step.index, step.action, code, error)
            }
            _ => println!("[{:>3}] {:<15} ok", step.index, step.action),
        }
        for delivery in &step.deliveries {
            println!(
                "      -> {:<12} {}",
                delivery.listener,
                serde_json::to_string(&delivery.payload)?
            );
        }
    }

    println!();
    println!("Remaining subscriptions: {}", report.remaining_subscriptions);
    for registration in &report.registrations {
        let slot = match registration.slot_id {
            Some(slot) => slot.to_string(),
            None => "default".to_string(),
        };
        println!(
            "  {} {:<36} mask {:#06x} slot {:<8} observed {} {:?}",
            registration.id,
            registration.kind.as_str(),
            registration.mask,
            slot,
            registration.observed_slot_id,
            registration.mode
        );
    }
    if !report.slots.is_empty() {
        println!("Slot state:");
        println!("{}", serde_json::to_string_pretty(&report.slots)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telephony::{CardType, LockReason, SimState, SimStateData};
    use tempfile::TempDir;

    fn simulate(json: &str) -> SimulationReport {
        let script: Script = serde_json::from_str(json).unwrap();
        Simulator::new(Arc::new(LocalStateSource::new()), &RegistryConfig::default()).run(&script)
    }

    #[test]
    fn test_script_deliveries_are_recorded_per_step() {
        let report = simulate(
            r#"{
                "steps": [
                    { "action": "subscribe", "event": "simStateChange", "listener": "a" },
                    { "action": "subscribe", "event": "simStateChange", "listener": "b", "options": { "slotId": 1 } },
                    { "action": "publish", "slotId": 1, "payload": { "type": "simStateChange",
                      "data": { "type": "UNKNOWN_CARD", "state": "SIM_STATE_LOCKED", "reason": "SIM_PIN" } } },
                    { "action": "publish", "payload": { "type": "simStateChange",
                      "data": { "type": "UNKNOWN_CARD", "state": "SIM_STATE_READY", "reason": "SIM_NONE" } } },
                    { "action": "unsubscribe", "event": "simStateChange", "listener": "a" }
                ]
            }"#,
        );

        assert!(report.steps.iter().all(|step| step.code.is_none()));
        assert_eq!(report.steps[2].deliveries.len(), 1);
        assert_eq!(report.steps[2].deliveries[0].listener, "b");
        assert_eq!(
            report.steps[3].deliveries,
            vec![Delivery {
                listener: "a".to_string(),
                payload: Payload::SimStateChange(SimStateData::new(
                    CardType::UnknownCard,
                    SimState::Ready,
                    LockReason::SimNone
                )),
            }]
        );
        assert_eq!(report.remaining_subscriptions, 1);
        assert_eq!(report.registrations.len(), 1);
        assert_eq!(report.registrations[0].slot_id, Some(1));
        assert_eq!(report.registrations[0].mask, 0x20);
        assert_eq!(report.slots.len(), 2);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["registrations"][0]["kind"], "simStateChange");
        assert_eq!(json["registrations"][0]["mode"], "repeating");
    }

    #[test]
    fn test_errors_carry_business_codes() {
        let report = simulate(
            r#"{
                "steps": [
                    { "action": "subscribe", "event": "smsReceived", "listener": "a" },
                    { "action": "subscribe", "event": "networkStateChange", "listener": "a" },
                    { "action": "unsubscribe", "event": "callStateChange", "listener": "nobody" },
                    { "action": "setConnected", "connected": false },
                    { "action": "subscribe", "event": "callStateChange", "listener": "a" }
                ]
            }"#,
        );

        let codes: Vec<Option<i32>> = report.steps.iter().map(|step| step.code).collect();
        assert_eq!(
            codes,
            vec![
                Some(crate::error::INVALID_PARAMETER),
                Some(crate::error::PERMISSION_DENIED),
                Some(crate::error::INVALID_PARAMETER),
                None,
                Some(crate::error::SERVICE_CONNECTION_FAILED),
            ]
        );
        assert_eq!(report.remaining_subscriptions, 0);
    }

    #[test]
    fn test_once_listener_in_script() {
        let report = simulate(
            r#"{
                "steps": [
                    { "action": "subscribe", "event": "iccAccountInfoChange", "listener": "a", "once": true },
                    { "action": "publish", "payload": { "type": "iccAccountInfoChange" } },
                    { "action": "publish", "payload": { "type": "iccAccountInfoChange" } }
                ]
            }"#,
        );

        assert_eq!(report.steps[1].deliveries.len(), 1);
        assert!(report.steps[2].deliveries.is_empty());
    }

    #[tokio::test]
    async fn test_run_reads_script_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("script.json");
        std::fs::write(
            &path,
            r#"{ "steps": [ { "action": "subscribe", "event": "cfuIndicatorChange", "listener": "a" } ] }"#,
        )
        .unwrap();

        let args = SimulateArgs {
            script: path,
            grant: vec![crate::observer::events::GET_TELEPHONY_STATE.to_string()],
            system: true,
            json: true,
        };
        run(args, &ObserverConfig::default()).await.unwrap();
    }
}
