//! Subscription registry.
//!
//! Maps (event kind, slot selector) to listeners in registration order and
//! drives delivery when a [`StateSource`] publishes an update. The registry
//! does not check permissions; it forwards whatever the source reports when a
//! (slot, kind) pair starts being observed.
//!
//! Listeners are invoked after the subscription lock is released, so a
//! listener may subscribe, unsubscribe (itself included) or publish without
//! deadlocking. Removal takes effect for every delivery that has not started
//! yet; an invocation already running is allowed to finish.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::callback::{Callback, CallbackId};
use super::events::{EventKind, ObserverEvent, ObserverOptions, Payload};
use crate::config::RegistryConfig;
use crate::error::{ObserverError, Result};
use crate::telephony::provider::{NoopStateSource, StateSource};

/// Whether a subscription survives its first delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubscriptionMode {
    /// Registered with `on`; fires until removed
    Repeating,
    /// Registered with `once`; removed before its first delivery runs
    OneShot,
}

/// Handle identifying one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Snapshot of one live registration, as shown by the CLI report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: SubscriptionId,
    pub kind: EventKind,
    pub mask: u32,
    /// Slot selector given at registration, if any
    pub slot_id: Option<i32>,
    /// Slot the source observes on behalf of this registration
    pub observed_slot_id: i32,
    pub mode: SubscriptionMode,
}

type Deliver = Arc<dyn Fn(&Payload) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    slot: Option<i32>,
    /// Slot the source was asked to observe for this subscription
    observed_slot: i32,
    callback_id: CallbackId,
    mode: SubscriptionMode,
    deliver: Deliver,
    active: Arc<AtomicBool>,
}

impl Subscription {
    fn matches(&self, kind: EventKind, event_slot: i32, default_slot: i32) -> bool {
        if self.kind != kind {
            return false;
        }
        if kind == EventKind::IccAccountInfoChange {
            return true;
        }
        match self.slot {
            Some(slot) => slot == event_slot,
            None => event_slot == default_slot,
        }
    }

    fn registration(&self) -> Registration {
        Registration {
            id: self.id,
            kind: self.kind,
            mask: self.kind.mask(),
            slot_id: self.slot,
            observed_slot_id: self.observed_slot,
            mode: self.mode,
        }
    }
}

/// One-shot taken out of the live list by a publish that has not run it yet.
/// Removal can still cancel it until the publish claims its `active` flag.
struct PendingOneShot {
    id: SubscriptionId,
    kind: EventKind,
    callback_id: CallbackId,
    active: Arc<AtomicBool>,
}

#[derive(Default)]
struct Subscriptions {
    live: Vec<Subscription>,
    pending: Vec<PendingOneShot>,
}

/// Work collected under the lock and executed after it is released
struct Delivery {
    id: SubscriptionId,
    one_shot: bool,
    deliver: Deliver,
    active: Arc<AtomicBool>,
}

static SHARED: Lazy<Arc<ObserverRegistry>> = Lazy::new(|| {
    info!("Creating process-wide observer registry");
    Arc::new(ObserverRegistry::new(
        Arc::new(NoopStateSource),
        &RegistryConfig::default(),
    ))
});

/// Registry of telephony state listeners
pub struct ObserverRegistry {
    subscriptions: Mutex<Subscriptions>,
    source: Arc<dyn StateSource>,
    slot_count: i32,
    default_slot_id: AtomicI32,
}

impl ObserverRegistry {
    /// Create a registry fed by `source`
    pub fn new(source: Arc<dyn StateSource>, config: &RegistryConfig) -> Self {
        Self {
            subscriptions: Mutex::new(Subscriptions::default()),
            source,
            slot_count: config.slot_count,
            default_slot_id: AtomicI32::new(config.default_slot_id),
        }
    }

    /// Process-wide registry, created on first use
    pub fn shared() -> Arc<ObserverRegistry> {
        Arc::clone(&SHARED)
    }

    /// Register a repeating listener for `E`
    pub fn on<E: ObserverEvent>(
        &self,
        options: Option<ObserverOptions>,
        callback: &Callback<E::Payload>,
    ) -> Result<SubscriptionId> {
        self.register_typed::<E>(options, callback, SubscriptionMode::Repeating)
    }

    /// Register a listener for `E` that fires at most once
    pub fn once<E: ObserverEvent>(
        &self,
        options: Option<ObserverOptions>,
        callback: &Callback<E::Payload>,
    ) -> Result<SubscriptionId> {
        self.register_typed::<E>(options, callback, SubscriptionMode::OneShot)
    }

    /// Remove `callback` from `E`, or every listener of `E` when `None`
    pub fn off<E: ObserverEvent>(&self, callback: Option<&Callback<E::Payload>>) -> Result<usize> {
        self.remove(E::KIND, callback.map(Callback::id))
    }

    /// Register a listener by wire event name.
    ///
    /// Unknown names fail with `InvalidParameter` and register nothing.
    pub fn subscribe(
        &self,
        event: &str,
        options: Option<ObserverOptions>,
        callback: &Callback<Payload>,
        mode: SubscriptionMode,
    ) -> Result<SubscriptionId> {
        let kind: EventKind = event.parse()?;
        let listener = callback.clone();
        let deliver: Deliver = Arc::new(move |payload: &Payload| listener.call(payload));
        self.insert(kind, options, callback.id(), deliver, mode)
    }

    /// Remove listeners by wire event name
    pub fn unsubscribe(&self, event: &str, callback: Option<&Callback<Payload>>) -> Result<usize> {
        let kind: EventKind = event.parse()?;
        self.remove(kind, callback.map(Callback::id))
    }

    /// Receive `E` payloads on a channel instead of a callback.
    ///
    /// The subscription is removed with [`ObserverRegistry::cancel`]. Payloads
    /// published after the receiver is dropped are discarded.
    pub fn subscribe_channel<E>(
        &self,
        options: Option<ObserverOptions>,
    ) -> Result<(SubscriptionId, mpsc::UnboundedReceiver<E::Payload>)>
    where
        E: ObserverEvent,
        E::Payload: Clone,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let callback = Callback::new(move |value: &E::Payload| {
            if sender.send(value.clone()).is_err() {
                debug!("Channel receiver for {} dropped", E::KIND);
            }
        });
        let id = self.on::<E>(options, &callback)?;
        Ok((id, receiver))
    }

    /// Remove one registration by its handle
    pub fn cancel(&self, id: SubscriptionId) -> Result<bool> {
        let released = {
            let mut state = self.lock();
            let removed = drain_where(&mut state.live, |sub| sub.id == id);
            let cancelled = cancel_pending(&mut state.pending, |pending| pending.id == id);
            if removed.is_empty() && cancelled == 0 {
                return Ok(false);
            }
            debug!("Cancelled subscription {} ({} left)", id, state.live.len());
            released_slots(&state.live, removed)
        };

        self.stop_observing(released)?;
        Ok(true)
    }

    /// Deliver `payload` to every listener of `kind` on the event's slot.
    ///
    /// `slot_id == None` tags the event for the default slot. Returns the
    /// number of listeners invoked. Invoked only by state sources.
    pub fn publish(&self, kind: EventKind, slot_id: Option<i32>, payload: Payload) -> Result<usize> {
        if payload.kind() != kind {
            return Err(ObserverError::invalid_parameter(format!(
                "{} payload cannot be delivered as {}",
                payload.kind(),
                kind
            )));
        }
        if let Some(slot) = slot_id {
            if kind.accepts_slot_selector() {
                self.validate_slot(kind, slot)?;
            }
        }

        let default_slot = self.default_slot_id();
        let event_slot = slot_id.unwrap_or(default_slot);

        let (deliveries, released) = {
            let mut state = self.lock();
            let Subscriptions { live, pending } = &mut *state;
            let mut deliveries = Vec::new();
            let mut fired = Vec::new();

            live.retain(|sub| {
                if !sub.matches(kind, event_slot, default_slot) {
                    return true;
                }
                let one_shot = sub.mode == SubscriptionMode::OneShot;
                deliveries.push(Delivery {
                    id: sub.id,
                    one_shot,
                    deliver: Arc::clone(&sub.deliver),
                    active: Arc::clone(&sub.active),
                });
                if one_shot {
                    fired.push((sub.observed_slot, sub.kind));
                    pending.push(PendingOneShot {
                        id: sub.id,
                        kind: sub.kind,
                        callback_id: sub.callback_id,
                        active: Arc::clone(&sub.active),
                    });
                }
                !one_shot
            });

            let released = released_slots(&live[..], fired);
            (deliveries, released)
        };

        if deliveries.is_empty() {
            debug!("No listeners for {} on slot {}, dropping event", kind, event_slot);
        }

        if let Err(e) = self.stop_observing(released) {
            warn!("Failed to release source observation for {}: {}", kind, e);
        }

        let mut invoked = 0;
        for delivery in deliveries {
            let runnable = if delivery.one_shot {
                // Exactly one of this claim and a concurrent removal wins
                let claimed = delivery.active.swap(false, Ordering::SeqCst);
                self.lock().pending.retain(|pending| pending.id != delivery.id);
                claimed
            } else {
                delivery.active.load(Ordering::SeqCst)
            };
            if !runnable {
                continue;
            }

            let deliver = delivery.deliver;
            let result = panic::catch_unwind(AssertUnwindSafe(|| deliver(&payload)));
            if result.is_err() {
                error!("Listener for {} on slot {} panicked", kind, event_slot);
            }
            invoked += 1;
        }

        debug!("Published {} on slot {} to {} listeners", kind, event_slot, invoked);
        Ok(invoked)
    }

    /// Slot that unselected subscriptions follow
    pub fn default_slot_id(&self) -> i32 {
        self.default_slot_id.load(Ordering::SeqCst)
    }

    /// Called by the source when the platform's primary card changes.
    ///
    /// Unselected subscriptions move their source observation to the new
    /// slot. If the source refuses the new slot nothing changes.
    pub fn set_default_slot_id(&self, slot_id: i32) -> Result<()> {
        if slot_id < 0 || slot_id >= self.slot_count {
            return Err(ObserverError::invalid_parameter(format!(
                "default slot {} is outside 0..{}",
                slot_id, self.slot_count
            )));
        }

        let released = {
            let mut state = self.lock();
            let previous = self.default_slot_id();
            if previous == slot_id {
                return Ok(());
            }

            let following = |sub: &Subscription| sub.slot.is_none() && sub.observed_slot != slot_id;
            let kinds: BTreeSet<EventKind> =
                state.live.iter().filter(|sub| following(*sub)).map(|sub| sub.kind).collect();

            let mut started = Vec::new();
            for kind in kinds {
                let observed = state
                    .live
                    .iter()
                    .any(|sub| sub.kind == kind && sub.observed_slot == slot_id);
                if observed {
                    continue;
                }
                if let Err(e) = self.source.start_observing(slot_id, kind) {
                    for started_kind in started {
                        if let Err(e) = self.source.stop_observing(slot_id, started_kind) {
                            warn!("Failed to roll back observation of {}: {}", started_kind, e);
                        }
                    }
                    return Err(e);
                }
                started.push(kind);
            }

            let mut moved = Vec::new();
            for sub in state.live.iter_mut() {
                if following(&*sub) {
                    moved.push((sub.observed_slot, sub.kind));
                    sub.observed_slot = slot_id;
                }
            }

            self.default_slot_id.store(slot_id, Ordering::SeqCst);
            info!("Default slot changed from {} to {}", previous, slot_id);
            released_slots(&state.live, moved)
        };

        if let Err(e) = self.stop_observing(released) {
            warn!("Failed to release observation of slots left behind: {}", e);
        }
        Ok(())
    }

    /// Number of active registrations
    pub fn subscription_count(&self) -> usize {
        self.lock().live.len()
    }

    /// Number of active registrations for `kind`
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.lock().live.iter().filter(|sub| sub.kind == kind).count()
    }

    /// Active registrations in delivery order
    pub fn registrations(&self) -> Vec<Registration> {
        self.lock().live.iter().map(Subscription::registration).collect()
    }

    /// Check `slot_id` against the slot range accepted for `kind`.
    ///
    /// One slot beyond the physical ones is reserved for a virtual SIM.
    pub fn validate_slot(&self, kind: EventKind, slot_id: i32) -> Result<()> {
        if slot_id < kind.min_slot_id() || slot_id >= self.slot_count + 1 {
            return Err(ObserverError::invalid_parameter(format!(
                "slot id {} is invalid for {}",
                slot_id, kind
            )));
        }
        Ok(())
    }

    fn register_typed<E: ObserverEvent>(
        &self,
        options: Option<ObserverOptions>,
        callback: &Callback<E::Payload>,
        mode: SubscriptionMode,
    ) -> Result<SubscriptionId> {
        let listener = callback.clone();
        let deliver: Deliver = Arc::new(move |payload: &Payload| match E::extract(payload) {
            Some(value) => listener.call(value),
            None => error!("Dropped {} payload for a {} listener", payload.kind(), E::KIND),
        });
        self.insert(E::KIND, options, callback.id(), deliver, mode)
    }

    fn insert(
        &self,
        kind: EventKind,
        options: Option<ObserverOptions>,
        callback_id: CallbackId,
        deliver: Deliver,
        mode: SubscriptionMode,
    ) -> Result<SubscriptionId> {
        let slot = match options {
            Some(_) if !kind.accepts_slot_selector() => {
                return Err(ObserverError::invalid_parameter(format!(
                    "{} does not accept a slot selector",
                    kind
                )));
            }
            Some(options) => {
                self.validate_slot(kind, options.slot_id)?;
                Some(options.slot_id)
            }
            None => None,
        };

        let mut state = self.lock();
        let observed_slot = slot.unwrap_or_else(|| self.default_slot_id());

        if let Some(existing) = state.live.iter().find(|sub| {
            sub.kind == kind && sub.slot == slot && sub.callback_id == callback_id && sub.mode == mode
        }) {
            warn!("Listener already registered for {} (slot {:?})", kind, slot);
            return Ok(existing.id);
        }

        let observed = state
            .live
            .iter()
            .any(|sub| sub.kind == kind && sub.observed_slot == observed_slot);
        if !observed {
            self.source.start_observing(observed_slot, kind)?;
        }

        let id = SubscriptionId(Uuid::new_v4());
        state.live.push(Subscription {
            id,
            kind,
            slot,
            observed_slot,
            callback_id,
            mode,
            deliver,
            active: Arc::new(AtomicBool::new(true)),
        });

        debug!("Registered {:?} listener {} for {} (slot {:?})", mode, id, kind, slot);
        Ok(id)
    }

    fn remove(&self, kind: EventKind, callback_id: Option<CallbackId>) -> Result<usize> {
        let selected = |sub_kind: EventKind, sub_callback: CallbackId| {
            sub_kind == kind && callback_id.map_or(true, |id| sub_callback == id)
        };

        let (count, released) = {
            let mut state = self.lock();
            let removed = drain_where(&mut state.live, |sub| selected(sub.kind, sub.callback_id));
            let cancelled = cancel_pending(&mut state.pending, |pending| {
                selected(pending.kind, pending.callback_id)
            });
            if removed.is_empty() && cancelled == 0 {
                debug!("Nothing to remove for {}", kind);
                return Ok(0);
            }
            (removed.len() + cancelled, released_slots(&state.live, removed))
        };

        debug!("Removed {} listeners for {}", count, kind);
        self.stop_observing(released)?;
        Ok(count)
    }

    fn stop_observing(&self, released: BTreeSet<(i32, EventKind)>) -> Result<()> {
        for (slot, kind) in released {
            self.source.stop_observing(slot, kind)?;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Subscriptions> {
        self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("subscriptions", &self.subscription_count())
            .field("slot_count", &self.slot_count)
            .field("default_slot_id", &self.default_slot_id())
            .finish()
    }
}

/// Remove matching subscriptions, deactivating each one
fn drain_where<F>(subscriptions: &mut Vec<Subscription>, mut predicate: F) -> Vec<(i32, EventKind)>
where
    F: FnMut(&Subscription) -> bool,
{
    let mut removed = Vec::new();
    subscriptions.retain(|sub| {
        if predicate(sub) {
            sub.active.store(false, Ordering::SeqCst);
            removed.push((sub.observed_slot, sub.kind));
            false
        } else {
            true
        }
    });
    removed
}

/// Cancel one-shots a publish has collected but not invoked yet.
/// Counts only the ones whose claim this call won.
fn cancel_pending<F>(pending: &mut Vec<PendingOneShot>, mut predicate: F) -> usize
where
    F: FnMut(&PendingOneShot) -> bool,
{
    let mut cancelled = 0;
    pending.retain(|entry| {
        if !predicate(entry) {
            return true;
        }
        if entry.active.swap(false, Ordering::SeqCst) {
            cancelled += 1;
        }
        false
    });
    cancelled
}

/// Pairs no remaining subscription observes any more
fn released_slots<I>(remaining: &[Subscription], removed: I) -> BTreeSet<(i32, EventKind)>
where
    I: IntoIterator<Item = (i32, EventKind)>,
{
    removed
        .into_iter()
        .filter(|(slot, kind)| {
            !remaining
                .iter()
                .any(|sub| sub.kind == *kind && sub.observed_slot == *slot)
        })
        .collect()
}
