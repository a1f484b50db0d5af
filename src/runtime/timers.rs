//! Named timer slots for the continuous scheduler.
//!
//! Every timer is a spawned tokio task that posts a [`TimerFired`] message
//! back to the encounter actor. The registry owns the task handles: arming a
//! slot aborts whatever was armed there before, and a message is only
//! accepted if it carries the current epoch and the slot's current token.
//! Messages from aborted or replaced timers that were already queued are
//! therefore dropped on receipt.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerSlot {
    Step,
    Cooldown(String),
    BossCycleStart,
    BossInterval,
    BossPrepare,
}

impl TimerSlot {
    pub fn is_boss(&self) -> bool {
        matches!(
            self,
            TimerSlot::BossCycleStart | TimerSlot::BossInterval | TimerSlot::BossPrepare
        )
    }
}

/// Message a timer task posts when it fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFired {
    pub slot: TimerSlot,
    pub epoch: u64,
    pub token: u64,
}

#[derive(Debug)]
struct Armed {
    token: u64,
    repeating: bool,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
pub struct TimerRegistry {
    armed: HashMap<TimerSlot, Armed>,
    epoch: u64,
    next_token: u64,
    tx: mpsc::UnboundedSender<TimerFired>,
}

impl TimerRegistry {
    pub fn new(tx: mpsc::UnboundedSender<TimerFired>) -> Self {
        Self {
            armed: HashMap::new(),
            epoch: 0,
            next_token: 0,
            tx,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_armed(&self, slot: &TimerSlot) -> bool {
        self.armed.contains_key(slot)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    pub fn slots(&self) -> impl Iterator<Item = &TimerSlot> {
        self.armed.keys()
    }

    fn next_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    /// Fire every `period`, first after one full period.
    pub fn arm_interval(&mut self, slot: TimerSlot, period: Duration) {
        let token = self.next_token();
        let fired = TimerFired {
            slot: slot.clone(),
            epoch: self.epoch,
            token,
        };
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(fired.clone()).is_err() {
                    break;
                }
            }
        });
        self.install(slot, token, true, handle);
    }

    /// Fire once after `delay`.
    pub fn arm_once(&mut self, slot: TimerSlot, delay: Duration) {
        let token = self.next_token();
        let fired = TimerFired {
            slot: slot.clone(),
            epoch: self.epoch,
            token,
        };
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            let _ = tx.send(fired);
        });
        self.install(slot, token, false, handle);
    }

    fn install(&mut self, slot: TimerSlot, token: u64, repeating: bool, handle: JoinHandle<()>) {
        trace!(target: "gate_core::runtime", ?slot, token, repeating, "Timer armed");
        let armed = Armed {
            token,
            repeating,
            handle,
        };
        if let Some(old) = self.armed.insert(slot, armed) {
            old.handle.abort();
        }
    }

    pub fn cancel(&mut self, slot: &TimerSlot) -> bool {
        match self.armed.remove(slot) {
            Some(old) => {
                old.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_where(&mut self, mut pred: impl FnMut(&TimerSlot) -> bool) {
        let doomed: Vec<TimerSlot> = self.armed.keys().filter(|s| pred(s)).cloned().collect();
        for slot in doomed {
            self.cancel(&slot);
        }
    }

    /// Abort everything and move to a new epoch.
    pub fn cancel_all(&mut self) {
        for (_, armed) in self.armed.drain() {
            armed.handle.abort();
        }
        self.epoch += 1;
    }

    /// Whether a received message is still live. A one-shot slot is
    /// disarmed once its message is accepted.
    pub fn accept(&mut self, fired: &TimerFired) -> bool {
        if fired.epoch != self.epoch {
            return false;
        }
        let Some(armed) = self.armed.get(&fired.slot) else {
            return false;
        };
        if armed.token != fired.token {
            return false;
        }
        if !armed.repeating {
            self.armed.remove(&fired.slot);
        }
        true
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        for armed in self.armed.values() {
            armed.handle.abort();
        }
    }
}
