//! Continuous-mode scheduler.
//!
//! One actor task per encounter owns the [`Encounter`]. Commands arrive over
//! an mpsc channel and reply on oneshot channels; timers post into a second
//! channel drained by the same loop. Nothing else touches encounter state, so
//! a step, a cooldown tick and a skill never interleave.
//!
//! ## Architecture
//! ```text
//! [EncounterHandle] --Command--> [actor loop] <--TimerFired-- [timer tasks]
//!                                      |
//!                                 [Encounter] --> CombatListener
//! ```
//!
//! After each command or accepted timer message the actor reconciles its
//! timers against encounter state: nothing armed unless running, boss slots
//! only while a boss is targeted, one decrementer per active cooldown.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

pub mod timers;

pub use timers::{TimerFired, TimerRegistry, TimerSlot};

use crate::encounter::{ActionResult, Encounter, EncounterSnapshot, Mode, PlayerAction};
use crate::error::{CombatError, CombatResult};
use crate::player::Role;

/// Commands accepted by the actor
enum Command {
    Start(oneshot::Sender<bool>),
    Stop(oneshot::Sender<bool>),
    Reset(oneshot::Sender<()>),
    Reconfigure(Role, oneshot::Sender<()>),
    UseSkill(String, oneshot::Sender<ActionResult>),
    UseInterrupt(oneshot::Sender<ActionResult>),
    SelectTarget(usize, oneshot::Sender<ActionResult>),
    AdvanceRoster(oneshot::Sender<ActionResult>),
    SetSkills(Vec<String>, oneshot::Sender<CombatResult<()>>),
    Act(PlayerAction, oneshot::Sender<ActionResult>),
    Snapshot(oneshot::Sender<EncounterSnapshot>),
    Shutdown,
}

/// Cloneable front end to a running encounter actor
#[derive(Clone)]
pub struct EncounterHandle {
    tx: mpsc::Sender<Command>,
}

impl EncounterHandle {
    /// Move the encounter into a new actor task. Must be called inside a
    /// tokio runtime.
    pub fn spawn(encounter: Encounter) -> (Self, JoinHandle<Encounter>) {
        let (tx, rx) = mpsc::channel(100);
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let actor = EncounterActor {
            encounter,
            timers: TimerRegistry::new(timer_tx),
            boss_timers_for: None,
        };
        info!(target: "gate_core::runtime", mode = ?actor.encounter.mode(), "Encounter actor spawned");
        let task = tokio::spawn(actor.run(rx, timer_rx));
        (Self { tx }, task)
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> CombatResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| CombatError::EncounterClosed)?;
        reply_rx.await.map_err(|_| CombatError::EncounterClosed)
    }

    pub async fn start(&self) -> CombatResult<bool> {
        self.request(Command::Start).await
    }

    pub async fn stop(&self) -> CombatResult<bool> {
        self.request(Command::Stop).await
    }

    pub async fn reset(&self) -> CombatResult<()> {
        self.request(Command::Reset).await
    }

    pub async fn reconfigure(&self, role: Role) -> CombatResult<()> {
        self.request(|tx| Command::Reconfigure(role, tx)).await
    }

    pub async fn use_skill(&self, id: &str) -> CombatResult<ActionResult> {
        let id = id.to_string();
        self.request(|tx| Command::UseSkill(id, tx)).await
    }

    pub async fn use_interrupt(&self) -> CombatResult<ActionResult> {
        self.request(Command::UseInterrupt).await
    }

    pub async fn select_target(&self, index: usize) -> CombatResult<ActionResult> {
        self.request(|tx| Command::SelectTarget(index, tx)).await
    }

    pub async fn advance_roster(&self) -> CombatResult<ActionResult> {
        self.request(Command::AdvanceRoster).await
    }

    pub async fn set_skills(&self, ids: &[&str]) -> CombatResult<()> {
        let ids = ids.iter().map(|s| s.to_string()).collect();
        self.request(|tx| Command::SetSkills(ids, tx)).await?
    }

    /// Discrete mode: play a full round
    pub async fn act(&self, action: PlayerAction) -> CombatResult<ActionResult> {
        self.request(|tx| Command::Act(action, tx)).await
    }

    pub async fn snapshot(&self) -> CombatResult<EncounterSnapshot> {
        self.request(Command::Snapshot).await
    }

    /// Stop the actor; the join handle then yields the encounter.
    pub async fn shutdown(&self) -> CombatResult<()> {
        self.tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| CombatError::EncounterClosed)
    }
}

struct EncounterActor {
    encounter: Encounter,
    timers: TimerRegistry,
    /// Roster index the armed boss slots belong to
    boss_timers_for: Option<usize>,
}

impl EncounterActor {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut fired: mpsc::UnboundedReceiver<TimerFired>,
    ) -> Encounter {
        loop {
            tokio::select! {
                biased;
                cmd = commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(msg) = fired.recv() => self.handle_timer(msg),
            }
            self.reconcile_timers();
        }
        self.timers.cancel_all();
        debug!(target: "gate_core::runtime", "Encounter actor stopped");
        self.encounter
    }

    fn handle_command(&mut self, cmd: Command) {
        let enc = &mut self.encounter;
        // reply receivers may have gone away; nothing to do then
        match cmd {
            Command::Start(reply) => {
                let _ = reply.send(enc.start());
            }
            Command::Stop(reply) => {
                let _ = reply.send(enc.stop());
            }
            Command::Reset(reply) => {
                enc.reset();
                let _ = reply.send(());
            }
            Command::Reconfigure(role, reply) => {
                enc.reconfigure(role);
                let _ = reply.send(());
            }
            Command::UseSkill(id, reply) => {
                let _ = reply.send(enc.use_skill(&id));
            }
            Command::UseInterrupt(reply) => {
                let _ = reply.send(enc.use_interrupt());
            }
            Command::SelectTarget(index, reply) => {
                let _ = reply.send(enc.select_target(index));
            }
            Command::AdvanceRoster(reply) => {
                let _ = reply.send(enc.advance_roster());
            }
            Command::SetSkills(ids, reply) => {
                let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
                let _ = reply.send(enc.set_skills(&ids));
            }
            Command::Act(action, reply) => {
                let _ = reply.send(enc.act(action));
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(enc.snapshot());
            }
            Command::Shutdown => {}
        }
    }

    fn handle_timer(&mut self, msg: TimerFired) {
        if !self.timers.accept(&msg) {
            trace!(target: "gate_core::runtime", slot = ?msg.slot, "Stale timer message dropped");
            return;
        }
        let config = self.encounter.config().clone();
        match msg.slot {
            TimerSlot::Step => {
                self.encounter.step();
            }
            TimerSlot::Cooldown(id) => {
                let left = self.encounter.tick_cooldown(&id, config.cooldown_tick_ms);
                if left == 0 {
                    self.timers.cancel(&TimerSlot::Cooldown(id));
                }
            }
            TimerSlot::BossCycleStart => {
                self.timers.arm_interval(
                    TimerSlot::BossInterval,
                    Duration::from_millis(config.boss_special_interval_ms),
                );
            }
            TimerSlot::BossInterval => {
                if self.encounter.begin_boss_special() {
                    self.timers.arm_once(
                        TimerSlot::BossPrepare,
                        Duration::from_millis(config.boss_prepare_delay_ms),
                    );
                }
            }
            TimerSlot::BossPrepare => {
                self.encounter.resolve_boss_special();
            }
        }
    }

    /// Bring the armed slots in line with encounter state.
    fn reconcile_timers(&mut self) {
        let enc = &mut self.encounter;
        if !enc.is_running() || enc.mode() == Mode::Discrete {
            enc.take_started_cooldowns();
            if self.timers.armed_count() > 0 {
                debug!(target: "gate_core::runtime", "Tearing down all timers");
                self.timers.cancel_all();
            }
            self.boss_timers_for = None;
            return;
        }
        let config = enc.config().clone();

        if !self.timers.is_armed(&TimerSlot::Step) {
            self.timers
                .arm_interval(TimerSlot::Step, Duration::from_millis(config.step_interval_ms));
        }

        // boss slots follow the targeted roster entry
        let boss_target = enc.is_fighting_boss().then(|| enc.active_index());
        if boss_target != self.boss_timers_for {
            self.timers.cancel_where(TimerSlot::is_boss);
            if boss_target.is_some() {
                self.timers.arm_once(
                    TimerSlot::BossCycleStart,
                    Duration::from_millis(config.boss_cycle_delay_ms),
                );
            }
            self.boss_timers_for = boss_target;
        }
        if !enc.is_preparing_special() {
            self.timers.cancel(&TimerSlot::BossPrepare);
        }

        let tick = Duration::from_millis(config.cooldown_tick_ms);
        for id in enc.take_started_cooldowns() {
            self.timers.arm_interval(TimerSlot::Cooldown(id), tick);
        }
        let orphaned: Vec<String> = enc
            .player()
            .cooldowns
            .active()
            .map(|(id, _)| id.to_string())
            .filter(|id| !self.timers.is_armed(&TimerSlot::Cooldown(id.clone())))
            .collect();
        for id in orphaned {
            self.timers.arm_interval(TimerSlot::Cooldown(id), tick);
        }
        self.timers.cancel_where(|slot| match slot {
            TimerSlot::Cooldown(id) => enc.player().cooldowns.is_ready(id),
            _ => false,
        });
    }
}
