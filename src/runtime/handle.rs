use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::{
    core::registry::Registry,
    engine::{
        memo::SelectionMemo,
        search::{Cancelled, EngineConfig, SlotSelection, select_slots},
        traits::{GenerationCounter, NeverCancel},
    },
    planner::{DEFAULT_MEMO_CAPACITY, OptionCursor, PlannerState, summarize},
    selection::{AppliedOp, Selection, SelectionError, SelectionSnapshot},
    types::{Generation, SectionIndex, SectionRef},
};

use super::events::PlannerEvent;

/// Failure of a runtime request.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The selection change was rejected.
    #[error(transparent)]
    Selection(#[from] SelectionError),
    /// The runtime loop is gone.
    #[error("planner runtime channel closed")]
    ChannelClosed,
}

/// Rejected configuration document.
#[derive(Debug, thiserror::Error)]
#[error("invalid runtime config: {0}")]
pub struct ConfigError(#[from] toml::de::Error);

/// Runtime tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Pending commands before senders wait.
    pub command_queue_bound: usize,
    /// Events buffered per subscriber.
    pub event_capacity: usize,
    /// Memoized search results.
    pub memo_capacity: usize,
    /// Search limits.
    pub engine: EngineConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_capacity: 1024,
            memo_capacity: DEFAULT_MEMO_CAPACITY,
            engine: EngineConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Parses a TOML document; missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

/// Cloneable handle to the planner loop.
pub struct PlannerHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<PlannerEvent>,
}

impl Clone for PlannerHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    Select {
        number: String,
        resp: oneshot::Sender<Result<Option<Generation>, RuntimeError>>,
    },
    Deselect {
        number: String,
        resp: oneshot::Sender<Option<Generation>>,
    },
    Toggle {
        number: String,
        resp: oneshot::Sender<Result<Option<Generation>, RuntimeError>>,
    },
    Lock {
        slot: SectionRef,
        index: SectionIndex,
        resp: oneshot::Sender<Option<Generation>>,
    },
    Unlock {
        slot: SectionRef,
        resp: oneshot::Sender<Option<Generation>>,
    },
    Clear {
        resp: oneshot::Sender<Option<Generation>>,
    },
    SetOption {
        index: usize,
        resp: oneshot::Sender<bool>,
    },
    NextOption {
        resp: oneshot::Sender<bool>,
    },
    PrevOption {
        resp: oneshot::Sender<bool>,
    },
    State {
        resp: oneshot::Sender<PlannerState>,
    },
    Result {
        resp: oneshot::Sender<Arc<SlotSelection>>,
    },
    Settled {
        resp: oneshot::Sender<PlannerState>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

struct SearchDone {
    generation: Generation,
    snapshot: SelectionSnapshot,
    outcome: Result<SlotSelection, Cancelled>,
}

struct PlannerLoop {
    registry: Arc<Registry>,
    engine: EngineConfig,
    selection: Selection,
    counter: GenerationCounter,
    memo: SelectionMemo,
    result: Arc<SlotSelection>,
    result_generation: Generation,
    cursor: OptionCursor,
    waiters: Vec<oneshot::Sender<PlannerState>>,
    events_tx: broadcast::Sender<PlannerEvent>,
    done_tx: mpsc::UnboundedSender<SearchDone>,
}

/// Starts the planner loop on the current tokio runtime with an empty selection.
pub fn spawn_planner(registry: Arc<Registry>, config: RuntimeConfig) -> PlannerHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<PlannerEvent>(config.event_capacity.max(1));
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<SearchDone>();

    let selection = Selection::new();
    let initial = select_slots(&registry, selection.classes(), selection.locks(), &config.engine, &NeverCancel)
        .unwrap_or_default();

    let mut state = PlannerLoop {
        registry,
        engine: config.engine,
        selection,
        counter: GenerationCounter::new(),
        memo: SelectionMemo::new(config.memo_capacity),
        result: Arc::new(initial),
        result_generation: 0,
        cursor: OptionCursor::default(),
        waiters: Vec::new(),
        events_tx: events_tx.clone(),
        done_tx,
    };

    tokio::spawn(async move {
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break; };
                    if state.handle_command(cmd) {
                        break;
                    }
                }
                Some(done) = done_rx.recv() => {
                    state.on_search_done(done);
                }
            }
        }
        state.counter.advance_to(Generation::MAX);
    });

    PlannerHandle { cmd_tx, events_tx }
}

impl PlannerHandle {
    /// Subscribes to planner events.
    pub fn subscribe(&self) -> broadcast::Receiver<PlannerEvent> {
        self.events_tx.subscribe()
    }

    /// Selects a class; returns the new generation, `None` when it was already selected.
    pub async fn select_class(&self, number: impl Into<String>) -> Result<Option<Generation>, RuntimeError> {
        let number = number.into();
        self.request(|resp| Command::Select { number, resp }).await?
    }

    /// Deselects a class; `None` when it was not selected.
    pub async fn deselect_class(&self, number: impl Into<String>) -> Result<Option<Generation>, RuntimeError> {
        let number = number.into();
        self.request(|resp| Command::Deselect { number, resp }).await
    }

    /// Selects or deselects a class.
    pub async fn toggle_class(&self, number: impl Into<String>) -> Result<Option<Generation>, RuntimeError> {
        let number = number.into();
        self.request(|resp| Command::Toggle { number, resp }).await?
    }

    /// Pins a pair to a section index.
    pub async fn lock_section(&self, slot: SectionRef, index: SectionIndex) -> Result<Option<Generation>, RuntimeError> {
        self.request(|resp| Command::Lock { slot, index, resp }).await
    }

    /// Removes a pin.
    pub async fn unlock_section(&self, slot: SectionRef) -> Result<Option<Generation>, RuntimeError> {
        self.request(|resp| Command::Unlock { slot, resp }).await
    }

    /// Clears selection and locks.
    pub async fn clear(&self) -> Result<Option<Generation>, RuntimeError> {
        self.request(|resp| Command::Clear { resp }).await
    }

    /// Displays option `index`.
    pub async fn set_option(&self, index: usize) -> Result<bool, RuntimeError> {
        self.request(|resp| Command::SetOption { index, resp }).await
    }

    /// Displays the next option, wrapping.
    pub async fn next_option(&self) -> Result<bool, RuntimeError> {
        self.request(|resp| Command::NextOption { resp }).await
    }

    /// Displays the previous option, wrapping.
    pub async fn prev_option(&self) -> Result<bool, RuntimeError> {
        self.request(|resp| Command::PrevOption { resp }).await
    }

    /// State right now; `pending` is set while a newer search runs.
    pub async fn state(&self) -> Result<PlannerState, RuntimeError> {
        self.request(|resp| Command::State { resp }).await
    }

    /// Latest installed result.
    pub async fn result(&self) -> Result<Arc<SlotSelection>, RuntimeError> {
        self.request(|resp| Command::Result { resp }).await
    }

    /// Waits until options for the current generation are installed.
    pub async fn settled(&self) -> Result<PlannerState, RuntimeError> {
        self.request(|resp| Command::Settled { resp }).await
    }

    /// Stops the loop and cancels running searches.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Shutdown { resp }).await
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

impl PlannerLoop {
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Select { number, resp } => {
                let res = self
                    .selection
                    .select_class(&self.registry, &number)
                    .map_err(RuntimeError::from)
                    .map(|applied| self.after_change(applied));
                let _ = resp.send(res);
            }
            Command::Deselect { number, resp } => {
                let applied = self.selection.deselect_class(&number);
                let _ = resp.send(self.after_change(applied));
            }
            Command::Toggle { number, resp } => {
                let res = self
                    .selection
                    .toggle_class(&self.registry, &number)
                    .map_err(RuntimeError::from)
                    .map(|applied| self.after_change(applied));
                let _ = resp.send(res);
            }
            Command::Lock { slot, index, resp } => {
                let applied = self.selection.lock_section(slot, index);
                let _ = resp.send(self.after_change(applied));
            }
            Command::Unlock { slot, resp } => {
                let applied = self.selection.unlock_section(&slot);
                let _ = resp.send(self.after_change(applied));
            }
            Command::Clear { resp } => {
                let applied = self.selection.clear();
                let _ = resp.send(self.after_change(applied));
            }
            Command::SetOption { index, resp } => {
                let total = self.result.options.len();
                let moved = self.cursor.set(index, total);
                self.option_moved(moved);
                let _ = resp.send(moved);
            }
            Command::NextOption { resp } => {
                let moved = self.cursor.next(self.result.options.len());
                self.option_moved(moved);
                let _ = resp.send(moved);
            }
            Command::PrevOption { resp } => {
                let moved = self.cursor.prev(self.result.options.len());
                self.option_moved(moved);
                let _ = resp.send(moved);
            }
            Command::State { resp } => {
                let _ = resp.send(self.state());
            }
            Command::Result { resp } => {
                let _ = resp.send(Arc::clone(&self.result));
            }
            Command::Settled { resp } => {
                if self.is_pending() {
                    self.waiters.push(resp);
                } else {
                    let _ = resp.send(self.state());
                }
            }
            Command::Shutdown { resp } => {
                let _ = resp.send(());
                return true;
            }
        }

        false
    }

    fn after_change(&mut self, applied: Option<AppliedOp>) -> Option<Generation> {
        let applied = applied?;
        let generation = applied.generation;
        let _ = self.events_tx.send(PlannerEvent::SelectionChanged {
            generation,
            op: applied.op,
        });
        self.start_search(generation);
        Some(generation)
    }

    fn start_search(&mut self, generation: Generation) {
        self.counter.advance_to(generation);
        let snapshot = self.selection.snapshot();

        if let Some(hit) = self.memo.get(&self.registry, &snapshot) {
            self.install(generation, hit);
            return;
        }

        let registry = Arc::clone(&self.registry);
        let engine = self.engine.clone();
        let guard = self.counter.guard(generation);
        let done_tx = self.done_tx.clone();
        tokio::task::spawn_blocking(move || {
            let locks = snapshot.lock_map();
            let outcome = select_slots(&registry, &snapshot.classes, &locks, &engine, &guard);
            let _ = done_tx.send(SearchDone {
                generation,
                snapshot,
                outcome,
            });
        });
    }

    fn on_search_done(&mut self, done: SearchDone) {
        let result = match done.outcome {
            Ok(result) => Arc::new(result),
            Err(Cancelled) => {
                log::debug!("search for generation {} cancelled", done.generation);
                let _ = self.events_tx.send(PlannerEvent::SearchDiscarded {
                    generation: done.generation,
                });
                return;
            }
        };

        self.memo.insert(&self.registry, &done.snapshot, Arc::clone(&result));

        if done.generation != self.selection.generation() {
            log::debug!(
                "dropping result for generation {}, current is {}",
                done.generation,
                self.selection.generation()
            );
            let _ = self.events_tx.send(PlannerEvent::SearchDiscarded {
                generation: done.generation,
            });
            return;
        }

        self.install(done.generation, result);
    }

    fn install(&mut self, generation: Generation, result: Arc<SlotSelection>) {
        self.result = result;
        self.result_generation = generation;
        self.cursor.reset();
        let _ = self.events_tx.send(PlannerEvent::OptionsReady {
            generation,
            total_options: self.result.options.len(),
            truncated: self.result.truncated,
        });

        if !self.waiters.is_empty() {
            let state = self.state();
            for waiter in self.waiters.drain(..) {
                let _ = waiter.send(state.clone());
            }
        }
    }

    fn option_moved(&self, moved: bool) {
        if moved {
            let _ = self.events_tx.send(PlannerEvent::OptionChanged {
                selected_option: self.cursor.selected(),
                total_options: self.result.options.len(),
            });
        }
    }

    fn is_pending(&self) -> bool {
        self.result_generation != self.selection.generation()
    }

    fn state(&self) -> PlannerState {
        summarize(
            &self.registry,
            &self.selection,
            &self.result,
            self.cursor,
            self.is_pending(),
        )
    }
}
