//! Pausable bridge between a push-based item generator and a consumer.
//!
//! ```text
//! NotStarted --start--> Running --pause--> Paused --start--> Running
//!                          |                                    |
//!                          +------ generator returns ----------> Stopped
//! any state --stop--> Stopped (terminal)
//! ```
//!
//! The generator receives an [`Emitter`] and awaits every
//! [`Emitter::emit`]. That await is the only suspension point: while the
//! extractor is paused it holds back the single emitted item and the
//! generator until the next `start`. Stopping is cooperative. The first
//! `emit` after a stop (or the one blocked in a pause) resolves `true`
//! exactly once; a generator that keeps emitting after that waits forever.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use lm_observe::{Hook, Observable};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

/// Errors from state transitions of a [`GeneratorStreamExtractor`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExtractError {
    #[error("can't continue after the extraction finished or was stopped")]
    Finished,
    #[error("starting a generator requires a tokio runtime")]
    NoRuntime,
}

/// Observable lifecycle phase of an extractor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    NotStarted,
    Running,
    Paused,
    Stopped,
}

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
type Generator<T> = Box<dyn FnOnce(Emitter<T>) -> BoxFuture + Send + 'static>;
type Callback<T> = Box<dyn Fn(T) + Send + Sync + 'static>;

enum State<T> {
    NotStarted,
    Running,
    Paused {
        /// The item emitted while paused, with the resume signal of the
        /// `emit` call waiting on it.
        pending: Option<(T, oneshot::Sender<bool>)>,
    },
    Stopped {
        /// Whether the generator has been told about the stop.
        informed: bool,
    },
}

struct Shared<T> {
    state: Mutex<State<T>>,
    phase: Observable<Phase>,
    generator: Mutex<Option<Generator<T>>>,
    callback: Callback<T>,
    finished: watch::Sender<bool>,
}

impl<T> Shared<T> {
    /// Publish the phase of the current state, notifying only on change.
    fn sync_phase(&self) {
        let phase = match &*self.state.lock() {
            State::NotStarted => Phase::NotStarted,
            State::Running => Phase::Running,
            State::Paused { .. } => Phase::Paused,
            State::Stopped { .. } => Phase::Stopped,
        };
        self.phase.update_if(|current| std::mem::replace(current, phase) != phase);
    }

    fn finish(&self) {
        self.sync_phase();
        self.finished.send_replace(true);
    }
}

/// Ends the extraction when the generator task is done with it, whether the
/// generator returned, panicked or was dropped with its runtime.
struct FinishOnDrop<T>(Arc<Shared<T>>);

impl<T> Drop for FinishOnDrop<T> {
    fn drop(&mut self) {
        *self.0.state.lock() = State::Stopped { informed: true };
        if std::thread::panicking() {
            warn!("generator panicked");
        } else {
            debug!("generator finished");
        }
        self.0.finish();
    }
}

/// Handle a generator emits items through.
pub struct Emitter<T> {
    shared: Arc<Shared<T>>,
}

enum Emit<T> {
    Deliver(T),
    Wait(oneshot::Receiver<bool>),
    Acknowledge,
    Hang,
}

impl<T: Send + 'static> Emitter<T> {
    /// Hand `item` to the consumer. Resolves to `true` when the generator
    /// should stop producing.
    pub async fn emit(&self, item: T) -> bool {
        let action = {
            let mut state = self.shared.state.lock();
            match &mut *state {
                State::NotStarted | State::Running => Emit::Deliver(item),
                State::Paused { pending } => {
                    let (resume, resumed) = oneshot::channel();
                    if let Some((_, superseded)) = pending.replace((item, resume)) {
                        let _ = superseded.send(false);
                    }
                    Emit::Wait(resumed)
                }
                State::Stopped { informed } if !*informed => {
                    *informed = true;
                    Emit::Acknowledge
                }
                State::Stopped { .. } => Emit::Hang,
            }
        };

        match action {
            Emit::Deliver(item) => {
                (self.shared.callback)(item);
                false
            }
            Emit::Wait(resumed) => resumed.await.unwrap_or(true),
            Emit::Acknowledge => true,
            Emit::Hang => {
                warn!("generator kept emitting after acknowledging a stop; blocking it");
                std::future::pending().await
            }
        }
    }
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Emitter {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter").finish_non_exhaustive()
    }
}

/// Drives one generator, forwarding its items to a callback.
///
/// Clones share the same extraction.
pub struct GeneratorStreamExtractor<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> GeneratorStreamExtractor<T> {
    pub fn new<G, Fut>(generator: G, callback: impl Fn(T) + Send + Sync + 'static) -> Self
    where
        G: FnOnce(Emitter<T>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generator: Generator<T> = Box::new(move |emitter| Box::pin(generator(emitter)));
        let (finished, _) = watch::channel(false);
        GeneratorStreamExtractor {
            shared: Arc::new(Shared {
                state: Mutex::new(State::NotStarted),
                phase: Observable::new(Phase::NotStarted),
                generator: Mutex::new(Some(generator)),
                callback: Box::new(callback),
                finished,
            }),
        }
    }

    /// Start the generator, or resume it when paused.
    ///
    /// Resuming delivers the item held back while paused and releases the
    /// generator. The returned future resolves once the generator returns
    /// or the extractor is stopped.
    pub fn start(&self) -> Result<impl Future<Output = ()> + Send + 'static, ExtractError> {
        let mut resumed = None;
        let runtime = {
            let mut state = self.shared.state.lock();
            match &mut *state {
                State::Stopped { .. } => return Err(ExtractError::Finished),
                State::Running => None,
                State::NotStarted => {
                    let handle = Handle::try_current().map_err(|_| ExtractError::NoRuntime)?;
                    *state = State::Running;
                    Some(handle)
                }
                State::Paused { pending } => {
                    resumed = pending.take();
                    *state = State::Running;
                    None
                }
            }
        };
        self.shared.sync_phase();

        if let Some(runtime) = runtime {
            let generator = self.shared.generator.lock().take();
            if let Some(generator) = generator {
                let shared = Arc::clone(&self.shared);
                let emitter = Emitter {
                    shared: Arc::clone(&self.shared),
                };
                runtime.spawn(async move {
                    let _finish = FinishOnDrop(shared);
                    generator(emitter).await;
                });
            }
        }
        if let Some((item, resume)) = resumed {
            (self.shared.callback)(item);
            let _ = resume.send(false);
        }
        Ok(self.completion())
    }
}

impl<T> GeneratorStreamExtractor<T> {
    /// Hold back the next emitted item until `start` is called again.
    pub fn pause(&self) {
        let paused = {
            let mut state = self.shared.state.lock();
            if matches!(*state, State::Running) {
                *state = State::Paused { pending: None };
                true
            } else {
                false
            }
        };
        if paused {
            self.shared.sync_phase();
        }
    }

    /// Stop for good. A generator blocked in a paused `emit` is released
    /// with `true` and its held-back item is discarded.
    pub fn stop(&self) {
        let released = {
            let mut state = self.shared.state.lock();
            match std::mem::replace(&mut *state, State::Stopped { informed: false }) {
                State::Stopped { informed } => {
                    *state = State::Stopped { informed };
                    return;
                }
                State::Paused {
                    pending: Some((_, resume)),
                } => {
                    *state = State::Stopped { informed: true };
                    Some(resume)
                }
                State::NotStarted | State::Running | State::Paused { pending: None } => None,
            }
        };
        if let Some(resume) = released {
            let _ = resume.send(true);
        }
        debug!("extraction stopped");
        self.shared.finish();
    }

    /// Future resolving once the generator returns or the extractor stops.
    pub fn completion(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut finished = self.shared.finished.subscribe();
        async move {
            let _ = finished.wait_for(|done| *done).await;
        }
    }

    pub fn phase(&self, hook: Option<&Hook>) -> Phase {
        self.shared.phase.get(hook)
    }

    pub fn has_started(&self, hook: Option<&Hook>) -> bool {
        self.phase(hook) != Phase::NotStarted
    }

    pub fn is_paused(&self, hook: Option<&Hook>) -> bool {
        self.phase(hook) == Phase::Paused
    }

    pub fn has_finished(&self, hook: Option<&Hook>) -> bool {
        self.phase(hook) == Phase::Stopped
    }

    /// Check if both handles drive the same extraction.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<T> Clone for GeneratorStreamExtractor<T> {
    fn clone(&self) -> Self {
        GeneratorStreamExtractor {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for GeneratorStreamExtractor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorStreamExtractor")
            .field("phase", &self.phase(None))
            .finish_non_exhaustive()
    }
}
