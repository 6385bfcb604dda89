// Trailing-edge debouncer - no Tauri imports.
//
// Each push cancels any pending run and schedules a new one `delay` out,
// carrying only the latest value. At most one action runs per quiet period.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

enum PendingWrite<T> {
    Idle,
    Scheduled {
        deadline: Instant,
        generation: u64,
        value: T,
        task: JoinHandle<()>,
    },
}

struct Inner<T> {
    pending: PendingWrite<T>,
    generation: u64,
}

pub struct Debouncer<T> {
    delay: Duration,
    runtime: Handle,
    inner: Arc<Mutex<Inner<T>>>,
    action: Arc<dyn Fn(T) + Send + Sync>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl<T: Send + 'static> Debouncer<T> {
    /// `runtime` is where the timer tasks run; window events arrive on the
    /// UI thread, outside any tokio context.
    pub fn new<F>(delay: Duration, runtime: Handle, action: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            delay,
            runtime,
            inner: Arc::new(Mutex::new(Inner {
                pending: PendingWrite::Idle,
                generation: 0,
            })),
            action: Arc::new(action),
        }
    }

    pub fn push(&self, value: T) {
        let mut inner = lock(&self.inner);

        if let PendingWrite::Scheduled { task, .. } = std::mem::replace(&mut inner.pending, PendingWrite::Idle) {
            task.abort();
        }

        inner.generation += 1;
        let generation = inner.generation;
        let deadline = Instant::now() + self.delay;

        let state = self.inner.clone();
        let action = self.action.clone();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let due = {
                let mut inner = lock(&state);
                match std::mem::replace(&mut inner.pending, PendingWrite::Idle) {
                    PendingWrite::Scheduled { generation: g, value, .. } if g == generation => Some(value),
                    // Superseded between wake-up and lock; put it back untouched.
                    other => {
                        inner.pending = other;
                        None
                    }
                }
            };
            if let Some(value) = due {
                action(value);
            }
        });

        inner.pending = PendingWrite::Scheduled {
            deadline,
            generation,
            value,
            task,
        };
    }

    /// Runs the pending action now, if any. Used when the window goes away.
    pub fn flush(&self) {
        let due = {
            let mut inner = lock(&self.inner);
            match std::mem::replace(&mut inner.pending, PendingWrite::Idle) {
                PendingWrite::Scheduled { value, task, .. } => {
                    task.abort();
                    Some(value)
                }
                PendingWrite::Idle => None,
            }
        };
        if let Some(value) = due {
            (self.action)(value);
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        match lock(&self.inner).pending {
            PendingWrite::Scheduled { deadline, .. } => Some(deadline),
            PendingWrite::Idle => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline().is_some()
    }
}
