//! # Self-Expanding Task Queue
//!
//! A fixed pool of worker threads draining a queue that grows while it is
//! being drained. Running tasks may submit further tasks through the
//! `&TaskQueue` they are handed, so the total amount of work is not known
//! until the run is over.
//!
//! ## Termination
//!
//! An empty pending list does not mean the run is over: a worker may be in
//! the middle of a task that is about to submit more work. The queue instead
//! tracks an *outstanding* count (pending + in flight). It is incremented when
//! a task is submitted, not when it starts, and decremented once per task
//! after the task has finished, whether it succeeded or not. Outstanding
//! reaching zero is quiescence: nothing is queued, nothing is running, and so
//! nothing can submit anything new.
//!
//! Once quiescence is observed, [`TaskQueue::run_to_completion`] enqueues one
//! stop sentinel per worker and waits for every worker to exit.
//!
//! ## Failure isolation
//!
//! A task that returns an error or panics is logged and counted as failed. It
//! is never retried and the failure is not propagated to other tasks or to
//! the caller of `run_to_completion`.
//!
//! ```
//! use repo_mirror::queue::TaskQueue;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let queue = TaskQueue::new(4).unwrap();
//! queue.submit(3u32, "countdown from 3");
//!
//! let executed = AtomicUsize::new(0);
//! let report = queue
//!     .run_to_completion(|queue, n: u32| -> Result<(), String> {
//!         executed.fetch_add(1, Ordering::SeqCst);
//!         if n > 0 {
//!             queue.submit(n - 1, format!("countdown from {}", n - 1));
//!         }
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(executed.load(Ordering::SeqCst), 4);
//! assert_eq!(report.completed, 4);
//! ```

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use log::{debug, error};

use crate::error::{Error, Result};

/// A unit of work waiting in the queue.
#[derive(Debug)]
pub struct Task<T> {
    pub id: u64,
    pub description: String,
    pub action: T,
}

enum Message<T> {
    Run(Task<T>),
    Stop,
}

struct State<T> {
    pending: VecDeque<Message<T>>,
    /// Pending plus in-flight tasks. Stop sentinels are not counted.
    outstanding: usize,
    next_id: u64,
}

/// Totals for one drained run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueReport {
    /// Tasks whose action returned `Ok`.
    pub completed: usize,
    /// Tasks whose action returned `Err` or panicked.
    pub failed: usize,
}

impl QueueReport {
    pub fn total(&self) -> usize {
        self.completed + self.failed
    }
}

#[derive(Default)]
struct Counters {
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// A bounded-worker, unbounded-depth task queue.
///
/// Tasks are submitted with [`submit`](Self::submit) before or during the run.
/// [`run_to_completion`](Self::run_to_completion) consumes the queue, so a
/// queue can only be run once.
pub struct TaskQueue<T> {
    workers: usize,
    state: Mutex<State<T>>,
    /// Signalled whenever a message is pushed.
    available: Condvar,
    /// Signalled when `outstanding` drops to zero.
    quiescent: Condvar,
}

impl<T> TaskQueue<T> {
    /// Create a queue that will run with `workers` worker threads.
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::Queue {
                message: "worker count must be at least 1".to_string(),
            });
        }

        Ok(Self {
            workers,
            state: Mutex::new(State {
                pending: VecDeque::new(),
                outstanding: 0,
                next_id: 0,
            }),
            available: Condvar::new(),
            quiescent: Condvar::new(),
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of tasks submitted but not yet finished
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    /// Enqueue a task.
    ///
    /// Safe to call from any thread, including from inside a running task.
    /// An empty description is replaced with `task_<id>`.
    pub fn submit(&self, action: T, description: impl Into<String>) {
        let mut description = description.into();
        {
            let mut state = self.lock();
            state.next_id += 1;
            let id = state.next_id;
            if description.is_empty() {
                description = format!("task_{}", id);
            }
            debug!("Queuing {{{}}}", description);

            state.outstanding += 1;
            state.pending.push_back(Message::Run(Task {
                id,
                description,
                action,
            }));
        }
        self.available.notify_one();
    }

    // No user code runs while this lock is held, so the state behind a
    // poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_message(&self) -> Message<T> {
        let mut state = self.lock();
        loop {
            if let Some(message) = state.pending.pop_front() {
                return message;
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn finish_task(&self) {
        let mut state = self.lock();
        state.outstanding -= 1;
        if state.outstanding == 0 {
            self.quiescent.notify_all();
        }
    }

    fn wait_for_quiescence(&self) {
        let mut state = self.lock();
        while state.outstanding > 0 {
            state = self
                .quiescent
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn stop_workers(&self) {
        {
            let mut state = self.lock();
            for _ in 0..self.workers {
                state.pending.push_back(Message::Stop);
            }
        }
        self.available.notify_all();
    }
}

impl<T: Send> TaskQueue<T> {
    /// Run every queued task, and every task those tasks submit, to
    /// exhaustion.
    ///
    /// `execute` is called once per task with the queue (for submitting
    /// follow-up work) and the task's action. Blocks until the queue is
    /// quiescent and all workers have exited.
    pub fn run_to_completion<F, E>(self, execute: F) -> Result<QueueReport>
    where
        F: Fn(&TaskQueue<T>, T) -> std::result::Result<(), E> + Sync,
        E: fmt::Display,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("mirror-worker-{}", i))
            .build()
            .map_err(|e| Error::Queue {
                message: format!("failed to start worker pool: {}", e),
            })?;

        let counters = Counters::default();
        let queue = &self;
        let execute = &execute;
        let counters_ref = &counters;

        debug!(
            "Running {} queued tasks on {} workers",
            queue.outstanding(),
            queue.workers
        );

        pool.in_place_scope(|scope| {
            for worker in 0..queue.workers {
                scope.spawn(move |_| queue.worker_loop(worker, execute, counters_ref));
            }
            queue.wait_for_quiescence();
            queue.stop_workers();
        });

        Ok(QueueReport {
            completed: counters.completed.load(Ordering::SeqCst),
            failed: counters.failed.load(Ordering::SeqCst),
        })
    }

    fn worker_loop<F, E>(&self, worker: usize, execute: &F, counters: &Counters)
    where
        F: Fn(&TaskQueue<T>, T) -> std::result::Result<(), E> + Sync,
        E: fmt::Display,
    {
        loop {
            let Task {
                description,
                action,
                ..
            } = match self.next_message() {
                Message::Run(task) => task,
                Message::Stop => {
                    debug!("Worker {} stopping", worker);
                    return;
                }
            };

            debug!("Executing {{{}}}", description);
            match panic::catch_unwind(AssertUnwindSafe(|| execute(self, action))) {
                Ok(Ok(())) => {
                    counters.completed.fetch_add(1, Ordering::SeqCst);
                    debug!("Completed {{{}}}", description);
                }
                Ok(Err(e)) => {
                    counters.failed.fetch_add(1, Ordering::SeqCst);
                    error!("Task {{{}}} failed: {}", description, e);
                }
                Err(payload) => {
                    counters.failed.fetch_add(1, Ordering::SeqCst);
                    error!(
                        "Task {{{}}} panicked: {}",
                        description,
                        panic_message(payload.as_ref())
                    );
                }
            }

            self.finish_task();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
