//! Driving tasks from a single thread.
//!
//! The [`Reactor`] keeps the live tasks of, typically, one worker thread.
//! Each [`tick`][Reactor::tick] polls every task exactly once, in the
//! order they were spawned. Tasks that reach a terminal state are notified
//! and then dropped. No ordering exists between the completions of
//! different tasks.
//!
//! Cancelling a task simply drops it, together with any partial data it
//! has received.

use crate::task::{Pollable, TaskId, TaskState};
use tracing::{debug, trace};

/// The log target for the reactor.
const LOG_TARGET: &str = "polltask::reactor";

//------------ Tick -----------------------------------------------------------

/// What happened during a single tick.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Tick {
    /// The number of tasks polled.
    pub polled: usize,

    /// The number of tasks that finished.
    pub finished: usize,

    /// The number of tasks that failed.
    pub failed: usize,
}

impl Tick {
    /// Returns the number of tasks that reached a terminal state.
    pub fn completed(&self) -> usize {
        self.finished + self.failed
    }
}

//------------ Reactor --------------------------------------------------------

/// A collection of live tasks polled in lock-step.
#[derive(Default)]
pub struct Reactor {
    tasks: Vec<Box<dyn Pollable>>,
    ticks: u64,
}

impl Reactor {
    /// Creates an empty reactor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task and returns its id.
    ///
    /// A task that already is in a terminal state is notified and dropped
    /// on the next tick without being polled again.
    pub fn spawn<T: Pollable + 'static>(&mut self, task: T) -> TaskId {
        let id = task.task_id();
        trace!(target: LOG_TARGET, task = %id, "spawned");
        self.tasks.push(Box::new(task));
        id
    }

    /// Drops the task with the given id.
    ///
    /// The task's completion callback is not invoked. Returns whether the
    /// task was found.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        match self.tasks.iter().position(|task| task.task_id() == id) {
            Some(idx) => {
                self.tasks.remove(idx);
                debug!(target: LOG_TARGET, task = %id, "cancelled");
                true
            }
            None => false,
        }
    }

    /// Returns whether a task with the given id is live.
    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|task| task.task_id() == id)
    }

    /// Returns the number of live tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns whether there are no live tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns whether there is nothing left to drive.
    ///
    /// This is the same as [`is_empty`][Self::is_empty].
    pub fn is_idle(&self) -> bool {
        self.is_empty()
    }

    /// Returns the number of ticks so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Polls every live task once.
    ///
    /// Tasks reaching a terminal state have their completion callback
    /// invoked and are removed.
    pub fn tick(&mut self) -> Tick {
        let mut res = Tick::default();
        self.ticks += 1;
        self.tasks.retain_mut(|task| {
            res.polled += 1;
            match task.drive() {
                TaskState::Running => true,
                TaskState::Finished => {
                    res.finished += 1;
                    false
                }
                TaskState::Failed => {
                    res.failed += 1;
                    false
                }
            }
        });
        if res.completed() > 0 {
            debug!(
                target: LOG_TARGET,
                tick = self.ticks,
                "{} finished, {} failed, {} left",
                res.finished,
                res.failed,
                self.tasks.len()
            );
        }
        res
    }

    /// Ticks until no tasks are left, sleeping `interval` between ticks.
    ///
    /// Returns the number of ticks made. Tasks without a timeout or poll
    /// budget may keep this running forever.
    #[cfg(feature = "net")]
    pub async fn run_until_idle(
        &mut self,
        interval: std::time::Duration,
    ) -> u64 {
        let start = self.ticks;
        while !self.is_idle() {
            self.tick();
            if self.is_idle() {
                break;
            }
            tokio::time::sleep(interval).await;
        }
        self.ticks - start
    }
}

impl std::fmt::Debug for Reactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reactor")
            .field("tasks", &self.tasks.len())
            .field("ticks", &self.ticks)
            .finish()
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use crate::task::{
        AsyncTask, Completion, Progress, ResultChannel, Status, TaskCore,
        TaskEnv,
    };
    use std::sync::{Arc, Mutex};

    struct Countdown {
        core: TaskCore<u32>,
        left: u32,
        fail: bool,
    }

    impl AsyncTask for Countdown {
        type Output = u32;

        fn core(&self) -> &TaskCore<u32> {
            &self.core
        }

        fn core_mut(&mut self) -> &mut TaskCore<u32> {
            &mut self.core
        }

        fn step(&mut self) -> Progress<u32> {
            match self.left {
                0 if self.fail => Progress::Failed(Status::CLOSED),
                0 => Progress::Ready(7, Status::received(1)),
                _ => {
                    self.left -= 1;
                    Progress::Pending
                }
            }
        }
    }

    fn countdown(
        env: &TaskEnv,
        left: u32,
        fail: bool,
        log: &Arc<Mutex<Vec<(u32, Status)>>>,
    ) -> Countdown {
        let log = log.clone();
        Countdown {
            core: TaskCore::new(
                env,
                "countdown",
                Completion::new(move |res: &ResultChannel<u32>| {
                    log.lock().unwrap().push((left, res.status()));
                }),
            ),
            left,
            fail,
        }
    }

    fn env() -> TaskEnv {
        let mut config = Config::new();
        config.set_timeout(None);
        TaskEnv::new(config)
    }

    #[test]
    fn completes_independently() {
        let env = env();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut reactor = Reactor::new();
        reactor.spawn(countdown(&env, 2, false, &log));
        reactor.spawn(countdown(&env, 0, true, &log));
        reactor.spawn(countdown(&env, 1, false, &log));

        assert_eq!(
            reactor.tick(),
            Tick {
                polled: 3,
                finished: 0,
                failed: 1
            }
        );
        assert_eq!(reactor.len(), 2);
        assert_eq!(reactor.tick().finished, 1);
        assert_eq!(reactor.tick().finished, 1);
        assert!(reactor.is_empty());
        assert_eq!(reactor.ticks(), 3);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                (0, Status::CLOSED),
                (1, Status::received(1)),
                (2, Status::received(1)),
            ]
        );
    }

    #[test]
    fn cancel_drops_without_notifying() {
        let env = env();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut reactor = Reactor::new();
        let id = reactor.spawn(countdown(&env, 5, false, &log));
        assert!(reactor.contains(id));
        reactor.tick();
        assert!(reactor.cancel(id));
        assert!(!reactor.cancel(id));
        assert!(!reactor.contains(id));
        assert_eq!(reactor.tick(), Tick::default());
        assert!(log.lock().unwrap().is_empty());
    }
}
