//! Poll-driven asynchronous tasks.
//!
//! A task is a unit of deferred work bound to a socket controlled by some
//! owner, typically a proxy session. Rather than blocking on the socket,
//! the task is polled repeatedly by a driver, either the [reactor] or the
//! owner itself. Each call to [`AsyncTask::poll`] makes one non-blocking
//! attempt at progress and reports the resulting [`TaskState`].
//!
//! # State machine
//!
//! Every task starts out [`Running`][TaskState::Running]. It stays there
//! until a poll either produces a value, moving it to
//! [`Finished`][TaskState::Finished], or hits an error it cannot recover
//! from, moving it to [`Failed`][TaskState::Failed]. Both are terminal:
//! polling a terminal task does nothing and returns the same state.
//!
//! The outcome is stored in the task's [`ResultChannel`], which is
//! populated exactly when the task reaches a terminal state. The owner
//! learns about completion either by inspecting the returned state or
//! through the optional [`Completion`] callback supplied at construction.
//! The callback is invoked at most once by [`AsyncTask::notify`].
//!
//! # Limits
//!
//! A task fails with [`Status::TIMED_OUT`] when it is polled after its
//! timeout has passed or after it has used up its poll budget, both taken
//! from the [`Config`] of the [`TaskEnv`] it was created in. This keeps a
//! task on a silent socket from being polled forever.
//!
//! # Cancellation
//!
//! There is no cancel operation. Dropping a task cancels it along with any
//! partially received data it holds.
//!
//! [reactor]: crate::reactor

mod completion;
mod id;
mod result;

pub use self::completion::{Callback, Completion};
pub use self::id::{TaskId, TaskIdAllocator};
pub use self::result::{ResultChannel, Status};

use crate::clock::{Clock, SystemClock, Timestamp};
use crate::config::Config;
use std::sync::Arc;
use tracing::{debug, error};

/// The log target for task state transitions.
const LOG_TARGET: &str = "polltask::task";

//------------ TaskState ------------------------------------------------------

/// The lifecycle state of a task.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TaskState {
    /// The task has not produced a result yet.
    Running,

    /// The task has produced a value.
    Finished,

    /// The task ended without producing a value.
    Failed,
}

impl TaskState {
    /// Returns whether no further progress will happen in this state.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskState::Running)
    }
}

//------------ Progress -------------------------------------------------------

/// The outcome of a single attempt at progress.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Progress<T> {
    /// Nothing complete yet, try again later.
    Pending,

    /// The task produced its value.
    Ready(T, Status),

    /// The task cannot complete.
    Failed(Status),
}

//------------ TaskEnv --------------------------------------------------------

/// The process-scoped state shared by all tasks.
///
/// An environment is created once and handed by reference to every task
/// constructor. Tests create a fresh environment per case.
#[derive(Clone, Debug)]
pub struct TaskEnv {
    ids: Arc<TaskIdAllocator>,
    clock: Arc<dyn Clock>,
    config: Arc<Config>,
}

impl TaskEnv {
    /// Creates an environment with a fresh id allocator and system clock.
    pub fn new(config: Config) -> Self {
        TaskEnv {
            ids: Arc::new(TaskIdAllocator::new()),
            clock: Arc::new(SystemClock::new()),
            config: Arc::new(config),
        }
    }

    /// Replaces the id allocator.
    pub fn with_ids(mut self, ids: Arc<TaskIdAllocator>) -> Self {
        self.ids = ids;
        self
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the id allocator.
    pub fn ids(&self) -> &Arc<TaskIdAllocator> {
        &self.ids
    }

    /// Returns the clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for TaskEnv {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

//------------ TaskCore -------------------------------------------------------

/// The state every task carries regardless of what it does.
///
/// Concrete tasks embed a core and expose it through [`AsyncTask::core`].
/// Only the provided methods of [`AsyncTask`] change it.
#[derive(Debug)]
pub struct TaskCore<T> {
    id: TaskId,
    kind: &'static str,
    state: TaskState,
    result: ResultChannel<T>,
    completion: Completion<T>,
    clock: Arc<dyn Clock>,
    deadline: Option<Timestamp>,
    max_polls: Option<u32>,
    polls: u32,
}

impl<T> TaskCore<T> {
    /// Creates a new core, drawing a fresh id from `env`.
    ///
    /// The `kind` is a short name of the task type used in log messages.
    pub fn new(
        env: &TaskEnv,
        kind: &'static str,
        completion: Completion<T>,
    ) -> Self {
        let clock = env.clock().clone();
        let deadline =
            env.config().timeout().map(|timeout| clock.now() + timeout);
        TaskCore {
            id: env.ids().next(),
            kind,
            state: TaskState::Running,
            result: ResultChannel::new(),
            completion,
            clock,
            deadline,
            max_polls: env.config().max_polls(),
            polls: 0,
        }
    }

    /// Returns the task id.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the short name of the task type.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Returns the current state.
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Returns the result channel.
    pub fn result(&self) -> &ResultChannel<T> {
        &self.result
    }

    /// Returns how often the task has attempted progress.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Counts an attempt and checks it against the limits.
    ///
    /// Returns the failure status if a limit has been exceeded.
    fn begin_attempt(&mut self) -> Option<Status> {
        self.polls = self.polls.saturating_add(1);
        if let Some(max) = self.max_polls {
            if self.polls > max {
                debug!(
                    target: LOG_TARGET,
                    task = %self.id,
                    "{} task exceeded {} polls",
                    self.kind,
                    max
                );
                return Some(Status::TIMED_OUT);
            }
        }
        if let Some(deadline) = self.deadline {
            if self.clock.now() >= deadline {
                debug!(
                    target: LOG_TARGET,
                    task = %self.id,
                    "{} task timed out",
                    self.kind
                );
                return Some(Status::TIMED_OUT);
            }
        }
        None
    }

    fn finish(&mut self, value: T, status: Status) -> TaskState {
        if let Err(err) = self.result.set(value, status) {
            error!(target: LOG_TARGET, task = %self.id, "{}", err);
        }
        self.state = TaskState::Finished;
        debug!(
            target: LOG_TARGET,
            task = %self.id,
            "{} task finished with status {}",
            self.kind,
            status
        );
        self.state
    }

    fn fail(&mut self, status: Status) -> TaskState {
        if let Err(err) = self.result.fail(status) {
            error!(target: LOG_TARGET, task = %self.id, "{}", err);
        }
        self.state = TaskState::Failed;
        debug!(
            target: LOG_TARGET,
            task = %self.id,
            "{} task failed with status {}",
            self.kind,
            status
        );
        self.state
    }

    fn notify(&mut self) -> bool {
        if !self.state.is_terminal() {
            return false;
        }
        self.completion.notify(&self.result)
    }
}

//------------ AsyncTask ------------------------------------------------------

/// A poll-driven asynchronous operation.
///
/// Implementors supply [`step`][Self::step], a single non-blocking attempt
/// at progress, and access to their [`TaskCore`]. The provided methods
/// implement the state machine on top of that.
pub trait AsyncTask {
    /// The type of value the task produces.
    type Output;

    /// Returns the task's core.
    fn core(&self) -> &TaskCore<Self::Output>;

    /// Returns the task's core for modification.
    fn core_mut(&mut self) -> &mut TaskCore<Self::Output>;

    /// Attempts one unit of progress.
    ///
    /// This must never block. It is only called while the task is running.
    fn step(&mut self) -> Progress<Self::Output>;

    /// Returns the task id.
    fn id(&self) -> TaskId {
        self.core().id()
    }

    /// Returns the current state.
    fn state(&self) -> TaskState {
        self.core().state()
    }

    /// Returns the result channel.
    ///
    /// The channel is empty while the task is running.
    fn result(&self) -> &ResultChannel<Self::Output> {
        self.core().result()
    }

    /// Attempts progress and returns the new state.
    ///
    /// Once the task is in a terminal state, this does nothing.
    fn poll(&mut self) -> TaskState {
        let state = self.core().state();
        if state.is_terminal() {
            return state;
        }
        if let Some(status) = self.core_mut().begin_attempt() {
            return self.core_mut().fail(status);
        }
        match self.step() {
            Progress::Pending => TaskState::Running,
            Progress::Ready(value, status) => {
                self.core_mut().finish(value, status)
            }
            Progress::Failed(status) => self.core_mut().fail(status),
        }
    }

    /// Invokes the completion callback if the task is terminal.
    ///
    /// The callback runs at most once over the lifetime of the task.
    /// Returns whether it ran.
    fn notify(&mut self) -> bool {
        self.core_mut().notify()
    }
}

//------------ Pollable -------------------------------------------------------

/// A task with its output type erased.
///
/// This is what a driver needs to keep tasks of different types in one
/// collection. It is implemented for all [`AsyncTask`]s.
pub trait Pollable {
    /// Returns the task id.
    fn task_id(&self) -> TaskId;

    /// Returns the current state.
    fn task_state(&self) -> TaskState;

    /// Polls the task and notifies the owner if it became terminal.
    fn drive(&mut self) -> TaskState;
}

impl<T: AsyncTask + ?Sized> Pollable for T {
    fn task_id(&self) -> TaskId {
        self.id()
    }

    fn task_state(&self) -> TaskState {
        self.state()
    }

    fn drive(&mut self) -> TaskState {
        let state = self.poll();
        if state.is_terminal() {
            self.notify();
        }
        state
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::clock::FakeClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// A task that finishes after a fixed number of steps.
    struct Countdown {
        core: TaskCore<u32>,
        left: u32,
    }

    impl Countdown {
        fn new(env: &TaskEnv, left: u32, completion: Completion<u32>) -> Self {
            Countdown {
                core: TaskCore::new(env, "countdown", completion),
                left,
            }
        }
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
            if self.left == 0 {
                Progress::Ready(self.core.polls(), Status::received(1))
            } else {
                self.left -= 1;
                Progress::Pending
            }
        }
    }

    /// A task that fails on its first step.
    struct Broken(TaskCore<()>);

    impl AsyncTask for Broken {
        type Output = ();

        fn core(&self) -> &TaskCore<()> {
            &self.0
        }

        fn core_mut(&mut self) -> &mut TaskCore<()> {
            &mut self.0
        }

        fn step(&mut self) -> Progress<()> {
            Progress::Failed(Status::CLOSED)
        }
    }

    fn env() -> TaskEnv {
        let mut config = Config::new();
        config.set_timeout(None);
        TaskEnv::new(config)
    }

    #[test]
    fn runs_until_finished() {
        let env = env();
        let mut task = Countdown::new(&env, 2, Completion::none());
        assert_eq!(task.poll(), TaskState::Running);
        assert_eq!(task.result().get(), (None, Status::NONE));
        assert_eq!(task.poll(), TaskState::Running);
        assert_eq!(task.poll(), TaskState::Finished);
        assert_eq!(task.result().get(), (Some(&3), Status::received(1)));
    }

    #[test]
    fn terminal_poll_is_noop() {
        let env = env();
        let mut task = Countdown::new(&env, 0, Completion::none());
        assert_eq!(task.poll(), TaskState::Finished);
        for _ in 0..5 {
            assert_eq!(task.poll(), TaskState::Finished);
        }
        assert_eq!(task.core().polls(), 1);
        assert_eq!(task.result().value(), Some(&1));
    }

    #[test]
    fn failure_is_terminal() {
        let env = env();
        let mut task = Broken(TaskCore::new(&env, "broken", Completion::none()));
        assert_eq!(task.poll(), TaskState::Failed);
        assert_eq!(task.poll(), TaskState::Failed);
        assert!(task.result().is_set());
        assert_eq!(task.result().get(), (None, Status::CLOSED));
    }

    #[test]
    fn notify_only_after_terminal() {
        let env = env();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let mut task = Countdown::new(
            &env,
            1,
            Completion::new(move |res: &ResultChannel<u32>| {
                assert!(res.is_set());
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(task.poll(), TaskState::Running);
        assert!(!task.notify());
        assert_eq!(task.poll(), TaskState::Finished);
        assert!(task.notify());
        assert!(!task.notify());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drive_notifies_once() {
        let env = env();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let store = seen.clone();
        let mut task = Countdown::new(
            &env,
            0,
            Completion::new(move |res: &ResultChannel<u32>| {
                store.lock().unwrap().push(res.status());
            }),
        );
        let task: &mut dyn Pollable = &mut task;
        assert_eq!(task.drive(), TaskState::Finished);
        assert_eq!(task.drive(), TaskState::Finished);
        assert_eq!(*seen.lock().unwrap(), vec![Status::received(1)]);
    }

    #[test]
    fn poll_budget() {
        let mut config = Config::new();
        config.set_timeout(None);
        config.set_max_polls(Some(2));
        let env = TaskEnv::new(config);
        let mut task = Countdown::new(&env, 10, Completion::none());
        assert_eq!(task.poll(), TaskState::Running);
        assert_eq!(task.poll(), TaskState::Running);
        assert_eq!(task.poll(), TaskState::Failed);
        assert_eq!(task.result().get(), (None, Status::TIMED_OUT));
    }

    #[test]
    fn timeout() {
        let clock = FakeClock::new();
        let mut config = Config::new();
        config.set_timeout(Some(Duration::from_secs(2)));
        let env = TaskEnv::new(config).with_clock(Arc::new(clock.clone()));
        let mut task = Countdown::new(&env, 10, Completion::none());
        assert_eq!(task.poll(), TaskState::Running);
        clock.adjust_time(Duration::from_secs(1));
        assert_eq!(task.poll(), TaskState::Running);
        clock.adjust_time(Duration::from_secs(1));
        assert_eq!(task.poll(), TaskState::Failed);
        assert_eq!(task.result().status(), Status::TIMED_OUT);
    }

    #[test]
    fn ids_shared_between_task_types() {
        let env = env();
        let first = Countdown::new(&env, 0, Completion::none());
        let second = Broken(TaskCore::new(&env, "broken", Completion::none()));
        let third = Countdown::new(&env, 0, Completion::none());
        assert!(first.id() < second.id());
        assert!(second.id() < third.id());
    }
}
