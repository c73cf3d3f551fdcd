use crate::{EventQueue, FactStore, TickContext, WorldMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Succeeded,
    Failed,
}

/// Termination notice delivered to [`Task::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaskResult {
    Succeeded,
    Failed,
    Aborted,
}

impl TaskStatus {
    pub fn result(self) -> Option<TaskResult> {
        match self {
            TaskStatus::Running => None,
            TaskStatus::Succeeded => Some(TaskResult::Succeeded),
            TaskStatus::Failed => Some(TaskResult::Failed),
        }
    }

    pub fn is_running(self) -> bool {
        self == TaskStatus::Running
    }
}

impl TaskResult {
    pub fn name(self) -> &'static str {
        match self {
            TaskResult::Succeeded => "succeeded",
            TaskResult::Failed => "failed",
            TaskResult::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskKind(pub &'static str);

impl core::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub &'static str);

/// Deferred wake-ups owned by the active task slot.
///
/// A timer scheduled during a tick fires at the earliest on the next tick. The slot clears all
/// timers whenever its task changes, so a new task never sees a previous task's wake-ups.
#[derive(Debug, Clone, Default)]
pub struct TaskTimers {
    queue: EventQueue<TimerId>,
    fired: Vec<TimerId>,
}

impl TaskTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)arm `id` to fire `delay` seconds after `now`. A pending timer with the same id is
    /// replaced.
    pub fn schedule_after(&mut self, now: f32, delay: f32, id: TimerId) {
        self.cancel(id);
        self.queue.schedule_after(now, delay, id);
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.queue.retain(|pending| *pending != id);
        self.fired.retain(|fired| *fired != id);
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.queue.contains(|pending| *pending == id)
    }

    /// Consume a fired timer. Returns `true` once per firing.
    pub fn take_fired(&mut self, id: TimerId) -> bool {
        let before = self.fired.len();
        self.fired.retain(|fired| *fired != id);
        self.fired.len() != before
    }

    /// Move every timer due at `now` into the fired set.
    pub fn advance(&mut self, now: f32) {
        let due = self.queue.drain_due(now);
        self.fired.extend(due);
    }

    pub fn reset(&mut self) {
        self.queue.clear();
        self.fired.clear();
    }
}

/// A resumable multi-frame unit of behaviour.
///
/// Lifecycle: `start` once, then `tick` once per frame while it returns `Running`, then exactly
/// one `finish` with the termination result (including `Aborted` when preempted). Scratch state
/// lives in the implementing struct, which the owner creates fresh for every run.
pub trait Task<W>: 'static
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> TaskKind;

    fn start(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        facts: &mut FactStore,
        timers: &mut TaskTimers,
    ) -> TaskStatus;

    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        facts: &mut FactStore,
        timers: &mut TaskTimers,
    ) -> TaskStatus;

    fn finish(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _facts: &mut FactStore,
        _result: TaskResult,
    ) {
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishedTask {
    pub kind: TaskKind,
    pub result: TaskResult,
    /// Slot generation the task ran under.
    pub generation: u64,
}

/// Single active-task slot.
pub struct TaskRuntime<W>
where
    W: WorldMut + 'static,
{
    current: Option<Box<dyn Task<W>>>,
    timers: TaskTimers,
    generation: u64,
    just_finished: Option<FinishedTask>,
}

impl<W> TaskRuntime<W>
where
    W: WorldMut + 'static,
{
    pub fn current_kind(&self) -> Option<TaskKind> {
        self.current.as_ref().map(|t| t.kind())
    }

    pub fn is_running(&self, kind: TaskKind) -> bool {
        self.current_kind() == Some(kind)
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    /// Incremented every time a task is started in this slot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn timers(&self) -> &TaskTimers {
        &self.timers
    }

    /// Abort whatever runs and start `task`. A task that ends inside `start` is finished
    /// immediately and never occupies the slot.
    pub fn start(
        &mut self,
        mut task: Box<dyn Task<W>>,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        facts: &mut FactStore,
    ) -> TaskStatus {
        self.abort_current(ctx, agent, world, facts);

        self.generation += 1;
        self.timers.reset();
        self.just_finished = None;

        let status = task.start(ctx, agent, world, facts, &mut self.timers);
        match status.result() {
            Some(result) => {
                task.finish(ctx, agent, world, facts, result);
                self.timers.reset();
                self.just_finished = Some(FinishedTask {
                    kind: task.kind(),
                    result,
                    generation: self.generation,
                });
            }
            None => self.current = Some(task),
        }
        status
    }

    pub fn abort_current(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        facts: &mut FactStore,
    ) -> Option<TaskKind> {
        let mut task = self.current.take()?;
        task.finish(ctx, agent, world, facts, TaskResult::Aborted);
        self.timers.reset();
        let kind = task.kind();
        self.just_finished = Some(FinishedTask {
            kind,
            result: TaskResult::Aborted,
            generation: self.generation,
        });
        Some(kind)
    }

    /// Poll the active task once. Returns the result when it ended this tick.
    pub fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        facts: &mut FactStore,
    ) -> Option<TaskResult> {
        let task = self.current.as_mut()?;

        self.timers.advance(ctx.time_seconds);
        let status = task.tick(ctx, agent, world, facts, &mut self.timers);
        let result = status.result()?;

        if let Some(mut task) = self.current.take() {
            task.finish(ctx, agent, world, facts, result);
            self.just_finished = Some(FinishedTask {
                kind: task.kind(),
                result,
                generation: self.generation,
            });
        }
        self.timers.reset();
        Some(result)
    }

    pub fn take_just_finished(&mut self) -> Option<FinishedTask> {
        self.just_finished.take()
    }

    pub fn peek_just_finished(&self) -> Option<FinishedTask> {
        self.just_finished
    }
}

impl<W> Default for TaskRuntime<W>
where
    W: WorldMut + 'static,
{
    fn default() -> Self {
        Self {
            current: None,
            timers: TaskTimers::default(),
            generation: 0,
            just_finished: None,
        }
    }
}
