use warden_core::facts::IS_ALERT;
use warden_core::{
    ActorId, FactStore, Task, TaskKind, TaskResult, TaskRuntime, TaskStatus, TaskTimers,
    TickContext, TimerId, Vec3, WorldMut, WorldView,
};

#[derive(Default)]
struct TestWorld {
    log: Vec<String>,
}

impl WorldView for TestWorld {
    type Agent = u64;

    fn actor_position(&self, _actor: ActorId) -> Option<Vec3> {
        None
    }
}

impl WorldMut for TestWorld {}

/// Runs until its retry timer fires twice.
struct Retrying {
    fired: u32,
}

const RETRY: TimerId = TimerId("retry");

impl Task<TestWorld> for Retrying {
    fn kind(&self) -> TaskKind {
        TaskKind("retrying")
    }

    fn start(
        &mut self,
        ctx: &TickContext,
        _agent: u64,
        world: &mut TestWorld,
        facts: &mut FactStore,
        timers: &mut TaskTimers,
    ) -> TaskStatus {
        world.log.push("start".into());
        facts.set(IS_ALERT, true);
        timers.schedule_after(ctx.time_seconds, 0.5, RETRY);
        TaskStatus::Running
    }

    fn tick(
        &mut self,
        ctx: &TickContext,
        _agent: u64,
        world: &mut TestWorld,
        _facts: &mut FactStore,
        timers: &mut TaskTimers,
    ) -> TaskStatus {
        if timers.take_fired(RETRY) {
            self.fired += 1;
            world.log.push(format!("fired@{}", ctx.tick));
            if self.fired == 2 {
                return TaskStatus::Succeeded;
            }
            timers.schedule_after(ctx.time_seconds, 0.5, RETRY);
        }
        TaskStatus::Running
    }

    fn finish(
        &mut self,
        _ctx: &TickContext,
        _agent: u64,
        world: &mut TestWorld,
        _facts: &mut FactStore,
        result: TaskResult,
    ) {
        world.log.push(format!("finish:{}", result.name()));
    }
}

struct FailsAtStart;

impl Task<TestWorld> for FailsAtStart {
    fn kind(&self) -> TaskKind {
        TaskKind("fails")
    }

    fn start(
        &mut self,
        _ctx: &TickContext,
        _agent: u64,
        _world: &mut TestWorld,
        _facts: &mut FactStore,
        _timers: &mut TaskTimers,
    ) -> TaskStatus {
        TaskStatus::Failed
    }

    fn tick(
        &mut self,
        _ctx: &TickContext,
        _agent: u64,
        _world: &mut TestWorld,
        _facts: &mut FactStore,
        _timers: &mut TaskTimers,
    ) -> TaskStatus {
        unreachable!("a task that failed at start is never ticked")
    }

    fn finish(
        &mut self,
        _ctx: &TickContext,
        _agent: u64,
        world: &mut TestWorld,
        _facts: &mut FactStore,
        result: TaskResult,
    ) {
        world.log.push(format!("fails:{}", result.name()));
    }
}

#[test]
fn timers_drive_the_active_task_and_finish_is_called_once() {
    let mut runtime = TaskRuntime::<TestWorld>::default();
    let mut world = TestWorld::default();
    let mut facts = FactStore::with_schema();

    let ctx0 = TickContext::fixed(0, 0.25, 7);
    let status = runtime.start(
        Box::new(Retrying { fired: 0 }),
        &ctx0,
        1,
        &mut world,
        &mut facts,
    );
    assert_eq!(status, TaskStatus::Running);
    assert!(facts.get(IS_ALERT));

    let mut result = None;
    for tick in 1..10 {
        let ctx = TickContext::fixed(tick, 0.25, 7);
        if let Some(r) = runtime.tick(&ctx, 1, &mut world, &mut facts) {
            result = Some((tick, r));
            break;
        }
    }

    assert_eq!(result, Some((4, TaskResult::Succeeded)));
    assert_eq!(
        world.log,
        vec!["start", "fired@2", "fired@4", "finish:succeeded"]
    );
    assert!(runtime.is_idle());
    let finished = runtime.take_just_finished().expect("finished");
    assert_eq!(finished.kind, TaskKind("retrying"));
    assert_eq!(finished.result, TaskResult::Succeeded);
}

#[test]
fn starting_a_new_task_aborts_the_current_one_and_clears_its_timers() {
    let mut runtime = TaskRuntime::<TestWorld>::default();
    let mut world = TestWorld::default();
    let mut facts = FactStore::with_schema();
    let ctx = TickContext::fixed(0, 0.25, 7);

    runtime.start(
        Box::new(Retrying { fired: 0 }),
        &ctx,
        1,
        &mut world,
        &mut facts,
    );
    assert!(runtime.timers().is_pending(RETRY));
    let generation = runtime.generation();

    let status = runtime.start(Box::new(FailsAtStart), &ctx, 1, &mut world, &mut facts);

    assert_eq!(status, TaskStatus::Failed);
    assert_eq!(world.log, vec!["start", "finish:aborted", "fails:failed"]);
    assert!(runtime.is_idle());
    assert!(!runtime.timers().is_pending(RETRY));
    assert_eq!(runtime.generation(), generation + 1);
    assert_eq!(
        runtime.take_just_finished().map(|f| (f.kind, f.result)),
        Some((TaskKind("fails"), TaskResult::Failed))
    );
}

#[test]
fn abort_current_reports_the_aborted_kind() {
    let mut runtime = TaskRuntime::<TestWorld>::default();
    let mut world = TestWorld::default();
    let mut facts = FactStore::with_schema();
    let ctx = TickContext::fixed(0, 0.25, 7);

    assert_eq!(runtime.abort_current(&ctx, 1, &mut world, &mut facts), None);

    runtime.start(
        Box::new(Retrying { fired: 0 }),
        &ctx,
        1,
        &mut world,
        &mut facts,
    );
    assert!(runtime.is_running(TaskKind("retrying")));
    assert_eq!(
        runtime.abort_current(&ctx, 1, &mut world, &mut facts),
        Some(TaskKind("retrying"))
    );
    assert_eq!(world.log.last().map(String::as_str), Some("finish:aborted"));
}
