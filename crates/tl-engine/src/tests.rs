//! Integration tests for tl-engine.

use serde::Deserialize;
use serde_json::json;

use tl_cells::{CellError, CellId, Discrete, Linear};
use tl_conditions::{at_least, never, when};
use tl_core::{Duration, SimConfig, SimTime, TaskId};
use tl_schedule::Plan;
use tl_task::{ModelError, ModelResult, TaskContext, TaskStatus};

use crate::{NoopObserver, SimBuilder, SimError, SimObserver, SimulationResults, TaskSummary};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Ordered log of `(task, micros)` entries written by test models.
type Log = Discrete<Vec<(u64, i64)>>;

fn test_config(horizon_secs: Option<i64>) -> SimConfig {
    SimConfig { seed: 42, duration: horizon_secs.map(Duration::from_secs), ..SimConfig::default() }
}

/// Route `log` output through the test harness; `RUST_LOG=trace` to see it.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn secs(n: i64) -> Duration {
    Duration::from_secs(n)
}

fn at(n: i64) -> SimTime {
    SimTime::ZERO + secs(n)
}

fn stamp(ctx: &mut TaskContext, log: CellId<Log>) -> ModelResult<()> {
    let entry = (ctx.id().0, ctx.now()?.micros());
    ctx.emit(log, move |mut l| {
        l.0.push(entry);
        l
    })
}

fn log_entries(engine: &crate::Engine, log: CellId<Log>) -> Vec<(u64, i64)> {
    engine.cells().unwrap().read(log).unwrap().0.clone()
}

#[derive(Default)]
struct Recorder {
    advanced:  Vec<SimTime>,
    started:   Vec<(TaskId, String, SimTime)>,
    completed: Vec<TaskId>,
    ended:     bool,
}

impl SimObserver for Recorder {
    fn on_time_advanced(&mut self, _from: SimTime, to: SimTime) {
        self.advanced.push(to);
    }

    fn on_task_started(&mut self, task: TaskId, activity_type: &str, at: SimTime) {
        self.started.push((task, activity_type.to_string(), at));
    }

    fn on_task_completed(&mut self, summary: &TaskSummary) {
        self.completed.push(summary.id);
    }

    fn on_sim_end(&mut self, _results: &SimulationResults) {
        self.ended = true;
    }
}

#[derive(Deserialize)]
struct Wait {
    secs: i64,
}

// ── SimBuilder validation ─────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn unknown_activity_type_names_directive() {
        let mut builder = SimBuilder::new(test_config(None));
        builder.registry_mut().activity("wait", |p: Wait, ctx| ctx.delay(secs(p.secs)));
        let plan = Plan::empty().with(secs(0), "wait", json!({ "secs": 1 })).with(secs(5), "teleport", json!(null));

        match builder.plan(plan).build() {
            Err(SimError::Directive { index, source }) => {
                assert_eq!(index, 1);
                assert!(matches!(*source, SimError::UnknownActivityType(ref t) if t == "teleport"));
            }
            Err(other) => panic!("expected directive error, got {other}"),
            Ok(_) => panic!("expected directive error"),
        }
    }

    #[test]
    fn bad_arguments_fail_before_the_run() {
        let mut builder = SimBuilder::new(test_config(None));
        builder.registry_mut().activity("wait", |p: Wait, ctx| ctx.delay(secs(p.secs)));
        let plan = Plan::empty().with(secs(0), "wait", json!({ "secs": "soon" }));

        match builder.plan(plan).build() {
            Err(SimError::Directive { index: 0, source }) => {
                assert!(matches!(*source, SimError::InvalidParameters { .. }));
            }
            Err(other) => panic!("expected directive error, got {other}"),
            Ok(_) => panic!("expected directive error"),
        }
    }

    #[test]
    fn invalid_config_rejected() {
        let config = SimConfig { search_samples: 0, ..SimConfig::default() };
        assert!(matches!(SimBuilder::new(config).build(), Err(SimError::Core(_))));
    }

    #[test]
    fn root_ids_follow_insertion_order() {
        let mut builder = SimBuilder::new(test_config(None));
        builder.registry_mut().activity("wait", |p: Wait, ctx| ctx.delay(secs(p.secs)));
        let plan = Plan::empty().with(secs(3), "wait", json!({ "secs": 0 })).with(secs(1), "wait", json!({ "secs": 0 }));
        let mut engine = builder
            .plan(plan)
            .spawn_at(secs(0), "direct", |_ctx: &mut TaskContext| -> ModelResult<()> { Ok(()) })
            .build()
            .unwrap();

        assert_eq!(engine.task_count(), 3);
        let results = engine.run(&mut NoopObserver).unwrap();
        // Plan sorts by start, so the t+1s directive is TaskId(0).
        assert_eq!(results.task(TaskId(0)).unwrap().start, Some(at(1)));
        assert_eq!(results.task(TaskId(1)).unwrap().start, Some(at(3)));
        assert_eq!(results.task(TaskId(2)).unwrap().activity_type, "direct");
        assert_eq!(results.completion_order, vec![TaskId(2), TaskId(0), TaskId(1)]);
    }
}

// ── Event loop ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod run_tests {
    use super::*;

    #[test]
    fn delay_moves_the_clock() {
        init_logging();
        let mut builder = SimBuilder::new(test_config(None));
        let log = builder.allocate("log", Log::default());
        let mut engine = builder
            .spawn_at(secs(2), "stamper", move |ctx: &mut TaskContext| -> ModelResult<()> {
                stamp(ctx, log)?;
                ctx.delay(secs(5))?;
                stamp(ctx, log)
            })
            .build()
            .unwrap();

        let mut recorder = Recorder::default();
        let results = engine.run(&mut recorder).unwrap();

        assert_eq!(log_entries(&engine, log), vec![(0, at(2).micros()), (0, at(7).micros())]);
        assert_eq!(recorder.advanced, vec![at(2), at(7)]);
        assert_eq!(recorder.started, vec![(TaskId(0), "stamper".to_string(), at(2))]);
        assert_eq!(recorder.completed, vec![TaskId(0)]);
        assert!(recorder.ended);
        assert_eq!(results.end_time, at(7));
        assert!(results.all_complete());
    }

    #[test]
    fn same_time_events_run_in_creation_order() {
        let mut builder = SimBuilder::new(test_config(None));
        let log = builder.allocate("log", Log::default());
        let mut engine = builder
            .spawn_at(secs(1), "a", move |ctx: &mut TaskContext| -> ModelResult<()> { stamp(ctx, log) })
            .spawn_at(secs(1), "b", move |ctx: &mut TaskContext| -> ModelResult<()> { stamp(ctx, log) })
            .spawn_at(secs(0), "c", move |ctx: &mut TaskContext| -> ModelResult<()> {
                ctx.delay(secs(1))?;
                stamp(ctx, log)
            })
            .build()
            .unwrap();

        engine.run(&mut NoopObserver).unwrap();
        let order: Vec<u64> = log_entries(&engine, log).into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn wait_for_resumes_after_target_completes() {
        let mut builder = SimBuilder::new(test_config(None));
        let log = builder.allocate("log", Log::default());
        let mut engine = builder
            .spawn_at(secs(0), "parent", move |ctx: &mut TaskContext| -> ModelResult<()> {
                let child = ctx.defer(secs(3), "child", move |ctx: &mut TaskContext| -> ModelResult<()> {
                    ctx.delay(secs(4))?;
                    stamp(ctx, log)
                })?;
                ctx.wait_for(child)?;
                stamp(ctx, log)
            })
            .build()
            .unwrap();

        let results = engine.run(&mut NoopObserver).unwrap();
        assert_eq!(log_entries(&engine, log), vec![(1, at(7).micros()), (0, at(7).micros())]);
        assert_eq!(results.task(TaskId(1)).unwrap().parent, Some(TaskId(0)));
        assert_eq!(results.task(TaskId(1)).unwrap().start, Some(at(3)));
    }

    #[test]
    fn read_from_the_future_is_fatal_with_task_and_time() {
        let mut builder = SimBuilder::new(test_config(None));
        let level = builder.allocate("level", Linear::constant(1.0));
        let mut engine = builder
            .spawn_at(secs(2), "peek", move |ctx: &mut TaskContext| -> ModelResult<()> {
                ctx.read_at(level, at(10))?;
                Ok(())
            })
            .build()
            .unwrap();

        match engine.run(&mut NoopObserver) {
            Err(SimError::TaskFailed { task, time, source: ModelError::Cell(CellError::OutOfOrderRead { .. }), .. }) => {
                assert_eq!(task, TaskId(0));
                assert_eq!(time, at(2));
            }
            other => panic!("expected out-of-order read failure, got {other:?}"),
        }
    }
}

// ── Children ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod children_tests {
    use super::*;

    /// Parent spawns `n` children that finish at t+1s..t+n s and returns at
    /// once; it must not complete before the last child.
    fn run_with_children(n: i64) -> SimulationResults {
        let mut engine = SimBuilder::new(test_config(None))
            .spawn_at(secs(0), "parent", move |ctx: &mut TaskContext| -> ModelResult<()> {
                for i in 1..=n {
                    ctx.spawn("child", move |ctx: &mut TaskContext| -> ModelResult<()> { ctx.delay(secs(i)) })?;
                }
                Ok(())
            })
            .build()
            .unwrap();
        engine.run(&mut NoopObserver).unwrap()
    }

    #[test]
    fn parent_completes_after_every_child() {
        for n in [0, 1, 5] {
            let results = run_with_children(n);
            let parent = results.task(TaskId(0)).unwrap();
            assert_eq!(parent.children.len(), n as usize);
            assert_eq!(parent.status, TaskStatus::Complete);
            assert_eq!(parent.end, Some(at(n)), "n = {n}");
            assert_eq!(results.completion_order.last(), Some(&TaskId(0)), "n = {n}");
            for child in &parent.children {
                let child = results.task(*child).unwrap();
                assert!(child.end <= parent.end);
            }
        }
    }

    #[test]
    fn explicit_barrier_mid_activity() {
        let mut builder = SimBuilder::new(test_config(None));
        let log = builder.allocate("log", Log::default());
        let mut engine = builder
            .spawn_at(secs(0), "parent", move |ctx: &mut TaskContext| -> ModelResult<()> {
                ctx.spawn("slow", |ctx: &mut TaskContext| -> ModelResult<()> { ctx.delay(secs(9)) })?;
                ctx.spawn("fast", |ctx: &mut TaskContext| -> ModelResult<()> { ctx.delay(secs(2)) })?;
                ctx.wait_for_children()?;
                stamp(ctx, log)?;
                ctx.delay(secs(1))
            })
            .build()
            .unwrap();

        let mut engine_status = None;
        let mut recorder = Recorder::default();
        while engine.step(&mut recorder).unwrap() {
            if engine.now() == at(2) {
                engine_status = engine.task_status(TaskId(0));
            }
        }
        assert_eq!(engine_status, Some(TaskStatus::AwaitingChildren));
        assert_eq!(log_entries(&engine, log), vec![(0, at(9).micros())]);
        assert_eq!(engine.task_status(TaskId(0)), Some(TaskStatus::Complete));
        assert_eq!(recorder.completed, vec![TaskId(2), TaskId(1), TaskId(0)]);
    }

    #[test]
    fn deferred_child_starts_later() {
        let mut engine = SimBuilder::new(test_config(None))
            .spawn_at(secs(1), "parent", |ctx: &mut TaskContext| -> ModelResult<()> {
                ctx.defer(secs(4), "late", |_ctx: &mut TaskContext| -> ModelResult<()> { Ok(()) })?;
                Ok(())
            })
            .build()
            .unwrap();
        let results = engine.run(&mut NoopObserver).unwrap();
        assert_eq!(results.task(TaskId(1)).unwrap().start, Some(at(5)));
        assert_eq!(results.task(TaskId(0)).unwrap().end, Some(at(5)));
    }
}

// ── Conditions ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod condition_tests {
    use super::*;

    #[test]
    fn wakes_at_predicted_crossing() {
        let mut builder = SimBuilder::new(test_config(None));
        let battery = builder.allocate("battery", Linear::new(0.0, 1.0));
        let log = builder.allocate("log", Log::default());
        let mut engine = builder
            .spawn_at(secs(0), "watcher", move |ctx: &mut TaskContext| -> ModelResult<()> {
                ctx.wait_until(at_least(battery, 10.0))?;
                stamp(ctx, log)
            })
            .build()
            .unwrap();

        engine.run(&mut NoopObserver).unwrap();
        assert_eq!(log_entries(&engine, log), vec![(0, at(10).micros())]);
    }

    #[test]
    fn write_to_a_dependency_moves_the_prediction() {
        init_logging();
        let mut builder = SimBuilder::new(test_config(None));
        let battery = builder.allocate("battery", Linear::new(0.0, 1.0));
        let log = builder.allocate("log", Log::default());
        let mut engine = builder
            .spawn_at(secs(0), "watcher", move |ctx: &mut TaskContext| -> ModelResult<()> {
                ctx.wait_until(at_least(battery, 10.0))?;
                stamp(ctx, log)
            })
            .spawn_at(secs(2), "boost", move |ctx: &mut TaskContext| -> ModelResult<()> {
                ctx.emit(battery, |b| b.with_rate(2.0))
            })
            .build()
            .unwrap();

        engine.run(&mut NoopObserver).unwrap();
        // 2 units at t+2s, then 2/s: 10 is reached at t+6s instead of t+10s.
        assert_eq!(log_entries(&engine, log), vec![(0, at(6).micros())]);
    }

    #[test]
    fn prediction_withdrawn_when_crossing_disappears() {
        let mut builder = SimBuilder::new(test_config(None));
        let battery = builder.allocate("battery", Linear::new(0.0, 1.0));
        let mut engine = builder
            .spawn_at(secs(0), "watcher", move |ctx: &mut TaskContext| -> ModelResult<()> {
                ctx.wait_until(at_least(battery, 10.0))
            })
            .spawn_at(secs(3), "stall", move |ctx: &mut TaskContext| -> ModelResult<()> {
                ctx.emit(battery, |b| b.with_rate(0.0))
            })
            .build()
            .unwrap();

        let results = engine.run(&mut NoopObserver).unwrap();
        assert_eq!(results.incomplete, vec![TaskId(0)]);
        assert_eq!(results.task(TaskId(0)).unwrap().status, TaskStatus::Suspended);
        assert_eq!(results.end_time, at(3));
    }

    #[test]
    fn bounded_stretch_wakes_without_horizon() {
        init_logging();
        let mut builder = SimBuilder::new(test_config(None));
        let battery = builder.allocate("battery", Linear::new(0.0, 1.0));
        let log = builder.allocate("log", Log::default());
        let mut engine = builder
            .spawn_at(secs(0), "watcher", move |ctx: &mut TaskContext| -> ModelResult<()> {
                ctx.wait_until(when(battery, |v: &f64| *v >= 10.0 && *v < 20.0))?;
                stamp(ctx, log)
            })
            .build()
            .unwrap();

        let results = engine.run(&mut NoopObserver).unwrap();
        assert!(results.all_complete());
        assert_eq!(log_entries(&engine, log), vec![(0, at(10).micros())]);
    }

    #[test]
    fn search_is_confined_to_the_horizon() {
        let mut builder = SimBuilder::new(test_config(Some(60)));
        let battery = builder.allocate("battery", Linear::new(0.0, 1.0));
        let log = builder.allocate("log", Log::default());
        let mut engine = builder
            .spawn_at(secs(0), "watcher", move |ctx: &mut TaskContext| -> ModelResult<()> {
                ctx.wait_until(when(battery, |v: &f64| (40.0..41.0).contains(v)))?;
                stamp(ctx, log)
            })
            .build()
            .unwrap();

        engine.run(&mut NoopObserver).unwrap();
        assert_eq!(log_entries(&engine, log), vec![(0, at(40).micros())]);
    }

    #[test]
    fn whenever_fires_each_time_the_condition_holds() {
        let mut builder = SimBuilder::new(test_config(Some(35)));
        let battery = builder.allocate("battery", Linear::new(0.0, 1.0));
        let log = builder.allocate("log", Log::default());
        let mut engine = builder
            .spawn_at(secs(0), "setup", move |ctx: &mut TaskContext| -> ModelResult<()> {
                ctx.whenever(
                    "recharge",
                    move || at_least(battery, 10.0),
                    move |ctx: &mut TaskContext| -> ModelResult<()> {
                        stamp(ctx, log)?;
                        ctx.set(battery, Linear::new(0.0, 1.0))
                    },
                )?;
                Ok(())
            })
            .build()
            .unwrap();

        let results = engine.run(&mut NoopObserver).unwrap();
        assert_eq!(
            log_entries(&engine, log),
            vec![(1, at(10).micros()), (1, at(20).micros()), (1, at(30).micros())]
        );
        // The daemon outlives the run and holds its parent open.
        assert_eq!(results.incomplete, vec![TaskId(0), TaskId(1)]);
        assert_eq!(results.task(TaskId(0)).unwrap().status, TaskStatus::AwaitingChildren);
    }

    #[test]
    fn never_satisfied_condition_leaves_task_incomplete() {
        let mut engine = SimBuilder::new(test_config(None))
            .spawn_at(secs(0), "stuck", |ctx: &mut TaskContext| -> ModelResult<()> { ctx.wait_until(never()) })
            .build()
            .unwrap();
        let results = engine.run(&mut NoopObserver).unwrap();
        assert!(!results.all_complete());
        assert_eq!(results.incomplete, vec![TaskId(0)]);
    }
}

// ── Failures ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[test]
    fn model_error_aborts_run_with_task_and_time() {
        init_logging();
        let mut engine = SimBuilder::new(test_config(None))
            .spawn_at(secs(0), "ok", |ctx: &mut TaskContext| -> ModelResult<()> { ctx.delay(secs(100)) })
            .spawn_at(secs(1), "broken", |ctx: &mut TaskContext| -> ModelResult<()> {
                ctx.delay(secs(2))?;
                Err(ModelError::failed("valve stuck"))
            })
            .build()
            .unwrap();

        match engine.run(&mut NoopObserver) {
            Err(SimError::TaskFailed { task, activity_type, time, source }) => {
                assert_eq!(task, TaskId(1));
                assert_eq!(activity_type, "broken");
                assert_eq!(time, at(3));
                assert_eq!(source.to_string(), "activity failed: valve stuck");
            }
            other => panic!("expected task failure, got {other:?}"),
        }
    }

    #[test]
    fn panic_is_reported_not_propagated() {
        let mut engine = SimBuilder::new(test_config(None))
            .spawn_at(secs(4), "explodes", |ctx: &mut TaskContext| -> ModelResult<()> {
                ctx.delay(secs(1))?;
                panic!("pressure exceeded");
            })
            .build()
            .unwrap();

        match engine.run(&mut NoopObserver) {
            Err(SimError::TaskPanicked { task, time, message, .. }) => {
                assert_eq!(task, TaskId(0));
                assert_eq!(time, at(5));
                assert!(message.contains("pressure exceeded"));
            }
            other => panic!("expected panic report, got {other:?}"),
        }
    }
}

// ── Horizon, determinism, reporting ───────────────────────────────────────────

#[cfg(test)]
mod reporting_tests {
    use super::*;

    #[test]
    fn horizon_stops_dispatch_and_tears_down() {
        init_logging();
        let mut builder = SimBuilder::new(test_config(Some(10)));
        let ticks = builder.allocate("ticks", Discrete(0u32));
        let mut engine = builder
            .spawn_at(secs(0), "ticker", move |ctx: &mut TaskContext| -> ModelResult<()> {
                loop {
                    ctx.emit(ticks, |Discrete(n)| Discrete(n + 1))?;
                    ctx.delay(secs(4))?;
                }
            })
            .build()
            .unwrap();

        let results = engine.run(&mut NoopObserver).unwrap();
        assert_eq!(engine.cells().unwrap().read(ticks).unwrap().0, 3);
        assert_eq!(results.end_time, at(8));
        assert_eq!(results.incomplete, vec![TaskId(0)]);
    }

    fn random_run(seed: u64) -> (String, Vec<(u64, i64)>) {
        let config = SimConfig { seed, ..test_config(None) };
        let mut builder = SimBuilder::new(config);
        let log = builder.allocate("log", Log::default());
        builder.registry_mut().track(log);
        let mut engine = builder
            .spawn_at(secs(0), "scatter", move |ctx: &mut TaskContext| -> ModelResult<()> {
                for _ in 0..6 {
                    let wait = ctx.rng().gen_range(0..50i64);
                    ctx.spawn("jitter", move |ctx: &mut TaskContext| -> ModelResult<()> {
                        let extra = ctx.rng().gen_range(0..1_000i64);
                        ctx.delay(secs(wait) + Duration::from_millis(extra))?;
                        stamp(ctx, log)
                    })?;
                }
                Ok(())
            })
            .build()
            .unwrap();
        let results = engine.run(&mut NoopObserver).unwrap();
        (results.to_json().unwrap(), log_entries(&engine, log))
    }

    #[test]
    fn same_seed_same_results() {
        let (first_json, first_log) = random_run(7);
        let (second_json, second_log) = random_run(7);
        assert_eq!(first_json, second_json);
        assert_eq!(first_log, second_log);
        assert_eq!(first_log.len(), 6);
    }

    #[test]
    fn resources_and_profiles_reported() {
        let mut builder = SimBuilder::new(test_config(None));
        let battery = builder.allocate("battery", Linear::new(50.0, 0.0));
        builder.registry_mut().resource("battery_level", battery).track(battery);
        let mut engine = builder
            .spawn_at(secs(5), "drain", move |ctx: &mut TaskContext| -> ModelResult<()> {
                ctx.emit(battery, |b| b.with_rate(-1.0))?;
                ctx.delay(secs(20))?;
                ctx.emit(battery, |b| b.with_rate(0.0))
            })
            .build()
            .unwrap();

        let results = engine.run(&mut NoopObserver).unwrap();
        assert_eq!(results.resources["battery_level"], json!(30.0));
        assert_eq!(engine.sample_resource("battery_level").unwrap(), json!(30.0));

        let profile = results.profile("battery").unwrap();
        let starts: Vec<SimTime> = profile.segments.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![SimTime::ZERO, at(5), at(25)]);
        assert_eq!(profile.segments[2].dynamics, json!({ "value": 30.0, "rate": 0.0 }));
        assert!(matches!(engine.sample_resource("missing"), Err(SimError::UnknownResource(_))));
    }
}
