//! lock_demo — three instruments sharing one power bus.
//!
//! Each `HoldLock` activity asks for the bus at a priority, draws battery
//! while it holds it, and marks the span with a `LockAcquired` child.  A
//! `LowBattery` watcher wakes when the battery crosses a threshold.  The
//! plan is an embedded CSV; the trace lands in `output/lock_demo/`.
//!
//! Run with `RUST_LOG=debug` to see every dispatch.

use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use log::{info, warn};
use serde::Deserialize;

use tl_cells::{CellId, Discrete, Linear};
use tl_conditions::at_most;
use tl_core::{Duration, SimConfig};
use tl_engine::{ModelRegistry, SimBuilder};
use tl_lock::{Priority, PriorityLock};
use tl_output::{CsvWriter, TraceObserver};
use tl_schedule::load_plan_reader;
use tl_task::{ModelError, ModelResult, TaskContext};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:          u64 = 42;
const HORIZON_HOURS: i64 = 2;
const BATTERY_START: f64 = 100.0;
const LOW_BATTERY:   f64 = 50.0;

// ── Plan CSV ──────────────────────────────────────────────────────────────────

// C takes the bus first; A (low) and B (high) queue behind it.  B is granted
// first on release even though A asked earlier.
const PLAN_CSV: &str = r#"start_secs,activity_type,arguments
0,HoldLock,"{""name"":""C"",""priority"":""Low"",""hold_secs"":600,""draw"":0.02}"
60,HoldLock,"{""name"":""A"",""priority"":""Low"",""hold_secs"":900,""draw"":0.03}"
120,HoldLock,"{""name"":""B"",""priority"":""High"",""hold_secs"":300,""draw"":0.05}"
0,LowBattery,"{""threshold"":50.0}"
"#;

// ── Model ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct Mission {
    lock:     PriorityLock<Priority>,
    holder:   CellId<Discrete<String>>,
    priority: CellId<Discrete<Option<Priority>>>,
    pending:  CellId<Discrete<u32>>,
    battery:  CellId<Linear>,
}

impl Mission {
    fn new(builder: &mut SimBuilder) -> Self {
        Mission {
            lock:     PriorityLock::new(builder.cells_mut(), "bus"),
            holder:   builder.allocate("lockHolder", Discrete(String::new())),
            priority: builder.allocate("lockHolderPriority", Discrete(None)),
            pending:  builder.allocate("pendingLockRequests", Discrete(0)),
            battery:  builder.allocate("battery", Linear::constant(BATTERY_START)),
        }
    }

    fn register(self, registry: &mut ModelRegistry) {
        registry
            .resource("lockHolder", self.holder)
            .resource("pendingLockRequests", self.pending)
            .resource("battery", self.battery)
            .track(self.holder)
            .track(self.priority)
            .track(self.pending)
            .track(self.battery)
            .track(self.lock.holder_cell());

        registry.activity("HoldLock", move |p: HoldLock, ctx| self.hold_lock(p, ctx));
        registry.activity("LowBattery", move |p: LowBattery, ctx| self.low_battery(p, ctx));
    }

    fn hold_lock(self, p: HoldLock, ctx: &mut TaskContext) -> ModelResult<()> {
        if p.hold_secs <= 0.0 || p.draw < 0.0 {
            return Err(ModelError::InvalidParameters(format!(
                "{}: hold_secs must be positive and draw non-negative",
                p.name
            )));
        }
        ctx.emit(self.pending, |Discrete(n)| Discrete(n + 1))?;
        self.lock.acquire(ctx, p.priority)?;
        ctx.emit(self.pending, |Discrete(n)| Discrete(n.saturating_sub(1)))?;

        info!("{} took the bus at {}", p.name, ctx.now()?);
        ctx.set(self.holder, Discrete(p.name.clone()))?;
        ctx.set(self.priority, Discrete(Some(p.priority)))?;
        ctx.emit(self.battery, |b| b.with_rate(b.rate - p.draw))?;

        let hold = Duration::from_secs_f64(p.hold_secs);
        ctx.spawn("LockAcquired", move |ctx: &mut TaskContext| -> ModelResult<()> { ctx.delay(hold) })?;
        ctx.delay(hold)?;

        ctx.emit(self.battery, |b| b.with_rate(b.rate + p.draw))?;
        ctx.set(self.holder, Discrete(String::new()))?;
        ctx.set(self.priority, Discrete(None))?;
        self.lock.release(ctx)?;
        Ok(())
    }

    fn low_battery(self, p: LowBattery, ctx: &mut TaskContext) -> ModelResult<()> {
        ctx.wait_until(at_most(self.battery, p.threshold))?;
        warn!("battery at {:.1} by {}", ctx.get(self.battery)?, ctx.now()?);
        Ok(())
    }
}

#[derive(Deserialize)]
struct HoldLock {
    name:      String,
    priority:  Priority,
    hold_secs: f64,
    #[serde(default)]
    draw:      f64,
}

#[derive(Deserialize)]
struct LowBattery {
    #[serde(default = "default_threshold")]
    threshold: f64,
}

fn default_threshold() -> f64 {
    LOW_BATTERY
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== lock_demo — rust_tl simulation kernel ===");
    println!("Horizon: {HORIZON_HOURS} h  |  Seed: {SEED}");
    println!();

    // 1. Cells, model, registry.
    let config = SimConfig {
        start_unix_secs: 1_700_000_000,
        duration: Some(Duration::HOUR * HORIZON_HOURS),
        seed: SEED,
        ..SimConfig::default()
    };
    let mut builder = SimBuilder::new(config);
    let mission = Mission::new(&mut builder);
    mission.register(builder.registry_mut());

    // 2. Plan.
    let plan = load_plan_reader(Cursor::new(PLAN_CSV))?;
    println!("Loaded {} directives", plan.len());

    // 3. Engine and output.
    let mut engine = builder.plan(plan).build()?;
    std::fs::create_dir_all("output/lock_demo")?;
    let writer = CsvWriter::new(Path::new("output/lock_demo"))?;
    let mut obs = TraceObserver::new(writer);

    // 4. Run.
    let t0 = Instant::now();
    let results = engine.run(&mut obs)?;
    let elapsed = t0.elapsed();

    if let Some(e) = obs.take_error() {
        eprintln!("output error: {e}");
    }

    // 5. Summary.
    println!("Simulation complete in {:.3} s (simulated {})", elapsed.as_secs_f64(), engine.clock());
    println!("  tasks.csv    : {} rows", results.tasks.len());
    println!("  profiles.csv : {} rows", results.profiles.iter().map(|p| p.segments.len()).sum::<usize>());
    println!();

    println!("{:<8} {:<14} {:<10} {:>12} {:>12}", "Task", "Activity", "Status", "Start", "End");
    println!("{}", "-".repeat(60));
    for task in &results.tasks {
        let fmt = |t: Option<tl_core::SimTime>| t.map(|t| t.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:<8} {:<14} {:<10} {:>12} {:>12}",
            task.id.0,
            task.activity_type,
            task.status.as_str(),
            fmt(task.start),
            fmt(task.end),
        );
    }
    if let Some(battery) = results.resources.get("battery") {
        println!();
        println!("Final battery: {battery}");
    }

    Ok(())
}
