use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Periodic task scheduling
// ---------------------------------------------------------------------------

/// A unit of periodic work driven by the [`Scheduler`].
///
/// `tick` receives the measured wall-clock time since the previous tick in
/// seconds. A tick never gets preempted mid-computation; suspension happens
/// only in the scheduler's end-of-tick sleep.
pub trait Task: Send {
    /// Human-readable name for the thread and for display.
    fn name(&self) -> &str {
        "task"
    }

    fn tick(&mut self, dt: f64);
}

/// Remote control for one spawned task: live rate changes and the stop
/// token the task loop checks before every tick.
#[derive(Clone)]
pub struct TaskHandle {
    name: String,
    stop: Arc<AtomicBool>,
    period_micros: Arc<AtomicU64>,
}

impl TaskHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Change the tick rate. Takes effect at the next sleep; a zero or
    /// negative frequency is ignored.
    pub fn set_frequency(&self, hz: f64) {
        if hz > 0.0 {
            let micros = (1_000_000.0 / hz) as u64;
            self.period_micros.store(micros.max(1), Ordering::Relaxed);
        }
    }

    /// Ask the task loop to exit before its next tick.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

/// Runs each task on its own thread in a fixed-delay loop:
/// measure dt, tick, sleep one period.
///
/// A tick that runs long is simply followed by the normally scheduled next
/// tick, which then sees the larger wall-clock dt; nothing is abandoned or
/// caught up. Dropping the scheduler without calling [`Scheduler::shutdown`]
/// detaches the task threads, which then run for the process lifetime.
pub struct Scheduler {
    tasks: Vec<(TaskHandle, JoinHandle<()>)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Spawn a task at the given tick rate and return its handle.
    pub fn spawn<T: Task + 'static>(&mut self, mut task: T, hz: f64) -> TaskHandle {
        let handle = TaskHandle {
            name: task.name().to_string(),
            stop: Arc::new(AtomicBool::new(false)),
            period_micros: Arc::new(AtomicU64::new((1_000_000.0 / hz.max(1e-3)) as u64)),
        };

        let stop = Arc::clone(&handle.stop);
        let period_micros = Arc::clone(&handle.period_micros);
        let join = thread::Builder::new()
            .name(handle.name.clone())
            .spawn(move || {
                let mut last = Instant::now();
                while !stop.load(Ordering::Relaxed) {
                    let now = Instant::now();
                    let dt = now.duration_since(last).as_secs_f64();
                    last = now;
                    task.tick(dt);
                    thread::sleep(Duration::from_micros(period_micros.load(Ordering::Relaxed)));
                }
            })
            .expect("failed to spawn task thread");

        self.tasks.push((handle.clone(), join));
        handle
    }

    /// Handles of all spawned tasks, in spawn order.
    pub fn handles(&self) -> Vec<TaskHandle> {
        self.tasks.iter().map(|(h, _)| h.clone()).collect()
    }

    /// Flag every task to stop, then join every thread.
    pub fn shutdown(self) {
        for (handle, _) in &self.tasks {
            handle.stop();
        }
        for (_, join) in self.tasks {
            let _ = join.join();
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
