// The process-wide scheduling loop

mod engine;

pub use engine::{run_cycle, Cycle, SchedulerConfig, SchedulerEngine};
