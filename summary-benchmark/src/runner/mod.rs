//! Benchmark execution engine

pub mod executor;
pub mod rate_limiter;

pub use executor::{
    ConsoleProgress, Executor, ExecutorConfig, ModelRun, NoOpProgress, ProgressCallback, SampleRecord,
};
pub use rate_limiter::RateLimiter;
