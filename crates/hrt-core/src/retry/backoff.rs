//! Backoff strategies: how long to wait before the next attempt.
//!
//! `attempt` is 1-based when the loop asks for a delay (the first retry is
//! attempt 1); attempt 0 is accepted and is where exponential curves start.
//! Every strategy returns a non-negative delay and never exceeds its `max`.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Maps an attempt number to a delay.
pub trait BackoffStrategy: Send + Sync {
    fn delay(&self, attempt: u32) -> Duration;
}

impl<F> BackoffStrategy for F
where
    F: Fn(u32) -> Duration + Send + Sync,
{
    fn delay(&self, attempt: u32) -> Duration {
        self(attempt)
    }
}

/// Source of uniform values in `[0, 1)` used for jitter.
pub trait RandomSource: Send + Sync + fmt::Debug {
    fn unit(&self) -> f64;
}

/// Thread-local generator from `rand`. The default for jittered strategies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn unit(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Reproducible sequence from a fixed seed.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn unit(&self) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.random::<f64>()
    }
}

/// Always yields the same value, clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(f64);

impl FixedRandom {
    pub fn new(value: f64) -> Self {
        Self(if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) })
    }
}

impl RandomSource for FixedRandom {
    fn unit(&self) -> f64 {
        self.0
    }
}

/// Same delay for every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constant(pub Duration);

impl BackoffStrategy for Constant {
    fn delay(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// `step * attempt`, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Linear {
    pub step: Duration,
    pub max: Duration,
}

impl Linear {
    pub fn new(step: Duration, max: Duration) -> Self {
        Self { step, max }
    }
}

impl BackoffStrategy for Linear {
    fn delay(&self, attempt: u32) -> Duration {
        linear(self.step, attempt).min(self.max)
    }
}

/// Linear delay shifted by a uniform offset in `[-step, +step]`, floored at
/// zero and capped at `max`.
#[derive(Debug, Clone)]
pub struct LinearJitter {
    pub step: Duration,
    pub max: Duration,
    random: Arc<dyn RandomSource>,
}

impl LinearJitter {
    pub fn new(step: Duration, max: Duration) -> Self {
        Self {
            step,
            max,
            random: Arc::new(ThreadRandom),
        }
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }
}

impl BackoffStrategy for LinearJitter {
    fn delay(&self, attempt: u32) -> Duration {
        add_jitter(linear(self.step, attempt), self.step, self.random.unit()).min(self.max)
    }
}

/// `min * factor^attempt`, capped at `max`. Attempt 0 yields `min`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential {
    pub min: Duration,
    pub max: Duration,
    pub factor: f64,
}

impl Exponential {
    pub fn new(min: Duration, max: Duration, factor: f64) -> Self {
        Self { min, max, factor }
    }
}

impl BackoffStrategy for Exponential {
    fn delay(&self, attempt: u32) -> Duration {
        exponential(self.min, self.max, self.factor, attempt)
    }
}

/// Exponential delay shifted by a uniform offset in `[-min, +min]`, floored
/// at zero and capped at `max`.
#[derive(Debug, Clone)]
pub struct ExponentialJitter {
    pub min: Duration,
    pub max: Duration,
    pub factor: f64,
    random: Arc<dyn RandomSource>,
}

impl ExponentialJitter {
    pub fn new(min: Duration, max: Duration, factor: f64) -> Self {
        Self {
            min,
            max,
            factor,
            random: Arc::new(ThreadRandom),
        }
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }
}

impl BackoffStrategy for ExponentialJitter {
    fn delay(&self, attempt: u32) -> Duration {
        let base = exponential(self.min, self.max, self.factor, attempt);
        add_jitter(base, self.min, self.random.unit()).min(self.max)
    }
}

fn linear(step: Duration, attempt: u32) -> Duration {
    step.saturating_mul(attempt)
}

fn exponential(min: Duration, max: Duration, factor: f64, attempt: u32) -> Duration {
    let exp = attempt.min(i32::MAX as u32) as i32;
    let nanos = min.as_nanos() as f64 * factor.powi(exp);
    duration_from_nanos(nanos).min(max)
}

/// `next - spread + unit * 2 * spread`, i.e. uniform over `[next - spread, next + spread]`.
fn add_jitter(next: Duration, spread: Duration, unit: f64) -> Duration {
    let spread = spread.as_nanos() as f64;
    duration_from_nanos(next.as_nanos() as f64 - spread + unit * 2.0 * spread)
}

fn duration_from_nanos(nanos: f64) -> Duration {
    if nanos.is_nan() || nanos <= 0.0 {
        Duration::ZERO
    } else if nanos >= u64::MAX as f64 {
        Duration::MAX
    } else {
        Duration::from_nanos(nanos as u64)
    }
}
