use rand::Rng;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Source of growth factors. Implementations must return a value in `[low, high]`.
pub trait GrowthSampler: Send + Sync {
    fn sample(&self, low: f64, high: f64) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSampler;

impl GrowthSampler for ThreadRngSampler {
    fn sample(&self, low: f64, high: f64) -> f64 {
        rand::thread_rng().gen_range(low..=high)
    }
}

/// Picks the same relative position inside every range: 0.0 is `low`, 1.0 is `high`.
#[derive(Debug, Clone, Copy)]
pub struct FixedPositionSampler(pub f64);

impl GrowthSampler for FixedPositionSampler {
    fn sample(&self, low: f64, high: f64) -> f64 {
        let t = self.0.clamp(0.0, 1.0);
        if t >= 1.0 {
            return high;
        }
        low + (high - low) * t
    }
}

/// Replays positions in order, then repeats the last one.
#[derive(Debug)]
pub struct SequenceSampler {
    positions: Mutex<VecDeque<f64>>,
    last: Mutex<f64>,
}

impl SequenceSampler {
    pub fn new(positions: impl IntoIterator<Item = f64>) -> Self {
        Self {
            positions: Mutex::new(positions.into_iter().collect()),
            last: Mutex::new(0.5),
        }
    }
}

impl GrowthSampler for SequenceSampler {
    fn sample(&self, low: f64, high: f64) -> f64 {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let next = self
            .positions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(*last);
        *last = next;
        FixedPositionSampler(next).sample(low, high)
    }
}
