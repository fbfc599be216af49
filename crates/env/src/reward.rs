//! Reward collaborators.

use crate::clock::Snapshot;
use crate::scheduler::ActionResult;

pub trait RewardModel: Send {
    /// Clear any per-episode accumulators.
    fn reset(&mut self) {}

    fn reward(&mut self, before: &Snapshot, after: &Snapshot, result: &ActionResult) -> f64;
}

/// Pays one unit per second of accurate nadir imaging.
#[derive(Debug, Clone, Copy)]
pub struct ImagingTimeReward {
    pub per_second: f64,
}

impl Default for ImagingTimeReward {
    fn default() -> Self {
        Self { per_second: 1.0 }
    }
}

impl RewardModel for ImagingTimeReward {
    fn reward(&mut self, before: &Snapshot, after: &Snapshot, _result: &ActionResult) -> f64 {
        self.per_second * (after.state.imaging_seconds - before.state.imaging_seconds)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoReward;

impl RewardModel for NoReward {
    fn reward(&mut self, _before: &Snapshot, _after: &Snapshot, _result: &ActionResult) -> f64 {
        0.0
    }
}
