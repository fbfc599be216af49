//! Window search: coarse sampling of the predicate margin plus bisection.

use serde::Serialize;
use tasking_config::ForecastConfig;
use tasking_dynamics::{GroundLocation, LocationId};

use crate::ForecastError;
use crate::predicate::{Trajectory, VisibilityPredicate};

/// Half-open interval `[open_time, close_time)` during which a location is visible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OpportunityWindow {
    pub location_id: LocationId,
    pub open_time: f64,
    pub close_time: f64,
}

impl OpportunityWindow {
    pub fn duration(&self) -> f64 {
        self.close_time - self.open_time
    }

    pub fn contains(&self, t_s: f64) -> bool {
        self.open_time <= t_s && t_s < self.close_time
    }
}

/// Sampling parameters of the window search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSettings {
    pub coarse_step_s: f64,
    pub tolerance_s: f64,
    pub horizon_s: f64,
}

impl ForecastSettings {
    fn validate(&self) -> Result<(), ForecastError> {
        for (name, value) in [
            ("coarse_step_s", self.coarse_step_s),
            ("tolerance_s", self.tolerance_s),
            ("horizon_s", self.horizon_s),
        ] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ForecastError::InvalidSettings(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl From<&ForecastConfig> for ForecastSettings {
    fn from(config: &ForecastConfig) -> Self {
        Self {
            coarse_step_s: config.coarse_step_s,
            tolerance_s: config.tolerance_s,
            horizon_s: config.horizon_s,
        }
    }
}

/// Read-only view of the currently open window, used to gate actions.
pub trait WindowLookup {
    /// The window containing `t_s` for `location`, if one is open.
    ///
    /// `open_time` is reported as `t_s`; only the close time is meaningful for gating.
    fn active_window(
        &self,
        location: LocationId,
        t_s: f64,
    ) -> Result<Option<OpportunityWindow>, ForecastError>;
}

/// Computes opportunity windows for a fixed set of ground locations.
///
/// Holds no search state: every query recomputes from the trajectory.
pub struct OpportunityForecaster {
    trajectory: Box<dyn Trajectory>,
    predicate: Box<dyn VisibilityPredicate>,
    locations: Vec<GroundLocation>,
    settings: ForecastSettings,
}

impl OpportunityForecaster {
    pub fn new(
        trajectory: Box<dyn Trajectory>,
        predicate: Box<dyn VisibilityPredicate>,
        locations: Vec<GroundLocation>,
        settings: ForecastSettings,
    ) -> Result<Self, ForecastError> {
        settings.validate()?;
        Ok(Self {
            trajectory,
            predicate,
            locations,
            settings,
        })
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    pub fn locations(&self) -> &[GroundLocation] {
        &self.locations
    }

    pub fn location(&self, id: LocationId) -> Result<&GroundLocation, ForecastError> {
        self.locations
            .get(id)
            .ok_or(ForecastError::UnknownLocation {
                id,
                known: self.locations.len(),
            })
    }

    /// Predicate margin for `location` at `t_s`.
    pub fn margin(&self, location: &GroundLocation, t_s: f64) -> Result<f64, ForecastError> {
        let position = self.trajectory.position_ecef(t_s)?;
        Ok(self.predicate.margin(&position, location))
    }

    /// Lazy iterator over the windows of `location` after `after_time`, up to the horizon.
    pub fn window_iter(
        &self,
        location: LocationId,
        after_time: f64,
    ) -> Result<WindowIter<'_>, ForecastError> {
        let loc = self.location(location)?;
        Ok(WindowIter {
            forecaster: self,
            location: loc,
            location_id: location,
            after_time,
            end_time: after_time + self.settings.horizon_s,
            sample: 0,
            margin: None,
            finished: false,
        })
    }

    /// The next `count` windows of `location`, ordered by open time.
    pub fn windows(
        &self,
        location: LocationId,
        after_time: f64,
        count: usize,
    ) -> Result<Vec<OpportunityWindow>, ForecastError> {
        let iter = self.window_iter(location, after_time)?;
        if count == 0 {
            return Ok(Vec::new());
        }
        iter.take(count).collect()
    }

    /// The next `count` windows of every location, indexed by location id.
    pub fn next_windows(
        &self,
        after_time: f64,
        count: usize,
    ) -> Result<Vec<Vec<OpportunityWindow>>, ForecastError> {
        let all: Vec<Vec<OpportunityWindow>> = (0..self.locations.len())
            .map(|id| self.windows(id, after_time, count))
            .collect::<Result<_, _>>()?;
        log::debug!(
            "forecast {} windows across {} locations after t = {:.1} s",
            all.iter().map(Vec::len).sum::<usize>(),
            all.len(),
            after_time
        );
        Ok(all)
    }

    fn sample_time(&self, after_time: f64, end_time: f64, index: usize) -> f64 {
        (after_time + index as f64 * self.settings.coarse_step_s).min(end_time)
    }

    /// Shrink `(lo, hi]` around the sign change of the margin. `hi_visible` is the
    /// side whose sign is reported.
    fn refine(
        &self,
        location: &GroundLocation,
        mut lo: f64,
        mut hi: f64,
        hi_visible: bool,
    ) -> Result<f64, ForecastError> {
        while hi - lo > self.settings.tolerance_s {
            let mid = 0.5 * (lo + hi);
            if (self.margin(location, mid)? > 0.0) == hi_visible {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        Ok(hi)
    }
}

impl WindowLookup for OpportunityForecaster {
    fn active_window(
        &self,
        location: LocationId,
        t_s: f64,
    ) -> Result<Option<OpportunityWindow>, ForecastError> {
        let loc = self.location(location)?;
        if self.margin(loc, t_s)? <= 0.0 {
            return Ok(None);
        }
        self.window_iter(location, t_s)?.next().transpose()
    }
}

/// Restartable window search for one location.
///
/// The sample grid is anchored at `after_time`, so repeated searches from the same
/// time visit the same instants and return identical windows.
pub struct WindowIter<'a> {
    forecaster: &'a OpportunityForecaster,
    location: &'a GroundLocation,
    location_id: LocationId,
    after_time: f64,
    end_time: f64,
    sample: usize,
    /// Margin at the current sample, once evaluated.
    margin: Option<f64>,
    finished: bool,
}

impl WindowIter<'_> {
    fn time_at(&self, index: usize) -> f64 {
        self.forecaster
            .sample_time(self.after_time, self.end_time, index)
    }

    fn margin_at(&self, index: usize) -> Result<f64, ForecastError> {
        self.forecaster.margin(self.location, self.time_at(index))
    }

    fn current_margin(&mut self) -> Result<f64, ForecastError> {
        match self.margin {
            Some(margin) => Ok(margin),
            None => {
                let margin = self.margin_at(self.sample)?;
                self.margin = Some(margin);
                Ok(margin)
            }
        }
    }

    /// Advance the cursor until the margin changes sign relative to `visible`.
    ///
    /// Returns the refined boundary, or `None` when the horizon ends first.
    fn seek_boundary(&mut self, visible: bool) -> Result<Option<f64>, ForecastError> {
        loop {
            let t_now = self.time_at(self.sample);
            if t_now >= self.end_time {
                return Ok(None);
            }
            let next_margin = self.margin_at(self.sample + 1)?;
            let t_next = self.time_at(self.sample + 1);
            self.sample += 1;
            self.margin = Some(next_margin);
            if (next_margin > 0.0) != visible {
                let boundary = self
                    .forecaster
                    .refine(self.location, t_now, t_next, !visible)?;
                return Ok(Some(boundary));
            }
        }
    }

    fn next_window(&mut self) -> Result<Option<OpportunityWindow>, ForecastError> {
        let open_time = if self.current_margin()? > 0.0 {
            // Only the first sample can already be visible; later searches resume
            // from a non-visible sample after the previous close.
            self.time_at(self.sample)
        } else {
            match self.seek_boundary(false)? {
                Some(open) if open < self.end_time => open,
                _ => {
                    self.finished = true;
                    return Ok(None);
                }
            }
        };
        let close_time = match self.seek_boundary(true)? {
            Some(close) => close,
            None => {
                self.finished = true;
                self.end_time
            }
        };
        Ok(Some(OpportunityWindow {
            location_id: self.location_id,
            open_time,
            close_time,
        }))
    }
}

impl Iterator for WindowIter<'_> {
    type Item = Result<OpportunityWindow, ForecastError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_window() {
            Ok(Some(window)) => Some(Ok(window)),
            Ok(None) => None,
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}
