//! Time-tagged state vector series: lookup, interpolation and resampling

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::core::propagate::{propagate_with_step, DEFAULT_STEP_SECONDS};
use crate::core::vector::Vector3;
use crate::types::{SarError, SarResult, StateLoc, StateVector, StateVectorSeries};

/// Default window beyond the ends of a series in which propagation is allowed (s)
pub const DEFAULT_MAX_EXTRAPOLATION: f64 = 600.0;

impl StateVectorSeries {
    /// Empty series with its epoch (year, day of year, seconds of day)
    pub fn new(year: i32, julian_day: i32, second: f64) -> Self {
        Self {
            year,
            julian_day,
            second,
            vectors: Vec::new(),
        }
    }

    /// New series with one more vector appended; times must strictly increase
    pub fn with_vector(&self, time: f64, vec: StateVector) -> SarResult<Self> {
        if let Some(last) = self.vectors.last() {
            if !(time > last.time) {
                return Err(SarError::Orbit(format!(
                    "State vector time {} does not follow previous time {}",
                    time, last.time
                )));
            }
        }
        let mut next = self.clone();
        next.vectors.push(StateLoc { time, vec });
        Ok(next)
    }

    /// Check the strictly-increasing time invariant
    pub fn validate(&self) -> SarResult<()> {
        if self.vectors.is_empty() {
            return Err(SarError::Orbit("State vector series is empty".to_string()));
        }
        for pair in self.vectors.windows(2) {
            if !(pair[1].time > pair[0].time) {
                return Err(SarError::Orbit(format!(
                    "State vector times not strictly increasing: {} then {}",
                    pair[0].time, pair[1].time
                )));
            }
        }
        Ok(())
    }

    /// UTC instant of the series epoch
    pub fn epoch_datetime(&self) -> SarResult<DateTime<Utc>> {
        let date = NaiveDate::from_yo_opt(self.year, self.julian_day as u32).ok_or_else(|| {
            SarError::Time(format!(
                "Invalid state vector epoch: year {} day {}",
                self.year, self.julian_day
            ))
        })?;
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| SarError::Time("Invalid state vector epoch".to_string()))?;
        let offset = Duration::microseconds((self.second * 1e6).round() as i64);
        Ok(DateTime::<Utc>::from_naive_utc_and_offset(midnight, Utc) + offset)
    }

    /// Time span covered by the series
    pub fn time_range(&self) -> Option<(f64, f64)> {
        match (self.vectors.first(), self.vectors.last()) {
            (Some(first), Some(last)) => Some((first.time, last.time)),
            _ => None,
        }
    }

    /// State vector at `time` with the default extrapolation window
    pub fn get_state_vector(&self, time: f64) -> SarResult<StateVector> {
        self.get_state_vector_with(time, DEFAULT_MAX_EXTRAPOLATION, DEFAULT_STEP_SECONDS)
    }

    /// State vector at `time`: cubic Hermite interpolation between bracketing
    /// vectors, propagation from the nearest vector outside the series.
    pub fn get_state_vector_with(
        &self,
        time: f64,
        max_extrapolation: f64,
        step: f64,
    ) -> SarResult<StateVector> {
        let (first, last) = self
            .time_range()
            .ok_or_else(|| SarError::Orbit("State vector series is empty".to_string()))?;

        if self.vectors.len() >= 2 && time >= first && time <= last {
            let idx = self
                .vectors
                .partition_point(|sv| sv.time <= time)
                .clamp(1, self.vectors.len() - 1);
            return Ok(hermite(&self.vectors[idx - 1], &self.vectors[idx], time));
        }

        let nearest = if time < first {
            &self.vectors[0]
        } else if time > last {
            &self.vectors[self.vectors.len() - 1]
        } else {
            // single vector series
            &self.vectors[0]
        };

        let gap = (time - nearest.time).abs();
        if gap > max_extrapolation {
            return Err(SarError::Orbit(format!(
                "Time {:.3}s is {:.1}s outside state vectors [{:.3}, {:.3}] (limit {:.1}s)",
                time, gap, first, last, max_extrapolation
            )));
        }
        if gap > 0.0 {
            log::debug!("Propagating state vector {:.3}s from t={:.3}", gap, nearest.time);
        }
        Ok(propagate_with_step(&nearest.vec, nearest.time, time, step))
    }

    /// New series of `count` vectors evenly spaced over [start, end]
    pub fn resample(&self, start: f64, end: f64, count: usize) -> SarResult<Self> {
        if count < 2 || !(end > start) {
            return Err(SarError::Orbit(format!(
                "Cannot resample series over [{}, {}] with {} vectors",
                start, end, count
            )));
        }
        let dt = (end - start) / (count - 1) as f64;
        let mut out = Self::new(self.year, self.julian_day, self.second);
        for i in 0..count {
            let t = start + i as f64 * dt;
            let vec = self.get_state_vector(t)?;
            out.vectors.push(StateLoc { time: t, vec });
        }
        log::info!("Resampled state vectors: {} vectors over {:.1}s", count, end - start);
        Ok(out)
    }
}

/// Look up the state vector of a series at `time`
pub fn get_state_vector(series: &StateVectorSeries, time: f64) -> SarResult<StateVector> {
    series.get_state_vector(time)
}

fn hermite(a: &StateLoc, b: &StateLoc, time: f64) -> StateVector {
    let h = b.time - a.time;
    let s = (time - a.time) / h;
    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    let d00 = 6.0 * s2 - 6.0 * s;
    let d10 = 3.0 * s2 - 4.0 * s + 1.0;
    let d01 = -6.0 * s2 + 6.0 * s;
    let d11 = 3.0 * s2 - 2.0 * s;

    let (p0, v0, p1, v1) = (a.vec.pos, a.vec.vel, b.vec.pos, b.vec.vel);
    let pos: Vector3 = p0 * h00 + v0 * (h10 * h) + p1 * h01 + v1 * (h11 * h);
    let vel: Vector3 = (p0 * d00 + p1 * d01) * (1.0 / h) + v0 * d10 + v1 * d11;
    StateVector { pos, vel }
}
