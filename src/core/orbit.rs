use crate::core::interpolate::Interpolator;
use crate::types::{InterpolationMethod, OrbitError, OrbitResult, ReferenceFrame, StateVector};
use chrono::{DateTime, Duration, Utc};
use ndarray::{Array1, Array2};
use serde::Serialize;

/// Time-ordered collection of state vectors describing one platform trajectory.
///
/// State-vector times are seconds since `reference_time`. Times are strictly
/// increasing; appends that would break the order are rejected instead of
/// being sorted in. `Clone` produces a fully independent copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Orbit {
    reference_time: DateTime<Utc>,
    frame: ReferenceFrame,
    state_vectors: Vec<StateVector>,
}

/// Orbit flattened into aligned arrays for bulk numerical work.
///
/// Row `i` of `positions` and `velocities` belongs to `times[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnpackedOrbit {
    pub times: Array1<f64>,
    pub positions: Array2<f64>,  // n x 3, meters
    pub velocities: Array2<f64>, // n x 3, meters/second
    pub reference_time: DateTime<Utc>,
}

impl UnpackedOrbit {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Human-readable description of an orbit for log output
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitSummary {
    pub frame: ReferenceFrame,
    pub num_state_vectors: usize,
    pub start: Option<DateTime<Utc>>,
    pub stop: Option<DateTime<Utc>>,
}

impl std::fmt::Display for OrbitSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} orbit, number of state vectors: {}",
            self.frame, self.num_state_vectors
        )?;
        if let (Some(start), Some(stop)) = (self.start, self.stop) {
            write!(
                f,
                ", time interval: {} {}",
                start.format("%Y-%m-%d %H:%M:%S%.6f"),
                stop.format("%Y-%m-%d %H:%M:%S%.6f")
            )?;
        }
        Ok(())
    }
}

impl Orbit {
    /// Create an empty orbit
    pub fn new(reference_time: DateTime<Utc>, frame: ReferenceFrame) -> Self {
        Self {
            reference_time,
            frame,
            state_vectors: Vec::new(),
        }
    }

    /// Build an orbit from vectors that are already in strictly increasing time order
    pub fn from_state_vectors<I>(
        reference_time: DateTime<Utc>,
        frame: ReferenceFrame,
        state_vectors: I,
    ) -> OrbitResult<Self>
    where
        I: IntoIterator<Item = StateVector>,
    {
        let mut orbit = Self::new(reference_time, frame);
        for sv in state_vectors {
            orbit.add_state_vector(sv)?;
        }
        Ok(orbit)
    }

    /// Append a state vector; its time must be after the last stored epoch
    pub fn add_state_vector(&mut self, sv: StateVector) -> OrbitResult<()> {
        if !sv.time().is_finite() {
            return Err(OrbitError::InvalidParameter(format!(
                "State vector time must be finite, got {}",
                sv.time()
            )));
        }
        if let Some(last) = self.state_vectors.last() {
            if sv.time() <= last.time() {
                return Err(OrbitError::Ordering {
                    time: sv.time(),
                    last: last.time(),
                });
            }
        }

        self.state_vectors.push(sv);
        Ok(())
    }

    pub fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    pub fn frame(&self) -> ReferenceFrame {
        self.frame
    }

    pub fn state_vectors(&self) -> &[StateVector] {
        &self.state_vectors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StateVector> {
        self.state_vectors.iter()
    }

    pub fn len(&self) -> usize {
        self.state_vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state_vectors.is_empty()
    }

    pub fn first(&self) -> Option<&StateVector> {
        self.state_vectors.first()
    }

    pub fn last(&self) -> Option<&StateVector> {
        self.state_vectors.last()
    }

    pub fn min_time(&self) -> Option<f64> {
        self.first().map(StateVector::time)
    }

    pub fn max_time(&self) -> Option<f64> {
        self.last().map(StateVector::time)
    }

    /// Seconds covered by the orbit (zero with fewer than two vectors)
    pub fn time_span(&self) -> f64 {
        match (self.min_time(), self.max_time()) {
            (Some(min), Some(max)) => max - min,
            _ => 0.0,
        }
    }

    /// Absolute UTC epoch of a relative orbit time, rounded to the microsecond.
    ///
    /// Fails when the epoch falls outside the representable calendar range.
    pub fn epoch_of(&self, time: f64) -> OrbitResult<DateTime<Utc>> {
        let micros = (time * 1e6).round();
        let out_of_range = || {
            OrbitError::InvalidParameter(format!(
                "Orbit time {} s is not representable as a UTC epoch",
                time
            ))
        };

        if !(micros.abs() < i64::MAX as f64) {
            return Err(out_of_range());
        }
        self.reference_time
            .checked_add_signed(Duration::microseconds(micros as i64))
            .ok_or_else(out_of_range)
    }

    /// Relative orbit time of an absolute UTC epoch
    pub fn seconds_since_reference(&self, epoch: DateTime<Utc>) -> f64 {
        seconds_between(self.reference_time, epoch)
    }

    /// Interpolate a state vector at relative time `time`
    pub fn interpolate(&self, time: f64, method: InterpolationMethod) -> OrbitResult<StateVector> {
        Interpolator::new(&self.state_vectors, method)?.interpolate(time)
    }

    /// Interpolate a state vector at an absolute UTC epoch
    pub fn interpolate_at_epoch(
        &self,
        epoch: DateTime<Utc>,
        method: InterpolationMethod,
    ) -> OrbitResult<StateVector> {
        self.interpolate(self.seconds_since_reference(epoch), method)
    }

    /// Interpolate at each of `times` (strictly increasing) and collect the results
    /// into a new orbit sharing this orbit's reference epoch and frame.
    ///
    /// Fails as a whole if any single query fails.
    pub fn resample_at(&self, times: &[f64], method: InterpolationMethod) -> OrbitResult<Orbit> {
        log::debug!(
            "Resampling {} orbit ({} vectors) at {} epochs using {} interpolation",
            self.frame,
            self.len(),
            times.len(),
            method
        );

        let interpolator = Interpolator::new(&self.state_vectors, method)?;
        let resampled = interpolate_all(interpolator, times)?;

        Orbit::from_state_vectors(self.reference_time, self.frame, resampled)
    }

    /// Resample this orbit at the absolute epochs of `other`
    pub fn resample_like(&self, other: &Orbit, method: InterpolationMethod) -> OrbitResult<Orbit> {
        let offset = self.seconds_since_reference(other.reference_time);
        let times: Vec<f64> = other.iter().map(|sv| sv.time() + offset).collect();
        self.resample_at(&times, method)
    }

    /// Copy of this orbit with times expressed against a different reference epoch
    pub fn rebased(&self, reference_time: DateTime<Utc>) -> Orbit {
        let shift = seconds_between(reference_time, self.reference_time);
        Orbit {
            reference_time,
            frame: self.frame,
            state_vectors: self
                .state_vectors
                .iter()
                .map(|sv| sv.with_time(sv.time() + shift))
                .collect(),
        }
    }

    /// Flatten into aligned time / position / velocity arrays
    pub fn unpack(&self) -> UnpackedOrbit {
        let n = self.len();
        let mut times = Array1::zeros(n);
        let mut positions = Array2::zeros((n, 3));
        let mut velocities = Array2::zeros((n, 3));

        for (i, sv) in self.state_vectors.iter().enumerate() {
            times[i] = sv.time();
            let (p, v) = (sv.position(), sv.velocity());
            for axis in 0..3 {
                positions[[i, axis]] = p[axis];
                velocities[[i, axis]] = v[axis];
            }
        }

        UnpackedOrbit {
            times,
            positions,
            velocities,
            reference_time: self.reference_time,
        }
    }

    pub fn summary(&self) -> OrbitSummary {
        OrbitSummary {
            frame: self.frame,
            num_state_vectors: self.len(),
            start: self.min_time().and_then(|t| self.epoch_of(t).ok()),
            stop: self.max_time().and_then(|t| self.epoch_of(t).ok()),
        }
    }
}

impl std::ops::Index<usize> for Orbit {
    type Output = StateVector;

    fn index(&self, index: usize) -> &Self::Output {
        &self.state_vectors[index]
    }
}

impl<'a> IntoIterator for &'a Orbit {
    type Item = &'a StateVector;
    type IntoIter = std::slice::Iter<'a, StateVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

#[cfg(feature = "parallel")]
fn interpolate_all(interpolator: Interpolator<'_>, times: &[f64]) -> OrbitResult<Vec<StateVector>> {
    use rayon::prelude::*;

    times
        .par_iter()
        .map(|&t| interpolator.interpolate(t))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn interpolate_all(
    mut interpolator: Interpolator<'_>,
    times: &[f64],
) -> OrbitResult<Vec<StateVector>> {
    times
        .iter()
        .map(|&t| interpolator.interpolate_next(t))
        .collect()
}
