use crate::core::orbit::{Orbit, UnpackedOrbit};
use crate::types::{OrbitError, OrbitResult, Vec3};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Per-axis difference statistics for one quantity (position or velocity)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisStatistics {
    /// mean(|a - b|) per axis
    pub l1_mean: Vec3,
    /// sqrt(mean((a - b)^2)) per axis
    pub rms: Vec3,
}

impl AxisStatistics {
    pub fn is_zero(&self) -> bool {
        self.l1_mean.iter().chain(self.rms.iter()).all(|&v| v == 0.0)
    }
}

/// Summary of how far two pointwise-aligned orbits disagree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscrepancyReport {
    pub samples: usize,
    pub position: AxisStatistics, // meters
    pub velocity: AxisStatistics, // meters/second
    /// Largest |t_reference - t_candidate| over paired rows, in seconds
    pub max_time_offset: f64,
}

impl std::fmt::Display for DiscrepancyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Samples compared: {}", self.samples)?;
        writeln!(f, "Position Difference stats")?;
        writeln!(f, "L1 mean in meters: {}", format_axes(&self.position.l1_mean))?;
        writeln!(f, "RMS in meters: {}", format_axes(&self.position.rms))?;
        writeln!(f, "Velocity Difference stats")?;
        writeln!(f, "L1 mean in meters/sec: {}", format_axes(&self.velocity.l1_mean))?;
        write!(f, "RMS in meters/sec: {}", format_axes(&self.velocity.rms))
    }
}

fn format_axes(values: &Vec3) -> String {
    format!("[{:.6e}, {:.6e}, {:.6e}]", values[0], values[1], values[2])
}

/// Compares two orbits that are aligned row by row.
///
/// Rows are paired by index, never re-matched by time; producing series that
/// describe the same epochs is up to the caller.
pub struct DiscrepancyAnalyzer;

impl DiscrepancyAnalyzer {
    /// Compare `candidate` against `reference`
    pub fn compare(reference: &Orbit, candidate: &Orbit) -> OrbitResult<DiscrepancyReport> {
        if reference.frame() != candidate.frame() {
            log::warn!(
                "Comparing orbits in different frames: reference is {}, candidate is {}",
                reference.frame(),
                candidate.frame()
            );
        }

        let mut report = Self::compare_unpacked(&reference.unpack(), &candidate.unpack())?;

        // Time columns are relative to each orbit's own reference epoch
        if reference.reference_time() != candidate.reference_time() {
            let rebased = candidate.rebased(reference.reference_time());
            report.max_time_offset = max_abs_difference(
                reference.iter().map(|sv| sv.time()),
                rebased.iter().map(|sv| sv.time()),
            );
        }

        Ok(report)
    }

    /// Compare two pre-unpacked series
    pub fn compare_unpacked(
        reference: &UnpackedOrbit,
        candidate: &UnpackedOrbit,
    ) -> OrbitResult<DiscrepancyReport> {
        if reference.len() != candidate.len() {
            return Err(OrbitError::LengthMismatch {
                reference: reference.len(),
                candidate: candidate.len(),
            });
        }
        if reference.is_empty() {
            return Err(OrbitError::EmptyOrbit {
                required: 1,
                available: 0,
            });
        }

        let position = axis_statistics(&reference.positions, &candidate.positions)?;
        let velocity = axis_statistics(&reference.velocities, &candidate.velocities)?;
        let max_time_offset = max_abs_difference(
            reference.times.iter().copied(),
            candidate.times.iter().copied(),
        );

        let report = DiscrepancyReport {
            samples: reference.len(),
            position,
            velocity,
            max_time_offset,
        };

        log::debug!(
            "Discrepancy over {} samples: position RMS {:?} m, velocity RMS {:?} m/s",
            report.samples,
            report.position.rms,
            report.velocity.rms
        );

        Ok(report)
    }
}

fn axis_statistics(reference: &Array2<f64>, candidate: &Array2<f64>) -> OrbitResult<AxisStatistics> {
    if reference.dim() != candidate.dim() || reference.ncols() != 3 {
        return Err(OrbitError::InvalidFormat(format!(
            "Expected two n x 3 arrays, got {:?} and {:?}",
            reference.dim(),
            candidate.dim()
        )));
    }

    let diff = reference - candidate;

    let l1_mean = diff
        .mapv(f64::abs)
        .mean_axis(Axis(0))
        .ok_or(OrbitError::EmptyOrbit {
            required: 1,
            available: 0,
        })?;
    let rms = (&diff * &diff)
        .mean_axis(Axis(0))
        .ok_or(OrbitError::EmptyOrbit {
            required: 1,
            available: 0,
        })?
        .mapv(f64::sqrt);

    Ok(AxisStatistics {
        l1_mean: [l1_mean[0], l1_mean[1], l1_mean[2]],
        rms: [rms[0], rms[1], rms[2]],
    })
}

fn max_abs_difference<A, B>(a: A, b: B) -> f64
where
    A: Iterator<Item = f64>,
    B: Iterator<Item = f64>,
{
    a.zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReferenceFrame, StateVector};
    use approx::assert_abs_diff_eq;
    use chrono::{DateTime, Utc};

    fn test_epoch() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2008-06-15T04:21:30Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn orbit_from(vectors: Vec<StateVector>) -> Orbit {
        Orbit::from_state_vectors(test_epoch(), ReferenceFrame::Sch, vectors).unwrap()
    }

    fn track(n: usize) -> Orbit {
        orbit_from(
            (0..n)
                .map(|i| {
                    let t = i as f64;
                    StateVector::new(t, [t, 2.0 * t, -t], [1.0, 2.0, -1.0])
                })
                .collect(),
        )
    }

    #[test]
    fn test_self_comparison_is_zero() {
        let orbit = track(8);
        let report = DiscrepancyAnalyzer::compare(&orbit, &orbit).unwrap();

        assert_eq!(report.samples, 8);
        assert!(report.position.is_zero());
        assert!(report.velocity.is_zero());
        assert_eq!(report.max_time_offset, 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        let result = DiscrepancyAnalyzer::compare(&track(5), &track(6));
        assert!(matches!(
            result,
            Err(OrbitError::LengthMismatch { reference: 5, candidate: 6 })
        ));
    }

    #[test]
    fn test_empty_inputs() {
        let empty = Orbit::new(test_epoch(), ReferenceFrame::Sch);
        let result = DiscrepancyAnalyzer::compare(&empty, &empty);
        assert!(matches!(result, Err(OrbitError::EmptyOrbit { .. })));
    }

    #[test]
    fn test_known_offsets() {
        let reference = orbit_from(vec![
            StateVector::new(0.0, [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
            StateVector::new(1.0, [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
        ]);
        // x differs by +3 and -1, y by 4 everywhere, z untouched
        let candidate = orbit_from(vec![
            StateVector::new(0.0, [3.0, 4.0, 0.0], [0.5, 0.0, 0.0]),
            StateVector::new(1.0, [-1.0, 4.0, 0.0], [-0.5, 0.0, 0.0]),
        ]);

        let report = DiscrepancyAnalyzer::compare(&reference, &candidate).unwrap();

        assert_abs_diff_eq!(report.position.l1_mean[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(report.position.rms[0], 5.0_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(report.position.l1_mean[1], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(report.position.rms[1], 4.0, epsilon = 1e-12);
        assert_eq!(report.position.l1_mean[2], 0.0);
        assert_eq!(report.position.rms[2], 0.0);

        assert_abs_diff_eq!(report.velocity.l1_mean[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(report.velocity.rms[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_time_offset_across_references() {
        let reference = track(3);
        let shifted = reference.rebased(test_epoch() + chrono::Duration::seconds(2));

        // Same epochs, different time base: no offset
        let report = DiscrepancyAnalyzer::compare(&reference, &shifted).unwrap();
        assert_abs_diff_eq!(report.max_time_offset, 0.0, epsilon = 1e-9);
        assert!(report.position.is_zero());
    }

    #[test]
    fn test_report_display() {
        let orbit = track(3);
        let text = DiscrepancyAnalyzer::compare(&orbit, &orbit).unwrap().to_string();
        assert!(text.contains("Position Difference stats"));
        assert!(text.contains("RMS in meters/sec"));
    }
}
