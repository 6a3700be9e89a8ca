use chrono::{DateTime, Duration, Utc};
use sarorbit::{
    ComparisonInputs, ComparisonParams, InterpolationComparison, InterpolationMethod, Orbit,
    OrbitResult, Peg, ReferenceFrame, SchParams, StateVector,
};

// Sentinel-1-like circular orbit
const ORBIT_RADIUS: f64 = 7_070_000.0; // meters
const ORBIT_PERIOD: f64 = 5940.0; // seconds

fn test_epoch() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2020-01-03T17:08:15Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn circular_state(t: f64) -> StateVector {
    let omega = 2.0 * std::f64::consts::PI / ORBIT_PERIOD;
    let angle = omega * t;
    StateVector::new(
        t,
        [ORBIT_RADIUS * angle.cos(), ORBIT_RADIUS * angle.sin(), 0.0],
        [
            -ORBIT_RADIUS * omega * angle.sin(),
            ORBIT_RADIUS * omega * angle.cos(),
            0.0,
        ],
    )
}

fn circular_orbit(reference_time: DateTime<Utc>, frame: ReferenceFrame, times: &[f64]) -> Orbit {
    Orbit::from_state_vectors(reference_time, frame, times.iter().map(|&t| circular_state(t)))
        .unwrap()
}

/// Sparse vectors every 30 s, line epochs every 0.5 s stored against a later
/// reference epoch, and the exact trajectory at the line epochs as reference.
fn inputs() -> ComparisonInputs {
    let sparse: Vec<f64> = (0..=10).map(|i| i as f64 * 30.0).collect();

    let line_reference = test_epoch() + Duration::seconds(20);
    let line_times: Vec<f64> = (0..500).map(|i| i as f64 * 0.5).collect();
    let absolute_times: Vec<f64> = line_times.iter().map(|t| t + 20.0).collect();

    let reference_sch = Orbit::from_state_vectors(
        line_reference,
        ReferenceFrame::Sch,
        line_times
            .iter()
            .zip(&absolute_times)
            .map(|(&t, &abs)| circular_state(abs).with_time(t)),
    )
    .unwrap();

    ComparisonInputs {
        original: circular_orbit(test_epoch(), ReferenceFrame::Wgs84, &sparse),
        line_by_line: reference_sch.clone(),
        reference_sch,
    }
}

/// Stand-in for the external conversion service: relabels without moving
fn relabel(orbit: &Orbit, _params: &SchParams) -> OrbitResult<Orbit> {
    Orbit::from_state_vectors(
        orbit.reference_time(),
        ReferenceFrame::Sch,
        orbit.iter().copied(),
    )
}

fn params(method: InterpolationMethod) -> ComparisonParams {
    ComparisonParams::new(
        method,
        SchParams {
            peg: Peg {
                latitude: 34.2,
                longitude: -118.1,
                heading: -166.0,
            },
            average_height: 700_000.0,
            ..SchParams::default()
        },
    )
}

#[test]
fn test_hermite_beats_linear_on_curved_orbit() {
    let _ = env_logger::builder().is_test(true).try_init();
    let inputs = inputs();

    let linear = InterpolationComparison::new(params(InterpolationMethod::Linear))
        .run(&inputs, &relabel)
        .unwrap()
        .report;
    let hermite = InterpolationComparison::new(params(InterpolationMethod::Hermite))
        .run(&inputs, &relabel)
        .unwrap()
        .report;

    println!("Linear:\n{}", linear);
    println!("Hermite:\n{}", hermite);

    assert_eq!(linear.samples, 500);
    assert_eq!(hermite.samples, 500);

    // Chord error of a 30 s linear step is hundreds of meters
    assert!(linear.position.rms[0] > 100.0);
    for axis in 0..2 {
        assert!(hermite.position.rms[axis] < 0.1, "axis {}: {}", axis, hermite.position.rms[axis]);
        assert!(hermite.velocity.rms[axis] < 0.05, "axis {}: {}", axis, hermite.velocity.rms[axis]);
        assert!(hermite.position.l1_mean[axis] <= hermite.position.rms[axis] + 1e-12);
    }
    assert_eq!(hermite.position.rms[2], 0.0);
    assert!(hermite.max_time_offset < 1e-6);
}

#[test]
fn test_lagrange_path() {
    let outcome = InterpolationComparison::new(params(InterpolationMethod::Lagrange { points: 8 }))
        .run(&inputs(), &relabel)
        .unwrap();

    assert_eq!(outcome.converted.len(), 11);
    assert_eq!(outcome.converted.frame(), ReferenceFrame::Sch);
    assert_eq!(outcome.resampled.len(), 500);
    // Resampled orbit stays on the converted orbit's time base
    assert_eq!(outcome.resampled.reference_time(), test_epoch());
    assert_eq!(outcome.resampled.min_time(), Some(20.0));

    for axis in 0..2 {
        assert!(outcome.report.position.rms[axis] < 0.01);
    }
}

#[test]
fn test_inputs_are_not_modified() {
    let inputs = inputs();
    let before = inputs.clone();

    InterpolationComparison::new(params(InterpolationMethod::Hermite))
        .run(&inputs, &relabel)
        .unwrap();

    assert_eq!(inputs.original, before.original);
    assert_eq!(inputs.line_by_line, before.line_by_line);
    assert_eq!(inputs.reference_sch, before.reference_sch);
}
