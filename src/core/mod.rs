//! Core orbit processing modules

pub mod interpolate;
pub mod orbit;
pub mod discrepancy;
pub mod comparison;

// Re-export main types
pub use interpolate::{Interpolator, bracket_index};
pub use orbit::{Orbit, OrbitSummary, UnpackedOrbit};
pub use discrepancy::{AxisStatistics, DiscrepancyAnalyzer, DiscrepancyReport};
pub use comparison::{
    ComparisonInputs, ComparisonOutcome, ComparisonParams, FrameConverter, InterpolationComparison,
};
