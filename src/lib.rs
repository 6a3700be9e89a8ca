//! sarorbit: orbit state-vector interpolation and comparison for SAR/InSAR processing
//!
//! Orbits are held as time-ordered state vectors and can be interpolated at new
//! epochs (linear, Hermite or Lagrange). Two orbits covering the same epochs can
//! be compared per axis (L1 mean and RMS of the position and velocity
//! differences), which is used to check one WGS84 -> SCH interpolation path
//! against another.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use crate::types::{
    InterpolationMethod, OrbitError, OrbitResult, Peg, Planet, ReferenceFrame, SchParams,
    StateVector, Vec3,
};

pub use crate::core::{
    AxisStatistics, ComparisonInputs, ComparisonOutcome, ComparisonParams, DiscrepancyAnalyzer,
    DiscrepancyReport, FrameConverter, InterpolationComparison, Interpolator, Orbit,
    OrbitSummary, UnpackedOrbit,
};

pub use crate::io::{OrbitReader, OrbitWriter};
