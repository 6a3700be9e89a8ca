use crate::core::discrepancy::{DiscrepancyAnalyzer, DiscrepancyReport};
use crate::core::orbit::Orbit;
use crate::types::{InterpolationMethod, OrbitError, OrbitResult, ReferenceFrame, SchParams};
use serde::{Deserialize, Serialize};

/// WGS84 -> SCH orbit conversion service.
///
/// The conversion itself lives outside this crate; implementations must
/// return a new orbit labelled [`ReferenceFrame::Sch`].
pub trait FrameConverter {
    fn convert_to_sch(&self, orbit: &Orbit, params: &SchParams) -> OrbitResult<Orbit>;
}

impl<F> FrameConverter for F
where
    F: Fn(&Orbit, &SchParams) -> OrbitResult<Orbit>,
{
    fn convert_to_sch(&self, orbit: &Orbit, params: &SchParams) -> OrbitResult<Orbit> {
        self(orbit, params)
    }
}

/// Parameters for comparing the two line-by-line SCH interpolation paths
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonParams {
    /// Method used to resample the converted sparse orbit at line epochs
    pub method: InterpolationMethod,
    pub sch: SchParams,
}

impl ComparisonParams {
    pub fn new(method: InterpolationMethod, sch: SchParams) -> Self {
        Self { method, sch }
    }
}

/// Orbits taken from an earlier processing run
#[derive(Debug, Clone)]
pub struct ComparisonInputs {
    /// Sparse WGS84 state vectors delivered with the sensor data
    pub original: Orbit,
    /// Line-by-line WGS84 orbit; only its epochs are used
    pub line_by_line: Orbit,
    /// Line-by-line SCH orbit produced by converting `line_by_line`
    pub reference_sch: Orbit,
}

/// Everything the comparison produced
#[derive(Debug, Clone)]
pub struct ComparisonOutcome {
    /// `original` converted to SCH
    pub converted: Orbit,
    /// `converted` interpolated at the line-by-line epochs
    pub resampled: Orbit,
    pub report: DiscrepancyReport,
}

/// Compares two ways of obtaining a line-by-line SCH orbit:
///
/// 1. sparse WGS84 -> line-by-line WGS84 -> line-by-line SCH (`reference_sch`)
/// 2. sparse WGS84 -> sparse SCH -> line-by-line SCH (computed here)
pub struct InterpolationComparison {
    params: ComparisonParams,
}

impl InterpolationComparison {
    pub fn new(params: ComparisonParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ComparisonParams {
        &self.params
    }

    /// Run the comparison; any failing step aborts the whole run
    pub fn run<C>(&self, inputs: &ComparisonInputs, converter: &C) -> OrbitResult<ComparisonOutcome>
    where
        C: FrameConverter + ?Sized,
    {
        log::info!("Original state vectors: {}", inputs.original.summary());
        log::info!("Line-by-line interpolated: {}", inputs.line_by_line.summary());
        log::info!("Line-by-line reference: {}", inputs.reference_sch.summary());

        if inputs.original.frame() != ReferenceFrame::Wgs84 {
            log::warn!(
                "Original orbit is labelled {}, expected {}",
                inputs.original.frame(),
                ReferenceFrame::Wgs84
            );
        }

        log::debug!(
            "Converting to SCH with peg ({:.6}, {:.6}, {:.6}) deg, average height {:.3} m",
            self.params.sch.peg.latitude,
            self.params.sch.peg.longitude,
            self.params.sch.peg.heading,
            self.params.sch.average_height
        );
        let converted = converter.convert_to_sch(&inputs.original, &self.params.sch)?;
        if converted.frame() != ReferenceFrame::Sch {
            return Err(OrbitError::Conversion(format!(
                "Converter returned a {} orbit, expected {}",
                converted.frame(),
                ReferenceFrame::Sch
            )));
        }

        log::info!("Original vectors converted: {}", converted.summary());
        if let Some(first) = converted.first() {
            log::info!("First converted state vector: {}", first);
        }

        let resampled = converted.resample_like(&inputs.line_by_line, self.params.method)?;
        log::info!(
            "Resampled converted orbit at {} line epochs using {} interpolation",
            resampled.len(),
            self.params.method
        );

        let report = DiscrepancyAnalyzer::compare(&inputs.reference_sch, &resampled)?;
        for line in report.to_string().lines() {
            log::info!("{}", line);
        }

        Ok(ComparisonOutcome {
            converted,
            resampled,
            report,
        })
    }
}
