use serde::{Deserialize, Serialize};

/// Cartesian 3-vector ([x, y, z] or [s, c, h] depending on the frame)
pub type Vec3 = [f64; 3];

/// Coordinate frame an orbit's state vectors are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceFrame {
    /// Earth-centered, earth-fixed WGS84 Cartesian coordinates
    Wgs84,
    /// Peg-relative along-track / cross-track / height coordinates
    Sch,
}

impl std::fmt::Display for ReferenceFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceFrame::Wgs84 => write!(f, "WGS84"),
            ReferenceFrame::Sch => write!(f, "SCH"),
        }
    }
}

impl std::str::FromStr for ReferenceFrame {
    type Err = OrbitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "WGS84" | "XYZ" => Ok(ReferenceFrame::Wgs84),
            "SCH" => Ok(ReferenceFrame::Sch),
            other => Err(OrbitError::InvalidFormat(format!(
                "Unknown reference frame: {}",
                other
            ))),
        }
    }
}

/// Orbit state vector
///
/// `time` is in seconds relative to the reference epoch of the orbit that
/// owns the vector. Fields are private so a vector cannot change once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    time: f64,
    position: Vec3, // meters
    velocity: Vec3, // meters/second
}

impl StateVector {
    pub fn new(time: f64, position: Vec3, velocity: Vec3) -> Self {
        Self {
            time,
            position,
            velocity,
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Same position and velocity, expressed against a different time base
    pub fn with_time(&self, time: f64) -> Self {
        Self { time, ..*self }
    }
}

impl std::fmt::Display for StateVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "t={:.6} pos=[{:.3}, {:.3}, {:.3}] vel=[{:.6}, {:.6}, {:.6}]",
            self.time,
            self.position[0],
            self.position[1],
            self.position[2],
            self.velocity[0],
            self.velocity[1],
            self.velocity[2]
        )
    }
}

/// Interpolation scheme used to evaluate an orbit between stored epochs.
///
/// There is intentionally no default: every call site names the method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationMethod {
    /// Componentwise blend of the two bracketing vectors
    Linear,
    /// Cubic Hermite on the bracketing pair, using velocity as the derivative
    Hermite,
    /// Lagrange polynomial through `points` vectors around the query time
    Lagrange { points: usize },
}

impl std::fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpolationMethod::Linear => write!(f, "linear"),
            InterpolationMethod::Hermite => write!(f, "hermite"),
            InterpolationMethod::Lagrange { points } => write!(f, "lagrange({})", points),
        }
    }
}

/// Planet model used by frame conversion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub semi_major_axis: f64,      // meters
    pub eccentricity_squared: f64, // first eccentricity squared
}

impl Planet {
    pub fn wgs84() -> Self {
        Self {
            semi_major_axis: 6_378_137.0,
            eccentricity_squared: 0.00669437999014,
        }
    }
}

impl Default for Planet {
    fn default() -> Self {
        Self::wgs84()
    }
}

/// Peg point defining the origin and orientation of an SCH frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Peg {
    pub latitude: f64,  // degrees
    pub longitude: f64, // degrees
    pub heading: f64,   // degrees
}

/// Reference-frame parameters handed to a WGS84 -> SCH converter
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SchParams {
    pub peg: Peg,
    /// Average platform height above the peg (meters)
    pub average_height: f64,
    pub planet: Planet,
}

/// Error types for orbit processing
#[derive(Debug, thiserror::Error)]
pub enum OrbitError {
    #[error("State vector at t={time} is not after the last stored epoch t={last}")]
    Ordering { time: f64, last: f64 },

    #[error("Requested time {time} is outside the orbit interval [{min}, {max}]")]
    OutOfRange { time: f64, min: f64, max: f64 },

    #[error("Series lengths differ: reference has {reference} samples, candidate has {candidate}")]
    LengthMismatch { reference: usize, candidate: usize },

    #[error("Orbit holds {available} state vectors, at least {required} required")]
    EmptyOrbit { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Frame conversion error: {0}")]
    Conversion(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(String),

    #[error("Archive error: {0}")]
    Archive(String),
}

/// Result type for orbit operations
pub type OrbitResult<T> = Result<T, OrbitError>;
