use crate::types::{InterpolationMethod, OrbitError, OrbitResult, StateVector, Vec3};

/// Minimum number of state vectors any interpolation scheme needs
pub const MIN_INTERPOLATION_VECTORS: usize = 2;

/// Evaluates an ordered run of state vectors at arbitrary times within their span.
///
/// Queries at a stored epoch return that vector unchanged for every method.
/// Queries outside `[first.time, last.time]` are rejected; there is no
/// extrapolation.
#[derive(Debug, Clone)]
pub struct Interpolator<'a> {
    vectors: &'a [StateVector],
    method: InterpolationMethod,
    cursor: usize,
}

impl<'a> Interpolator<'a> {
    /// Create an interpolator over time-ordered state vectors
    pub fn new(vectors: &'a [StateVector], method: InterpolationMethod) -> OrbitResult<Self> {
        if vectors.len() < MIN_INTERPOLATION_VECTORS {
            return Err(OrbitError::EmptyOrbit {
                required: MIN_INTERPOLATION_VECTORS,
                available: vectors.len(),
            });
        }

        if let InterpolationMethod::Lagrange { points } = method {
            if points < MIN_INTERPOLATION_VECTORS {
                return Err(OrbitError::InvalidParameter(format!(
                    "Lagrange interpolation needs at least {} points, got {}",
                    MIN_INTERPOLATION_VECTORS, points
                )));
            }
        }

        Ok(Self {
            vectors,
            method,
            cursor: 0,
        })
    }

    pub fn method(&self) -> InterpolationMethod {
        self.method
    }

    /// Interpolate at `time`, locating the bracket by binary search
    pub fn interpolate(&self, time: f64) -> OrbitResult<StateVector> {
        self.check_range(time)?;
        let index = bracket_index(self.vectors, time);
        Ok(self.evaluate(index, time))
    }

    /// Interpolate at `time`, resuming the bracket scan where the previous call ended.
    ///
    /// Cheap for increasing query times; a query earlier than the cursor falls
    /// back to binary search.
    pub fn interpolate_next(&mut self, time: f64) -> OrbitResult<StateVector> {
        self.check_range(time)?;

        let last_bracket = self.vectors.len() - 2;
        if time < self.vectors[self.cursor].time() {
            self.cursor = bracket_index(self.vectors, time);
        } else {
            while self.cursor < last_bracket && self.vectors[self.cursor + 1].time() <= time {
                self.cursor += 1;
            }
        }

        Ok(self.evaluate(self.cursor, time))
    }

    fn check_range(&self, time: f64) -> OrbitResult<()> {
        let min = self.vectors[0].time();
        let max = self.vectors[self.vectors.len() - 1].time();

        // Written so that NaN is rejected as well
        if !(time >= min && time <= max) {
            return Err(OrbitError::OutOfRange { time, min, max });
        }
        Ok(())
    }

    fn evaluate(&self, index: usize, time: f64) -> StateVector {
        let before = &self.vectors[index];
        let after = &self.vectors[index + 1];

        if time == before.time() {
            return *before;
        }
        if time == after.time() {
            return *after;
        }

        match self.method {
            InterpolationMethod::Linear => linear(before, after, time),
            InterpolationMethod::Hermite => hermite(before, after, time),
            InterpolationMethod::Lagrange { points } => {
                lagrange(self.vectors, index, time, points)
            }
        }
    }
}

/// Index `i` of the bracket `vectors[i].time <= time <= vectors[i + 1].time`.
///
/// Expects at least two vectors and `time` within their span.
pub fn bracket_index(vectors: &[StateVector], time: f64) -> usize {
    let at_or_before = vectors.partition_point(|sv| sv.time() <= time);
    at_or_before.saturating_sub(1).min(vectors.len() - 2)
}

fn linear(before: &StateVector, after: &StateVector, time: f64) -> StateVector {
    let fraction = (time - before.time()) / (after.time() - before.time());
    let blend = |a: Vec3, b: Vec3| -> Vec3 {
        let mut out = [0.0; 3];
        for axis in 0..3 {
            out[axis] = a[axis] + fraction * (b[axis] - a[axis]);
        }
        out
    };

    StateVector::new(
        time,
        blend(before.position(), after.position()),
        blend(before.velocity(), after.velocity()),
    )
}

fn hermite(before: &StateVector, after: &StateVector, time: f64) -> StateVector {
    let h = after.time() - before.time();
    let s = (time - before.time()) / h;
    let s2 = s * s;
    let s3 = s2 * s;

    // Cubic Hermite basis and its derivative with respect to s
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    let d00 = 6.0 * s2 - 6.0 * s;
    let d10 = 3.0 * s2 - 4.0 * s + 1.0;
    let d01 = -6.0 * s2 + 6.0 * s;
    let d11 = 3.0 * s2 - 2.0 * s;

    let (p0, p1) = (before.position(), after.position());
    let (v0, v1) = (before.velocity(), after.velocity());

    let mut position = [0.0; 3];
    let mut velocity = [0.0; 3];
    for axis in 0..3 {
        position[axis] =
            h00 * p0[axis] + h10 * h * v0[axis] + h01 * p1[axis] + h11 * h * v1[axis];
        velocity[axis] =
            (d00 * p0[axis] + d01 * p1[axis]) / h + d10 * v0[axis] + d11 * v1[axis];
    }

    StateVector::new(time, position, velocity)
}

/// Lagrange polynomial through `points` vectors centred on the bracket at `index`
fn lagrange(vectors: &[StateVector], index: usize, time: f64, points: usize) -> StateVector {
    let n = points.min(vectors.len());

    // Centre the window on the bracket, clamped to the ends of the orbit
    let start = (index + 1).saturating_sub(n / 2).min(vectors.len() - n);
    let window = &vectors[start..start + n];

    let mut position = [0.0; 3];
    let mut velocity = [0.0; 3];

    for (i, sv_i) in window.iter().enumerate() {
        let ti = sv_i.time();
        let mut weight = 1.0;

        for (j, sv_j) in window.iter().enumerate() {
            if i != j {
                let tj = sv_j.time();
                weight *= (time - tj) / (ti - tj);
            }
        }

        let (p, v) = (sv_i.position(), sv_i.velocity());
        for axis in 0..3 {
            position[axis] += weight * p[axis];
            velocity[axis] += weight * v[axis];
        }
    }

    StateVector::new(time, position, velocity)
}
