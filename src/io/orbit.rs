use crate::core::orbit::Orbit;
use crate::types::{OrbitError, OrbitResult, ReferenceFrame, StateVector, Vec3};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::path::Path;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// One parsed state vector before it is placed on an orbit time base
#[derive(Debug)]
struct EpochRecord {
    epoch: DateTime<Utc>,
    /// Exact seconds since the declared reference epoch, when the file carries them
    offset: Option<f64>,
    position: Vec3,
    velocity: Vec3,
}

/// Orbit-wide settings declared in `#` header lines
#[derive(Debug)]
struct LineHeader {
    frame: ReferenceFrame,
    reference_time: Option<DateTime<Utc>>,
}

/// Orbit file reader.
///
/// Understands ESA Earth Explorer orbit files (`<OSV>` XML blocks, optionally
/// inside a ZIP archive) and the plain one-vector-per-line format written by
/// [`OrbitWriter`]:
///
/// ```text
/// # frame=SCH
/// # reference=2020-01-03T17:00:00.000000000Z
/// T=20.5 UTC=2020-01-03T17:00:20.500000 X=... Y=... Z=... VX=... VY=... VZ=...
/// ```
///
/// `T` is the exact time relative to the declared reference epoch and takes
/// precedence over `UTC`. Both the reference header and `T` are optional;
/// without a reference the orbit is anchored at its earliest epoch.
pub struct OrbitReader;

impl OrbitReader {
    /// Read an orbit file.
    ///
    /// `default_frame` labels the orbit unless the file declares its own frame.
    pub fn read_orbit_file<P: AsRef<Path>>(
        path: P,
        default_frame: ReferenceFrame,
    ) -> OrbitResult<Orbit> {
        log::info!("Reading orbit file: {}", path.as_ref().display());

        let bytes = fs::read(&path)?;
        let content = if Self::is_zip_content(&bytes) {
            Self::extract_eof_from_zip(&bytes)?
        } else {
            String::from_utf8(bytes)
                .map_err(|e| OrbitError::InvalidFormat(format!("Invalid UTF-8 content: {}", e)))?
        };

        Self::parse_orbit_content(&content, default_frame)
    }

    /// Parse orbit file content in either supported format
    pub fn parse_orbit_content(content: &str, default_frame: ReferenceFrame) -> OrbitResult<Orbit> {
        log::debug!("Parsing orbit content ({} bytes)", content.len());

        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let (records, header) = if content.trim_start().starts_with('<') {
            let header = LineHeader {
                frame: default_frame,
                reference_time: None,
            };
            (Self::parse_eof_xml(content)?, header)
        } else {
            Self::parse_state_vector_lines(content, default_frame)?
        };

        let frame = header.frame;
        let orbit = Self::build_orbit(records, frame, header.reference_time)?;

        if frame == ReferenceFrame::Wgs84 {
            Self::check_plausibility(&orbit);
        }

        log::info!("Parsed {}", orbit.summary());
        Ok(orbit)
    }

    /// Check if content is a ZIP file by examining magic bytes
    fn is_zip_content(bytes: &[u8]) -> bool {
        bytes.len() >= 4 && bytes[0..4] == [0x50, 0x4B, 0x03, 0x04]
    }

    /// Extract the first `.EOF` entry from a ZIP archive
    fn extract_eof_from_zip(zip_bytes: &[u8]) -> OrbitResult<String> {
        use std::io::{Cursor, Read};
        use zip::ZipArchive;

        let mut archive = ZipArchive::new(Cursor::new(zip_bytes))
            .map_err(|e| OrbitError::Archive(format!("Failed to read ZIP archive: {}", e)))?;

        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| OrbitError::Archive(format!("Failed to read ZIP entry {}: {}", i, e)))?;

            if file.name().ends_with(".EOF") {
                log::debug!("Found EOF file in ZIP: {}", file.name());
                let mut contents = String::new();
                file.read_to_string(&mut contents)?;
                return Ok(contents);
            }
        }

        Err(OrbitError::Archive(
            "No .EOF file found in ZIP archive".to_string(),
        ))
    }

    fn parse_eof_xml(content: &str) -> OrbitResult<Vec<EpochRecord>> {
        let mut reader = Reader::from_str(content);
        reader.trim_text(true);

        let mut records = Vec::new();
        let mut current: Option<OsvBuilder> = None;
        let mut tag: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    if name == "OSV" {
                        current = Some(OsvBuilder::default());
                    }
                    tag = Some(name);
                }
                Ok(Event::Text(text)) => {
                    if let (Some(osv), Some(name)) = (current.as_mut(), tag.as_deref()) {
                        let value = text
                            .unescape()
                            .map_err(|e| OrbitError::Xml(e.to_string()))?;
                        osv.set(name, value.trim())?;
                    }
                }
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == b"OSV" {
                        if let Some(osv) = current.take() {
                            records.push(osv.finish()?);
                        }
                    }
                    tag = None;
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(OrbitError::Xml(format!(
                        "Error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
        }

        log::debug!("Found {} OSV blocks", records.len());
        Ok(records)
    }

    fn parse_state_vector_lines(
        content: &str,
        default_frame: ReferenceFrame,
    ) -> OrbitResult<(Vec<EpochRecord>, LineHeader)> {
        let mut records = Vec::new();
        let mut header = LineHeader {
            frame: default_frame,
            reference_time: None,
        };

        for (line_number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(comment) = line.strip_prefix('#') {
                let comment = comment.trim();
                if let Some(declared) = comment.strip_prefix("frame=") {
                    header.frame = declared.parse()?;
                } else if let Some(declared) = comment.strip_prefix("reference=") {
                    let reference = DateTime::parse_from_rfc3339(declared).map_err(|e| {
                        OrbitError::InvalidFormat(format!(
                            "Line {}: invalid reference epoch '{}': {}",
                            line_number + 1,
                            declared,
                            e
                        ))
                    })?;
                    header.reference_time = Some(reference.with_timezone(&Utc));
                }
                continue;
            }

            let mut osv = OsvBuilder::default();
            for part in line.split_whitespace() {
                match part.split_once('=') {
                    Some((key, value)) => osv.set(key, value)?,
                    None => {
                        return Err(OrbitError::InvalidFormat(format!(
                            "Line {}: expected KEY=VALUE, found '{}'",
                            line_number + 1,
                            part
                        )))
                    }
                }
            }

            let record = osv.finish().map_err(|e| {
                OrbitError::InvalidFormat(format!("Line {}: {}", line_number + 1, e))
            })?;
            records.push(record);
        }

        Ok((records, header))
    }

    /// Place records on a time base and sort them.
    ///
    /// The time base is the declared reference epoch, or the earliest record
    /// epoch when none is declared.
    fn build_orbit(
        records: Vec<EpochRecord>,
        frame: ReferenceFrame,
        reference_time: Option<DateTime<Utc>>,
    ) -> OrbitResult<Orbit> {
        let earliest = records.iter().map(|record| record.epoch).min().ok_or_else(|| {
            OrbitError::InvalidFormat("No valid state vectors found".to_string())
        })?;

        let mut orbit = Orbit::new(reference_time.unwrap_or(earliest), frame);
        let mut vectors: Vec<StateVector> = records
            .into_iter()
            .map(|record| {
                let t = record
                    .offset
                    .unwrap_or_else(|| orbit.seconds_since_reference(record.epoch));
                StateVector::new(t, record.position, record.velocity)
            })
            .collect();
        vectors.sort_by(|a, b| a.time().total_cmp(&b.time()));

        for sv in vectors {
            orbit.add_state_vector(sv)?;
        }
        Ok(orbit)
    }

    /// Warn about vectors that do not look like a low Earth orbit
    fn check_plausibility(orbit: &Orbit) {
        for sv in orbit {
            let v = sv.velocity();
            let speed = (v[0].powi(2) + v[1].powi(2) + v[2].powi(2)).sqrt();
            if !(6000.0..=9000.0).contains(&speed) {
                log::warn!(
                    "Unusual orbital velocity: {:.1} m/s at t={} s",
                    speed,
                    sv.time()
                );
            }

            let p = sv.position();
            let radius = (p[0].powi(2) + p[1].powi(2) + p[2].powi(2)).sqrt();
            if !(6_500_000.0..=7_500_000.0).contains(&radius) {
                log::warn!(
                    "Unusual orbital radius: {:.1} km at t={} s",
                    radius / 1000.0,
                    sv.time()
                );
            }
        }
    }
}

#[derive(Debug, Default)]
struct OsvBuilder {
    time: Option<DateTime<Utc>>,
    offset: Option<f64>,
    position: [Option<f64>; 3],
    velocity: [Option<f64>; 3],
}

impl OsvBuilder {
    /// EOF files repeat the key inside the value (`<UTC>UTC=...</UTC>`); the
    /// line format does not. Both forms are accepted.
    fn set(&mut self, key: &str, value: &str) -> OrbitResult<()> {
        let value = value
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
            .unwrap_or(value);

        match key {
            "UTC" => {
                let naive = NaiveDateTime::parse_from_str(value, TIME_FORMAT).map_err(|e| {
                    OrbitError::InvalidFormat(format!("Invalid UTC time '{}': {}", value, e))
                })?;
                self.time = Some(DateTime::from_naive_utc_and_offset(naive, Utc));
            }
            "T" => self.offset = Some(parse_component(key, value)?),
            "X" => self.position[0] = Some(parse_component(key, value)?),
            "Y" => self.position[1] = Some(parse_component(key, value)?),
            "Z" => self.position[2] = Some(parse_component(key, value)?),
            "VX" => self.velocity[0] = Some(parse_component(key, value)?),
            "VY" => self.velocity[1] = Some(parse_component(key, value)?),
            "VZ" => self.velocity[2] = Some(parse_component(key, value)?),
            _ => {} // TAI, UT1, Absolute_Orbit, Quality, ...
        }
        Ok(())
    }

    fn finish(self) -> OrbitResult<EpochRecord> {
        let time = self
            .time
            .ok_or_else(|| OrbitError::InvalidFormat("Missing UTC time in state vector".to_string()))?;

        let component = |value: Option<f64>, name: &str| {
            value.ok_or_else(|| {
                OrbitError::InvalidFormat(format!("Missing {} in state vector at {}", name, time))
            })
        };

        let position = [
            component(self.position[0], "X")?,
            component(self.position[1], "Y")?,
            component(self.position[2], "Z")?,
        ];
        let velocity = [
            component(self.velocity[0], "VX")?,
            component(self.velocity[1], "VY")?,
            component(self.velocity[2], "VZ")?,
        ];

        Ok(EpochRecord {
            epoch: time,
            offset: self.offset,
            position,
            velocity,
        })
    }
}

fn parse_component(key: &str, value: &str) -> OrbitResult<f64> {
    value
        .parse()
        .map_err(|e| OrbitError::InvalidFormat(format!("Invalid {} value: {} ({})", key, value, e)))
}

/// Writes orbits in the plain state-vector line format
pub struct OrbitWriter;

impl OrbitWriter {
    /// Render an orbit, one `T=... UTC=... X=...` line per state vector.
    ///
    /// Floats use their shortest round-trip representation, so reading the
    /// text back reproduces the orbit exactly.
    pub fn format_orbit(orbit: &Orbit) -> OrbitResult<String> {
        let mut content = format!(
            "# frame={}\n# reference={}\n",
            orbit.frame(),
            orbit
                .reference_time()
                .to_rfc3339_opts(SecondsFormat::Nanos, true)
        );
        for sv in orbit {
            let (p, v) = (sv.position(), sv.velocity());
            content.push_str(&format!(
                "T={} UTC={} X={} Y={} Z={} VX={} VY={} VZ={}\n",
                sv.time(),
                orbit.epoch_of(sv.time())?.format("%Y-%m-%dT%H:%M:%S%.6f"),
                p[0],
                p[1],
                p[2],
                v[0],
                v[1],
                v[2]
            ));
        }
        Ok(content)
    }

    pub fn write_orbit_file<P: AsRef<Path>>(orbit: &Orbit, path: P) -> OrbitResult<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, Self::format_orbit(orbit)?)?;
        log::info!(
            "Wrote {} state vectors to {}",
            orbit.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}
