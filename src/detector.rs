//! Flat-panel detector and X-ray source geometry

use std::path::Path;

use geometry::{Point, Pointf64, Ray, Vector, Vectorf64};
use units::{EnergyUnit, Energy, Length, mev, mev_, mm, mm_};
use crate::error::{FatalError, Result};
use crate::spectrum::parse_pairs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BeamShape {
    /// Rays diverge from the source position (and any source samples)
    #[default]
    PointSource,
    /// All rays are parallel to the source-to-detector axis
    ParallelBeam,
}

/// Orthonormal frame of the detector plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorBasis {
    /// Unit vector from the source towards the detector
    pub view: Vectorf64,
    /// Unit vector along the pixel rows: `up × view`
    pub right: Vectorf64,
    /// Unit vector along the pixel columns, orthogonal to `view`
    pub up: Vectorf64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorGeometry {
    source: Pointf64,
    /// Offsets of the points making up an extended source
    source_samples: Vec<Vectorf64>,
    detector: Pointf64,
    up: Vectorf64,
    /// Number of pixels as (width, height)
    pixel_count: (usize, usize),
    /// Pixel pitch as (width, height) in mm
    pixel_pitch: (f64, f64),
    beam: BeamShape,
    response: Option<DetectorResponse>,
}

impl Default for DetectorGeometry {
    fn default() -> Self {
        Self {
            source:         Pointf64::origin(),
            source_samples: vec![],
            detector:       Pointf64::origin(),
            up:             Vectorf64::y(),
            pixel_count:    (0, 0),
            pixel_pitch:    (1.0, 1.0),
            beam:           BeamShape::default(),
            response:       None,
        }
    }
}

impl DetectorGeometry {
    pub fn source_position(&self) -> Point { self.source.into() }
    pub fn set_source_position(&mut self, p: Point) { self.source = p.into() }

    pub fn detector_position(&self) -> Point { self.detector.into() }
    pub fn set_detector_position(&mut self, p: Point) { self.detector = p.into() }

    /// Up vector as given (not yet orthogonalized)
    pub fn up_vector(&self) -> Vectorf64 { self.up }

    /// Stored normalized; a zero vector is kept as is and rejected by `basis`
    pub fn set_up_vector(&mut self, up: Vectorf64) {
        self.up = up.try_normalize(0.0).unwrap_or(up);
    }

    pub fn right_vector(&self) -> Result<Vectorf64> { Ok(self.basis()?.right) }

    pub fn pixel_count(&self) -> (usize, usize) { self.pixel_count }
    pub fn set_pixel_count(&mut self, width: usize, height: usize) { self.pixel_count = (width, height) }

    pub fn pixel_pitch(&self) -> (Length, Length) {
        (mm(self.pixel_pitch.0), mm(self.pixel_pitch.1))
    }

    pub fn set_pixel_pitch(&mut self, width: Length, height: Length) {
        self.pixel_pitch = (mm_(width), mm_(height))
    }

    /// Physical size of the sensitive area as (width, height)
    pub fn size(&self) -> (Length, Length) {
        let (w, h) = self.pixel_count;
        let (pw, ph) = self.pixel_pitch;
        (mm(w as f64 * pw), mm(h as f64 * ph))
    }

    pub fn beam_shape(&self) -> BeamShape { self.beam }
    pub fn set_beam_shape(&mut self, beam: BeamShape) { self.beam = beam }

    pub fn add_source_sample(&mut self, offset: Vector) { self.source_samples.push(offset.into()) }
    pub fn clear_source_samples(&mut self) { self.source_samples.clear() }

    /// Offsets of the source points used for imaging. A parallel beam, or a
    /// point source without explicit samples, uses a single point.
    pub fn source_samples(&self) -> Vec<Vectorf64> {
        match self.beam {
            BeamShape::PointSource if !self.source_samples.is_empty() => self.source_samples.clone(),
            _ => vec![Vectorf64::zeros()],
        }
    }

    pub fn response(&self) -> Option<&DetectorResponse> { self.response.as_ref() }
    pub fn set_response(&mut self, response: DetectorResponse) { self.response = Some(response) }
    pub fn clear_response(&mut self) { self.response = None }

    pub fn basis(&self) -> Result<DetectorBasis> {
        let view = (self.detector - self.source)
            .try_normalize(f64::EPSILON)
            .ok_or(FatalError::SourceAtDetector)?;
        let right = self.up.cross(&view)
            .try_normalize(1e-9)
            .ok_or(FatalError::DegenerateDetectorBasis)?;
        let up = view.cross(&right);
        // A source point in the detector plane has no ray to some pixels
        if self.beam == BeamShape::PointSource {
            for offset in self.source_samples() {
                let distance = (self.detector - (self.source + offset)).dot(&view);
                if distance.abs() <= f64::EPSILON * self.detector.coords.norm().max(1.0) {
                    return Err(FatalError::SourceAtDetector)
                }
            }
        }
        Ok(DetectorBasis { view, right, up })
    }

    /// Centre of pixel `(i, j)`, with `i` counting columns and `j` rows
    pub fn pixel_centre(&self, basis: &DetectorBasis, i: usize, j: usize) -> Pointf64 {
        let (w, h) = self.pixel_count;
        let (pw, ph) = self.pixel_pitch;
        let u = -(w as f64 * pw) / 2.0 + pw * (0.5 + i as f64);
        let v = -(h as f64 * ph) / 2.0 + ph * (0.5 + j as f64);
        self.detector + basis.up * v + basis.right * u
    }

    /// The ray which images pixel `(i, j)` from the source sample at `offset`
    pub fn ray(&self, basis: &DetectorBasis, offset: &Vectorf64, i: usize, j: usize) -> Ray {
        let pixel = self.pixel_centre(basis, i, j);
        match self.beam {
            BeamShape::PointSource  => {
                let origin = self.source + offset;
                Ray::new(origin, pixel - origin)
            },
            BeamShape::ParallelBeam => Ray::new(pixel, -basis.view),
        }
    }
}

/// Energy recorded by the detector as a function of the incident photon
/// energy. Linear interpolation between the tabulated points, clamped
/// outside them.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorResponse {
    /// (incident, recorded) in MeV, sorted by incident energy
    table: Vec<(f64, f64)>,
}

impl DetectorResponse {
    pub fn new(mut table: Vec<(Energy, Energy)>) -> Result<Self> {
        if table.is_empty() {
            return Err(FatalError::Config("empty detector response".into()))
        }
        table.sort_by(|a, b| a.0.value.total_cmp(&b.0.value));
        Ok(Self { table: table.into_iter().map(|(i, o)| (mev_(i), mev_(o))).collect() })
    }

    /// Read `incident recorded` pairs, both in `unit`
    pub fn load_tsv(path: &Path, unit: EnergyUnit) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(FatalError::file(path))?;
        let table = parse_pairs(&text, path)?
            .into_iter()
            .map(|(_, (i, o))| (unit.energy(i), unit.energy(o)))
            .collect();
        let response = Self::new(table)?;
        tracing::info!("Loaded detector response with {} points from {}", response.table.len(), path.display());
        Ok(response)
    }

    pub fn apply(&self, incident: Energy) -> Energy {
        let e = mev_(incident);
        let t = &self.table;
        let k = t.partition_point(|&(x, _)| x < e);
        mev(if k == 0 {
            t[0].1
        } else if k == t.len() {
            t[k - 1].1
        } else {
            let (x0, y0) = t[k - 1];
            let (x1, y1) = t[k];
            if x1 == x0 { y1 } else { y0 + (y1 - y0) * (e - x0) / (x1 - x0) }
        })
    }
}
