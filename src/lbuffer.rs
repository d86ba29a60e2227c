//! Per-pixel path length through a closed surface: the L-buffer.
//!
//! Every intersection of a pixel's ray with the surface contributes its
//! distance from the ray origin, negated when the ray enters the solid.
//! Summing these gives the total length of all the segments of the ray which
//! lie inside the solid, however many there are.

use ndarray::{Array2, Zip};

use geometry::{Bvh, Hit, Ray, Vectorf64};
use units::todo::{Lengthf32, Lengthf64};
use crate::detector::{DetectorBasis, DetectorGeometry};

/// Path lengths (in cm) and entry/exit balance for every pixel, indexed by
/// `[row, column]`
#[derive(Debug, Clone, PartialEq)]
pub struct LBuffer {
    pub length: Array2<Lengthf32>,
    /// Sum over hits of +1 (exit) or -1 (entry). Zero wherever the ray left
    /// the solid as many times as it entered it.
    pub sign: Array2<f32>,
}

impl LBuffer {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self { length: Array2::zeros((height, width)), sign: Array2::zeros((height, width)) }
    }

    pub fn width (&self) -> usize { self.length.ncols() }
    pub fn height(&self) -> usize { self.length.nrows() }

    /// Pixels whose hits do not balance
    pub fn n_unbalanced(&self) -> usize { self.sign.iter().filter(|s| s.abs() > 0.5).count() }
}

/// The rays and the surface needed to (re)compute the L-buffer of one surface
/// as seen from one source sample
pub struct Projection<'a> {
    pub bvh: &'a Bvh,
    pub detector: &'a DetectorGeometry,
    pub basis: &'a DetectorBasis,
    pub source_offset: &'a Vectorf64,
}

impl Projection<'_> {
    pub fn ray(&self, i: usize, j: usize) -> Ray {
        self.detector.ray(self.basis, self.source_offset, i, j)
    }

    pub fn hits(&self, i: usize, j: usize) -> Vec<Hit> {
        let mut hits = vec![];
        self.bvh.all_hits(&self.ray(i, j), &mut hits);
        hits
    }

    /// Compute the L-buffer, one ray per pixel, in parallel
    pub fn lbuffer(&self) -> LBuffer {
        let (width, height) = self.detector.pixel_count();
        let mut lbuffer = LBuffer::zeros(width, height);
        if self.bvh.is_empty() { return lbuffer }

        Zip::indexed(&mut lbuffer.length)
            .and(&mut lbuffer.sign)
            .par_for_each(|(j, i), length, sign| {
                let (l, s) = signed_sum(&self.hits(i, j));
                *length = mm_to_cm(l) as Lengthf32;
                *sign = s as f32;
            });
        lbuffer
    }
}

/// `(Σ sign·t, Σ sign)` over `hits`
pub fn signed_sum(hits: &[Hit]) -> (Lengthf64, f64) {
    hits.iter().fold((0.0, 0.0), |(l, s), h| (l + h.sign * h.t, s + h.sign))
}

#[inline]
pub(crate) fn mm_to_cm(x: Lengthf64) -> Lengthf64 { x / 10.0 }
