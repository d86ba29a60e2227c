//! Repair of L-buffer pixels whose rays hit the surface inconsistently
//! (grazing rays through shared vertices, open or self-intersecting meshes).

use std::collections::BTreeMap;

use ndarray::{Array2, Zip};
use ordered_float::OrderedFloat;

use units::todo::Lengthf32;
use crate::lbuffer::{LBuffer, Projection, mm_to_cm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtifactFilter {
    Disabled,
    /// Replace suspicious pixels with the mean of their valid neighbours
    #[default]
    Gpu,
    /// Recompute suspicious pixels from their de-duplicated hits
    Cpu,
}

impl ArtifactFilter {
    pub fn apply(self, lbuffer: &mut LBuffer, projection: &Projection, cutoff: Lengthf32) {
        let before = lbuffer.n_unbalanced();
        match self {
            ArtifactFilter::Disabled => return,
            ArtifactFilter::Gpu => clean_image_space(lbuffer, cutoff),
            ArtifactFilter::Cpu => recast(lbuffer, projection),
        }
        if before > 0 {
            tracing::debug!("{self:?} artifact filter repaired {before} unbalanced pixels");
        }
    }
}

/// A pixel is invalid if its path length is negative, longer than `cutoff`,
/// or its hits do not balance. Each invalid pixel is replaced by the mean of
/// the valid pixels among its 8 neighbours, or by 0 if there are none.
pub fn clean_image_space(lbuffer: &mut LBuffer, cutoff: Lengthf32) {
    let valid: Array2<bool> = Zip::from(&lbuffer.length).and(&lbuffer.sign)
        .map_collect(|&l, &s| l >= 0.0 && l <= cutoff && s.abs() <= 0.5);
    if valid.iter().all(|&v| v) { return }

    let original = lbuffer.length.clone();
    let (height, width) = original.dim();
    Zip::indexed(&mut lbuffer.length)
        .and(&mut lbuffer.sign)
        .and(&valid)
        .par_for_each(|(j, i), length, sign, &ok| {
            if ok { return }
            let rows = j.saturating_sub(1)..=(j + 1).min(height - 1);
            let cols = i.saturating_sub(1)..=(i + 1).min(width  - 1);
            let (mut sum, mut n) = (0.0, 0);
            for jj in rows {
                for ii in cols.clone() {
                    if valid[[jj, ii]] {
                        sum += original[[jj, ii]];
                        n += 1;
                    }
                }
            }
            *length = if n > 0 { sum / n as Lengthf32 } else { 0.0 };
            *sign = 0.0;
        });
}

/// Re-intersect every unbalanced pixel, keeping a single hit per distinct
/// distance. The result is the signed sum of the remaining hits if their
/// number is even (and non-zero), and 0 otherwise.
pub fn recast(lbuffer: &mut LBuffer, projection: &Projection) {
    Zip::indexed(&mut lbuffer.length)
        .and(&mut lbuffer.sign)
        .par_for_each(|(j, i), length, sign| {
            if sign.abs() <= 0.5 { return }
            let hits: BTreeMap<OrderedFloat<f64>, f64> = projection.hits(i, j).into_iter()
                .map(|h| (OrderedFloat(h.t), h.sign))
                .collect();
            let n = hits.len();
            if n > 0 && n % 2 == 0 {
                let l: f64 = hits.iter().map(|(t, s)| s * t.0).sum();
                *length = mm_to_cm(l) as Lengthf32;
                *sign = hits.values().sum::<f64>() as f32;
            } else {
                *length = 0.0;
                *sign = 0.0;
            }
        });
}
