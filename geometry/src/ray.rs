//! Rays and watertight ray/triangle intersection.
//!
//! The intersection test shears and scales space so that the ray becomes the
//! positive z-axis, and evaluates the three 2-D edge functions of the projected
//! triangle. Neighbouring triangles evaluate their shared edge from identical
//! projected coordinates, so a ray can never slip between them.
//!
//! When a ray passes exactly through an edge (edge function exactly zero) the
//! edge belongs to only one of the triangles that share it: the edge is
//! directed from its lexicographically smaller projected endpoint to the
//! larger one, and it is owned by the triangle whose third vertex lies to the
//! left of that directed edge. Two triangles lying on opposite sides of a
//! shared edge therefore never both report the hit. Rays through a shared
//! vertex are not disambiguated further.

use crate::{Pointf64, Vectorf64};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Pointf64,
    /// Unit length
    pub direction: Vectorf64,
}

impl Ray {
    /// Construct a ray; `direction` is normalized.
    pub fn new(origin: Pointf64, direction: Vectorf64) -> Self {
        Self { origin, direction: direction.normalize() }
    }

    pub fn at(&self, t: f64) -> Pointf64 { self.origin + self.direction * t }
}

/// Intersection of a ray with a triangle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// Distance from ray origin
    pub t: f64,
    /// `+1` when the ray leaves the solid through the triangle (geometric
    /// normal along the ray), `-1` when it enters
    pub sign: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle(pub [Pointf64; 3]);

impl Triangle {

    /// Geometric normal implied by the winding (not normalized)
    pub fn normal(&self) -> Vectorf64 {
        let [a, b, c] = self.0;
        (b - a).cross(&(c - a))
    }

    /// Intersection with `ray` strictly in front of its origin
    pub fn intersect(&self, ray: &Ray) -> Option<Hit> {
        let d = ray.direction;

        // Permute axes so that the largest component of the direction is z
        let kz = d.iamax();
        let mut kx = (kz + 1) % 3;
        let mut ky = (kx + 1) % 3;
        if d[kz] < 0.0 { std::mem::swap(&mut kx, &mut ky) }

        // Shear constants
        let sx = d[kx] / d[kz];
        let sy = d[ky] / d[kz];
        let sz = 1.0 / d[kz];

        let [a, b, c] = self.0.map(|v| v - ray.origin);
        let project = |v: Vectorf64| [v[kx] - sx * v[kz], v[ky] - sy * v[kz]];
        let (pa, pb, pc) = (project(a), project(b), project(c));

        // Edge functions: `u` for edge BC, `v` for CA, `w` for AB
        let u = pc[0] * pb[1] - pc[1] * pb[0];
        let v = pa[0] * pc[1] - pa[1] * pc[0];
        let w = pb[0] * pa[1] - pb[1] * pa[0];

        if (u < 0.0 || v < 0.0 || w < 0.0) && (u > 0.0 || v > 0.0 || w > 0.0) { return None }

        let det = u + v + w;
        if det == 0.0 { return None }

        if u == 0.0 && !owns_edge(pb, pc, pa) { return None }
        if v == 0.0 && !owns_edge(pc, pa, pb) { return None }
        if w == 0.0 && !owns_edge(pa, pb, pc) { return None }

        let t_scaled = u * sz * a[kz] + v * sz * b[kz] + w * sz * c[kz];
        let t = t_scaled / det;
        if !(t > 0.0) || !t.is_finite() { return None }

        let sign = self.normal().dot(&d).signum();
        Some(Hit { t, sign })
    }
}

type P2 = [f64; 2];

/// Tie-break for rays that pass exactly through the edge `p`-`q`: the edge
/// belongs to the triangle whose opposite vertex `r` lies left of the edge
/// directed from its lexicographically smaller endpoint.
fn owns_edge(p: P2, q: P2, r: P2) -> bool {
    let (p, q) = if (p[0], p[1]) <= (q[0], q[1]) { (p, q) } else { (q, p) };
    let side = (q[0] - p[0]) * (r[1] - p[1]) - (q[1] - p[1]) * (r[0] - p[0]);
    side > 0.0
}
