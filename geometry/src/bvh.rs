//! Bounding volume hierarchy over triangles, answering "every hit along this
//! ray" rather than "nearest hit".

use crate::{Pointf64, Vectorf64};
use crate::ray::{Hit, Ray, Triangle};

const LEAF_SIZE: usize = 4;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Pointf64,
    pub max: Pointf64,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Pointf64::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Pointf64::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool { self.min.x > self.max.x }

    pub fn from_triangle(t: &Triangle) -> Self {
        t.0.iter().fold(Self::empty(), |b, p| b.grow(p))
    }

    pub fn grow(self, p: &Pointf64) -> Self {
        Self { min: self.min.inf(p), max: self.max.sup(p) }
    }

    pub fn union(self, other: Self) -> Self {
        Self { min: self.min.inf(&other.min), max: self.max.sup(&other.max) }
    }

    pub fn extent(&self) -> Vectorf64 { self.max - self.min }

    pub fn diagonal(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.extent().norm() }
    }

    pub fn centre(&self) -> Pointf64 { nalgebra::center(&self.min, &self.max) }

    /// Slab test, inclusive at the boundaries so that flat boxes (a leaf
    /// holding a single planar face) are still hit
    fn hit(&self, ray: &Ray) -> bool {
        let (mut t_min, mut t_max) = (0.0, f64::INFINITY);
        for axis in 0..3 {
            if !hit_axis(self.min[axis], self.max[axis], ray.origin[axis], ray.direction[axis], &mut t_min, &mut t_max) {
                return false;
            }
        }
        true
    }
}

fn hit_axis(min: f64, max: f64, origin: f64, direction: f64, t_min: &mut f64, t_max: &mut f64) -> bool {
    if direction == 0.0 {
        return origin >= min && origin <= max;
    }

    let inv_d = 1.0 / direction;
    let mut t0 = (min - origin) * inv_d;
    let mut t1 = (max - origin) * inv_d;
    if inv_d < 0.0 {
        std::mem::swap(&mut t0, &mut t1);
    }

    *t_min = t0.max(*t_min);
    *t_max = t1.min(*t_max);
    *t_max >= *t_min
}

#[derive(Debug)]
enum Node {
    Leaf { bbox: Aabb, start: usize, end: usize },
    Branch { bbox: Aabb, left: Box<Node>, right: Box<Node> },
}

impl Node {
    fn bbox(&self) -> &Aabb {
        match self {
            Node::Leaf   { bbox, .. } => bbox,
            Node::Branch { bbox, .. } => bbox,
        }
    }

    fn build(indices: &mut [usize], triangles: &[Triangle], boxes: &[Aabb], offset: usize) -> Self {
        let bbox = indices.iter().fold(Aabb::empty(), |b, &i| b.union(boxes[i]));

        if indices.len() <= LEAF_SIZE {
            return Node::Leaf { bbox, start: offset, end: offset + indices.len() };
        }

        let extent = bbox.extent();
        let axis = extent.imax();

        indices.sort_by_key(|&i| ordered_float::OrderedFloat(boxes[i].centre()[axis]));

        let mid = indices.len() / 2;
        let (left_indices, right_indices) = indices.split_at_mut(mid);
        let left  = Box::new(Node::build(left_indices , triangles, boxes, offset));
        let right = Box::new(Node::build(right_indices, triangles, boxes, offset + mid));
        Node::Branch { bbox, left, right }
    }

    fn hits(&self, ray: &Ray, triangles: &[Triangle], indices: &[usize], out: &mut Vec<Hit>) {
        if !self.bbox().hit(ray) { return }
        match self {
            Node::Leaf { start, end, .. } => {
                out.extend(indices[*start..*end].iter().filter_map(|&i| triangles[i].intersect(ray)))
            },
            Node::Branch { left, right, .. } => {
                left .hits(ray, triangles, indices, out);
                right.hits(ray, triangles, indices, out);
            },
        }
    }
}

pub struct Bvh {
    triangles: Vec<Triangle>,
    indices: Vec<usize>,
    root: Node,
}

impl Bvh {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        let boxes: Vec<Aabb> = triangles.iter().map(Aabb::from_triangle).collect();
        let mut indices: Vec<usize> = (0..triangles.len()).collect();
        let root = Node::build(&mut indices, &triangles, &boxes, 0);
        Self { triangles, indices, root }
    }

    pub fn bbox(&self) -> &Aabb { self.root.bbox() }

    pub fn len(&self) -> usize { self.triangles.len() }

    pub fn is_empty(&self) -> bool { self.triangles.is_empty() }

    /// Append every intersection of `ray` with the triangles to `out`, in no
    /// particular order
    pub fn all_hits(&self, ray: &Ray, out: &mut Vec<Hit>) {
        self.root.hits(ray, &self.triangles, &self.indices, out)
    }
}
