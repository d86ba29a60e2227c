//! Triangle meshes and a few closed primitives.
//!
//! Vertices are stored in millimetres. Primitives are centred on the origin
//! and wound so that the geometric normals point outwards.

use units::{Length, LengthUnit, mm_};
use crate::{Pointf64, Transform};
use crate::bvh::{Aabb, Bvh};
use crate::ray::Triangle;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("triangle {triangle} refers to vertex {index}, but the mesh has only {n_vertices} vertices")]
    IndexOutOfRange { triangle: usize, index: usize, n_vertices: usize },

    #[error("{0} vertices cannot be grouped into triangles")]
    NotTriangles(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    vertices: Vec<Pointf64>,
    indices: Vec<[usize; 3]>,
}

impl TriangleMesh {

    /// Build a mesh from raw coordinates expressed in `unit`. Without
    /// `indices`, consecutive triples of vertices form the triangles.
    pub fn from_vertices(vertices: &[[f64; 3]], indices: Option<&[[usize; 3]]>, unit: LengthUnit) -> Result<Self, MeshError> {
        let scale = mm_(unit.length(1.0));
        let vertices: Vec<Pointf64> = vertices.iter()
            .map(|&[x, y, z]| Pointf64::new(x * scale, y * scale, z * scale))
            .collect();
        let n_vertices = vertices.len();
        let indices = match indices {
            Some(indices) => {
                for (triangle, tri) in indices.iter().enumerate() {
                    if let Some(&index) = tri.iter().find(|&&i| i >= n_vertices) {
                        return Err(MeshError::IndexOutOfRange { triangle, index, n_vertices })
                    }
                }
                indices.to_vec()
            },
            None => {
                if n_vertices % 3 != 0 { return Err(MeshError::NotTriangles(n_vertices)) }
                (0..n_vertices / 3).map(|t| [3*t, 3*t + 1, 3*t + 2]).collect()
            },
        };
        Ok(Self { vertices, indices })
    }

    pub fn cube(side: Length) -> Self { Self::cuboid([side; 3]) }

    pub fn cuboid(size: [Length; 3]) -> Self {
        let [hx, hy, hz] = size.map(|s| mm_(s) / 2.0);
        // Corner `i` has bit 0 set for +x, bit 1 for +y, bit 2 for +z
        let vertices = (0..8)
            .map(|i| Pointf64::new(
                if i & 1 == 0 { -hx } else { hx },
                if i & 2 == 0 { -hy } else { hy },
                if i & 4 == 0 { -hz } else { hz },
            ))
            .collect();
        let indices = vec![
            [0, 4, 6], [0, 6, 2], // -x
            [1, 3, 7], [1, 7, 5], // +x
            [0, 1, 5], [0, 5, 4], // -y
            [2, 6, 7], [2, 7, 3], // +y
            [0, 2, 3], [0, 3, 1], // -z
            [4, 5, 7], [4, 7, 6], // +z
        ];
        Self { vertices, indices }
    }

    /// Closed cylinder whose axis is the z-axis, approximated by a prism with
    /// `segments` sides
    pub fn cylinder(radius: Length, height: Length, segments: usize) -> Self {
        let n = segments.max(3);
        let (r, h) = (mm_(radius), mm_(height) / 2.0);
        let ring = |z: f64| (0..n).map(move |i| {
            let phi = std::f64::consts::TAU * i as f64 / n as f64;
            Pointf64::new(r * phi.cos(), r * phi.sin(), z)
        });

        let (bottom, top) = (0, 1);
        let b = |i: usize| 2 + i % n;
        let t = |i: usize| 2 + n + i % n;

        let mut vertices = vec![Pointf64::new(0.0, 0.0, -h), Pointf64::new(0.0, 0.0, h)];
        vertices.extend(ring(-h));
        vertices.extend(ring( h));

        let mut indices = Vec::with_capacity(4 * n);
        for i in 0..n {
            indices.push([bottom, b(i + 1), b(i)]);
            indices.push([top   , t(i), t(i + 1)]);
            indices.push([b(i), b(i + 1), t(i + 1)]);
            indices.push([b(i), t(i + 1), t(i)]);
        }
        Self { vertices, indices }
    }

    /// UV sphere with `stacks` bands of latitude and `slices` of longitude
    pub fn sphere(radius: Length, stacks: usize, slices: usize) -> Self {
        let (stacks, slices) = (stacks.max(2), slices.max(3));
        let r = mm_(radius);

        let (north, south) = (0, 1);
        let mut vertices = vec![Pointf64::new(0.0, 0.0, r), Pointf64::new(0.0, 0.0, -r)];
        for k in 1..stacks {
            let theta = std::f64::consts::PI * k as f64 / stacks as f64;
            for j in 0..slices {
                let phi = std::f64::consts::TAU * j as f64 / slices as f64;
                vertices.push(Pointf64::new(r * theta.sin() * phi.cos(),
                                            r * theta.sin() * phi.sin(),
                                            r * theta.cos()));
            }
        }
        // Vertex index of ring `k` (1-based, from the north) at longitude `j`
        let v = |k: usize, j: usize| 2 + (k - 1) * slices + j % slices;

        let mut indices = Vec::with_capacity(2 * stacks * slices);
        for j in 0..slices {
            indices.push([north, v(1, j), v(1, j + 1)]);
            indices.push([south, v(stacks - 1, j + 1), v(stacks - 1, j)]);
        }
        for k in 1..stacks - 1 {
            for j in 0..slices {
                let (a, b, c, d) = (v(k, j), v(k + 1, j), v(k + 1, j + 1), v(k, j + 1));
                indices.push([a, b, c]);
                indices.push([a, c, d]);
            }
        }
        Self { vertices, indices }
    }

    pub fn vertices(&self) -> &[Pointf64] { &self.vertices }

    pub fn indices(&self) -> &[[usize; 3]] { &self.indices }

    pub fn is_empty(&self) -> bool { self.indices.is_empty() }

    /// Flip the winding of every triangle
    pub fn invert_normals(&mut self) {
        for tri in &mut self.indices { tri.swap(1, 2) }
    }

    /// Apply `transform` to the vertices in place
    pub fn apply_transform(&mut self, transform: &Transform) {
        for v in &mut self.vertices { *v = transform.transform_point(v) }
    }

    pub fn transformed(&self, transform: &Transform) -> Self {
        let mut mesh = self.clone();
        mesh.apply_transform(transform);
        mesh
    }

    pub fn bbox(&self) -> Aabb {
        self.vertices.iter().fold(Aabb::empty(), |b, p| b.grow(p))
    }

    /// Centre of the bounding box, or the origin for an empty mesh
    pub fn centre(&self) -> Pointf64 {
        let bbox = self.bbox();
        if bbox.is_empty() { Pointf64::origin() } else { bbox.centre() }
    }

    /// The triangles of the mesh after applying `transform` to it
    pub fn triangles(&self, transform: &Transform) -> Vec<Triangle> {
        let world: Vec<Pointf64> = self.vertices.iter().map(|v| transform.transform_point(v)).collect();
        self.indices.iter()
            .map(|&[a, b, c]| Triangle([world[a], world[b], world[c]]))
            .collect()
    }

    pub fn bvh(&self, transform: &Transform) -> Bvh { Bvh::new(self.triangles(transform)) }
}
