//! Geometry of the scene: unit-aware points and vectors for configuration
//! and tests, raw millimetre `nalgebra` types for ray casting, triangle meshes
//! and the bounding volume hierarchy.

mod point;
mod vector;

pub use point::Point;
pub use vector::Vector;

/// Raw position in millimetres
pub type Pointf64  = nalgebra::Point3<f64>;
/// Raw displacement in millimetres
pub type Vectorf64 = nalgebra::Vector3<f64>;
/// Homogeneous transformation acting on millimetre coordinates
pub type Transform = nalgebra::Matrix4<f64>;

mod mix;
mod cylinder;
mod ray;
mod bvh;
mod mesh;

pub use cylinder::{cylinder_line_intersection_length, sphere_line_intersection_length};
pub use ray::{Ray, Hit, Triangle};
pub use bvh::{Aabb, Bvh};
pub use mesh::{TriangleMesh, MeshError};
