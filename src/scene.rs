//! Labelled surfaces making up the imaged object

use std::collections::BTreeMap;

use nalgebra::{Rotation3, Unit};

use geometry::{Pointf64, Transform, TriangleMesh, Vector, Vectorf64};
use units::{Angle, radian_};
use crate::material::MaterialId;

/// Whether a surface adds to (inner) or subtracts from (outer) the
/// attenuation exponent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role { Inner, Outer }

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub mesh: TriangleMesh,
    pub material: Option<MaterialId>,
    /// Local-to-world transformation of the mesh
    pub transform: Transform,
}

impl SceneNode {
    pub fn new(mesh: TriangleMesh) -> Self {
        Self { mesh, material: None, transform: Transform::identity() }
    }

    pub fn with_material(mut self, material: impl Into<MaterialId>) -> Self {
        self.material = Some(material.into());
        self
    }

    /// All transformations below are applied after the existing one
    pub fn translate(&mut self, by: Vector) -> &mut Self {
        let by: Vectorf64 = by.into();
        self.transform = Transform::new_translation(&by) * self.transform;
        self
    }

    /// Rotate about an axis through the world origin
    pub fn rotate(&mut self, axis: Vectorf64, angle: Angle) -> &mut Self {
        self.transform = rotation(axis, angle) * self.transform;
        self
    }

    pub fn scale(&mut self, factor: f64) -> &mut Self {
        self.transform = Transform::new_scaling(factor) * self.transform;
        self
    }

    /// Translate so that the centre of the bounding box lands on the origin
    pub fn move_to_centre(&mut self) -> &mut Self {
        let centre = self.transform.transform_point(&self.mesh.centre());
        self.transform = Transform::new_translation(&-centre.coords) * self.transform;
        self
    }

    pub fn world_mesh(&self) -> TriangleMesh { self.mesh.transformed(&self.transform) }
}

/// Rotation about an axis through the origin. A zero axis gives the identity.
pub fn rotation(axis: Vectorf64, angle: Angle) -> Transform {
    match Unit::try_new(axis, 0.0) {
        Some(axis) => Rotation3::from_axis_angle(&axis, radian_(angle)).to_homogeneous(),
        None => {
            tracing::warn!("Ignoring rotation about zero axis");
            Transform::identity()
        },
    }
}

/// Rotation about an axis through `centre`
pub fn rotation_about(centre: Pointf64, axis: Vectorf64, angle: Angle) -> Transform {
    Transform::new_translation(&centre.coords)
        * rotation(axis, angle)
        * Transform::new_translation(&-centre.coords)
}

/// Flat table of labelled nodes, plus the ordered lists of labels registered
/// as inner and outer surfaces
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: BTreeMap<String, SceneNode>,
    inner: Vec<String>,
    outer: Vec<String>,
}

impl Scene {
    pub fn new() -> Self { Self::default() }

    /// Replaces any existing node with the same label
    pub fn add_node(&mut self, label: impl Into<String>, node: SceneNode) {
        self.nodes.insert(label.into(), node);
    }

    /// Also unregisters the node's surface
    pub fn remove_node(&mut self, label: &str) -> Option<SceneNode> {
        self.inner.retain(|l| l != label);
        self.outer.retain(|l| l != label);
        self.nodes.remove(label)
    }

    pub fn get_node(&self, label: &str) -> Option<&SceneNode> { self.nodes.get(label) }

    pub fn get_node_mut(&mut self, label: &str) -> Option<&mut SceneNode> { self.nodes.get_mut(label) }

    pub fn labels(&self) -> impl Iterator<Item = &str> { self.nodes.keys().map(String::as_str) }

    pub fn add_inner_surface(&mut self, label: &str) { self.register(label, Role::Inner) }

    pub fn add_outer_surface(&mut self, label: &str) { self.register(label, Role::Outer) }

    pub fn remove_inner_surfaces(&mut self) { self.inner.clear() }

    pub fn remove_outer_surfaces(&mut self) { self.outer.clear() }

    fn register(&mut self, label: &str, role: Role) {
        if !self.nodes.contains_key(label) {
            tracing::warn!("No node labelled `{label}`: not added as {role:?} surface");
            return;
        }
        if self.inner.iter().chain(&self.outer).any(|l| l == label) {
            tracing::warn!("`{label}` is already a registered surface");
            return;
        }
        match role {
            Role::Inner => self.inner.push(label.into()),
            Role::Outer => self.outer.push(label.into()),
        }
    }

    /// Registered surfaces in registration order, inner ones first
    pub fn surfaces(&self) -> impl Iterator<Item = (&str, Role, &SceneNode)> {
        let inner = self.inner.iter().map(|l| (l, Role::Inner));
        let outer = self.outer.iter().map(|l| (l, Role::Outer));
        inner.chain(outer)
            .filter_map(|(l, role)| self.nodes.get(l).map(|node| (l.as_str(), role, node)))
    }

    pub fn inner_surfaces(&self) -> impl Iterator<Item = (&str, &SceneNode)> {
        self.surfaces().filter(|(_, role, _)| *role == Role::Inner).map(|(l, _, n)| (l, n))
    }

    pub fn outer_surfaces(&self) -> impl Iterator<Item = (&str, &SceneNode)> {
        self.surfaces().filter(|(_, role, _)| *role == Role::Outer).map(|(l, _, n)| (l, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use float_eq::assert_float_eq;
    use units::{cm, mm, degree};

    fn scene() -> Scene {
        let mut scene = Scene::new();
        scene.add_node("box"   , SceneNode::new(TriangleMesh::cube(cm(10.0))).with_material("water"));
        scene.add_node("hole"  , SceneNode::new(TriangleMesh::cube(cm( 2.0))).with_material("water"));
        scene.add_node("marker", SceneNode::new(TriangleMesh::cube(cm( 1.0))).with_material("gold" ));
        scene
    }

    fn labels<'a>(it: impl Iterator<Item = (&'a str, &'a SceneNode)>) -> Vec<&'a str> {
        it.map(|(l, _)| l).collect()
    }

    #[test]
    fn registration_order_and_roles() {
        let mut s = scene();
        s.add_inner_surface("marker");
        s.add_outer_surface("hole");
        s.add_inner_surface("box");
        assert_eq!(labels(s.inner_surfaces()), vec!["marker", "box"]);
        assert_eq!(labels(s.outer_surfaces()), vec!["hole"]);

        s.remove_outer_surfaces();
        assert_eq!(labels(s.outer_surfaces()), Vec::<&str>::new());
        s.remove_inner_surfaces();
        assert_eq!(s.surfaces().count(), 0);
    }

    #[test]
    fn unknown_and_duplicate_labels_are_skipped() {
        let mut s = scene();
        s.add_inner_surface("nonexistent");
        s.add_inner_surface("box");
        s.add_outer_surface("box");
        assert_eq!(s.surfaces().map(|(l, r, _)| (l, r)).collect::<Vec<_>>(), vec![("box", Role::Inner)]);
    }

    #[test]
    fn removing_node_unregisters_it() {
        let mut s = scene();
        s.add_inner_surface("box");
        assert!(s.remove_node("box").is_some());
        assert_eq!(s.surfaces().count(), 0);
    }

    #[test]
    fn transformations_compose_in_order() {
        let mut node = SceneNode::new(TriangleMesh::cube(mm(2.0)));
        node.translate(Vector::new(mm(10.0), mm(0.0), mm(0.0)))
            .rotate(Vectorf64::z(), degree(90.0));
        let c = node.world_mesh().centre();
        assert_float_eq!([c.x, c.y, c.z], [0.0, 10.0, 0.0], abs <= [1e-12; 3]);

        node.move_to_centre();
        let c = node.world_mesh().centre();
        assert_float_eq!([c.x, c.y, c.z], [0.0, 0.0, 0.0], abs <= [1e-12; 3]);

        node.scale(3.0);
        let bbox = node.world_mesh().bbox();
        assert_float_eq!(bbox.max.x - bbox.min.x, 6.0, abs <= 1e-12);
    }

    #[test]
    fn rotation_about_centre_keeps_centre_fixed() {
        let centre = Pointf64::new(5.0, -2.0, 7.0);
        let m = rotation_about(centre, Vectorf64::new(1.0, 1.0, 0.0), degree(33.0));
        let moved = m.transform_point(&centre);
        assert_float_eq!([moved.x, moved.y, moved.z], [5.0, -2.0, 7.0], abs <= [1e-12; 3]);
    }
}
