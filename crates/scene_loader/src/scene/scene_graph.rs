//! Scene graph
//!
//! A tree of transformed nodes, some carrying a mesh. Geometry and materials
//! are shared through `Rc` so one material can back many meshes.

use std::rc::Rc;

use crate::foundation::math::{Mat4, Transform};
use crate::render::{Geometry, PhysicalMaterial, AABB};
use crate::scene::wall_model::WallModel;

/// Renderable payload of a node
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    /// Triangle geometry in node-local space
    pub geometry: Rc<Geometry>,
    /// Surface material
    pub material: Rc<PhysicalMaterial>,
    /// Whether the mesh casts shadows
    pub cast_shadow: bool,
    /// Whether the mesh receives shadows
    pub receive_shadow: bool,
}

impl MeshNode {
    /// Create a mesh with shadows off
    pub fn new(geometry: Rc<Geometry>, material: Rc<PhysicalMaterial>) -> Self {
        Self {
            geometry,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

/// Application data attached to a node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUserData {
    /// Node is a plan floor
    pub plan_floor: bool,
    /// Node is a plan wall
    pub plan_wall: bool,
    /// Visibility data of a plan wall
    pub wall_model: Option<WallModel>,
}

/// Node in the scene graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneNode {
    /// Name for debugging
    pub name: String,
    /// Transform relative to the parent
    pub transform: Transform,
    /// Mesh rendered at this node
    pub mesh: Option<MeshNode>,
    /// Child nodes
    pub children: Vec<SceneNode>,
    /// Application data
    pub user_data: NodeUserData,
}

impl SceneNode {
    /// Create an empty group node
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a node carrying `mesh`
    pub fn with_mesh(name: impl Into<String>, mesh: MeshNode) -> Self {
        Self {
            name: name.into(),
            mesh: Some(mesh),
            ..Self::default()
        }
    }

    /// Append a child node
    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Visit this node and every descendant, depth first
    pub fn traverse(&self, visit: &mut dyn FnMut(&SceneNode)) {
        visit(self);
        for child in &self.children {
            child.traverse(visit);
        }
    }

    /// Visit this node and every descendant mutably, depth first
    pub fn traverse_mut(&mut self, visit: &mut dyn FnMut(&mut SceneNode)) {
        visit(self);
        for child in &mut self.children {
            child.traverse_mut(visit);
        }
    }

    /// Replace materials in this subtree, copy on write
    ///
    /// `update` sees each distinct material once and returns its replacement,
    /// or `None` to keep it. Meshes that shared a material share the
    /// replacement.
    pub fn map_materials(&mut self, update: &mut dyn FnMut(&PhysicalMaterial) -> Option<PhysicalMaterial>) {
        let mut seen: Vec<(Rc<PhysicalMaterial>, Rc<PhysicalMaterial>)> = Vec::new();
        self.traverse_mut(&mut |node| {
            let Some(mesh) = node.mesh.as_mut() else {
                return;
            };
            if let Some((_, replacement)) = seen.iter().find(|(old, _)| Rc::ptr_eq(old, &mesh.material)) {
                mesh.material = Rc::clone(replacement);
                return;
            }
            let replacement = update(&mesh.material).map_or_else(|| Rc::clone(&mesh.material), Rc::new);
            seen.push((Rc::clone(&mesh.material), Rc::clone(&replacement)));
            mesh.material = replacement;
        });
    }

    /// Number of mesh nodes in this subtree
    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.traverse(&mut |node| {
            if node.mesh.is_some() {
                count += 1;
            }
        });
        count
    }

    /// Bounding box of every mesh in this subtree, in the parent's space
    ///
    /// Includes this node's own transform.
    pub fn bounding_box(&self) -> Option<AABB> {
        self.bounding_box_under(&Mat4::identity())
    }

    fn bounding_box_under(&self, parent: &Mat4) -> Option<AABB> {
        let world = parent * self.transform.to_matrix();
        let own = self
            .mesh
            .as_ref()
            .and_then(|mesh| mesh.geometry.bounding_box())
            .map(|local| local.transformed(&world));
        self.children
            .iter()
            .filter_map(|child| child.bounding_box_under(&world))
            .fold(own, |acc, child| match acc {
                Some(aabb) => Some(aabb.union(&child)),
                None => Some(child),
            })
    }
}
