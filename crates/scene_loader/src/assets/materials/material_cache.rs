//! Material cache for deduplicating resolved materials
//!
//! Kernel material ids are unique within one query, so one cache lives for
//! one scene build and every mesh referencing an id shares a single material.

use std::collections::HashMap;
use std::rc::Rc;

use super::material_resolver::MaterialResolver;
use crate::kernel::MaterialSpecification;
use crate::render::{PhysicalMaterial, TextureLoads};

/// Resolved materials of one scene build, keyed by kernel material id
#[derive(Debug, Default)]
pub struct MaterialCache {
    materials: HashMap<String, Rc<PhysicalMaterial>>,
}

impl MaterialCache {
    /// Create a new empty material cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `specification` unless its id is already cached
    ///
    /// Texture loads of a fresh resolution are appended to `loads`.
    pub fn resolve_or_get(
        &mut self,
        resolver: &MaterialResolver,
        specification: &MaterialSpecification,
        loads: &mut TextureLoads,
    ) -> Rc<PhysicalMaterial> {
        if let Some(material) = self.materials.get(&specification.id) {
            return Rc::clone(material);
        }
        let resolved = resolver.resolve(specification);
        loads.append(resolved.textures);
        self.materials
            .insert(specification.id.clone(), Rc::clone(&resolved.material));
        resolved.material
    }

    /// Cached material for `id`
    pub fn get(&self, id: &str) -> Option<Rc<PhysicalMaterial>> {
        self.materials.get(id).cloned()
    }

    /// Cache an already resolved material
    pub fn insert(&mut self, id: impl Into<String>, material: Rc<PhysicalMaterial>) {
        self.materials.insert(id.into(), material);
    }

    /// Ids of every cached material
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.materials.keys().map(String::as_str)
    }

    /// Number of cached materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Clear all cached materials
    pub fn clear(&mut self) {
        self.materials.clear();
    }
}
