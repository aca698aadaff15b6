//! Scene identifiers
//!
//! A raw id string names a configuration, a plan or a packed GLB asset.
//! [`SceneKind::classify`] decides which; [`SceneSourceContainer`] turns a
//! list of ids into uniquely named menu entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What a scene id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    /// Kernel configuration
    Configuration,
    /// Kernel plan
    Plan,
    /// Packed glTF asset
    Glb,
}

impl SceneKind {
    /// Classify a raw id or URL
    ///
    /// `.glb`/`.gltf` suffixes (any case) are assets; ids starting with `ps_`
    /// or without a `:` are plans; everything else is a configuration.
    pub fn classify(id: &str) -> Self {
        let lower = id.to_lowercase();
        if lower.ends_with(".glb") || lower.ends_with(".gltf") {
            SceneKind::Glb
        } else if id.starts_with("ps_") || !id.contains(':') {
            SceneKind::Plan
        } else {
            SceneKind::Configuration
        }
    }
}

/// A loadable scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSourceModel {
    /// Scene kind
    pub kind: SceneKind,
    /// Display name
    pub name: String,
    /// Cache key and, unless `resource` is set, the thing to load
    pub id: String,
    /// Asset URL overriding `id` for GLB scenes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl SceneSourceModel {
    /// Classify `id` and derive its display name
    pub fn from_id(id: &str) -> Self {
        let kind = SceneKind::classify(id);
        Self {
            kind,
            name: display_name(kind, id),
            id: id.to_string(),
            resource: None,
        }
    }

    /// Use `resource` instead of the id when loading
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }
}

/// Human-readable name of a scene id
pub fn display_name(kind: SceneKind, id: &str) -> String {
    match kind {
        SceneKind::Glb => {
            let file = id.rsplit('/').next().unwrap_or(id);
            let stem = file
                .rfind('.')
                .map_or(file, |dot| &file[..dot]);
            format!("GLB {stem}")
        }
        SceneKind::Plan => format!("PLAN {id}"),
        SceneKind::Configuration => {
            let last = id.rsplit('@').next().unwrap_or(id);
            let mut parts = last.split(':');
            match (parts.next(), parts.next()) {
                (Some(first), Some(second)) => format!("{first} {second}"),
                (Some(first), None) => first.to_string(),
                _ => last.to_string(),
            }
        }
    }
}

/// Ordered list of scene sources with unique display names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneSourceContainer {
    scenes: Vec<SceneSourceModel>,
}

impl SceneSourceContainer {
    /// Create an empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Sources in insertion order
    pub fn scenes(&self) -> &[SceneSourceModel] {
        &self.scenes
    }

    /// Classify and append every id
    ///
    /// A name already in use gets the first free numeric suffix, starting at 1.
    pub fn add_ids<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            let mut source = SceneSourceModel::from_id(id.as_ref());
            if self.contains_name(&source.name) {
                let base = source.name.clone();
                let mut suffix = 1;
                loop {
                    let candidate = format!("{base}{suffix}");
                    if !self.contains_name(&candidate) {
                        source.name = candidate;
                        break;
                    }
                    suffix += 1;
                }
            }
            log::debug!("Scene source {:?} '{}' -> {}", source.kind, source.name, source.id);
            self.scenes.push(source);
        }
    }

    /// Source with display name `name`
    pub fn find_by_name(&self, name: &str) -> Option<&SceneSourceModel> {
        self.scenes.iter().find(|source| source.name == name)
    }

    fn contains_name(&self, name: &str) -> bool {
        self.find_by_name(name).is_some()
    }

    /// Menu map: display name to the RON-serialized source
    pub fn scene_menu(&self) -> Result<BTreeMap<String, String>, ron::Error> {
        self.scenes
            .iter()
            .map(|source| Ok((source.name.clone(), ron::to_string(source)?)))
            .collect()
    }
}
