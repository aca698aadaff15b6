//! Directory-backed kernel
//!
//! Serves recorded kernel output from `<root>/<id>.ron` files, each holding
//! one [`KernelRecord`]. Used for tests and for replaying captured kernel
//! sessions without the kernel itself.

use std::path::{Path, PathBuf};

use futures::future::{FutureExt, LocalBoxFuture};
use serde::{Deserialize, Serialize};

use super::{Kernel, KernelError, KernelPlan, MeshConstructionData};

/// Recorded kernel output for one id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KernelRecord {
    /// Output of a configuration query
    Configuration(MeshConstructionData),
    /// Output of a plan query
    Plan(KernelPlan),
}

/// Kernel replaying RON fixtures from a directory
#[derive(Debug, Clone)]
pub struct RonKernel {
    root: PathBuf,
}

impl RonKernel {
    /// Serve fixtures from `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Fixture directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File a record for `id` lives in
    ///
    /// Characters that are awkward in file names (`:`, `@`, `/`, ...) are
    /// replaced with `_`.
    pub fn record_path(&self, id: &str) -> PathBuf {
        let file_stem: String = id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file_stem}.ron"))
    }

    /// Write a record for `id`, creating the directory if needed
    pub fn save_record(&self, id: &str, record: &KernelRecord) -> Result<(), KernelError> {
        let failed = |reason: String| KernelError::QueryFailed(format!("{id}: {reason}"));
        std::fs::create_dir_all(&self.root).map_err(|e| failed(e.to_string()))?;
        let text = ron::ser::to_string_pretty(record, ron::ser::PrettyConfig::default())
            .map_err(|e| failed(e.to_string()))?;
        std::fs::write(self.record_path(id), text).map_err(|e| failed(e.to_string()))
    }

    fn read_record(&self, id: &str) -> Result<KernelRecord, KernelError> {
        let path = self.record_path(id);
        log::debug!("Reading kernel fixture {:?}", path);
        let text = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                KernelError::NotFound(id.to_string())
            } else {
                KernelError::QueryFailed(format!("{}: {e}", path.display()))
            }
        })?;
        ron::from_str(&text).map_err(|e| KernelError::Malformed {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Kernel for RonKernel {
    fn construct_mesh<'a>(
        &'a self,
        configuration_id: &'a str,
    ) -> LocalBoxFuture<'a, Result<MeshConstructionData, KernelError>> {
        async move {
            match self.read_record(configuration_id)? {
                KernelRecord::Configuration(data) => Ok(data),
                KernelRecord::Plan(_) => Err(KernelError::Malformed {
                    id: configuration_id.to_string(),
                    reason: "expected a configuration record, found a plan".to_string(),
                }),
            }
        }
        .boxed_local()
    }

    fn load_plan<'a>(&'a self, plan_id: &'a str) -> LocalBoxFuture<'a, Result<KernelPlan, KernelError>> {
        async move {
            match self.read_record(plan_id)? {
                KernelRecord::Plan(plan) => Ok(plan),
                KernelRecord::Configuration(_) => Err(KernelError::Malformed {
                    id: plan_id.to_string(),
                    reason: "expected a plan record, found a configuration".to_string(),
                }),
            }
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::MeshSpecification;

    #[test]
    fn test_saved_configuration_is_served_back() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = RonKernel::new(dir.path());
        let data = MeshConstructionData {
            meshes: vec![MeshSpecification {
                material_id: "oak".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        kernel
            .save_record("brand:sku@cfg1", &KernelRecord::Configuration(data.clone()))
            .unwrap();

        assert!(kernel.record_path("brand:sku@cfg1").ends_with("brand_sku_cfg1.ron"));
        let loaded = pollster::block_on(kernel.construct_mesh("brand:sku@cfg1")).unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn test_missing_and_mismatched_records() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = RonKernel::new(dir.path());
        let missing = pollster::block_on(kernel.load_plan("ps_1"));
        assert_eq!(missing, Err(KernelError::NotFound("ps_1".to_string())));

        kernel
            .save_record("ps_2", &KernelRecord::Plan(KernelPlan::default()))
            .unwrap();
        let wrong_kind = pollster::block_on(kernel.construct_mesh("ps_2"));
        assert!(matches!(wrong_kind, Err(KernelError::Malformed { .. })));
    }

    #[test]
    fn test_garbage_fixture_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ps_3.ron"), "not ron at all (").unwrap();
        let kernel = RonKernel::new(dir.path());
        let result = pollster::block_on(kernel.load_plan("ps_3"));
        assert!(matches!(result, Err(KernelError::Malformed { .. })));
    }
}
