//! Shader binary loading.
//!
//! Shader binaries are externally compiled SPIR-V, consumed as opaque words.

use crate::error::{GpuError, Result};
use std::fs::File;
use std::path::Path;

/// Read an entire SPIR-V binary from disk.
pub fn load_spirv(path: impl AsRef<Path>) -> Result<Vec<u32>> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|source| GpuError::ShaderLoad {
        path: path.to_path_buf(),
        source,
    })?;
    ash::util::read_spv(&mut file).map_err(|source| GpuError::ShaderLoad {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_path() {
        let err = load_spirv("/nonexistent/shader.spv").unwrap_err();
        match err {
            GpuError::ShaderLoad { path, .. } => {
                assert_eq!(path.to_str(), Some("/nonexistent/shader.spv"));
            }
            other => panic!("expected ShaderLoad, got {other}"),
        }
    }
}
