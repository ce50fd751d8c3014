//! External engine description loaded from a TOML file.

use std::path::{Path, PathBuf};

use gtp_engine::EngineConfig;
use serde::Deserialize;

/// On-disk shape of the engine file, e.g.:
///
/// ```toml
/// binary = "engine/kataAmazon"
/// working_dir = "engine"
/// config_file = "engine.cfg"
/// model_file = "weights/amazons10x10.bin.gz"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct EngineFile {
    pub binary: PathBuf,
    pub working_dir: PathBuf,
    #[serde(default = "default_config_file")]
    pub config_file: String,
    #[serde(default = "default_model_file")]
    pub model_file: String,
}

fn default_config_file() -> String {
    "engine.cfg".to_string()
}

fn default_model_file() -> String {
    "weights/amazons10x10.bin.gz".to_string()
}

pub fn load_engine_config(path: &Path) -> Result<EngineConfig, String> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
    let file: EngineFile =
        toml::from_str(&contents).map_err(|e| format!("Failed to parse {:?}: {}", path, e))?;
    Ok(EngineConfig {
        binary: file.binary,
        working_dir: file.working_dir,
        config_file: file.config_file,
        model_file: file.model_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_engine_file() {
        let file: EngineFile = toml::from_str(
            r#"
            binary = "engine/kataAmazon"
            working_dir = "engine"
            "#,
        )
        .unwrap();
        assert_eq!(file.config_file, "engine.cfg");
        assert_eq!(file.model_file, "weights/amazons10x10.bin.gz");
    }
}
