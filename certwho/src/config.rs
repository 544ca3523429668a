use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, Clone)]
pub struct ScanConfig {
    pub ports: Option<String>,
    pub timeout_ms: Option<u64>,
    pub rate: Option<u32>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    pub scan: Option<ScanConfig>,
    pub db: Option<PathBuf>,
    pub feed_url: Option<String>,
}

pub fn load_config(path: Option<&Path>) -> Option<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new("certwho.yaml");
            if p.exists() { p.to_path_buf() } else { return None; }
        }
    };
    let s = fs::read_to_string(path).ok()?;
    serde_yaml::from_str(&s).ok()
}
