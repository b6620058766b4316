use std::fs::{create_dir_all, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::Result;
use crate::etl::normalize::SubstitutionMode;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct UserConfig {
    /// The .osm (or .osm.xz) extract to read.
    #[serde(default)]
    pub data_path: String,
    /// Directory for the output files. Defaults to the directory of `data_path`.
    #[serde(default)]
    pub dest_path: Option<String>,
    /// Indent each record instead of writing it on one line.
    #[serde(default)]
    pub pretty: bool,
    #[serde(default)]
    pub progress: bool,
    #[serde(default)]
    pub name_substitution: SubstitutionMode,
}

pub fn load_user_config(path: &Path) -> Result<UserConfig> {
    let file = File::open(path)
        .map_err(|err| format!("Could not open config file {}: {err}", path.display()))?;
    let config = serde_json::from_reader(BufReader::new(file))
        .map_err(|err| format!("Could not parse config {}: {err}", path.display()))?;
    Ok(config)
}

impl UserConfig {
    pub fn new(data_path: &str) -> UserConfig {
        UserConfig {
            data_path: data_path.to_string(),
            ..Default::default()
        }
    }

    pub fn create_output_dir(&self) -> Result<PathBuf> {
        if self.data_path.is_empty() {
            return Err("No input file given".into());
        }
        let output_dir = match &self.dest_path {
            Some(dest_path) => PathBuf::from(dest_path),
            None => Path::new(&self.data_path)
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        create_dir_all(&output_dir)?;
        Ok(output_dir)
    }
}
