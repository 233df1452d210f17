//! Converter configuration
//!
//! Defaults reproduce the BCMH dataset layout, so running the converter from
//! the dataset's parent directory needs no configuration at all.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{ConversionError, Result};

pub const DEFAULT_ANALYST: &str =
    "The Bach Chorales Melody-Harmony Corpus. See https://github.com/PeARL-laboratory/BCMH";
pub const DEFAULT_PROOFREADER: &str = "Automated translation by Néstor Nápoles López";

/// Configuration options for a batch conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Directory holding the annotated **kern files
    pub input_dir: PathBuf,

    /// Directory receiving the .rntxt files (created if absent)
    pub output_dir: PathBuf,

    /// Extension replaced in output file names, without the dot
    pub input_extension: String,

    /// Extension of the written files, without the dot
    pub output_extension: String,

    /// Value of the `Analyst:` header line
    pub analyst: String,

    /// Value of the `Proofreader:` header line
    pub proofreader: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("BCMH_dataset/annotated"),
            output_dir: PathBuf::from("BCMH_dataset/rntxt"),
            input_extension: "krn".to_string(),
            output_extension: "rntxt".to_string(),
            analyst: DEFAULT_ANALYST.to_string(),
            proofreader: DEFAULT_PROOFREADER.to_string(),
        }
    }
}

impl ConverterConfig {
    /// Parse a YAML configuration; missing fields keep their defaults
    pub fn from_yaml_str(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| ConversionError::io(path, e))?;
        Self::from_yaml_str(&yaml).map_err(|source| ConversionError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Output file name for an input file name: `chor001.krn` -> `chor001.rntxt`
    pub fn output_file_name(&self, input_name: &str) -> String {
        let suffix = format!(".{}", self.input_extension);
        let stem = input_name.strip_suffix(&suffix).unwrap_or(input_name);
        format!("{}.{}", stem, self.output_extension)
    }
}
