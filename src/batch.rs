//! Batch conversion of a directory of annotated scores
//!
//! Files are processed in sorted name order, one RomanText file each. The
//! first failure stops the batch; files already written stay in place.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ConverterConfig;
use crate::errors::{ConversionError, Result};
use crate::extract::extract_annotations;
use crate::humdrum::{parse_kern, preprocess, preprocess_file};
use crate::rntxt::{render_rntxt, HeaderContext};
use crate::score::ScoreSource;

/// Converts BCMH **kern files to RomanText according to a [`ConverterConfig`]
#[derive(Debug, Clone)]
pub struct BatchConverter {
    config: ConverterConfig,
}

impl BatchConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Convert the text of one annotated score
    pub fn convert_str(&self, text: &str) -> Result<String> {
        self.convert_preprocessed(&preprocess(text))
    }

    /// Read and convert one annotated score file
    pub fn convert_file(&self, path: &Path) -> Result<String> {
        self.convert_preprocessed(&preprocess_file(path)?)
    }

    fn convert_preprocessed(&self, text: &str) -> Result<String> {
        let score = parse_kern(text)?;
        let annotations = extract_annotations(&score)?;
        let header = HeaderContext::new(score.metadata())
            .analyst(self.config.analyst.as_str())
            .proofreader(self.config.proofreader.as_str());
        Ok(render_rntxt(&header, &annotations)?)
    }

    /// Input files in conversion order
    pub fn input_files(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.config.input_dir;
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| ConversionError::io(dir, e))? {
            let entry = entry.map_err(|e| ConversionError::io(dir, e))?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Convert every input file; returns the written output paths
    pub fn run(&self) -> Result<Vec<PathBuf>> {
        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir).map_err(|e| ConversionError::io(output_dir, e))?;

        let mut written = Vec::new();
        for input in self.input_files()? {
            let name = input
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            log::info!("{}", name);

            let rntxt = self.convert_file(&input)?;
            let output = output_dir.join(self.config.output_file_name(&name));
            fs::write(&output, rntxt).map_err(|e| ConversionError::io(&output, e))?;
            log::debug!("wrote {}", output.display());
            written.push(output);
        }
        Ok(written)
    }
}
