//! Report manifests.
//!
//! A manifest describes one report in a file so that a run can be repeated
//! without a long command line. The format follows the file extension:
//! `.toml`, `.json`, or `.yaml`/`.yml`. Relative paths inside the manifest
//! resolve against the manifest's own directory.

use rr_report::{ErrorPair, ReportConfig, ReportRequest};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default HTML file name when the manifest names none.
pub const DEFAULT_OUTPUT: &str = "output.html";

/// Default images directory when the manifest names none.
pub const DEFAULT_IMAGES_DIR: &str = "result_images";

/// Errors raised while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {format} manifest {path}: {message}")]
    Parse {
        path: PathBuf,
        format: ManifestFormat,
        message: String,
    },

    #[error("unsupported manifest extension: {0} (expected .toml, .json, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),
}

/// Serialization format of a manifest file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Toml,
    Json,
    Yaml,
}

impl ManifestFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "toml" => Some(ManifestFormat::Toml),
            "json" => Some(ManifestFormat::Json),
            "yaml" | "yml" => Some(ManifestFormat::Yaml),
            _ => None,
        }
    }
}

impl std::fmt::Display for ManifestFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestFormat::Toml => write!(f, "toml"),
            ManifestFormat::Json => write!(f, "json"),
            ManifestFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// One report described in a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportManifest {
    pub title: String,
    pub evaluation: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result_1: Option<PathBuf>,
    #[serde(default)]
    pub result_2: Option<PathBuf>,
    #[serde(default)]
    pub error_pairs: Vec<ErrorPair>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub template: Option<PathBuf>,
    #[serde(default)]
    pub images_dir: Option<PathBuf>,
    #[serde(default)]
    pub open_browser: bool,
    #[serde(default)]
    pub config: ReportConfig,

    /// Directory relative paths were resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl ReportManifest {
    /// Read and parse a manifest, resolving its relative paths.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let format = ManifestFormat::from_path(path)
            .ok_or_else(|| ManifestError::UnsupportedFormat(path.to_path_buf()))?;

        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ManifestError::NotFound(path.to_path_buf())
            } else {
                ManifestError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let mut manifest = Self::parse(&content, format).map_err(|message| {
            ManifestError::Parse {
                path: path.to_path_buf(),
                format,
                message,
            }
        })?;

        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        manifest.resolve_paths(&base_dir);
        Ok(manifest)
    }

    /// Parse manifest text without touching the filesystem.
    pub fn parse(content: &str, format: ManifestFormat) -> Result<Self, String> {
        match format {
            ManifestFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ManifestFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            ManifestFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base_dir.join(&*p);
            }
        };
        self.result_1.iter_mut().for_each(join);
        self.result_2.iter_mut().for_each(join);
        self.output.iter_mut().for_each(join);
        self.template.iter_mut().for_each(join);
        self.images_dir.iter_mut().for_each(join);
        for pair in &mut self.error_pairs {
            pair.origin = resolve_reference(base_dir, &pair.origin);
            pair.result = resolve_reference(base_dir, &pair.result);
        }
        self.base_dir = base_dir.to_path_buf();
    }

    /// Build the generator request, filling in default locations.
    pub fn into_request(self) -> ReportRequest {
        let output = self
            .output
            .unwrap_or_else(|| self.base_dir.join(DEFAULT_OUTPUT));
        let images_dir = self
            .images_dir
            .unwrap_or_else(|| self.base_dir.join(DEFAULT_IMAGES_DIR));

        let mut request =
            ReportRequest::new(self.title, self.evaluation, self.message, output, images_dir)
                .with_error_pairs(self.error_pairs)
                .with_open_browser(self.open_browser);
        if let Some(path) = self.result_1 {
            request = request.with_result_1(path);
        }
        if let Some(path) = self.result_2 {
            request = request.with_result_2(path);
        }
        if let Some(path) = self.template {
            request = request.with_template(path);
        }
        request
    }
}

/// Error pair references are plain strings; anything that looks like a URI
/// is left alone for custom loaders.
fn resolve_reference(base_dir: &Path, reference: &str) -> String {
    if reference.contains("://") || Path::new(reference).is_absolute() {
        return reference.to_string();
    }
    base_dir.join(reference).to_string_lossy().into_owned()
}
