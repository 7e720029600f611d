//! Image store: materializes report images into a flat output directory.
//!
//! Every image that ends up in a report is re-encoded into the images
//! directory under a name derived from its [`ImageRole`], so a report never
//! points at files outside the directory it was generated into.

use crate::config::{ImageFormat, ReportConfig};
use crate::error::{ReportError, Result};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::DynamicImage;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Semantic label that fixes a stored image's file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageRole {
    /// Primary result image.
    Result1,
    /// Secondary result image (typically a graph).
    Result2,
    /// "Before" image of the error pair at the given index.
    ErrorOrigin(usize),
    /// "After" image of the error pair at the given index.
    ErrorResult(usize),
}

impl ImageRole {
    /// File stem used inside the images directory.
    pub fn file_stem(&self) -> String {
        self.to_string()
    }

    /// Alt text for the rendered `<img>` element.
    pub fn alt_text(&self) -> String {
        match self {
            ImageRole::Result1 => "Result_1".to_string(),
            ImageRole::Result2 => "Result_2".to_string(),
            ImageRole::ErrorOrigin(i) => format!("Error_Origin_{}", i),
            ImageRole::ErrorResult(i) => format!("Error_Result_{}", i),
        }
    }
}

impl std::fmt::Display for ImageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageRole::Result1 => write!(f, "result_1"),
            ImageRole::Result2 => write!(f, "result_2"),
            ImageRole::ErrorOrigin(i) => write!(f, "error_origin_{}", i),
            ImageRole::ErrorResult(i) => write!(f, "error_result_{}", i),
        }
    }
}

/// Where an image comes from.
#[derive(Debug, Clone)]
pub enum ImageReference {
    /// Image file on disk, decoded on store.
    File(PathBuf),
    /// Already-decoded pixel buffer.
    Decoded(DynamicImage),
}

impl From<PathBuf> for ImageReference {
    fn from(path: PathBuf) -> Self {
        ImageReference::File(path)
    }
}

impl From<&Path> for ImageReference {
    fn from(path: &Path) -> Self {
        ImageReference::File(path.to_path_buf())
    }
}

impl From<DynamicImage> for ImageReference {
    fn from(image: DynamicImage) -> Self {
        ImageReference::Decoded(image)
    }
}

/// An image materialized inside the images directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Role the image was stored under.
    pub role: ImageRole,
    /// File name inside the images directory.
    pub file_name: String,
    /// Path of the written file.
    pub path: PathBuf,
    /// Path relative to the HTML output directory, `/`-separated.
    pub src: String,
}

/// Create `path` (and parents) as a directory.
///
/// No-op when the directory already exists; fails if `path` exists as
/// something other than a directory.
pub fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() && !path.is_dir() {
        return Err(ReportError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    fs::create_dir_all(path).map_err(|e| ReportError::io(path, e))
}

/// Writes images for one report into a flat directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    directory: PathBuf,
    html_dir: PathBuf,
    format: ImageFormat,
    jpeg_quality: u8,
}

impl ImageStore {
    /// Open a store rooted at `directory`, creating it if needed.
    ///
    /// `html_dir` is the directory the report HTML will live in; embedding
    /// paths are computed relative to it.
    pub fn open(
        directory: impl Into<PathBuf>,
        html_dir: impl Into<PathBuf>,
        config: &ReportConfig,
    ) -> Result<Self> {
        let directory = directory.into();
        ensure_directory(&directory)?;
        Ok(Self {
            directory,
            html_dir: html_dir.into(),
            format: config.image_format,
            jpeg_quality: config.jpeg_quality,
        })
    }

    /// The images directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Target path for a role.
    pub fn path_for(&self, role: ImageRole) -> PathBuf {
        self.directory
            .join(format!("{}.{}", role.file_stem(), self.format.extension()))
    }

    /// Resolve `reference` and write it under `role`, overwriting any
    /// previous file of that name.
    pub fn store(&self, reference: &ImageReference, role: ImageRole) -> Result<StoredImage> {
        match reference {
            ImageReference::File(path) => {
                let image = read_image(path, role)?;
                self.store_decoded(&image, role)
            }
            ImageReference::Decoded(image) => self.store_decoded(image, role),
        }
    }

    /// Encode an in-memory image and write it under `role`.
    pub fn store_decoded(&self, image: &DynamicImage, role: ImageRole) -> Result<StoredImage> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ReportError::EmptyImage {
                role,
                width: image.width(),
                height: image.height(),
            });
        }

        let bytes = self.encode(image, role)?;
        let path = self.path_for(role);
        write_atomic(&path, &bytes)?;

        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let src = relative_src(&path, &self.html_dir);

        debug!(
            role = %role,
            path = %path.display(),
            bytes = bytes.len(),
            "Stored image"
        );

        Ok(StoredImage {
            role,
            file_name,
            path,
            src,
        })
    }

    fn encode(&self, image: &DynamicImage, role: ImageRole) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let encoded = match self.format {
            ImageFormat::Png => image.write_with_encoder(PngEncoder::new(&mut buf)),
            ImageFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                rgb.write_with_encoder(JpegEncoder::new_with_quality(
                    &mut buf,
                    self.jpeg_quality,
                ))
            }
        };
        encoded.map_err(|source| ReportError::EncodeFailure { role, source })?;
        Ok(buf)
    }
}

fn read_image(path: &Path, role: ImageRole) -> Result<DynamicImage> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ReportError::ImageNotFound {
                role,
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(ReportError::io(path, e)),
    };
    image::load_from_memory(&bytes).map_err(|source| ReportError::DecodeFailure {
        role,
        path: path.to_path_buf(),
        source,
    })
}

/// Write `bytes` to `path` through a sibling temp file and a rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let tmp_path = path.with_file_name(format!(".{}.tmp.{}", file_name, std::process::id()));
    {
        let file = fs::File::create(&tmp_path).map_err(|e| ReportError::io(&tmp_path, e))?;
        let file = write_or_discard(file, &tmp_path, bytes)?;
        let _ = file.sync_all();
    }
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        ReportError::io(path, e)
    })
}

/// Write `bytes` into the open temp file, removing it if the write fails.
fn write_or_discard<W: Write>(mut file: W, tmp_path: &Path, bytes: &[u8]) -> Result<W> {
    match file.write_all(bytes) {
        Ok(()) => Ok(file),
        Err(e) => {
            drop(file);
            let _ = fs::remove_file(tmp_path);
            Err(ReportError::io(tmp_path, e))
        }
    }
}

/// Path of `target` as seen from `base_dir`, suitable for an HTML `src`.
///
/// Falls back to the absolute path when the two share no root.
pub fn relative_src(target: &Path, base_dir: &Path) -> String {
    let target = absolutize(target);
    let base = absolutize(base_dir);
    let path = relative_to(&target, &base).unwrap_or(target);
    path.to_string_lossy().replace('\\', "/")
}

fn absolutize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

fn relative_to(target: &Path, base: &Path) -> Option<PathBuf> {
    let target: Vec<Component<'_>> = target.components().collect();
    let base: Vec<Component<'_>> = base.components().collect();
    if target.first() != base.first() {
        return None;
    }

    let common = target
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for component in &target[common..] {
        rel.push(component);
    }
    Some(rel)
}
