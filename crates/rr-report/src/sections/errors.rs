//! Error pair section: one table row per before/after image pair.

use crate::error::{ReportError, Result};
use crate::image_store::{ImageReference, ImageRole, ImageStore, StoredImage};

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Error type returned by custom image loaders.
pub type LoaderError = Box<dyn std::error::Error + Send + Sync>;

/// A before/after image pair for one detected error.
///
/// Both references are file paths unless a custom [`ImageLoader`] is used,
/// in which case they are opaque keys handed to the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPair {
    /// Reference to the original ("before") image.
    pub origin: String,
    /// Reference to the result ("after") image.
    pub result: String,
}

impl ErrorPair {
    /// Create a new pair.
    pub fn new(origin: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            result: result.into(),
        }
    }
}

/// Resolves error pair references to in-memory images, bypassing the
/// filesystem.
pub trait ImageLoader {
    /// Load the origin and result image for one pair.
    fn load_pair(
        &self,
        origin: &str,
        result: &str,
    ) -> std::result::Result<(DynamicImage, DynamicImage), LoaderError>;
}

impl<F> ImageLoader for F
where
    F: Fn(&str, &str) -> std::result::Result<(DynamicImage, DynamicImage), LoaderError>,
{
    fn load_pair(
        &self,
        origin: &str,
        result: &str,
    ) -> std::result::Result<(DynamicImage, DynamicImage), LoaderError> {
        self(origin, result)
    }
}

/// Rendered markup for one error pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRowFragment {
    /// Position in the input sequence.
    pub index: usize,
    /// Stored origin image.
    pub origin: StoredImage,
    /// Stored result image.
    pub result: StoredImage,
}

impl ErrorRowFragment {
    /// HTML table row for this pair.
    pub fn to_html(&self) -> String {
        format!(
            concat!(
                "        <tr class=\"error-row\">\n",
                "          <td><img src=\"{}\" alt=\"{}\"></td>\n",
                "          <td><img src=\"{}\" alt=\"{}\"></td>\n",
                "        </tr>"
            ),
            self.origin.src,
            self.origin.role.alt_text(),
            self.result.src,
            self.result.role.alt_text(),
        )
    }
}

/// All error rows of a report, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSection {
    /// Row fragments in input order.
    pub rows: Vec<ErrorRowFragment>,
}

impl ErrorSection {
    /// Number of error pairs.
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Concatenated row markup; a single placeholder row when empty.
    pub fn to_html(&self, empty_label: &str) -> String {
        if self.rows.is_empty() {
            return format!("        <tr><td colspan=\"2\">{}</td></tr>", empty_label);
        }
        self.rows
            .iter()
            .map(ErrorRowFragment::to_html)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Every image stored for this section.
    pub fn stored_images(&self) -> impl Iterator<Item = &StoredImage> {
        self.rows.iter().flat_map(|row| [&row.origin, &row.result])
    }
}

/// Materializes error pairs through an [`ImageStore`].
///
/// Fails fast: the first pair that cannot be resolved aborts the build.
/// Images of earlier pairs stay on disk.
pub struct ErrorSectionBuilder<'a> {
    store: &'a ImageStore,
    loader: Option<&'a dyn ImageLoader>,
}

impl<'a> ErrorSectionBuilder<'a> {
    /// Builder reading pairs as file paths.
    pub fn new(store: &'a ImageStore) -> Self {
        Self {
            store,
            loader: None,
        }
    }

    /// Resolve pairs through a custom loader instead of the filesystem.
    pub fn with_loader(mut self, loader: Option<&'a dyn ImageLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Store every pair and render the rows.
    pub fn build(&self, pairs: &[ErrorPair]) -> Result<ErrorSection> {
        let mut rows = Vec::with_capacity(pairs.len());

        for (index, pair) in pairs.iter().enumerate() {
            let origin_role = ImageRole::ErrorOrigin(index);
            let result_role = ImageRole::ErrorResult(index);

            let (origin, result) = match self.loader {
                Some(loader) => {
                    let (origin_img, result_img) = loader
                        .load_pair(&pair.origin, &pair.result)
                        .map_err(|e| ReportError::LoaderFailure {
                            index,
                            reason: e.to_string(),
                        })?;
                    (
                        self.store_loaded(&origin_img, origin_role, index)?,
                        self.store_loaded(&result_img, result_role, index)?,
                    )
                }
                None => (
                    self.store
                        .store(&ImageReference::File(PathBuf::from(&pair.origin)), origin_role)?,
                    self.store
                        .store(&ImageReference::File(PathBuf::from(&pair.result)), result_role)?,
                ),
            };

            debug!(index, origin = %origin.src, result = %result.src, "Stored error pair");
            rows.push(ErrorRowFragment {
                index,
                origin,
                result,
            });
        }

        Ok(ErrorSection { rows })
    }

    fn store_loaded(
        &self,
        image: &DynamicImage,
        role: ImageRole,
        index: usize,
    ) -> Result<StoredImage> {
        self.store
            .store_decoded(image, role)
            .map_err(|e| match e {
                ReportError::EmptyImage { width, height, .. } => ReportError::LoaderFailure {
                    index,
                    reason: format!("loader returned an empty {} image ({}x{})", role, width, height),
                },
                other => other,
            })
    }
}
