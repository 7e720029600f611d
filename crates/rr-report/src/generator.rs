//! Report generator implementation.

use crate::browser::open_in_browser;
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::image_store::{
    ensure_directory, write_atomic, ImageReference, ImageRole, ImageStore, StoredImage,
};
use crate::sections::{ErrorPair, ErrorSection, ErrorSectionBuilder, ImageLoader, ResultsSection};
use crate::template::{tokens, Substitutions, Template};

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Inputs for one report.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    /// Report title.
    pub title: String,
    /// Evaluation value, inserted as text.
    pub evaluation: String,
    /// Free-form message.
    pub message: String,
    /// Primary result image.
    pub result_1: Option<ImageReference>,
    /// Secondary result image.
    pub result_2: Option<ImageReference>,
    /// Before/after error pairs, rendered in this order.
    pub error_pairs: Vec<ErrorPair>,
    /// Where the HTML is written.
    pub output_path: PathBuf,
    /// Template file; the built-in template when `None`.
    pub template_path: Option<PathBuf>,
    /// Flat directory that receives every stored image.
    pub images_dir: PathBuf,
    /// Open the finished report in the default browser.
    pub open_browser: bool,
}

impl ReportRequest {
    /// Request with text fields and output locations set, everything else
    /// empty.
    pub fn new(
        title: impl Into<String>,
        evaluation: impl Into<String>,
        message: impl Into<String>,
        output_path: impl Into<PathBuf>,
        images_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            title: title.into(),
            evaluation: evaluation.into(),
            message: message.into(),
            result_1: None,
            result_2: None,
            error_pairs: Vec::new(),
            output_path: output_path.into(),
            template_path: None,
            images_dir: images_dir.into(),
            open_browser: false,
        }
    }

    /// Set the primary result image.
    pub fn with_result_1(mut self, reference: impl Into<ImageReference>) -> Self {
        self.result_1 = Some(reference.into());
        self
    }

    /// Set the secondary result image.
    pub fn with_result_2(mut self, reference: impl Into<ImageReference>) -> Self {
        self.result_2 = Some(reference.into());
        self
    }

    /// Set the error pairs.
    pub fn with_error_pairs(mut self, pairs: Vec<ErrorPair>) -> Self {
        self.error_pairs = pairs;
        self
    }

    /// Use a template file instead of the built-in one.
    pub fn with_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    /// Open the report in a browser after writing it.
    pub fn with_open_browser(mut self, open: bool) -> Self {
        self.open_browser = open;
        self
    }

    /// Reject requests that cannot produce a report before touching disk.
    pub fn validate(&self) -> Result<()> {
        if self.output_path.as_os_str().is_empty() {
            return Err(ReportError::InvalidRequest(
                "output path is empty".to_string(),
            ));
        }
        if self.output_path.is_dir() {
            return Err(ReportError::InvalidRequest(format!(
                "output path is a directory: {}",
                self.output_path.display()
            )));
        }
        if self.images_dir.as_os_str().is_empty() {
            return Err(ReportError::InvalidRequest(
                "images directory is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory containing the output HTML.
    pub fn html_dir(&self) -> &Path {
        match self.output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

/// What a successful generation produced.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    /// Path of the written HTML.
    pub output_path: PathBuf,
    /// Every image written for the report.
    pub stored_images: Vec<StoredImage>,
    /// Number of error pairs rendered.
    pub error_count: usize,
    /// Size of the written HTML.
    pub bytes: usize,
    /// Whether the browser launch succeeded (false when not requested).
    pub browser_opened: bool,
}

/// Report generator.
pub struct ReportGenerator {
    config: ReportConfig,
}

impl ReportGenerator {
    /// Create a new report generator with configuration.
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// Create a generator with default configuration.
    pub fn default_config() -> Self {
        Self::new(ReportConfig::default())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Generate a report reading error pairs from the filesystem.
    pub fn generate(&self, request: &ReportRequest) -> Result<ReportOutcome> {
        self.generate_with_loader(request, None)
    }

    /// Generate a report, resolving error pairs through `loader` when given.
    ///
    /// Steps run in order and the first failure aborts: images directory,
    /// result images, error pairs, template, HTML write. Images written before
    /// a failure are left in place; the HTML is only written once everything
    /// else has succeeded.
    pub fn generate_with_loader(
        &self,
        request: &ReportRequest,
        loader: Option<&dyn ImageLoader>,
    ) -> Result<ReportOutcome> {
        self.config.validate()?;
        request.validate()?;
        debug!(
            output = %request.output_path.display(),
            images_dir = %request.images_dir.display(),
            error_pairs = request.error_pairs.len(),
            custom_loader = loader.is_some(),
            "Generating report"
        );

        let store = ImageStore::open(&request.images_dir, request.html_dir(), &self.config)?;

        let results = ResultsSection {
            result_1: store_optional(&store, request.result_1.as_ref(), ImageRole::Result1)?,
            result_2: store_optional(&store, request.result_2.as_ref(), ImageRole::Result2)?,
        };

        let errors = ErrorSectionBuilder::new(&store)
            .with_loader(loader)
            .build(&request.error_pairs)?;

        let template = match &request.template_path {
            Some(path) => Template::load(path)?,
            None => Template::builtin(),
        };
        let html = template.render(&self.substitutions(request, &results, &errors));

        if let Some(parent) = request.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_directory(parent)?;
            }
        }
        write_atomic(&request.output_path, html.as_bytes())?;

        info!(
            output = %request.output_path.display(),
            bytes = html.len(),
            error_count = errors.count(),
            title = %request.title,
            "Report generated"
        );

        let browser_opened = request.open_browser && open_in_browser(&request.output_path);

        let stored_images = results
            .stored_images()
            .chain(errors.stored_images())
            .cloned()
            .collect();

        Ok(ReportOutcome {
            output_path: request.output_path.clone(),
            stored_images,
            error_count: errors.count(),
            bytes: html.len(),
            browser_opened,
        })
    }

    fn substitutions(
        &self,
        request: &ReportRequest,
        results: &ResultsSection,
        errors: &ErrorSection,
    ) -> Substitutions {
        let empty = &self.config.empty_label;
        Substitutions::new()
            .with(tokens::TITLE, request.title.as_str())
            .with(tokens::EVALUATION, request.evaluation.as_str())
            .with(tokens::MESSAGE, request.message.as_str())
            .with(tokens::ERROR_ROWS, errors.to_html(empty))
            .with(tokens::ERROR_COUNT, errors.count().to_string())
            .with(tokens::RESULT_1, results.result_1_html(empty))
            .with(tokens::RESULT_2, results.result_2_html(empty))
            .with(tokens::RESULT_1_SRC, results.result_1_src())
            .with(tokens::RESULT_2_SRC, results.result_2_src())
    }
}

fn store_optional(
    store: &ImageStore,
    reference: Option<&ImageReference>,
    role: ImageRole,
) -> Result<Option<StoredImage>> {
    reference.map(|r| store.store(r, role)).transpose()
}

/// Generate a report with the default configuration.
pub fn generate_report(request: &ReportRequest) -> Result<ReportOutcome> {
    ReportGenerator::default_config().generate(request)
}

/// Generate a report with the default configuration and a custom loader for
/// error pairs.
pub fn generate_report_with_loader(
    request: &ReportRequest,
    loader: &dyn ImageLoader,
) -> Result<ReportOutcome> {
    ReportGenerator::default_config().generate_with_loader(request, Some(loader))
}

/// Create the images directory ahead of time, e.g. before other tools drop
/// files into it.
pub fn ensure_images_directory(path: &Path) -> Result<()> {
    ensure_directory(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use tempfile::TempDir;

    fn image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 200, 200])))
    }

    #[test]
    fn test_report_generator_default() {
        let generator = ReportGenerator::default_config();
        assert_eq!(generator.config().empty_label, "なし");
    }

    #[test]
    fn test_minimal_report() {
        let dir = TempDir::new().unwrap();
        let request = ReportRequest::new(
            "Title",
            "0.5",
            "no errors",
            dir.path().join("report.html"),
            dir.path().join("images"),
        );
        let outcome = generate_report(&request).unwrap();

        let html = std::fs::read_to_string(&outcome.output_path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Title</title>"));
        assert!(html.contains("<tr><td colspan=\"2\">なし</td></tr>"));
        assert!(!html.contains("<img"));
        assert_eq!(outcome.error_count, 0);
        assert!(outcome.stored_images.is_empty());
        assert!(!outcome.browser_opened);
        assert!(dir.path().join("images").is_dir());
    }

    #[test]
    fn test_output_parent_created() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("nested").join("deeper").join("report.html");
        let request = ReportRequest::new("T", "1", "m", &output, dir.path().join("img"))
            .with_result_1(image(5, 5));
        let outcome = generate_report(&request).unwrap();
        assert!(output.is_file());

        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains("src=\"../../img/result_1.png\""));
        assert_eq!(outcome.stored_images.len(), 1);
    }

    #[test]
    fn test_output_directory_is_invalid_request() {
        let dir = TempDir::new().unwrap();
        let request = ReportRequest::new("T", "1", "m", dir.path(), dir.path().join("img"));
        let err = generate_report(&request).unwrap_err();
        assert!(matches!(err, ReportError::InvalidRequest(_)));
        assert!(!dir.path().join("img").exists());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(ReportConfig::new().with_jpeg_quality(0));
        let request = ReportRequest::new(
            "T",
            "1",
            "m",
            dir.path().join("r.html"),
            dir.path().join("img"),
        );
        assert!(matches!(
            generator.generate(&request),
            Err(ReportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_html_dir_for_bare_file_name() {
        let request = ReportRequest::new("T", "1", "m", "report.html", "images");
        assert_eq!(request.html_dir(), Path::new("."));
    }
}
