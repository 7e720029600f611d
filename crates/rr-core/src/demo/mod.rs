//! Demo report with generated inputs.
//!
//! Produces everything a report needs inside one working directory:
//! a synthetic histogram as the secondary result, placeholder images for the
//! primary result and the error pairs, and a request pointing at them. Real
//! images found in an optional source directory are used instead of
//! placeholders.

pub mod images;
pub mod loader;

pub use images::{dummy_image, fake_histogram};
pub use loader::{synthetic_key, SyntheticLoader};

use rr_report::{
    ensure_images_directory, ErrorPair, ImageReference, ImageRole, ImageStore, ReportConfig,
    ReportRequest, Result,
};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_TITLE: &str = "出力結果";
pub const DEFAULT_EVALUATION: &str = "0.75";
pub const DEFAULT_ERROR_COUNT: usize = 5;

/// Subdirectory receiving the stored report images.
pub const IMAGES_SUBDIR: &str = "result_images";
/// Subdirectory receiving placeholder error images.
pub const DUMMY_SUBDIR: &str = "dummy";
/// HTML file name inside the working directory.
pub const OUTPUT_FILE: &str = "output.html";

/// Message shown for `count` detected error images.
pub fn default_message(count: usize) -> String {
    format!("エラー画像が{}ファイル検出されました", count)
}

#[derive(Debug, Clone)]
pub struct DemoOptions {
    /// Directory that receives the report, its images and placeholders.
    pub work_dir: PathBuf,
    /// Directory searched for `result_1.png` and `error_{origin,result}_<i>.png`.
    pub source_dir: Option<PathBuf>,
    pub error_count: usize,
    /// Resolve error pairs through [`SyntheticLoader`] instead of files.
    pub synthetic: bool,
    pub open_browser: bool,
}

impl DemoOptions {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            source_dir: None,
            error_count: DEFAULT_ERROR_COUNT,
            synthetic: false,
            open_browser: false,
        }
    }
}

/// Write the demo inputs and return the request that renders them.
pub fn prepare(options: &DemoOptions) -> Result<ReportRequest> {
    let work_dir = &options.work_dir;
    let images_dir = work_dir.join(IMAGES_SUBDIR);
    ensure_images_directory(&images_dir)?;

    let config = ReportConfig::default();

    // The histogram lands at its final name; storing it again rewrites it in
    // place.
    let graph_store = ImageStore::open(&images_dir, work_dir, &config)?;
    let graph = graph_store.store_decoded(&fake_histogram(), ImageRole::Result2)?;

    let result_1 = match find_source(options, "result_1.png") {
        Some(path) => ImageReference::File(path),
        None => ImageReference::Decoded(dummy_image("Result 1")),
    };

    let error_pairs = if options.synthetic {
        (0..options.error_count)
            .map(|i| {
                ErrorPair::new(
                    synthetic_key(&format!("Origin {i}")),
                    synthetic_key(&format!("Result {i}")),
                )
            })
            .collect()
    } else {
        file_error_pairs(options, &config)?
    };

    debug!(
        work_dir = %work_dir.display(),
        error_pairs = error_pairs.len(),
        synthetic = options.synthetic,
        "Prepared demo inputs"
    );

    Ok(ReportRequest::new(
        DEFAULT_TITLE,
        DEFAULT_EVALUATION,
        default_message(options.error_count),
        work_dir.join(OUTPUT_FILE),
        images_dir,
    )
    .with_result_1(result_1)
    .with_result_2(graph.path)
    .with_error_pairs(error_pairs)
    .with_open_browser(options.open_browser))
}

fn file_error_pairs(options: &DemoOptions, config: &ReportConfig) -> Result<Vec<ErrorPair>> {
    let dummy_store = ImageStore::open(
        &options.work_dir.join(DUMMY_SUBDIR),
        &options.work_dir,
        config,
    )?;
    let mut pairs = Vec::with_capacity(options.error_count);

    for i in 0..options.error_count {
        let origin =
            source_or_dummy(options, &dummy_store, ImageRole::ErrorOrigin(i), &format!("Origin {i}"))?;
        let result =
            source_or_dummy(options, &dummy_store, ImageRole::ErrorResult(i), &format!("Result {i}"))?;
        pairs.push(ErrorPair::new(
            origin.to_string_lossy(),
            result.to_string_lossy(),
        ));
    }

    Ok(pairs)
}

/// The source image stored under `role`'s name, or a fresh placeholder.
fn source_or_dummy(
    options: &DemoOptions,
    dummy_store: &ImageStore,
    role: ImageRole,
    label: &str,
) -> Result<PathBuf> {
    if let Some(path) = find_source(options, &format!("{role}.png")) {
        return Ok(path);
    }
    let stored = dummy_store.store_decoded(&dummy_image(label), role)?;
    Ok(stored.path)
}

fn find_source(options: &DemoOptions, file_name: &str) -> Option<PathBuf> {
    let dir: &Path = options.source_dir.as_deref()?;
    let path = dir.join(file_name);
    path.is_file().then_some(path)
}
