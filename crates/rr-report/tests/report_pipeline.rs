//! End-to-end tests for the report assembly pipeline.
//!
//! Validates:
//! - Images directory contents match the roles referenced by the HTML
//! - Error rows keep input order and naming
//! - Repeated generation is byte-identical
//! - Failures surface without writing the HTML
//! - Custom loaders bypass filesystem reads

use image::{DynamicImage, Rgb, RgbImage};
use rr_report::{
    generate_report, generate_report_with_loader, ErrorKind, ErrorPair, ImageFormat,
    ImageLoader, LoaderError, ReportConfig, ReportError, ReportGenerator, ReportRequest,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

/// Write a solid-color PNG and return its path.
fn write_png(path: &Path, width: u32, height: u32, color: [u8; 3]) -> PathBuf {
    RgbImage::from_pixel(width, height, Rgb(color))
        .save(path)
        .expect("write test image");
    path.to_path_buf()
}

/// Create `n` on-disk error pairs under `dir/source`.
fn error_pairs_on_disk(dir: &Path, n: usize) -> Vec<ErrorPair> {
    let source = dir.join("source");
    fs::create_dir_all(&source).unwrap();
    (0..n)
        .map(|i| {
            let shade = (i * 40 % 256) as u8;
            let origin = write_png(
                &source.join(format!("origin_{i}.png")),
                30,
                20,
                [shade, 0, 0],
            );
            let result = write_png(
                &source.join(format!("result_{i}.png")),
                30,
                20,
                [0, shade, 0],
            );
            ErrorPair::new(
                origin.to_string_lossy().into_owned(),
                result.to_string_lossy().into_owned(),
            )
        })
        .collect()
}

/// File names in a directory, sorted.
fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Snapshot of every file in a directory.
fn dir_contents(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    file_names(dir)
        .into_iter()
        .map(|name| {
            let bytes = fs::read(dir.join(&name)).unwrap();
            (name, bytes)
        })
        .collect()
}

fn synthetic_loader(
    origin: &str,
    result: &str,
) -> Result<(DynamicImage, DynamicImage), LoaderError> {
    let paint = |key: &str| {
        let shade = (key.len() * 17 % 256) as u8;
        DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 12, Rgb([shade, shade, 255])))
    };
    Ok((paint(origin), paint(result)))
}

// ============================================================================
// Scenario
// ============================================================================

#[test]
fn full_report_scenario() {
    let dir = TempDir::new().unwrap();
    let result_1 = write_png(&dir.path().join("r1.png"), 60, 40, [180, 180, 180]);
    let histogram = write_png(&dir.path().join("hist.png"), 80, 50, [70, 130, 180]);
    let pairs = error_pairs_on_disk(dir.path(), 5);

    let images_dir = dir.path().join("result_images");
    let request = ReportRequest::new(
        "出力結果",
        "0.75",
        "エラー画像が5ファイル検出されました",
        dir.path().join("output.html"),
        &images_dir,
    )
    .with_result_1(result_1)
    .with_result_2(histogram)
    .with_error_pairs(pairs);

    let outcome = generate_report(&request).expect("generate report");
    let html = fs::read_to_string(dir.path().join("output.html")).unwrap();

    assert!(html.contains("<h1>出力結果</h1>"));
    assert!(html.contains("<title>出力結果</title>"));
    assert!(html.contains("エラー画像が5ファイル検出されました"));
    assert!(html.contains(r#"<td class="evaluation">0.75</td>"#));
    assert_eq!(html.matches(r#"class="error-row""#).count(), 5);
    assert!(html.contains(r#"<img src="result_images/result_1.png" alt="Result_1">"#));
    assert!(html.contains(r#"<img src="result_images/result_2.png" alt="Result_2">"#));

    let mut expected = vec!["result_1.png".to_string(), "result_2.png".to_string()];
    for i in 0..5 {
        expected.push(format!("error_origin_{i}.png"));
        expected.push(format!("error_result_{i}.png"));
    }
    expected.sort();
    assert_eq!(file_names(&images_dir), expected);

    assert_eq!(outcome.error_count, 5);
    assert_eq!(outcome.stored_images.len(), 12);
    assert_eq!(outcome.bytes, html.len());
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn absent_result_2_creates_no_file_or_reference() {
    let dir = TempDir::new().unwrap();
    let result_1 = write_png(&dir.path().join("r1.png"), 10, 10, [1, 2, 3]);
    let images_dir = dir.path().join("images");
    let request = ReportRequest::new("T", "1", "m", dir.path().join("report.html"), &images_dir)
        .with_result_1(result_1);

    generate_report(&request).unwrap();
    let html = fs::read_to_string(dir.path().join("report.html")).unwrap();

    assert!(!html.contains("result_2."));
    assert!(html.contains(r#"<span class="no-image">なし</span>"#));
    assert_eq!(file_names(&images_dir), vec!["result_1.png".to_string()]);
}

#[test]
fn error_rows_follow_input_order() {
    let dir = TempDir::new().unwrap();
    let n = 7;
    let request = ReportRequest::new(
        "T",
        "1",
        "m",
        dir.path().join("report.html"),
        dir.path().join("images"),
    )
    .with_error_pairs(error_pairs_on_disk(dir.path(), n));

    let outcome = generate_report(&request).unwrap();
    let html = fs::read_to_string(&outcome.output_path).unwrap();

    assert_eq!(html.matches(r#"class="error-row""#).count(), n);
    let mut last = 0;
    for i in 0..n {
        let origin = html
            .find(&format!("images/error_origin_{i}.png"))
            .unwrap_or_else(|| panic!("row {i} origin missing"));
        let result = html
            .find(&format!("images/error_result_{i}.png"))
            .unwrap_or_else(|| panic!("row {i} result missing"));
        assert!(origin > last && result > origin, "row {i} out of order");
        last = result;
    }
}

#[test]
fn repeated_generation_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let result_1 = write_png(&dir.path().join("r1.png"), 25, 25, [9, 9, 9]);
    let images_dir = dir.path().join("images");
    let output = dir.path().join("report.html");
    let request = ReportRequest::new("Same", "0.1", "again", &output, &images_dir)
        .with_result_1(result_1)
        .with_error_pairs(error_pairs_on_disk(dir.path(), 3));

    generate_report(&request).unwrap();
    let first_html = fs::read(&output).unwrap();
    let first_images = dir_contents(&images_dir);

    generate_report(&request).unwrap();
    assert_eq!(fs::read(&output).unwrap(), first_html);
    assert_eq!(dir_contents(&images_dir), first_images);
}

#[test]
fn template_tokens_are_fully_replaced() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("template.html");
    fs::write(
        &template,
        "<h1>{{TITLE}}</h1>{{EVALUATION}}|{{MESSAGE}}|{{ERROR_ROWS}}|{{RESULT_1_SRC}}|{{RESULT_2_SRC}}|{{KEEP_ME}}",
    )
    .unwrap();

    let request = ReportRequest::new(
        "a {{TITLE}} b",
        "{{",
        "{{MESSAGE}}",
        dir.path().join("report.html"),
        dir.path().join("images"),
    )
    .with_template(&template);

    generate_report(&request).unwrap();
    let html = fs::read_to_string(dir.path().join("report.html")).unwrap();

    assert_eq!(
        html,
        "<h1>a {{TITLE}} b</h1>{{|{{MESSAGE}}|        <tr><td colspan=\"2\">なし</td></tr>|||{{KEEP_ME}}"
    );
    assert_eq!(
        fs::read_to_string(&template).unwrap().matches("{{").count(),
        7,
        "template file must not be modified"
    );
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn missing_result_1_fails_without_html() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("report.html");
    let request = ReportRequest::new("T", "1", "m", &output, dir.path().join("images"))
        .with_result_1(dir.path().join("does-not-exist.png"));

    let err = generate_report(&request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("result_1"));
    assert!(!output.exists());
}

#[test]
fn undecodable_error_image_fails_with_context() {
    let dir = TempDir::new().unwrap();
    let mut pairs = error_pairs_on_disk(dir.path(), 2);
    let bogus = dir.path().join("bogus.png");
    fs::write(&bogus, b"GIF89a but not really").unwrap();
    pairs[1].result = bogus.to_string_lossy().into_owned();

    let output = dir.path().join("report.html");
    let request = ReportRequest::new("T", "1", "m", &output, dir.path().join("images"))
        .with_error_pairs(pairs);

    let err = generate_report(&request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    assert!(err.to_string().contains("error_result_1"));
    assert!(!output.exists());
}

#[test]
fn missing_template_is_not_found() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("report.html");
    let request = ReportRequest::new("T", "1", "m", &output, dir.path().join("images"))
        .with_template(dir.path().join("nope.html"));

    let err = generate_report(&request).unwrap_err();
    assert!(matches!(err, ReportError::TemplateNotFound { .. }));
    assert!(!output.exists());
}

#[test]
fn images_dir_blocked_by_file_is_io_failure() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("images");
    fs::write(&blocker, b"file").unwrap();

    let request = ReportRequest::new("T", "1", "m", dir.path().join("report.html"), &blocker);
    let err = generate_report(&request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IoFailure);
}

// ============================================================================
// Custom loader
// ============================================================================

#[test]
fn custom_loader_resolves_abstract_keys() {
    let dir = TempDir::new().unwrap();
    let n = 4;
    let pairs: Vec<ErrorPair> = (0..n)
        .map(|i| ErrorPair::new(format!("mem://origin/{i}"), format!("mem://result/{i}")))
        .collect();
    let images_dir = dir.path().join("images");
    let request = ReportRequest::new("T", "1", "m", dir.path().join("report.html"), &images_dir)
        .with_error_pairs(pairs);

    let outcome = generate_report_with_loader(&request, &synthetic_loader).unwrap();

    assert_eq!(outcome.error_count, n);
    assert_eq!(file_names(&images_dir).len(), 2 * n);
    let html = fs::read_to_string(&outcome.output_path).unwrap();
    assert!(!html.contains("mem://"));
}

#[test]
fn custom_loader_failure_aborts() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("report.html");
    let request = ReportRequest::new("T", "1", "m", &output, dir.path().join("images"))
        .with_error_pairs(vec![ErrorPair::new("x", "y")]);

    let refuse = |_: &str, _: &str| -> Result<(DynamicImage, DynamicImage), LoaderError> {
        Err("backend offline".into())
    };
    let loader: &dyn ImageLoader = &refuse;
    let err = ReportGenerator::default_config()
        .generate_with_loader(&request, Some(loader))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::LoaderFailure);
    assert!(err.to_string().contains("backend offline"));
    assert!(!output.exists());
}

#[test]
fn jpeg_output_format() {
    let dir = TempDir::new().unwrap();
    let images_dir = dir.path().join("images");
    let request = ReportRequest::new("T", "1", "m", dir.path().join("report.html"), &images_dir)
        .with_result_1(DynamicImage::new_rgba8(20, 20))
        .with_error_pairs(vec![ErrorPair::new("a", "b")]);

    let generator = ReportGenerator::new(ReportConfig::new().with_image_format(ImageFormat::Jpeg));
    let loader: &dyn ImageLoader = &synthetic_loader;
    generator.generate_with_loader(&request, Some(loader)).unwrap();

    assert_eq!(
        file_names(&images_dir),
        vec![
            "error_origin_0.jpg".to_string(),
            "error_result_0.jpg".to_string(),
            "result_1.jpg".to_string(),
        ]
    );
    let html = fs::read_to_string(dir.path().join("report.html")).unwrap();
    assert!(html.contains("images/result_1.jpg"));
}

#[test]
fn non_png_sources_are_stored_as_png() {
    let dir = TempDir::new().unwrap();
    let bmp = dir.path().join("r1.bmp");
    RgbImage::from_pixel(2, 2, Rgb([10, 200, 30])).save(&bmp).unwrap();
    let gif = dir.path().join("r2.gif");
    RgbImage::from_pixel(4, 3, Rgb([0, 0, 0])).save(&gif).unwrap();
    let tiff = dir.path().join("origin.tiff");
    RgbImage::from_pixel(5, 5, Rgb([90, 90, 90])).save(&tiff).unwrap();

    let images_dir = dir.path().join("result_images");
    let request = ReportRequest::new("T", "1", "m", dir.path().join("output.html"), &images_dir)
        .with_result_1(bmp)
        .with_result_2(gif)
        .with_error_pairs(vec![ErrorPair::new(
            tiff.to_string_lossy().into_owned(),
            tiff.to_string_lossy().into_owned(),
        )]);

    generate_report(&request).expect("non-PNG sources decode");

    assert_eq!(
        file_names(&images_dir),
        vec![
            "error_origin_0.png".to_string(),
            "error_result_0.png".to_string(),
            "result_1.png".to_string(),
            "result_2.png".to_string(),
        ]
    );
    let stored = image::open(images_dir.join("result_1.png")).unwrap().to_rgb8();
    assert_eq!(stored.dimensions(), (2, 2));
    assert_eq!(*stored.get_pixel(1, 1), Rgb([10, 200, 30]));

    let html = fs::read_to_string(dir.path().join("output.html")).unwrap();
    assert!(html.contains(r#"<img src="result_images/result_1.png" alt="Result_1">"#));
}
