//! Printable HTML result reports.
//!
//! Assembles a single HTML file from a title, an evaluation value, a message,
//! up to two result images and any number of before/after error image pairs.
//!
//! # Pipeline
//!
//! 1. **Image store**: every referenced image is decoded and written into a
//!    flat images directory under a role-derived name (`result_1`,
//!    `error_origin_3`, ...), and embedded by a path relative to the HTML.
//! 2. **Error section**: error pairs are stored in input order and rendered
//!    as one table row each. A custom [`ImageLoader`] can supply the pair
//!    images from memory instead of the filesystem.
//! 3. **Template**: a static HTML template is filled by literal
//!    `{{TOKEN}}` replacement. Values are not HTML-escaped.
//! 4. **Output**: the HTML is written atomically, optionally followed by a
//!    best-effort browser launch.
//!
//! # Example
//!
//! ```no_run
//! use rr_report::{generate_report, ErrorPair, ReportRequest};
//! use std::path::PathBuf;
//!
//! let request = ReportRequest::new("出力結果", "0.75", "OK", "out/report.html", "out/images")
//!     .with_result_1(PathBuf::from("result.png"))
//!     .with_error_pairs(vec![ErrorPair::new("origin_0.png", "result_0.png")]);
//! let outcome = generate_report(&request).unwrap();
//! println!("{} error images", outcome.error_count);
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod generator;
pub mod image_store;
pub mod sections;
pub mod template;

pub use config::{ImageFormat, ReportConfig};
pub use error::{ErrorKind, ReportError, Result};
pub use generator::{
    ensure_images_directory, generate_report, generate_report_with_loader, ReportGenerator,
    ReportOutcome, ReportRequest,
};
pub use image_store::{ImageReference, ImageRole, ImageStore, StoredImage};
pub use sections::{ErrorPair, ImageLoader, LoaderError};
pub use template::{Substitutions, Template};
