//! Result image cells.

use crate::image_store::StoredImage;

/// The two optional result images of a report.
///
/// An absent image renders as a placeholder label; no `<img>` element is
/// emitted for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsSection {
    /// Primary result image.
    pub result_1: Option<StoredImage>,
    /// Secondary result image.
    pub result_2: Option<StoredImage>,
}

impl ResultsSection {
    /// Cell markup for `result_1`.
    pub fn result_1_html(&self, empty_label: &str) -> String {
        image_cell(self.result_1.as_ref(), empty_label)
    }

    /// Cell markup for `result_2`.
    pub fn result_2_html(&self, empty_label: &str) -> String {
        image_cell(self.result_2.as_ref(), empty_label)
    }

    /// Bare `src` for `result_1`, empty when absent.
    pub fn result_1_src(&self) -> &str {
        self.result_1.as_ref().map_or("", |s| s.src.as_str())
    }

    /// Bare `src` for `result_2`, empty when absent.
    pub fn result_2_src(&self) -> &str {
        self.result_2.as_ref().map_or("", |s| s.src.as_str())
    }

    /// Stored images, `result_1` first.
    pub fn stored_images(&self) -> impl Iterator<Item = &StoredImage> {
        self.result_1.iter().chain(self.result_2.iter())
    }
}

fn image_cell(image: Option<&StoredImage>, empty_label: &str) -> String {
    match image {
        Some(stored) => format!(
            "<img src=\"{}\" alt=\"{}\">",
            stored.src,
            stored.role.alt_text()
        ),
        None => format!("<span class=\"no-image\">{}</span>", empty_label),
    }
}
