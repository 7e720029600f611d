use super::images::dummy_image;
use image::DynamicImage;
use rr_report::{ImageLoader, LoaderError};

/// URI scheme understood by [`SyntheticLoader`].
pub const SCHEME: &str = "synthetic://";

/// Builds the `synthetic://` key for a dummy image.
pub fn synthetic_key(label: &str) -> String {
    format!("{SCHEME}{label}")
}

/// Renders error pair images in memory from `synthetic://<label>` keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticLoader;

impl SyntheticLoader {
    fn load_one(&self, key: &str) -> Result<DynamicImage, LoaderError> {
        let label = key
            .strip_prefix(SCHEME)
            .ok_or_else(|| format!("not a synthetic key: {key}"))?;
        if label.is_empty() {
            return Err("synthetic key has an empty label".into());
        }
        Ok(dummy_image(label))
    }
}

impl ImageLoader for SyntheticLoader {
    fn load_pair(
        &self,
        origin: &str,
        result: &str,
    ) -> Result<(DynamicImage, DynamicImage), LoaderError> {
        Ok((self.load_one(origin)?, self.load_one(result)?))
    }
}
