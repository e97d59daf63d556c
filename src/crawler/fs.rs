//! Generic filesystem recognizers.
//!
//! These are the fallbacks every registry needs so that any path can be
//! classified. Studio-specific recognizers register after them and win.

use crate::crawler::path::PathCrawler;
use crate::crawler::path_holder::PathHolder;
use crate::crawler::registry::{Recognizer, RecognizerType, Registry};
use crate::crawler::Crawler;
use crate::error::ApiError;
use crate::types::Value;

/// Image extensions recognized by [`ImageRecognizer`], lower case.
pub const IMAGE_EXTENSIONS: &[&str] = &["exr", "dpx", "jpg", "jpeg", "png", "tif", "tiff", "tga"];

/// Register `file`, `directory`, `image` and `json`, in that order.
pub fn register_defaults(registry: &mut Registry) {
    registry.register(RecognizerType::new("file", FileRecognizer));
    registry.register(RecognizerType::new("directory", DirectoryRecognizer));
    registry.register(RecognizerType::new("image", ImageRecognizer).with_capabilities(["file"]));
    registry.register(RecognizerType::new("json", JsonRecognizer).with_capabilities(["file"]));
}

/// Any non-directory path.
pub struct FileRecognizer;

impl Recognizer for FileRecognizer {
    fn test(&self, path: &PathHolder, _parent: Option<&PathCrawler>) -> anyhow::Result<bool> {
        Ok(!path.is_directory())
    }
}

/// Any directory; its entries become children.
pub struct DirectoryRecognizer;

impl Recognizer for DirectoryRecognizer {
    fn test(&self, path: &PathHolder, _parent: Option<&PathCrawler>) -> anyhow::Result<bool> {
        Ok(path.is_directory())
    }
}

/// Single images and members of `name.<frame>.<ext>` image sequences.
///
/// Sets `imageType` to `single` or `sequence`. Sequence members also get
/// `frame` and `padding`, and `name` loses the frame suffix.
pub struct ImageRecognizer;

impl Recognizer for ImageRecognizer {
    fn test(&self, path: &PathHolder, _parent: Option<&PathCrawler>) -> anyhow::Result<bool> {
        let ext = path.ext().to_ascii_lowercase();
        Ok(!path.is_directory() && IMAGE_EXTENSIONS.contains(&ext.as_str()))
    }

    fn construct(
        &self,
        crawler: &mut Crawler,
        _path: &PathHolder,
        _parent: Option<&PathCrawler>,
    ) -> anyhow::Result<()> {
        let name = match crawler.var("name")? {
            Value::String(name) => name.clone(),
            other => anyhow::bail!("name variable is not a string: {}", other),
        };

        crawler.set_var("imageType", "single", false);
        if let Some((prefix, frame)) = name.rsplit_once('.') {
            let digits = !frame.is_empty() && frame.chars().all(|c| c.is_ascii_digit());
            // Suffixes too long for a frame number keep the image single.
            if let Some(number) = digits.then(|| frame.parse::<u64>().ok()).flatten() {
                crawler.set_var("imageType", "sequence", false);
                crawler.set_var("name", prefix, false);
                crawler.set_var("frame", number, false);
                crawler.set_var("padding", frame.len(), false);
            }
        }
        Ok(())
    }
}

/// `.json` files.
pub struct JsonRecognizer;

impl Recognizer for JsonRecognizer {
    fn test(&self, path: &PathHolder, _parent: Option<&PathCrawler>) -> anyhow::Result<bool> {
        Ok(!path.is_directory() && path.ext().eq_ignore_ascii_case("json"))
    }
}

/// Parse the JSON document a crawler points at.
pub fn json_contents(crawler: &PathCrawler) -> Result<Value, ApiError> {
    let text = std::fs::read_to_string(crawler.file_path()).map_err(|source| ApiError::Io {
        path: crawler.file_path().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}
