//! Uploaded image validation and storage under the media root.
//!
//! Images are stored as `posts/<uuid>/<file name>` so the original file name
//! survives while concurrent uploads of the same name cannot collide.

use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::MediaConfig;
use crate::error::{AppError, Result};

pub const UPLOAD_DIR: &str = "posts";

/// An uploaded file held in memory until the form validates.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// True when the image decodes with one of the supported codecs.
    pub fn is_valid_image(&self) -> bool {
        image::load_from_memory(&self.bytes).is_ok()
    }
}

pub struct MediaStore {
    root: PathBuf,
    max_upload_bytes: usize,
}

impl MediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: config.root.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Write the upload to disk and return its path relative to the root.
    pub async fn save(&self, upload: &UploadedFile) -> Result<String> {
        let relative = format!(
            "{}/{}/{}",
            UPLOAD_DIR,
            Uuid::new_v4(),
            sanitize_file_name(&upload.file_name)
        );
        let target = self.root.join(&relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &upload.bytes).await?;

        info!(path = %relative, bytes = upload.bytes.len(), "Stored uploaded image");
        Ok(relative)
    }

    /// Read a stored file; only plain relative paths inside the root resolve.
    pub async fn read(&self, relative: &str) -> Result<Vec<u8>> {
        let path = self
            .resolve(relative)
            .ok_or_else(|| AppError::NotFound(format!("media {}", relative)))?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %relative, "media file not found");
                Err(AppError::NotFound(format!("media {}", relative)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let candidate = Path::new(relative);
        if relative.is_empty()
            || !candidate
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(candidate))
    }
}

/// Last path segment of a client-supplied name, restricted to a safe
/// character set.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Content type for a stored file, from its extension.
pub fn content_type_for(path: &str) -> mime::Mime {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "svg" => mime::IMAGE_SVG,
        "webp" => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(2, 1)
            .write_to(&mut buf, image::ImageOutputFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("small.gif"), "small.gif");
        assert_eq!(sanitize_file_name("C:\\photos\\cat.png"), "cat.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("my photo.jpg"), "my_photo.jpg");
        assert_eq!(sanitize_file_name(".."), "image");
        assert_eq!(sanitize_file_name(""), "image");
    }

    #[test]
    fn test_image_validation() {
        let good = UploadedFile {
            file_name: "a.png".into(),
            bytes: png_bytes(),
        };
        assert!(good.is_valid_image());

        let bad = UploadedFile {
            file_name: "a.png".into(),
            bytes: b"not an image".to_vec(),
        };
        assert!(!bad.is_valid_image());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("posts/x/a.PNG"), mime::IMAGE_PNG);
        assert_eq!(content_type_for("posts/x/a.jpeg"), mime::IMAGE_JPEG);
        assert_eq!(content_type_for("posts/x/a"), mime::APPLICATION_OCTET_STREAM);
    }

    #[actix_web::test]
    async fn test_save_keeps_file_name_and_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(&MediaConfig {
            root: dir.path().to_path_buf(),
            url: "/media/".into(),
            max_upload_bytes: 1024 * 1024,
        });

        let upload = UploadedFile {
            file_name: "small.png".into(),
            bytes: png_bytes(),
        };
        let relative = store.save(&upload).await.unwrap();
        assert!(relative.starts_with("posts/"));
        assert_eq!(relative.rsplit('/').next(), Some("small.png"));
        assert_eq!(store.read(&relative).await.unwrap(), upload.bytes);

        assert!(matches!(
            store.read("../secret").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.read("posts/missing.png").await,
            Err(AppError::NotFound(_))
        ));
    }
}
