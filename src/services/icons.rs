use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::config::UploadSettings;

const ICONS_DIR: &str = "icons";

/// Image types accepted as catalog icons, with their file extensions
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/svg+xml", "svg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

/// Errors that can occur when storing or serving icons
#[derive(Debug, Error)]
pub enum IconError {
    #[error("Invalid base64 image data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Image is {size} bytes, the limit is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("Invalid icon name")]
    InvalidName,

    #[error("Icon not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Local-disk storage for uploaded service icons
pub struct IconStore {
    root: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl IconStore {
    pub fn new(settings: &UploadSettings) -> Self {
        Self {
            root: PathBuf::from(&settings.dir).join(ICONS_DIR),
            public_base_url: settings.public_base_url.trim_end_matches('/').to_string(),
            max_bytes: settings.max_bytes,
        }
    }

    /// Decode and store an icon; returns its public URL
    pub async fn save(&self, image: &str, content_type: &str) -> Result<String, IconError> {
        let content_type = content_type.trim().to_ascii_lowercase();
        let extension = extension_for(&content_type)
            .ok_or_else(|| IconError::UnsupportedType(content_type.clone()))?;

        // Accept both bare base64 and `data:<type>;base64,<payload>` URLs
        let payload = image.split_once("base64,").map_or(image, |(_, data)| data);
        let bytes = STANDARD.decode(payload.trim())?;
        if bytes.len() > self.max_bytes {
            return Err(IconError::TooLarge {
                size: bytes.len(),
                max: self.max_bytes,
            });
        }

        let name = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&name), &bytes).await?;

        tracing::info!("Stored icon {} ({} bytes)", name, bytes.len());
        Ok(format!("{}/{}/{}", self.public_base_url, ICONS_DIR, name))
    }

    /// Read a stored icon together with its content type
    pub async fn load(&self, name: &str) -> Result<(Vec<u8>, &'static str), IconError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(IconError::InvalidName);
        }
        let content_type = name
            .rsplit_once('.')
            .and_then(|(_, ext)| content_type_for(ext))
            .ok_or(IconError::InvalidName)?;

        match tokio::fs::read(self.root.join(name)).await {
            Ok(bytes) => Ok((bytes, content_type)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(IconError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    ALLOWED_TYPES
        .iter()
        .find(|(ty, _)| *ty == content_type || (content_type == "image/jpg" && *ty == "image/jpeg"))
        .map(|(_, ext)| *ext)
}

fn content_type_for(extension: &str) -> Option<&'static str> {
    ALLOWED_TYPES
        .iter()
        .find(|(_, ext)| *ext == extension)
        .map(|(ty, _)| *ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &std::path::Path, max_bytes: usize) -> IconStore {
        IconStore::new(&UploadSettings {
            dir: dir.to_string_lossy().into_owned(),
            public_base_url: "https://kupets.example/api/v1/".to_string(),
            max_bytes,
        })
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 1024);
        let data = format!("data:image/png;base64,{}", STANDARD.encode(b"\x89PNG fake"));

        let url = store.save(&data, "image/png").await.unwrap();
        assert!(url.starts_with("https://kupets.example/api/v1/icons/"));
        assert!(url.ends_with(".png"));

        let name = url.rsplit('/').next().unwrap();
        let (bytes, content_type) = store.load(name).await.unwrap();
        assert_eq!(bytes, b"\x89PNG fake");
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn test_rejects_oversized_and_unknown_types() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 4);
        let data = STANDARD.encode(b"too many bytes");

        assert!(matches!(
            store.save(&data, "image/png").await,
            Err(IconError::TooLarge { max: 4, .. })
        ));
        assert!(matches!(
            store.save(&data, "application/pdf").await,
            Err(IconError::UnsupportedType(_))
        ));
        assert!(matches!(
            store.save("@@not base64@@", "image/gif").await,
            Err(IconError::InvalidBase64(_))
        ));
    }

    #[tokio::test]
    async fn test_load_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 1024);

        assert!(matches!(store.load("../secret.png").await, Err(IconError::InvalidName)));
        assert!(matches!(store.load("a/b.png").await, Err(IconError::InvalidName)));
        assert!(matches!(store.load("missing.png").await, Err(IconError::NotFound(_))));
    }
}
