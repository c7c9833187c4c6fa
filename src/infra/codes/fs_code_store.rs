use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use tracing::{debug, info};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};
use crate::domain::ports::CodeImageStore;
use crate::error::AppError;

const QR_SIZE: u32 = 300;
const IMAGE_EXTENSION: &str = "png";

/// Keeps rendered QR codes as `<token>.png` files in a single directory.
pub struct FsCodeImageStore {
    dir: PathBuf,
}

impl FsCodeImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_for(&self, token: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", token, IMAGE_EXTENSION))
    }
}

pub fn render_png(payload: &str) -> Result<Vec<u8>, AppError> {
    let code = QrCode::new(payload.as_bytes())
        .map_err(|e| AppError::InternalWithMsg(format!("QR encoding failed: {}", e)))?;

    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(QR_SIZE, QR_SIZE)
        .build();

    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| AppError::InternalWithMsg(format!("PNG encoding failed: {}", e)))?;

    Ok(bytes)
}

fn stored_images(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == IMAGE_EXTENSION))
        .collect();
    paths.sort();
    Ok(paths)
}

fn build_archive(dir: &Path) -> Result<Vec<u8>, AppError> {
    let zip_err = |e: zip::result::ZipError| AppError::InternalWithMsg(format!("Archive error: {}", e));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for path in stored_images(dir)? {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        writer.start_file(name, options).map_err(zip_err)?;
        writer.write_all(&std::fs::read(&path)?)?;
    }

    Ok(writer.finish().map_err(zip_err)?.into_inner())
}

async fn blocking<T, F>(task: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("Blocking task failed: {}", e)))?
}

#[async_trait]
impl CodeImageStore for FsCodeImageStore {
    fn image_path(&self, token: &str) -> String {
        self.file_for(token).to_string_lossy().into_owned()
    }

    async fn render(&self, payload: &str) -> Result<Vec<u8>, AppError> {
        let payload = payload.to_string();
        blocking(move || render_png(&payload)).await
    }

    async fn generate(&self, token: &str, payload: &str) -> Result<String, AppError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let bytes = self.render(payload).await?;
        let path = self.file_for(token);
        tokio::fs::write(&path, bytes).await?;

        debug!("Wrote QR code {}", path.display());
        Ok(path.to_string_lossy().into_owned())
    }

    async fn archive(&self) -> Result<Vec<u8>, AppError> {
        let dir = self.dir.clone();
        blocking(move || build_archive(&dir)).await
    }

    async fn purge(&self) -> Result<usize, AppError> {
        let dir = self.dir.clone();
        let paths = blocking(move || stored_images(&dir)).await?;

        for path in &paths {
            tokio::fs::remove_file(path).await?;
        }

        info!("Removed {} QR code images", paths.len());
        Ok(paths.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_png_produces_png() {
        let bytes = render_png(r#"{"token":"abc123","name":"Asha","type":"food-token"}"#).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert!(decoded.width() >= QR_SIZE);
    }

    #[test]
    fn test_image_path_uses_token() {
        let store = FsCodeImageStore::new("qr-codes");
        assert_eq!(PathBuf::from(store.image_path("abc")), PathBuf::from("qr-codes").join("abc.png"));
    }
}
