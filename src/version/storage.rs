// 背景バージョンの永続化: SHA-256キーのPNGファイル
//
// Stores version images on disk keyed by the SHA-256 of their PNG bytes.
// Writes are atomic: encode to a temp file, then rename to the final path.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use sha2::{Digest, Sha256};

use crate::error::RetouchError;

/// キーが有効な SHA-256 hex 文字列であることを検証する。
///
/// パストラバーサルや不正なディレクトリアクセスを防止する。
fn validate_key(key: &str) -> crate::error::Result<()> {
    if key.len() == 64 && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        Ok(())
    } else {
        Err(RetouchError::version(format!(
            "invalid image key: expected 64-character lowercase hex string, got '{key}'"
        )))
    }
}

fn key_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.png"))
}

/// Encode `image` as PNG and return `(sha256-hex key, png bytes)`.
pub fn image_key(image: &RgbaImage) -> crate::error::Result<(String, Vec<u8>)> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    let mut hasher = Sha256::new();
    hasher.update(&png);
    Ok((hex::encode(hasher.finalize()), png))
}

/// Persist a version image under `dir`, returning its key.
///
/// Content-addressed: persisting an identical image twice is a no-op after
/// the first write.
pub fn persist_image(dir: &Path, image: &RgbaImage) -> crate::error::Result<String> {
    let (key, png) = image_key(image)?;
    let final_path = key_path(dir, &key);
    if final_path.exists() {
        return Ok(key);
    }

    std::fs::create_dir_all(dir)?;
    let tmp_path = dir.join(format!(".{key}.tmp"));
    std::fs::write(&tmp_path, &png)?;
    std::fs::rename(&tmp_path, &final_path)?;
    Ok(key)
}

/// Load a persisted version image by key.
pub fn load_image(dir: &Path, key: &str) -> crate::error::Result<RgbaImage> {
    validate_key(key)?;
    let path = key_path(dir, key);
    let bytes = std::fs::read(&path)?;
    let img = image::load_from_memory_with_format(&bytes, ImageFormat::Png)?;
    Ok(img.to_rgba8())
}
