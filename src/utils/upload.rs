use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::ALLOWED_EXTENSIONS;

/// 随机文件名的十六进制长度
const RANDOM_NAME_LEN: usize = 16;

/// 扩展名是否在白名单内（不区分大小写）
pub fn allowed_file(filename: &str) -> bool {
    extension(filename).is_some_and(|ext| {
        ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    })
}

fn extension(filename: &str) -> Option<&str> {
    // 只看最后一段，且要求点号前有内容
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// 生成 16 位随机十六进制文件名，保留原扩展名
pub fn random_filename(original: &str) -> Option<String> {
    let ext = extension(original)?;
    let hex = Uuid::new_v4().simple().to_string();
    Some(format!("{}.{}", &hex[..RANDOM_NAME_LEN], ext))
}

/// 上传文件落盘目录
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// 保存图片，返回生成的文件名；扩展名不被允许时不落盘，返回 None
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> std::io::Result<Option<String>> {
        if !allowed_file(original_name) {
            tracing::info!("Rejected upload with disallowed extension: {}", original_name);
            return Ok(None);
        }
        let Some(filename) = random_filename(original_name) else {
            return Ok(None);
        };

        tokio::fs::write(self.dir.join(&filename), bytes).await?;
        tracing::debug!("Stored upload {} ({} bytes)", filename, bytes.len());
        Ok(Some(filename))
    }

    /// 删除已保存的文件，文件不存在不算错误
    pub async fn remove(&self, filename: &str) -> std::io::Result<()> {
        if filename.contains(['/', '\\']) || filename.starts_with('.') {
            return Ok(());
        }
        match tokio::fs::remove_file(self.dir.join(filename)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> UploadStore {
        UploadStore::new(std::env::temp_dir().join(format!("uploads-{}", Uuid::new_v4())))
    }

    #[test]
    fn extension_allow_list() {
        assert!(allowed_file("photo.jpg"));
        assert!(allowed_file("photo.JPEG"));
        assert!(allowed_file("archive.tar.png"));
        assert!(!allowed_file("photo.gif"));
        assert!(!allowed_file("photo"));
        assert!(!allowed_file(".png"));
        assert!(!allowed_file("photo."));
    }

    #[test]
    fn random_name_keeps_extension() {
        let name = random_filename("Mon Portrait.jpg").unwrap();
        let (stem, ext) = name.split_once('.').unwrap();
        assert_eq!(ext, "jpg");
        assert_eq!(stem.len(), 16);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn gif_is_rejected_without_writing() {
        let store = temp_store();
        store.ensure_dir().await.unwrap();

        let saved = store.save("photo.gif", b"GIF89a").await.unwrap();
        assert!(saved.is_none());

        let mut entries = tokio::fs::read_dir(store.dir()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn jpg_is_stored_under_new_name() {
        let store = temp_store();
        store.ensure_dir().await.unwrap();

        let saved = store.save("photo.jpg", b"jpeg-bytes").await.unwrap().unwrap();
        assert_ne!(saved, "photo.jpg");
        assert!(saved.ends_with(".jpg"));
        let written = tokio::fs::read(store.dir().join(&saved)).await.unwrap();
        assert_eq!(written, b"jpeg-bytes");

        store.remove(&saved).await.unwrap();
        assert!(!store.dir().join(&saved).exists());
        // 再删一次不报错
        store.remove(&saved).await.unwrap();
    }
}
