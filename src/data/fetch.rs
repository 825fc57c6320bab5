use crate::utils::error::FaceError;
use crate::Result;
use sha2::{Digest, Sha256};
use std::path::Path;

/// 占位校验和：全零表示跳过校验
const PLACEHOLDER_CHECKSUM: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// 数据集描述
#[derive(Debug, Clone)]
pub struct DatasetSource {
    /// 数据集标识
    pub name: &'static str,
    /// 压缩包下载地址
    pub url: &'static str,
    /// 期望的SHA256，全零占位则跳过校验
    pub sha256: &'static str,
    /// 本地落盘文件名
    pub filename: &'static str,
}

/// 默认数据集：真假人脸训练集压缩包
pub const DEFAULT_DATASET: DatasetSource = DatasetSource {
    name: "real-vs-fake-faces",
    url: "https://drive.google.com/uc?id=1xd4k7GLmR6kIC6RRf84AtqZk7hVtH41T&export=download",
    sha256: PLACEHOLDER_CHECKSUM,
    filename: "real-vs-fake-faces.zip",
};

/// 下载并解压训练数据集
///
/// 与推理路径完全独立；只在 `fetch-data` 子命令里使用。
pub async fn fetch_dataset(data_dir: &str, url_override: Option<&str>, keep_archive: bool) -> Result<()> {
    let dataset = DEFAULT_DATASET;
    let url = url_override.unwrap_or(dataset.url);
    let target_dir = Path::new(data_dir);

    tokio::fs::create_dir_all(target_dir).await?;
    let archive_path = target_dir.join(dataset.filename);

    if archive_path.exists() {
        tracing::info!(
            "Archive already present, skipping download: {}",
            archive_path.display()
        );
    } else {
        let bytes = download_archive(dataset.name, url).await?;
        validate_archive(&bytes)?;
        verify_checksum(&bytes, dataset.sha256)?;
        tokio::fs::write(&archive_path, &bytes).await?;
        tracing::info!(
            "Downloaded {} ({:.2} MB) to {}",
            dataset.name,
            bytes.len() as f64 / 1024.0 / 1024.0,
            archive_path.display()
        );
    }

    crate::data::extract_zip(&archive_path, target_dir)?;

    if !keep_archive {
        tokio::fs::remove_file(&archive_path).await?;
        tracing::debug!("Removed archive: {}", archive_path.display());
    }

    Ok(())
}

async fn download_archive(name: &str, url: &str) -> Result<Vec<u8>> {
    tracing::info!("Downloading dataset: {} from {}", name, url);

    let response = reqwest::get(url)
        .await
        .map_err(|e| FaceError::Download(format!("Failed to download {name}: {e}")))?;

    if !response.status().is_success() {
        return Err(FaceError::Download(format!(
            "Download of {name} failed with status: {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| FaceError::Download(format!("Failed to read response for {name}: {e}")))?;

    Ok(bytes.to_vec())
}

/// 压缩包健全性检查：识别伪装成zip的HTML错误页
fn validate_archive(bytes: &[u8]) -> Result<()> {
    if bytes.len() < 1024 {
        // 过小的响应体多半不是真正的压缩包
        let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]).to_lowercase();
        if head.contains("<html") || head.contains("<!doctype html") {
            return Err(FaceError::Download(
                "Server returned an HTML page instead of an archive".to_string(),
            ));
        }
    }

    // zip魔数：PK\x03\x04
    if bytes.len() < 4 || &bytes[..4] != b"PK\x03\x04" {
        return Err(FaceError::Archive(
            "Downloaded file does not have a zip header".to_string(),
        ));
    }

    Ok(())
}

/// SHA256校验，占位值表示跳过
fn verify_checksum(bytes: &[u8], expected: &str) -> Result<()> {
    if expected == PLACEHOLDER_CHECKSUM {
        tracing::debug!("Skipping checksum verification (placeholder checksum)");
        return Ok(());
    }

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let hash = format!("{:x}", hasher.finalize());

    if hash != expected {
        return Err(FaceError::Download(format!(
            "Checksum mismatch: expected {expected}, got {hash}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_html_error_page() {
        let body = b"<html><body>quota exceeded</body></html>".to_vec();
        match validate_archive(&body) {
            Err(FaceError::Download(msg)) => assert!(msg.contains("HTML")),
            other => panic!("expected Download error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_zip_magic() {
        let mut body = vec![0u8; 2048];
        body[..4].copy_from_slice(b"ABCD");
        match validate_archive(&body) {
            Err(FaceError::Archive(msg)) => assert!(msg.contains("zip header")),
            other => panic!("expected Archive error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_zip_magic() {
        let mut body = vec![0u8; 2048];
        body[..4].copy_from_slice(b"PK\x03\x04");
        assert!(validate_archive(&body).is_ok());
    }

    #[test]
    fn placeholder_checksum_skips_verification() {
        assert!(verify_checksum(b"anything", PLACEHOLDER_CHECKSUM).is_ok());
    }

    #[test]
    fn checksum_mismatch_is_rejected() {
        let expected = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        match verify_checksum(b"payload", expected) {
            Err(FaceError::Download(msg)) => assert!(msg.contains("mismatch")),
            other => panic!("expected Download error, got {other:?}"),
        }
    }

    #[test]
    fn matching_checksum_passes() {
        let mut hasher = Sha256::new();
        hasher.update(b"payload");
        let hash = format!("{:x}", hasher.finalize());
        assert!(verify_checksum(b"payload", &hash).is_ok());
    }
}
