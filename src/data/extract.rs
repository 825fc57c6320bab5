use crate::utils::error::FaceError;
use crate::Result;
use std::fs::File;
use std::path::Path;
use zip::ZipArchive;

/// 解压zip压缩包到目标目录
///
/// 跳过会逃逸出目标目录的条目（路径穿越防护）。
pub fn extract_zip(archive_path: &Path, target_dir: &Path) -> Result<()> {
    tracing::info!(
        "Extracting {} into {}",
        archive_path.display(),
        target_dir.display()
    );

    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| FaceError::Archive(format!("Not a valid zip archive: {e}")))?;

    std::fs::create_dir_all(target_dir)?;

    let mut extracted = 0usize;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| FaceError::Archive(format!("Failed to read archive entry {i}: {e}")))?;

        // 拒绝绝对路径和 ".." 组件
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!("Skipping unsafe archive entry: {}", entry.name());
            continue;
        };
        let out_path = target_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out_file = File::create(&out_path)?;
            std::io::copy(&mut entry, &mut out_file)?;
            extracted += 1;
        }
    }

    tracing::info!("Extracted {} files", extracted);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, data) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn extracts_nested_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("data.zip");
        build_archive(
            &archive,
            &[
                ("real/0001.jpg", b"fake jpeg bytes".as_slice()),
                ("fake/0001.jpg", b"other bytes".as_slice()),
            ],
        );

        let target = dir.path().join("out");
        extract_zip(&archive, &target).unwrap();

        assert_eq!(
            std::fs::read(target.join("real/0001.jpg")).unwrap(),
            b"fake jpeg bytes"
        );
        assert_eq!(
            std::fs::read(target.join("fake/0001.jpg")).unwrap(),
            b"other bytes"
        );
    }

    #[test]
    fn skips_path_traversal_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("evil.zip");
        build_archive(
            &archive,
            &[
                ("../evil.txt", b"escape".as_slice()),
                ("ok.txt", b"fine".as_slice()),
            ],
        );

        let target = dir.path().join("out");
        extract_zip(&archive, &target).unwrap();

        assert!(target.join("ok.txt").exists());
        assert!(!dir.path().join("evil.txt").exists());
    }

    #[test]
    fn rejects_non_zip_file() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.zip");
        std::fs::write(&bogus, b"this is not a zip").unwrap();

        match extract_zip(&bogus, &dir.path().join("out")) {
            Err(FaceError::Archive(_)) => {}
            other => panic!("expected Archive error, got {other:?}"),
        }
    }
}
