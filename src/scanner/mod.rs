//! ZIPアーカイブスキャナ
//!
//! 一括アップロード用のZIPから対象画像エントリを抽出する。
//! スキャンはエントリ名と位置のみを読み、画像本体はチャンク生成時に
//! `read_entry` で遅延読み込みする。

use crate::error::{MeterOcrError, Result};
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

/// アップロード対象のZIPアーカイブ（読み込み後は不変）
pub struct Archive {
    data: Vec<u8>,
}

/// アーカイブ内の1画像エントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    /// アーカイブ内の元ファイル名（識別子。アーカイブ内で一意であること）
    pub name: String,
    /// 列挙順の位置
    pub index: usize,
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

impl Archive {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MeterOcrError::FileNotFound(path.display().to_string()));
        }
        let data = std::fs::read(path)?;
        Ok(Self::new(data))
    }

    /// 対象画像エントリを列挙順で返す
    ///
    /// ディレクトリエントリと対象外拡張子はスキップ。同一アーカイブへの
    /// 再スキャンは常に同じ列を返す。
    pub fn scan(&self) -> Result<Vec<ImageEntry>> {
        let mut zip = ZipArchive::new(Cursor::new(self.data.as_slice()))
            .map_err(|e| MeterOcrError::ArchiveCorrupt(e.to_string()))?;

        let mut entries = Vec::new();

        for i in 0..zip.len() {
            let file = zip
                .by_index(i)
                .map_err(|e| MeterOcrError::ArchiveCorrupt(e.to_string()))?;

            if file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            if is_image_name(&name) {
                entries.push(ImageEntry {
                    name,
                    index: entries.len(),
                });
            }
        }

        Ok(entries)
    }

    /// 1エントリのバイナリを読み出す（チャンク生成時に使用）
    pub fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        let mut zip = ZipArchive::new(Cursor::new(self.data.as_slice()))
            .map_err(|e| MeterOcrError::ArchiveCorrupt(e.to_string()))?;

        let mut file = zip
            .by_name(name)
            .map_err(|e| MeterOcrError::Packaging(format!("{}: {}", name, e)))?;

        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf)
            .map_err(|e| MeterOcrError::Packaging(format!("{}: {}", name, e)))?;
        Ok(buf)
    }
}

/// 拡張子が対象画像かどうか（大文字小文字は区別しない）
fn is_image_name(name: &str) -> bool {
    name.rsplit('.')
        .next()
        .map(|ext| {
            let ext = ext.to_lowercase();
            IMAGE_EXTENSIONS.iter().any(|&e| e == ext)
        })
        .unwrap_or(false)
}

#[cfg(test)]
pub(crate) fn build_test_archive(names: &[&str]) -> Archive {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for name in names {
        if name.ends_with('/') {
            writer.add_directory(name.trim_end_matches('/'), options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(b"dummy image bytes").unwrap();
        }
    }

    Archive::new(writer.finish().unwrap().into_inner())
}
