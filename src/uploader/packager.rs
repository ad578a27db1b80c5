//! チャンクZIP生成
//!
//! チャンク内の各画像をアーカイブから読み出し、元ファイル名のまま
//! 新しいZIPに詰め直して1回分の送信ペイロードにする。画像は圧縮済み
//! フォーマットなので再圧縮せず格納のみ。

use crate::error::{MeterOcrError, Result};
use crate::scanner::{Archive, ImageEntry};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// 1チャンクを送信用ZIPペイロードに変換する
///
/// いずれかの画像が読み出せない場合は `Packaging` エラーで中断する。
/// 失敗はこのチャンクに閉じ、他チャンクの処理には影響しない。
pub fn package_chunk(archive: &Archive, chunk: &[ImageEntry]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for entry in chunk {
        let data = archive.read_entry(&entry.name)?;

        writer
            .start_file(entry.name.as_str(), options)
            .map_err(|e| MeterOcrError::Packaging(format!("{}: {}", entry.name, e)))?;
        writer
            .write_all(&data)
            .map_err(|e| MeterOcrError::Packaging(format!("{}: {}", entry.name, e)))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| MeterOcrError::Packaging(e.to_string()))?;
    Ok(cursor.into_inner())
}
