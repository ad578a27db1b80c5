//! チャンク分割
//!
//! 画像エントリ列を送信単位のチャンクに分割する。チャンクを順に連結すると
//! 元の列が過不足なく復元できる。

use crate::error::{MeterOcrError, Result};
use crate::scanner::ImageEntry;

/// `items` を `bound` 枚以下のチャンクに分割する
///
/// チャンク数は ⌈n / bound⌉、最終チャンクのみ小さくなりうる。
pub fn partition(items: &[ImageEntry], bound: usize) -> Result<Vec<Vec<ImageEntry>>> {
    if bound == 0 {
        return Err(MeterOcrError::InvalidConfiguration(
            "チャンクサイズは1以上を指定してください".into(),
        ));
    }

    Ok(items.chunks(bound).map(|c| c.to_vec()).collect())
}
