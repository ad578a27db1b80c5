//! APIレスポンス型定義
//!
//! バックエンドは欠損フィールドを `NOT_FOUND` / `UNKNOWN` / `none` / `N/A`
//! などの文字列センチネルで返す。ここで一度だけ `Option::None` に正規化し、
//! 以降の層にはセンチネル文字列を持ち込まない。

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 1画像のOCR・スプーフ判定結果
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OcrResult {
    #[serde(default)]
    pub image_url: String,

    #[serde(default)]
    pub serial_number_result: SerialNumberResult,

    #[serde(default)]
    pub ocr_reading_result_1: PrimaryReading,

    #[serde(default)]
    pub ocr_reading_result_2: SecondaryReading,

    #[serde(default)]
    pub spoof_result: SpoofResult,
}

/// メーターシリアル番号
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SerialNumberResult {
    #[serde(default, deserialize_with = "opt_text")]
    pub reading: Option<String>,
}

/// メーター読み取り値1
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PrimaryReading {
    #[serde(default, deserialize_with = "opt_text")]
    pub reading_1: Option<String>,

    #[serde(default, deserialize_with = "opt_confidence")]
    pub confidence_1: Option<f64>,
}

/// メーター読み取り値2（検出パラメータのラベル付き）
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SecondaryReading {
    #[serde(default, deserialize_with = "opt_text")]
    pub reading_2: Option<String>,

    #[serde(default, deserialize_with = "opt_confidence")]
    pub confidence_2: Option<f64>,

    #[serde(default, deserialize_with = "opt_text")]
    pub label: Option<String>,
}

/// スプーフ（なりすまし画像）判定
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SpoofResult {
    #[serde(default, deserialize_with = "opt_text")]
    pub result: Option<String>,

    #[serde(default, deserialize_with = "opt_confidence")]
    pub confidence_score: Option<f64>,

    #[serde(default, deserialize_with = "opt_text")]
    pub reason: Option<String>,
}

/// 一括アップロードのレスポンス
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub results: Vec<OcrResult>,
}

/// 単発アップロードのレスポンス
#[derive(Debug, Clone, Deserialize)]
pub struct SingleUploadResponse {
    pub result: OcrResult,
}

/// 一覧取得のレスポンス（ページネーション＋処理完了フラグ）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingResponse {
    #[serde(default)]
    pub images: Vec<OcrResult>,

    #[serde(default)]
    pub pages: u32,

    #[serde(default)]
    pub current_page: u32,

    #[serde(default)]
    pub per_page: u32,

    #[serde(default)]
    pub total: u64,

    #[serde(default)]
    pub all_processed: bool,
}

/// 削除・読み値登録などの汎用レスポンス
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

const SENTINELS: &[&str] = &["NOT_FOUND", "UNKNOWN", "none", "N/A"];

fn is_sentinel(s: &str) -> bool {
    SENTINELS.iter().any(|&v| v == s)
}

/// 文字列フィールドの正規化
///
/// null・欠損・センチネルは None。空文字列は「値あり」なので Some のまま。
/// 数値で返ってくる読み値は文字列化する。
fn opt_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            if is_sentinel(&s) {
                None
            } else {
                Some(s)
            }
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// 信頼度フィールドの正規化（0.0〜1.0の数値、または数値文字列）
fn opt_confidence<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            if is_sentinel(&s) {
                None
            } else {
                s.parse::<f64>().ok()
            }
        }
        Some(_) => None,
    })
}
