//! メーター写真AI-OCR 一括アップロードクライアント
//!
//! ZIPアーカイブ内のメーター写真をチャンク分割してバックエンドへ送信し、
//! OCR・スプーフ判定の結果を取得・エクスポートする。
//!
//! パイプライン:
//! アーカイブ → scanner → chunker → uploader（チャンクZIP化＋送信） →
//! 結果マージ → reconciler（二段階型バックエンドの完了待ち） → export

pub mod api;
pub mod chunker;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod reconciler;
pub mod scanner;
pub mod uploader;

pub use api::types::OcrResult;
pub use api::ApiClient;
pub use config::Config;
pub use error::{MeterOcrError, Result};
pub use reconciler::{PollingReconciler, ReconcileState};
pub use scanner::{Archive, ImageEntry};
pub use uploader::{DispatchPolicy, UploadCoordinator, UploadReport};
