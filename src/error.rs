use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeterOcrError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIベースURLが設定されていません。`meter-ocr config --set-base-url YOUR_URL` で設定してください")]
    MissingBaseUrl,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("アーカイブを解析できません: {0}")]
    ArchiveCorrupt(String),

    #[error("アーカイブに画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("設定値が不正: {0}")]
    InvalidConfiguration(String),

    #[error("チャンクの生成に失敗: {0}")]
    Packaging(String),

    #[error("ネットワークエラー: {0}")]
    Network(String),

    #[error("認証エラー: 再ログインしてください")]
    AuthRequired,

    #[error("バックエンド処理の完了待ちがタイムアウトしました（{attempts}回ポーリング）")]
    ReconciliationTimeout { attempts: u32 },

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MeterOcrError>;
