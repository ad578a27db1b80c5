use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "meter-ocr")]
#[command(about = "メーター写真AI-OCR一括アップロード・結果取得ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ZIPアーカイブをチャンク分割して一括アップロード
    Upload {
        /// 画像を含むZIPファイル
        #[arg(required = true)]
        archive: PathBuf,

        /// チャンクサイズ（1回の送信枚数、省略時は設定値）
        #[arg(short, long)]
        chunk_size: Option<usize>,

        /// チャンクを並列送信する（既定は逐次）
        #[arg(long)]
        parallel: bool,

        /// 並列送信時の同時実行数（省略時は設定値）
        #[arg(long)]
        max_in_flight: Option<usize>,

        /// アップロード後にバックエンドの処理完了を待つ
        #[arg(long)]
        wait: bool,

        /// 結果JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 単一画像をアップロード（チャンク化なし）
    UploadImage {
        /// 画像ファイル
        #[arg(required = true)]
        image: PathBuf,

        /// 結果JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// アップロード済み画像の一覧を取得
    Fetch {
        /// 取得ページ
        #[arg(long, default_value = "1")]
        page: u32,

        /// 1ページあたりの件数（省略時は設定値）
        #[arg(long)]
        per_page: Option<u32>,

        /// all_processed が立つまでポーリングする
        #[arg(long)]
        wait: bool,

        /// 一覧JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 結果JSONからExcelを生成
    Export {
        /// 入力JSONファイル（uploadの--output出力）
        #[arg(required = true)]
        input: PathBuf,

        /// 出力xlsxファイル
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// サーバー生成の評価結果Excelを取得
    Download {
        /// 出力xlsxファイル
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 手動読み値を登録（不鮮明画像の修正入力）
    SubmitReading {
        /// 対象画像のID
        #[arg(long)]
        id: String,

        /// 読み値
        #[arg(long)]
        reading: String,

        /// 画像の状態 (clear/unclear)
        #[arg(long, default_value = "clear")]
        remark: String,
    },

    /// サーバー側の全画像を削除
    Clear,

    /// 設定を表示/編集
    Config {
        /// APIベースURLを設定
        #[arg(long)]
        set_base_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
