use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use meter_ocr_rust::{api, cli, config, error, export, reconciler, scanner, uploader};

use api::ApiClient;
use cli::{Cli, Commands};
use config::Config;
use error::{MeterOcrError, Result};
use reconciler::PollingReconciler;
use scanner::Archive;
use std::path::PathBuf;
use std::time::Duration;
use uploader::{DispatchPolicy, UploadCoordinator};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Upload {
            archive,
            chunk_size,
            parallel,
            max_in_flight,
            wait,
            output,
        } => {
            println!("📸 meter-ocr - 一括アップロード\n");
            let client = build_client(&config)?;

            // 1. スキャン
            println!("[1/3] アーカイブをスキャン中...");
            let archive = Archive::from_path(&archive)?;
            let items = archive.scan()?;
            println!("✔ {}枚の画像を検出\n", items.len());

            if items.is_empty() {
                return Err(MeterOcrError::NoImagesFound(
                    "対象画像 (png/jpg/jpeg/gif) がありません".into(),
                ));
            }

            // 2. チャンク送信
            let chunk_size = chunk_size.unwrap_or(config.chunk_size);
            let policy = if parallel {
                DispatchPolicy::BoundedParallel {
                    max_in_flight: max_in_flight.unwrap_or(config.max_in_flight),
                }
            } else {
                DispatchPolicy::Sequential
            };

            println!(
                "[2/3] アップロード中... (チャンクサイズ: {}{})",
                chunk_size,
                if parallel { "、並列" } else { "" }
            );
            let coordinator = UploadCoordinator::new(&client, chunk_size, policy);

            let bar = ProgressBar::new(items.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len}枚")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );

            let report = coordinator
                .run(&archive, |processed, _| bar.set_position(processed as u64))
                .await?;
            bar.finish_and_clear();

            println!(
                "✔ 送信完了: {}/{}枚の結果を受信（失敗チャンク: {}）\n",
                report.results.len(),
                report.total,
                report.failed_chunks()
            );

            // 3. 完了待ち（二段階型バックエンドのみ）
            let results = if wait {
                println!("[3/3] バックエンド処理の完了を待機中...");
                let mut reconciler = PollingReconciler::new(
                    &client,
                    Duration::from_millis(config.poll_interval_ms),
                    config.max_poll_attempts,
                );
                let listing = reconciler.wait_until_processed(1, config.per_page).await?;
                println!("✔ 全画像の処理が完了（{}枚）\n", listing.total);
                listing.images
            } else {
                report.results
            };

            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&results)?;
                std::fs::write(&path, json)?;
                println!("✔ 結果を保存: {}", path.display());
            } else if cli.verbose {
                for result in &results {
                    println!("  {}", result.image_url);
                }
            }

            println!("\n✅ 完了");
        }

        Commands::UploadImage { image, output } => {
            println!("📸 meter-ocr - 単一アップロード\n");
            let client = build_client(&config)?;

            if !image.exists() {
                return Err(MeterOcrError::FileNotFound(image.display().to_string()));
            }

            let data = std::fs::read(&image)?;
            let file_name = image
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "image.jpg".to_string());

            println!("アップロード中: {}", file_name);
            let coordinator =
                UploadCoordinator::new(&client, config.chunk_size, DispatchPolicy::Sequential);
            let result = coordinator.upload_single(data, &file_name).await?;
            println!("✔ アップロード完了");

            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&result)?;
                std::fs::write(&path, json)?;
                println!("✔ 結果を保存: {}", path.display());
            } else {
                let records = export::to_flat_records(&[result]);
                let record = &records[0];
                println!("  読み値1: {} ({})", record.reading_1, record.confidence_1);
                println!("  読み値2: {} ({})", record.reading_2, record.confidence_2);
                println!("  シリアル: {}", record.serial_number);
                println!("  スプーフ判定: {}", record.spoof_result);
            }
        }

        Commands::Fetch {
            page,
            per_page,
            wait,
            output,
        } => {
            println!("📄 meter-ocr - 一覧取得\n");
            let client = build_client(&config)?;
            let per_page = per_page.unwrap_or(config.per_page);

            let listing = if wait {
                println!("バックエンド処理の完了を待機中...");
                let mut reconciler = PollingReconciler::new(
                    &client,
                    Duration::from_millis(config.poll_interval_ms),
                    config.max_poll_attempts,
                );
                reconciler.wait_until_processed(page, per_page).await?
            } else {
                client.get_images(page, per_page).await?
            };

            println!(
                "✔ ページ {}/{}（全{}枚、処理完了: {}）",
                listing.current_page,
                listing.pages,
                listing.total,
                if listing.all_processed { "済" } else { "未" }
            );

            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&listing.images)?;
                std::fs::write(&path, json)?;
                println!("✔ 一覧を保存: {}", path.display());
            } else if cli.verbose {
                for result in &listing.images {
                    println!("  {}", result.image_url);
                }
            }
        }

        Commands::Export { input, output } => {
            println!("📄 meter-ocr - エクスポート\n");

            let content = std::fs::read_to_string(&input)?;
            let results: Vec<meter_ocr_rust::OcrResult> = serde_json::from_str(&content)?;

            let records = export::to_flat_records(&results);
            let path = output.unwrap_or_else(|| PathBuf::from(export::default_excel_name()));
            export::write_excel(&records, &path)?;

            println!("✔ Excelを保存: {} ({}行)", path.display(), records.len());
        }

        Commands::Download { output } => {
            println!("📄 meter-ocr - 評価結果ダウンロード\n");
            let client = build_client(&config)?;

            let bytes = client.download_result().await?;
            let path = output.unwrap_or_else(|| PathBuf::from(export::default_excel_name()));
            std::fs::write(&path, bytes)?;

            println!("✔ 保存しました: {}", path.display());
        }

        Commands::SubmitReading {
            id,
            reading,
            remark,
        } => {
            let client = build_client(&config)?;
            let response = client.submit_reading(&id, &reading, &remark).await?;

            if response.message.is_empty() {
                println!("✔ 読み値を登録しました: {}", id);
            } else {
                println!("✔ {}", response.message);
            }
        }

        Commands::Clear => {
            let client = build_client(&config)?;
            let response = client.delete_images().await?;

            if response.message.is_empty() {
                println!("✔ サーバー側の全画像を削除しました");
            } else {
                println!("✔ {}", response.message);
            }
        }

        Commands::Config { set_base_url, show } => {
            let mut config = config;

            if let Some(url) = set_base_url {
                config.set_base_url(url)?;
                println!("✔ ベースURLを設定しました");
            }

            if show {
                println!("設定:");
                println!(
                    "  ベースURL: {}",
                    config.base_url.as_deref().unwrap_or("未設定")
                );
                println!("  チャンクサイズ: {}", config.chunk_size);
                println!("  1ページあたり: {}件", config.per_page);
                println!("  並列同時実行数: {}", config.max_in_flight);
                println!("  ポーリング間隔: {}ms", config.poll_interval_ms);
                println!("  最大ポーリング回数: {}", config.max_poll_attempts);
                println!("  HTTPタイムアウト: {}秒", config.timeout_seconds);
            }
        }
    }

    Ok(())
}

fn build_client(config: &Config) -> Result<ApiClient> {
    let base_url = config.get_base_url()?;
    ApiClient::new(base_url, config)
}
