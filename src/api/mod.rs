//! バックエンドAPIクライアント
//!
//! multipartアップロード・一覧取得・削除などのHTTP呼び出しを担う。
//! ベースURLは設定から渡す（ソースコードへの埋め込みはしない）。

pub mod types;

use crate::config::Config;
use crate::error::{MeterOcrError, Result};
use crate::reconciler::ListingClient;
use crate::uploader::UploadTransport;
use async_trait::async_trait;
use reqwest::multipart;
use reqwest::StatusCode;
use std::time::Duration;
use types::{
    ListingResponse, MessageResponse, OcrResult, SingleUploadResponse, UploadResponse,
};

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String, config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| MeterOcrError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// チャンクZIPの一括アップロード
    pub async fn upload_images(&self, payload: Vec<u8>, file_name: &str) -> Result<Vec<OcrResult>> {
        let part = multipart::Part::bytes(payload)
            .file_name(file_name.to_string())
            .mime_str("application/zip")
            .map_err(|e| MeterOcrError::Network(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.endpoint("upload-images"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MeterOcrError::Network(e.to_string()))?;

        let response = Self::check_status(response)?;
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| MeterOcrError::Network(e.to_string()))?;
        Ok(body.results)
    }

    /// 単一画像のアップロード
    pub async fn upload_image(&self, payload: Vec<u8>, file_name: &str) -> Result<OcrResult> {
        let part = multipart::Part::bytes(payload)
            .file_name(file_name.to_string())
            .mime_str(mime_for_name(file_name))
            .map_err(|e| MeterOcrError::Network(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.endpoint("upload-image"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MeterOcrError::Network(e.to_string()))?;

        let response = Self::check_status(response)?;
        let body: SingleUploadResponse = response
            .json()
            .await
            .map_err(|e| MeterOcrError::Network(e.to_string()))?;
        Ok(body.result)
    }

    /// アップロード済み画像の一覧取得
    pub async fn get_images(&self, page: u32, per_page: u32) -> Result<ListingResponse> {
        let response = self
            .http
            .get(self.endpoint("images"))
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await
            .map_err(|e| MeterOcrError::Network(e.to_string()))?;

        let response = Self::check_status(response)?;
        response
            .json()
            .await
            .map_err(|e| MeterOcrError::Network(e.to_string()))
    }

    /// サーバー側に保存された全画像の削除
    pub async fn delete_images(&self) -> Result<MessageResponse> {
        let response = self
            .http
            .delete(self.endpoint("delete-images"))
            .send()
            .await
            .map_err(|e| MeterOcrError::Network(e.to_string()))?;

        let response = Self::check_status(response)?;
        response
            .json()
            .await
            .map_err(|e| MeterOcrError::Network(e.to_string()))
    }

    /// サーバー側で生成された評価結果Excelの取得
    pub async fn download_result(&self) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(self.endpoint("download-result"))
            .send()
            .await
            .map_err(|e| MeterOcrError::Network(e.to_string()))?;

        let response = Self::check_status(response)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| MeterOcrError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// 手動読み値の登録（担当者による修正入力）
    pub async fn submit_reading(
        &self,
        id: &str,
        reading: &str,
        remark: &str,
    ) -> Result<MessageResponse> {
        let response = self
            .http
            .post(self.endpoint("submit-reading"))
            .json(&serde_json::json!({
                "id": id,
                "reading": reading,
                "remark": remark,
            }))
            .send()
            .await
            .map_err(|e| MeterOcrError::Network(e.to_string()))?;

        let response = Self::check_status(response)?;
        response
            .json()
            .await
            .map_err(|e| MeterOcrError::Network(e.to_string()))
    }

    /// 401は再ログインを促すため他のHTTPエラーと区別する
    fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(MeterOcrError::AuthRequired);
        }
        if !response.status().is_success() {
            return Err(MeterOcrError::Network(format!(
                "HTTP {} ({})",
                response.status(),
                response.url()
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl UploadTransport for ApiClient {
    async fn upload_chunk(&self, payload: Vec<u8>, file_name: &str) -> Result<Vec<OcrResult>> {
        self.upload_images(payload, file_name).await
    }

    async fn upload_single(&self, payload: Vec<u8>, file_name: &str) -> Result<OcrResult> {
        self.upload_image(payload, file_name).await
    }
}

#[async_trait]
impl ListingClient for ApiClient {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<ListingResponse> {
        self.get_images(page, per_page).await
    }
}

/// 拡張子からMIMEタイプを引く（不明時はjpeg扱い）
fn mime_for_name(name: &str) -> &'static str {
    match name.rsplit('.').next().map(|e| e.to_lowercase()).as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}
