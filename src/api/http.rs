use super::{classify_status, CompanyIngest, SearchApi};
use crate::config::Config;
use crate::error::{AppError, Result};
use company_search_common::types::{Company, SearchRequest, SearchResponse};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-api-key";

fn build_client(config: &Config) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.timeout_seconds {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| AppError::Config(format!("HTTPクライアントの初期化に失敗: {}", e)))
}

/// 非2xxの応答をエラーに変換
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), %body, "search endpoint returned an error");
    Err(classify_status(status.as_u16(), body))
}

/// 検索エンドポイントのHTTPクライアント
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpSearchClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            url: config.get_api_url()?,
            api_key: config.api_key(),
        })
    }
}

impl SearchApi for HttpSearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        tracing::debug!(?request, "search");

        let mut builder = self.client.post(&self.url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let response = check_status(builder.send().await?).await?;
        let page: SearchResponse = response.json().await?;

        tracing::debug!(
            total = page.total,
            items = page.items.len(),
            next_cursor = ?page.next_cursor,
            "search page received"
        );
        Ok(page)
    }
}

/// 企業データ取り込みエンドポイントのHTTPクライアント
#[derive(Debug, Clone)]
pub struct HttpIngestClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpIngestClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        let url = config.ingest_url.clone().ok_or_else(|| {
            AppError::Config(
                "取り込み先URLが設定されていません。`company-search config --set-ingest-url URL` で設定してください".into(),
            )
        })?;
        Ok(Self {
            client: build_client(config)?,
            url,
            api_key: config.api_key(),
        })
    }
}

impl CompanyIngest for HttpIngestClient {
    async fn ingest(&self, company: &Company) -> Result<()> {
        let mut builder = self.client.post(&self.url).json(company);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        check_status(builder.send().await?).await?;
        Ok(())
    }
}
