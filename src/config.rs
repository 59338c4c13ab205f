use crate::error::{AppError, Result};
use company_search_common::types::MAX_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const API_URL_ENV: &str = "COMPANY_SEARCH_API_URL";
const API_KEY_ENV: &str = "COMPANY_SEARCH_API_KEY";

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 検索エンドポイント（POST）
    pub api_url: Option<String>,
    /// x-api-key ヘッダーで送る
    pub api_key: Option<String>,
    /// 企業データ取り込みエンドポイント
    pub ingest_url: Option<String>,
    /// ローカルデータストアのファイル
    pub store_path: Option<PathBuf>,
    /// 絞り込み検索の1ページ件数
    pub page_size: u32,
    /// キーワード検索の1ページ件数
    pub keyword_page_size: u32,
    /// 未設定ならHTTPクライアントの既定値
    pub timeout_seconds: Option<u64>,
    /// 保存検索の作成者として記録
    pub user: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            ingest_url: None,
            store_path: None,
            page_size: MAX_PAGE_SIZE,
            keyword_page_size: 20,
            timeout_seconds: None,
            user: None,
        }
    }
}

impl Config {
    /// ファイルの値だけを読む（環境変数は参照時に解決）
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AppError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("company-search"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    pub fn get_api_url(&self) -> Result<String> {
        // 環境変数を優先
        env_value(API_URL_ENV)
            .or_else(|| self.api_url.clone())
            .ok_or(AppError::MissingApiUrl)
    }

    /// x-api-key に使うキー（環境変数を優先）
    pub fn api_key(&self) -> Option<String> {
        env_value(API_KEY_ENV).or_else(|| self.api_key.clone())
    }

    pub fn resolved_store_path(&self) -> Result<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("store.json")),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn keyword_page_size(&self) -> u32 {
        self.keyword_page_size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn created_by(&self) -> String {
        self.user.clone().unwrap_or_else(|| "unknown".into())
    }
}
