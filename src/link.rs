//! 検索画面へのリンク（URLクエリパラメータ）
//!
//! - キーワード検索: `/company-search?q=…&pref=…`
//! - 絞り込み検索: `/advanced-search?filters=<FilterSetのJSON>`

use crate::error::{AppError, Result};
use company_search_common::filter::FilterSet;
use reqwest::Url;

pub const KEYWORD_PATH: &str = "/company-search";
pub const ADVANCED_PATH: &str = "/advanced-search";

// パスだけのリンクを解釈するための仮の基点
const LINK_BASE: &str = "http://localhost";

#[derive(Debug, Clone, PartialEq)]
pub enum DeepLink {
    Keyword {
        q: Option<String>,
        pref: Option<String>,
    },
    Advanced(FilterSet),
}

impl DeepLink {
    /// `パス?クエリ` 形式
    pub fn to_path_and_query(&self) -> Result<String> {
        let mut url = Url::parse(LINK_BASE)
            .map_err(|e| AppError::InvalidLink(e.to_string()))?;

        match self {
            DeepLink::Keyword { q, pref } => {
                url.set_path(KEYWORD_PATH);
                let mut pairs = url.query_pairs_mut();
                if let Some(q) = q.as_deref().filter(|s| !s.is_empty()) {
                    pairs.append_pair("q", q);
                }
                if let Some(pref) = pref.as_deref().filter(|s| !s.is_empty()) {
                    pairs.append_pair("pref", pref);
                }
            }
            DeepLink::Advanced(filters) => {
                url.set_path(ADVANCED_PATH);
                url.query_pairs_mut()
                    .append_pair("filters", &serde_json::to_string(filters)?);
            }
        }

        let query = url.query().filter(|q| !q.is_empty());
        Ok(match query {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        })
    }

    /// URL・`パス?クエリ`・クエリのみのいずれも受け付ける
    pub fn parse(link: &str) -> Result<Self> {
        let base = Url::parse(LINK_BASE).map_err(|e| AppError::InvalidLink(e.to_string()))?;
        let trimmed = link.trim();
        let url = if trimmed.starts_with('?') {
            base.join(&format!("{}{}", KEYWORD_PATH, trimmed))
        } else {
            base.join(trimmed)
        }
        .map_err(|e| AppError::InvalidLink(format!("{}: {}", link, e)))?;

        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .filter(|v| !v.is_empty())
        };

        match url.path() {
            ADVANCED_PATH => {
                let raw = param("filters").ok_or_else(|| {
                    AppError::InvalidLink("filters パラメータがありません".into())
                })?;
                let filters: FilterSet = serde_json::from_str(&raw)
                    .map_err(|e| AppError::InvalidLink(format!("filters: {}", e)))?;
                Ok(DeepLink::Advanced(filters))
            }
            KEYWORD_PATH => Ok(DeepLink::Keyword {
                q: param("q"),
                pref: param("pref"),
            }),
            other => Err(AppError::InvalidLink(format!("不明な画面です: {}", other))),
        }
    }

    /// 検索条件に戻す
    pub fn filter_set(&self) -> FilterSet {
        match self {
            DeepLink::Keyword { q, pref } => FilterSet {
                keyword: q.clone(),
                prefectures: pref.iter().cloned().collect(),
                ..Default::default()
            },
            DeepLink::Advanced(filters) => filters.clone(),
        }
    }
}
