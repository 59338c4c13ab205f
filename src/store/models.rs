//! ストアのレコード定義

use super::Record;
use chrono::{DateTime, Utc};
use company_search_common::filter::FilterSet;
use company_search_common::status::PipelineStatus;
use serde::{Deserialize, Serialize};

/// 生成ID（時刻順に並ぶ）
pub fn new_id() -> String {
    ulid::Ulid::new().to_string()
}

/// 利用者（IDはメールアドレス）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub user_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department: Option<String>,
}

impl User {
    pub fn from_email(email: &str) -> Self {
        Self {
            id: email.to_string(),
            email: email.to_string(),
            ..Default::default()
        }
    }
}

impl Record for User {
    const TABLE: &'static str = "User";

    fn id(&self) -> &str {
        &self.id
    }
}

/// 保存された検索条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuery {
    pub id: String,
    pub title: String,
    pub keyword: Option<String>,
    /// FilterSet のJSON
    pub filters: String,
    pub last_result_count: u64,
    pub last_run_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub usage_count: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
    pub created_by: String,
    pub description: Option<String>,
}

impl SavedQuery {
    /// 条件を復元（壊れていれば条件なし）
    pub fn filter_set(&self) -> FilterSet {
        match serde_json::from_str(&self.filters) {
            Ok(filters) => filters,
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "saved filters could not be parsed");
                FilterSet::default()
            }
        }
    }
}

impl Record for SavedQuery {
    const TABLE: &'static str = "SavedQuery";

    fn id(&self) -> &str {
        &self.id
    }
}

/// 企業ごとの営業ステータス（一覧表示用に企業情報を複製して持つ）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyInfo {
    /// 企業ID
    pub id: String,
    pub status: PipelineStatus,
    pub company_name: Option<String>,
    pub prefecture_name: Option<String>,
    pub industry_major: Option<String>,
    pub industry_mid_name: Option<String>,
}

impl Record for CompanyInfo {
    const TABLE: &'static str = "CompanyInfo";

    fn id(&self) -> &str {
        &self.id
    }
}

/// 業種マスター（小分類1行）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndustryMaster {
    pub id: String,
    pub small_category_code: String,
    pub small_category: String,
    pub medium_category_code: String,
    pub medium_category: String,
    pub large_category_code: String,
    pub large_category: String,
}

impl Record for IndustryMaster {
    const TABLE: &'static str = "IndustryMaster";

    fn id(&self) -> &str {
        &self.id
    }
}

/// 住所マスター（市区町村1行）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressMaster {
    pub id: String,
    pub administrative_area_code: String,
    pub prefecture_code: String,
    pub prefecture_name: String,
    pub municipality_name: String,
    pub prefecture_name_kana: String,
    pub municipality_name_kana: String,
}

impl Record for AddressMaster {
    const TABLE: &'static str = "AddressMaster";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_query_broken_filters_fall_back() {
        let now = Utc::now();
        let query = SavedQuery {
            id: new_id(),
            title: "t".into(),
            keyword: None,
            filters: "{not json".into(),
            last_result_count: 0,
            last_run_at: now,
            created_at: now,
            usage_count: 1,
            tags: vec![],
            is_public: true,
            created_by: "unknown".into(),
            description: None,
        };
        assert!(query.filter_set().is_empty());
    }

    #[test]
    fn test_company_info_status_wire_value() {
        let info = CompanyInfo {
            id: "c1".into(),
            status: PipelineStatus::Won,
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["status"], "受注");
        assert_eq!(json["companyName"], serde_json::Value::Null);
    }

    #[test]
    fn test_new_id_is_unique() {
        assert_ne!(new_id(), new_id());
    }
}
