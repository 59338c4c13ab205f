//! 検索APIの型定義
//!
//! 検索エンドポイントとやり取りするJSONの形:
//! - SearchRequest: 検索条件（POSTボディ）
//! - SearchResponse: 1ページ分の結果
//! - Company: 企業レコード（読み取り専用）

use serde::{Deserialize, Serialize};

/// 1リクエストあたりの最大取得件数（APIの上限）
pub const MAX_PAGE_SIZE: u32 = 200;

/// 既定の並び順（最新売上高の降順）
pub const DEFAULT_ORDER_BY: &str = "revenueK_latest";

/// 検索リクエスト
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pref: Option<String>,
    /// 業種コード（例: ["5223","5229"]）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<Vec<String>>,
    /// 業種大分類
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_major: Option<String>,
    /// 業種中分類
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_mid_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_min_k: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_max_k: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    /// true=降順
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<bool>,
    /// 1..=200
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<u64>,
}

impl SearchRequest {
    /// 件数だけを取得するリクエスト（limit=1, totalのみ使用）
    pub fn count_only(pref: &str, industry_major: &str, industry_mid_name: &str) -> Self {
        Self::for_cell(pref, industry_major, industry_mid_name, 1)
    }

    /// 都道府県×業種セルの企業一覧リクエスト
    pub fn for_cell(pref: &str, industry_major: &str, industry_mid_name: &str, limit: u32) -> Self {
        Self {
            pref: Some(pref.to_string()),
            industry_major: Some(industry_major.to_string()),
            industry_mid_name: non_empty(industry_mid_name),
            limit: Some(limit.clamp(1, MAX_PAGE_SIZE)),
            ..Default::default()
        }
    }
}

/// 検索レスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchResponse {
    /// 総件数（0は不明として扱う）
    pub total: u64,
    pub next_cursor: Option<u64>,
    pub items: Vec<Company>,
}

/// 文字列または文字列配列（業種大分類・中分類）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn joined(&self, sep: &str) -> String {
        match self {
            OneOrMany::One(s) => s.clone(),
            OneOrMany::Many(v) => v.join(sep),
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        match self {
            OneOrMany::One(s) => s == value,
            OneOrMany::Many(v) => v.iter().any(|s| s == value),
        }
    }
}

/// 企業レコード
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub name_kana: Option<String>,
    pub pref: Option<String>,
    pub outline: Option<String>,
    pub rating: Option<f64>,

    // 住所情報
    pub address: Option<Address>,

    // 業種情報
    pub industry_major: Option<OneOrMany>,
    pub industry_mid_name: Option<OneOrMany>,
    pub industry: Option<Vec<String>>,
    pub industry_names: Option<Vec<String>>,

    // 法人情報
    pub legal: Option<Legal>,
    // 創業・設立情報
    pub founded: Option<Founded>,
    // 会社規模
    pub company_stats: Option<CompanyStats>,
    // データ基準日
    pub data_dates: Option<DataDates>,

    pub products: Option<Vec<CodeName>>,
    pub clients: Option<Vec<String>>,
    pub suppliers: Option<Vec<String>>,
    pub shareholders: Option<Vec<Shareholder>>,
    pub officers: Option<Vec<Officer>>,
    pub banks: Option<Vec<Bank>>,
    pub business_items: Option<Vec<BusinessItem>>,
    /// 決算情報（先頭が最新）
    pub financials: Option<Vec<Financial>>,
    pub listing: Option<Listing>,
    pub representative: Option<Representative>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub text: Option<String>,
    pub zip: Option<String>,
    pub tel: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Legal {
    pub position_before_after: Option<String>,
    pub corp_form_code: Option<String>,
    pub index_kanji_name: Option<String>,
    pub index_kana_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Founded {
    /// 創業年月（YYYYMM）
    pub founding_ym: Option<String>,
    pub edo_founded_year: Option<String>,
    pub incorporation_ymd: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyStats {
    /// 資本金（千円）
    pub capital_k: Option<i64>,
    pub employees: Option<i64>,
    pub factories: Option<i64>,
    pub offices: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataDates {
    pub survey_ymd: Option<String>,
    pub report_survey_ymd: Option<String>,
    pub db_update_ymd: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeName {
    pub code: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Shareholder {
    pub name: Option<String>,
    pub ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Officer {
    pub name: Option<String>,
    pub title: Option<String>,
    pub position: Option<String>,
    pub corp_flag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bank {
    pub code: Option<String>,
    pub name: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessItem {
    pub text: Option<String>,
    pub ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Financial {
    pub year_month: Option<String>,
    pub months: Option<i64>,
    pub revenue_k: Option<i64>,
    pub profit_k: Option<i64>,
    pub equity_ratio: Option<f64>,
    pub dividend_k: Option<i64>,
    pub estimate_flag: Option<String>,
    pub tax_incl_flag: Option<String>,
    pub has_finance: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Listing {
    pub market: Option<String>,
    pub ticker: Option<String>,
    pub edinet: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Representative {
    pub name: Option<String>,
    pub kana: Option<String>,
    pub title: Option<String>,
    pub birth_ymd: Option<String>,
    pub gender: Option<String>,
    pub since_ymd: Option<String>,
    pub tel: Option<String>,
    pub zip: Option<String>,
    pub address: Option<String>,
    pub address_kana: Option<String>,
    pub address_barcode: Option<String>,
    pub birthplace_code: Option<String>,
    pub birthplace_name: Option<String>,
    pub last_edu_school_code: Option<String>,
    pub last_edu_school: Option<String>,
    pub last_edu_grad_type: Option<String>,
    pub last_edu_degree: Option<String>,
    pub zodiac_code: Option<String>,
    pub zodiac_name: Option<String>,
    pub residence_code: Option<String>,
    pub residence_name: Option<String>,
    pub bankruptcy_history: Option<i64>,
    pub hobbies: Option<Vec<CodeName>>,
}

impl Company {
    pub fn capital_k(&self) -> Option<i64> {
        self.company_stats.as_ref().and_then(|s| s.capital_k)
    }

    pub fn employees(&self) -> Option<i64> {
        self.company_stats.as_ref().and_then(|s| s.employees)
    }

    pub fn offices(&self) -> Option<i64> {
        self.company_stats.as_ref().and_then(|s| s.offices)
    }

    pub fn factories(&self) -> Option<i64> {
        self.company_stats.as_ref().and_then(|s| s.factories)
    }

    /// 創業年（foundingYmの先頭4桁）
    pub fn founded_year(&self) -> Option<i64> {
        let ym = self.founded.as_ref()?.founding_ym.as_deref()?;
        ym.get(..4)?.parse().ok()
    }

    /// 最新の決算（先頭要素）
    pub fn latest_financial(&self) -> Option<&Financial> {
        self.financials.as_ref().and_then(|f| f.first())
    }

    pub fn industry_major_text(&self) -> Option<String> {
        self.industry_major.as_ref().map(|v| v.joined(", "))
    }

    pub fn industry_mid_text(&self) -> Option<String> {
        self.industry_mid_name.as_ref().map(|v| v.joined(", "))
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
