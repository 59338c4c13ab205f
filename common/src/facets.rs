//! 絞り込み区分（ファセット）定義
//!
//! 資本金・従業員数・事業所数・工場数・設立年の選択肢テーブル。
//! 上限（max）はすべて「未満」として扱う。

use crate::error::{Error, Result};
use crate::types::Company;
use serde::{Deserialize, Serialize};

/// 範囲（minは以上、maxは未満、Noneは無制限）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl Range {
    pub const fn new(min: Option<i64>, max: Option<i64>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: i64) -> bool {
        if let Some(min) = self.min {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if value >= max {
                return false;
            }
        }
        true
    }
}

/// 選択肢（ラベル付きの範囲）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeBin {
    pub label: &'static str,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl RangeBin {
    const fn new(label: &'static str, min: Option<i64>, max: Option<i64>) -> Self {
        Self { label, min, max }
    }

    pub const fn range(&self) -> Range {
        Range::new(self.min, self.max)
    }
}

/// 資本金（千円単位）
pub const CAPITAL_BINS: &[RangeBin] = &[
    RangeBin::new("1000万円未満", Some(0), Some(10_000)),
    RangeBin::new("1000万円-1億円", Some(10_000), Some(100_000)),
    RangeBin::new("1億円-10億円", Some(100_000), Some(1_000_000)),
    RangeBin::new("10億円-100億円", Some(1_000_000), Some(10_000_000)),
    RangeBin::new("100億円以上", Some(10_000_000), None),
];

pub const EMPLOYEE_BINS: &[RangeBin] = &[
    RangeBin::new("10人未満", Some(0), Some(10)),
    RangeBin::new("10-100人", Some(10), Some(100)),
    RangeBin::new("100-1000人", Some(100), Some(1_000)),
    RangeBin::new("1000-1万人", Some(1_000), Some(10_000)),
    RangeBin::new("1万人以上", Some(10_000), None),
];

pub const OFFICE_BINS: &[RangeBin] = &[
    RangeBin::new("1箇所のみ", Some(1), Some(2)),
    RangeBin::new("2-5箇所", Some(2), Some(6)),
    RangeBin::new("6-10箇所", Some(6), Some(11)),
    RangeBin::new("11箇所以上", Some(11), None),
];

pub const FACTORY_BINS: &[RangeBin] = &[
    RangeBin::new("なし", Some(0), Some(1)),
    RangeBin::new("1箇所のみ", Some(1), Some(2)),
    RangeBin::new("2-5箇所", Some(2), Some(6)),
    RangeBin::new("6箇所以上", Some(6), None),
];

pub const FOUNDED_YEAR_BINS: &[RangeBin] = &[
    RangeBin::new("1950年以前", None, Some(1950)),
    RangeBin::new("1950-1960年", Some(1950), Some(1960)),
    RangeBin::new("1960-1970年", Some(1960), Some(1970)),
    RangeBin::new("1970-1980年", Some(1970), Some(1980)),
    RangeBin::new("1980-1990年", Some(1980), Some(1990)),
    RangeBin::new("1990-2000年", Some(1990), Some(2000)),
    RangeBin::new("2000-2010年", Some(2000), Some(2010)),
    RangeBin::new("2010-2020年", Some(2010), Some(2020)),
    RangeBin::new("2020年以降", Some(2020), None),
];

/// 範囲で絞り込む区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Capital,
    Employees,
    Offices,
    Factories,
    FoundedYear,
}

impl Facet {
    pub const ALL: [Facet; 5] = [
        Facet::Capital,
        Facet::Employees,
        Facet::Offices,
        Facet::Factories,
        Facet::FoundedYear,
    ];

    /// 表示名
    pub fn name(&self) -> &'static str {
        match self {
            Facet::Capital => "資本金",
            Facet::Employees => "従業員数",
            Facet::Offices => "事業所数",
            Facet::Factories => "工場数",
            Facet::FoundedYear => "設立年",
        }
    }

    pub fn bins(&self) -> &'static [RangeBin] {
        match self {
            Facet::Capital => CAPITAL_BINS,
            Facet::Employees => EMPLOYEE_BINS,
            Facet::Offices => OFFICE_BINS,
            Facet::Factories => FACTORY_BINS,
            Facet::FoundedYear => FOUNDED_YEAR_BINS,
        }
    }

    /// 企業レコードから区分の値を取り出す
    pub fn value_of(&self, company: &Company) -> Option<i64> {
        match self {
            Facet::Capital => company.capital_k(),
            Facet::Employees => company.employees(),
            Facet::Offices => company.offices(),
            Facet::Factories => company.factories(),
            Facet::FoundedYear => company.founded_year(),
        }
    }

    /// 保持している(min, max)に一致する選択肢
    pub fn bin_for(&self, range: &Range) -> Option<&'static RangeBin> {
        self.bins().iter().find(|bin| bin.range() == *range)
    }

    /// ボタン表示用ラベル（未選択・一致なしは区分名）
    pub fn label_for(&self, range: Option<&Range>) -> &'static str {
        range
            .and_then(|r| self.bin_for(r))
            .map(|bin| bin.label)
            .unwrap_or(self.name())
    }

    /// 番号（1始まり）またはラベルで選択肢を指定
    pub fn select(&self, selector: &str) -> Result<&'static RangeBin> {
        let selector = selector.trim();
        let bins = self.bins();

        if let Ok(n) = selector.parse::<usize>() {
            if n >= 1 && n <= bins.len() {
                return Ok(&bins[n - 1]);
            }
        }

        bins.iter().find(|bin| bin.label == selector).ok_or_else(|| {
            let choices: Vec<String> = bins
                .iter()
                .enumerate()
                .map(|(i, b)| format!("{}={}", i + 1, b.label))
                .collect();
            Error::Parse(format!(
                "{}の区分が不正です: {} (選択肢: {})",
                self.name(),
                selector,
                choices.join(", ")
            ))
        })
    }
}

impl std::fmt::Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 都道府県（標準順）
pub const PREFECTURES: [&str; 47] = [
    "北海道", "青森県", "岩手県", "宮城県", "秋田県", "山形県", "福島県",
    "茨城県", "栃木県", "群馬県", "埼玉県", "千葉県", "東京都", "神奈川県",
    "新潟県", "富山県", "石川県", "福井県", "山梨県", "長野県",
    "岐阜県", "静岡県", "愛知県", "三重県", "滋賀県", "京都府",
    "大阪府", "兵庫県", "奈良県", "和歌山県", "鳥取県", "島根県",
    "岡山県", "広島県", "山口県", "徳島県", "香川県", "愛媛県",
    "高知県", "福岡県", "佐賀県", "長崎県", "熊本県", "大分県",
    "宮崎県", "鹿児島県", "沖縄県",
];

/// 地域グループ
pub const REGION_GROUPS: &[(&str, &[&str])] = &[
    ("北海道・東北", &["北海道", "青森県", "岩手県", "宮城県", "秋田県", "山形県", "福島県"]),
    ("関東", &["茨城県", "栃木県", "群馬県", "埼玉県", "千葉県", "東京都", "神奈川県"]),
    ("中部", &["新潟県", "富山県", "石川県", "福井県", "山梨県", "長野県", "岐阜県", "静岡県", "愛知県"]),
    ("関西", &["三重県", "滋賀県", "京都府", "大阪府", "兵庫県", "奈良県", "和歌山県"]),
    ("中国・四国", &["鳥取県", "島根県", "岡山県", "広島県", "山口県", "徳島県", "香川県", "愛媛県", "高知県"]),
    ("九州", &["福岡県", "佐賀県", "長崎県", "熊本県", "大分県", "宮崎県", "鹿児島県", "沖縄県"]),
];

/// 地域名から都道府県一覧を取得
pub fn region_prefectures(region: &str) -> Option<&'static [&'static str]> {
    REGION_GROUPS
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, prefs)| *prefs)
}

/// 標準順での位置
pub fn prefecture_index(name: &str) -> Option<usize> {
    PREFECTURES.iter().position(|p| *p == name)
}
