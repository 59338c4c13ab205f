//! 出力列の定義
//!
//! 検索結果1件を固定の列並びに平坦化する。
//! 役員・株主は先頭3件まで、決算は先頭（最新）の1件のみ。

use crate::types::Company;

/// セル値
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    fn text(value: Option<&str>) -> Self {
        match value {
            Some(s) if !s.is_empty() => CellValue::Text(s.to_string()),
            _ => CellValue::Empty,
        }
    }

    fn int(value: Option<i64>) -> Self {
        match value {
            Some(n) if n != 0 => CellValue::Number(n as f64),
            _ => CellValue::Empty,
        }
    }

    fn float(value: Option<f64>) -> Self {
        match value {
            Some(n) if n != 0.0 => CellValue::Number(n),
            _ => CellValue::Empty,
        }
    }

    fn joined(values: Option<&[String]>) -> Self {
        match values {
            Some(v) if !v.is_empty() => CellValue::Text(v.join(", ")),
            _ => CellValue::Empty,
        }
    }

    /// 列幅計算用の表示文字数
    pub fn display_len(&self) -> usize {
        match self {
            CellValue::Text(s) => s.chars().count(),
            CellValue::Number(n) => n.to_string().chars().count(),
            CellValue::Empty => 0,
        }
    }
}

/// 出力列の見出し
pub const EXPORT_HEADERS: &[&str] = &[
    "企業ID",
    "企業名",
    "企業名カナ",
    "都道府県",
    "郵便番号",
    "住所",
    "電話番号",
    "概要",
    "評価",
    "業種コード",
    "業種名",
    "法人種別",
    "索引漢字名",
    "索引カナ名",
    "創業年月",
    "江戸創業年",
    "設立年月日",
    "資本金（千円）",
    "従業員数",
    "工場数",
    "事業所数",
    "売上高（千円）",
    "利益（千円）",
    "自己資本比率",
    "決算年月",
    "上場市場",
    "証券コード",
    "EDINETコード",
    "代表者名",
    "代表者カナ",
    "代表者役職",
    "代表者電話",
    "調査年月日",
    "DB更新日",
    "取引先",
    "仕入先",
    "事業内容",
    "取引銀行",
    "役員1",
    "役員2",
    "役員3",
    "株主1",
    "株主2",
    "株主3",
];

/// 1社分の行（EXPORT_HEADERSと同じ並び）
pub fn export_row(c: &Company) -> Vec<CellValue> {
    let address = c.address.as_ref();
    let legal = c.legal.as_ref();
    let founded = c.founded.as_ref();
    let stats = c.company_stats.as_ref();
    let fin = c.latest_financial();
    let listing = c.listing.as_ref();
    let rep = c.representative.as_ref();
    let dates = c.data_dates.as_ref();

    let mut row = vec![
        CellValue::text(Some(&c.id)),
        CellValue::text(Some(&c.name)),
        CellValue::text(c.name_kana.as_deref()),
        CellValue::text(c.pref.as_deref()),
        CellValue::text(address.and_then(|a| a.zip.as_deref())),
        CellValue::text(address.and_then(|a| a.text.as_deref())),
        CellValue::text(address.and_then(|a| a.tel.as_deref())),
        CellValue::text(c.outline.as_deref()),
        CellValue::float(c.rating),
        CellValue::joined(c.industry.as_deref()),
        CellValue::joined(c.industry_names.as_deref()),
        CellValue::text(legal.and_then(|l| l.corp_form_code.as_deref())),
        CellValue::text(legal.and_then(|l| l.index_kanji_name.as_deref())),
        CellValue::text(legal.and_then(|l| l.index_kana_name.as_deref())),
        CellValue::text(founded.and_then(|f| f.founding_ym.as_deref())),
        CellValue::text(founded.and_then(|f| f.edo_founded_year.as_deref())),
        CellValue::text(founded.and_then(|f| f.incorporation_ymd.as_deref())),
        CellValue::int(stats.and_then(|s| s.capital_k)),
        CellValue::int(stats.and_then(|s| s.employees)),
        CellValue::int(stats.and_then(|s| s.factories)),
        CellValue::int(stats.and_then(|s| s.offices)),
        CellValue::int(fin.and_then(|f| f.revenue_k)),
        CellValue::int(fin.and_then(|f| f.profit_k)),
        CellValue::float(fin.and_then(|f| f.equity_ratio)),
        CellValue::text(fin.and_then(|f| f.year_month.as_deref())),
        CellValue::text(listing.and_then(|l| l.market.as_deref())),
        CellValue::text(listing.and_then(|l| l.ticker.as_deref())),
        CellValue::text(listing.and_then(|l| l.edinet.as_deref())),
        CellValue::text(rep.and_then(|r| r.name.as_deref())),
        CellValue::text(rep.and_then(|r| r.kana.as_deref())),
        CellValue::text(rep.and_then(|r| r.title.as_deref())),
        CellValue::text(rep.and_then(|r| r.tel.as_deref())),
        CellValue::text(dates.and_then(|d| d.survey_ymd.as_deref())),
        CellValue::text(dates.and_then(|d| d.db_update_ymd.as_deref())),
        CellValue::joined(c.clients.as_deref()),
        CellValue::joined(c.suppliers.as_deref()),
    ];

    let business: Vec<String> = c
        .business_items
        .iter()
        .flatten()
        .filter_map(|b| b.text.clone())
        .filter(|t| !t.is_empty())
        .collect();
    row.push(CellValue::joined(Some(&business)));

    let banks: Vec<String> = c
        .banks
        .iter()
        .flatten()
        .map(|b| {
            let name = b.name.as_deref().unwrap_or("");
            match b.branch.as_deref() {
                Some(branch) if !branch.is_empty() => format!("{} {}", name, branch),
                _ => name.to_string(),
            }
        })
        .filter(|t| !t.is_empty())
        .collect();
    row.push(CellValue::joined(Some(&banks)));

    let officers = c.officers.as_deref().unwrap_or_default();
    for i in 0..3 {
        row.push(match officers.get(i) {
            Some(o) => CellValue::Text(format!(
                "{} {}",
                o.title.as_deref().unwrap_or(""),
                o.name.as_deref().unwrap_or("")
            )),
            None => CellValue::Empty,
        });
    }

    let holders = c.shareholders.as_deref().unwrap_or_default();
    for i in 0..3 {
        row.push(match holders.get(i) {
            Some(s) => CellValue::Text(format!(
                "{} ({}%)",
                s.name.as_deref().unwrap_or(""),
                s.ratio.map(|r| r.to_string()).unwrap_or_default()
            )),
            None => CellValue::Empty,
        });
    }

    row
}

/// 列幅（見出し+2と最長値+2の大きい方、上限50）
pub fn column_widths(rows: &[Vec<CellValue>]) -> Vec<usize> {
    const MAX_WIDTH: usize = 50;
    EXPORT_HEADERS
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let longest = rows
                .iter()
                .filter_map(|r| r.get(i))
                .map(CellValue::display_len)
                .max()
                .unwrap_or(0);
            MAX_WIDTH.min((header.chars().count() + 2).max(longest + 2))
        })
        .collect()
}
