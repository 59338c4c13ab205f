//! 端末向けの表示
//!
//! 企業一覧の1行表示、詳細表示（セクションごと）、キーワードのハイライト。

use company_search_common::labels::{
    field_label, format_capital, format_int, format_k_yen, format_percent, format_tel, format_ym,
    format_ymd, or_dash, ValueDictionary,
};
use company_search_common::matrix::{CellKey, CellState, Matrix};
use company_search_common::types::Company;
use console::{pad_str, style, Alignment};
use regex::{Regex, RegexBuilder};

lazy_static::lazy_static! {
    static ref KEYWORD_SEPARATOR: Regex = Regex::new(r"\s+").unwrap();
}

/// ハイライト用に分割した文字列片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub matched: bool,
}

/// 空白区切りの各キーワードに一致する部分を切り出す（大文字小文字は区別しない）
pub fn highlight_segments<'a>(text: &'a str, keyword: Option<&str>) -> Vec<Segment<'a>> {
    let whole = vec![Segment { text, matched: false }];
    let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) else {
        return whole;
    };

    let pattern = KEYWORD_SEPARATOR
        .split(keyword)
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    let Ok(re) = RegexBuilder::new(&pattern).case_insensitive(true).build() else {
        return whole;
    };

    let mut segments = Vec::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        if m.start() > last {
            segments.push(Segment {
                text: &text[last..m.start()],
                matched: false,
            });
        }
        segments.push(Segment {
            text: m.as_str(),
            matched: true,
        });
        last = m.end();
    }
    if last < text.len() || segments.is_empty() {
        segments.push(Segment {
            text: &text[last..],
            matched: false,
        });
    }
    segments
}

/// 一致部分を強調した文字列
pub fn highlight(text: &str, keyword: Option<&str>) -> String {
    highlight_segments(text, keyword)
        .into_iter()
        .map(|s| {
            if s.matched {
                style(s.text).black().on_yellow().to_string()
            } else {
                s.text.to_string()
            }
        })
        .collect()
}

fn list_or_dash(items: Option<&Vec<String>>) -> String {
    match items {
        Some(items) if !items.is_empty() => items.join(", "),
        _ => "-".to_string(),
    }
}

/// 一覧の1行（ID・会社名・都道府県・住所・業種名・資本金）
pub fn company_line(company: &Company, keyword: Option<&str>) -> String {
    let address = company.address.as_ref().and_then(|a| a.text.as_deref());
    format!(
        "{}  {}  {}  {}  {}  {}",
        style(&company.id).dim(),
        highlight(&or_dash(Some(&company.name)), keyword),
        or_dash(company.pref.as_deref()),
        highlight(&or_dash(address), keyword),
        highlight(&list_or_dash(company.industry_names.as_ref()), keyword),
        format_capital(company.capital_k()),
    )
}

/// 詳細の表示項目
#[derive(Debug, Clone, PartialEq)]
pub enum DetailItem {
    Field { label: String, value: String },
    Table { headers: Vec<String>, rows: Vec<Vec<String>> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailSection {
    pub title: &'static str,
    pub items: Vec<DetailItem>,
}

fn field(path: &str, value: String) -> DetailItem {
    DetailItem::Field {
        label: field_label(path).to_string(),
        value,
    }
}

fn table(paths: &[&str], rows: Vec<Vec<String>>) -> DetailItem {
    DetailItem::Table {
        headers: paths.iter().map(|p| field_label(p).to_string()).collect(),
        rows,
    }
}

fn dict(dictionary: ValueDictionary, value: Option<&str>) -> String {
    or_dash(value.map(|v| dictionary.lookup(v)))
}

/// 企業詳細をセクションに分けて組み立てる
pub fn company_detail(c: &Company) -> Vec<DetailSection> {
    let address = c.address.clone().unwrap_or_default();
    let legal = c.legal.clone().unwrap_or_default();
    let founded = c.founded.clone().unwrap_or_default();
    let stats = c.company_stats.clone().unwrap_or_default();
    let dates = c.data_dates.clone().unwrap_or_default();
    let listing = c.listing.clone().unwrap_or_default();
    let rep = c.representative.clone().unwrap_or_default();

    let mut sections = vec![
        DetailSection {
            title: "基本情報",
            items: vec![
                field("pref", or_dash(c.pref.as_deref())),
                field("address.text", or_dash(address.text.as_deref())),
                field("address.zip", or_dash(address.zip.as_deref())),
                field("address.tel", format_tel(address.tel.as_deref())),
                field("outline", or_dash(c.outline.as_deref())),
            ],
        },
        DetailSection {
            title: "法人・沿革・規模",
            items: vec![
                field(
                    "legal.positionBeforeAfter",
                    dict(ValueDictionary::PositionBeforeAfter, legal.position_before_after.as_deref()),
                ),
                field("legal.corpFormCode", or_dash(legal.corp_form_code.as_deref())),
                field("legal.indexKanjiName", or_dash(legal.index_kanji_name.as_deref())),
                field("legal.indexKanaName", or_dash(legal.index_kana_name.as_deref())),
                field("founded.foundingYm", format_ym(founded.founding_ym.as_deref())),
                field("founded.edoFoundedYear", or_dash(founded.edo_founded_year.as_deref())),
                field("founded.incorporationYmd", format_ymd(founded.incorporation_ymd.as_deref())),
                field("companyStats.capitalK", format_k_yen(stats.capital_k)),
                field("companyStats.employees", format_int(stats.employees)),
                field("companyStats.factories", format_int(stats.factories)),
                field("companyStats.offices", format_int(stats.offices)),
                field("dataDates.surveyYmd", format_ymd(dates.survey_ymd.as_deref())),
                field("dataDates.reportSurveyYmd", format_ymd(dates.report_survey_ymd.as_deref())),
                field("dataDates.dbUpdateYmd", format_ymd(dates.db_update_ymd.as_deref())),
            ],
        },
        DetailSection {
            title: "業種・扱い品・取引先",
            items: vec![
                field("industry[]", list_or_dash(c.industry.as_ref())),
                field("industryNames[]", list_or_dash(c.industry_names.as_ref())),
                table(
                    &["products[].code", "products[].name"],
                    c.products
                        .iter()
                        .flatten()
                        .map(|p| vec![or_dash(p.code.as_deref()), or_dash(p.name.as_deref())])
                        .collect(),
                ),
                field("clients[]", list_or_dash(c.clients.as_ref())),
                field("suppliers[]", list_or_dash(c.suppliers.as_ref())),
            ],
        },
        DetailSection {
            title: "株主・役員・取引銀行",
            items: vec![
                table(
                    &["shareholders[].name", "shareholders[].ratio"],
                    c.shareholders
                        .iter()
                        .flatten()
                        .map(|s| vec![or_dash(s.name.as_deref()), format_percent(s.ratio)])
                        .collect(),
                ),
                table(
                    &["officers[].name", "officers[].title", "officers[].position", "officers[].corpFlag"],
                    c.officers
                        .iter()
                        .flatten()
                        .map(|o| {
                            vec![
                                or_dash(o.name.as_deref()),
                                or_dash(o.title.as_deref()),
                                or_dash(o.position.as_deref()),
                                or_dash(o.corp_flag.as_deref()),
                            ]
                        })
                        .collect(),
                ),
                table(
                    &["banks[].code", "banks[].name", "banks[].branch"],
                    c.banks
                        .iter()
                        .flatten()
                        .map(|b| {
                            vec![
                                or_dash(b.code.as_deref()),
                                or_dash(b.name.as_deref()),
                                or_dash(b.branch.as_deref()),
                            ]
                        })
                        .collect(),
                ),
            ],
        },
        DetailSection {
            title: "事業内容",
            items: vec![table(
                &["businessItems[].text", "businessItems[].ratio"],
                c.business_items
                    .iter()
                    .flatten()
                    .map(|b| vec![or_dash(b.text.as_deref()), format_percent(b.ratio)])
                    .collect(),
            )],
        },
    ];

    // 決算がなければセクションごと省く
    if let Some(financials) = c.financials.as_ref().filter(|f| !f.is_empty()) {
        sections.push(DetailSection {
            title: "財務情報（決算）",
            items: vec![table(
                &[
                    "financials[].yearMonth",
                    "financials[].months",
                    "financials[].revenueK",
                    "financials[].profitK",
                    "financials[].equityRatio",
                    "financials[].dividendK",
                    "financials[].estimateFlag",
                    "financials[].taxInclFlag",
                    "financials[].hasFinance",
                ],
                financials
                    .iter()
                    .map(|f| {
                        let has_finance = f.has_finance.map(|v| v.to_string());
                        vec![
                            format_ym(f.year_month.as_deref()),
                            f.months.map_or_else(|| "-".to_string(), |m| m.to_string()),
                            format_k_yen(f.revenue_k),
                            format_k_yen(f.profit_k),
                            format_percent(f.equity_ratio),
                            format_k_yen(f.dividend_k),
                            or_dash(f.estimate_flag.as_deref()),
                            or_dash(f.tax_incl_flag.as_deref()),
                            dict(ValueDictionary::Boolean01, has_finance.as_deref()),
                        ]
                    })
                    .collect(),
            )],
        });
    }

    let bankruptcy = rep.bankruptcy_history.map(|v| v.to_string());
    sections.push(DetailSection {
        title: "上場・各コード",
        items: vec![
            field("listing.market", dict(ValueDictionary::Market, listing.market.as_deref())),
            field("listing.ticker", or_dash(listing.ticker.as_deref())),
            field("listing.edinet", or_dash(listing.edinet.as_deref())),
        ],
    });
    sections.push(DetailSection {
        title: "代表者",
        items: vec![
            field("representative.name", or_dash(rep.name.as_deref())),
            field("representative.kana", or_dash(rep.kana.as_deref())),
            field("representative.title", or_dash(rep.title.as_deref())),
            field("representative.birthYmd", format_ymd(rep.birth_ymd.as_deref())),
            field("representative.gender", dict(ValueDictionary::Gender, rep.gender.as_deref())),
            field("representative.sinceYmd", format_ymd(rep.since_ymd.as_deref())),
            field("representative.tel", format_tel(rep.tel.as_deref())),
            field("representative.zip", or_dash(rep.zip.as_deref())),
            field("representative.address", or_dash(rep.address.as_deref())),
            field("representative.addressKana", or_dash(rep.address_kana.as_deref())),
            field("representative.addressBarcode", or_dash(rep.address_barcode.as_deref())),
            field("representative.birthplaceCode", or_dash(rep.birthplace_code.as_deref())),
            field("representative.birthplaceName", or_dash(rep.birthplace_name.as_deref())),
            field("representative.lastEduSchoolCode", or_dash(rep.last_edu_school_code.as_deref())),
            field("representative.lastEduSchool", or_dash(rep.last_edu_school.as_deref())),
            field("representative.lastEduGradType", or_dash(rep.last_edu_grad_type.as_deref())),
            field("representative.lastEduDegree", or_dash(rep.last_edu_degree.as_deref())),
            field("representative.zodiacCode", or_dash(rep.zodiac_code.as_deref())),
            field("representative.zodiacName", or_dash(rep.zodiac_name.as_deref())),
            field("representative.residenceCode", or_dash(rep.residence_code.as_deref())),
            field("representative.residenceName", or_dash(rep.residence_name.as_deref())),
            field(
                "representative.bankruptcyHistory",
                dict(ValueDictionary::Boolean01, bankruptcy.as_deref()),
            ),
            table(
                &["representative.hobbies[].code", "representative.hobbies[].name"],
                rep.hobbies
                    .iter()
                    .flatten()
                    .map(|h| vec![or_dash(h.code.as_deref()), or_dash(h.name.as_deref())])
                    .collect(),
            ),
        ],
    });

    sections
}

/// 詳細を端末向けの文字列にする
pub fn render_detail(company: &Company, keyword: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}\n",
        style(highlight(&company.name, keyword)).bold(),
        style(format!("({})", company.id)).dim()
    ));
    if let Some(kana) = company.name_kana.as_deref().filter(|k| !k.is_empty()) {
        out.push_str(&format!("{}\n", kana));
    }

    for section in company_detail(company) {
        out.push_str(&format!("\n{}\n", style(format!("■ {}", section.title)).cyan().bold()));
        for item in section.items {
            match item {
                DetailItem::Field { label, value } => {
                    out.push_str(&format!("  {}: {}\n", label, highlight(&value, keyword)));
                }
                DetailItem::Table { headers, rows } => {
                    out.push_str(&format!("  [{}]\n", headers.join(" / ")));
                    if rows.is_empty() {
                        out.push_str("    データなし\n");
                    }
                    for row in rows {
                        out.push_str(&format!("    {}\n", highlight(&row.join(" / "), keyword)));
                    }
                }
            }
        }
    }
    out
}

/// セルの表示（未取得は「-」、取得中は「…」、失敗は0）
pub fn cell_text(state: CellState) -> String {
    match state {
        CellState::Unloaded => "-".to_string(),
        CellState::Loading => "…".to_string(),
        CellState::Loaded(n) => format_int(Some(n as i64)),
        CellState::Failed => "0".to_string(),
    }
}

/// 集計表（列見出しには選択用の番号を付ける）
pub fn render_matrix(matrix: &Matrix, include_medium: bool) -> String {
    let columns: Vec<(usize, String, String, String)> = matrix
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| include_medium || c.is_large_only())
        .map(|(i, c)| {
            let label = if c.is_large_only() {
                format!("{}:{}（計）", i + 1, c.large)
            } else {
                format!("{}:{}", i + 1, c.medium)
            };
            (i, label, c.large.clone(), c.medium.clone())
        })
        .collect();

    let pref_width = matrix
        .prefectures()
        .iter()
        .map(|p| console::measure_text_width(p) + 4)
        .max()
        .unwrap_or(8)
        .max(8);

    let mut out = String::new();
    out.push_str(&pad_str("都道府県", pref_width, Alignment::Left, None));
    for (_, label, _, _) in &columns {
        out.push_str(" | ");
        out.push_str(label);
    }
    out.push('\n');

    for (row, pref) in matrix.prefectures().iter().enumerate() {
        let head = format!("{}:{}", row + 1, pref);
        out.push_str(&pad_str(&head, pref_width, Alignment::Left, None));
        for (_, label, large, medium) in &columns {
            let text = cell_text(matrix.state(&CellKey::new(pref, large, medium)));
            out.push_str(" | ");
            out.push_str(&pad_str(&text, console::measure_text_width(label), Alignment::Right, None));
        }
        out.push('\n');
    }
    out
}
