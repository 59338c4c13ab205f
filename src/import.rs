//! スプレッドシートからの取り込み
//!
//! 先頭シートの1行目を見出しとして各行を読み込み、種類ごとに
//! データストア（または企業データの取り込み先）へ登録する。
//! 見出しは英語の大文字小文字違いと日本語の別名を受け付ける。

use crate::api::CompanyIngest;
use crate::error::{AppError, Result};
use crate::store::models::new_id;
use crate::store::{AddressMaster, DataStore, IndustryMaster, Record, User};
use calamine::{open_workbook_auto, Data, Reader};
use company_search_common::types::{Address, Company};
use std::collections::HashMap;
use std::path::Path;

/// エラー例として表示する件数
const ERROR_SAMPLE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ImportKind {
    /// ユーザー
    User,
    /// 会社データ（取り込みエンドポイントへ送信）
    Company,
    /// 業種マスター
    Industry,
    /// 住所マスター
    Address,
}

/// 見出し → セル文字列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow(HashMap<String, String>);

impl SheetRow {
    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// 別名のうち最初に値があるもの
    pub fn field(&self, aliases: &[&str]) -> String {
        aliases
            .iter()
            .filter_map(|name| self.0.get(*name))
            .find(|v| !v.is_empty())
            .cloned()
            .unwrap_or_default()
    }

    fn optional(&self, aliases: &[&str]) -> Option<String> {
        Some(self.field(aliases)).filter(|v| !v.is_empty())
    }
}

/// 取り込み結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub success: usize,
    pub failed: usize,
    /// 識別列が空で飛ばした行
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl ImportReport {
    fn fail(&mut self, label: &str, error: impl std::fmt::Display) {
        tracing::warn!(row = %label, error = %error, "import row failed");
        self.failed += 1;
        self.errors.push(format!("{}: {}", label, error));
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn message(&self) -> String {
        let mut message = format!("インポート完了: {}件成功", self.success);
        if self.failed > 0 {
            message.push_str(&format!(", {}件失敗", self.failed));
        }
        if !self.errors.is_empty() {
            let sample: Vec<&str> = self.errors.iter().take(ERROR_SAMPLE).map(String::as_str).collect();
            message.push_str(&format!("\nエラー: {}", sample.join(", ")));
            if self.errors.len() > ERROR_SAMPLE {
                message.push_str("...");
            }
        }
        message
    }
}

/// セルを文字列に（整数値の小数は `.0` を付けない）
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

/// 先頭シートを読み込む
pub fn read_rows(path: &Path) -> Result<Vec<SheetRow>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::Import(format!("ファイル読み込みエラー: {}", e)))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AppError::Import("シートがありません".into()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| AppError::Import(format!("シート {} を読めません: {}", sheet, e)))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(cell_text).collect(),
        None => return Ok(Vec::new()),
    };

    let sheet_rows = rows
        .map(|row| {
            SheetRow(
                headers
                    .iter()
                    .zip(row.iter())
                    .filter(|(h, _)| !h.is_empty())
                    .map(|(h, cell)| (h.clone(), cell_text(cell)))
                    .collect(),
            )
        })
        .filter(|row| row.0.values().any(|v| !v.is_empty()))
        .collect::<Vec<_>>();

    tracing::debug!(sheet = %sheet, rows = sheet_rows.len(), "sheet loaded");
    Ok(sheet_rows)
}

pub fn user_from_row(row: &SheetRow) -> Option<User> {
    let email = row.field(&["email", "Email", "EMAIL"]);
    if email.is_empty() {
        return None;
    }
    Some(User {
        first_name: row.optional(&["firstName", "FirstName", "名"]),
        last_name: row.optional(&["lastName", "LastName", "姓"]),
        department: row.optional(&["department", "Department", "部署"]),
        ..User::from_email(&email)
    })
}

pub fn industry_from_row(row: &SheetRow) -> Option<IndustryMaster> {
    let small_category_code = row.field(&["小分類コード", "smallCategoryCode"]);
    if small_category_code.is_empty() {
        return None;
    }
    Some(IndustryMaster {
        id: new_id(),
        small_category_code,
        small_category: row.field(&["小分類", "smallCategory"]),
        medium_category_code: row.field(&["中分類コード", "mediumCategoryCode"]),
        medium_category: row.field(&["中分類", "mediumCategory"]),
        large_category_code: row.field(&["大分類コード", "largeCategoryCode"]),
        large_category: row.field(&["大分類", "largeCategory"]),
    })
}

pub fn address_from_row(row: &SheetRow) -> Option<AddressMaster> {
    let administrative_area_code = row.field(&["行政区域コード", "administrativeAreaCode"]);
    if administrative_area_code.is_empty() {
        return None;
    }
    Some(AddressMaster {
        id: new_id(),
        administrative_area_code,
        prefecture_code: row.field(&["都道府県コード", "prefectureCode"]),
        prefecture_name: row.field(&["都道府県名（漢字）", "都道府県名", "prefectureName"]),
        municipality_name: row.field(&["市区町村名（漢字）", "市区町村名", "municipalityName"]),
        prefecture_name_kana: row.field(&["都道府県名（ｶﾅ）", "都道府県名（カナ）", "prefectureNameKana"]),
        municipality_name_kana: row.field(&["市区町村名（ｶﾅ）", "市区町村名（カナ）", "municipalityNameKana"]),
    })
}

fn split_list(value: String) -> Option<Vec<String>> {
    let items: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Some(items).filter(|v| !v.is_empty())
}

pub fn company_from_row(row: &SheetRow) -> Option<Company> {
    let id = row.field(&["id", "ID", "企業ID"]);
    if id.is_empty() {
        return None;
    }
    Some(Company {
        id,
        name: row.field(&["name", "Name", "会社名"]),
        pref: row.optional(&["pref", "Prefecture", "都道府県"]),
        address: row.optional(&["address", "Address", "住所"]).map(|text| Address {
            text: Some(text),
            ..Default::default()
        }),
        industry: split_list(row.field(&["industry"])),
        industry_names: split_list(row.field(&["industryNames"])),
        ..Default::default()
    })
}

/// ストアへまとめて作成（書き込みは1回）
pub fn import_records<D, R, F>(store: &mut D, rows: &[SheetRow], convert: F) -> ImportReport
where
    D: DataStore,
    R: Record,
    F: Fn(&SheetRow) -> Option<R>,
{
    let mut report = ImportReport::default();
    let records: Vec<R> = rows.iter().filter_map(|row| convert(row)).collect();
    report.skipped = rows.len() - records.len();

    for (record, result) in records.iter().zip(store.create_many(&records)) {
        match result {
            Ok(()) => report.success += 1,
            Err(e) => report.fail(record.id(), e),
        }
    }
    tracing::info!(table = R::TABLE, success = report.success, failed = report.failed, "import finished");
    report
}

/// 会社データを取り込み先へ送信
pub async fn import_companies<I: CompanyIngest>(ingest: &I, rows: &[SheetRow]) -> ImportReport {
    let mut report = ImportReport::default();
    for row in rows {
        let Some(company) = company_from_row(row) else {
            report.skipped += 1;
            continue;
        };
        match ingest.ingest(&company).await {
            Ok(()) => report.success += 1,
            Err(e) => {
                let label = if company.name.is_empty() { &company.id } else { &company.name };
                report.fail(label, e);
            }
        }
    }
    tracing::info!(success = report.success, failed = report.failed, "company import finished");
    report
}
