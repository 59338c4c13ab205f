//! Excel生成（共通ライブラリ）
//!
//! columns.rs の列定義で検索結果シートを、
//! matrix.rs の状態で都道府県×業種の件数シートを生成する。

use super::columns::{column_widths, export_row, CellValue, EXPORT_HEADERS};
use crate::matrix::{CellKey, Matrix};
use crate::types::Company;
use rust_xlsxwriter::*;

/// 検索結果シート名
pub const RESULTS_SHEET: &str = "検索結果";
/// 件数マトリックスシート名
pub const MATRIX_SHEET: &str = "都道府県×業種";

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xAAAAAA))
}

/// 検索結果をバッファに生成
pub fn generate_results_buffer(companies: &[Company]) -> Result<Vec<u8>, String> {
    let rows: Vec<Vec<CellValue>> = companies.iter().map(export_row).collect();
    let widths = column_widths(&rows);

    let mut workbook = Workbook::new();
    let header_format = header_format();

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(RESULTS_SHEET)
        .map_err(|e| format!("シート名設定エラー: {}", e))?;

    for (col, (header, width)) in EXPORT_HEADERS.iter().zip(&widths).enumerate() {
        let col = col as u16;
        worksheet
            .set_column_width(col, *width as f64)
            .map_err(|e| format!("列幅設定エラー: {}", e))?;
        worksheet
            .write_string_with_format(0, col, *header, &header_format)
            .map_err(|e| format!("見出し書き込みエラー: {}", e))?;
    }

    for (r, row) in rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (c, value) in row.iter().enumerate() {
            let c = c as u16;
            match value {
                CellValue::Text(s) => {
                    worksheet
                        .write_string(r, c, s)
                        .map_err(|e| format!("値書き込みエラー: {}", e))?;
                }
                CellValue::Number(n) => {
                    worksheet
                        .write_number(r, c, *n)
                        .map_err(|e| format!("値書き込みエラー: {}", e))?;
                }
                CellValue::Empty => {}
            }
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}

/// 件数マトリックスをバッファに生成
///
/// 未取得のセルは空欄、取得失敗のセルは0で出力する。
pub fn generate_matrix_buffer(matrix: &Matrix) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();
    let header_format = header_format();
    let large_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(MATRIX_SHEET)
        .map_err(|e| format!("シート名設定エラー: {}", e))?;

    worksheet
        .write_string_with_format(0, 0, "都道府県", &header_format)
        .map_err(|e| format!("見出し書き込みエラー: {}", e))?;
    worksheet
        .set_column_width(0, 12)
        .map_err(|e| format!("列幅設定エラー: {}", e))?;

    for (i, column) in matrix.columns().iter().enumerate() {
        let col = i as u16 + 1;
        let label = if column.is_large_only() {
            format!("{}（計）", column.large)
        } else {
            column.medium.clone()
        };
        let width = (label.chars().count() * 2 + 2).min(40) as f64;
        worksheet
            .set_column_width(col, width)
            .map_err(|e| format!("列幅設定エラー: {}", e))?;
        worksheet
            .write_string_with_format(0, col, &label, &header_format)
            .map_err(|e| format!("見出し書き込みエラー: {}", e))?;
    }

    for (r, pref) in matrix.prefectures().iter().enumerate() {
        let row = r as u32 + 1;
        worksheet
            .write_string(row, 0, pref)
            .map_err(|e| format!("値書き込みエラー: {}", e))?;

        for (i, column) in matrix.columns().iter().enumerate() {
            let key = CellKey::new(pref, &column.large, &column.medium);
            let Some(count) = matrix.count(&key) else {
                continue;
            };
            let col = i as u16 + 1;
            if column.is_large_only() {
                worksheet
                    .write_number_with_format(row, col, count as f64, &large_format)
                    .map_err(|e| format!("値書き込みエラー: {}", e))?;
            } else {
                worksheet
                    .write_number(row, col, count as f64)
                    .map_err(|e| format!("値書き込みエラー: {}", e))?;
            }
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}
