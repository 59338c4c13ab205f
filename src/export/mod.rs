//! 検索結果・集計表のExcel出力

use crate::error::{AppError, Result};
use chrono::{DateTime, Local};
use company_search_common::export::excel_core;
use company_search_common::matrix::Matrix;
use company_search_common::types::Company;
use std::path::{Path, PathBuf};

pub const RESULTS_PREFIX: &str = "絞り込み検索";
pub const MATRIX_PREFIX: &str = "都道府県×業種集計";

/// ファイル名に含める条件要約の最大文字数
const SUMMARY_CHARS: usize = 30;

/// `{prefix}_{YYYYMMDD}_{HHMM}_{要約}.xlsx`
pub fn export_file_name(prefix: &str, summary: Option<&str>, now: DateTime<Local>) -> String {
    let stamp = now.format("%Y%m%d_%H%M");
    match summary {
        Some(summary) => {
            let summary: String = summary
                .chars()
                .take(SUMMARY_CHARS)
                .map(|c| match c {
                    ':' | ' ' | ',' | '/' | '\\' => '_',
                    c => c,
                })
                .collect();
            format!("{}_{}_{}.xlsx", prefix, stamp, summary)
        }
        None => format!("{}_{}.xlsx", prefix, stamp),
    }
}

/// 出力先がディレクトリ（または拡張子なし）ならファイル名を付ける
fn output_path_for(output: &Path, file_name: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(file_name)
    } else {
        output.to_path_buf()
    }
}

fn write_buffer(path: &Path, buffer: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, buffer)?;
    Ok(())
}

/// 検索結果を書き出す（0件なら何も書かずにエラー）
pub fn export_results(companies: &[Company], summary: &str, output: &Path) -> Result<PathBuf> {
    if companies.is_empty() {
        return Err(AppError::NothingToExport);
    }

    let file_name = export_file_name(RESULTS_PREFIX, Some(summary), Local::now());
    let path = output_path_for(output, &file_name);
    let buffer = excel_core::generate_results_buffer(companies).map_err(AppError::ExcelGeneration)?;
    write_buffer(&path, &buffer)?;

    tracing::info!(rows = companies.len(), path = %path.display(), "results exported");
    Ok(path)
}

/// 集計表を書き出す
pub fn export_matrix(matrix: &Matrix, output: &Path) -> Result<PathBuf> {
    if matrix.prefectures().is_empty() || matrix.columns().is_empty() {
        return Err(AppError::NothingToExport);
    }

    let file_name = export_file_name(MATRIX_PREFIX, None, Local::now());
    let path = output_path_for(output, &file_name);
    let buffer = excel_core::generate_matrix_buffer(matrix).map_err(AppError::ExcelGeneration)?;
    write_buffer(&path, &buffer)?;

    tracing::info!(path = %path.display(), "matrix exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 7, 9, 5, 0).unwrap()
    }

    #[test]
    fn test_file_name_replaces_separators() {
        let name = export_file_name(RESULTS_PREFIX, Some("都道府県: 東京都, 大阪府"), fixed_now());
        assert_eq!(name, "絞り込み検索_20250307_0905_都道府県__東京都__大阪府.xlsx");
    }

    #[test]
    fn test_file_name_truncates_summary() {
        let summary = "あ".repeat(40);
        let name = export_file_name(RESULTS_PREFIX, Some(&summary), fixed_now());
        assert!(name.ends_with(&format!("{}.xlsx", "あ".repeat(30))));
    }

    #[test]
    fn test_empty_results_writes_nothing() {
        let dir = tempdir().unwrap();
        let err = export_results(&[], "条件なし", dir.path()).unwrap_err();
        assert!(matches!(err, AppError::NothingToExport));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_results_written_into_directory() {
        let dir = tempdir().unwrap();
        let companies = vec![Company {
            id: "C1".into(),
            name: "株式会社テスト".into(),
            ..Default::default()
        }];
        let path = export_results(&companies, "都道府県: 東京都", dir.path()).unwrap();
        assert!(path.starts_with(dir.path()));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_explicit_file_path_is_kept() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.xlsx");
        assert_eq!(output_path_for(&target, "ignored.xlsx"), target);
    }
}
