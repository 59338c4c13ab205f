//! 集計表の対話操作
//!
//! 中分類のバックグラウンド集計を流したまま、セルを指定して
//! 件数の即時取得や該当企業の一覧表示を行う。

use crate::api::SearchApi;
use crate::display::{cell_text, company_line, render_matrix};
use crate::error::{AppError, Result};
use crate::export::export_matrix;
use crate::matrix::MatrixAggregator;
use company_search_common::matrix::{CellKey, Matrix};
use dialoguer::Input;
use std::path::PathBuf;

/// 対話アクション
#[derive(Debug, Clone, PartialEq)]
pub enum StatsAction {
    /// セルの件数を取得
    Fetch(CellKey),
    /// セルの企業一覧
    List(CellKey),
    /// 表を再表示
    Table,
    /// Excelに出力
    Export(Option<PathBuf>),
    /// 進捗だけ表示
    Refresh,
    Quit,
}

/// 都道府県は番号（1始まり）か名前
fn select_prefecture(matrix: &Matrix, token: &str) -> Result<String> {
    let prefs = matrix.prefectures();
    if let Ok(n) = token.parse::<usize>() {
        if (1..=prefs.len()).contains(&n) {
            return Ok(prefs[n - 1].clone());
        }
    }
    prefs
        .iter()
        .find(|p| p.as_str() == token)
        .cloned()
        .ok_or_else(|| AppError::InvalidSelector(format!("都道府県: {}", token)))
}

/// 業種は番号・「大分類/中分類」・大分類名・中分類名のいずれか
fn select_column(matrix: &Matrix, token: &str) -> Result<(String, String)> {
    let columns = matrix.columns();
    let found = if let Ok(n) = token.parse::<usize>() {
        n.checked_sub(1).and_then(|i| columns.get(i))
    } else if let Some((large, medium)) = token.split_once('/') {
        columns.iter().find(|c| c.large == large && c.medium == medium)
    } else {
        columns
            .iter()
            .find(|c| c.is_large_only() && c.large == token)
            .or_else(|| columns.iter().find(|c| c.medium == token))
    };
    found
        .map(|c| (c.large.clone(), c.medium.clone()))
        .ok_or_else(|| AppError::InvalidSelector(format!("業種: {}", token)))
}

/// `都道府県 業種` をセルに解決
pub fn parse_cell_selector(matrix: &Matrix, pref: &str, column: &str) -> Result<CellKey> {
    let prefecture = select_prefecture(matrix, pref)?;
    let (large, medium) = select_column(matrix, column)?;
    Ok(CellKey::new(&prefecture, &large, &medium))
}

/// 1行の入力をアクションに
pub fn parse_action(matrix: &Matrix, line: &str) -> Result<StatsAction> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [] => Ok(StatsAction::Refresh),
        ["q"] | ["quit"] => Ok(StatsAction::Quit),
        ["t"] | ["table"] => Ok(StatsAction::Table),
        ["e"] | ["export"] => Ok(StatsAction::Export(None)),
        ["e", path] | ["export", path] => Ok(StatsAction::Export(Some(PathBuf::from(path)))),
        ["l", pref, col] | ["list", pref, col] => {
            Ok(StatsAction::List(parse_cell_selector(matrix, pref, col)?))
        }
        [pref, col] => Ok(StatsAction::Fetch(parse_cell_selector(matrix, pref, col)?)),
        _ => Err(AppError::InvalidSelector(line.trim().to_string())),
    }
}

fn prompt_line(prompt: String) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(|e| AppError::Config(format!("入力エラー: {}", e)))
}

/// 対話ループ（終了時の表を返す）
pub async fn run_interactive_stats<S: SearchApi + 'static>(
    aggregator: &MatrixAggregator<S>,
    mut matrix: Matrix,
    include_medium: bool,
    export_dir: PathBuf,
) -> Result<Matrix> {
    println!("操作: [都道府県 業種]件数取得 [l 都道府県 業種]企業一覧 [t]表 [e パス]Excel出力 [q]終了");
    println!("  都道府県・業種は番号でも指定できます（例: 13 1, 東京都 製造業/印刷業）\n");
    println!("{}", render_matrix(&matrix, include_medium));

    let mut sweep = include_medium.then(|| aggregator.spawn_medium_sweep(&matrix));
    let sweep_total = sweep.as_ref().map_or(0, |s| s.total);
    let mut swept = 0usize;

    let make_prompt = |swept: usize| {
        if sweep_total > 0 && swept < sweep_total {
            format!("セル指定（中分類集計中 {}/{}）", swept, sweep_total)
        } else {
            "セル指定".to_string()
        }
    };
    let mut pending = tokio::task::spawn_blocking({
        let prompt = make_prompt(swept);
        move || prompt_line(prompt)
    });

    loop {
        tokio::select! {
            Some(update) = async {
                match sweep.as_mut() {
                    Some(s) => s.updates.recv().await,
                    None => None,
                }
            }, if swept < sweep_total => {
                matrix.apply(update);
                swept += 1;
            }
            line = &mut pending => {
                let line = line.map_err(|e| AppError::Config(format!("入力エラー: {}", e)))??;
                match parse_action(&matrix, &line) {
                    Ok(StatsAction::Quit) => break,
                    Ok(StatsAction::Refresh) => {}
                    Ok(StatsAction::Table) => println!("{}", render_matrix(&matrix, include_medium)),
                    Ok(StatsAction::Fetch(key)) => {
                        let state = aggregator.fetch_cell(&mut matrix, &key).await;
                        println!("  → {}: {}件", key.cache_key(), cell_text(state));
                    }
                    Ok(StatsAction::List(key)) => match aggregator.list_companies(&key).await {
                        Ok(companies) => {
                            println!("  → {}: {}社（最大100件）", key.cache_key(), companies.len());
                            for company in &companies {
                                println!("    {}", company_line(company, None));
                            }
                        }
                        Err(e) => eprintln!("  ✗ {}", e),
                    },
                    Ok(StatsAction::Export(path)) => {
                        let target = path.unwrap_or_else(|| export_dir.clone());
                        match export_matrix(&matrix, &target) {
                            Ok(path) => println!("✔ Excel出力: {}", path.display()),
                            Err(e) => eprintln!("  ✗ {}", e),
                        }
                    }
                    Err(e) => eprintln!("  ✗ {}", e),
                }
                pending = tokio::task::spawn_blocking({
                    let prompt = make_prompt(swept);
                    move || prompt_line(prompt)
                });
            }
        }
    }

    // 受信側を閉じると残りの集計は止まる
    if let Some(sweep) = sweep {
        drop(sweep.updates);
        sweep.handle.abort();
    }
    Ok(matrix)
}
