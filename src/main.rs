use chrono::{Local, Utc};
use clap::Parser;
use company_search_common::filter::FilterSet;
use company_search_common::matrix::Matrix;
use company_search_common::paging::SearchMode;
use company_search_rust::api::{HttpIngestClient, HttpSearchClient};
use company_search_rust::cli::{Cli, Commands, HistoryCommand, StatusCommand};
use company_search_rust::config::Config;
use company_search_rust::display::{cell_text, company_line, render_detail, render_matrix};
use company_search_rust::error::{AppError, Result};
use company_search_rust::import::{self, ImportKind};
use company_search_rust::interactive::{parse_cell_selector, run_interactive_stats};
use company_search_rust::link::DeepLink;
use company_search_rust::matrix::MatrixAggregator;
use company_search_rust::search::{find_company_by_id, KeywordSearch, SearchAccumulator};
use company_search_rust::store::reference::{load_prefectures, load_taxonomy};
use company_search_rust::store::{DataStore, LocalStore, SavedQuery};
use company_search_rust::{annotation, export, history};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// 絞り込み検索の表示・出力オプション
struct FilterRun {
    more: usize,
    show: usize,
    export: Option<PathBuf>,
    save: bool,
}

impl Default for FilterRun {
    fn default() -> Self {
        Self {
            more: 0,
            show: 50,
            export: None,
            save: true,
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar().template("{bar:40.cyan/blue} {pos}/{len} {msg}") {
        pb.set_style(style);
    }
    pb
}

fn open_store(config: &Config) -> Result<LocalStore> {
    LocalStore::open(&config.resolved_store_path()?)
}

fn record_history(config: &Config, filters: &FilterSet, count: u64) {
    let recorded = open_store(config).and_then(|mut store| {
        history::record_search(&mut store, filters, count, &config.created_by(), Utc::now())
    });
    match recorded {
        Ok(query) => println!("- 検索履歴に保存（{}回目）", query.usage_count),
        Err(e) => eprintln!("⚠ 検索履歴を保存できませんでした: {}", e),
    }
}

async fn run_keyword(config: &Config, filters: FilterSet, pages: usize, save: bool) -> Result<()> {
    println!("🔍 company-search - キーワード検索\n");

    let api = HttpSearchClient::from_config(config)?;
    let mut search = KeywordSearch::new(config.keyword_page_size());
    search.set_filters(filters.clone());

    search.search(&api).await?;
    for _ in 1..pages.max(1) {
        if !search.has_more() {
            break;
        }
        search.next_page(&api).await?;
    }

    let keyword = filters.keyword();
    for company in search.rows() {
        println!("  {}", company_line(company, keyword));
    }
    println!("\n✔ {}件中 {}件を表示", search.total(), search.rows().len());
    if search.has_more() {
        println!("  続きは --pages で取得できます");
    }

    if save {
        record_history(config, &filters, search.total());
    }
    Ok(())
}

async fn run_filter(config: &Config, filters: FilterSet, options: FilterRun) -> Result<()> {
    if !filters.has_advanced_facets() {
        return Err(AppError::NoFilterSelected);
    }

    println!("🔎 company-search - 絞り込み検索\n");
    println!("条件: {}\n", filters.summary());

    let api = HttpSearchClient::from_config(config)?;
    let mut acc = SearchAccumulator::new(filters.clone(), config.page_size());

    let pb = spinner("検索中...");
    let mut failure = acc
        .run_with_progress(&api, SearchMode::New, |page: usize, rows: usize| {
            pb.set_message(format!("{}ページ目を取得 ({}件)", page, rows));
        })
        .await
        .err();

    for _ in 0..options.more {
        if failure.is_some() || !acc.has_more() {
            break;
        }
        pb.set_message("さらに読み込み中...");
        failure = acc.run(&api, SearchMode::LoadMore).await.err();
    }
    pb.finish_and_clear();

    for company in acc.rows().iter().take(options.show) {
        println!("  {}", company_line(company, None));
    }
    if acc.rows().len() > options.show {
        println!("  …ほか{}件", acc.rows().len() - options.show);
    }
    println!("\n✔ 該当 {}件", acc.total());
    if acc.has_more() {
        println!("  さらに読み込めます（--more で回数を指定）");
    }

    if let Some(e) = failure {
        // 取得済みの結果は表示したうえで失敗を返す
        return Err(e);
    }

    if let Some(output) = &options.export {
        match export::export_results(acc.rows(), &filters.summary(), output) {
            Ok(path) => println!("✔ Excel出力: {}", path.display()),
            Err(AppError::NothingToExport) => println!("- {}", AppError::NothingToExport),
            Err(e) => return Err(e),
        }
    }

    if options.save {
        record_history(config, &filters, acc.total());
    }
    Ok(())
}

async fn run_link(config: &Config, link: DeepLink) -> Result<()> {
    match link {
        DeepLink::Keyword { q, pref } => {
            let filters = FilterSet {
                keyword: q,
                prefectures: pref.into_iter().collect(),
                ..Default::default()
            };
            run_keyword(config, filters, 1, true).await
        }
        DeepLink::Advanced(filters) => run_filter(config, filters, FilterRun::default()).await,
    }
}

async fn run_stats(
    config: &Config,
    medium: bool,
    interactive: bool,
    cell: Option<Vec<String>>,
    output: Option<PathBuf>,
) -> Result<()> {
    println!("📊 company-search - 都道府県×業種集計\n");

    println!("[1/3] マスタを読み込み中...");
    let store = open_store(config)?;
    let prefectures = load_prefectures(&store)?;
    let taxonomy = load_taxonomy(&store)?;
    if taxonomy.is_empty() {
        println!("業種マスタが空です。`company-search import industry FILE` で取り込んでください");
        return Ok(());
    }
    let mut matrix = Matrix::new(prefectures, &taxonomy);
    println!(
        "✔ {}都道府県 × {}業種\n",
        matrix.prefectures().len(),
        matrix.columns().len()
    );

    let api = Arc::new(HttpSearchClient::from_config(config)?);
    let aggregator = MatrixAggregator::new(api);

    if let Some([pref, column]) = cell.as_deref() {
        let key = parse_cell_selector(&matrix, pref, column)?;
        let state = aggregator.fetch_cell(&mut matrix, &key).await;
        println!("{}: {}件", key.cache_key(), cell_text(state));
        let companies = aggregator.list_companies(&key).await?;
        for company in &companies {
            println!("  {}", company_line(company, None));
        }
        return Ok(());
    }

    println!("[2/3] 大分類を集計中...");
    let pb = progress_bar(matrix.prefectures().len() as u64);
    let failed = aggregator
        .load_large_counts(&mut matrix, |done, _total| pb.set_position(done as u64))
        .await;
    pb.finish_and_clear();
    if failed > 0 {
        println!("⚠ {}セルの取得に失敗しました（0件として表示）", failed);
    }
    println!("✔ 大分類集計完了\n");

    if interactive {
        let export_dir = output.clone().unwrap_or_else(|| PathBuf::from("."));
        matrix = run_interactive_stats(&aggregator, matrix, medium, export_dir).await?;
    } else {
        if medium {
            println!("[3/3] 中分類を集計中...");
            let mut sweep = aggregator.spawn_medium_sweep(&matrix);
            let pb = progress_bar(sweep.total as u64);
            while let Some(update) = sweep.updates.recv().await {
                matrix.apply(update);
                pb.inc(1);
            }
            pb.finish_and_clear();
            if let Err(e) = sweep.handle.await {
                tracing::warn!(error = %e, "medium sweep task ended abnormally");
            }
            println!("✔ 中分類集計完了\n");
        }
        println!("{}", render_matrix(&matrix, medium));
    }

    if let Some(output) = output {
        let path = export::export_matrix(&matrix, &output)?;
        println!("✔ Excel出力: {}", path.display());
    }
    Ok(())
}

async fn run(cli: Cli, mut config: Config) -> Result<()> {
    match cli.command {
        Commands::Search { keyword, pref, pages, no_save } => {
            let filters = FilterSet {
                keyword: Some(keyword),
                prefectures: pref.into_iter().collect(),
                ..Default::default()
            };
            run_keyword(&config, filters, pages, !no_save).await?;
        }

        Commands::Filter { facets, more, show, export, no_save } => {
            let filters = facets.to_filter_set()?;
            let options = FilterRun {
                more,
                show,
                export,
                save: !no_save,
            };
            run_filter(&config, filters, options).await?;
        }

        Commands::Stats { medium, interactive, cell, export } => {
            run_stats(&config, medium, interactive, cell, export).await?;
        }

        Commands::Show { id, keyword } => {
            let api = HttpSearchClient::from_config(&config)?;
            let company = find_company_by_id(&api, &id).await?;
            println!("{}", render_detail(&company, keyword.as_deref()));

            let store = open_store(&config)?;
            println!("営業ステータス: {}", annotation::current_status(&store, &company.id)?);
        }

        Commands::Status { action } => {
            let mut store = open_store(&config)?;
            match action {
                StatusCommand::Set { id, status } => {
                    let api = HttpSearchClient::from_config(&config)?;
                    let company = find_company_by_id(&api, &id).await?;
                    annotation::set_status(&mut store, &company, status)?;
                    println!("✔ {} のステータスを「{}」に設定しました", company.name, status);
                }
                StatusCommand::Update { id, status } => {
                    let info = annotation::update_status(&mut store, &id, status)?;
                    let name = info.company_name.as_deref().unwrap_or(&info.id);
                    println!("✔ {} のステータスを「{}」に変更しました", name, status);
                }
                StatusCommand::List => {
                    let annotated = annotation::list_annotated(&store)?;
                    if annotated.is_empty() {
                        println!("ステータスが設定された企業はありません");
                    }
                    for info in &annotated {
                        println!(
                            "  [{}] {} {} {} ({})",
                            info.status,
                            info.id,
                            info.company_name.as_deref().unwrap_or("-"),
                            info.prefecture_name.as_deref().unwrap_or("-"),
                            info.industry_major.as_deref().unwrap_or("-"),
                        );
                    }
                }
            }
        }

        Commands::History { action } => {
            let mut store = open_store(&config)?;
            match action {
                HistoryCommand::List { order } => {
                    let queries = history::list_saved(&store, order)?;
                    if queries.is_empty() {
                        println!("検索履歴はありません");
                    }
                    for query in &queries {
                        println!(
                            "  {}  {}  ({}回, {}件, {})",
                            query.id,
                            query.title,
                            query.usage_count,
                            query.last_result_count,
                            query.last_run_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                        );
                    }
                }
                HistoryCommand::Delete { id } => {
                    history::delete_saved(&mut store, &id)?;
                    println!("✔ 検索履歴を削除しました: {}", id);
                }
                HistoryCommand::Replay { id } => {
                    let query = store.get::<SavedQuery>(&id)?.ok_or_else(|| {
                        AppError::NotFound(format!("検索履歴 {} が見つかりません", id))
                    })?;
                    let link = history::replay(&query);
                    println!("- {}\n", link.to_path_and_query()?);
                    run_link(&config, link).await?;
                }
            }
        }

        Commands::Open { link } => {
            let link = DeepLink::parse(&link)?;
            run_link(&config, link).await?;
        }

        Commands::Import { kind, file } => {
            println!("📥 company-search - インポート\n");

            println!("[1/2] Excelを読み込み中...");
            let rows = import::read_rows(&file)?;
            println!("✔ {}行を読み込み\n", rows.len());

            println!("[2/2] 取り込み中...");
            let report = match kind {
                ImportKind::Company => {
                    let ingest = HttpIngestClient::from_config(&config)?;
                    import::import_companies(&ingest, &rows).await
                }
                ImportKind::User => {
                    import::import_records(&mut open_store(&config)?, &rows, import::user_from_row)
                }
                ImportKind::Industry => {
                    import::import_records(&mut open_store(&config)?, &rows, import::industry_from_row)
                }
                ImportKind::Address => {
                    import::import_records(&mut open_store(&config)?, &rows, import::address_from_row)
                }
            };
            if report.skipped > 0 {
                println!("- IDのない{}行をスキップ", report.skipped);
            }
            println!("{}", report.message());
            if report.is_success() {
                println!("\n✅ インポート完了");
            }
        }

        Commands::Config {
            set_api_url,
            set_api_key,
            set_ingest_url,
            set_user,
            set_store_path,
            show,
        } => {
            let mut changed = false;
            if let Some(url) = set_api_url {
                config.api_url = Some(url);
                println!("✔ 検索APIのURLを設定しました");
                changed = true;
            }
            if let Some(key) = set_api_key {
                config.api_key = Some(key);
                println!("✔ APIキーを設定しました");
                changed = true;
            }
            if let Some(url) = set_ingest_url {
                config.ingest_url = Some(url);
                println!("✔ 取り込み先のURLを設定しました");
                changed = true;
            }
            if let Some(user) = set_user {
                config.user = Some(user);
                println!("✔ ユーザー名を設定しました");
                changed = true;
            }
            if let Some(path) = set_store_path {
                config.store_path = Some(path);
                println!("✔ データストアを設定しました");
                changed = true;
            }
            if changed {
                config.save()?;
            }

            if show || !changed {
                println!("設定:");
                let api_url = config.get_api_url().unwrap_or_else(|_| "未設定".into());
                println!("  検索API: {}", api_url);
                println!("  APIキー: {}", if config.api_key().is_some() { "設定済み" } else { "未設定" });
                println!("  取り込み先: {}", config.ingest_url.as_deref().unwrap_or("未設定"));
                println!("  データストア: {}", config.resolved_store_path()?.display());
                println!("  ページ件数: {} (キーワード: {})", config.page_size(), config.keyword_page_size());
                println!("  ユーザー: {}", config.created_by());
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match Config::load() {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }
}
