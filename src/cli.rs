use crate::error::{AppError, Result};
use crate::history::HistoryOrder;
use crate::import::ImportKind;
use clap::{Args, Parser, Subcommand};
use company_search_common::facets::{region_prefectures, Facet, PREFECTURES};
use company_search_common::filter::FilterSet;
use company_search_common::status::PipelineStatus;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "company-search")]
#[command(about = "企業データベース検索・営業管理ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// キーワードで企業を検索
    Search {
        /// 検索キーワード（空白区切りで複数指定）
        #[arg(required = true)]
        keyword: String,

        /// 都道府県で絞り込み
        #[arg(short, long)]
        pref: Option<String>,

        /// 取得するページ数
        #[arg(long, default_value = "1")]
        pages: usize,

        /// 検索履歴に保存しない
        #[arg(long)]
        no_save: bool,
    },

    /// 都道府県・規模の条件で絞り込み検索
    Filter {
        #[command(flatten)]
        facets: FacetArgs,

        /// 「さらに読み込む」を繰り返す回数
        #[arg(long, default_value = "0")]
        more: usize,

        /// 表示する最大件数
        #[arg(long, default_value = "50")]
        show: usize,

        /// Excelに出力（出力先を省略するとカレントディレクトリ）
        #[arg(short, long, num_args = 0..=1, default_missing_value = ".")]
        export: Option<PathBuf>,

        /// 検索履歴に保存しない
        #[arg(long)]
        no_save: bool,
    },

    /// 都道府県×業種の件数集計
    Stats {
        /// 中分類も集計（バックグラウンド）
        #[arg(short, long)]
        medium: bool,

        /// セルを指定して対話的に操作
        #[arg(short, long)]
        interactive: bool,

        /// 1セルだけ取得して企業一覧を表示（例: --cell 東京都 製造業/印刷業）
        #[arg(long, num_args = 2, value_names = ["PREF", "INDUSTRY"])]
        cell: Option<Vec<String>>,

        /// 集計表をExcelに出力
        #[arg(short, long, num_args = 0..=1, default_missing_value = ".")]
        export: Option<PathBuf>,
    },

    /// 企業の詳細を表示
    Show {
        /// 企業ID
        #[arg(required = true)]
        id: String,

        /// ハイライトするキーワード
        #[arg(short, long)]
        keyword: Option<String>,
    },

    /// 営業ステータスの管理
    Status {
        #[command(subcommand)]
        action: StatusCommand,
    },

    /// 検索履歴の管理
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },

    /// 検索リンクを開いて実行（/company-search?q=… または /advanced-search?filters=…）
    Open {
        #[arg(required = true)]
        link: String,
    },

    /// Excelファイルからデータを取り込み
    Import {
        /// 取り込む種類
        #[arg(value_enum)]
        kind: ImportKind,

        /// Excelファイル（先頭シートの1行目が見出し）
        #[arg(required = true)]
        file: PathBuf,
    },

    /// 設定
    Config {
        /// 検索APIのURLを設定
        #[arg(long)]
        set_api_url: Option<String>,

        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 会社データ取り込み先のURLを設定
        #[arg(long)]
        set_ingest_url: Option<String>,

        /// 保存検索の作成者名を設定
        #[arg(long)]
        set_user: Option<String>,

        /// データストアのファイルを設定
        #[arg(long)]
        set_store_path: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// 絞り込み条件
#[derive(Args, Debug, Clone, Default)]
pub struct FacetArgs {
    /// 都道府県（複数指定可）
    #[arg(short, long)]
    pub pref: Vec<String>,

    /// 地域（北海道・東北、関東 など。複数指定可）
    #[arg(long)]
    pub region: Vec<String>,

    /// 資本金の区分（番号またはラベル）
    #[arg(long)]
    pub capital: Option<String>,

    /// 従業員数の区分
    #[arg(long)]
    pub employees: Option<String>,

    /// 事業所数の区分
    #[arg(long)]
    pub offices: Option<String>,

    /// 工場数の区分
    #[arg(long)]
    pub factories: Option<String>,

    /// 設立年の区分
    #[arg(long)]
    pub founded_year: Option<String>,
}

impl FacetArgs {
    /// 検索条件に変換
    pub fn to_filter_set(&self) -> Result<FilterSet> {
        let mut filters = FilterSet::default();

        for region in &self.region {
            if region_prefectures(region).is_none() {
                return Err(AppError::InvalidSelector(format!("地域: {}", region)));
            }
            filters.toggle_region(region);
        }
        for pref in &self.pref {
            if !PREFECTURES.contains(&pref.as_str()) {
                return Err(AppError::InvalidSelector(format!("都道府県: {}", pref)));
            }
            if !filters.prefectures.contains(pref) {
                filters.prefectures.push(pref.clone());
            }
        }

        let selections = [
            (Facet::Capital, &self.capital),
            (Facet::Employees, &self.employees),
            (Facet::Offices, &self.offices),
            (Facet::Factories, &self.factories),
            (Facet::FoundedYear, &self.founded_year),
        ];
        for (facet, selector) in selections {
            if let Some(selector) = selector {
                let bin = facet.select(selector)?;
                filters.set_range(facet, Some(bin.range()));
            }
        }

        Ok(filters)
    }
}

#[derive(Subcommand, Debug)]
pub enum StatusCommand {
    /// 企業のステータスを設定（AP取得/受注/失注/選択なし）
    Set {
        id: String,
        status: PipelineStatus,
    },
    /// 登録済みステータスを変更
    Update {
        id: String,
        status: PipelineStatus,
    },
    /// ステータスが設定された企業の一覧
    List,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// 保存された検索条件の一覧
    List {
        #[arg(long, value_enum, default_value = "recent")]
        order: HistoryOrder,
    },
    /// 削除
    Delete { id: String },
    /// 保存された条件で再検索
    Replay { id: String },
}
