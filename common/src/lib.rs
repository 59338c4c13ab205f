//! Company Search Common Library
//!
//! CLIとライブラリ利用者で共有される型と純粋ロジック

pub mod error;
pub mod export;
pub mod facets;
pub mod filter;
pub mod labels;
pub mod matrix;
pub mod paging;
pub mod status;
pub mod types;

pub use error::{Error, Result};
pub use facets::{Facet, Range, RangeBin, PREFECTURES, REGION_GROUPS};
pub use filter::FilterSet;
pub use matrix::{
    CellKey, CellOutcome, CellState, CellUpdate, IndustryColumn, IndustryTaxonomy, Matrix,
    UpdateOrigin,
};
pub use paging::{FetchPolicy, SearchMode};
pub use status::PipelineStatus;
pub use types::{Company, SearchRequest, SearchResponse};
