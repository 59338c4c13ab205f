//! 出力の共通部分（列定義とワークブック生成）

pub mod columns;

#[cfg(feature = "excel")]
pub mod excel_core;
