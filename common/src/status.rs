//! 営業ステータス

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 企業ごとの営業進捗
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStatus {
    #[default]
    #[serde(rename = "選択なし")]
    None,
    #[serde(rename = "AP取得")]
    Appointment,
    #[serde(rename = "受注")]
    Won,
    #[serde(rename = "失注")]
    Lost,
}

impl PipelineStatus {
    pub const ALL: [PipelineStatus; 4] = [
        PipelineStatus::None,
        PipelineStatus::Appointment,
        PipelineStatus::Won,
        PipelineStatus::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::None => "選択なし",
            PipelineStatus::Appointment => "AP取得",
            PipelineStatus::Won => "受注",
            PipelineStatus::Lost => "失注",
        }
    }

    /// 一覧に表示する対象か
    pub fn is_set(&self) -> bool {
        *self != PipelineStatus::None
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .or(match s.to_ascii_lowercase().as_str() {
                "none" | "" => Some(PipelineStatus::None),
                "ap" | "appointment" => Some(PipelineStatus::Appointment),
                "won" => Some(PipelineStatus::Won),
                "lost" => Some(PipelineStatus::Lost),
                _ => None,
            })
            .ok_or_else(|| Error::Parse(format!("不明なステータス: {}", s)))
    }
}
