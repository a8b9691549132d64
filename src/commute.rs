use anyhow::{ensure, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 1日分の往復の通勤記録。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommuteRecord {
    pub id: String,
    pub date: NaiveDate,
    pub outbound_mode_id: String,
    pub return_mode_id: String,
    /// 行きの所要時間(分)
    pub outbound_duration: u32,
    /// 帰りの所要時間(分)
    pub return_duration: u32,
    #[serde(default)]
    pub notes: String,
}

impl CommuteRecord {
    /// 新しいIDを採番して`CommuteRecord`を返す。
    ///
    /// 所要時間が1分未満の場合はエラーを返す。
    pub fn new(
        date: NaiveDate,
        outbound_mode_id: &str,
        outbound_duration: u32,
        return_mode_id: &str,
        return_duration: u32,
        notes: &str,
    ) -> Result<Self> {
        let record = Self {
            id: Uuid::new_v4().to_string(),
            date,
            outbound_mode_id: outbound_mode_id.to_string(),
            return_mode_id: return_mode_id.to_string(),
            outbound_duration,
            return_duration,
            notes: notes.to_string(),
        };
        record.validate()?;

        Ok(record)
    }

    /// 記録の不変条件を確認する。
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.outbound_duration >= 1,
            "Outbound duration must be at least 1 minute: {}",
            self.id
        );
        ensure!(
            self.return_duration >= 1,
            "Return duration must be at least 1 minute: {}",
            self.id
        );

        Ok(())
    }
}

/// 通勤手段。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommuteMode {
    pub id: String,
    pub name: String,
    pub icon: String,
}

impl CommuteMode {
    pub fn new(id: &str, name: &str, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// IDから通勤手段を探す。
///
/// 見つからない場合の表示名は呼び出し側で決める。
pub fn find_mode<'a>(modes: &'a [CommuteMode], id: &str) -> Option<&'a CommuteMode> {
    modes.iter().find(|mode| mode.id == id)
}

/// 通勤手段が一つも登録されていない場合に利用する初期値。
pub fn default_modes() -> Vec<CommuteMode> {
    vec![
        CommuteMode::new("1", "Car", "Car"),
        CommuteMode::new("2", "Bus", "Bus"),
        CommuteMode::new("3", "Train", "TrainFront"),
        CommuteMode::new("4", "Bike", "Bike"),
    ]
}
