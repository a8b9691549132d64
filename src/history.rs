use serde::{Deserialize, Serialize};

use crate::commute::CommuteRecord;

/// 予測の材料とする過去の所要時間。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSample {
    /// `YYYY-MM-DD`形式の日付
    pub date: String,
    #[serde(rename = "commuteType")]
    pub mode: String,
    /// 所要時間(分)
    pub duration: u32,
}

/// 指定された通勤手段の過去の所要時間を取り出す。
///
/// 行きと帰りはそれぞれ独立に判定するため、1件の記録から0〜2件のサンプルが得られる。
/// 順序は記録の走査順で、日付順であることは保証しない。
///
/// # Arguments
///
/// * `records` - 通勤記録
/// * `mode_id` - 対象とする通勤手段のID
/// * `mode_name` - サンプルに埋め込む通勤手段の表示名
pub fn extract_samples(
    records: &[CommuteRecord],
    mode_id: &str,
    mode_name: &str,
) -> Vec<HistoricalSample> {
    records
        .iter()
        .flat_map(|record| {
            let date = record.date.format("%Y-%m-%d").to_string();
            let legs = [
                (&record.outbound_mode_id, record.outbound_duration),
                (&record.return_mode_id, record.return_duration),
            ];
            legs.into_iter()
                .filter(|(id, _)| id.as_str() == mode_id)
                .map(|(_, duration)| HistoricalSample {
                    date: date.clone(),
                    mode: mode_name.to_string(),
                    duration,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
