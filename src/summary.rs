use chrono::{Duration, NaiveDate};

use crate::commute::{find_mode, CommuteMode, CommuteRecord};
use crate::datetime;

/// 集計の対象とする日数。
pub const SUMMARY_DAYS: i64 = 30;

/// 通勤手段ごとの利用回数。
#[derive(Clone, Debug, PartialEq)]
pub struct ModeCount {
    pub name: String,
    pub count: u32,
}

/// 通勤記録の集計結果。
#[derive(Clone, Debug, PartialEq)]
pub struct CommuteSummary {
    /// 往復の合計時間(分)
    pub total_minutes: u64,
    /// 片道あたりの平均時間(分)
    pub average_minutes: f64,
    pub most_frequent_mode: Option<CommuteMode>,
    pub mode_counts: Vec<ModeCount>,
}

/// 直近30日の通勤記録を集計する。
pub fn summarize_recent(records: &[CommuteRecord], modes: &[CommuteMode]) -> CommuteSummary {
    let since = datetime::today() - Duration::days(SUMMARY_DAYS);
    summarize(records, modes, since)
}

/// `since`より後の日付の通勤記録を集計する。
///
/// 行きと帰りはそれぞれ1回として数える。
/// 最も多い通勤手段が同数の場合は先に現れた方を採用する。
/// 削除済みの通勤手段は利用回数に含めない。
pub fn summarize(
    records: &[CommuteRecord],
    modes: &[CommuteMode],
    since: NaiveDate,
) -> CommuteSummary {
    let recent: Vec<&CommuteRecord> = records.iter().filter(|r| r.date > since).collect();

    let total_minutes: u64 = recent
        .iter()
        .map(|r| u64::from(r.outbound_duration) + u64::from(r.return_duration))
        .sum();
    let average_minutes = if recent.is_empty() {
        0.0
    } else {
        total_minutes as f64 / (recent.len() * 2) as f64
    };

    let leg_counts = recent.iter().fold(Vec::<(&str, u32)>::new(), |mut acc, r| {
        for id in [r.outbound_mode_id.as_str(), r.return_mode_id.as_str()] {
            match acc.iter_mut().find(|(key, _)| *key == id) {
                Some((_, count)) => *count += 1,
                None => acc.push((id, 1)),
            }
        }
        acc
    });

    let most_frequent_id = leg_counts
        .iter()
        .fold(None::<(&str, u32)>, |best, &(id, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((id, count)),
        })
        .map(|(id, _)| id);
    let most_frequent_mode = most_frequent_id.and_then(|id| find_mode(modes, id).cloned());

    let mode_counts = modes
        .iter()
        .filter_map(|mode| {
            let count = leg_counts
                .iter()
                .find(|(id, _)| *id == mode.id)
                .map(|(_, count)| *count)?;
            Some(ModeCount {
                name: mode.name.clone(),
                count,
            })
        })
        .collect();

    CommuteSummary {
        total_minutes,
        average_minutes,
        most_frequent_mode,
        mode_counts,
    }
}
