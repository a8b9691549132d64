use anyhow::{Context, Result};
use log::info;

use crate::store::RecordStore;
use crate::summary::{summarize_recent, CommuteSummary, SUMMARY_DAYS};

pub struct SummaryCommand<'a, S: RecordStore> {
    store: &'a S,
}

impl<'a, S: RecordStore> SummaryCommand<'a, S> {
    /// 新しい`SummaryCommand`を返す。
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// `summary`サブコマンドの処理を行う。
    ///
    /// Localタイムゾーンの今日から30日前までの通勤記録を集計する。
    pub fn run(&self) -> Result<CommuteSummary> {
        let snapshot = self.store.load().context("Failed to load commute logs")?;
        info!(
            "Summarize {} records for the last {} days",
            snapshot.records.len(),
            SUMMARY_DAYS
        );

        Ok(summarize_recent(&snapshot.records, &snapshot.modes))
    }
}
