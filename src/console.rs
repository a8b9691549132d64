use std::io::Write;

use anyhow::{Context, Result};

use crate::commute::{find_mode, CommuteMode, CommuteRecord};
use crate::prediction::PredictionResult;
use crate::summary::CommuteSummary;

const UNKNOWN_MODE: &str = "Unknown";

/// Consoleに通勤記録や予測結果を表示するためのtrait。
pub trait ConsolePresenter {
    /// 通勤記録を表示する。
    ///
    /// # Arguments
    ///
    /// * `records` - 表示する通勤記録
    /// * `modes` - 通勤手段の名前を引くための一覧
    fn show_records(&mut self, records: &[CommuteRecord], modes: &[CommuteMode]) -> Result<()>;

    /// 通勤手段を表示する。
    fn show_modes(&mut self, modes: &[CommuteMode]) -> Result<()>;

    /// 集計結果を表示する。
    fn show_summary(&mut self, summary: &CommuteSummary) -> Result<()>;

    /// 予測結果を表示する。
    fn show_prediction(&mut self, result: &PredictionResult) -> Result<()>;
}

/// Markdownのlist形式で表示する。
pub struct ConsoleMarkdownList<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdownList<'a, W> {
    /// 新しい`ConsoleMarkdownList`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

fn mode_name<'a>(modes: &'a [CommuteMode], id: &str) -> &'a str {
    find_mode(modes, id)
        .map(|mode| mode.name.as_str())
        .unwrap_or(UNKNOWN_MODE)
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdownList<'a, W> {
    // 新しい日付から順に表示する。
    fn show_records(&mut self, records: &[CommuteRecord], modes: &[CommuteMode]) -> Result<()> {
        let mut sorted_records = records.to_vec();
        sorted_records.sort_by(|a, b| b.date.cmp(&a.date));

        for record in sorted_records {
            writeln!(
                self.writer,
                "- {}: {} {}min -> {} {}min ({})",
                record.date.format("%Y-%m-%d"),
                mode_name(modes, &record.outbound_mode_id),
                record.outbound_duration,
                mode_name(modes, &record.return_mode_id),
                record.return_duration,
                record.id,
            )
            .with_context(|| format!("Failed to write record: {:?}", record))?;
            if !record.notes.is_empty() {
                writeln!(self.writer, "  - {}", record.notes)
                    .with_context(|| format!("Failed to write notes: {:?}", record))?;
            }
        }

        Ok(())
    }

    fn show_modes(&mut self, modes: &[CommuteMode]) -> Result<()> {
        for mode in modes {
            writeln!(self.writer, "- {}: {} ({})", mode.id, mode.name, mode.icon)
                .with_context(|| format!("Failed to write mode: {:?}", mode))?;
        }

        Ok(())
    }

    // 合計は時間単位、平均は分単位で表示する。
    fn show_summary(&mut self, summary: &CommuteSummary) -> Result<()> {
        writeln!(
            self.writer,
            "- Hours: {:.1}\n- Avg. Mins: {:.0}",
            summary.total_minutes as f64 / 60.0,
            summary.average_minutes
        )
        .context("Failed to write summary")?;
        if let Some(mode) = &summary.most_frequent_mode {
            writeln!(self.writer, "- Most frequent: {}", mode.name)
                .context("Failed to write most frequent mode")?;
        }

        if summary.mode_counts.is_empty() {
            writeln!(self.writer, "Not enough data to display counts.")
                .context("Failed to write mode counts")?;
            return Ok(());
        }
        writeln!(self.writer, "- Counts:").context("Failed to write mode counts")?;
        for mode_count in &summary.mode_counts {
            writeln!(self.writer, "  - {}: {}", mode_count.name, mode_count.count)
                .with_context(|| format!("Failed to write mode count: {:?}", mode_count))?;
        }

        Ok(())
    }

    fn show_prediction(&mut self, result: &PredictionResult) -> Result<()> {
        writeln!(
            self.writer,
            "Estimated duration is {} minutes. (Confidence: {})",
            result.predicted_duration, result.confidence
        )
        .with_context(|| format!("Failed to write prediction: {:?}", result))?;

        Ok(())
    }
}
