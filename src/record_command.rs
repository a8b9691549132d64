use anyhow::{bail, ensure, Context, Result};
use chrono::NaiveDate;
use log::info;

use crate::commute::{find_mode, CommuteMode, CommuteRecord};
use crate::datetime::{self, parse_date};
use crate::store::{RecordStore, Snapshot};

/// 通勤記録を追加するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct AddArgs {
    #[clap(
        short = 'd',
        long = "date",
        help = "Sets a custom date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    date: Option<NaiveDate>,

    #[clap(long = "outbound", help = "Sets the commute type id of the outbound trip")]
    outbound_mode: String,

    #[clap(long = "outbound-duration", help = "Sets the outbound duration in minutes")]
    outbound_duration: u32,

    #[clap(long = "return", help = "Sets the commute type id of the return trip")]
    return_mode: String,

    #[clap(long = "return-duration", help = "Sets the return duration in minutes")]
    return_duration: u32,

    #[clap(short = 'n', long = "notes", default_value = "")]
    notes: String,
}

/// 通勤記録を編集するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct EditArgs {
    #[clap(help = "Id of the commute log to edit")]
    id: String,

    #[clap(
        short = 'd',
        long = "date",
        help = "Sets a custom date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    date: Option<NaiveDate>,

    #[clap(long = "outbound")]
    outbound_mode: Option<String>,

    #[clap(long = "outbound-duration")]
    outbound_duration: Option<u32>,

    #[clap(long = "return")]
    return_mode: Option<String>,

    #[clap(long = "return-duration")]
    return_duration: Option<u32>,

    #[clap(short = 'n', long = "notes")]
    notes: Option<String>,
}

/// 通勤記録を削除するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct DeleteArgs {
    #[clap(help = "Id of the commute log to delete")]
    id: String,
}

pub struct RecordCommand<'a, S: RecordStore> {
    store: &'a S,
}

/// 通勤手段が登録されていることを確認する。
fn ensure_mode_exists(modes: &[CommuteMode], id: &str) -> Result<()> {
    ensure!(
        find_mode(modes, id).is_some(),
        "Commute type not found: {}",
        id
    );
    Ok(())
}

impl<'a, S: RecordStore> RecordCommand<'a, S> {
    /// 新しい`RecordCommand`を返す。
    ///
    /// # Arguments
    /// * `store` - 通勤記録を保存するストア
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// `list`サブコマンドの処理を行う。
    pub fn list(&self) -> Result<Snapshot> {
        let snapshot = self.store.load().context("Failed to load commute logs")?;
        info!("length of commute logs: {}", snapshot.records.len());

        Ok(snapshot)
    }

    /// `add`サブコマンドの処理を行う。
    ///
    /// 日付が指定されていない場合は、Localタイムゾーンで今日の日付を利用する。
    pub fn add(&self, args: AddArgs) -> Result<CommuteRecord> {
        let mut snapshot = self.store.load().context("Failed to load commute logs")?;
        ensure_mode_exists(&snapshot.modes, &args.outbound_mode)?;
        ensure_mode_exists(&snapshot.modes, &args.return_mode)?;

        let record = CommuteRecord::new(
            args.date.unwrap_or_else(datetime::today),
            &args.outbound_mode,
            args.outbound_duration,
            &args.return_mode,
            args.return_duration,
            &args.notes,
        )
        .context("Failed to create commute log")?;
        snapshot.upsert_record(record.clone());
        self.store
            .save(&snapshot)
            .context("Failed to save commute logs")?;
        info!("Commute log {} added.", record.id);

        Ok(record)
    }

    /// `edit`サブコマンドの処理を行う。
    ///
    /// 指定された項目だけを書き換える。
    pub fn edit(&self, args: EditArgs) -> Result<CommuteRecord> {
        let mut snapshot = self.store.load().context("Failed to load commute logs")?;
        let mut record = snapshot
            .records
            .iter()
            .find(|record| record.id == args.id)
            .cloned()
            .with_context(|| format!("Commute log not found: {}", args.id))?;

        if let Some(date) = args.date {
            record.date = date;
        }
        if let Some(mode) = args.outbound_mode {
            ensure_mode_exists(&snapshot.modes, &mode)?;
            record.outbound_mode_id = mode;
        }
        if let Some(mode) = args.return_mode {
            ensure_mode_exists(&snapshot.modes, &mode)?;
            record.return_mode_id = mode;
        }
        if let Some(duration) = args.outbound_duration {
            record.outbound_duration = duration;
        }
        if let Some(duration) = args.return_duration {
            record.return_duration = duration;
        }
        if let Some(notes) = args.notes {
            record.notes = notes;
        }
        record.validate()?;

        snapshot.upsert_record(record.clone());
        self.store
            .save(&snapshot)
            .context("Failed to save commute logs")?;
        info!("Commute log {} updated.", record.id);

        Ok(record)
    }

    /// `delete`サブコマンドの処理を行う。
    pub fn delete(&self, args: DeleteArgs) -> Result<()> {
        let mut snapshot = self.store.load().context("Failed to load commute logs")?;
        if !snapshot.delete_record(&args.id) {
            bail!("Commute log not found: {}", args.id);
        }
        self.store
            .save(&snapshot)
            .context("Failed to save commute logs")?;
        info!("Commute log {} deleted.", args.id);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate, TimeZone};
    use rstest::rstest;

    use super::{AddArgs, DeleteArgs, EditArgs, RecordCommand};
    use crate::commute::{default_modes, CommuteRecord};
    use crate::datetime::mock_datetime;
    use crate::store::{MockRecordStore, Snapshot};

    fn dummy_snapshot() -> Snapshot {
        Snapshot {
            modes: default_modes(),
            records: vec![CommuteRecord {
                id: "a".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                outbound_mode_id: "1".to_string(),
                return_mode_id: "2".to_string(),
                outbound_duration: 30,
                return_duration: 45,
                notes: String::new(),
            }],
        }
    }

    fn add_args(outbound_mode: &str, outbound_duration: u32) -> AddArgs {
        AddArgs {
            date: None,
            outbound_mode: outbound_mode.to_string(),
            outbound_duration,
            return_mode: "2".to_string(),
            return_duration: 40,
            notes: "rain".to_string(),
        }
    }

    fn edit_args(id: &str) -> EditArgs {
        EditArgs {
            id: id.to_string(),
            date: None,
            outbound_mode: None,
            outbound_duration: None,
            return_mode: None,
            return_duration: None,
            notes: None,
        }
    }

    /// 保存されないことを期待するストア。
    fn read_only_store() -> MockRecordStore {
        let mut store = MockRecordStore::new();
        store
            .expect_load()
            .returning(|| Ok(dummy_snapshot()));
        store.expect_save().never();
        store
    }

    /// 日付を指定しない場合は今日の日付で先頭に追加されることを確認する。
    #[test]
    fn test_add() {
        mock_datetime::set_mock_time(Local.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap().to_utc());
        let mut store = MockRecordStore::new();
        store
            .expect_load()
            .times(1)
            .returning(|| Ok(dummy_snapshot()));
        store
            .expect_save()
            .withf(|snapshot: &Snapshot| {
                snapshot.records.len() == 2
                    && snapshot.records[0].date == NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
                    && snapshot.records[0].notes == "rain"
            })
            .times(1)
            .returning(|_| Ok(()));

        let record = RecordCommand::new(&store).add(add_args("3", 20)).unwrap();

        mock_datetime::clear_mock_time();
        assert_eq!(record.outbound_mode_id, "3");
        assert_eq!(record.outbound_duration, 20);
    }

    #[rstest]
    #[case::unknown_mode(add_args("99", 20))]
    #[case::zero_duration(add_args("1", 0))]
    fn test_add_error(#[case] args: AddArgs) {
        let store = read_only_store();

        assert!(RecordCommand::new(&store).add(args).is_err());
    }

    #[test]
    fn test_edit() {
        let mut store = MockRecordStore::new();
        store
            .expect_load()
            .times(1)
            .returning(|| Ok(dummy_snapshot()));
        store
            .expect_save()
            .withf(|snapshot: &Snapshot| {
                snapshot.records.len() == 1 && snapshot.records[0].return_duration == 50
            })
            .times(1)
            .returning(|_| Ok(()));
        let mut args = edit_args("a");
        args.return_duration = Some(50);
        args.notes = Some("accident".to_string());

        let record = RecordCommand::new(&store).edit(args).unwrap();

        assert_eq!(record.return_duration, 50);
        assert_eq!(record.outbound_duration, 30);
        assert_eq!(record.notes, "accident");
    }

    #[test]
    fn test_edit_error() {
        let store = read_only_store();
        let mut zero = edit_args("a");
        zero.outbound_duration = Some(0);
        let mut unknown_mode = edit_args("a");
        unknown_mode.return_mode = Some("99".to_string());
        let command = RecordCommand::new(&store);

        assert!(command.edit(edit_args("missing")).is_err());
        assert!(command.edit(zero).is_err());
        assert!(command.edit(unknown_mode).is_err());
    }

    #[test]
    fn test_delete() {
        let mut store = MockRecordStore::new();
        store
            .expect_load()
            .times(1)
            .returning(|| Ok(dummy_snapshot()));
        store
            .expect_save()
            .withf(|snapshot: &Snapshot| snapshot.records.is_empty())
            .times(1)
            .returning(|_| Ok(()));

        let result = RecordCommand::new(&store).delete(DeleteArgs { id: "a".to_string() });

        assert!(result.is_ok());
    }

    #[test]
    fn test_delete_missing() {
        let store = read_only_store();

        let result = RecordCommand::new(&store).delete(DeleteArgs {
            id: "missing".to_string(),
        });

        assert!(result.is_err());
    }

    #[test]
    fn test_list() {
        let store = read_only_store();

        let snapshot = RecordCommand::new(&store).list().unwrap();

        assert_eq!(snapshot, dummy_snapshot());
    }
}
