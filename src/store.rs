use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use log::{debug, info};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::commute::{default_modes, CommuteMode, CommuteRecord};

/// 保存されている通勤手段と通勤記録の一式。
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub modes: Vec<CommuteMode>,
    #[serde(default)]
    pub records: Vec<CommuteRecord>,
}

impl Snapshot {
    /// 同じIDの記録があれば置き換え、無ければ先頭に追加する。
    pub fn upsert_record(&mut self, record: CommuteRecord) {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => self.records.insert(0, record),
        }
    }

    /// 記録を削除する。削除した場合は`true`を返す。
    pub fn delete_record(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        self.records.len() != before
    }

    /// 通勤手段を追加し、追加した通勤手段を返す。
    pub fn add_mode(&mut self, name: &str, icon: &str) -> Result<CommuteMode> {
        let name = name.trim();
        ensure!(!name.is_empty(), "Commute type name must not be empty");

        let mode = CommuteMode::new(&Uuid::new_v4().to_string(), name, icon);
        self.modes.push(mode.clone());
        Ok(mode)
    }

    /// 通勤手段の名前を変更する。
    pub fn rename_mode(&mut self, id: &str, name: &str) -> Result<()> {
        let name = name.trim();
        ensure!(!name.is_empty(), "Commute type name must not be empty");

        let mode = self
            .modes
            .iter_mut()
            .find(|mode| mode.id == id)
            .with_context(|| format!("Commute type not found: {}", id))?;
        mode.name = name.to_string();
        Ok(())
    }

    /// 通勤手段を削除する。
    ///
    /// この手段を参照している記録は削除しない。
    pub fn delete_mode(&mut self, id: &str) -> bool {
        let before = self.modes.len();
        self.modes.retain(|mode| mode.id != id);
        self.modes.len() != before
    }
}

/// 通勤記録を保存するためのtrait。
#[cfg_attr(test, automock)]
pub trait RecordStore {
    /// 保存されている内容を読み込む。
    fn load(&self) -> Result<Snapshot>;

    /// 内容を全て書き込む。
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

/// JSONファイルに保存する`RecordStore`。
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// 新しい`JsonFileStore`を返す。
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl RecordStore for JsonFileStore {
    // ファイルが無い場合や通勤手段が空の場合は初期の通勤手段を設定する。
    fn load(&self) -> Result<Snapshot> {
        let mut snapshot = if self.path.exists() {
            let content = fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read {}", self.path.display()))?;
            serde_json::from_str::<Snapshot>(&content)
                .with_context(|| format!("Failed to parse {}", self.path.display()))?
        } else {
            info!("No data file at {}, starting empty", self.path.display());
            Snapshot::default()
        };

        if snapshot.modes.is_empty() {
            snapshot.modes = default_modes();
        }
        snapshot
            .records
            .iter()
            .try_for_each(|record| record.validate())
            .with_context(|| format!("Invalid record in {}", self.path.display()))?;
        debug!(
            "Loaded {} modes and {} records",
            snapshot.modes.len(),
            snapshot.records.len()
        );

        Ok(snapshot)
    }

    // 同じディレクトリの一時ファイルに書いてから置き換え、書き込み途中のファイルを残さない。
    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
        let content =
            serde_json::to_string_pretty(snapshot).context("Failed to serialize records")?;

        let mut file = NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create a temporary file in {}", parent.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write {}", file.path().display()))?;
        file.persist(&self.path)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        debug!("Saved {} records to {}", snapshot.records.len(), self.path.display());

        Ok(())
    }
}
