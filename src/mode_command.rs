use anyhow::{bail, Context, Result};
use log::info;

use crate::commute::CommuteMode;
use crate::store::RecordStore;

/// 通勤手段を管理するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct ModeArgs {
    #[clap(subcommand)]
    action: ModeAction,
}

#[derive(Debug, clap::Subcommand)]
pub enum ModeAction {
    /// Show commute types
    List,
    /// Add a commute type
    Add {
        name: String,
        #[clap(long = "icon", default_value = "HelpCircle")]
        icon: String,
    },
    /// Rename a commute type
    Rename { id: String, name: String },
    /// Delete a commute type. Logs that use it are kept.
    Delete { id: String },
}

pub struct ModeCommand<'a, S: RecordStore> {
    store: &'a S,
}

impl<'a, S: RecordStore> ModeCommand<'a, S> {
    /// 新しい`ModeCommand`を返す。
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// `modes`サブコマンドの処理を行い、処理後の通勤手段の一覧を返す。
    pub fn run(&self, args: ModeArgs) -> Result<Vec<CommuteMode>> {
        let mut snapshot = self.store.load().context("Failed to load commute types")?;

        match args.action {
            ModeAction::List => return Ok(snapshot.modes),
            ModeAction::Add { name, icon } => {
                let mode = snapshot.add_mode(&name, &icon)?;
                info!("Commute type {} added as {}.", mode.name, mode.id);
            }
            ModeAction::Rename { id, name } => {
                snapshot.rename_mode(&id, &name)?;
                info!("Commute type {} renamed to {}.", id, name);
            }
            ModeAction::Delete { id } => {
                if !snapshot.delete_mode(&id) {
                    bail!("Commute type not found: {}", id);
                }
                info!("Commute type {} deleted.", id);
            }
        }

        self.store
            .save(&snapshot)
            .context("Failed to save commute types")?;

        Ok(snapshot.modes)
    }
}
