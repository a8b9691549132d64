use anyhow::{Context, Result};
use log::{info, warn};

use crate::backend::GenerativeBackend;
use crate::prediction::{PredictionResult, Predictor};
use crate::store::RecordStore;

/// 通勤時間を予測するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct PredictArgs {
    #[clap(
        short = 't',
        long = "time",
        default_value = "08:00",
        help = "Sets the time of day in the format HH:MM"
    )]
    time: String,

    #[clap(
        short = 'm',
        long = "mode",
        help = "Sets the commute type id (defaults to the first commute type)"
    )]
    mode: Option<String>,
}

pub struct PredictCommand<'a, S: RecordStore, B: GenerativeBackend> {
    store: &'a S,
    backend: &'a B,
}

impl<'a, S: RecordStore, B: GenerativeBackend> PredictCommand<'a, S, B> {
    /// 新しい`PredictCommand`を返す。
    ///
    /// # Arguments
    /// * `store` - 通勤記録を読み込むためのストア
    /// * `backend` - 予測を依頼する生成AIのバックエンド
    pub fn new(store: &'a S, backend: &'a B) -> Self {
        Self { store, backend }
    }

    /// `predict`サブコマンドの処理を行う。
    ///
    /// 通勤手段が指定されていない場合は、最初の通勤手段を利用する。
    ///
    /// # Arguments
    ///
    /// * `args` - `predict`サブコマンドの引数
    pub async fn run(&self, args: PredictArgs) -> Result<PredictionResult> {
        let snapshot = self.store.load().context("Failed to load commute logs")?;
        let mode_id = args
            .mode
            .or_else(|| snapshot.modes.first().map(|mode| mode.id.clone()))
            .unwrap_or_default();
        info!("Predict at {} with commute type {}", args.time, mode_id);

        let result = match Predictor::new(self.backend)
            .predict_for_mode(&args.time, &mode_id, &snapshot.records, &snapshot.modes)
            .await
        {
            Err(e) if e.is_backend_failure() => {
                warn!("Prediction service failed: {}", e);
                return Err(e.into());
            }
            result => result?,
        };
        info!("Prediction retrieved successfully.");

        Ok(result)
    }
}
