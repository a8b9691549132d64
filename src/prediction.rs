use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::backend::GenerativeBackend;
use crate::commute::{find_mode, CommuteMode, CommuteRecord};
use crate::history::{extract_samples, HistoricalSample};

static TIME_OF_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("time of day pattern"));

const PROMPT_TEMPLATE: &str = "You are a commute time prediction expert.  Given the time of day, commute type, and past commute logs, predict the commute duration in minutes.

Time of Day: {time_of_day}
Commute Type: {commute_type}
Past Commute Logs: {past_commute_logs}

Consider the following when making your prediction:

*   Typical commute times for the given time of day and commute type.
*   Trends in the past commute logs ordered by date (e.g., increasing or decreasing commute times over time).
*   Any outliers in the past commute logs (e.g., unusually long or short commutes), which should not dominate the prediction.

Output exactly two fields: predictedDuration, the predicted commute duration in minutes as a number, and confidence, a description of your confidence in the prediction (e.g., high, medium, low).";

/// 予測処理で発生するエラー。
#[derive(Debug, Error)]
pub enum PredictionError {
    /// 入力が不正。バックエンドは呼び出されていない。
    #[error("Invalid prediction input: {0}")]
    Validation(String),

    /// 対象の通勤手段の記録が無い。バックエンドは呼び出されていない。
    #[error("Not enough data: no past logs found for \"{mode}\" to make a prediction")]
    NoData { mode: String },

    #[error("Prediction service failed: {0:#}")]
    Backend(anyhow::Error),

    /// バックエンドの応答が出力スキーマを満たさない。
    #[error("Prediction service failed: unexpected response shape: {0}")]
    SchemaMismatch(String),
}

impl PredictionError {
    /// 予測サービス側の失敗かどうかを返す。
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::SchemaMismatch(_))
    }
}

/// バックエンドに渡す予測の入力。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    /// `HH:MM`形式の時刻
    pub time_of_day: String,
    /// 通勤手段の表示名
    pub commute_type: String,
    /// `HistoricalSample`の配列をJSONにした文字列
    pub past_commute_logs: String,
}

impl PredictionRequest {
    /// サンプルをJSONに変換して新しい`PredictionRequest`を返す。
    pub fn new(
        time_of_day: &str,
        commute_type: &str,
        samples: &[HistoricalSample],
    ) -> Result<Self, PredictionError> {
        let past_commute_logs = serde_json::to_string(samples).map_err(|e| {
            PredictionError::Validation(format!("Failed to serialize past commute logs: {}", e))
        })?;

        Ok(Self {
            time_of_day: time_of_day.to_string(),
            commute_type: commute_type.to_string(),
            past_commute_logs,
        })
    }

    /// 入力を検証し、解釈したサンプルを返す。
    pub fn validate(&self) -> Result<Vec<HistoricalSample>, PredictionError> {
        validate_time_of_day(&self.time_of_day)?;
        if self.commute_type.trim().is_empty() {
            return Err(PredictionError::Validation(
                "Please select a commute type.".to_string(),
            ));
        }

        serde_json::from_str(&self.past_commute_logs).map_err(|e| {
            PredictionError::Validation(format!("Invalid JSON format for pastCommuteLogs: {}", e))
        })
    }
}

/// 24時間表記の`HH:MM`であることを確認する。
pub fn validate_time_of_day(time_of_day: &str) -> Result<(), PredictionError> {
    if TIME_OF_DAY.is_match(time_of_day) {
        Ok(())
    } else {
        Err(PredictionError::Validation(format!(
            "Please enter time in HH:MM format: {:?}",
            time_of_day
        )))
    }
}

/// 予測結果。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    /// 予測した所要時間(分)
    pub predicted_duration: f64,
    /// 予測の確からしさの説明
    pub confidence: String,
}

impl PredictionResult {
    /// バックエンドに要求する出力スキーマ。
    pub fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "predictedDuration": {
                    "type": "NUMBER",
                    "description": "The predicted commute duration in minutes.",
                },
                "confidence": {
                    "type": "STRING",
                    "description": "A description of the confidence level of the prediction (e.g., high, medium, low).",
                },
            },
            "required": ["predictedDuration", "confidence"],
        })
    }

    /// バックエンドの応答を検証して`PredictionResult`に変換する。
    ///
    /// 型の変換や既定値での補完は行わない。
    pub fn from_response(value: Value) -> Result<Self, PredictionError> {
        // serdeは配列からも構造体を復元するため、オブジェクトであることを先に確認する
        if !value.is_object() {
            return Err(PredictionError::SchemaMismatch(format!(
                "expected an object, got {}",
                value
            )));
        }

        serde_json::from_value(value).map_err(|e| PredictionError::SchemaMismatch(e.to_string()))
    }
}

/// プロンプトを組み立てる。入力はそのまま埋め込む。
pub fn format_prompt(request: &PredictionRequest) -> String {
    PROMPT_TEMPLATE
        .replace("{time_of_day}", &request.time_of_day)
        .replace("{commute_type}", &request.commute_type)
        .replace("{past_commute_logs}", &request.past_commute_logs)
}

/// 通勤時間を予測する。
///
/// 呼び出しごとに独立しており、状態は持たない。失敗しても再試行はしない。
pub struct Predictor<'a, B: GenerativeBackend> {
    backend: &'a B,
}

impl<'a, B: GenerativeBackend> Predictor<'a, B> {
    /// 新しい`Predictor`を返す。
    ///
    /// # Arguments
    ///
    /// * `backend` - プロンプトを送信する生成AIのバックエンド
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// 入力を検証してバックエンドに予測を依頼し、応答を検証して返す。
    pub async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResult, PredictionError> {
        let samples = request.validate()?;
        if samples.is_empty() {
            return Err(PredictionError::NoData {
                mode: request.commute_type.clone(),
            });
        }

        let prompt = format_prompt(request);
        let response = self
            .backend
            .generate(&prompt, &PredictionResult::response_schema())
            .await
            .map_err(PredictionError::Backend)?;

        PredictionResult::from_response(response)
    }

    /// 通勤記録から指定された通勤手段のサンプルを集め、予測する。
    ///
    /// # Arguments
    ///
    /// * `time_of_day` - `HH:MM`形式の時刻
    /// * `mode_id` - 通勤手段のID
    /// * `records` - 通勤記録
    /// * `modes` - 通勤手段の一覧
    pub async fn predict_for_mode(
        &self,
        time_of_day: &str,
        mode_id: &str,
        records: &[CommuteRecord],
        modes: &[CommuteMode],
    ) -> Result<PredictionResult, PredictionError> {
        validate_time_of_day(time_of_day)?;
        if mode_id.is_empty() {
            return Err(PredictionError::Validation(
                "Please select a commute type.".to_string(),
            ));
        }
        let mode = find_mode(modes, mode_id).ok_or_else(|| {
            PredictionError::Validation(format!("Selected commute type not found: {}", mode_id))
        })?;

        let samples = extract_samples(records, &mode.id, &mode.name);
        if samples.is_empty() {
            return Err(PredictionError::NoData {
                mode: mode.name.clone(),
            });
        }

        let request = PredictionRequest::new(time_of_day, &mode.name, &samples)?;
        self.predict(&request).await
    }
}
