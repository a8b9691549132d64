use std::{env, path::PathBuf};

use anyhow::{Context, Result};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// 予測に利用する生成AIの接続設定。
#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
}

impl Config {
    /// 環境変数から設定を読み込む。
    ///
    /// 環境変数`GEMINI_API_KEY`が設定されていない場合はエラーを返す。
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.is_empty())
            .context("GEMINI_API_KEY must be set")?;

        Ok(Self {
            api_key,
            api_url: lookup("GEMINI_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

/// 通勤記録を保存するファイルのパスを返す。
///
/// 環境変数`COMMUTES_DATA_FILE`が無ければユーザのデータディレクトリ以下を利用する。
pub fn data_file() -> Result<PathBuf> {
    data_file_from_lookup(|key| env::var(key).ok())
}

fn data_file_from_lookup<F>(lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup("COMMUTES_DATA_FILE") {
        return Ok(PathBuf::from(path));
    }

    let data_dir = dirs::data_dir().context("Failed to find the data directory")?;
    Ok(data_dir.join("commutes").join("commutes.json"))
}
