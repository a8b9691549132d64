use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

mod backend;
mod commute;
mod config;
mod console;
mod datetime;
mod history;
mod mode_command;
mod predict_command;
mod prediction;
mod record_command;
mod store;
mod summary;
mod summary_command;

use backend::GeminiClient;
use config::Config;
use console::{ConsoleMarkdownList, ConsolePresenter};
use mode_command::{ModeArgs, ModeCommand};
use predict_command::{PredictArgs, PredictCommand};
use record_command::{AddArgs, DeleteArgs, EditArgs, RecordCommand};
use store::JsonFileStore;
use summary_command::SummaryCommand;

/// 通勤記録を管理し、通勤時間を予測するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- add --outbound 1 --outbound-duration 30 --return 2 --return-duration 45
/// $ cargo run -- summary
/// $ cargo run -- predict --time 08:00 --mode 1
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(short = 'v', long = "verbose", global = true, help = "Show debug logs")]
    verbose: bool,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Predict a commute duration from past logs
    Predict(PredictArgs),
    /// Show commute stats for the last 30 days
    Summary,
    /// Show commute logs
    List,
    /// Add a commute log
    Add(AddArgs),
    /// Edit a commute log
    Edit(EditArgs),
    /// Delete a commute log
    Delete(DeleteArgs),
    /// Manage commute types
    Modes(ModeArgs),
}

/// ログの出力先を設定する。標準出力は結果の表示に使うため、標準エラー出力に出す。
fn setup_logger(verbose: bool) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue);
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Warn)
        .level_for(env!("CARGO_PKG_NAME"), level)
        .chain(io::stderr())
        .apply()
        .context("Failed to initialize logger")?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose)?;

    let store = JsonFileStore::new(config::data_file()?);
    let mut stdout = io::stdout();
    let mut presenter = ConsoleMarkdownList::new(&mut stdout);

    match args.subcommand {
        SubCommands::Predict(predict) => {
            let config = Config::from_env().context("Failed to load Gemini settings")?;
            let client = GeminiClient::new(&config);
            let result = PredictCommand::new(&store, &client).run(predict).await?;
            presenter.show_prediction(&result)?;
        }
        SubCommands::Summary => {
            let summary = SummaryCommand::new(&store).run()?;
            presenter.show_summary(&summary)?;
        }
        SubCommands::List => {
            let snapshot = RecordCommand::new(&store).list()?;
            presenter.show_records(&snapshot.records, &snapshot.modes)?;
        }
        SubCommands::Add(add) => {
            let record = RecordCommand::new(&store).add(add)?;
            println!("{}", record.id);
        }
        SubCommands::Edit(edit) => {
            RecordCommand::new(&store).edit(edit)?;
        }
        SubCommands::Delete(delete) => RecordCommand::new(&store).delete(delete)?,
        SubCommands::Modes(modes) => {
            let modes = ModeCommand::new(&store).run(modes)?;
            presenter.show_modes(&modes)?;
        }
    }

    Ok(())
}
