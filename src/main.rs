/// Точка входа: API сервер, обучение и разовые предсказания

use clap::Parser;

use mobile_price::cli::{self, Cli, Command};
use mobile_price::logging::init_logging;
use mobile_price::pipeline::TrainingConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Инициализация логирования
    init_logging(cli.log_format);

    match cli.command {
        Command::Serve(args) => cli::serve(args.into()).await,
        Command::Train(args) => {
            let config = TrainingConfig::from(args);
            tokio::task::spawn_blocking(move || cli::train(config)).await?
        }
        Command::Predict(args) => cli::predict(args),
    }
}
