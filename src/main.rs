use clap::Parser as _;
use tracing::debug;

use matpack::{
    app::{App, AppError},
    cli::Cli,
};

#[compio::main]
#[snafu::report]
async fn main() -> Result<(), AppError> {
    let cli_args = Cli::parse();
    setup_tracing(&cli_args);
    debug!("Parsed CLI arguments: {cli_args:?}");

    App::run(cli_args).await?;

    Ok(())
}

fn setup_tracing(cli_args: &Cli) {
    if let Some(level) = cli_args.log_level.to_tracing_level() {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .without_time()
            .compact()
            .init();
    }
}
