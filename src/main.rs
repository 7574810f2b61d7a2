use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    sornette_mirror::logging::init().context("init logging")?;

    let cli = sornette_mirror::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        sornette_mirror::cli::Command::Lessons(args) => {
            sornette_mirror::lessons::run(args).await.context("lessons")?;
        }
        sornette_mirror::cli::Command::Archives {
            command: sornette_mirror::cli::ArchivesCommand::List(args),
        } => {
            sornette_mirror::archive::list(args).await.context("archives list")?;
        }
        sornette_mirror::cli::Command::Archives {
            command: sornette_mirror::cli::ArchivesCommand::Download(args),
        } => {
            sornette_mirror::archive::download(args)
                .await
                .context("archives download")?;
        }
        sornette_mirror::cli::Command::Versions(args) => {
            sornette_mirror::versions::run(args).await.context("versions")?;
        }
    }

    Ok(())
}
