use anyhow::Result;
use clap::{Parser, Subcommand};
use facecheck::{config::Config, data, web::serve};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "facecheck")]
#[command(about = "CLIP-backed real vs AI-generated face classification service")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: String,

    /// Number of worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Model directory path
    #[arg(long, default_value = "models")]
    models_dir: String,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Download and extract the training dataset archive
    FetchData {
        /// Directory the dataset is extracted into
        #[arg(long, default_value = "data")]
        data_dir: String,

        /// Override the archive URL
        #[arg(long)]
        url: Option<String>,

        /// Keep the downloaded archive after extraction
        #[arg(long)]
        keep_archive: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    match args.command {
        Some(Command::FetchData {
            data_dir,
            url,
            keep_archive,
        }) => {
            data::fetch_dataset(&data_dir, url.as_deref(), keep_archive).await?;
        }
        None => {
            tracing::info!("Starting facecheck service...");
            tracing::info!("Bind address: {}", args.bind);
            tracing::info!("Models directory: {}", args.models_dir);

            // 创建配置
            let config = Config::new(args.bind, args.models_dir, args.workers, args.dev)?;

            // 启动服务器
            serve(config).await?;
        }
    }

    Ok(())
}
