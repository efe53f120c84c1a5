use clap::Parser;
use tracing_error::ErrorLayer;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::artifact::ArtifactRegistry;
use crate::cli::Args;
use crate::provider::RpcDeploymentProvider;

mod artifact;
mod cli;
mod deployer;
mod provider;
mod types;

async fn start() -> eyre::Result<()> {
    let args = Args::parse();

    let registry = ArtifactRegistry::new(&args.artifacts_dir);

    let provider =
        RpcDeploymentProvider::connect(&args.rpc_url, &args.private_key, registry)
            .await?;

    let mut stdout = std::io::stdout();

    deployer::deploy(&provider, &mut stdout).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    dotenv::dotenv().ok();

    let indicatif_layer = IndicatifLayer::new();

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(indicatif_layer.get_stderr_writer())
                .with_filter(filter),
        )
        .with(indicatif_layer)
        .with(ErrorLayer::default())
        .init();

    match start().await {
        Ok(()) => Ok(()),
        Err(err) => {
            let report = eyre::ErrReport::from(err);
            tracing::error!("{:?}", report);
            std::process::exit(1)
        }
    }
}
