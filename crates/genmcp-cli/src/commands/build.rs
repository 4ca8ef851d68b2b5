use std::path::{Path, PathBuf};
use std::time::Duration;

use genmcp_build::{DistBinaryProvider, ImageBuilder};
use genmcp_core::{BuildOptions, GenmcpConfig, Platform};
use genmcp_image::{Image, extract_tag};
use genmcp_registry::RegistryClient;

#[derive(clap::Args)]
pub struct BuildArgs {
    /// MCP file to embed in the image
    #[arg(long, short = 'f', default_value = "mcpfile.yaml")]
    file: PathBuf,

    /// Image reference to push to, e.g. quay.io/org/server:v1
    #[arg(long, short = 't')]
    tag: Option<String>,

    /// Base image (default: genmcp.toml, then UBI 9 minimal)
    #[arg(long)]
    base_image: Option<String>,

    /// Target platform as os/arch[/variant] (default: linux/amd64)
    #[arg(long)]
    platform: Option<Platform>,

    /// Push the built image to --tag
    #[arg(long)]
    push: bool,

    /// Path to genmcp.toml (default: ./genmcp.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 600)]
    timeout: u64,
}

pub async fn build(args: BuildArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => GenmcpConfig::load_file(path)?,
        None => GenmcpConfig::load(Path::new("."))?,
    };

    let tag = args.tag.unwrap_or_default();
    if args.push && tag.is_empty() {
        anyhow::bail!("--tag is required with --push");
    }

    let mut options = BuildOptions {
        platform: args.platform,
        base_image: args.base_image.unwrap_or_default(),
        mcp_file_path: args.file,
        image_tag: tag.clone(),
    };
    options.apply_config(&config.build);

    let client = RegistryClient::new(&config.registry)?;
    let binaries = DistBinaryProvider::from_config(&config.build)?;
    tracing::debug!(binaries = %binaries.dir().display(), "using server binaries");
    let builder = ImageBuilder::new(client, binaries);

    let push = args.push;
    let work = async {
        let image = builder.build(options).await?;
        print_image(&image)?;

        if push {
            builder.save(&image, &tag).await?;
            let shown = match extract_tag(&tag) {
                "" => "latest",
                t => t,
            };
            println!("Pushed {tag} (tag: {shown})");
        }
        anyhow::Ok(())
    };

    tokio::select! {
        result = tokio::time::timeout(Duration::from_secs(args.timeout), work) => {
            result.map_err(|elapsed| {
                anyhow::anyhow!("build did not finish within {}s: {elapsed}", args.timeout)
            })?
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            anyhow::bail!("interrupted")
        }
    }
}

fn print_image(image: &Image) -> anyhow::Result<()> {
    let config = image.config()?;
    println!("Built image {}", image.digest());
    println!("  platform: {}/{}", config.os(), config.architecture());
    println!("  layers:   {}", config.rootfs().diff_ids().len());
    if let Some(entrypoint) = config.config().as_ref().and_then(|c| c.entrypoint().as_ref()) {
        println!("  entrypoint: {}", entrypoint.join(" "));
    }
    Ok(())
}
