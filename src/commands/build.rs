use crate::{
    BuildArgs,
    build::{Builder, base_path_from_config},
    config::Config,
};

pub async fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let (config, config_path) = Config::load_from_arg(args.config_file.as_deref())?;

    // Get the base path for resolving relative paths
    let base_path = base_path_from_config(&config_path);

    let result = Builder::new(config, base_path).build().await?;

    println!(
        "Built site to {} ({} posts, {} assets, {} pages)",
        result.output_dir.display(),
        result.posts.len(),
        result.assets,
        result.pages
    );

    Ok(())
}
