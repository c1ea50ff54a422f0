use crate::{
    CleanArgs,
    build::{base_path_from_config, dir_entries, empty_dir},
    config::Config,
};

pub async fn run(args: &CleanArgs) -> Result<(), anyhow::Error> {
    let (config, config_path) = Config::load_from_arg(args.config_file.as_deref())?;

    // Get the base path for resolving relative paths
    let base_path = base_path_from_config(&config_path);
    let output = config.paths.resolve(&base_path).output;

    if !output.exists() {
        println!("Nothing to clean in {}", output.display());
        return Ok(());
    }

    if args.dry_run {
        for path in dir_entries(&output)? {
            println!("Would delete {}", path.display());
        }
    } else {
        let removed = empty_dir(&output)?;
        println!("Deleted {} item(s) from {}", removed.len(), output.display());
    }

    Ok(())
}
