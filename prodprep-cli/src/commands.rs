//! Subcommand handlers.

use anyhow::Context;
use std::path::Path;

use prodprep_core::artifacts::load_artifact;
use prodprep_core::config::CONFIG_FILE_NAME;
use prodprep_core::persistence::atomic_write;
use prodprep_core::{
    ConfigOverrides, LabelEncoding, PrepConfig, PrepError, apply_to_file, load_config,
    run_preprocessing,
};

use crate::{Commands, ConfigAction, RunArgs};

/// Exit status for errors that are not a [`PrepError`].
const GENERIC_FAILURE: u8 = 1;

/// Map an error to the process exit status of its [`PrepError`] kind.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<PrepError>())
        .and_then(|e| u8::try_from(e.kind().exit_code()).ok())
        .unwrap_or(GENERIC_FAILURE)
}

/// Exit status for a command-line parse failure: success for `--help` and
/// `--version`, [`GENERIC_FAILURE`] for usage errors.
pub fn parse_exit_code(err: &clap::Error) -> u8 {
    if err.use_stderr() { GENERIC_FAILURE } else { 0 }
}

pub fn handle_command(
    command: Commands,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match command {
        Commands::Run(args) => handle_run(args, workspace, config_file),
        Commands::Apply {
            input,
            artifacts,
            output,
        } => handle_apply(&input, &artifacts, &output, workspace, config_file),
        Commands::Decode { artifacts, codes } => handle_decode(&artifacts, &codes),
        Commands::Config { action } => handle_config(action, workspace, config_file),
    }
}

fn handle_run(args: RunArgs, workspace: &Path, config_file: Option<&Path>) -> anyhow::Result<()> {
    let overrides = ConfigOverrides {
        random_seed: args.seed,
        output_directory: args.output,
        label_column: args.label,
        split: args.split,
        scaling: args.scaling,
        categorical_encoding: args.encoding,
    };
    let config = load_config(Some(workspace), config_file, Some(&overrides))?;
    tracing::debug!(?config, "Effective configuration");
    let output = run_preprocessing(&args.input, &config)?;

    println!("{}", serde_json::to_string_pretty(&output.summary)?);
    println!(
        "Wrote {} files to {}",
        output.manifest.files.len() + 1,
        output.output_dir.display()
    );
    Ok(())
}

fn handle_apply(
    input: &Path,
    artifacts: &Path,
    output: &Path,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    let config = load_config(Some(workspace), config_file, None)?;
    let applied = apply_to_file(input, artifacts, config.delimiter)?;
    atomic_write(output, &applied.to_csv()?)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Wrote {} rows x {} features to {}",
        applied.features.row_count(),
        applied.features.column_count(),
        output.display()
    );
    Ok(())
}

fn handle_decode(artifacts: &Path, codes: &[usize]) -> anyhow::Result<()> {
    let encoding: LabelEncoding = load_artifact(artifacts)?;
    for &code in codes {
        println!("{}\t{}", code, encoding.decode(code)?);
    }
    Ok(())
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            let toml_str = PrepConfig::default().to_toml_string()?;
            atomic_write(&config_path, toml_str.as_bytes())?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config(Some(workspace), config_file, None)?;
            println!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}
