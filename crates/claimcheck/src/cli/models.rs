//! The `claimcheck models` command for managing model artifacts.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use claimcheck_core::checksum::{file_blake3, matches_blake3};
use claimcheck_core::config::ArtifactConfig;
use claimcheck_core::Config;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download every missing artifact that has a configured URL
    Download,

    /// List model artifacts and whether they are installed
    List,

    /// Show model directory path
    Path,
}

/// One configured artifact resolved against the model directory.
struct ResolvedArtifact<'a> {
    name: &'static str,
    artifact: &'a ArtifactConfig,
    dest: PathBuf,
}

impl ResolvedArtifact<'_> {
    fn status(&self) -> &'static str {
        if self.dest.exists() {
            "ready"
        } else if self.artifact.url.is_some() {
            "not installed"
        } else {
            "missing (no download URL)"
        }
    }
}

fn resolve(config: &Config) -> Vec<ResolvedArtifact<'_>> {
    config
        .artifacts()
        .into_iter()
        .map(|(name, artifact)| ResolvedArtifact {
            name,
            artifact,
            dest: config.artifact_path(artifact),
        })
        .collect()
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: &Config) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::Download => download_all(config).await?,

        ModelsCommand::List => {
            println!("Model artifacts:");
            println!("  Directory: {}\n", config.model_dir().display());
            for resolved in resolve(config) {
                println!(
                    "    - {:14} {:40} {}",
                    resolved.name,
                    resolved.artifact.path.display(),
                    resolved.status()
                );
            }
        }

        ModelsCommand::Path => {
            println!("{}", config.model_dir().display());
        }
    }

    Ok(())
}

/// Fetch every missing artifact with a URL. Skips files already on disk
/// unless they fail a configured checksum.
///
/// Artifacts without a URL (the detector and classifier exports by default)
/// are reported so the operator knows where to place them.
async fn download_all(config: &Config) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let mut manual = Vec::new();

    for resolved in resolve(config) {
        if resolved.dest.exists() {
            match resolved.artifact.blake3.as_deref() {
                Some(expected) if !matches_blake3(&resolved.dest, expected)? => {
                    tracing::warn!(
                        "{} at {:?} fails its checksum, downloading again",
                        resolved.name,
                        resolved.dest
                    );
                }
                _ => {
                    tracing::info!("{} already exists at {:?}", resolved.name, resolved.dest);
                    continue;
                }
            }
        }

        let Some(url) = resolved.artifact.url.as_deref() else {
            manual.push(resolved);
            continue;
        };

        if let Some(parent) = resolved.dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!("Downloading {}...", resolved.name);
        tracing::info!("  Source: {}", url);
        tracing::info!("  Destination: {:?}", resolved.dest);

        download_file(
            &client,
            url,
            &resolved.dest,
            resolved.artifact.blake3.as_deref(),
        )
        .await?;

        let file_size = std::fs::metadata(&resolved.dest)?.len();
        tracing::info!(
            "  {} complete ({:.1} MB)",
            resolved.name,
            file_size as f64 / (1024.0 * 1024.0)
        );
    }

    for resolved in &manual {
        tracing::warn!(
            "No download URL for {}; place the ONNX export at {}",
            resolved.name,
            resolved.dest.display()
        );
    }

    if manual.is_empty() {
        tracing::info!("All downloads complete.");
    } else {
        tracing::info!(
            "Downloads complete; {} artifact(s) must be provided manually.",
            manual.len()
        );
    }
    Ok(())
}

/// Download a file from a URL to a local path, streaming to disk.
///
/// Writes to a `.part` sibling and renames on success, so an interrupted
/// download is never mistaken for an installed artifact.
async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    expected_blake3: Option<&str>,
) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let progress = create_progress_bar(response.content_length());
    let partial = partial_path(dest);

    let mut file = tokio::fs::File::create(&partial).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        progress.inc(chunk.len() as u64);
    }

    file.flush().await?;
    drop(file);
    progress.finish_and_clear();

    if let Some(expected) = expected_blake3 {
        verify_blake3(&partial, expected)?;
    }

    tokio::fs::rename(&partial, dest).await?;
    Ok(())
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

fn create_progress_bar(total: Option<u64>) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    match total {
        Some(total) => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("##-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    }
}

/// Verify a downloaded file's BLAKE3 checksum.
///
/// On mismatch, removes the corrupt file so the next run re-downloads.
fn verify_blake3(path: &Path, expected: &str) -> anyhow::Result<()> {
    let actual = file_blake3(path)
        .map_err(|e| anyhow::anyhow!("Checksum computation failed for {}: {e}", path.display()))?;

    if !actual.eq_ignore_ascii_case(expected.trim()) {
        let _ = std::fs::remove_file(path);
        anyhow::bail!(
            "Checksum mismatch for {}:\n  expected: {}\n  actual:   {}\n\
             Corrupt file removed, try downloading again.",
            path.display(),
            expected,
            actual
        );
    }

    tracing::debug!("  Checksum verified: {}", &actual[..16]);
    Ok(())
}
