//! First-run setup.
//!
//! Writes the default configuration file and an empty secrets template when they
//! are missing. Existing files are never overwritten.

use std::path::Path;

/// Embedded default configuration template.
const DEFAULT_CONFIG: &str = include_str!("../../environments/transcribe.toml");

/// Embedded secrets template.
const SECRETS_TEMPLATE: &str = include_str!("../../environments/secrets.toml");

/// Creates `config_path` and `secrets_path` from the embedded templates if absent.
///
/// Returns true if anything was written.
///
/// # Errors
/// Returns an error if any file operations fail.
pub fn run_setup(config_path: &Path, secrets_path: &Path) -> anyhow::Result<bool> {
    let mut wrote = false;

    if !config_path.exists() {
        write_with_parent(config_path, DEFAULT_CONFIG)?;
        tracing::info!("Wrote default config to {}", config_path.display());
        wrote = true;
    }

    if !secrets_path.exists() {
        write_with_parent(secrets_path, SECRETS_TEMPLATE)?;
        #[cfg(unix)]
        make_private(secrets_path)?;
        tracing::info!("Wrote secrets template to {}", secrets_path.display());
        wrote = true;
    }

    Ok(wrote)
}

fn write_with_parent(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Restricts a file to its owner on Unix systems.
///
/// # Errors
/// Returns an error if permissions cannot be modified.
#[cfg(unix)]
fn make_private(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o600);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}
