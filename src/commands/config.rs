//! Configuration file editor command.
//!
//! Opens the transcribe configuration file in the user's preferred editor.

use std::path::Path;
use std::process::Command;

/// Opens the configuration file in the user's preferred editor.
///
/// Tries editors in this order:
/// 1. $EDITOR environment variable
/// 2. nano
/// 3. vi
///
/// # Errors
/// - If no editor can be found or executed
pub fn handle_config(config_path: &Path) -> anyhow::Result<()> {
    tracing::info!("Opening config file: {}", config_path.display());

    let editor = find_editor()?;
    tracing::debug!("Using editor: {}", editor);

    let status = Command::new(&editor)
        .arg(config_path)
        .status()
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to open editor '{editor}': {e}. Make sure the editor is installed and accessible."
            )
        })?;

    if !status.success() {
        return Err(anyhow::anyhow!(
            "Editor exited with error code: {}",
            status.code().unwrap_or(-1)
        ));
    }

    tracing::info!("Config file edited successfully");
    Ok(())
}

fn find_editor() -> anyhow::Result<String> {
    if let Some(editor) = std::env::var("EDITOR").ok().filter(|e| !e.trim().is_empty()) {
        return Ok(editor);
    }

    ["nano", "vi"]
        .iter()
        .find(|editor| is_editor_available(editor))
        .map(|editor| editor.to_string())
        .ok_or_else(|| anyhow::anyhow!("No editor found. Please set the $EDITOR environment variable."))
}

/// Checks if an editor is available in the system PATH.
fn is_editor_available(editor: &str) -> bool {
    Command::new("which")
        .arg(editor)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
