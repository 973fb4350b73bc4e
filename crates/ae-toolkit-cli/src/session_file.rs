//! The signed-in session persisted between CLI invocations.

use std::fs;
use std::path::Path;

use ae_toolkit_core::session::Session;
use ae_toolkit_core::ToolkitError;

pub fn load(path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    if !path.is_file() {
        return Err(ToolkitError::NotAuthenticated.into());
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read session '{}': {}", path.display(), e))?;
    let session: Session = serde_json::from_str(&contents)
        .map_err(|e| format!("Corrupt session file '{}': {}", path.display(), e))?;
    Ok(session)
}

/// Write the session, readable by the owner only on Unix.
pub fn save(path: &Path, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(session)?;
    fs::write(path, json)
        .map_err(|e| format!("Failed to write session '{}': {}", path.display(), e))?;
    restrict_permissions(path)?;
    tracing::debug!(path = %path.display(), staged = session.staged().len(), "session saved");
    Ok(())
}

pub fn remove(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
