//! Security gate: path validation and safe temporary-file handling.
//!
//! Every component reads or writes files only after the gate has approved the
//! path. Checks return `Result<(), String>` where the `Err` string is the
//! human-readable rejection reason; callers decide whether a rejection is
//! fatal (an invalid batch root) or per-file (a failed `ProcessingResult`).
//!
//! ## What is rejected
//!
//! | Check | Reason text |
//! |-------|-------------|
//! | symlink at the given path | `Path is a symbolic link: …` |
//! | `..` component | `Path contains parent directory reference: …` |
//! | missing path | `Path does not exist: …` |
//! | executable-script extension | `File has a potentially dangerous extension: …` |
//! | system directory (outside the temp dir) | `Path is in a sensitive location: …` |
//! | size above the per-extension limit | `File is too large to safely process: …` |
//!
//! Symlinks are rejected unconditionally: following them is the easiest way
//! for a crafted input tree to escape the directory the caller meant to scan.

use crate::config::SecurityConfig;
use rand::RngCore;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Result of a gate check: `Err` carries the rejection reason.
pub type Validation = Result<(), String>;

/// Extensions of executables and scripts that are never processed.
pub const DANGEROUS_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "sh", "bat", "cmd", "app", "js", "vbs", "ps1", "py", "jar", "com", "msi",
    "scr", "php", "asp", "aspx", "cgi", "pl",
];

/// System locations that are never read from or written to.
const SENSITIVE_PATHS: &[&str] = &[
    "/etc",
    "/var",
    "/usr/bin",
    "/usr/sbin",
    "/bin",
    "/sbin",
    "/boot",
    "/proc",
    "/sys",
    "/dev",
    "/System",
    "/Library",
    "/private",
    r"C:\Windows",
    r"C:\Program Files",
];

/// Files below this size are overwritten with random bytes before unlinking.
pub const SECURE_DELETE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Prefix used for temporary files when the caller has no better one.
pub const DEFAULT_TEMP_PREFIX: &str = "textcleaner_";

/// Path validation and temp-file primitives.
///
/// Cheap to clone; holds only the configured size limits.
#[derive(Debug, Clone, Default)]
pub struct SecurityGate {
    limits: SecurityConfig,
}

impl SecurityGate {
    pub fn new(limits: SecurityConfig) -> Self {
        Self { limits }
    }

    /// Validate that `path` exists and is safe to read.
    pub fn validate_path(&self, path: &Path) -> Validation {
        if is_symlink(path) {
            return reject(format!("Path is a symbolic link: {}", path.display()));
        }
        if has_parent_reference(path) {
            return reject(format!(
                "Path contains parent directory reference: {}",
                path.display()
            ));
        }
        if !path.exists() {
            return reject(format!("Path does not exist: {}", path.display()));
        }
        let resolved = path
            .canonicalize()
            .map_err(|e| format!("Error resolving path {}: {}", path.display(), e))?;

        if resolved.is_file() && is_dangerous_extension(&resolved) {
            return reject(format!(
                "File has a potentially dangerous extension: {}",
                resolved.display()
            ));
        }
        check_sensitive_location(&resolved)
    }

    /// Validate that a file is within its per-extension size limit.
    pub fn validate_file_size(&self, path: &Path) -> Validation {
        if !path.is_file() {
            return Ok(());
        }
        let size = fs::metadata(path)
            .map_err(|e| format!("Could not determine file size for {}: {}", path.display(), e))?
            .len();
        let limit = self.limits.limit_bytes(&extension_of(path));
        if size > limit {
            return reject(format!(
                "File is too large to safely process: {} ({} bytes, limit is {} bytes)",
                path.display(),
                size,
                limit
            ));
        }
        Ok(())
    }

    /// Verify read (and optionally write) access by actually opening the file.
    ///
    /// A set executable bit on a data file is logged but not rejected.
    pub fn check_file_permissions(&self, path: &Path, require_write: bool) -> Validation {
        if let Err(e) = fs::File::open(path) {
            return reject(format!("No read permission for file: {} ({})", path.display(), e));
        }
        if require_write {
            if let Err(e) = OpenOptions::new().append(true).open(path) {
                return reject(format!(
                    "No write permission for file: {} ({})",
                    path.display(),
                    e
                ));
            }
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(meta) = fs::metadata(path) {
                if meta.is_file() && meta.permissions().mode() & 0o111 != 0 {
                    warn!("File has executable permission: {}", path.display());
                }
            }
        }
        Ok(())
    }

    /// Everything an input file must pass before a converter opens it.
    pub fn validate_input_file(&self, path: &Path) -> Validation {
        self.validate_path(path)?;
        if !path.is_file() {
            return reject(format!("Path is not a regular file: {}", path.display()));
        }
        self.validate_file_size(path)?;
        self.check_file_permissions(path, false)
    }

    /// Validate an output target, creating missing parent directories.
    ///
    /// The target itself need not exist. When it does, it must not be a
    /// symlink and must be writable.
    pub fn validate_output_path(&self, path: &Path) -> Validation {
        if has_parent_reference(path) {
            return reject(format!(
                "Path contains parent directory reference: {}",
                path.display()
            ));
        }
        if is_symlink(path) {
            return reject(format!("Path is a symbolic link: {}", path.display()));
        }
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| format!("Output path has no file name: {}", path.display()))?;
        if filename
            .chars()
            .any(|c| matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*') || c.is_control())
        {
            return reject(format!(
                "Output filename contains invalid characters: {}",
                filename
            ));
        }

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.exists() {
            fs::create_dir_all(&parent).map_err(|e| {
                format!(
                    "Cannot create directory for output: {}, error: {}",
                    parent.display(),
                    e
                )
            })?;
            debug!("Created output directory {}", parent.display());
        }
        if let Ok(resolved) = parent.canonicalize() {
            check_sensitive_location(&resolved)?;
        }
        if tempfile::NamedTempFile::new_in(&parent).is_err() {
            return reject(format!(
                "No write permission for output directory: {}",
                parent.display()
            ));
        }
        if path.exists() && OpenOptions::new().append(true).open(path).is_err() {
            return reject(format!(
                "Output file exists but is not writable: {}",
                path.display()
            ));
        }
        Ok(())
    }

    /// Create a uniquely named temp file readable only by the current user.
    ///
    /// The file persists until passed to [`SecurityGate::secure_delete_file`].
    pub fn create_secure_temp_file(
        &self,
        prefix: &str,
        suffix: Option<&str>,
    ) -> Result<PathBuf, String> {
        let secure_prefix = format!("{}{:08x}_", prefix, rand::random::<u32>());
        let mut builder = tempfile::Builder::new();
        builder.prefix(&secure_prefix);
        if let Some(s) = suffix {
            builder.suffix(s);
        }
        let file = builder
            .tempfile()
            .map_err(|e| format!("Failed to create temporary file: {}", e))?;
        let (_handle, path) = file
            .keep()
            .map_err(|e| format!("Failed to persist temporary file: {}", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
                .map_err(|e| format!("Failed to restrict temporary file permissions: {}", e))?;
        }
        debug!("Created secure temporary file: {}", path.display());
        Ok(path)
    }

    /// Overwrite (when small enough) and remove a file. Missing files are fine.
    pub fn secure_delete_file(&self, path: &Path) -> Validation {
        if !path.exists() {
            return Ok(());
        }
        let size = fs::metadata(path)
            .map_err(|e| format!("Failed to delete file {}: {}", path.display(), e))?
            .len();
        if size < SECURE_DELETE_THRESHOLD {
            overwrite_with_random(path, size)
                .map_err(|e| format!("Failed to delete file {}: {}", path.display(), e))?;
        }
        fs::remove_file(path).map_err(|e| format!("Failed to delete file {}: {}", path.display(), e))?;
        debug!("Securely deleted file: {}", path.display());
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn reject(reason: String) -> Validation {
    warn!("{}", reason);
    Err(reason)
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

fn has_parent_reference(path: &Path) -> bool {
    path.components().any(|c| c == Component::ParentDir)
}

/// Lowercase extension without the dot; empty when absent.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn is_dangerous_extension(path: &Path) -> bool {
    let ext = extension_of(path);
    DANGEROUS_EXTENSIONS.contains(&ext.as_str())
}

fn check_sensitive_location(resolved: &Path) -> Validation {
    let in_sensitive = SENSITIVE_PATHS
        .iter()
        .any(|root| resolved.starts_with(Path::new(root)));
    if !in_sensitive {
        return Ok(());
    }
    let temp_dir = std::env::temp_dir();
    let temp_dir = temp_dir.canonicalize().unwrap_or(temp_dir);
    if resolved.starts_with(&temp_dir) {
        debug!(
            "Allowing sensitive path in temporary directory: {}",
            resolved.display()
        );
        return Ok(());
    }
    reject(format!(
        "Path is in a sensitive location: {}",
        resolved.display()
    ))
}

fn overwrite_with_random(path: &Path, size: u64) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).open(path)?;
    let mut rng = rand::rng();
    let mut buf = vec![0u8; 64 * 1024];
    let mut remaining = size;
    while remaining > 0 {
        let n = remaining.min(buf.len() as u64) as usize;
        rng.fill_bytes(&mut buf[..n]);
        file.write_all(&buf[..n])?;
        remaining -= n as u64;
    }
    file.sync_all()
}
