use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Files or directories whose presence marks a project directory.
pub const PROJECT_MARKERS: &[&str] = &[
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
    "requirements.txt",
    "package.json",
    "Cargo.toml",
    "go.mod",
    ".git",
    "Makefile",
];

/// Best guess at the project directory for the current process.
pub fn detect_project_root() -> PathBuf {
    match env::current_dir() {
        Ok(cwd) => detect_project_root_from(&cwd),
        Err(err) => {
            debug!(error = %err, "current directory unavailable, using '.'");
            PathBuf::from(".")
        }
    }
}

/// Git top level first, then the nearest ancestor holding a marker, then
/// `start` itself.
pub fn detect_project_root_from(start: &Path) -> PathBuf {
    if let Some(root) = git_toplevel(start) {
        debug!(root = %root.display(), "project root from git");
        return root;
    }
    if let Some(root) = find_marker_root(start) {
        debug!(root = %root.display(), "project root from marker");
        return root;
    }
    debug!(root = %start.display(), "no project marker found, using start directory");
    start.to_path_buf()
}

pub fn git_toplevel(dir: &Path) -> Option<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next()?.trim();
    if line.is_empty() {
        return None;
    }
    let path = PathBuf::from(line);
    path.exists().then_some(path)
}

pub fn find_marker_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| PROJECT_MARKERS.iter().any(|marker| dir.join(marker).exists()))
        .map(Path::to_path_buf)
}
