use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const PROGRAM: &str = "karasu";

/// Falls back to the bare program name so spawning reports it missing.
#[derive(Clone, Debug)]
pub struct ExecutableResolver {
    program: String,
    explicit: Option<PathBuf>,
    fallback_dirs: Vec<PathBuf>,
}

impl ExecutableResolver {
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self::with_fallback_dirs(PROGRAM, explicit, default_fallback_dirs())
    }

    pub fn with_fallback_dirs(
        program: &str,
        explicit: Option<PathBuf>,
        fallback_dirs: Vec<PathBuf>,
    ) -> Self {
        Self {
            program: program.to_owned(),
            explicit,
            fallback_dirs,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.explicit {
            return path.clone();
        }

        if let Ok(path) = which::which(&self.program)
            && path.exists()
        {
            debug!(path = %path.display(), "resolved {} from search path", self.program);
            return path;
        }

        let file_name = executable_file_name(&self.program);
        if let Some(path) = probe_dirs(&self.fallback_dirs, &file_name) {
            debug!(path = %path.display(), "resolved {} from fallback directory", self.program);
            return path;
        }

        debug!("{} not found, deferring to spawn", self.program);
        PathBuf::from(&self.program)
    }
}

fn probe_dirs(dirs: &[PathBuf], file_name: &str) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(file_name))
        .find(|candidate| candidate.is_file())
}

fn executable_file_name(program: &str) -> String {
    if cfg!(windows) && Path::new(program).extension().is_none() {
        format!("{program}.exe")
    } else {
        program.to_owned()
    }
}

fn default_fallback_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(prefix) = env::var_os("HOMEBREW_PREFIX") {
        dirs.push(PathBuf::from(prefix).join("bin"));
    }
    dirs.push(PathBuf::from("/opt/homebrew/bin"));
    dirs.push(PathBuf::from("/usr/local/bin"));
    if let Some(home) = env::var_os("HOME") {
        dirs.push(PathBuf::from(home).join(".local").join("bin"));
    }
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MISSING: &str = "karasu-mcp-test-no-such-program";

    #[test]
    fn explicit_path_is_used_verbatim() {
        let explicit = PathBuf::from("/somewhere/else/karasu");
        let resolver = ExecutableResolver::with_fallback_dirs(PROGRAM, Some(explicit.clone()), vec![]);
        assert_eq!(resolver.resolve(), explicit);
    }

    #[test]
    fn fallback_directories_are_probed_in_order() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        let third = temp.path().join("third");
        for dir in [&first, &second, &third] {
            fs::create_dir_all(dir).expect("create dir");
        }
        let file_name = executable_file_name(MISSING);
        fs::write(second.join(&file_name), "").expect("write second");
        fs::write(third.join(&file_name), "").expect("write third");

        let resolver = ExecutableResolver::with_fallback_dirs(
            MISSING,
            None,
            vec![first, second.clone(), third],
        );
        assert_eq!(resolver.resolve(), second.join(file_name));
    }

    #[test]
    fn missing_program_resolves_to_bare_name() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let resolver =
            ExecutableResolver::with_fallback_dirs(MISSING, None, vec![temp.path().to_path_buf()]);
        assert_eq!(resolver.resolve(), PathBuf::from(MISSING));
    }

    #[test]
    fn default_fallbacks_include_well_known_prefixes() {
        let dirs = default_fallback_dirs();
        assert!(dirs.contains(&PathBuf::from("/opt/homebrew/bin")));
        assert!(dirs.contains(&PathBuf::from("/usr/local/bin")));
    }
}
