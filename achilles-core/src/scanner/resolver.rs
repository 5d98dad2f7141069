use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{ResolveError, ScanError};

/// Extracts the direct run-time shared-library dependencies of a file
pub trait DependencyResolver: Send + Sync {
    /// Dependencies in resolver order. Any error means "no dependencies".
    fn resolve(&self, path: &Path) -> Result<Vec<PathBuf>, ResolveError>;
}

/// Resolver backed by the system `ldd`
#[derive(Debug, Clone)]
pub struct LddResolver {
    program: PathBuf,
}

impl LddResolver {
    /// Locate `ldd` on `PATH`
    pub fn new() -> crate::Result<Self> {
        which::which("ldd")
            .map(Self::with_program)
            .map_err(|e| ScanError::ResolverUnavailable(format!("ldd: {e}")))
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl DependencyResolver for LddResolver {
    fn resolve(&self, path: &Path) -> Result<Vec<PathBuf>, ResolveError> {
        let output = Command::new(&self.program)
            .arg(path)
            .output()
            .map_err(|source| ResolveError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            if is_not_dynamic(&stdout) || is_not_dynamic(&stderr) {
                return Err(ResolveError::NotDynamic(path.to_path_buf()));
            }
            return Err(ResolveError::Failed {
                path: path.to_path_buf(),
                message: stderr.trim().to_string(),
            });
        }

        let dependencies = parse_ldd_output(&stdout);
        if dependencies.is_empty() && is_not_dynamic(&stdout) {
            return Err(ResolveError::NotDynamic(path.to_path_buf()));
        }
        Ok(dependencies)
    }
}

fn is_not_dynamic(text: &str) -> bool {
    text.contains("not a dynamic executable") || text.contains("statically linked")
}

/// Parse `ldd` output into the absolute paths it reports.
///
/// Handles `name => /path (0x..)`, bare `/path (0x..)` (the program
/// interpreter) and drops `name => not found` and vDSO lines.
pub fn parse_ldd_output(output: &str) -> Vec<PathBuf> {
    output.lines().filter_map(parse_ldd_line).collect()
}

fn parse_ldd_line(line: &str) -> Option<PathBuf> {
    let line = line.trim();
    let target = match line.split_once("=>") {
        Some((_, rhs)) => rhs.trim(),
        None => line,
    };
    let path = target.split(" (").next()?.trim();
    path.starts_with('/').then(|| PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LDD_OUTPUT: &str = "\
\tlinux-vdso.so.1 (0x00007ffc2d5f2000)
\tlibselinux.so.1 => /lib/x86_64-linux-gnu/libselinux.so.1 (0x00007f0c8a1c0000)
\tlibmissing.so.3 => not found
\tlibc.so.6 => /lib/x86_64-linux-gnu/libc.so.6 (0x00007f0c89e00000)
\t/lib64/ld-linux-x86-64.so.2 (0x00007f0c8a230000)
";

    #[test]
    fn test_parse_ldd_output() {
        assert_eq!(
            parse_ldd_output(LDD_OUTPUT),
            [
                PathBuf::from("/lib/x86_64-linux-gnu/libselinux.so.1"),
                PathBuf::from("/lib/x86_64-linux-gnu/libc.so.6"),
                PathBuf::from("/lib64/ld-linux-x86-64.so.2"),
            ]
        );
    }

    #[test]
    fn test_parse_ignores_noise() {
        assert!(parse_ldd_output("\tstatically linked\n").is_empty());
        assert!(parse_ldd_output("\tlinux-gate.so.1 =>  (0xb7f0f000)\n").is_empty());
        assert!(parse_ldd_output("").is_empty());
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let resolver = LddResolver::with_program("/nonexistent/ldd");
        let err = resolver.resolve(Path::new("/bin/sh")).unwrap_err();
        assert!(matches!(err, ResolveError::Io { .. }));
    }

    #[test]
    fn test_system_ldd_on_text_file() {
        let Ok(resolver) = LddResolver::new() else {
            return;
        };
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "just text\n").unwrap();
        assert!(resolver.resolve(temp.path()).is_err());
    }
}
