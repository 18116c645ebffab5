//! Up-to-date checks based on file modification times
//!
//! A task is up to date when the oldest file matched by `generates` is
//! strictly newer than the newest file matched by `sources`. Any failure
//! while matching or reading timestamps counts as "not up to date".

use crate::runner::Task;
use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
enum FreshnessError {
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error(transparent)]
    Glob(#[from] glob::GlobError),

    #[error("cannot read modification time of {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Whether `task` may be skipped, with patterns resolved against `base_dir`
pub fn is_up_to_date(task: &Task, base_dir: &Path) -> bool {
    if task.sources.is_empty() || task.generates.is_empty() {
        return false;
    }

    let newest_source = match modification_times(&task.sources, base_dir) {
        Ok(times) => times.into_iter().max(),
        Err(e) => {
            tracing::debug!(error = %e, "freshness check failed on sources");
            return false;
        }
    };

    let oldest_generated = match modification_times(&task.generates, base_dir) {
        Ok(times) => times.into_iter().min(),
        Err(e) => {
            tracing::debug!(error = %e, "freshness check failed on generates");
            return false;
        }
    };

    match (newest_source, oldest_generated) {
        (Some(source), Some(generated)) => generated > source,
        _ => false,
    }
}

/// Modification times of every path matched by any of `patterns`
fn modification_times(patterns: &[String], base_dir: &Path) -> Result<Vec<SystemTime>, FreshnessError> {
    let mut times = Vec::new();

    for pattern in patterns {
        let full = anchor_pattern(pattern, base_dir);
        let paths = glob::glob(&full).map_err(|source| FreshnessError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;

        for path in paths {
            let path = path?;
            let modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .map_err(|source| FreshnessError::Metadata {
                    path: path.clone(),
                    source,
                })?;
            times.push(modified);
        }
    }

    Ok(times)
}

/// Make a relative pattern relative to `base_dir` instead of the process cwd
fn anchor_pattern(pattern: &str, base_dir: &Path) -> String {
    if Path::new(pattern).is_absolute() {
        return pattern.to_string();
    }
    let base = Pattern::escape(&base_dir.to_string_lossy());
    format!("{}/{}", base.trim_end_matches('/'), pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, age: Duration) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    fn task(sources: &[&str], generates: &[&str]) -> Task {
        Task {
            sources: sources.iter().map(|s| s.to_string()).collect(),
            generates: generates.iter().map(|s| s.to_string()).collect(),
            ..Task::default()
        }
    }

    #[test]
    fn test_empty_patterns_always_run() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.src", Duration::from_secs(100));
        touch(dir.path(), "a.out", Duration::from_secs(1));

        assert!(!is_up_to_date(&task(&[], &["*.out"]), dir.path()));
        assert!(!is_up_to_date(&task(&["*.src"], &[]), dir.path()));
    }

    #[test]
    fn test_outputs_newer_than_sources() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/a.c", Duration::from_secs(100));
        touch(dir.path(), "src/b.c", Duration::from_secs(50));
        touch(dir.path(), "out/app", Duration::from_secs(10));

        assert!(is_up_to_date(&task(&["src/*.c"], &["out/*"]), dir.path()));
    }

    #[test]
    fn test_one_stale_output_makes_task_stale() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "main.c", Duration::from_secs(50));
        touch(dir.path(), "fresh.o", Duration::from_secs(10));
        touch(dir.path(), "stale.o", Duration::from_secs(100));

        assert!(!is_up_to_date(&task(&["*.c"], &["*.o"]), dir.path()));
    }

    #[test]
    fn test_source_newer_than_output() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "main.c", Duration::from_secs(10));
        touch(dir.path(), "main.o", Duration::from_secs(100));

        assert!(!is_up_to_date(&task(&["*.c"], &["*.o"]), dir.path()));
    }

    #[test]
    fn test_equal_times_are_stale() {
        let dir = TempDir::new().unwrap();
        let when = SystemTime::now() - Duration::from_secs(30);
        File::create(dir.path().join("in.txt")).unwrap().set_modified(when).unwrap();
        File::create(dir.path().join("out.txt")).unwrap().set_modified(when).unwrap();

        assert!(!is_up_to_date(&task(&["in.txt"], &["out.txt"]), dir.path()));
    }

    #[test]
    fn test_no_matches_is_stale() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "main.c", Duration::from_secs(100));

        assert!(!is_up_to_date(&task(&["*.c"], &["*.o"]), dir.path()));
        assert!(!is_up_to_date(&task(&["*.h"], &["*.c"]), dir.path()));
    }

    #[test]
    fn test_invalid_pattern_is_stale() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "main.c", Duration::from_secs(100));
        touch(dir.path(), "main.o", Duration::from_secs(10));

        assert!(!is_up_to_date(&task(&["[unclosed"], &["*.o"]), dir.path()));
    }

    #[test]
    fn test_anchor_pattern() {
        assert_eq!(anchor_pattern("src/*.rs", Path::new("/work")), "/work/src/*.rs");
        assert_eq!(anchor_pattern("/abs/*.rs", Path::new("/work")), "/abs/*.rs");
        assert_eq!(anchor_pattern("*.rs", Path::new("/we[ird]")), "/we[[]ird[]]/*.rs");
    }
}
