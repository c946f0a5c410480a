//! Intermediate-artifact tracking and cleanup.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Records the intermediate outputs a run has produced so they can be
/// removed in one sweep at the end.
///
/// Cleanup is best-effort and idempotent: entries that are already gone
/// are skipped silently, removal errors are logged and never interrupt
/// the sweep, and calling [`cleanup_all`](Self::cleanup_all) twice is
/// harmless. The final text artifact is never tracked here.
#[derive(Debug, Default)]
pub struct ArtifactTracker {
    tracked: Vec<PathBuf>,
    env_dir: Option<PathBuf>,
}

impl ArtifactTracker {
    pub fn new(env_dir: Option<PathBuf>) -> Self {
        Self {
            tracked: Vec::new(),
            env_dir,
        }
    }

    /// Register an intermediate output. Duplicates are ignored.
    pub fn track(&mut self, path: PathBuf) {
        if !self.tracked.contains(&path) {
            debug!(path = %path.display(), "tracking intermediate artifact");
            self.tracked.push(path);
        }
    }

    /// Paths registered so far, in creation order.
    pub fn tracked(&self) -> &[PathBuf] {
        &self.tracked
    }

    /// Remove every tracked artifact plus the environment directory.
    /// With `retain` set, everything is left in place.
    pub fn cleanup_all(&mut self, retain: bool) {
        if retain {
            debug!("keeping intermediate artifacts on request");
            return;
        }
        let dirs: Vec<PathBuf> = self
            .tracked
            .drain(..)
            .chain(self.env_dir.take())
            .collect();
        for dir in dirs {
            remove_entry(&dir);
        }
    }
}

fn remove_entry(path: &Path) {
    if !path.exists() {
        return;
    }
    let removed = if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    match removed {
        Ok(()) => debug!(path = %path.display(), "removed intermediate artifact"),
        Err(err) => warn!(path = %path.display(), %err, "failed to remove artifact"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn cleanup_removes_tracked_directories() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("doc_images");
        let b = tmp.path().join("doc_images_enhanced");
        fs::create_dir(&a).unwrap();
        fs::create_dir(&b).unwrap();
        fs::write(a.join("page.png"), "x").unwrap();

        let mut tracker = ArtifactTracker::new(None);
        tracker.track(a.clone());
        tracker.track(b.clone());
        tracker.cleanup_all(false);

        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn retain_keeps_everything() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("doc_images");
        fs::create_dir(&a).unwrap();

        let mut tracker = ArtifactTracker::new(None);
        tracker.track(a.clone());
        tracker.cleanup_all(true);
        assert!(a.exists());

        // a later non-retaining sweep still removes it
        tracker.cleanup_all(false);
        assert!(!a.exists());
    }

    #[test]
    fn cleanup_is_idempotent_and_skips_missing() {
        let tmp = TempDir::new().unwrap();
        let gone = tmp.path().join("never_created");
        let real = tmp.path().join("doc_images");
        fs::create_dir(&real).unwrap();

        let mut tracker = ArtifactTracker::new(None);
        tracker.track(gone);
        tracker.track(real.clone());
        tracker.cleanup_all(false);
        tracker.cleanup_all(false);
        assert!(!real.exists());
    }

    #[test]
    fn env_dir_is_removed_with_the_artifacts() {
        let tmp = TempDir::new().unwrap();
        let env = tmp.path().join("venv");
        fs::create_dir(&env).unwrap();

        let mut tracker = ArtifactTracker::new(Some(env.clone()));
        tracker.cleanup_all(false);
        assert!(!env.exists());
    }

    #[test]
    fn duplicate_tracking_is_ignored() {
        let mut tracker = ArtifactTracker::new(None);
        tracker.track(PathBuf::from("/tmp/x_images"));
        tracker.track(PathBuf::from("/tmp/x_images"));
        assert_eq!(tracker.tracked().len(), 1);
    }
}
