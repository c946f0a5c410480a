//! Path disambiguation and re-discovery.
//!
//! Every stage tool writes its output next to its input under a
//! predictable name, and disambiguates with a `_N` suffix when that name
//! is already taken. The orchestrator therefore needs two mirror-image
//! operations:
//!
//! * [`unique_path`]: given a desired path, find the first non-colliding
//!   `_N` variant. Probe-only: nothing is ever created here.
//! * [`resolve_actual_output`]: given the path a stage was *expected* to
//!   produce, find what it actually produced. The exact expected path
//!   wins when present; otherwise the lowest-numbered `_N` sibling is
//!   taken. Keeping this one well-tested pure function avoids scattering
//!   directory-name pattern matching through the orchestrator.
//!
//! Both treat a path with a file extension as a file (`name_N.ext`) and
//! everything else as a directory (`name_N`).

use std::path::{Path, PathBuf};

/// Return `base` if it does not exist, otherwise the first `_N`-suffixed
/// sibling (N starting at 1) that does not exist.
///
/// Deterministic and side-effect-free: only existence is probed. The
/// counter is unbounded but terminates as soon as a free slot is found,
/// so it is practically bounded by the number of existing entries.
pub fn unique_path(base: &Path) -> PathBuf {
    if !base.exists() {
        return base.to_path_buf();
    }
    let mut counter = 1u32;
    loop {
        let candidate = numbered_sibling(base, counter);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Locate the output a stage actually produced, given the path it was
/// expected to produce.
///
/// Preference order: the exact expected path if present, then the
/// lowest-numbered `_N` sibling. When the expected path names a
/// directory (no extension) only directories are considered; when it
/// names a file only files are. If nothing matches, the expected path is
/// returned unchanged and the caller's existence check will fail.
pub fn resolve_actual_output(expected: &Path) -> PathBuf {
    if expected.exists() {
        return expected.to_path_buf();
    }

    let parent = match expected.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let ext = expected.extension().map(|e| e.to_string_lossy().to_string());
    let stem = match ext {
        Some(_) => expected.file_stem(),
        None => expected.file_name(),
    };
    let Some(stem) = stem.map(|s| s.to_string_lossy().to_string()) else {
        return expected.to_path_buf();
    };

    let Ok(entries) = std::fs::read_dir(&parent) else {
        return expected.to_path_buf();
    };

    let mut best: Option<(u32, PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        match ext {
            Some(ref ext) => {
                if !path.is_file() {
                    continue;
                }
                if path.extension().map(|e| e.to_string_lossy().to_string()).as_deref()
                    != Some(ext.as_str())
                {
                    continue;
                }
            }
            None => {
                if !path.is_dir() {
                    continue;
                }
            }
        }
        let name = match ext {
            Some(_) => path.file_stem().map(|s| s.to_string_lossy().to_string()),
            None => path.file_name().map(|s| s.to_string_lossy().to_string()),
        };
        let Some(name) = name else { continue };
        let Some(n) = parse_suffix(&name, &stem) else { continue };
        match best {
            Some((lowest, _)) if lowest <= n => {}
            _ => best = Some((n, path)),
        }
    }

    best.map(|(_, p)| p).unwrap_or_else(|| expected.to_path_buf())
}

/// Build `name_N` (or `name_N.ext` when `base` carries an extension).
fn numbered_sibling(base: &Path, n: u32) -> PathBuf {
    let parent = base.parent().map(Path::to_path_buf).unwrap_or_default();
    if let (Some(stem), Some(ext)) = (base.file_stem(), base.extension()) {
        parent.join(format!(
            "{}_{n}.{}",
            stem.to_string_lossy(),
            ext.to_string_lossy()
        ))
    } else {
        let name = base
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        parent.join(format!("{name}_{n}"))
    }
}

/// Parse `N` out of `{stem}_{N}`. Returns None unless the remainder after
/// `{stem}_` is all digits.
fn parse_suffix(name: &str, stem: &str) -> Option<u32> {
    let rest = name.strip_prefix(stem)?.strip_prefix('_')?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}
