//! Shutdown behavior of the built binary.
//!
//! An interactive session leaves stdin open and silent for the whole
//! run; these tests reproduce that with a held-open pipe and assert the
//! process still exits promptly once the pipeline is done (or the
//! selection timeout fires) instead of waiting on a pending stdin read.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> ExitStatus {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            panic!("binary still running after {limit:?} with stdin held open");
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

#[test]
fn exits_promptly_after_success_with_stdin_held_open() {
    let tmp = TempDir::new().unwrap();
    let bin = tmp.path().join("bin");
    let work = tmp.path().join("work");
    fs::create_dir(&bin).unwrap();
    fs::create_dir(&work).unwrap();
    fs::write(work.join("doc.pdf"), "%PDF-1.4 stub").unwrap();

    let rasterize = write_stub(
        &bin,
        "rasterize.sh",
        "mkdir -p \"${1%.*}_images\"\necho text > \"${1%.*}_images/p.txt\"",
    );
    let enhance = write_stub(
        &bin,
        "enhance.sh",
        "mkdir -p \"${1}_enhanced\"\ncp \"$1\"/* \"${1}_enhanced\"/",
    );
    let transcribe = write_stub(
        &bin,
        "transcribe.sh",
        "mkdir -p \"${1}_transcriptions\"\ncp \"$1\"/* \"${1}_transcriptions\"/",
    );
    let combine = write_stub(&bin, "combine.sh", "cat \"$1\"/* > transcription.txt");

    let mut child = Command::new(env!("CARGO_BIN_EXE_pdf2txt"))
        .arg(work.join("doc.pdf"))
        .arg("--working-dir")
        .arg(&work)
        .arg("--quiet")
        .arg("--rasterize")
        .arg(&rasterize)
        .arg("--enhance")
        .arg(&enhance)
        .arg("--transcribe")
        .arg(&transcribe)
        .arg("--combine")
        .arg(&combine)
        .env_remove("CI")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // hold the write end open without sending anything, like an idle
    // terminal; the key listener's pending read must not block exit
    let held_stdin = child.stdin.take();
    let status = wait_with_deadline(&mut child, Duration::from_secs(30));
    drop(held_stdin);

    assert!(status.success(), "expected exit 0, got {status:?}");
    assert!(work.join("transcription.txt").is_file());
}

#[test]
fn selection_timeout_exit_is_not_blocked_by_open_stdin() {
    let tmp = TempDir::new().unwrap();
    let work = tmp.path().join("work");
    fs::create_dir(&work).unwrap();
    fs::write(work.join("a.pdf"), "%PDF-1.4 stub").unwrap();
    fs::write(work.join("b.pdf"), "%PDF-1.4 stub").unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_pdf2txt"))
        .arg("--working-dir")
        .arg(&work)
        .arg("--select-timeout")
        .arg("1")
        .env_remove("CI")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let held_stdin = child.stdin.take();
    let status = wait_with_deadline(&mut child, Duration::from_secs(30));
    drop(held_stdin);

    assert_eq!(status.code(), Some(1), "selection abort must exit 1");
}
