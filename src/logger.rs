// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (C) 2026 Michael Büsch <m@bues.ch>

use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::{fs::OpenOptions, io::AsyncWriteExt as _};

const MINOR_BREAK: &str = "----------------------------------------";

/// Run-scoped log writer.
///
/// Writes are best-effort: a failed write is reported on stderr and the run
/// continues. Logging never aborts business logic.
#[derive(Debug, Clone)]
pub struct Logger {
    log_path: PathBuf,
    err_path: PathBuf,
}

impl Logger {
    pub fn new(dir: &Path, run_stamp: &str) -> Self {
        Self {
            log_path: dir.join(format!("pwdnotify-{run_stamp}.log")),
            err_path: dir.join(format!("pwdnotify-{run_stamp}.err.log")),
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn err_path(&self) -> &Path {
        &self.err_path
    }

    async fn append(path: &Path, text: &str) {
        let res = async {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await?;
            file.write_all(text.as_bytes()).await
        }
        .await;
        if let Err(e) = res {
            eprintln!("Failed to write log file '{}': {}", path.display(), e);
        }
    }

    fn stamped(msg: &str) -> String {
        format!("[{}] {}\n", Utc::now().format("%+"), msg)
    }

    /// Write a timestamped line to the primary log.
    pub async fn log(&self, msg: &str) {
        Self::append(&self.log_path, &Self::stamped(msg)).await;
    }

    /// Write a timestamped line to the primary log and the error log.
    pub async fn error(&self, msg: &str) {
        let line = Self::stamped(msg);
        Self::append(&self.log_path, &line).await;
        Self::append(&self.err_path, &line).await;
    }

    /// Three blank lines in the primary log. Visual separator, no timestamp.
    pub async fn section_break(&self) {
        Self::append(&self.log_path, "\n\n\n").await;
    }

    /// Timestamped divider line in the primary log.
    pub async fn minor_break(&self) {
        Self::append(&self.log_path, &Self::stamped(MINOR_BREAK)).await;
    }
}


// vim: ts=4 sw=4 expandtab
