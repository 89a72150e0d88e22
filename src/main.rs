// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (C) 2026 Michael Büsch <m@bues.ch>

#![forbid(unsafe_code)]

use crate::{
    config::Config,
    directory::{fetch_accounts, select_endpoint},
    logger::Logger,
    mail::Mailer,
    notify::RunContext,
    template::MessageTemplate,
};
use anyhow::{self as ah, Context as _};
use chrono::Utc;
use clap::Parser;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::{fs, runtime};

#[cfg(any(target_os = "linux", target_os = "android"))]
use crate::systemd::systemd_notify_ready;

mod config;
mod directory;
mod logger;
mod mail;
mod notify;
mod report;
mod template;

#[cfg(any(target_os = "linux", target_os = "android"))]
mod systemd;

#[derive(Parser, Debug, Clone)]
struct Opts {
    /// Override the default path to the configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured mail relay URL (e.g. smtp://relay.example.com:25).
    #[arg(long)]
    relay: Option<String>,

    /// Override the configured lookback window, in days.
    #[arg(long)]
    lookback_days: Option<i64>,

    /// Classify, log and write audit records, but do not hand any mail
    /// to the relay.
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// No systemd notification, even if running under systemd.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[arg(long)]
    no_systemd: bool,

    /// Show version information and exit.
    #[arg(long, short = 'v')]
    version: bool,
}

impl Opts {
    /// Get the configuration path from command line or default.
    pub fn get_config(&self) -> PathBuf {
        if let Some(config) = &self.config {
            config.clone()
        } else {
            Config::get_default_path()
        }
    }
}

async fn async_main(opts: Arc<Opts>) -> ah::Result<()> {
    // Load the configuration file.
    let conf = Config::load(&opts.get_config()).await.context(format!(
        "Load configuration file '{}'",
        opts.get_config().display()
    ))?;

    let now = Utc::now();
    let run_stamp = now.format("%Y%m%d-%H%M%S").to_string();

    // Create the log directory and the run-scoped logger.
    fs::create_dir_all(conf.log().dir()).await.context(format!(
        "Create log directory '{}'",
        conf.log().dir().display()
    ))?;
    let logger = Logger::new(conf.log().dir(), &run_stamp);
    println!("Logging to '{}'.", logger.log_path().display());
    logger
        .log(&format!(
            "pwdnotify {} starting{}.",
            env!("CARGO_PKG_VERSION"),
            if opts.dry_run { " (dry run)" } else { "" }
        ))
        .await;

    // Load the message template.
    let template = match MessageTemplate::load(conf.notify().template()).await {
        Ok(template) => template,
        Err(e) => {
            logger.error(&format!("Template load failed: {e:#}")).await;
            return Err(e);
        }
    };

    // Pick one reachable directory endpoint for this run.
    let endpoint = match select_endpoint(conf.directory(), &logger).await {
        Ok(endpoint) => endpoint,
        Err(e) => {
            logger.error(&format!("Endpoint selection failed: {e}")).await;
            return Err(e).context("Select directory endpoint");
        }
    };
    logger
        .log(&format!("Using directory endpoint {endpoint}."))
        .await;

    // Fetch the accounts. This is the only fatal step of the pipeline.
    let accounts = match fetch_accounts(conf.directory(), &endpoint, now).await {
        Ok(accounts) => accounts,
        Err(e) => {
            logger.error(&format!("Directory query failed: {e}")).await;
            return Err(e).context("Query directory accounts");
        }
    };
    logger
        .log(&format!("Fetched {} account(s).", accounts.len()))
        .await;

    let relay = opts
        .relay
        .as_deref()
        .or_else(|| conf.mail().relay())
        .map(str::to_string);
    let mailer = if opts.dry_run {
        None
    } else {
        Some(Mailer::connect(relay.as_deref()).context("Configure mail transport")?)
    };

    let ctx = RunContext {
        relay,
        from: conf.mail().from().to_string(),
        admin_to: conf.mail().admin_to().to_string(),
        subject: conf.mail().subject().to_string(),
        admin_subject: conf.mail().admin_subject().to_string(),
        lookback_days: opts
            .lookback_days
            .unwrap_or_else(|| conf.notify().lookback_days()),
        dry_run: opts.dry_run,
        run_stamp,
        log_dir: conf.log().dir().to_path_buf(),
        template,
        now,
    };

    let summary = notify::run(&ctx, &logger, mailer.as_ref(), &accounts).await;

    logger.section_break().await;
    logger.log(&format!("{summary}")).await;
    println!("{summary}");
    if summary.send_failures > 0 || summary.audit_failures > 0 || summary.skipped_no_mail > 0 {
        eprintln!(
            "There were per-account failures. See '{}'.",
            logger.err_path().display()
        );
    }

    // Notify systemd that we are ready.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    if !opts.no_systemd {
        systemd_notify_ready(&summary).context("Notify systemd ready")?;
    }

    Ok(())
}

fn main() -> ah::Result<()> {
    let opts = Arc::new(Opts::parse());

    if opts.version {
        println!("pwdnotify version {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    runtime::Builder::new_current_thread()
        .thread_keep_alive(Duration::from_millis(500))
        .max_blocking_threads(16)
        .enable_all()
        .build()
        .context("Tokio runtime builder")?
        .block_on(async_main(opts))
}

// vim: ts=4 sw=4 expandtab
