// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (C) 2026 Michael Büsch <m@bues.ch>

use crate::notify::RunSummary;
use anyhow as ah;

/// Notify ready-status to systemd and show the run outcome as unit status.
pub fn systemd_notify_ready(summary: &RunSummary) -> ah::Result<()> {
    let status = format!(
        "notified {} user(s), {} expired",
        summary.notified, summary.expired
    );
    sd_notify::notify(
        false,
        &[
            sd_notify::NotifyState::Ready,
            sd_notify::NotifyState::Status(&status),
        ],
    )?;
    Ok(())
}

// vim: ts=4 sw=4 expandtab
