// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (C) 2026 Michael Büsch <m@bues.ch>

use anyhow::{self as ah, Context as _};
use chrono::{DateTime, Utc};
use std::path::Path;
use tokio::fs;

/// Named substitution slots in the message template. Using fixed delimited
/// tokens keeps plain template text safe from accidental substring hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    DisplayName,
    ExpiryDate,
}

impl Placeholder {
    pub const ALL: [Self; 2] = [Self::DisplayName, Self::ExpiryDate];

    pub fn token(self) -> &'static str {
        match self {
            Self::DisplayName => "{{display_name}}",
            Self::ExpiryDate => "{{expiry_date}}",
        }
    }
}

/// Human-readable expiry date for the message body.
pub fn format_expiry(expires_at: Option<DateTime<Utc>>) -> String {
    match expires_at {
        Some(t) => t.format("%A, %d %B %Y at %H:%M UTC").to_string(),
        None => "unknown".to_string(),
    }
}

/// The per-user HTML message, loaded once at startup.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    text: String,
}

impl MessageTemplate {
    pub fn new(text: String) -> ah::Result<Self> {
        for placeholder in Placeholder::ALL {
            if !text.contains(placeholder.token()) {
                return Err(ah::format_err!(
                    "Message template does not contain the '{}' token",
                    placeholder.token()
                ));
            }
        }
        Ok(Self { text })
    }

    pub async fn load(path: &Path) -> ah::Result<Self> {
        let text = fs::read_to_string(path)
            .await
            .with_context(|| format!("Read message template '{}'", path.display()))?;
        Self::new(text)
    }

    pub fn render(&self, display_name: &str, expires_at: Option<DateTime<Utc>>) -> String {
        let mut body = self.text.clone();
        for placeholder in Placeholder::ALL {
            let value = match placeholder {
                Placeholder::DisplayName => display_name.to_string(),
                Placeholder::ExpiryDate => format_expiry(expires_at),
            };
            body = body.replace(placeholder.token(), &value);
        }
        body
    }
}


// vim: ts=4 sw=4 expandtab
