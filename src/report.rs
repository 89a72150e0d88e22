// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (C) 2026 Michael Büsch <m@bues.ch>

use crate::directory::Account;
use chrono::{DateTime, Utc};
use itertools::Itertools as _;

pub mod html;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredEntry {
    pub name: String,
    pub pwd_last_set: Option<DateTime<Utc>>,
    pub expired: bool,
}

/// The once-per-run summary of accounts whose password is already expired.
/// Rendered as an HTML table and mailed to the administrative mailbox.
#[derive(Debug, Clone)]
pub struct ExpiredAccountReport {
    stamp: DateTime<Utc>,
    entries: Vec<ExpiredEntry>,
}

impl ExpiredAccountReport {
    pub fn new<'a>(stamp: DateTime<Utc>, accounts: impl IntoIterator<Item = &'a Account>) -> Self {
        let entries = accounts
            .into_iter()
            .map(|account| ExpiredEntry {
                name: account.name.clone(),
                pwd_last_set: account.pwd_last_set,
                expired: account.expired,
            })
            .sorted_by(|a, b| a.name.cmp(&b.name))
            .collect();
        Self { stamp, entries }
    }

    pub fn entries(&self) -> &[ExpiredEntry] {
        &self.entries
    }

    fn last_set_column(entry: &ExpiredEntry) -> String {
        match entry.pwd_last_set {
            Some(t) => t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => "never".to_string(),
        }
    }

    pub fn to_html(&self) -> String {
        let mut table = String::with_capacity(256 + self.entries.len() * 96);
        table.push_str("<table>\n");
        table.push_str("<tr><th>Account</th><th>Password last set</th><th>Expired</th></tr>\n");
        for entry in &self.entries {
            table.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                html::escape(&entry.name),
                Self::last_set_column(entry),
                if entry.expired { "yes" } else { "no" },
            ));
        }
        table.push_str("</table>");

        let fragment = format!(
            "<p>Run of {}: {} account(s) with an expired password.</p>\n{}",
            self.stamp.format("%+"),
            self.entries.len(),
            html::band_rows(&table),
        );
        html::wrap_document("Expired account report", &fragment)
    }
}


// vim: ts=4 sw=4 expandtab
