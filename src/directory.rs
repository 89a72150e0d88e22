// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (C) 2026 Michael Büsch <m@bues.ch>

use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod endpoint;
pub mod search;

pub use endpoint::{Endpoint, select_endpoint};
pub use search::fetch_accounts;

/// Offset between the Windows FILETIME epoch (1601-01-01) and the Unix epoch.
const FILETIME_UNIX_DIFF_SECS: i64 = 11_644_473_600;
const FILETIME_TICKS_PER_SEC: i64 = 10_000_000;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("no directory endpoints advertised for '{name}'")]
    NoCandidates { name: String },

    #[error("endpoint discovery for '{name}' failed: {source}")]
    Discovery {
        name: String,
        source: trust_dns_resolver::error::ResolveError,
    },

    #[error("none of the {candidates} candidate endpoint(s) accepted a connection")]
    NoReachableEndpoint { candidates: usize },

    #[error("directory entry '{dn}' is missing required attribute '{attribute}'")]
    MissingAttribute {
        dn: String,
        attribute: &'static str,
    },

    #[error("LDAP operation failed: {0}")]
    Ldap(#[from] ldap3::LdapError),
}

/// One user account as fetched from the directory. Read-only for the whole
/// run. Accounts whose password never expires are excluded server-side and
/// never reach this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub pwd_last_set: Option<DateTime<Utc>>,
    pub expired: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Name to address the user by in rendered messages.
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Convert a raw Windows FILETIME value (100 ns ticks since 1601-01-01 UTC)
/// to a UTC timestamp. `0` and `i64::MAX` are directory sentinels for
/// "not set" / "never".
pub fn filetime_to_utc(raw: i64) -> Option<DateTime<Utc>> {
    if raw <= 0 || raw == i64::MAX {
        return None;
    }
    let secs = raw / FILETIME_TICKS_PER_SEC - FILETIME_UNIX_DIFF_SECS;
    let nanos = u32::try_from((raw % FILETIME_TICKS_PER_SEC) * 100).ok()?;
    DateTime::from_timestamp(secs, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filetime_unix_epoch() {
        let ts = filetime_to_utc(116_444_736_000_000_000).unwrap();
        assert_eq!(ts, DateTime::from_timestamp(0, 0).unwrap());
    }

    #[test]
    fn filetime_modern_date() {
        // 2024-01-01T00:00:00Z
        let ts = filetime_to_utc(133_485_408_000_000_000).unwrap();
        assert_eq!(ts, DateTime::from_timestamp(1_704_067_200, 0).unwrap());
    }

    #[test]
    fn filetime_subsecond_ticks() {
        let ts = filetime_to_utc(116_444_736_000_000_001).unwrap();
        assert_eq!(ts, DateTime::from_timestamp(0, 100).unwrap());
    }

    #[test]
    fn filetime_sentinels() {
        assert!(filetime_to_utc(0).is_none());
        assert!(filetime_to_utc(-1).is_none());
        assert!(filetime_to_utc(i64::MAX).is_none());
    }

    #[test]
    fn display_falls_back_to_name() {
        let mut account = Account {
            name: "jsmith".to_string(),
            display_name: None,
            mail: None,
            pwd_last_set: None,
            expired: false,
            expires_at: None,
        };
        assert_eq!(account.display(), "jsmith");
        account.display_name = Some("John Smith".to_string());
        assert_eq!(account.display(), "John Smith");
    }
}

// vim: ts=4 sw=4 expandtab
