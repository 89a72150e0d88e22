// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (C) 2026 Michael Büsch <m@bues.ch>

use anyhow::{self as ah};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[cfg(not(target_os = "windows"))]
const CONF_PATH: &str = "etc/pwdnotify/pwdnotify.conf";
#[cfg(target_os = "windows")]
const CONF_PATH: &str = "pwdnotify.conf";

const DEFAULT_LDAP_PORT: u16 = 389;
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 250;
const DEFAULT_LOOKBACK_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDirectory {
    domain: String,
    site: Option<String>,
    hosts: Option<Vec<String>>,
    port: Option<u16>,
    probe_timeout_ms: Option<u64>,
    base_dn: String,
    bind_dn: Option<String>,
    bind_password: Option<String>,
}

impl ConfigDirectory {
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn site(&self) -> Option<&str> {
        self.site.as_deref()
    }

    /// Static endpoint list. When configured, SRV discovery is skipped.
    pub fn hosts(&self) -> &[String] {
        self.hosts.as_deref().unwrap_or(&[])
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_LDAP_PORT)
    }

    pub fn probe_timeout_ms(&self) -> u64 {
        self.probe_timeout_ms.unwrap_or(DEFAULT_PROBE_TIMEOUT_MS)
    }

    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    pub fn bind_dn(&self) -> Option<&str> {
        self.bind_dn.as_deref()
    }

    pub fn bind_password(&self) -> Option<&str> {
        self.bind_password.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMail {
    relay: Option<String>,
    from: String,
    admin_to: String,
    subject: Option<String>,
    admin_subject: Option<String>,
}

impl ConfigMail {
    pub fn relay(&self) -> Option<&str> {
        self.relay.as_deref()
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn admin_to(&self) -> &str {
        &self.admin_to
    }

    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or("Password expiry notice")
    }

    pub fn admin_subject(&self) -> &str {
        self.admin_subject
            .as_deref()
            .unwrap_or("Expired account report")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigNotify {
    lookback_days: Option<i64>,
    template: PathBuf,
}

impl ConfigNotify {
    pub fn lookback_days(&self) -> i64 {
        self.lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS)
    }

    pub fn template(&self) -> &Path {
        &self.template
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigLog {
    dir: PathBuf,
}

impl ConfigLog {
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    directory: ConfigDirectory,
    mail: ConfigMail,
    notify: ConfigNotify,
    log: ConfigLog,
}

impl Config {
    pub fn directory(&self) -> &ConfigDirectory {
        &self.directory
    }

    pub fn mail(&self) -> &ConfigMail {
        &self.mail
    }

    pub fn notify(&self) -> &ConfigNotify {
        &self.notify
    }

    pub fn log(&self) -> &ConfigLog {
        &self.log
    }
}

impl Config {
    pub fn get_default_path() -> PathBuf {
        // The build-time environment variable PWDNOTIFY_CONF_PREFIX can be
        // used to give an additional prefix.
        let prefix = match option_env!("PWDNOTIFY_CONF_PREFIX") {
            Some(env_prefix) => env_prefix,
            None => {
                #[cfg(not(target_os = "windows"))]
                let prefix = "/";
                #[cfg(target_os = "windows")]
                let prefix = "";
                prefix
            }
        };

        let mut path = PathBuf::new();
        path.push(prefix);
        path.push(CONF_PATH);

        path
    }

    pub async fn load(path: &Path) -> ah::Result<Self> {
        let content = fs::read_to_string(path).await?;
        let conf = toml::from_str(&content)?;
        Ok(conf)
    }
}


// vim: ts=4 sw=4 expandtab
