// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (C) 2026 Michael Büsch <m@bues.ch>

use crate::{
    config::ConfigDirectory,
    directory::{Account, DirectoryError, Endpoint, filetime_to_utc},
};
use chrono::{DateTime, Utc};
use ldap3::{LdapConnAsync, Scope, SearchEntry};

const ATTR_NAME: &str = "sAMAccountName";
const ATTR_DISPLAY_NAME: &str = "displayName";
const ATTR_MAIL: &str = "mail";
const ATTR_PWD_LAST_SET: &str = "pwdLastSet";
const ATTR_UAC_COMPUTED: &str = "msDS-User-Account-Control-Computed";
const ATTR_EXPIRY_COMPUTED: &str = "msDS-UserPasswordExpiryTimeComputed";

const UF_ACCOUNTDISABLE: u32 = 0x2;
const UF_DONT_EXPIRE_PASSWD: u32 = 0x1_0000;
const UF_PASSWORD_EXPIRED: u32 = 0x80_0000;

/// Matching rule OID for bitwise AND on userAccountControl.
const MATCHING_RULE_BIT_AND: &str = "1.2.840.113556.1.4.803";

/// Server-side filter: user objects, not disabled, password not set to
/// never expire. Excluded accounts never enter classification at all.
fn search_filter() -> String {
    format!(
        "(&(objectClass=user)(objectCategory=person)\
         (!(userAccountControl:{MATCHING_RULE_BIT_AND}:={UF_ACCOUNTDISABLE}))\
         (!(userAccountControl:{MATCHING_RULE_BIT_AND}:={UF_DONT_EXPIRE_PASSWD})))"
    )
}

fn attr_first<'a>(entry: &'a SearchEntry, attr: &str) -> Option<&'a str> {
    entry.attrs.get(attr).and_then(|v| v.first()).map(String::as_str)
}

fn attr_filetime(entry: &SearchEntry, attr: &str) -> Option<DateTime<Utc>> {
    attr_first(entry, attr)
        .and_then(|raw| raw.parse::<i64>().ok())
        .and_then(filetime_to_utc)
}

fn parse_entry(entry: &SearchEntry, now: DateTime<Utc>) -> Result<Account, DirectoryError> {
    let Some(name) = attr_first(entry, ATTR_NAME) else {
        return Err(DirectoryError::MissingAttribute {
            dn: entry.dn.clone(),
            attribute: ATTR_NAME,
        });
    };

    let expires_at = attr_filetime(entry, ATTR_EXPIRY_COMPUTED);

    // The computed UAC bit is authoritative. When the server does not return
    // the constructed attribute, fall back to the computed expiry time.
    let expired = match attr_first(entry, ATTR_UAC_COMPUTED).and_then(|raw| raw.parse::<u32>().ok())
    {
        Some(uac) => uac & UF_PASSWORD_EXPIRED != 0,
        None => expires_at.is_some_and(|t| t <= now),
    };

    Ok(Account {
        name: name.to_string(),
        display_name: attr_first(entry, ATTR_DISPLAY_NAME).map(str::to_string),
        mail: attr_first(entry, ATTR_MAIL).map(str::to_string),
        pwd_last_set: attr_filetime(entry, ATTR_PWD_LAST_SET),
        expired,
        expires_at,
    })
}

/// Fetch all password-expiring user accounts from the chosen endpoint.
/// Any connect, bind or search failure is fatal for the run.
pub async fn fetch_accounts(
    conf: &ConfigDirectory,
    endpoint: &Endpoint,
    now: DateTime<Utc>,
) -> Result<Vec<Account>, DirectoryError> {
    let (conn, mut ldap) = LdapConnAsync::new(&format!("ldap://{endpoint}")).await?;
    ldap3::drive!(conn);

    if let (Some(bind_dn), Some(bind_password)) = (conf.bind_dn(), conf.bind_password()) {
        ldap.simple_bind(bind_dn, bind_password).await?.success()?;
    }

    let (entries, _res) = ldap
        .search(
            conf.base_dn(),
            Scope::Subtree,
            &search_filter(),
            vec![
                ATTR_NAME,
                ATTR_DISPLAY_NAME,
                ATTR_MAIL,
                ATTR_PWD_LAST_SET,
                ATTR_UAC_COMPUTED,
                ATTR_EXPIRY_COMPUTED,
            ],
        )
        .await?
        .success()?;

    let mut accounts = Vec::with_capacity(entries.len());
    for entry in entries {
        accounts.push(parse_entry(&SearchEntry::construct(entry), now)?);
    }

    ldap.unbind().await?;

    Ok(accounts)
}


// vim: ts=4 sw=4 expandtab
