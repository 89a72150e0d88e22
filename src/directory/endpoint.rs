// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (C) 2026 Michael Büsch <m@bues.ch>

use crate::{config::ConfigDirectory, directory::DirectoryError, logger::Logger};
use rand::seq::SliceRandom as _;
use std::time::Duration;
use tokio::{net::TcpStream, time::timeout};
use trust_dns_resolver::TokioAsyncResolver;

/// A directory-service host reachable via TCP on the directory port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Enumerate candidate endpoints: the configured static host list, or the
/// SRV records advertised for the caller's site, falling back to the
/// domain-wide records when the site-scoped name resolves to nothing.
async fn discover_candidates(
    conf: &ConfigDirectory,
) -> Result<Vec<Endpoint>, DirectoryError> {
    if !conf.hosts().is_empty() {
        return Ok(conf
            .hosts()
            .iter()
            .map(|host| Endpoint {
                host: host.clone(),
                port: conf.port(),
            })
            .collect());
    }

    let domain_name = format!("_ldap._tcp.{}.", conf.domain());
    let resolver =
        TokioAsyncResolver::tokio_from_system_conf().map_err(|source| {
            DirectoryError::Discovery {
                name: domain_name.clone(),
                source,
            }
        })?;

    let mut names = Vec::with_capacity(2);
    if let Some(site) = conf.site() {
        names.push(format!("_ldap._tcp.{}._sites.{}.", site, conf.domain()));
    }
    names.push(domain_name.clone());

    for name in &names {
        // A missing site-scoped record is normal; keep falling back.
        let Ok(lookup) = resolver.srv_lookup(name.as_str()).await else {
            continue;
        };
        let candidates: Vec<Endpoint> = lookup
            .iter()
            .map(|srv| Endpoint {
                host: srv.target().to_utf8().trim_end_matches('.').to_string(),
                port: srv.port(),
            })
            .collect();
        if !candidates.is_empty() {
            return Ok(candidates);
        }
    }

    Err(DirectoryError::NoCandidates { name: domain_name })
}

/// One bounded connectivity probe. Anything but a completed connect within
/// the timeout counts as unreachable.
async fn probe(endpoint: &Endpoint, timeout_ms: u64) -> bool {
    let connect = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
    matches!(
        timeout(Duration::from_millis(timeout_ms), connect).await,
        Ok(Ok(_))
    )
}

/// Probe all candidates sequentially and pick one reachable endpoint
/// uniformly at random. The random pick spreads load across controllers;
/// it is not a correctness decision.
pub async fn select_endpoint(
    conf: &ConfigDirectory,
    logger: &Logger,
) -> Result<Endpoint, DirectoryError> {
    let candidates = discover_candidates(conf).await?;
    let num_candidates = candidates.len();
    logger
        .log(&format!("Probing {num_candidates} directory endpoint(s)."))
        .await;

    let mut reachable = Vec::with_capacity(num_candidates);
    for endpoint in candidates {
        if probe(&endpoint, conf.probe_timeout_ms()).await {
            logger.log(&format!("Endpoint {endpoint} is reachable.")).await;
            reachable.push(endpoint);
        } else {
            logger
                .log(&format!(
                    "Endpoint {endpoint} did not accept a connection within {} ms.",
                    conf.probe_timeout_ms()
                ))
                .await;
        }
    }

    reachable
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or(DirectoryError::NoReachableEndpoint {
            candidates: num_candidates,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn conf_with_hosts(hosts: &[&str], port: u16) -> ConfigDirectory {
        let host_list = hosts
            .iter()
            .map(|h| format!("\"{h}\""))
            .collect::<Vec<_>>()
            .join(", ");
        toml::from_str(&format!(
            r#"
domain = "example.com"
hosts = [{host_list}]
port = {port}
base_dn = "DC=example,DC=com"
            "#
        ))
        .unwrap()
    }

    fn test_logger() -> (tempfile::TempDir, Logger) {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::new(dir.path(), "test");
        (dir, logger)
    }

    #[tokio::test]
    async fn probe_reachable_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let endpoint = Endpoint {
            host: "127.0.0.1".to_string(),
            port,
        };
        assert!(probe(&endpoint, 250).await);
    }

    #[tokio::test]
    async fn probe_closed_port() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let endpoint = Endpoint {
            host: "127.0.0.1".to_string(),
            port,
        };
        assert!(!probe(&endpoint, 250).await);
    }

    #[tokio::test]
    async fn select_picks_a_reachable_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let open_port = listener.local_addr().unwrap().port();

        let conf = conf_with_hosts(&["127.0.0.1", "localhost"], open_port);
        let (_dir, logger) = test_logger();
        let selected = select_endpoint(&conf, &logger).await.unwrap();
        assert_eq!(selected.port, open_port);
        assert!(["127.0.0.1", "localhost"].contains(&selected.host.as_str()));
    }

    #[tokio::test]
    async fn select_fails_without_reachable_endpoints() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let conf = conf_with_hosts(&["127.0.0.1"], port);
        let (_dir, logger) = test_logger();
        let err = select_endpoint(&conf, &logger).await.unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::NoReachableEndpoint { candidates: 1 }
        ));
    }

    #[test]
    fn endpoint_display() {
        let endpoint = Endpoint {
            host: "dc1.example.com".to_string(),
            port: 389,
        };
        assert_eq!(format!("{endpoint}"), "dc1.example.com:389");
    }
}

// vim: ts=4 sw=4 expandtab
