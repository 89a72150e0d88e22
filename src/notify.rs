// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (C) 2026 Michael Büsch <m@bues.ch>

use crate::{
    directory::Account, logger::Logger, mail::Mailer, report::ExpiredAccountReport,
    template::MessageTemplate,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tokio::fs;

/// Account name used for the admin summary audit record.
const ADMIN_REPORT_NAME: &str = "expired-account-report";

/// Every fetched account falls into exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Password already expired. Goes into the admin report, no
    /// individual mail.
    Expired,
    /// Password older than the lookback window. Gets a notification.
    ExpiringSoon,
    /// Nothing to do this run.
    NotDue,
}

pub fn classify(account: &Account, now: DateTime<Utc>, lookback_days: i64) -> Classification {
    if account.expired {
        return Classification::Expired;
    }
    match account.pwd_last_set {
        Some(last_set) if last_set < now - TimeDelta::days(lookback_days) => {
            Classification::ExpiringSoon
        }
        _ => Classification::NotDue,
    }
}

/// Per-invocation parameter bag. Built once by the driver, passed to every
/// component that needs paths, addresses or the template.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub relay: Option<String>,
    pub from: String,
    pub admin_to: String,
    pub subject: String,
    pub admin_subject: String,
    pub lookback_days: i64,
    pub dry_run: bool,
    pub run_stamp: String,
    pub log_dir: PathBuf,
    pub template: MessageTemplate,
    pub now: DateTime<Utc>,
}

/// One outgoing message, snapshotted to a JSON audit record before the
/// delivery attempt.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub account: String,
    pub to: String,
    pub from: String,
    pub subject: String,
    pub relay: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub examined: usize,
    pub notified: usize,
    pub expired: usize,
    pub not_due: usize,
    pub skipped_no_mail: usize,
    pub send_failures: usize,
    pub audit_failures: usize,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Run summary:")?;
        writeln!(f, "  accounts examined:      {}", self.examined)?;
        writeln!(f, "  notifications prepared: {}", self.notified)?;
        writeln!(f, "  passwords expired:      {}", self.expired)?;
        writeln!(f, "  not yet due:            {}", self.not_due)?;
        writeln!(f, "  skipped (no address):   {}", self.skipped_no_mail)?;
        writeln!(f, "  send failures:          {}", self.send_failures)?;
        write!(f, "  audit record failures:  {}", self.audit_failures)
    }
}

fn audit_record_path(ctx: &RunContext, notification: &Notification) -> PathBuf {
    ctx.log_dir
        .join(format!("{}-{}.json", notification.account, ctx.run_stamp))
}

async fn save_audit_record(
    ctx: &RunContext,
    notification: &Notification,
) -> std::io::Result<PathBuf> {
    let path = audit_record_path(ctx, notification);
    let json = serde_json::to_string_pretty(notification).map_err(std::io::Error::other)?;
    fs::write(&path, json).await?;
    Ok(path)
}

/// Audit, then send or simulate-send one notification. All failures in here
/// are per-item: logged to the error log, never propagated.
async fn deliver(
    ctx: &RunContext,
    logger: &Logger,
    mailer: Option<&Mailer>,
    notification: &Notification,
    summary: &mut RunSummary,
) {
    match save_audit_record(ctx, notification).await {
        Ok(path) => {
            logger
                .log(&format!("Audit record written to '{}'.", path.display()))
                .await;
        }
        Err(e) => {
            summary.audit_failures += 1;
            logger
                .error(&format!(
                    "Failed to write audit record for '{}': {}",
                    notification.account, e
                ))
                .await;
        }
    }

    if ctx.dry_run {
        logger
            .log(&format!(
                "Dry run: would have sent '{}' to <{}>.",
                notification.subject, notification.to
            ))
            .await;
        return;
    }

    let Some(mailer) = mailer else {
        return;
    };
    match mailer.send(notification).await {
        Ok(()) => {
            logger
                .log(&format!(
                    "Sent '{}' to <{}>.",
                    notification.subject, notification.to
                ))
                .await;
        }
        Err(e) => {
            summary.send_failures += 1;
            logger
                .error(&format!(
                    "Failed to send notification to <{}>: {:#}",
                    notification.to, e
                ))
                .await;
        }
    }
}

/// The Process stage: classify every account, notify the expiring ones and
/// mail the expired-account report to the admin mailbox.
///
/// The account fetch has already happened (its failure is fatal and handled
/// by the driver); everything in here is per-item best-effort.
pub async fn run(
    ctx: &RunContext,
    logger: &Logger,
    mailer: Option<&Mailer>,
    accounts: &[Account],
) -> RunSummary {
    let mut summary = RunSummary::default();
    let mut expired_accounts = Vec::new();

    logger
        .log(&format!(
            "Processing {} account(s), lookback window {} day(s).",
            accounts.len(),
            ctx.lookback_days
        ))
        .await;

    for account in accounts {
        summary.examined += 1;
        match classify(account, ctx.now, ctx.lookback_days) {
            Classification::NotDue => {
                summary.not_due += 1;
            }
            Classification::Expired => {
                logger
                    .log(&format!("Password of '{}' is expired.", account.name))
                    .await;
                expired_accounts.push(account);
            }
            Classification::ExpiringSoon => {
                logger.minor_break().await;
                logger
                    .log(&format!("Password of '{}' is about to expire.", account.name))
                    .await;

                let Some(mail) = account.mail.as_deref() else {
                    summary.skipped_no_mail += 1;
                    logger
                        .error(&format!(
                            "Account '{}' needs a notification, but has no mail address.",
                            account.name
                        ))
                        .await;
                    continue;
                };

                let notification = Notification {
                    account: account.name.clone(),
                    to: mail.to_string(),
                    from: ctx.from.clone(),
                    subject: ctx.subject.clone(),
                    relay: ctx.relay.clone(),
                    expires_at: account.expires_at,
                    body: ctx.template.render(account.display(), account.expires_at),
                };
                deliver(ctx, logger, mailer, &notification, &mut summary).await;
                summary.notified += 1;
            }
        }
    }

    let report = ExpiredAccountReport::new(ctx.now, expired_accounts.iter().copied());
    summary.expired = report.entries().len();

    logger.section_break().await;
    logger
        .log(&format!(
            "Mailing expired-account report ({} entries) to <{}>.",
            report.entries().len(),
            ctx.admin_to
        ))
        .await;
    let admin_notification = Notification {
        account: ADMIN_REPORT_NAME.to_string(),
        to: ctx.admin_to.clone(),
        from: ctx.from.clone(),
        subject: ctx.admin_subject.clone(),
        relay: ctx.relay.clone(),
        expires_at: None,
        body: report.to_html(),
    };
    deliver(ctx, logger, mailer, &admin_notification, &mut summary).await;

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use serde_json::Value;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_704_067_200, 0).unwrap()
    }

    fn account(name: &str, expired: bool, last_set_days_ago: Option<i64>) -> Account {
        Account {
            name: name.to_string(),
            display_name: Some(format!("User {name}")),
            mail: Some(format!("{name}@example.com")),
            pwd_last_set: last_set_days_ago.map(|d| now() - TimeDelta::days(d)),
            expired,
            expires_at: Some(now() + TimeDelta::days(3)),
        }
    }

    fn context(dir: &std::path::Path) -> RunContext {
        let template = MessageTemplate::new(
            "<p>Dear {{display_name}}, expires {{expiry_date}}.</p>".to_string(),
        )
        .unwrap();
        RunContext {
            relay: Some("smtp://relay.example.com:25".to_string()),
            from: "it@example.com".to_string(),
            admin_to: "admins@example.com".to_string(),
            subject: "Password expiry notice".to_string(),
            admin_subject: "Expired account report".to_string(),
            lookback_days: 30,
            dry_run: true,
            run_stamp: "20240101-000000".to_string(),
            log_dir: dir.to_path_buf(),
            template,
            now: now(),
        }
    }

    #[test]
    fn classify_expired_wins() {
        let acc = account("bwayne", true, Some(1));
        assert_eq!(classify(&acc, now(), 30), Classification::Expired);
    }

    #[test]
    fn classify_old_password_is_expiring_soon() {
        let acc = account("jsmith", false, Some(45));
        assert_eq!(classify(&acc, now(), 30), Classification::ExpiringSoon);
    }

    #[test]
    fn classify_recent_password_is_not_due() {
        let acc = account("fresh", false, Some(10));
        assert_eq!(classify(&acc, now(), 30), Classification::NotDue);
        // Exactly at the boundary: not yet older than the window.
        let acc = account("edge", false, Some(30));
        assert_eq!(classify(&acc, now(), 30), Classification::NotDue);
    }

    #[test]
    fn classify_unset_last_set_is_not_due() {
        let acc = account("ghost", false, None);
        assert_eq!(classify(&acc, now(), 30), Classification::NotDue);
    }

    #[tokio::test]
    async fn dry_run_audits_everything_and_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let logger = Logger::new(dir.path(), &ctx.run_stamp);

        let mut no_mail = account("nomail", false, Some(60));
        no_mail.mail = None;
        let accounts = [
            account("jsmith", false, Some(45)),
            account("bwayne", true, Some(90)),
            account("fresh", false, Some(5)),
            no_mail,
        ];

        let summary = run(&ctx, &logger, None, &accounts).await;

        assert_eq!(summary.examined, 4);
        assert_eq!(summary.notified, 1);
        assert_eq!(summary.expired, 1);
        assert_eq!(summary.not_due, 1);
        assert_eq!(summary.skipped_no_mail, 1);
        assert_eq!(summary.send_failures, 0);
        assert_eq!(summary.audit_failures, 0);

        // Per-user audit record.
        let record = fs::read_to_string(dir.path().join("jsmith-20240101-000000.json"))
            .await
            .unwrap();
        let record: Value = serde_json::from_str(&record).unwrap();
        assert_eq!(record["to"], "jsmith@example.com");
        assert_eq!(record["subject"], "Password expiry notice");
        let body = record["body"].as_str().unwrap();
        assert!(body.contains("Dear User jsmith"));
        assert!(!body.contains("{{"));

        // Admin report audit record, with the expired account in the body.
        let record =
            fs::read_to_string(dir.path().join("expired-account-report-20240101-000000.json"))
                .await
                .unwrap();
        let record: Value = serde_json::from_str(&record).unwrap();
        assert_eq!(record["to"], "admins@example.com");
        assert!(record["body"].as_str().unwrap().contains("bwayne"));

        // No record for the expired or not-due accounts.
        assert!(!dir.path().join("bwayne-20240101-000000.json").exists());
        assert!(!dir.path().join("fresh-20240101-000000.json").exists());

        // Dry-run and skip lines in the logs.
        let log = fs::read_to_string(logger.log_path()).await.unwrap();
        assert!(log.contains("Dry run: would have sent"));
        let errors = fs::read_to_string(logger.err_path()).await.unwrap();
        assert!(errors.contains("'nomail'"));
    }

    #[tokio::test]
    async fn expired_accounts_get_no_individual_mail() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let logger = Logger::new(dir.path(), &ctx.run_stamp);

        let accounts = [account("bwayne", true, Some(90))];
        let summary = run(&ctx, &logger, None, &accounts).await;

        assert_eq!(summary.notified, 0);
        assert_eq!(summary.expired, 1);
        assert!(!dir.path().join("bwayne-20240101-000000.json").exists());
    }

    #[tokio::test]
    async fn audit_failure_is_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        ctx.log_dir = dir.path().join("missing-subdir");
        let logger = Logger::new(dir.path(), &ctx.run_stamp);

        let accounts = [account("jsmith", false, Some(45))];
        let summary = run(&ctx, &logger, None, &accounts).await;

        assert_eq!(summary.notified, 1);
        // Per-user record plus admin report record both failed.
        assert_eq!(summary.audit_failures, 2);
    }

    #[test]
    fn summary_display_lists_all_counters() {
        let summary = RunSummary {
            examined: 10,
            notified: 3,
            expired: 2,
            not_due: 4,
            skipped_no_mail: 1,
            send_failures: 1,
            audit_failures: 0,
        };
        let text = format!("{summary}");
        assert!(text.contains("accounts examined:      10"));
        assert!(text.contains("notifications prepared: 3"));
        assert!(text.contains("send failures:          1"));
    }
}

// vim: ts=4 sw=4 expandtab
