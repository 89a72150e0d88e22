// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (C) 2026 Michael Büsch <m@bues.ch>

use crate::notify::Notification;
use anyhow::{self as ah, Context as _};
use lettre::{
    AsyncSmtpTransport, AsyncTransport as _, Message, Tokio1Executor, message::header::ContentType,
};

/// Mail submission collaborator. Fire-and-forget with pass/fail feedback
/// only; retries and bounce handling are the relay's business.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl Mailer {
    pub fn connect(relay: Option<&str>) -> ah::Result<Self> {
        let transport = if let Some(relay) = relay {
            AsyncSmtpTransport::<Tokio1Executor>::from_url(relay)
                .context("Parse mail relay URL")?
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::unencrypted_localhost()
        };
        Ok(Self { transport })
    }

    pub async fn send(&self, notification: &Notification) -> ah::Result<()> {
        let message = Message::builder()
            .from(
                notification
                    .from
                    .parse()
                    .context("Parse sender address")?,
            )
            .to(notification
                .to
                .parse()
                .context("Parse recipient address")?)
            .subject(&notification.subject)
            .user_agent("pwdnotify".to_string())
            .header(ContentType::TEXT_HTML)
            .body(notification.body.clone())?;

        self.transport.send(message).await.context("Send e-mail")?;

        Ok(())
    }
}

// vim: ts=4 sw=4 expandtab
