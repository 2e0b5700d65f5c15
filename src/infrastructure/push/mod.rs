//! Push Notification Gateway
//!
//! Sends notifications through the FCM HTTP v1 API. Calls are bounded by the
//! configured request timeout and never retried.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::PushSettings;
use crate::domain::{DeviceToken, PushError, PushGateway, PushNotification};

/// FCM v1 request body.
#[derive(Debug, Serialize)]
struct FcmRequest<'a> {
    message: FcmMessage<'a>,
}

#[derive(Debug, Serialize)]
struct FcmMessage<'a> {
    token: &'a str,
    notification: FcmNotification<'a>,
    data: &'a BTreeMap<String, String>,
    android: FcmAndroid,
    apns: FcmApns,
}

#[derive(Debug, Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct FcmAndroid {
    priority: &'static str,
}

#[derive(Debug, Serialize)]
struct FcmApns {
    payload: ApnsPayload,
}

#[derive(Debug, Serialize)]
struct ApnsPayload {
    aps: Aps,
}

#[derive(Debug, Serialize)]
struct Aps {
    badge: u32,
}

impl<'a> FcmRequest<'a> {
    fn new(token: &'a DeviceToken, notification: &'a PushNotification) -> Self {
        Self {
            message: FcmMessage {
                token: &token.token,
                notification: FcmNotification {
                    title: &notification.title,
                    body: &notification.body,
                },
                data: &notification.data,
                android: FcmAndroid { priority: "high" },
                apns: FcmApns {
                    payload: ApnsPayload {
                        aps: Aps { badge: 1 },
                    },
                },
            },
        }
    }
}

pub struct FcmPushGateway {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    enabled: bool,
}

impl FcmPushGateway {
    pub fn new(settings: &PushSettings) -> Result<Self, PushError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| PushError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            access_token: settings.access_token.clone(),
            enabled: settings.enabled,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[async_trait]
impl PushGateway for FcmPushGateway {
    #[instrument(skip_all, fields(user_id = token.user_id, platform = %token.platform))]
    async fn send(&self, token: &DeviceToken, notification: &PushNotification) -> Result<(), PushError> {
        if !self.enabled {
            return Err(PushError::Disabled);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&FcmRequest::new(token, notification))
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!("Push notification accepted");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(PushError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}
