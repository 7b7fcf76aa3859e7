//! WebhookSink - Notification を JSON で POST する
//!
//! # 方針
//! - 2xx 以外はエラー
//! - 失敗したら RetryPolicy に従って再送（リトライはすべてここで完結）
//! - 最後まで失敗したら HookError::Delivery を返す（EventLoop は記録して先へ進む）

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::retry::RetryPolicy;
use crate::domain::{HookError, Notification};
use crate::ports::DeliverySink;

pub struct WebhookSink {
    url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Result<Self, HookError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HookError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
            retry,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post_once(&self, payload: &Notification) -> Result<(), String> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(format!("webhook returned {status}"))
        }
    }
}

#[async_trait]
impl DeliverySink for WebhookSink {
    async fn send(&self, payload: &Notification) -> Result<(), HookError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.post_once(payload).await {
                Ok(()) => {
                    debug!(rec_id = %payload.rec_id, attempts, "webhook delivered");
                    return Ok(());
                }
                Err(reason) if self.retry.should_retry(attempts) => {
                    let delay = self.retry.next_delay(attempts);
                    warn!(
                        rec_id = %payload.rec_id,
                        attempts,
                        ?delay,
                        "webhook attempt failed, retrying: {reason}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(reason) => {
                    return Err(HookError::Delivery {
                        id: payload.rec_id,
                        reason: format!("{reason} (after {attempts} attempts)"),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RecordId, RunMode};
    use crate::ports::DeliveryOutcome;

    fn payload() -> Notification {
        Notification {
            rec_id: RecordId::new(4),
            app: "com.microsoft.teams2".into(),
            title: "Bob".into(),
            subtitle: String::new(),
            body: "ping".into(),
            timestamp: 0.0,
            delivered_at: None,
        }
    }

    /// 何も listen していない localhost のポート
    fn closed_port_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}/webhook")
    }

    #[tokio::test]
    async fn unreachable_webhook_is_a_delivery_error_after_retries() {
        let sink = WebhookSink::new(
            closed_port_url(),
            Duration::from_secs(2),
            RetryPolicy::new(2, Duration::from_millis(10), 1.0),
        )
        .unwrap();

        let err = sink.send(&payload()).await.unwrap_err();
        assert!(matches!(err, HookError::Delivery { id, .. } if id == RecordId::new(4)));
        assert!(err.to_string().contains("after 2 attempts"));
    }

    #[tokio::test]
    async fn deliver_never_surfaces_errors() {
        let sink = WebhookSink::new(
            closed_port_url(),
            Duration::from_secs(2),
            RetryPolicy::no_retry(),
        )
        .unwrap();

        let outcome = sink.deliver(&payload(), RunMode::Live).await;
        assert!(matches!(outcome, DeliveryOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn rehearsal_does_not_touch_the_network() {
        // 到達不能な URL でも dry run は成功扱い
        let sink = WebhookSink::new(
            closed_port_url(),
            Duration::from_secs(2),
            RetryPolicy::no_retry(),
        )
        .unwrap();

        let outcome = sink.deliver(&payload(), RunMode::Rehearsal).await;
        assert_eq!(outcome, DeliveryOutcome::Rehearsed);
    }
}
