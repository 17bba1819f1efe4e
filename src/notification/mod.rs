/// 알림 발송
/// 실제 전달(푸시/인앱)은 외부 서비스 담당. 여기서는 메시지를 넘기기만 하고,
/// 실패해도 이미 커밋된 예약/입찰에는 영향을 주지 않는다.
// region:    --- Imports
use crate::message_broker::KafkaProducer;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Info,
    Success,
    Warning,
    AuctionOutbid,
    AuctionWon,
    AuctionLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Booking,
    Auction,
}

/// 알림 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub category: Category,
    pub reference_type: ReferenceType,
    pub reference_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: Uuid,
        title: impl Into<String>,
        body: impl Into<String>,
        category: Category,
        reference_type: ReferenceType,
        reference_id: Uuid,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            body: body.into(),
            category,
            reference_type,
            reference_id,
            created_at: Utc::now(),
        }
    }

    /// 수신자만 바꾼 복사본
    pub fn for_user(&self, user_id: Uuid) -> Self {
        Self {
            user_id,
            ..self.clone()
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("notification dispatch failed: {0}")]
pub struct NotifyError(pub String);
// endregion: --- Notification

// region:    --- Notifier
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// 여러 사용자에게 같은 알림 (하나라도 실패하면 마지막 에러 반환)
    async fn notify_many(
        &self,
        user_ids: &[Uuid],
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        let mut last_err = None;
        for user_id in user_ids {
            if let Err(e) = self.notify(&notification.for_user(*user_id)).await {
                last_err = Some(e);
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Kafka 토픽으로 알림 발행 (key = 수신자 id)
pub struct KafkaNotifier {
    producer: Arc<KafkaProducer>,
    topic: String,
}

impl KafkaNotifier {
    pub fn new(producer: Arc<KafkaProducer>, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl Notifier for KafkaNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let payload =
            serde_json::to_string(notification).map_err(|e| NotifyError(e.to_string()))?;
        self.producer
            .send_message(&self.topic, &notification.user_id.to_string(), &payload)
            .await
            .map_err(NotifyError)
    }
}

/// 브로커 없이 로그만 남기는 알림
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            "{:<12} --> user={} [{:?}] {}",
            "Notify", notification.user_id, notification.category, notification.title
        );
        Ok(())
    }
}
// endregion: --- Notifier

// region:    --- Best Effort
/// 커밋 이후 알림 전송 (별도 태스크, 실패는 로그만)
/// 요청 응답은 발송 완료를 기다리지 않는다.
pub fn send_best_effort(notifier: &Arc<dyn Notifier>, notification: Notification) -> JoinHandle<()> {
    let notifier = Arc::clone(notifier);
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&notification).await {
            warn!(
                "{:<12} --> 알림 전송 실패 (무시): user={} err={}",
                "Notify", notification.user_id, e
            );
        }
    })
}

/// 커밋 이후 다수 사용자에게 알림 전송 (별도 태스크, 실패는 로그만)
pub fn send_many_best_effort(
    notifier: &Arc<dyn Notifier>,
    user_ids: Vec<Uuid>,
    notification: Notification,
) -> JoinHandle<()> {
    let notifier = Arc::clone(notifier);
    tokio::spawn(async move {
        if user_ids.is_empty() {
            return;
        }
        if let Err(e) = notifier.notify_many(&user_ids, &notification).await {
            warn!(
                "{:<12} --> 다중 알림 전송 실패 (무시): count={} err={}",
                "Notify",
                user_ids.len(),
                e
            );
        }
    })
}
// endregion: --- Best Effort

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Flaky {
        fail_for: Uuid,
        sent: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl Notifier for Flaky {
        async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
            if notification.user_id == self.fail_for {
                return Err(NotifyError("broker down".to_string()));
            }
            self.sent.lock().unwrap().push(notification.user_id);
            Ok(())
        }
    }

    fn sample(user_id: Uuid) -> Notification {
        Notification::new(
            user_id,
            "title",
            "body",
            Category::Info,
            ReferenceType::Booking,
            Uuid::new_v4(),
        )
    }

    #[tokio::test]
    async fn notify_many_keeps_going_after_a_failure() {
        let bad = Uuid::new_v4();
        let good = Uuid::new_v4();
        let notifier = Flaky {
            fail_for: bad,
            sent: Mutex::new(Vec::new()),
        };
        let result = notifier.notify_many(&[bad, good], &sample(Uuid::nil())).await;
        assert!(result.is_err());
        assert_eq!(*notifier.sent.lock().unwrap(), vec![good]);
    }

    #[tokio::test]
    async fn best_effort_swallows_errors() {
        let bad = Uuid::new_v4();
        let good = Uuid::new_v4();
        let flaky = Arc::new(Flaky {
            fail_for: bad,
            sent: Mutex::new(Vec::new()),
        });
        let notifier: Arc<dyn Notifier> = flaky.clone();
        send_best_effort(&notifier, sample(bad)).await.unwrap();
        send_many_best_effort(&notifier, Vec::new(), sample(bad))
            .await
            .unwrap();
        assert!(flaky.sent.lock().unwrap().is_empty());

        send_many_best_effort(&notifier, vec![bad, good], sample(Uuid::nil()))
            .await
            .unwrap();
        assert_eq!(*flaky.sent.lock().unwrap(), vec![good]);
    }

    /// 응답하지 않는 브로커
    struct Stalled;

    #[async_trait]
    impl Notifier for Stalled {
        async fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn dispatch_does_not_wait_for_a_stalled_broker() {
        let notifier: Arc<dyn Notifier> = Arc::new(Stalled);
        let handle = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            async { send_many_best_effort(&notifier, vec![Uuid::new_v4(); 10], sample(Uuid::nil())) },
        )
        .await
        .expect("dispatch should return immediately");
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[test]
    fn payload_uses_camel_case() {
        let value = serde_json::to_value(sample(Uuid::nil())).unwrap();
        assert_eq!(value["category"], "info");
        assert_eq!(value["referenceType"], "booking");
        assert!(value.get("userId").is_some());
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        assert!(LogNotifier.notify(&sample(Uuid::new_v4())).await.is_ok());
    }
}
// endregion: --- Tests
