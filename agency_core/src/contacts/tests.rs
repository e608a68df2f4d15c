use crate::contacts::{
    models::{ContactListQuery, ContactStatus, CreateContactRequest},
    repository::{ContactRepository, ContactRepositoryTrait},
    service::ContactService,
};
use crate::database::connection::migrated_test_pool;
use crate::error::AppError;
use crate::websocket::{
    AdminConnection, BroadcastReport, ConnectionRegistry, EventBroadcaster, NotificationEvent,
    Notifier, ServerMessage, NEW_CONTACT_SUBMISSION,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::mpsc;

fn contact(name: &str, email: &str, message: &str) -> CreateContactRequest {
    CreateContactRequest {
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        company: None,
        message: message.to_string(),
    }
}

/// Records each event together with whether its row was already visible.
struct RecordingBroadcaster {
    pool: SqlitePool,
    seen: Mutex<Vec<(NotificationEvent, bool)>>,
}

#[async_trait]
impl EventBroadcaster for RecordingBroadcaster {
    async fn publish(&self, event: NotificationEvent) -> BroadcastReport {
        let id = event.data["id"].as_i64().unwrap_or_default();
        let persisted: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contact_submissions WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .unwrap();

        self.seen.lock().push((event, persisted == 1));
        BroadcastReport::default()
    }
}

#[tokio::test]
async fn test_submit_persists_before_broadcasting() {
    let (pool, _dir) = migrated_test_pool().await;
    let recorder = Arc::new(RecordingBroadcaster {
        pool: pool.clone(),
        seen: Mutex::new(Vec::new()),
    });
    let service = ContactService::new(ContactRepository::new(pool))
        .with_notifier(Notifier::new(recorder.clone()));

    let submission = service.submit(contact("Asha", "a@x.com", "Hi")).await.unwrap();

    let seen = recorder.seen.lock();
    assert_eq!(seen.len(), 1);
    let (event, persisted) = &seen[0];
    assert!(*persisted);
    assert_eq!(event.event_type, NEW_CONTACT_SUBMISSION);
    assert_eq!(event.data["id"], submission.id);
    assert_eq!(event.data["name"], "Asha");
    assert_eq!(event.data["email"], "a@x.com");
    assert_eq!(event.data["message"], "Hi");
    assert!(event.data.get("createdAt").is_some());
    assert!(event.data.get("status").is_none());
}

#[tokio::test]
async fn test_submit_stores_new_unread_row() {
    let (pool, _dir) = migrated_test_pool().await;
    let service = ContactService::new(ContactRepository::new(pool));

    let submission = service.submit(contact("Asha", "a@x.com", "Hi")).await.unwrap();
    assert!(submission.id > 0);
    assert_eq!(submission.status, ContactStatus::New);
    assert!(!submission.is_read);

    let stored = service.get(submission.id).await.unwrap();
    assert_eq!(stored.status, ContactStatus::New);
    assert!(!stored.is_read);
    assert_eq!(stored.name, "Asha");
}

#[tokio::test]
async fn test_submit_without_notifier_still_succeeds() {
    let (pool, _dir) = migrated_test_pool().await;
    let service = ContactService::new(ContactRepository::new(pool));

    assert!(service.submit(contact("Asha", "a@x.com", "Hi")).await.is_ok());
}

#[tokio::test]
async fn test_invalid_submission_is_not_stored_or_broadcast() {
    let (pool, _dir) = migrated_test_pool().await;
    let recorder = Arc::new(RecordingBroadcaster {
        pool: pool.clone(),
        seen: Mutex::new(Vec::new()),
    });
    let service = ContactService::new(ContactRepository::new(pool.clone()))
        .with_notifier(Notifier::new(recorder.clone()));

    let result = service.submit(contact("", "nope", "Hi")).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contact_submissions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
    assert!(recorder.seen.lock().is_empty());
}

#[tokio::test]
async fn test_submit_reaches_open_registry_connections() {
    let (pool, _dir) = migrated_test_pool().await;
    let registry = ConnectionRegistry::new();
    let service = ContactService::new(ContactRepository::new(pool))
        .with_notifier(Notifier::new(Arc::new(registry.clone())));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let connection = AdminConnection::new(Some(1), tx);
    let id = connection.id;
    registry.register(connection).await;
    registry.open(&id, "welcome").await.unwrap();

    let submission = service.submit(contact("Asha", "a@x.com", "Hi")).await.unwrap();

    assert!(matches!(rx.recv().await, Some(ServerMessage::Connected { .. })));
    match rx.recv().await {
        Some(ServerMessage::Event(event)) => assert_eq!(event.data["id"], submission.id),
        other => panic!("expected event frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_status_and_read_updates() {
    let (pool, _dir) = migrated_test_pool().await;
    let service = ContactService::new(ContactRepository::new(pool));
    let submission = service.submit(contact("Asha", "a@x.com", "Hi")).await.unwrap();

    let updated = service.update_status(submission.id, ContactStatus::Contacted).await.unwrap();
    assert_eq!(updated.status, ContactStatus::Contacted);

    let reopened = service.update_status(submission.id, ContactStatus::New).await.unwrap();
    assert_eq!(reopened.status, ContactStatus::New);

    let read = service.set_read(submission.id, true).await.unwrap();
    assert!(read.is_read);
    assert_eq!(service.unread_count().await.unwrap(), 0);

    let unread = service.set_read(submission.id, false).await.unwrap();
    assert!(!unread.is_read);
    assert_eq!(service.unread_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_updates_on_missing_submission_are_not_found() {
    let (pool, _dir) = migrated_test_pool().await;
    let service = ContactService::new(ContactRepository::new(pool));

    assert!(matches!(
        service.update_status(404, ContactStatus::Closed).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(service.set_read(404, true).await, Err(AppError::NotFound(_))));
    assert!(matches!(service.get(404).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_list_filters_and_orders_newest_first() {
    let (pool, _dir) = migrated_test_pool().await;
    let repository = ContactRepository::new(pool);

    let first = repository.create(&contact("One", "1@x.com", "first")).await.unwrap();
    let second = repository.create(&contact("Two", "2@x.com", "second")).await.unwrap();
    let third = repository.create(&contact("Three", "3@x.com", "third")).await.unwrap();

    repository.set_read(second.id, true).await.unwrap();
    repository.update_status(third.id, ContactStatus::Closed).await.unwrap();

    let all = repository.list(&ContactListQuery::default()).await.unwrap();
    let ids: Vec<i64> = all.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);

    let unread = repository
        .list(&ContactListQuery { unread_only: Some(true), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(unread.len(), 2);
    assert!(unread.iter().all(|c| !c.is_read));

    let closed = repository
        .list(&ContactListQuery { status: Some(ContactStatus::Closed), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].id, third.id);

    let page = repository
        .list(&ContactListQuery { limit: Some(1), offset: Some(1), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, second.id);
}
