use dospanes_model::{AttributeDescriptor, ModelRegistry, ModelSchema};
use dospanes_sync::mock::{FailingTarget, MockSource, RecordingTarget};
use dospanes_sync::{
    handler_fn, ChangeItem, InstanceId, SyncBatch, SyncCoordinator, SyncError, SyncSource,
    SyncTarget,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn make_registry() -> Arc<ModelRegistry> {
    let registry = Arc::new(ModelRegistry::new());
    registry
        .model(
            "User",
            ModelSchema::new()
                .attribute("firstName", AttributeDescriptor::text())
                .attribute("lastName", AttributeDescriptor::text()),
        )
        .unwrap();
    registry
}

fn make_coordinator() -> SyncCoordinator {
    init_tracing();
    SyncCoordinator::new(make_registry())
}

fn labelled(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> Arc<dyn SyncTarget> {
    let log = log.clone();
    handler_fn(move |batch: SyncBatch| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(label);
            Ok::<_, SyncError>(batch)
        }
    })
}

// ── Registration ─────────────────────────────────────────────────

#[tokio::test]
async fn starts_with_no_handlers() {
    let coordinator = make_coordinator();
    assert_eq!(coordinator.handler_count(), 0);
    assert!(coordinator.notify_sync_targets().await.unwrap().is_empty());
}

#[tokio::test]
async fn add_sync_target_receives_notifications() {
    let coordinator = make_coordinator();
    let target = Arc::new(RecordingTarget::new());
    coordinator.add_sync_target(target.clone());

    let results = coordinator.notify_sync_targets().await.unwrap();

    assert_eq!(results, vec![SyncBatch::new()]);
    assert_eq!(target.call_count(), 1);
    assert!(target.received()[0].is_empty());
}

#[tokio::test]
async fn on_update_appends_in_order() {
    let coordinator = make_coordinator();
    let log = Arc::new(Mutex::new(Vec::new()));

    coordinator.on_update([labelled(&log, "a"), labelled(&log, "b")]);
    coordinator.on_update([labelled(&log, "c")]);
    assert_eq!(coordinator.handler_count(), 3);

    coordinator.notify_sync_targets().await.unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn remove_sync_target_removes_only_that_target() {
    let coordinator = make_coordinator();
    let kept = Arc::new(RecordingTarget::new());
    let removed: Arc<dyn SyncTarget> = Arc::new(RecordingTarget::new());
    coordinator.add_sync_target(kept.clone());
    coordinator.add_sync_target(removed.clone());

    assert!(coordinator.remove_sync_target(&removed));
    assert_eq!(coordinator.handler_count(), 1);

    coordinator.notify_sync_targets().await.unwrap();
    assert_eq!(kept.call_count(), 1);
}

#[tokio::test]
async fn remove_unregistered_target_is_noop() {
    let coordinator = make_coordinator();
    coordinator.add_sync_target(Arc::new(RecordingTarget::new()));
    let stranger: Arc<dyn SyncTarget> = Arc::new(RecordingTarget::new());

    assert!(!coordinator.remove_sync_target(&stranger));
    assert_eq!(coordinator.handler_count(), 1);
}

#[tokio::test]
async fn remove_drops_one_registration_at_a_time() {
    let coordinator = make_coordinator();
    let target: Arc<dyn SyncTarget> = Arc::new(RecordingTarget::new());
    coordinator.add_sync_target(target.clone());
    coordinator.add_sync_target(target.clone());

    assert!(coordinator.remove_sync_target(&target));
    assert_eq!(coordinator.handler_count(), 1);
    assert!(coordinator.remove_sync_target(&target));
    assert!(!coordinator.remove_sync_target(&target));
}

#[tokio::test]
async fn unsubscribe_by_handle() {
    let coordinator = make_coordinator();
    let target = Arc::new(RecordingTarget::new());
    let subscription = coordinator.add_sync_target(target.clone());

    assert!(coordinator.unsubscribe(subscription));
    assert!(!coordinator.unsubscribe(subscription));

    coordinator.notify_sync_targets().await.unwrap();
    assert_eq!(target.call_count(), 0);
}

#[tokio::test]
async fn clear_sync_targets_silences_notifications() {
    let coordinator = make_coordinator();
    let target = Arc::new(RecordingTarget::new());
    coordinator.add_sync_target(target.clone());
    coordinator.on_update([target.clone() as Arc<dyn SyncTarget>]);

    coordinator.clear_sync_targets();

    assert_eq!(coordinator.handler_count(), 0);
    assert!(coordinator.notify_sync_targets().await.unwrap().is_empty());
    assert_eq!(target.call_count(), 0);
}

#[tokio::test]
async fn clones_share_handlers() {
    let coordinator = make_coordinator();
    let clone = coordinator.clone();
    clone.add_sync_target(Arc::new(RecordingTarget::new()));
    assert_eq!(coordinator.handler_count(), 1);
}

// ── Broadcast ────────────────────────────────────────────────────

#[tokio::test]
async fn publish_hands_batch_to_every_handler() {
    let coordinator = make_coordinator();
    let first = Arc::new(RecordingTarget::new());
    let second = Arc::new(RecordingTarget::new());
    coordinator.add_sync_target(first.clone());
    coordinator.add_sync_target(second.clone());

    let batch = SyncBatch::new().with_item(
        "User",
        ChangeItem::from_value(None, json!({"firstName": "Arya"})),
    );
    let results = coordinator.publish(batch.clone()).await.unwrap();

    assert_eq!(results, vec![batch.clone(), batch.clone()]);
    assert_eq!(first.received(), vec![batch.clone()]);
    assert_eq!(second.received(), vec![batch]);
}

#[tokio::test]
async fn one_failing_handler_fails_the_notification() {
    let coordinator = make_coordinator();
    coordinator.add_sync_target(Arc::new(RecordingTarget::new()));
    coordinator.add_sync_target(Arc::new(FailingTarget::new("target offline")));

    let err = coordinator.notify_sync_targets().await.unwrap_err();
    assert_eq!(err.to_string(), "handler failed: target offline");
}

// ── Sources ──────────────────────────────────────────────────────

#[tokio::test]
async fn source_updates_flow_into_models() {
    let coordinator = make_coordinator();
    let users = coordinator.registry().get("User").unwrap();
    let user = users.build(json!({"firstName": "Jon", "lastName": "Snow"}));
    let source = MockSource::new();
    coordinator.add_sync_source(&source);
    assert_eq!(source.handler_count(), 1);

    let batch = SyncBatch::new().with_item(
        "User",
        ChangeItem::from_value(Some(user.id()), json!({"lastName": "Targaryen"})),
    );
    source.emit(batch).await.unwrap();

    assert_eq!(user.get_str("lastName").as_deref(), Some("Targaryen"));
    assert_eq!(user.get_str("firstName").as_deref(), Some("Jon"));
    assert!(!user.is_dirty());
}

#[tokio::test]
async fn dropped_coordinator_passes_source_batches_through() {
    let source = MockSource::new();
    {
        let coordinator = make_coordinator();
        coordinator.add_sync_source(&source);
    }
    let later = Arc::new(RecordingTarget::new());
    source.on_update(later.clone());

    let batch = SyncBatch::new().with_item(
        "User",
        ChangeItem::from_value(None, json!({"firstName": "Bran"})),
    );
    let results = source.emit(batch.clone()).await.unwrap();

    assert_eq!(results, vec![batch.clone(), batch.clone()]);
    assert_eq!(later.received(), vec![batch]);
}

#[tokio::test]
async fn unsubscribed_source_stops_merging() {
    let coordinator = make_coordinator();
    let users = coordinator.registry().get("User").unwrap();
    let user = users.build(json!({"firstName": "Jon", "lastName": "Snow"}));
    let source = MockSource::new();
    let subscription = coordinator.add_sync_source(&source);

    assert!(coordinator.unsubscribe(subscription));
    assert!(!coordinator.unsubscribe(subscription));

    let batch = SyncBatch::new().with_item(
        "User",
        ChangeItem::from_value(Some(user.id()), json!({"lastName": "Targaryen"})),
    );
    let results = source.emit(batch.clone()).await.unwrap();

    assert_eq!(results, vec![batch]);
    assert_eq!(user.get_str("lastName").as_deref(), Some("Snow"));
}

#[tokio::test]
async fn connect_registers_definition_endpoints() {
    init_tracing();
    let source = Arc::new(MockSource::new());
    let target = Arc::new(RecordingTarget::new());
    let registry = Arc::new(ModelRegistry::new().with_default_sync_target(target.clone()));
    let users = registry
        .model(
            "User",
            ModelSchema::new()
                .attribute("firstName", AttributeDescriptor::text())
                .sync_source(source.clone()),
        )
        .unwrap();
    let coordinator = SyncCoordinator::new(registry);

    let subscriptions = coordinator.connect(&users);

    assert_eq!(subscriptions.len(), 2);
    assert_eq!(source.handler_count(), 1);
    coordinator.notify_sync_targets().await.unwrap();
    assert_eq!(target.call_count(), 1);
}

// ── Merge entry point ────────────────────────────────────────────

#[tokio::test]
async fn sync_resolves_with_the_batch() {
    let coordinator = make_coordinator();
    let batch = SyncBatch::new().with_item("Nobody", ChangeItem::default());

    let out = coordinator.sync(batch.clone()).await.unwrap();
    assert_eq!(out, batch);
}

#[tokio::test]
async fn coordinator_is_a_sync_target() {
    let upstream = make_coordinator();
    let downstream = make_coordinator();
    let users = downstream.registry().get("User").unwrap();
    let user = users.build(Value::Null);

    upstream.add_sync_target(Arc::new(downstream.clone()));
    let batch = SyncBatch::new().with_item(
        "User",
        ChangeItem::from_value(Some(user.id()), json!({"firstName": "Bran"})),
    );
    upstream.publish(batch).await.unwrap();

    assert_eq!(user.get_str("firstName").as_deref(), Some("Bran"));
}

#[tokio::test]
async fn sync_never_appends_to_store() {
    let coordinator = make_coordinator();
    let users = coordinator.registry().get("User").unwrap();
    users.build(Value::Null);

    let batch = SyncBatch::new().with_item(
        "User",
        ChangeItem::from_value(Some(InstanceId::new()), json!({"firstName": "Hodor"})),
    );
    coordinator.sync(batch).await.unwrap();

    assert_eq!(users.store_len(), 1);
}
