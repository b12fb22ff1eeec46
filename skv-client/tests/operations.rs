mod support;

use std::time::Duration;

use skv_client::{ErrorKind, KvClient, ManualClock, MemoryConnector, StoreError, RECORD_TTL};

use support::{fast_config, init_tracing};

async fn ready_client() -> (KvClient<MemoryConnector>, MemoryConnector, ManualClock) {
    init_tracing();
    let clock = ManualClock::new();
    let connector = MemoryConnector::with_clock(clock.clone());
    let client = KvClient::with_connector(fast_config(Vec::new()), connector.clone());
    assert!(client.init());
    client.wait_until_ready().await;
    (client, connector, clock)
}

#[tokio::test]
async fn set_then_get_round_trips() {
    let (client, _, _) = ready_client().await;
    client.set("user", "324234", "onetwothree").await.expect("set");
    let value = client.get("user", "324234").await.expect("get");
    assert_eq!(value.as_deref(), Some("onetwothree"));
}

#[tokio::test]
async fn missing_key_is_not_an_error() {
    let (client, _, _) = ready_client().await;
    assert_eq!(client.get("user", "never-written").await.expect("get"), None);
}

#[tokio::test]
async fn scopes_do_not_see_each_other() {
    let (client, connector, _) = ready_client().await;
    client.set("user", "42", "alice").await.expect("set user");
    client.set("account", "42", "acme").await.expect("set account");

    assert_eq!(client.get("user", "42").await.unwrap().as_deref(), Some("alice"));
    assert_eq!(client.get("account", "42").await.unwrap().as_deref(), Some("acme"));
    assert_eq!(client.get("billing", "42").await.unwrap(), None);
    assert_eq!(connector.live_keys(), vec!["account@42", "user@42"]);
}

#[tokio::test]
async fn separator_inside_scope_cannot_collide() {
    let (client, connector, _) = ready_client().await;
    client.set("a@b", "c", "left").await.expect("set");
    client.set("a", "b@c", "right").await.expect("set");

    assert_eq!(client.get("a@b", "c").await.unwrap().as_deref(), Some("left"));
    assert_eq!(client.get("a", "b@c").await.unwrap().as_deref(), Some("right"));
    assert_eq!(connector.live_keys(), vec!["a@b@c", "a\\@b@c"]);
}

#[tokio::test]
async fn overwrite_keeps_latest_value() {
    let (client, _, _) = ready_client().await;
    client.set("user", "k", "a").await.expect("set a");
    client.set("user", "k", "b").await.expect("set b");
    assert_eq!(client.get("user", "k").await.unwrap().as_deref(), Some("b"));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let (client, _, _) = ready_client().await;
    client.set("user", "k", "v").await.expect("set");

    client.delete("user", "k").await.expect("first delete");
    client.delete("user", "k").await.expect("second delete");
    assert_eq!(client.get("user", "k").await.unwrap(), None);
}

#[tokio::test]
async fn records_expire_after_fixed_ttl() {
    let (client, connector, clock) = ready_client().await;
    client.set("session", "abc", "token").await.expect("set");
    assert_eq!(connector.ttl_of("session@abc"), Some(RECORD_TTL));

    clock.advance(RECORD_TTL - Duration::from_secs(1));
    assert_eq!(client.get("session", "abc").await.unwrap().as_deref(), Some("token"));

    clock.advance(Duration::from_secs(1));
    assert_eq!(client.get("session", "abc").await.unwrap(), None);
}

#[tokio::test]
async fn overwrite_restarts_expiry() {
    let (client, _, clock) = ready_client().await;
    client.set("session", "abc", "v1").await.expect("set");
    clock.advance(RECORD_TTL - Duration::from_secs(10));
    client.set("session", "abc", "v2").await.expect("set again");
    clock.advance(Duration::from_secs(20));
    assert_eq!(client.get("session", "abc").await.unwrap().as_deref(), Some("v2"));
}

#[tokio::test]
async fn read_failure_is_classified_as_database_error() {
    let (client, connector, _) = ready_client().await;
    connector.fail_queries(1);

    let err = client.get("user", "k").await.expect_err("injected failure");
    assert_eq!(err.status(), 500);
    assert_eq!(err.kind(), ErrorKind::DatabaseError);
    assert_eq!(err.message(), "unable to read key user@k");
    assert!(matches!(err.store_error(), Some(StoreError::Injected(_))));
    assert_eq!(err.to_json()["kind"], "database_error");

    // The next call goes through; the failure was not sticky.
    assert_eq!(client.get("user", "k").await.expect("get"), None);
}

#[tokio::test]
async fn failed_write_is_not_retried() {
    let (client, connector, _) = ready_client().await;
    connector.fail_queries(1);

    let err = client.set("user", "k", "v").await.expect_err("injected failure");
    assert_eq!(err.message(), "unable to write key user@k");
    assert_eq!(client.get("user", "k").await.expect("get"), None);
}

#[tokio::test]
async fn failed_delete_reports_scoped_key() {
    let (client, connector, _) = ready_client().await;
    connector.fail_queries(1);

    let err = client.delete("a@b", "c").await.expect_err("injected failure");
    assert_eq!(err.status(), 500);
    assert_eq!(err.message(), "unable to delete key a\\@b@c");
}
