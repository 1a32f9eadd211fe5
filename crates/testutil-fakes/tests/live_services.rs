// crates/testutil-fakes/tests/live_services.rs
// ============================================================================
// Module: Live Service Tests
// Description: Fixture round trips against locally running fake services.
// Purpose: Verify each fixture hands out a working client.
// ============================================================================

//! Live fake-service tests.
//!
//! Requires a redis server, an SQS-compatible queue service, and an
//! S3-compatible object store at the endpoints named by the `TESTUTIL_*`
//! environment variables (or their defaults). Build with
//! `--features live-services`.

#![allow(clippy::expect_used, reason = "Test-only assertions favor expect for clarity.")]

use std::sync::Arc;
use std::time::Duration;

use aws_sdk_s3::primitives::ByteStream;
use testutil_core::FixtureConfig;
use testutil_core::MemoryEventSink;
use testutil_fakes::FakeRedis;
use testutil_fakes::FakeS3;
use testutil_fakes::FakeSqs;

#[test]
fn redis_answers_ping() {
    let redis = FakeRedis::start().expect("fake redis");
    let mut conn = redis.connection().expect("connection");
    let pong: String = redis::cmd("PING").query(&mut *conn).expect("ping");
    assert_eq!(pong, "PONG");
    drop(conn);
    redis.close().expect("close");
}

#[test]
fn redis_flush_clears_test_database() {
    let redis = FakeRedis::start().expect("fake redis");
    let mut conn = redis.connection().expect("connection");
    redis::cmd("SET").arg("greeting").arg("hello").query::<()>(&mut *conn).expect("set");
    drop(conn);
    redis.flush().expect("flush");
    let mut conn = redis.connection().expect("connection");
    let value: Option<String> = redis::cmd("GET").arg("greeting").query(&mut *conn).expect("get");
    assert_eq!(value, None);
}

#[test]
fn redis_channel_listener_signals_each_message() {
    let redis = FakeRedis::start().expect("fake redis");
    let notifications = redis.listen_channel("testutil-events").expect("subscribe");
    let mut conn = redis.connection().expect("connection");
    for _ in 0..2 {
        redis::cmd("PUBLISH")
            .arg("testutil-events")
            .arg("ping")
            .query::<i64>(&mut *conn)
            .expect("publish");
    }
    for _ in 0..2 {
        notifications.recv_timeout(Duration::from_secs(3)).expect("notification");
    }
}

#[test]
fn redis_records_readiness_and_ready_events() {
    let config = FixtureConfig::load().expect("config");
    let sink = Arc::new(MemoryEventSink::new());
    let redis = FakeRedis::connect(&config, sink.clone()).expect("fake redis");
    assert_eq!(sink.events_named("readiness_wait")[0].outcome, "ready");
    assert_eq!(sink.events_named("fixture_ready").len(), 1);
    redis.close().expect("close");
}

#[tokio::test]
async fn sqs_round_trips_a_message() {
    let sqs = FakeSqs::start("fake-queue").await.expect("fake sqs");
    sqs.client()
        .send_message()
        .queue_url(sqs.queue_url())
        .message_body("Hello!")
        .send()
        .await
        .expect("send message");
    let received = sqs
        .client()
        .receive_message()
        .queue_url(sqs.queue_url())
        .wait_time_seconds(3)
        .send()
        .await
        .expect("receive message");
    let body = received.messages().first().and_then(|message| message.body());
    assert_eq!(body, Some("Hello!"));
}

#[tokio::test]
async fn s3_round_trips_an_object() {
    let s3 = FakeS3::start("mybucket").await.expect("fake s3");
    s3.client()
        .put_object()
        .bucket(s3.bucket())
        .key("mykey")
        .body(ByteStream::from_static(b"Hello!"))
        .send()
        .await
        .expect("put object");
    let object =
        s3.client().get_object().bucket(s3.bucket()).key("mykey").send().await.expect("get object");
    let bytes = object.body.collect().await.expect("read body").into_bytes();
    assert_eq!(&bytes[..], b"Hello!");
}

#[tokio::test]
async fn s3_reuses_an_owned_bucket() {
    FakeS3::start("reused-bucket").await.expect("first connect");
    FakeS3::start("reused-bucket").await.expect("second connect");
}
