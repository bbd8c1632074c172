//! End-to-end relay scenarios over an in-memory feed

use std::sync::Arc;
use std::time::Duration;

use relay_rs::feed::{ChangeFeedSource, MemoryFeed, Operation};
use relay_rs::{RelayConfig, RelayService};

fn make_service(feed: &Arc<MemoryFeed>) -> RelayService {
    let config = RelayConfig::with_prefix("acme_")
        .keep_alive_interval(Duration::from_secs(25))
        .restart_delay(Duration::from_secs(3));
    RelayService::new(config, Arc::clone(feed) as Arc<dyn ChangeFeedSource>)
}

async fn next_text(stream: &mut relay_rs::service::ClientStream) -> String {
    let frame = tokio::time::timeout(Duration::from_secs(1), stream.recv())
        .await
        .expect("frame within deadline")
        .expect("stream open");
    String::from_utf8(frame.to_vec()).unwrap()
}

#[tokio::test]
async fn two_viewers_see_the_same_change() {
    let feed = Arc::new(MemoryFeed::new());
    let service = make_service(&feed);

    let (id1, mut stream1) = service.subscribe().await;
    let (id2, mut stream2) = service.subscribe().await;
    assert_eq!(id1, 1);
    assert_eq!(id2, 2);

    assert_eq!(
        next_text(&mut stream1).await,
        "event: connected\ndata: {\"clientId\":1}\n\n"
    );
    assert_eq!(
        next_text(&mut stream2).await,
        "event: connected\ndata: {\"clientId\":2}\n\n"
    );

    feed.emit(Operation::Insert, "acme_orders");

    let expected = "event: change\ndata: {\"operationType\":\"insert\",\
                    \"collection\":\"orders\",\"fullCollection\":\"acme_orders\"}\n\n";
    assert_eq!(next_text(&mut stream1).await, expected);
    assert_eq!(next_text(&mut stream2).await, expected);

    // After viewer 1 leaves, only viewer 2 receives the next change.
    drop(stream1);
    assert!(!service.registry().contains(id1));

    feed.emit(Operation::Delete, "acme_orders");
    let frame = next_text(&mut stream2).await;
    assert!(frame.contains("\"operationType\":\"delete\""));
    assert_eq!(service.registry().len(), 1);
}

#[tokio::test]
async fn feed_stays_closed_without_viewers() {
    let feed = Arc::new(MemoryFeed::new());
    let service = make_service(&feed);

    feed.emit(Operation::Insert, "acme_orders");
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(feed.subscribe_attempts(), 0);
    assert!(!service.watcher().is_running().await);
}

#[tokio::test]
async fn events_outside_the_prefix_are_not_relayed() {
    let feed = Arc::new(MemoryFeed::new());
    let service = make_service(&feed);

    let (_id, mut stream) = service.subscribe().await;
    next_text(&mut stream).await; // connected

    feed.emit(Operation::Insert, "unrelated_audit");
    feed.emit(Operation::Insert, "acme_orders");

    // The first relayed frame is the in-prefix change.
    let frame = next_text(&mut stream).await;
    assert!(frame.contains("\"fullCollection\":\"acme_orders\""));
}

#[tokio::test(start_paused = true)]
async fn relay_survives_a_feed_outage() {
    let feed = Arc::new(MemoryFeed::new());
    let service = make_service(&feed);

    let (_id, mut stream) = service.subscribe().await;
    next_text(&mut stream).await; // connected

    feed.emit(Operation::Insert, "acme_orders");
    next_text(&mut stream).await;

    // The feed dies; the viewer notices nothing.
    feed.fail("connection reset");
    tokio::time::sleep(Duration::from_secs(4)).await;

    // After the restart delay the subscription reopened with the resume
    // token from the last processed event.
    assert_eq!(feed.subscribe_attempts(), 2);
    let history = feed.resume_history();
    assert!(history[1].is_some());

    feed.emit(Operation::Update, "acme_orders");
    let frame = next_text(&mut stream).await;
    assert!(frame.contains("\"operationType\":\"update\""));
}

#[tokio::test]
async fn reconnecting_viewer_gets_a_fresh_id() {
    let feed = Arc::new(MemoryFeed::new());
    let service = make_service(&feed);

    let (id1, stream1) = service.subscribe().await;
    drop(stream1);

    let (id2, _stream2) = service.subscribe().await;
    assert!(id2 > id1);
}
