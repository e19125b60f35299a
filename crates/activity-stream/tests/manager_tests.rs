//! Integration tests for the connection manager.
//!
//! A scripted transport stands in for the network: each `connect` pops the
//! next script, which is either a refusal or a channel the test pushes
//! messages into. Tests run on a paused Tokio clock, so reconnect delays and
//! handshake deadlines elapse instantly while their ordering stays exact.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use activity_core::{ActivityState, ActivityStore, ConnectionStatus};
use activity_stream::{
    ConnectionManager, FeedMessage, FeedStream, FeedTransport, ManagerConfig, RETRY_MESSAGE,
    StreamError,
};
use activity_types::NodeIdentity;
use futures::StreamExt;
use futures::channel::mpsc::{UnboundedSender, unbounded};
use tokio::time::{Instant, timeout};

type Message = Result<FeedMessage, StreamError>;

enum Script {
    Refuse,
    Stream(futures::channel::mpsc::UnboundedReceiver<Message>),
}

#[derive(Clone, Default)]
struct ScriptedFeed {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    attempts: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedFeed {
    fn refuse(&self) {
        self.scripts.lock().unwrap().push_back(Script::Refuse);
    }

    /// Queue a connection and return the sender that drives it.
    fn open(&self, initial: Vec<Message>) -> UnboundedSender<Message> {
        let (tx, rx) = unbounded();
        for message in initial {
            tx.unbounded_send(message).unwrap();
        }
        self.scripts.lock().unwrap().push_back(Script::Stream(rx));
        tx
    }

    fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }
}

impl FeedTransport for ScriptedFeed {
    async fn connect(&self) -> Result<FeedStream, StreamError> {
        self.attempts.lock().unwrap().push(Instant::now());
        let next = self.scripts.lock().unwrap().pop_front();
        match next {
            Some(Script::Stream(rx)) => Ok(rx.boxed()),
            Some(Script::Refuse) | None => {
                Err(StreamError::Transport(String::from("connection refused")))
            }
        }
    }

    fn endpoint(&self) -> &str {
        "scripted://feed"
    }
}

/// A transport whose connect never completes.
#[derive(Clone, Default)]
struct HangingFeed {
    attempts: Arc<Mutex<Vec<Instant>>>,
}

impl FeedTransport for HangingFeed {
    async fn connect(&self) -> Result<FeedStream, StreamError> {
        self.attempts.lock().unwrap().push(Instant::now());
        std::future::pending().await
    }

    fn endpoint(&self) -> &str {
        "hanging://feed"
    }
}

fn activity(kind: &str, entity: &str, name: &str, id: &str) -> Message {
    Ok(FeedMessage::Activity(format!(
        r#"{{"ts":1,"event":"{kind}","type":"{entity}","name":"{name}","id":"{id}"}}"#
    )))
}

fn manager(feed: &ScriptedFeed) -> (ConnectionManager<ScriptedFeed>, Arc<ActivityStore>) {
    let store = Arc::new(ActivityStore::new());
    let manager = ConnectionManager::new(feed.clone(), Arc::clone(&store), ManagerConfig::default());
    (manager, store)
}

async fn wait_until<F>(store: &ActivityStore, predicate: F) -> Arc<ActivityState>
where
    F: Fn(&ActivityState) -> bool,
{
    let mut rx = store.subscribe();
    let state = timeout(Duration::from_secs(120), rx.wait_for(|s| predicate(s)))
        .await
        .unwrap()
        .unwrap();
    Arc::clone(&state)
}

#[tokio::test(start_paused = true)]
async fn reconnects_once_after_the_fixed_delay() {
    let feed = ScriptedFeed::default();
    let first = feed.open(vec![Ok(FeedMessage::Connected)]);
    let _second = feed.open(vec![Ok(FeedMessage::Connected)]);
    let (mut manager, store) = manager(&feed);

    manager.start();
    wait_until(&store, |s| s.status == ConnectionStatus::Connected).await;

    // Server closes the stream.
    drop(first);
    let retrying = wait_until(&store, |s| s.status == ConnectionStatus::Retrying).await;
    assert_eq!(retrying.last_error.as_deref(), Some(RETRY_MESSAGE));

    let connected = wait_until(&store, |s| s.status == ConnectionStatus::Connected).await;
    assert!(connected.last_error.is_none());

    let attempts = feed.attempts();
    assert_eq!(attempts.len(), 2);
    let gap = attempts
        .get(1)
        .unwrap()
        .checked_duration_since(*attempts.first().unwrap())
        .unwrap();
    assert!(gap >= Duration::from_millis(3000));

    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn burst_of_errors_schedules_a_single_reconnect() {
    let feed = ScriptedFeed::default();
    let _first = feed.open(vec![
        Ok(FeedMessage::Connected),
        Err(StreamError::Transport(String::from("reset"))),
        Err(StreamError::Transport(String::from("reset again"))),
        Err(StreamError::Closed),
    ]);
    let _second = feed.open(vec![Ok(FeedMessage::Connected)]);
    let (mut manager, store) = manager(&feed);

    manager.start();
    wait_until(&store, |s| s.status == ConnectionStatus::Retrying).await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(feed.attempts().len(), 2);
    assert_eq!(store.snapshot().status, ConnectionStatus::Connected);

    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_a_pending_reconnect() {
    let feed = ScriptedFeed::default();
    feed.refuse();
    let (mut manager, store) = manager(&feed);

    manager.start();
    wait_until(&store, |s| s.status == ConnectionStatus::Retrying).await;
    manager.stop().await;

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(feed.attempts().len(), 1);
    assert_eq!(store.snapshot().status, ConnectionStatus::Disconnected);
    assert!(!manager.is_running());
}

#[tokio::test(start_paused = true)]
async fn stop_closes_an_open_connection() {
    let feed = ScriptedFeed::default();
    let tx = feed.open(vec![Ok(FeedMessage::Connected)]);
    let (mut manager, store) = manager(&feed);

    manager.start();
    wait_until(&store, |s| s.status == ConnectionStatus::Connected).await;
    manager.stop().await;

    assert!(tx.is_closed());
    assert_eq!(store.snapshot().status, ConnectionStatus::Disconnected);

    // Stopping twice is harmless.
    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn start_while_running_is_ignored() {
    let feed = ScriptedFeed::default();
    let _tx = feed.open(vec![Ok(FeedMessage::Connected)]);
    let (mut manager, store) = manager(&feed);

    manager.start();
    manager.start();
    wait_until(&store, |s| s.status == ConnectionStatus::Connected).await;
    manager.start();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(feed.attempts().len(), 1);
    assert!(manager.is_running());
    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn events_are_reduced_in_arrival_order() {
    let feed = ScriptedFeed::default();
    let _tx = feed.open(vec![
        Ok(FeedMessage::Connected),
        activity("start", "agent", "planner", "a1"),
        activity("start", "skill", "pdf", "s1"),
        activity("end", "skill", "pdf", "s1"),
    ]);
    let (mut manager, store) = manager(&feed);

    manager.start();
    let state = wait_until(&store, |s| s.history.len() == 3).await;

    assert!(state.active.is_active(&NodeIdentity::agent("planner")));
    assert!(!state.active.is_active(&NodeIdentity::skill("pdf")));
    assert_eq!(state.active.len(), 1);
    let ids: Vec<&str> = state.history.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "s1", "s1"]);

    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn malformed_payloads_are_skipped() {
    let feed = ScriptedFeed::default();
    let _tx = feed.open(vec![
        Ok(FeedMessage::Connected),
        Ok(FeedMessage::Activity(String::from("not json at all"))),
        activity("start", "agent", "planner", "a1"),
        Ok(FeedMessage::Activity(String::from(r#"{"ts":2}"#))),
        Ok(FeedMessage::Other {
            event: String::from("message"),
        }),
        activity("start", "skill", "pdf", "s1"),
    ]);
    let (mut manager, store) = manager(&feed);

    manager.start();
    let state = wait_until(&store, |s| s.history.len() == 2).await;

    assert_eq!(state.status, ConnectionStatus::Connected);
    assert_eq!(state.active.len(), 2);
    assert_eq!(feed.attempts().len(), 1);

    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn missing_handshake_times_out() {
    let feed = ScriptedFeed::default();
    let _silent = feed.open(Vec::new());
    let (mut manager, store) = manager(&feed);

    let began = Instant::now();
    manager.start();
    let state = wait_until(&store, |s| s.status == ConnectionStatus::Retrying).await;

    assert!(began.elapsed() >= Duration::from_secs(10));
    assert_eq!(state.last_error.as_deref(), Some(RETRY_MESSAGE));

    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn connect_that_never_completes_times_out() {
    let feed = HangingFeed::default();
    let store = Arc::new(ActivityStore::new());
    let mut manager =
        ConnectionManager::new(feed.clone(), Arc::clone(&store), ManagerConfig::default());

    let began = Instant::now();
    manager.start();
    let state = wait_until(&store, |s| s.status == ConnectionStatus::Retrying).await;

    assert!(began.elapsed() >= Duration::from_secs(10));
    assert_eq!(state.last_error.as_deref(), Some(RETRY_MESSAGE));

    // The next attempt follows the usual reconnect delay.
    wait_until(&store, |s| s.status == ConnectionStatus::Connecting).await;
    assert_eq!(feed.attempts.lock().unwrap().len(), 2);

    manager.stop().await;
    assert_eq!(store.snapshot().status, ConnectionStatus::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn active_set_survives_reconnect() {
    let feed = ScriptedFeed::default();
    let first = feed.open(vec![
        Ok(FeedMessage::Connected),
        activity("start", "agent", "planner", "a1"),
    ]);
    let _second = feed.open(vec![
        Ok(FeedMessage::Connected),
        activity("end", "agent", "planner", "a1"),
    ]);
    let (mut manager, store) = manager(&feed);

    manager.start();
    wait_until(&store, |s| s.history.len() == 1).await;
    drop(first);

    let retrying = wait_until(&store, |s| s.status == ConnectionStatus::Retrying).await;
    assert!(retrying.active.is_active(&NodeIdentity::agent("planner")));

    let state = wait_until(&store, |s| s.history.len() == 2).await;
    assert!(state.active.is_empty());

    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn dropping_the_manager_disconnects() {
    let feed = ScriptedFeed::default();
    let tx = feed.open(vec![Ok(FeedMessage::Connected)]);
    let (mut manager, store) = manager(&feed);

    manager.start();
    wait_until(&store, |s| s.status == ConnectionStatus::Connected).await;
    drop(manager);

    tokio::task::yield_now().await;
    assert_eq!(store.snapshot().status, ConnectionStatus::Disconnected);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(tx.is_closed());

    // No reconnect is attempted after the drop.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(feed.attempts().len(), 1);
    assert_eq!(store.snapshot().status, ConnectionStatus::Disconnected);
}
