use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast::error::TryRecvError;
use uuid::Uuid;

use match_session::{
    ClientMessage, InMemoryStore, MatchRecord, MatchStore, ServerMessage, SessionConfig,
    SessionError, SessionHub, Side, StoreError, Winner,
};

/// In-memory store whose writes can be switched to fail.
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryStore,
    fail_saves: AtomicBool,
}

#[async_trait]
impl MatchStore for FlakyStore {
    async fn load(&self, id: Uuid) -> Result<Option<MatchRecord>, StoreError> {
        self.inner.load(id).await
    }

    async fn save(&self, record: &MatchRecord) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.inner.save(record).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete(id).await
    }
}

fn hub_with(store: Arc<dyn MatchStore>) -> SessionHub {
    SessionHub::new(store, SessionConfig::default())
}

fn moved(notation: &str, draw_requested: bool) -> ServerMessage {
    ServerMessage::Move {
        notation: notation.to_string(),
        draw_requested,
    }
}

#[tokio::test]
async fn test_draw_offer_and_acceptance_end_to_end() {
    let store = Arc::new(InMemoryStore::new());
    let hub = hub_with(store.clone());
    let handle = hub.host("alice").await.unwrap();
    let mut events = handle.subscribe();

    assert!(handle.join("bob").await.unwrap());
    assert_eq!(
        events.recv().await.unwrap(),
        ServerMessage::GameStart {
            opponent: "bob".to_string()
        }
    );

    assert_eq!(handle.submit_move("alice", "e2e4", false).await.unwrap(), None);
    assert_eq!(handle.submit_move("bob", "e7e5", false).await.unwrap(), None);
    assert_eq!(handle.submit_move("alice", "g1f3", true).await.unwrap(), None);
    assert_eq!(handle.accept_draw("bob").await.unwrap(), None);

    assert_eq!(events.recv().await.unwrap(), moved("e2e4", false));
    assert_eq!(events.recv().await.unwrap(), moved("e7e5", false));
    assert_eq!(events.recv().await.unwrap(), moved("g1f3", true));
    assert_eq!(
        events.recv().await.unwrap(),
        ServerMessage::GameEnd {
            winner: Winner::Draw,
            out_of_time: false
        }
    );

    let record = store.load(handle.id()).await.unwrap().unwrap();
    assert_eq!(record.history, vec!["e2e4", "e7e5", "g1f3"]);
    assert_eq!(record.result, Some(Winner::Draw));
    assert!(!record.out_of_time);
    assert!(!record.alive);
    assert!(record.ended_at.is_some());
}

#[tokio::test]
async fn test_out_of_turn_and_rejected_moves() {
    let hub = hub_with(Arc::new(InMemoryStore::new()));
    let handle = hub.host("alice").await.unwrap();
    handle.join("bob").await.unwrap();
    let mut events = handle.subscribe();

    // Black cannot open, and a spectator cannot move at all.
    assert_eq!(handle.submit_move("bob", "e7e5", false).await.unwrap(), None);
    assert_eq!(handle.submit_move("carol", "e2e4", false).await.unwrap(), None);

    match handle.submit_move("alice", "e2e5", false).await.unwrap() {
        Some(ServerMessage::Rejected { reason }) => assert!(reason.contains("e2e5")),
        other => panic!("expected a rejection, got {other:?}"),
    }

    handle.submit_move("alice", "e2e4", false).await.unwrap();
    assert_eq!(handle.submit_move("alice", "d2d4", false).await.unwrap(), None);

    assert_eq!(events.recv().await.unwrap(), moved("e2e4", false));
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));

    let status = handle.status("bob").await.unwrap();
    assert_eq!(status.moves, vec!["e2e4"]);
    assert_eq!(status.turn, Some(Side::Black));
    assert_eq!(status.whoami, Some(Side::Black));
}

#[tokio::test]
async fn test_status_message_replies_to_sender_only() {
    let hub = hub_with(Arc::new(InMemoryStore::new()));
    let handle = hub.host("alice").await.unwrap();
    let mut events = handle.subscribe();

    let reply = handle.send("alice", ClientMessage::Status).await.unwrap();
    match reply {
        Some(ServerMessage::GameStatus { status }) => {
            assert_eq!(status.white, "alice");
            assert_eq!(status.black, None);
            assert_eq!(status.turn, None);
        }
        other => panic!("unexpected reply {other:?}"),
    }
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn test_turn_timeout_forfeits() {
    let store = Arc::new(InMemoryStore::new());
    let hub = hub_with(store.clone());
    let handle = hub.host("alice").await.unwrap();
    let mut events = handle.subscribe();

    handle.join("bob").await.unwrap();
    handle.submit_move("alice", "e2e4", false).await.unwrap();
    assert!(matches!(events.recv().await.unwrap(), ServerMessage::GameStart { .. }));
    assert_eq!(events.recv().await.unwrap(), moved("e2e4", false));

    // Bob never answers.
    assert_eq!(
        events.recv().await.unwrap(),
        ServerMessage::GameEnd {
            winner: Winner::White,
            out_of_time: true
        }
    );

    let record = store.load(handle.id()).await.unwrap().unwrap();
    assert_eq!(record.result, Some(Winner::White));
    assert!(record.out_of_time);

    // Late moves after the forfeit are ignored.
    assert_eq!(handle.submit_move("bob", "e7e5", false).await.unwrap(), None);
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn test_stale_timer_does_not_forfeit() {
    let hub = hub_with(Arc::new(InMemoryStore::new()));
    let handle = hub.host("alice").await.unwrap();
    let mut events = handle.subscribe();
    handle.join("bob").await.unwrap();

    // White moves just before the first timer runs out.
    tokio::time::sleep(Duration::from_secs(590)).await;
    handle.submit_move("alice", "e2e4", false).await.unwrap();
    tokio::time::sleep(Duration::from_secs(20)).await;

    let status = handle.status("alice").await.unwrap();
    assert_eq!(status.victory, None);
    assert_eq!(status.turn, Some(Side::Black));

    assert!(matches!(events.recv().await.unwrap(), ServerMessage::GameStart { .. }));
    assert_eq!(events.recv().await.unwrap(), moved("e2e4", false));
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));

    // The timer armed by white's move is live and catches black.
    assert_eq!(
        events.recv().await.unwrap(),
        ServerMessage::GameEnd {
            winner: Winner::White,
            out_of_time: true
        }
    );
}

#[tokio::test]
async fn test_failed_write_rolls_back_and_broadcasts_nothing() {
    let store = Arc::new(FlakyStore::default());
    let hub = hub_with(store.clone());
    let handle = hub.host("alice").await.unwrap();
    handle.join("bob").await.unwrap();
    let mut events = handle.subscribe();

    store.fail_saves.store(true, Ordering::SeqCst);
    let err = handle.submit_move("alice", "e2e4", false).await.unwrap_err();
    assert!(matches!(err, SessionError::Store(StoreError::Backend(_))));
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));

    let status = handle.status("alice").await.unwrap();
    assert!(status.moves.is_empty());
    assert_eq!(status.turn, Some(Side::White));

    store.fail_saves.store(false, Ordering::SeqCst);
    handle.submit_move("alice", "e2e4", false).await.unwrap();
    assert_eq!(events.recv().await.unwrap(), moved("e2e4", false));
}

#[tokio::test]
async fn test_failed_join_stays_pending() {
    let store = Arc::new(FlakyStore::default());
    let hub = hub_with(store.clone());
    let handle = hub.host("alice").await.unwrap();

    store.fail_saves.store(true, Ordering::SeqCst);
    assert!(handle.join("bob").await.is_err());
    let status = handle.status("alice").await.unwrap();
    assert_eq!(status.black, None);

    store.fail_saves.store(false, Ordering::SeqCst);
    assert!(handle.join("bob").await.unwrap());
}

#[tokio::test]
async fn test_catches_up_with_history_written_elsewhere() {
    let store = Arc::new(InMemoryStore::new());
    let hub = hub_with(store.clone());
    let handle = hub.host("alice").await.unwrap();
    handle.join("bob").await.unwrap();

    // Another node accepted white's move; this actor missed it.
    let mut record = store.load(handle.id()).await.unwrap().unwrap();
    record.history.push("d2d4".to_string());
    store.save(&record).await.unwrap();

    assert_eq!(handle.submit_move("bob", "d7d5", false).await.unwrap(), None);
    let status = handle.status("alice").await.unwrap();
    assert_eq!(status.moves, vec!["d2d4", "d7d5"]);
    assert_eq!(status.turn, Some(Side::White));
}

#[tokio::test(start_paused = true)]
async fn test_caught_up_move_restarts_the_clock() {
    let store = Arc::new(InMemoryStore::new());
    let hub = hub_with(store.clone());
    let handle = hub.host("alice").await.unwrap();
    handle.join("bob").await.unwrap();
    let mut events = handle.subscribe();

    let mut record = store.load(handle.id()).await.unwrap().unwrap();
    record.history.push("d2d4".to_string());
    store.save(&record).await.unwrap();

    let status = handle.status("bob").await.unwrap();
    assert_eq!(status.turn, Some(Side::Black));

    // The clock armed at join is stale now; black still runs out of time.
    assert_eq!(
        events.recv().await.unwrap(),
        ServerMessage::GameEnd {
            winner: Winner::White,
            out_of_time: true
        }
    );
    assert_eq!(handle.status("bob").await.unwrap().victory, Some(Winner::White));
}

#[tokio::test]
async fn test_caught_up_mate_is_announced() {
    let store = Arc::new(InMemoryStore::new());
    let hub = hub_with(store.clone());
    let handle = hub.host("alice").await.unwrap();
    handle.join("bob").await.unwrap();
    let mut events = handle.subscribe();

    let mut record = store.load(handle.id()).await.unwrap().unwrap();
    record.history = ["f2f3", "e7e5", "g2g4", "d8h4"]
        .iter()
        .map(|m| m.to_string())
        .collect();
    store.save(&record).await.unwrap();

    let status = handle.status("alice").await.unwrap();
    assert_eq!(status.victory, Some(Winner::Black));
    assert_eq!(status.turn, None);
    assert_eq!(
        events.try_recv().unwrap(),
        ServerMessage::GameEnd {
            winner: Winner::Black,
            out_of_time: false
        }
    );
}

#[tokio::test]
async fn test_removed_record_ends_session() {
    let store = Arc::new(InMemoryStore::new());
    let hub = hub_with(store.clone());
    let handle = hub.host("alice").await.unwrap();
    let mut events = handle.subscribe();

    assert!(hub.remove(handle.id()).await.unwrap());
    assert_eq!(events.recv().await.unwrap(), ServerMessage::SessionRemoved);
    assert!(matches!(
        handle.join("bob").await,
        Err(SessionError::Closed)
    ));
    assert!(matches!(
        hub.open(handle.id()).await,
        Err(SessionError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_record_deleted_behind_the_sessions_back() {
    let store = Arc::new(InMemoryStore::new());
    let hub = hub_with(store.clone());
    let handle = hub.host("alice").await.unwrap();
    let mut events = handle.subscribe();

    store.delete(handle.id()).await.unwrap();
    assert!(matches!(
        handle.status("alice").await,
        Err(SessionError::Closed)
    ));
    assert_eq!(events.recv().await.unwrap(), ServerMessage::SessionRemoved);
}

#[tokio::test]
async fn test_reopen_replays_stored_game() {
    let store = Arc::new(InMemoryStore::new());
    let hub = hub_with(store.clone());
    let handle = hub.host("alice").await.unwrap();
    let id = handle.id();
    handle.join("bob").await.unwrap();
    handle.submit_move("alice", "e2e4", false).await.unwrap();
    handle.submit_move("bob", "c7c5", false).await.unwrap();

    hub.shutdown().await;
    let reopened = hub.open(id).await.unwrap();
    let status = reopened.status("bob").await.unwrap();
    assert_eq!(status.moves, vec!["e2e4", "c7c5"]);
    assert_eq!(status.turn, Some(Side::White));

    // Same running actor on a second open.
    let again = hub.open(id).await.unwrap();
    again.submit_move("alice", "g1f3", false).await.unwrap();
    assert_eq!(reopened.status("alice").await.unwrap().moves.len(), 3);
}
