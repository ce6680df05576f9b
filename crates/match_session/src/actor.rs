//! One task per session.
//!
//! Commands from both participants and from turn timers go through a
//! single queue, so the engine is only ever mutated by the actor. Each
//! command first reloads the stored record: a missing record ends the
//! session, a longer history is caught up. Every mutation is written to
//! the store before it is broadcast; a failed write rolls the session
//! back and broadcasts nothing.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{SessionError, StoreError};
use crate::protocol::{ClientMessage, ServerMessage, StatusReport};
use crate::record::{MatchRecord, MatchStore};
use crate::session::{Checkpoint, GameEnd, MoveOutcome, Phase, Session};

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

#[derive(Debug)]
enum Command {
    Join {
        player: String,
        reply: Reply<bool>,
    },
    Message {
        player: String,
        message: ClientMessage,
        reply: Reply<Option<ServerMessage>>,
    },
    TimerFired {
        move_count: u64,
    },
    Removed,
    Shutdown,
}

/// Cheap to clone; every clone talks to the same actor.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<ServerMessage>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Receives every broadcast made after this call, in order.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Seats `player` as the second participant. Returns whether the
    /// session became active.
    pub async fn join(&self, player: &str) -> Result<bool, SessionError> {
        self.request(|reply| Command::Join {
            player: player.to_string(),
            reply,
        })
        .await
    }

    /// Delivers one inbound message from `player`. The returned message,
    /// if any, is for that player alone.
    pub async fn send(
        &self,
        player: &str,
        message: ClientMessage,
    ) -> Result<Option<ServerMessage>, SessionError> {
        self.request(|reply| Command::Message {
            player: player.to_string(),
            message,
            reply,
        })
        .await
    }

    pub async fn submit_move(
        &self,
        player: &str,
        notation: &str,
        request_draw: bool,
    ) -> Result<Option<ServerMessage>, SessionError> {
        let message = ClientMessage::Move {
            notation: notation.to_string(),
            request_draw,
        };
        self.send(player, message).await
    }

    pub async fn accept_draw(&self, player: &str) -> Result<Option<ServerMessage>, SessionError> {
        self.send(player, ClientMessage::AcceptDraw).await
    }

    pub async fn status(&self, player: &str) -> Result<StatusReport, SessionError> {
        match self.send(player, ClientMessage::Status).await? {
            Some(ServerMessage::GameStatus { status }) => Ok(status),
            _ => Err(SessionError::Closed),
        }
    }

    /// Tells the actor its record is gone; it broadcasts the removal and stops.
    pub(crate) async fn notify_removed(&self) -> Result<(), SessionError> {
        self.commands
            .send(Command::Removed)
            .await
            .map_err(|_| SessionError::Closed)
    }

    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| SessionError::Closed)
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)?
    }
}

pub(crate) struct SessionActor {
    session: Session,
    record: MatchRecord,
    store: Arc<dyn MatchStore>,
    config: SessionConfig,
    commands: mpsc::Receiver<Command>,
    // Weak so that timers alone do not keep the actor alive.
    timer_tx: mpsc::WeakSender<Command>,
    events: broadcast::Sender<ServerMessage>,
}

impl SessionActor {
    /// Spawns the actor for `session`, whose stored form is `record`.
    pub(crate) fn spawn(
        session: Session,
        record: MatchRecord,
        store: Arc<dyn MatchStore>,
        config: SessionConfig,
    ) -> SessionHandle {
        let id = session.id();
        let (commands_tx, commands) = mpsc::channel(config.command_buffer);
        let (events, _) = broadcast::channel(config.event_buffer);

        // A session resumed mid-game gets a fresh clock for the side to move.
        let resume_timer = match session.phase() {
            Phase::Active => Some(session.move_count()),
            _ => None,
        };

        let actor = SessionActor {
            session,
            record,
            store,
            config,
            commands,
            timer_tx: commands_tx.downgrade(),
            events: events.clone(),
        };
        if let Some(move_count) = resume_timer {
            actor.arm_timer(move_count);
        }
        tokio::spawn(actor.run().instrument(info_span!("session", id = %id)));

        SessionHandle {
            id,
            commands: commands_tx,
            events,
        }
    }

    async fn run(mut self) {
        info!(white = %self.session.white(), "session started");
        while let Some(cmd) = self.commands.recv().await {
            match cmd {
                Command::Shutdown => break,
                Command::Removed => {
                    self.removed();
                    break;
                }
                cmd => {
                    if !self.refresh().await {
                        self.removed();
                        break;
                    }
                    self.handle(cmd).await;
                }
            }
        }
        debug!("session stopped");
    }

    fn removed(&self) {
        info!("match record removed");
        self.broadcast(ServerMessage::SessionRemoved);
    }

    /// Reloads the stored record. Returns false when it no longer exists.
    async fn refresh(&mut self) -> bool {
        match self.store.load(self.session.id()).await {
            Ok(Some(record)) => {
                let before = self.session.phase();
                match self.session.catch_up(&record) {
                    Ok(added) => {
                        if added > 0 {
                            info!(added, "caught up with stored history");
                        }
                        self.resume_after_catch_up(before, added);
                    }
                    Err(e) => error!(error = %e, "stored history cannot be reconciled"),
                }
                self.record = record;
                true
            }
            Ok(None) => false,
            Err(e) => {
                error!(error = %e, "failed to reload match record");
                true
            }
        }
    }

    /// Restarts the clock for moves and seating picked up from the store,
    /// and announces an ending that arrived the same way.
    fn resume_after_catch_up(&self, before: Phase, added: usize) {
        match (before, self.session.phase()) {
            (Phase::Ended(_), _) => {}
            (_, Phase::Ended(end)) => self.broadcast_end(end),
            (Phase::Pending, Phase::Active) => self.arm_timer(self.session.move_count()),
            (_, Phase::Active) if added > 0 => self.arm_timer(self.session.move_count()),
            _ => {}
        }
    }

    async fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Join { player, reply } => {
                let result = self.join(&player).await;
                let _ = reply.send(result);
            }
            Command::Message {
                player,
                message,
                reply,
            } => {
                let result = self.message(&player, message).await;
                let _ = reply.send(result);
            }
            Command::TimerFired { move_count } => self.timer_fired(move_count).await,
            Command::Removed | Command::Shutdown => {}
        }
    }

    async fn join(&mut self, player: &str) -> Result<bool, SessionError> {
        let checkpoint = self.session.checkpoint();
        if !self.session.join(player) {
            debug!(player, "join ignored");
            return Ok(false);
        }
        self.persist(checkpoint).await?;
        info!(player, "second player joined");
        self.broadcast(ServerMessage::GameStart {
            opponent: player.to_string(),
        });
        self.arm_timer(self.session.move_count());
        Ok(true)
    }

    async fn message(
        &mut self,
        player: &str,
        message: ClientMessage,
    ) -> Result<Option<ServerMessage>, SessionError> {
        match message {
            ClientMessage::Move {
                notation,
                request_draw,
            } => self.submit_move(player, &notation, request_draw).await,
            ClientMessage::AcceptDraw => {
                let checkpoint = self.session.checkpoint();
                match self.session.accept_draw(player) {
                    Some(end) => {
                        self.persist(checkpoint).await?;
                        info!(player, "draw agreed");
                        self.broadcast_end(end);
                    }
                    None => debug!(player, "draw acceptance ignored"),
                }
                Ok(None)
            }
            ClientMessage::Status => Ok(Some(ServerMessage::GameStatus {
                status: self.session.status(player),
            })),
        }
    }

    async fn submit_move(
        &mut self,
        player: &str,
        notation: &str,
        request_draw: bool,
    ) -> Result<Option<ServerMessage>, SessionError> {
        let checkpoint = self.session.checkpoint();
        let accepted = match self.session.submit_move(player, notation, request_draw) {
            MoveOutcome::Ignored => {
                debug!(player, notation, "move ignored");
                return Ok(None);
            }
            MoveOutcome::Rejected(e) => {
                warn!(player, notation, error = %e, "move rejected");
                return Ok(Some(ServerMessage::Rejected {
                    reason: e.to_string(),
                }));
            }
            MoveOutcome::Accepted(accepted) => accepted,
        };

        self.persist(checkpoint).await?;
        info!(
            player,
            notation = %accepted.notation,
            draw_offered = accepted.draw_offered,
            "move accepted"
        );
        self.broadcast(ServerMessage::Move {
            notation: accepted.notation,
            draw_requested: accepted.draw_offered,
        });
        match accepted.end {
            Some(end) => self.broadcast_end(end),
            None => self.arm_timer(accepted.move_count),
        }
        Ok(None)
    }

    async fn timer_fired(&mut self, move_count: u64) {
        let checkpoint = self.session.checkpoint();
        let Some(end) = self.session.timer_fired(move_count) else {
            debug!(move_count, "stale turn timer");
            return;
        };
        if self.persist(checkpoint).await.is_err() {
            return;
        }
        info!(winner = ?end.winner, "turn timer expired");
        self.broadcast_end(end);
    }

    /// Writes the session to the store, restoring `checkpoint` on failure.
    async fn persist(&mut self, checkpoint: Checkpoint) -> Result<(), StoreError> {
        let mut record = self.record.clone();
        self.session.write_record(&mut record);
        match self.store.save(&record).await {
            Ok(()) => {
                self.record = record;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "failed to persist match record, rolling back");
                self.session.restore(checkpoint);
                Err(e)
            }
        }
    }

    fn arm_timer(&self, move_count: u64) {
        let tx = self.timer_tx.clone();
        let timeout = self.config.turn_timeout();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(Command::TimerFired { move_count }).await;
            }
        });
    }

    fn broadcast_end(&self, end: GameEnd) {
        info!(winner = ?end.winner, reason = ?end.reason, "game over");
        self.broadcast(ServerMessage::GameEnd {
            winner: end.winner,
            out_of_time: end.out_of_time(),
        });
    }

    fn broadcast(&self, msg: ServerMessage) {
        // No subscribers is not an error.
        let _ = self.events.send(msg);
    }
}
