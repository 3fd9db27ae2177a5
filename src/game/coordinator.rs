//! Round-robin turn scheduler.
//!
//! ## Turn cycle
//!
//! ```text
//! WaitingTurn --holds token--> Moving -----\
//!             \-lacks token--> Negotiating --> Resolved --> next player
//! ```
//!
//! The coordinator never touches an agent's state directly. It keeps a mirror
//! of every player, updated only from validated turn results, and evaluates
//! termination on that mirror. One turn is in flight at a time. The path a
//! turn took comes from the agent's own report, not from the mirror.
//!
//! Dropping a coordinator aborts any agent tasks it still owns.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::render::{RenderSink, StatusEvent};
use super::setup::GameSetup;
use crate::agent::{AgentSettings, PlayerAgent, PlayerState, TokenBag};
use crate::board::{Grid, Position};
use crate::core::{GameConfig, GameError, GameRng, PlayerId, PlayerMap};
use crate::rules::{candidate, GameOver, MoveCandidate, TerminationPolicy};
use crate::transport::{InitPayload, Mailbox, TurnResult, TurnStatus};

/// Where the coordinator is within the current turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnPhase {
    WaitingTurn,
    Moving,
    Negotiating,
    Resolved,
}

/// What one turn did to the acting player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnOutcome {
    pub player: PlayerId,
    pub new_position: Position,
    pub new_tokens: TokenBag,
    pub blocked_this_turn: bool,
}

/// A resolved turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnReport {
    /// 1-based number of this turn.
    pub turn: u32,
    /// `Moving` or `Negotiating` as reported by the agent; `WaitingTurn` when
    /// no valid result arrived.
    pub phase: TurnPhase,
    pub outcome: TurnOutcome,
    pub game_over: Option<GameOver>,
}

/// How a finished game ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameOutcome {
    pub reason: GameOver,
    /// Turns resolved.
    pub turns: u32,
    /// Final state reported by each agent.
    pub players: PlayerMap<PlayerState>,
    pub trails: PlayerMap<Vec<Position>>,
}

impl GameOutcome {
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        self.reason.winner()
    }
}

/// Check an agent's turn result against the move it was asked to make.
pub fn validate_turn_result(
    acting: PlayerId,
    before: &PlayerState,
    candidate: &MoveCandidate,
    result: &TurnResult,
) -> Result<(), GameError> {
    let malformed = |reason: String| GameError::MalformedMessage {
        player: acting,
        reason,
    };

    if result.player != acting {
        return Err(malformed(format!("turn result signed by {}", result.player)));
    }
    match result.status {
        TurnStatus::Ok if result.position != candidate.cell => Err(malformed(format!(
            "moved to {}, expected {}",
            result.position, candidate.cell
        ))),
        TurnStatus::Blocked { .. } if result.position != before.position => Err(malformed(format!(
            "blocked but reported position {}",
            result.position
        ))),
        _ => Ok(()),
    }
}

/// Drives a game: one agent task per player, one turn at a time.
pub struct TurnCoordinator {
    config: GameConfig,
    grid: Arc<Grid>,
    policy: TerminationPolicy,
    /// Coordinator's view of every player.
    players: PlayerMap<PlayerState>,
    mailboxes: PlayerMap<Mailbox>,
    handles: Vec<JoinHandle<()>>,
    sink: Box<dyn RenderSink>,
    trails: PlayerMap<Vec<Position>>,
    current: PlayerId,
    turn: u32,
    phase: TurnPhase,
    game_over: Option<GameOver>,
}

impl TurnCoordinator {
    /// Spawn one agent per player and send each its starting conditions.
    ///
    /// Agents get independent forks of `rng`.
    pub async fn launch(
        config: GameConfig,
        setup: GameSetup,
        rng: &mut GameRng,
        sink: Box<dyn RenderSink>,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let player_count = setup.player_count();
        if player_count != config.player_count {
            return Err(GameError::InvalidConfig(format!(
                "setup has {player_count} players, config expects {}",
                config.player_count
            )));
        }

        let settings = AgentSettings::from_config(&config);
        let mut mailboxes = Vec::with_capacity(player_count);
        let mut handles = Vec::with_capacity(player_count);
        for id in PlayerId::all(player_count) {
            let (agent, mailbox) = PlayerAgent::new(id, settings, rng.fork());
            handles.push(agent.spawn());
            mailboxes.push(mailbox);
        }
        let mailboxes = PlayerMap::from_vec(mailboxes);

        let roster: Vec<PlayerId> = PlayerId::all(player_count).collect();
        let directory: Vec<Mailbox> = mailboxes.values().cloned().collect();
        for (id, player) in setup.players.iter() {
            let payload = InitPayload {
                start: player.position,
                goal: player.goal,
                tokens: player.tokens.clone(),
                roster: roster.clone(),
            };
            mailboxes[id].init(payload, directory.clone()).await?;
        }

        let trails = PlayerMap::new(player_count, |id| vec![setup.players[id].position]);
        let players = PlayerMap::new(player_count, |id| {
            let p = &setup.players[id];
            PlayerState::new(id, p.position, p.goal, p.tokens.clone())
        });

        info!(
            players = player_count,
            width = setup.grid.width(),
            height = setup.grid.height(),
            "game launched"
        );

        Ok(Self {
            policy: TerminationPolicy::from_config(&config),
            config,
            grid: Arc::new(setup.grid),
            players,
            mailboxes,
            handles,
            sink,
            trails,
            current: PlayerId::new(0),
            turn: 0,
            phase: TurnPhase::WaitingTurn,
            game_over: None,
        })
    }

    #[must_use]
    pub fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    /// The coordinator's view of the players.
    #[must_use]
    pub fn players(&self) -> &PlayerMap<PlayerState> {
        &self.players
    }

    #[must_use]
    pub fn trails(&self) -> &PlayerMap<Vec<Position>> {
        &self.trails
    }

    /// The player who acts next.
    #[must_use]
    pub fn current(&self) -> PlayerId {
        self.current
    }

    /// Turns resolved so far.
    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    #[must_use]
    pub fn game_over(&self) -> Option<GameOver> {
        self.game_over
    }

    /// Play the current player's turn.
    ///
    /// Returns `Ok(None)` once the game has ended. Timeouts, closed channels
    /// and malformed results block the turn; only `OutOfBounds` is returned
    /// as an error.
    pub async fn play_turn(&mut self) -> Result<Option<TurnReport>, GameError> {
        if self.game_over.is_some() {
            return Ok(None);
        }

        let acting = self.current;
        self.phase = TurnPhase::WaitingTurn;
        let before = self.players[acting].clone();

        let outcome = match candidate(&self.grid, before.position, before.goal)? {
            // Already home; the policy ends the game below.
            None => TurnOutcome {
                player: acting,
                new_position: before.position,
                new_tokens: before.tokens.clone(),
                blocked_this_turn: false,
            },
            Some(next) => {
                debug!(player = %acting, cell = %next.cell, required = %next.required, "turn requested");
                let result = self.mailboxes[acting]
                    .request_turn(next.required, self.config.turn_timeout())
                    .await;
                self.apply(acting, &next, result)?
            }
        };

        let phase = self.phase;
        self.phase = TurnPhase::Resolved;
        self.turn += 1;
        self.emit(acting);

        let game_over = self.policy.evaluate(&self.players, acting, self.turn);
        info!(
            turn = self.turn,
            player = %acting,
            position = %outcome.new_position,
            blocked = outcome.blocked_this_turn,
            phase = ?phase,
            "turn resolved"
        );

        match game_over {
            Some(reason) => self.game_over = Some(reason),
            None => {
                self.current = acting.next(self.players.player_count());
                let delay = self.config.turn_delay();
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Ok(Some(TurnReport {
            turn: self.turn,
            phase,
            outcome,
            game_over,
        }))
    }

    /// Validate a turn result and fold it into the mirror.
    ///
    /// Anything but a valid result blocks the turn and leaves the mirror's
    /// position and tokens alone. Fatal errors are returned.
    fn apply(
        &mut self,
        acting: PlayerId,
        next: &MoveCandidate,
        result: Result<TurnResult, GameError>,
    ) -> Result<TurnOutcome, GameError> {
        let result = result.and_then(|result| {
            validate_turn_result(acting, &self.players[acting], next, &result).map(|()| result)
        });

        let player = &mut self.players[acting];
        let blocked = match result {
            Ok(result) => {
                debug!(player = %acting, conversation = %result.conversation(), status = ?result.status, "turn result accepted");
                self.phase = if result.negotiated {
                    TurnPhase::Negotiating
                } else {
                    TurnPhase::Moving
                };
                player.tokens = result.tokens;
                match result.status {
                    TurnStatus::Ok => {
                        player.position = result.position;
                        player.consecutive_blocks = 0;
                        false
                    }
                    TurnStatus::Blocked { permanent } => {
                        let streak = player.record_block();
                        if permanent != (streak >= self.policy.max_blocked_turns) {
                            debug!(player = %acting, streak, permanent, "block streak differs from agent");
                        }
                        true
                    }
                }
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(player = %acting, error = %e, "turn counted as blocked");
                player.record_block();
                true
            }
        };

        Ok(TurnOutcome {
            player: acting,
            new_position: player.position,
            new_tokens: player.tokens.clone(),
            blocked_this_turn: blocked,
        })
    }

    fn emit(&mut self, acting: PlayerId) {
        let player = &self.players[acting];
        let trail = &mut self.trails[acting];
        if trail.last() != Some(&player.position) {
            trail.push(player.position);
        }
        let event = StatusEvent {
            player: acting,
            position: player.position,
            goal: player.goal,
            trail: trail.clone(),
        };
        self.sink.update_position(&event);
    }

    /// Play until a termination condition holds, then stop every agent.
    pub async fn run(mut self) -> Result<GameOutcome, GameError> {
        let reason = loop {
            match self.play_turn().await {
                Ok(Some(TurnReport {
                    game_over: Some(reason),
                    ..
                })) => break reason,
                Ok(Some(_)) => {}
                Ok(None) => match self.game_over {
                    Some(reason) => break reason,
                    None => continue,
                },
                Err(e) => {
                    error!(error = %e, turn = self.turn, "game aborted");
                    self.shutdown().await;
                    return Err(e);
                }
            }
        };

        let players = self.collect_final_states().await;
        self.shutdown().await;
        info!(%reason, turns = self.turn, "game over");

        Ok(GameOutcome {
            reason,
            turns: self.turn,
            players,
            trails: self.trails.clone(),
        })
    }

    /// Ask every agent for its state; fall back to the mirror if one is silent.
    async fn collect_final_states(&self) -> PlayerMap<PlayerState> {
        let mut states = Vec::with_capacity(self.players.player_count());
        for (id, mailbox) in self.mailboxes.iter() {
            match mailbox.snapshot(self.config.turn_timeout()).await {
                Ok(state) => states.push(state),
                Err(e) => {
                    warn!(player = %id, error = %e, "using coordinator state");
                    states.push(self.players[id].clone());
                }
            }
        }
        PlayerMap::from_vec(states)
    }

    async fn shutdown(&mut self) {
        for mailbox in self.mailboxes.values() {
            mailbox.shutdown().await;
        }
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "agent task failed");
            }
        }
    }
}

impl Drop for TurnCoordinator {
    fn drop(&mut self) {
        // Agents hold each other's mailboxes, so their inboxes never close.
        for handle in &self.handles {
            handle.abort();
        }
    }
}
