//! The external AI turn driver for WebSocket games.
//!
//! Unlike the engine's synchronous driver, this one interleaves event
//! broadcasts and step-mode pauses between AI actions. The caller holds
//! the room's engine lock for the whole drive; the step signal lives
//! outside the lock so `continue` frames can land meanwhile.

use std::time::Duration;

use futures::FutureExt;
use railbird_shared::{AiActionPublic, GamePhase, ServerMsg};

use crate::config::Config;
use crate::error::EngineError;
use crate::game::GameEngine;
use crate::server::state::GameRoom;

const MAX_DRIVER_ITERATIONS: usize = 50;
const MAX_SAME_SEAT_REPEATS: usize = 5;

#[derive(Clone, Debug)]
pub struct DriveOpts {
    pub show_ai_thinking: bool,
    pub step_mode: bool,
    pub step_timeout: Duration,
    pub pace: Duration,
}

impl DriveOpts {
    pub fn new(config: &Config, show_ai_thinking: bool, step_mode: bool) -> Self {
        DriveOpts {
            show_ai_thinking,
            step_mode,
            step_timeout: Duration::from_secs(config.step_timeout_secs),
            pace: Duration::from_millis(config.ai_action_delay_ms),
        }
    }
}

/// Drive AI turns until the human holds the turn or the hand settles,
/// broadcasting an `ai_action` and a `state_update` per action. Engine
/// failures are broadcast as `error` frames; the next `state_update`
/// always reflects the real engine state.
pub async fn drive_ai_turns(engine: &mut GameEngine, room: &GameRoom, opts: &DriveOpts) {
    if let Err(e) = drive_inner(engine, room, opts).await {
        tracing::error!(error = %e, "AI driver aborted");
        room.broadcast(ServerMsg::Error {
            message: e.to_string(),
        });
        room.broadcast(ServerMsg::StateUpdate(engine.snapshot(opts.show_ai_thinking)));
    }
}

async fn drive_inner(
    engine: &mut GameEngine,
    room: &GameRoom,
    opts: &DriveOpts,
) -> Result<(), EngineError> {
    loop {
        run_betting_loop(engine, room, opts).await?;

        if !engine.betting_round_complete() {
            // Waiting on the human; make sure observers see whose turn
            // it is, since the last broadcast predates the turn change.
            room.broadcast(ServerMsg::StateUpdate(engine.snapshot(opts.show_ai_thinking)));
            return Ok(());
        }

        let advanced = engine.advance_state(false)?;
        if advanced {
            room.broadcast(ServerMsg::StateUpdate(engine.snapshot(opts.show_ai_thinking)));
        }
        if !advanced || engine.phase == GamePhase::Showdown {
            return Ok(());
        }
        match engine.current_player() {
            Some(p) if !p.is_human => continue, // next street starts with AI
            _ => return Ok(()),
        }
    }
}

async fn run_betting_loop(
    engine: &mut GameEngine,
    room: &GameRoom,
    opts: &DriveOpts,
) -> Result<(), EngineError> {
    let mut iterations = 0usize;
    let mut last_seat: Option<usize> = None;
    let mut same_seat_repeats = 0usize;

    loop {
        if engine.betting_round_complete() {
            return Ok(());
        }
        let Some(seat) = engine.current_player_index else {
            return Ok(());
        };

        iterations += 1;
        if iterations > MAX_DRIVER_ITERATIONS {
            tracing::error!(seat, "WebSocket AI driver exceeded iteration limit");
            return Ok(());
        }
        if last_seat == Some(seat) {
            same_seat_repeats += 1;
            if same_seat_repeats > MAX_SAME_SEAT_REPEATS {
                tracing::error!(seat, "WebSocket AI driver stuck on one seat");
                return Ok(());
            }
        } else {
            same_seat_repeats = 0;
        }
        last_seat = Some(seat);

        let player = &engine.players[seat];
        if player.is_human && !player.has_acted && !player.all_in {
            return Ok(()); // the human's turn: wait for their frame
        }
        if !player.is_active || player.all_in || player.has_acted {
            engine.advance_actor();
            continue;
        }

        let report = engine.step_ai_turn()?;
        room.broadcast(ServerMsg::AiAction(AiActionPublic {
            player_id: report.player_id.clone(),
            player_name: report.player_name.clone(),
            action: report.action,
            amount: report.amount,
            reasoning: opts.show_ai_thinking.then(|| report.reasoning.clone()),
            stack_after: report.stack_after,
            pot_after: report.pot_after,
            bet_amount: report.bet_amount,
        }));
        room.broadcast(ServerMsg::StateUpdate(engine.snapshot(opts.show_ai_thinking)));

        if opts.step_mode {
            pause_for_continue(room, opts, &report.player_name, report.action).await;
        } else {
            tokio::time::sleep(opts.pace).await;
        }

        if report.triggers_showdown || engine.current_player_index.is_none() {
            return Ok(());
        }
        engine.advance_actor();
    }
}

/// The step-mode rendezvous: announce the pause, clear any stale
/// signal, then wait for `continue` with a hard timeout.
async fn pause_for_continue(
    room: &GameRoom,
    opts: &DriveOpts,
    player_name: &str,
    action: railbird_shared::ActionKind,
) {
    // Drain a permit left over from an earlier, unawaited continue.
    room.step.notified().now_or_never();

    room.broadcast(ServerMsg::AwaitingContinue {
        player_name: player_name.to_owned(),
        action,
    });

    match tokio::time::timeout(opts.step_timeout, room.step.notified()).await {
        Ok(()) => {
            // A short beat so the action stays visible before the next one.
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        Err(_) => {
            tracing::info!(player = player_name, "step mode timed out, auto-resuming");
            room.broadcast(ServerMsg::AutoResumed {
                reason: "timeout".to_owned(),
                timeout_seconds: opts.step_timeout.as_secs(),
            });
        }
    }
}
