#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Running game session that receives remote commands.
//!
//! A [`GameSession`] only exists once the layout system has produced a fully
//! built world, so no command can observe a partially placed world. Commands
//! may be dispatched concurrently: world mutations are serialised by the
//! session's world lock and cheat toggles by the configuration registry.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use space_invaders_config::GameConfig;
use space_invaders_core::{
    CommandDecodeError, CommandEnvelope, Direction, Dispatch, DispatchError, EntityId, EntityKind,
    Executor, Position, SessionController,
};
use space_invaders_system_layout::{self as layout, LayoutError};
use space_invaders_world::{
    query::{self, WorldSnapshot},
    World,
};
use thiserror::Error;

/// Errors raised while handling a received wire frame.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The frame could not be decoded into a command.
    #[error(transparent)]
    Decode(#[from] CommandDecodeError),
    /// The decoded command could not be executed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Authoritative session state shared by every connection.
#[derive(Debug)]
pub struct GameSession {
    config: Arc<GameConfig>,
    world: Mutex<World>,
    player_width: i32,
}

impl GameSession {
    /// Lays out a world for a team of the provided size and starts a session on it.
    pub fn start(config: Arc<GameConfig>, team_size: u32) -> Result<Arc<Self>, LayoutError> {
        let world = layout::build(&config, team_size)?;
        let player_width = config.player()?.width();
        log::info!(
            "session started for {team_size} player(s), {} invaders",
            query::count(&world, EntityKind::Invader).unwrap_or(0)
        );
        Ok(Arc::new(Self {
            config,
            world: Mutex::new(world),
            player_width,
        }))
    }

    /// Configuration registry shared with the session.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Captures a serializable snapshot of the current world.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        query::snapshot(&self.lock_world())
    }

    /// Runs a read-only query against the current world.
    pub fn with_world<R>(&self, read: impl FnOnce(&World) -> R) -> R {
        read(&self.lock_world())
    }

    /// Binds the envelope to this session and executes it.
    ///
    /// A transport affinity that differs from the command's own is logged
    /// but does not prevent execution.
    pub fn dispatch(
        self: &Arc<Self>,
        envelope: impl Into<CommandEnvelope>,
    ) -> Result<(), DispatchError> {
        let envelope = envelope.into();
        if envelope.affinity_mismatch() {
            log::warn!(
                "{} arrived tagged {} but declares {}",
                envelope.type_id(),
                envelope.transport(),
                envelope.command().transport()
            );
        }

        let player = envelope.command().player_id();
        let mut dispatch = Dispatch::new(envelope);
        let executor: Executor = Arc::clone(self) as Executor;
        dispatch.set_executor(executor);
        dispatch.execute()?;
        log::debug!("executed {} from player {player}", dispatch.type_id());
        Ok(())
    }

    /// Decodes a wire frame and dispatches the resulting command.
    pub fn dispatch_bytes(self: &Arc<Self>, frame: &[u8]) -> Result<(), SessionError> {
        let envelope = CommandEnvelope::decode(frame)?;
        self.dispatch(envelope)?;
        Ok(())
    }

    fn lock_world(&self) -> MutexGuard<'_, World> {
        // Mutations replace a single position after computing it, so a
        // poisoned guard still holds a consistent world.
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionController for GameSession {
    fn toggle_cheat(&self) {
        let _ = self.config.toggle_cheat();
    }

    fn move_player(&self, player: EntityId, direction: Direction) -> Result<(), DispatchError> {
        let distance = self.config.player_speed().distance();
        let max_x = (self.config.frame().width() - self.player_width).max(0);

        let mut world = self.lock_world();
        let entity = world
            .entity_mut(EntityKind::Player, player)
            .ok_or(DispatchError::UnknownPlayer { player })?;
        let x = entity.x();
        let stepped = entity
            .position()
            .shifted_x(distance.saturating_mul(direction.signum()));
        // Never push a player against the requested direction, even when
        // the layout placed it past the frame edge.
        let target = match direction {
            Direction::Left => stepped.x().max(0).min(x),
            Direction::Right => stepped.x().min(max_x).max(x),
        };
        entity.set_position(Position::new(target, stepped.y()));
        Ok(())
    }
}
