//! Binding of received commands to the session that carries out their effects.

use std::{any::Any, sync::Arc};

use thiserror::Error;

use crate::{Command, CommandEnvelope, Direction, EntityId, Transport};

/// Capability surface a running game session exposes to commands.
///
/// Implementations are shared between concurrently dispatched commands, so
/// every effect takes `&self` and performs its own synchronisation.
pub trait SessionController: Send + Sync {
    /// Flips the global cheat mode.
    fn toggle_cheat(&self);

    /// Moves the addressed player a single step in the provided direction.
    fn move_player(&self, player: EntityId, direction: Direction) -> Result<(), DispatchError>;
}

/// Shared handle to the session controller a command is bound to.
pub type Executor = Arc<dyn SessionController>;

/// Errors raised while binding or executing a command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The object offered for binding is not an [`Executor`] handle.
    #[error("command {type_id} can only be bound to an Executor handle")]
    ExecutorTypeMismatch {
        /// Type identifier of the command being bound.
        type_id: &'static str,
    },
    /// The command was executed before an executor was bound.
    #[error("command {type_id} executed before an executor was bound")]
    UnboundExecutor {
        /// Type identifier of the command being executed.
        type_id: &'static str,
    },
    /// The command addressed a player that does not exist in the session.
    #[error("no player with id {player} exists in the session")]
    UnknownPlayer {
        /// Identifier carried by the command.
        player: EntityId,
    },
}

/// Errors raised while decoding a command wire frame.
#[derive(Debug, Error)]
pub enum CommandDecodeError {
    /// The frame is not a JSON document.
    #[error("command frame is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    /// The frame does not carry a `typeId` string.
    #[error("command frame is missing its typeId")]
    MissingTypeId,
    /// The `typeId` does not name a known command.
    #[error("unknown command type '{0}'")]
    UnknownType(String),
    /// The payload fields do not match the command type.
    #[error("command payload is invalid: {0}")]
    InvalidPayload(serde_json::Error),
}

/// A received command together with the executor it is bound to.
///
/// The binding is transient: it is established once per received envelope,
/// immediately before [`Dispatch::execute`], and never serialized.
pub struct Dispatch {
    envelope: CommandEnvelope,
    executor: Option<Executor>,
}

impl Dispatch {
    /// Wraps a received envelope that has not been bound yet.
    #[must_use]
    pub fn new(envelope: CommandEnvelope) -> Self {
        Self {
            envelope,
            executor: None,
        }
    }

    /// Wire-level identifier of the wrapped command.
    #[must_use]
    pub fn type_id(&self) -> &'static str {
        self.envelope.type_id()
    }

    /// Transport affinity recorded in the wrapped envelope.
    #[must_use]
    pub fn transport(&self) -> Transport {
        self.envelope.transport()
    }

    /// Envelope carried by the dispatch.
    #[must_use]
    pub fn envelope(&self) -> &CommandEnvelope {
        &self.envelope
    }

    /// Reports whether an executor has been bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.executor.is_some()
    }

    /// Binds the command to the session that will carry out its effect.
    ///
    /// Binding again replaces the previous executor.
    pub fn set_executor(&mut self, executor: Executor) {
        self.executor = Some(executor);
    }

    /// Binds the command to a dynamically typed executor.
    ///
    /// The object must be an [`Executor`] handle; anything else is a wiring
    /// defect reported as [`DispatchError::ExecutorTypeMismatch`].
    pub fn set_executor_dyn(&mut self, executor: &dyn Any) -> Result<(), DispatchError> {
        let executor = executor.downcast_ref::<Executor>().ok_or(
            DispatchError::ExecutorTypeMismatch {
                type_id: self.envelope.type_id(),
            },
        )?;
        self.executor = Some(Arc::clone(executor));
        Ok(())
    }

    /// Invokes the bound executor's effect for the wrapped command.
    pub fn execute(&self) -> Result<(), DispatchError> {
        let executor = self
            .executor
            .as_ref()
            .ok_or(DispatchError::UnboundExecutor {
                type_id: self.type_id(),
            })?;

        match *self.envelope.command() {
            Command::ToggleCheat { .. } => {
                executor.toggle_cheat();
                Ok(())
            }
            Command::MovePlayer {
                player_id,
                direction,
            } => executor.move_player(player_id, direction),
        }
    }
}

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatch")
            .field("envelope", &self.envelope)
            .field("bound", &self.executor.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use super::*;

    #[derive(Default)]
    struct RecordingController {
        toggles: AtomicUsize,
        moves: Mutex<Vec<(EntityId, Direction)>>,
    }

    impl SessionController for RecordingController {
        fn toggle_cheat(&self) {
            let _ = self.toggles.fetch_add(1, Ordering::SeqCst);
        }

        fn move_player(&self, player: EntityId, direction: Direction) -> Result<(), DispatchError> {
            if player.get() > 10 {
                return Err(DispatchError::UnknownPlayer { player });
            }
            self.moves
                .lock()
                .expect("moves mutex poisoned")
                .push((player, direction));
            Ok(())
        }
    }

    fn toggle_envelope() -> CommandEnvelope {
        CommandEnvelope::new(Command::ToggleCheat {
            player_id: EntityId::new(1),
        })
    }

    #[test]
    fn execute_before_binding_is_rejected() {
        let dispatch = Dispatch::new(toggle_envelope());

        assert!(!dispatch.is_bound());
        assert_eq!(
            dispatch.execute(),
            Err(DispatchError::UnboundExecutor {
                type_id: "ToggleCheat"
            })
        );
    }

    #[test]
    fn toggle_invokes_bound_controller() {
        let controller = Arc::new(RecordingController::default());
        let mut dispatch = Dispatch::new(toggle_envelope());
        dispatch.set_executor(controller.clone());

        dispatch.execute().expect("bound command executes");
        dispatch.execute().expect("bound command executes again");

        assert_eq!(controller.toggles.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn move_forwards_payload_to_controller() {
        let controller = Arc::new(RecordingController::default());
        let mut dispatch = Dispatch::new(CommandEnvelope::new(Command::MovePlayer {
            player_id: EntityId::new(4),
            direction: Direction::Right,
        }));
        dispatch.set_executor(controller.clone());

        dispatch.execute().expect("move executes");

        let moves = controller.moves.lock().expect("moves mutex poisoned");
        assert_eq!(moves.as_slice(), &[(EntityId::new(4), Direction::Right)]);
    }

    #[test]
    fn controller_errors_propagate() {
        let controller: Executor = Arc::new(RecordingController::default());
        let mut dispatch = Dispatch::new(CommandEnvelope::new(Command::MovePlayer {
            player_id: EntityId::new(99),
            direction: Direction::Left,
        }));
        dispatch.set_executor(controller);

        assert_eq!(
            dispatch.execute(),
            Err(DispatchError::UnknownPlayer {
                player: EntityId::new(99)
            })
        );
    }

    #[test]
    fn dynamic_binding_accepts_executor_handle() {
        let controller = Arc::new(RecordingController::default());
        let executor: Executor = controller.clone();
        let mut dispatch = Dispatch::new(toggle_envelope());

        dispatch
            .set_executor_dyn(&executor)
            .expect("executor handle binds");
        dispatch.execute().expect("bound command executes");

        assert_eq!(controller.toggles.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dynamic_binding_rejects_foreign_object() {
        let mut dispatch = Dispatch::new(toggle_envelope());
        let not_a_session = String::from("game loop");

        assert_eq!(
            dispatch.set_executor_dyn(&not_a_session),
            Err(DispatchError::ExecutorTypeMismatch {
                type_id: "ToggleCheat"
            })
        );
        assert!(!dispatch.is_bound(), "failed binding must leave command unbound");
    }

    #[test]
    fn dynamic_binding_of_bare_controller_names_the_expected_handle() {
        let mut dispatch = Dispatch::new(toggle_envelope());
        let controller = Arc::new(RecordingController::default());

        let error = dispatch
            .set_executor_dyn(&controller)
            .expect_err("a concrete controller handle is not an Executor");
        assert_eq!(
            error.to_string(),
            "command ToggleCheat can only be bound to an Executor handle"
        );
        assert_eq!(controller.toggles.load(Ordering::SeqCst), 0);
    }
}
