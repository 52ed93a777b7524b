#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Space Invaders server.
//!
//! This crate defines the vocabulary that connects the configuration registry,
//! the authoritative world, the layout system and the session controller.
//! Remote players submit [`Command`] values wrapped in a [`CommandEnvelope`]
//! that records the transport the command is expected to travel over. The
//! session binds each received envelope to a [`SessionController`] through a
//! [`Dispatch`] and executes it.

use std::fmt;

use serde::{Deserialize, Serialize};

mod dispatch;

pub use dispatch::{CommandDecodeError, Dispatch, DispatchError, Executor, SessionController};

/// Name of the wire field that identifies the concrete command type.
pub const TYPE_ID_FIELD: &str = "typeId";

/// Closed set of entity categories simulated by the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Member of the descending invader grid.
    Invader,
    /// Cannon controlled by a remote player.
    Player,
    /// Destructible block protecting a player.
    Shield,
    /// Projectile fired upwards by a player.
    PlayerProjectile,
    /// Projectile dropped by an invader.
    InvaderProjectile,
}

impl EntityKind {
    /// Every entity kind in declaration order.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Invader,
        EntityKind::Player,
        EntityKind::Shield,
        EntityKind::PlayerProjectile,
        EntityKind::InvaderProjectile,
    ];

    /// Reports whether the kind describes a projectile pool.
    #[must_use]
    pub const fn is_projectile(self) -> bool {
        matches!(self, Self::PlayerProjectile | Self::InvaderProjectile)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Invader => "invader",
            Self::Player => "player",
            Self::Shield => "shield",
            Self::PlayerProjectile => "player projectile",
            Self::InvaderProjectile => "invader projectile",
        };
        f.write_str(name)
    }
}

/// Pixel extent of an entity or of the play-field frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    width: i32,
    height: i32,
}

impl Dimensions {
    /// Creates a new extent from explicit pixel values.
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Horizontal extent in pixels.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Vertical extent in pixels.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }
}

/// Movement parameters of a movable entity kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeedParams {
    distance: i32,
    rate: i32,
}

impl SpeedParams {
    /// Creates movement parameters from a step distance and a step rate.
    #[must_use]
    pub const fn new(distance: i32, rate: i32) -> Self {
        Self { distance, rate }
    }

    /// Pixels travelled per movement step.
    #[must_use]
    pub const fn distance(&self) -> i32 {
        self.distance
    }

    /// Interval between movement steps in milliseconds.
    #[must_use]
    pub const fn rate(&self) -> i32 {
        self.rate
    }

    /// Returns a copy with the distance replaced.
    #[must_use]
    pub const fn with_distance(self, distance: i32) -> Self {
        Self {
            distance,
            rate: self.rate,
        }
    }
}

/// Pixel position of an entity's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    x: i32,
    y: i32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate, increasing to the right.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical coordinate, increasing downwards.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the position shifted horizontally by `dx` pixels, saturating
    /// at the bounds of `i32`.
    #[must_use]
    pub const fn shifted_x(self, dx: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y,
        }
    }
}

/// Unique identifier assigned to a placed entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Horizontal direction of a player step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Towards decreasing x.
    Left,
    /// Towards increasing x.
    Right,
}

impl Direction {
    /// Sign applied to a step distance travelling in this direction.
    #[must_use]
    pub const fn signum(self) -> i32 {
        match self {
            Self::Left => -1,
            Self::Right => 1,
        }
    }
}

/// Transport channel a command is expected to travel over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transport {
    /// Reliable, ordered stream delivery.
    #[serde(rename = "TCP")]
    Tcp,
    /// Low-latency datagram delivery without ordering guarantees.
    #[serde(rename = "UDP")]
    Udp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("TCP"),
            Self::Udp => f.write_str("UDP"),
        }
    }
}

/// Commands that remote players may submit to a running session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "typeId")]
pub enum Command {
    /// Flips the global cheat mode that scales player and projectile speeds.
    ToggleCheat {
        /// Player that issued the toggle. Recorded but not used by the effect.
        #[serde(rename = "playerId")]
        player_id: EntityId,
    },
    /// Moves a player a single step sideways.
    MovePlayer {
        /// Player entity that should move.
        #[serde(rename = "playerId")]
        player_id: EntityId,
        /// Direction of the step.
        direction: Direction,
    },
}

impl Command {
    /// Type identifiers of every known command, used to demultiplex wire frames.
    pub const TYPE_IDS: [&'static str; 2] = ["ToggleCheat", "MovePlayer"];

    /// Wire-level identifier of the command type.
    #[must_use]
    pub const fn type_id(&self) -> &'static str {
        match self {
            Self::ToggleCheat { .. } => Self::TYPE_IDS[0],
            Self::MovePlayer { .. } => Self::TYPE_IDS[1],
        }
    }

    /// Transport the command declares it should travel over.
    #[must_use]
    pub const fn transport(&self) -> Transport {
        match self {
            Self::ToggleCheat { .. } | Self::MovePlayer { .. } => Transport::Udp,
        }
    }

    /// Player that issued the command.
    #[must_use]
    pub const fn player_id(&self) -> EntityId {
        match self {
            Self::ToggleCheat { player_id } | Self::MovePlayer { player_id, .. } => *player_id,
        }
    }
}

/// Serializable wrapper pairing a command with its declared transport affinity.
///
/// On the wire an envelope is a flat JSON object carrying `typeId`,
/// `transportAffinity` and the command's payload fields side by side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(flatten)]
    command: Command,
    #[serde(rename = "transportAffinity")]
    transport: Transport,
}

impl CommandEnvelope {
    /// Wraps a command using the transport affinity the command declares.
    #[must_use]
    pub fn new(command: Command) -> Self {
        let transport = command.transport();
        Self { command, transport }
    }

    /// Wire-level identifier of the wrapped command.
    #[must_use]
    pub fn type_id(&self) -> &'static str {
        self.command.type_id()
    }

    /// Transport affinity recorded in the envelope.
    #[must_use]
    pub const fn transport(&self) -> Transport {
        self.transport
    }

    /// Command carried by the envelope.
    #[must_use]
    pub const fn command(&self) -> &Command {
        &self.command
    }

    /// Reports whether the recorded affinity differs from the command's own.
    #[must_use]
    pub fn affinity_mismatch(&self) -> bool {
        self.transport != self.command.transport()
    }

    /// Encodes the envelope into a JSON wire frame.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decodes an envelope from a JSON wire frame.
    ///
    /// The `typeId` field is inspected before the payload so that frames
    /// for unknown command types are reported as such rather than as
    /// generic payload errors.
    pub fn decode(bytes: &[u8]) -> Result<Self, CommandDecodeError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        let type_id = value
            .get(TYPE_ID_FIELD)
            .and_then(serde_json::Value::as_str)
            .ok_or(CommandDecodeError::MissingTypeId)?;
        if !Command::TYPE_IDS.contains(&type_id) {
            return Err(CommandDecodeError::UnknownType(type_id.to_owned()));
        }
        serde_json::from_value(value).map_err(CommandDecodeError::InvalidPayload)
    }
}

impl From<Command> for CommandEnvelope {
    fn from(command: Command) -> Self {
        Self::new(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_cheat_declares_udp_affinity() {
        let command = Command::ToggleCheat {
            player_id: EntityId::new(3),
        };
        assert_eq!(command.transport(), Transport::Udp);
        assert_eq!(command.type_id(), "ToggleCheat");
    }

    #[test]
    fn envelope_wire_shape_is_flat() {
        let envelope = CommandEnvelope::new(Command::MovePlayer {
            player_id: EntityId::new(7),
            direction: Direction::Left,
        });
        let bytes = envelope.encode_to_vec().expect("encode");
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json");

        assert_eq!(value["typeId"], "MovePlayer");
        assert_eq!(value["transportAffinity"], "UDP");
        assert_eq!(value["playerId"], 7);
        assert_eq!(value["direction"], "LEFT");
    }

    #[test]
    fn decode_accepts_hand_written_frame() {
        let frame = br#"{"typeId":"ToggleCheat","transportAffinity":"UDP","playerId":2}"#;
        let envelope = CommandEnvelope::decode(frame).expect("frame decodes");

        assert_eq!(
            envelope.command(),
            &Command::ToggleCheat {
                player_id: EntityId::new(2)
            }
        );
        assert_eq!(envelope.transport(), Transport::Udp);
        assert!(!envelope.affinity_mismatch());
    }

    #[test]
    fn decode_preserves_declared_transport_even_when_it_differs() {
        let frame = br#"{"typeId":"ToggleCheat","transportAffinity":"TCP","playerId":2}"#;
        let envelope = CommandEnvelope::decode(frame).expect("frame decodes");

        assert_eq!(envelope.transport(), Transport::Tcp);
        assert!(envelope.affinity_mismatch());
    }

    #[test]
    fn decode_rejects_unknown_type() {
        let frame = br#"{"typeId":"LaunchNukes","transportAffinity":"TCP"}"#;
        let error = CommandEnvelope::decode(frame).expect_err("unknown type must fail");

        assert!(matches!(error, CommandDecodeError::UnknownType(ref name) if name == "LaunchNukes"));
    }

    #[test]
    fn decode_rejects_missing_type_id() {
        let frame = br#"{"transportAffinity":"UDP","playerId":1}"#;
        let error = CommandEnvelope::decode(frame).expect_err("missing type must fail");

        assert!(matches!(error, CommandDecodeError::MissingTypeId));
    }

    #[test]
    fn decode_rejects_missing_payload_field() {
        let frame = br#"{"typeId":"MovePlayer","transportAffinity":"UDP","playerId":1}"#;
        let error = CommandEnvelope::decode(frame).expect_err("direction is required");

        assert!(matches!(error, CommandDecodeError::InvalidPayload(_)));
    }

    #[test]
    fn direction_signum_matches_axis() {
        assert_eq!(Direction::Left.signum(), -1);
        assert_eq!(Direction::Right.signum(), 1);
    }

    #[test]
    fn projectile_kinds_are_flagged() {
        let projectiles: Vec<EntityKind> = EntityKind::ALL
            .into_iter()
            .filter(|kind| kind.is_projectile())
            .collect();
        assert_eq!(
            projectiles,
            vec![EntityKind::PlayerProjectile, EntityKind::InvaderProjectile]
        );
    }
}
