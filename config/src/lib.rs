#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game configuration registry for the Space Invaders server.
//!
//! The registry is loaded once from a JSON document and shared by reference
//! between the layout system and the running session. Everything except the
//! cheat state is immutable after loading. The cheat state and the movement
//! distances it scales live behind a single mutex and change only through
//! [`GameConfig::toggle_cheat`].

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};
use space_invaders_core::{Dimensions, EntityKind, SpeedParams};
use thiserror::Error;

/// Configuration document compiled into the binary.
pub const BUILTIN_GAME_CONFIG: &str = include_str!("../data/game_config.json");

/// Multiplier applied to the player step distance while cheats are on.
pub const PLAYER_SPEED_HACK_MULTIPLIER: i32 = 5;
/// Multiplier applied to the projectile step distance while cheats are on.
pub const PROJECTILE_SPEED_HACK_MULTIPLIER: i32 = 3;

const MAX_GRID_EXTENT: u32 = 1024;

/// Errors raised while loading a configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document could not be read from disk.
    #[error("failed to read game config from {path:?}: {source}")]
    Read {
        /// Location of the document.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// The document is not valid JSON or is missing fields.
    #[error("failed to parse game config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field holds a value the layout cannot work with.
    #[error("invalid game config field `{field}`: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Human readable description of the violated constraint.
        reason: String,
    },
}

/// Raised when the code asks for an entity kind the configuration never registered.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigIntegrityError {
    /// The `entities` table has no dimensions for the kind.
    #[error("no dimensions registered for {kind}; config and code are out of sync")]
    UnregisteredKind {
        /// Kind that was looked up.
        kind: EntityKind,
    },
}

/// Step parameters for every movable entity kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedTable {
    /// Invader grid movement.
    pub invader: SpeedParams,
    /// Player cannon movement.
    pub player: SpeedParams,
    /// Projectile movement.
    #[serde(alias = "bullet")]
    pub projectile: SpeedParams,
}

/// Serialized form of the game configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    /// Size of the play field.
    pub frame: Dimensions,
    /// Pixel dimensions per entity kind.
    pub entities: BTreeMap<EntityKind, Dimensions>,
    /// Movement parameters.
    pub speed: SpeedTable,
    /// Number of rows in the invader grid.
    pub invader_rows: u32,
    /// Number of columns in the invader grid.
    pub invader_cols: u32,
    /// Odds factor used by the tick loop when invaders pick a shooter.
    pub invaders_shooting_factor: u32,
    /// Number of shields laid out in front of each player.
    pub shields_per_player: u32,
    /// Whether the tick loop should use a fixed random seed.
    pub predictable: bool,
}

/// Player and projectile step parameters observed atomically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpeedSnapshot {
    /// Whether cheat mode was on when the snapshot was taken.
    pub cheats_on: bool,
    /// Player movement parameters.
    pub player: SpeedParams,
    /// Projectile movement parameters.
    pub projectile: SpeedParams,
}

#[derive(Debug)]
struct CheatState {
    cheats_on: bool,
    player: SpeedParams,
    projectile: SpeedParams,
}

/// Shared, read-mostly configuration registry.
#[derive(Debug)]
pub struct GameConfig {
    frame: Dimensions,
    entities: BTreeMap<EntityKind, Dimensions>,
    invader_speed: SpeedParams,
    default_player_speed: SpeedParams,
    default_projectile_speed: SpeedParams,
    invader_rows: u32,
    invader_cols: u32,
    invaders_shooting_factor: u32,
    shields_per_player: u32,
    predictable: bool,
    cheat: Mutex<CheatState>,
}

impl GameConfig {
    /// Loads the configuration document compiled into the binary.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_GAME_CONFIG)
    }

    /// Parses and validates a configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let document: ConfigDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Reads, parses and validates a configuration document from disk.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&contents)?;
        log::info!("loaded game config from {}", path.display());
        Ok(config)
    }

    /// Validates a parsed document and builds the registry from it.
    pub fn from_document(document: ConfigDocument) -> Result<Self, ConfigError> {
        validate(&document)?;
        let ConfigDocument {
            frame,
            entities,
            speed,
            invader_rows,
            invader_cols,
            invaders_shooting_factor,
            shields_per_player,
            predictable,
        } = document;

        Ok(Self {
            frame,
            entities,
            invader_speed: speed.invader,
            default_player_speed: speed.player,
            default_projectile_speed: speed.projectile,
            invader_rows,
            invader_cols,
            invaders_shooting_factor,
            shields_per_player,
            predictable,
            cheat: Mutex::new(CheatState {
                cheats_on: false,
                player: speed.player,
                projectile: speed.projectile,
            }),
        })
    }

    /// Size of the play field.
    #[must_use]
    pub const fn frame(&self) -> Dimensions {
        self.frame
    }

    /// Dimensions registered for the provided entity kind.
    pub fn dimensions(&self, kind: EntityKind) -> Result<Dimensions, ConfigIntegrityError> {
        self.entities
            .get(&kind)
            .copied()
            .ok_or(ConfigIntegrityError::UnregisteredKind { kind })
    }

    /// Dimensions of an invader.
    pub fn invader(&self) -> Result<Dimensions, ConfigIntegrityError> {
        self.dimensions(EntityKind::Invader)
    }

    /// Dimensions of a player cannon.
    pub fn player(&self) -> Result<Dimensions, ConfigIntegrityError> {
        self.dimensions(EntityKind::Player)
    }

    /// Dimensions of a shield block.
    pub fn shield(&self) -> Result<Dimensions, ConfigIntegrityError> {
        self.dimensions(EntityKind::Shield)
    }

    /// Dimensions of a projectile fired by a player.
    pub fn player_projectile(&self) -> Result<Dimensions, ConfigIntegrityError> {
        self.dimensions(EntityKind::PlayerProjectile)
    }

    /// Dimensions of a projectile dropped by an invader.
    pub fn invader_projectile(&self) -> Result<Dimensions, ConfigIntegrityError> {
        self.dimensions(EntityKind::InvaderProjectile)
    }

    /// Number of rows in the invader grid.
    #[must_use]
    pub const fn invader_rows(&self) -> u32 {
        self.invader_rows
    }

    /// Number of columns in the invader grid.
    #[must_use]
    pub const fn invader_cols(&self) -> u32 {
        self.invader_cols
    }

    /// Odds factor used when invaders pick a shooter.
    #[must_use]
    pub const fn invaders_shooting_factor(&self) -> u32 {
        self.invaders_shooting_factor
    }

    /// Number of shields laid out in front of each player.
    #[must_use]
    pub const fn shields_per_player(&self) -> u32 {
        self.shields_per_player
    }

    /// Whether the tick loop should use a fixed random seed.
    #[must_use]
    pub const fn is_predictable(&self) -> bool {
        self.predictable
    }

    /// Invader movement parameters. Unaffected by cheat mode.
    #[must_use]
    pub const fn invader_speed(&self) -> SpeedParams {
        self.invader_speed
    }

    /// Current player movement parameters.
    #[must_use]
    pub fn player_speed(&self) -> SpeedParams {
        self.cheat_state().player
    }

    /// Current projectile movement parameters.
    #[must_use]
    pub fn projectile_speed(&self) -> SpeedParams {
        self.cheat_state().projectile
    }

    /// Player movement parameters as loaded, regardless of cheat mode.
    #[must_use]
    pub const fn default_player_speed(&self) -> SpeedParams {
        self.default_player_speed
    }

    /// Projectile movement parameters as loaded, regardless of cheat mode.
    #[must_use]
    pub const fn default_projectile_speed(&self) -> SpeedParams {
        self.default_projectile_speed
    }

    /// Reports whether cheat mode is currently on.
    #[must_use]
    pub fn cheats_on(&self) -> bool {
        self.cheat_state().cheats_on
    }

    /// Captures cheat mode and both scaled speeds under one lock.
    #[must_use]
    pub fn speeds(&self) -> SpeedSnapshot {
        let state = self.cheat_state();
        SpeedSnapshot {
            cheats_on: state.cheats_on,
            player: state.player,
            projectile: state.projectile,
        }
    }

    /// Flips cheat mode and rescales the player and projectile distances.
    ///
    /// Turning cheats on multiplies the current distances, turning them off
    /// divides them by the same multipliers. Division truncates, so a distance
    /// that changed between two toggles to a value not divisible by its
    /// multiplier does not return to its exact prior value.
    ///
    /// Loading rejects distances whose scaled value does not fit an `i32`,
    /// so the multiplication cannot overflow.
    ///
    /// Returns the new cheat mode.
    pub fn toggle_cheat(&self) -> bool {
        let mut state = self.cheat_state();
        let (player, projectile) = if state.cheats_on {
            (
                state.player.distance() / PLAYER_SPEED_HACK_MULTIPLIER,
                state.projectile.distance() / PROJECTILE_SPEED_HACK_MULTIPLIER,
            )
        } else {
            (
                state.player.distance() * PLAYER_SPEED_HACK_MULTIPLIER,
                state.projectile.distance() * PROJECTILE_SPEED_HACK_MULTIPLIER,
            )
        };

        state.cheats_on = !state.cheats_on;
        state.player = state.player.with_distance(player);
        state.projectile = state.projectile.with_distance(projectile);

        log::info!(
            "cheats {}: player distance {}, projectile distance {}",
            if state.cheats_on { "on" } else { "off" },
            player,
            projectile
        );
        state.cheats_on
    }

    fn cheat_state(&self) -> MutexGuard<'_, CheatState> {
        // Updates assign every field after computing them, so a poisoned
        // guard still holds a consistent state.
        self.cheat.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate(document: &ConfigDocument) -> Result<(), ConfigError> {
    if document.frame.width() <= 0 || document.frame.height() <= 0 {
        return Err(ConfigError::Invalid {
            field: "frame",
            reason: format!(
                "dimensions must be positive (received {}x{})",
                document.frame.width(),
                document.frame.height()
            ),
        });
    }

    let counts = [
        ("invaderRows", document.invader_rows, 1),
        ("invaderCols", document.invader_cols, 1),
        ("shieldsPerPlayer", document.shields_per_player, 0),
    ];
    for (field, value, minimum) in counts {
        if value < minimum || value > MAX_GRID_EXTENT {
            return Err(ConfigError::Invalid {
                field,
                reason: format!("must lie within {minimum}..={MAX_GRID_EXTENT} (received {value})"),
            });
        }
    }

    for (kind, dimensions) in &document.entities {
        if dimensions.width() < 0 || dimensions.height() < 0 {
            return Err(ConfigError::Invalid {
                field: "entities",
                reason: format!(
                    "{kind} dimensions must not be negative (received {}x{})",
                    dimensions.width(),
                    dimensions.height()
                ),
            });
        }
    }

    let scaled = [
        (
            "speed.player",
            document.speed.player,
            PLAYER_SPEED_HACK_MULTIPLIER,
        ),
        (
            "speed.projectile",
            document.speed.projectile,
            PROJECTILE_SPEED_HACK_MULTIPLIER,
        ),
    ];
    for (field, speed, multiplier) in scaled {
        if speed.distance().checked_mul(multiplier).is_none() {
            return Err(ConfigError::Invalid {
                field,
                reason: format!(
                    "distance {} overflows when scaled by the cheat multiplier {multiplier}",
                    speed.distance()
                ),
            });
        }
    }

    Ok(())
}
