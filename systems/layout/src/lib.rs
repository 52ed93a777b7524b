#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic layout system that places the initial entities of a session.
//!
//! [`WorldBuilder`] accumulates into a single [`World`] in four phases:
//! invaders, players, shields and empty projectile pools. Shields are laid
//! out relative to the players, so the player phase must run first. The
//! geometry of each phase is also exposed as a pure function so callers can
//! inspect it without building a world.

use std::fmt;

use space_invaders_config::{ConfigIntegrityError, GameConfig};
use space_invaders_core::{EntityId, EntityKind, Position};
use space_invaders_world::{LogicEntity, World};
use thiserror::Error;

/// Build phases in the order they must run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Places the invader grid.
    Invaders,
    /// Places the player squad.
    Players,
    /// Places the shields in front of each player.
    Shields,
    /// Creates the empty projectile pools.
    Bullets,
}

impl Phase {
    /// Every phase in build order.
    pub const ORDER: [Phase; 4] = [
        Phase::Invaders,
        Phase::Players,
        Phase::Shields,
        Phase::Bullets,
    ];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Invaders => "invaders",
            Self::Players => "players",
            Self::Shields => "shields",
            Self::Bullets => "bullets",
        };
        f.write_str(name)
    }
}

/// Reasons the layout of a session cannot be produced.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The configuration lacks dimensions for a kind the phase needs.
    #[error(transparent)]
    Config(#[from] ConfigIntegrityError),
    /// The requested team is empty.
    #[error("team size must be at least 1 (received {team_size})")]
    InvalidArgument {
        /// Team size that failed validation.
        team_size: u32,
    },
    /// The configured entities do not fit inside the frame.
    #[error("{phase} do not fit the frame (horizontal offset {offset_x}, vertical offset {offset_y})")]
    Infeasible {
        /// Phase whose geometry failed.
        phase: Phase,
        /// Computed horizontal centering offset.
        offset_x: i64,
        /// Computed vertical offset.
        offset_y: i64,
    },
    /// A phase ran before the phase it depends on.
    #[error("{phase} cannot be built before {requires}")]
    MissingDependency {
        /// Phase that was requested.
        phase: Phase,
        /// Phase that must run first.
        requires: Phase,
    },
    /// The world was requested before every phase ran.
    #[error("world requested before the {missing} phase ran")]
    Incomplete {
        /// First phase that has not run.
        missing: Phase,
    },
}

/// Geometry of the invader grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvaderGrid {
    /// Horizontal distance between neighbouring columns.
    pub jump_x: i32,
    /// Vertical distance between neighbouring rows.
    pub jump_y: i32,
    /// Position of the top-left invader.
    pub origin: Position,
    /// Number of rows.
    pub rows: u32,
    /// Number of columns.
    pub cols: u32,
}

/// Geometry of the player squad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerRow {
    /// Horizontal distance between neighbouring players.
    ///
    /// The stride equals the centering offset of the first player rather than
    /// the nominal `3 * player width` spacing.
    pub stride: i32,
    /// Position of the leftmost player.
    pub origin: Position,
    /// Number of players.
    pub team_size: u32,
}

/// Placement of a shield cluster relative to its player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShieldCluster {
    /// Horizontal offset of the first shield from the player's x.
    pub dx: i32,
    /// Vertical offset of every shield from the player's y.
    pub dy: i32,
    /// Horizontal distance between neighbouring shields.
    pub step: i32,
    /// Number of shields per player.
    pub count: u32,
}

/// Computes the invader grid geometry from the configuration.
pub fn invader_grid(config: &GameConfig) -> Result<InvaderGrid, LayoutError> {
    let frame_width = config.frame().width();
    let invader = config.invader()?;
    let projectile = config.player_projectile()?;
    let rows = config.invader_rows();
    let cols = config.invader_cols();

    let jump_x = i64::from(invader.width()) + i64::from(projectile.width()) * 3;
    let jump_y = i64::from(invader.height()) + i64::from(invader.height()) / 2;
    let offset_x = centering_offset(frame_width, cols, jump_x, invader.width());
    let offset_y = i64::from(invader.height());

    let origin = positive_origin(Phase::Invaders, offset_x, offset_y)?;
    let jump = to_position(Phase::Invaders, jump_x, jump_y)?;
    Ok(InvaderGrid {
        jump_x: jump.x(),
        jump_y: jump.y(),
        origin,
        rows,
        cols,
    })
}

/// Computes the player row geometry for a team of the provided size.
pub fn player_row(config: &GameConfig, team_size: u32) -> Result<PlayerRow, LayoutError> {
    if team_size == 0 {
        return Err(LayoutError::InvalidArgument { team_size });
    }

    let frame = config.frame();
    let player = config.player()?;
    let jump_x = i64::from(player.width()) * 3;
    let offset_x = centering_offset(frame.width(), team_size, jump_x, player.width());
    let offset_y = i64::from(frame.height())
        - i64::from(player.height())
        - i64::from(player.height()) / 2;

    if offset_x <= 0 {
        return Err(LayoutError::Infeasible {
            phase: Phase::Players,
            offset_x,
            offset_y,
        });
    }
    let origin = to_position(Phase::Players, offset_x, offset_y)?;
    Ok(PlayerRow {
        stride: origin.x(),
        origin,
        team_size,
    })
}

/// Computes where the shields sit relative to each player.
pub fn shield_cluster(config: &GameConfig) -> Result<ShieldCluster, LayoutError> {
    let shield = config.shield()?;
    let player = config.player()?;
    let count = config.shields_per_player();

    let dx = i64::from(player.width()) / 2
        - i64::from(shield.width()) / 2
        - i64::from(shield.width()) * i64::from(count) / 2;
    let dy = i64::from(player.height()) - i64::from(shield.height()) * 2;
    let offset = to_position(Phase::Shields, dx, dy)?;
    Ok(ShieldCluster {
        dx: offset.x(),
        dy: offset.y(),
        step: shield.width(),
        count,
    })
}

/// Builder that lays out the entities of one world.
///
/// Intended for a single use: run every phase once, then call
/// [`WorldBuilder::finish`].
#[derive(Debug)]
pub struct WorldBuilder<'config> {
    config: &'config GameConfig,
    team_size: u32,
    world: World,
    next_id: u32,
    completed: Vec<Phase>,
}

impl<'config> WorldBuilder<'config> {
    /// Creates a builder for a team of the provided size.
    pub fn new(config: &'config GameConfig, team_size: u32) -> Result<Self, LayoutError> {
        if team_size == 0 {
            return Err(LayoutError::InvalidArgument { team_size });
        }
        Ok(Self {
            config,
            team_size,
            world: World::new(),
            next_id: 0,
            completed: Vec::with_capacity(Phase::ORDER.len()),
        })
    }

    /// Places the invader grid row by row, left to right.
    pub fn build_invaders(&mut self) -> Result<(), LayoutError> {
        let grid = invader_grid(self.config)?;

        let mut invaders = Vec::with_capacity((grid.rows * grid.cols) as usize);
        for row in 0..grid.rows {
            let offset_y = i64::from(grid.origin.y()) + i64::from(row) * i64::from(grid.jump_y);
            for col in 0..grid.cols {
                let offset_x =
                    i64::from(grid.origin.x()) + i64::from(col) * i64::from(grid.jump_x);
                let position = to_position(Phase::Invaders, offset_x, offset_y)?;
                invaders.push(self.place(EntityKind::Invader, position));
            }
        }

        log::debug!(
            "placed {} invaders in a {}x{} grid at {:?}",
            invaders.len(),
            grid.rows,
            grid.cols,
            grid.origin
        );
        self.world.set_entities(EntityKind::Invader, invaders);
        self.complete(Phase::Invaders);
        Ok(())
    }

    /// Places the player squad left to right near the bottom of the frame.
    pub fn build_players(&mut self) -> Result<(), LayoutError> {
        let row = player_row(self.config, self.team_size)?;

        let mut players = Vec::with_capacity(row.team_size as usize);
        for index in 0..row.team_size {
            let offset_x = i64::from(row.origin.x()) + i64::from(index) * i64::from(row.stride);
            let position = to_position(Phase::Players, offset_x, i64::from(row.origin.y()))?;
            players.push(self.place(EntityKind::Player, position));
        }

        log::debug!("placed {} players with stride {}", players.len(), row.stride);
        self.world.set_entities(EntityKind::Player, players);
        self.complete(Phase::Players);
        Ok(())
    }

    /// Places a cluster of shields in front of every player.
    ///
    /// Fails with [`LayoutError::MissingDependency`] when the players have
    /// not been built yet.
    pub fn build_shields(&mut self) -> Result<(), LayoutError> {
        let anchors: Vec<Position> = self
            .world
            .entities(EntityKind::Player)
            .ok_or(LayoutError::MissingDependency {
                phase: Phase::Shields,
                requires: Phase::Players,
            })?
            .map(LogicEntity::position)
            .collect();
        let cluster = shield_cluster(self.config)?;

        let mut shields = Vec::with_capacity(anchors.len() * cluster.count as usize);
        for anchor in anchors {
            let origin_x = i64::from(anchor.x()) + i64::from(cluster.dx);
            let offset_y = i64::from(anchor.y()) + i64::from(cluster.dy);
            for index in 0..cluster.count {
                let offset_x = origin_x + i64::from(index) * i64::from(cluster.step);
                let position = to_position(Phase::Shields, offset_x, offset_y)?;
                shields.push(self.place(EntityKind::Shield, position));
            }
        }

        log::debug!("placed {} shields", shields.len());
        self.world.set_entities(EntityKind::Shield, shields);
        self.complete(Phase::Shields);
        Ok(())
    }

    /// Creates empty pools for both projectile kinds.
    pub fn build_bullets(&mut self) -> Result<(), LayoutError> {
        for kind in EntityKind::ALL.into_iter().filter(|kind| kind.is_projectile()) {
            self.world.set_entities(kind, Vec::new());
        }
        self.complete(Phase::Bullets);
        Ok(())
    }

    /// Returns the world once every phase has run.
    pub fn finish(self) -> Result<World, LayoutError> {
        if let Some(missing) = Phase::ORDER
            .into_iter()
            .find(|phase| !self.completed.contains(phase))
        {
            return Err(LayoutError::Incomplete { missing });
        }
        Ok(self.world)
    }

    fn place(&mut self, kind: EntityKind, position: Position) -> LogicEntity {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        LogicEntity::new(id, kind, position)
    }

    fn complete(&mut self, phase: Phase) {
        if !self.completed.contains(&phase) {
            self.completed.push(phase);
        }
    }
}

/// Runs every layout phase in order and returns the finished world.
pub fn build(config: &GameConfig, team_size: u32) -> Result<World, LayoutError> {
    let mut builder = WorldBuilder::new(config, team_size)?;
    builder.build_invaders()?;
    builder.build_players()?;
    builder.build_shields()?;
    builder.build_bullets()?;
    builder.finish()
}

fn centering_offset(frame_width: i32, count: u32, jump: i64, width: i32) -> i64 {
    let span = i64::from(count) * jump;
    let slack = (i64::from(width) - jump).abs();
    (i64::from(frame_width) - span + slack) / 2
}

fn positive_origin(phase: Phase, offset_x: i64, offset_y: i64) -> Result<Position, LayoutError> {
    if offset_x <= 0 || offset_y <= 0 {
        return Err(LayoutError::Infeasible {
            phase,
            offset_x,
            offset_y,
        });
    }
    to_position(phase, offset_x, offset_y)
}

fn to_position(phase: Phase, offset_x: i64, offset_y: i64) -> Result<Position, LayoutError> {
    match (i32::try_from(offset_x), i32::try_from(offset_y)) {
        (Ok(x), Ok(y)) => Ok(Position::new(x, y)),
        _ => Err(LayoutError::Infeasible {
            phase,
            offset_x,
            offset_y,
        }),
    }
}
