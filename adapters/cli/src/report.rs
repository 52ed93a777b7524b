use std::fmt;

use space_invaders_config::SpeedSnapshot;
use space_invaders_core::EntityKind;
use space_invaders_system_layout::{InvaderGrid, PlayerRow};
use space_invaders_world::query::WorldSnapshot;

/// Human readable summary of a started session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SessionReport {
    /// Entity counts per populated kind in declaration order.
    counts: Vec<(EntityKind, usize)>,
    /// Geometry of the invader grid.
    grid: InvaderGrid,
    /// Geometry of the player row.
    players: PlayerRow,
    /// Player and projectile speeds after all commands ran.
    speeds: SpeedSnapshot,
}

impl SessionReport {
    /// Builds a report from a world snapshot and the layout geometry.
    pub(crate) fn new(
        snapshot: &WorldSnapshot,
        grid: InvaderGrid,
        players: PlayerRow,
        speeds: SpeedSnapshot,
    ) -> Self {
        let counts = snapshot
            .kinds
            .iter()
            .map(|kind| (kind.kind, kind.entities.len()))
            .collect();
        Self {
            counts,
            grid,
            players,
            speeds,
        }
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "entities:")?;
        for (kind, count) in &self.counts {
            writeln!(f, "  {kind}: {count}")?;
        }
        writeln!(
            f,
            "invader grid: {}x{} from ({}, {}) step {}x{}",
            self.grid.rows,
            self.grid.cols,
            self.grid.origin.x(),
            self.grid.origin.y(),
            self.grid.jump_x,
            self.grid.jump_y
        )?;
        writeln!(
            f,
            "players: {} from ({}, {}) stride {}",
            self.players.team_size,
            self.players.origin.x(),
            self.players.origin.y(),
            self.players.stride
        )?;
        write!(
            f,
            "cheats {}: player distance {}, projectile distance {}",
            if self.speeds.cheats_on { "on" } else { "off" },
            self.speeds.player.distance(),
            self.speeds.projectile.distance()
        )
    }
}
