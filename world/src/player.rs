//! Player position and rank ladder.

use koma_rush_core::{GridMapper, PixelPoint};

/// Vertical distance between the screen bottom and the player's start.
const START_LIFT: f32 = 100.0;

/// Result of reporting a hit against the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HitOutcome {
    /// The player was invincible or already destroyed.
    Ignored,
    /// The player lost a rank and became invincible.
    Demoted(u32),
    /// The player was at the bottom rank and is gone.
    Destroyed,
}

#[derive(Clone, Debug)]
pub(crate) struct Player {
    position: Option<PixelPoint>,
    rank: u32,
    invincible: bool,
    destroyed: bool,
}

impl Player {
    pub(crate) fn new(mapper: &GridMapper) -> Self {
        Self {
            position: Some(PixelPoint::new(
                mapper.screen_width() / 2.0,
                mapper.screen_height() - START_LIFT,
            )),
            rank: 0,
            invincible: false,
            destroyed: false,
        }
    }

    pub(crate) fn rank(&self) -> u32 {
        self.rank
    }

    pub(crate) fn is_invincible(&self) -> bool {
        self.invincible
    }

    /// Position the agents pursue; `None` once destroyed or off screen.
    pub(crate) fn target(&self) -> Option<PixelPoint> {
        if self.destroyed {
            return None;
        }
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Option<PixelPoint>) {
        self.position = position;
    }

    pub(crate) fn hit(&mut self) -> HitOutcome {
        if self.destroyed || self.invincible {
            return HitOutcome::Ignored;
        }
        if self.rank == 0 {
            self.destroyed = true;
            return HitOutcome::Destroyed;
        }
        self.rank -= 1;
        self.invincible = true;
        HitOutcome::Demoted(self.rank)
    }

    pub(crate) fn recover(&mut self) {
        self.invincible = false;
    }

    /// Raises the rank; returns the new rank when it changed.
    pub(crate) fn promote(&mut self, max_rank: u32) -> Option<u32> {
        if self.destroyed || self.rank >= max_rank {
            return None;
        }
        self.rank += 1;
        Some(self.rank)
    }
}
