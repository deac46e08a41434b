//! Follow camera for single-creature previews.

use crate::grid::SurfaceSize;

/// Horizontal camera that exponentially approaches a moving target.
///
/// Each tick closes `1 / damping` of the remaining distance, so the offset
/// converges on the target without overshooting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowCamera {
    /// Horizontal scroll offset in pixels
    pub offset: f64,
    /// Fraction divisor applied per tick
    pub damping: f64,
    /// Pixels per simulation unit
    pub scale: f64,
    /// Surface the camera renders into
    pub surface: SurfaceSize,
}

impl FollowCamera {
    /// Creature height in simulation units.
    const CREATURE_HEIGHT: f64 = 1.1;
    /// Share of the surface height a creature should fill.
    const HEIGHT_SHARE: f64 = 0.2;

    /// Camera centred on the origin of `surface`.
    pub fn new(surface: SurfaceSize) -> Self {
        Self {
            offset: -surface.width / 2.0,
            damping: 10.0,
            scale: surface.height * Self::HEIGHT_SHARE / Self::CREATURE_HEIGHT,
            surface,
        }
    }

    /// Offset that would centre a creature at `position_x`.
    pub fn target_for(&self, position_x: f64) -> f64 {
        position_x * self.scale - self.surface.width / 2.0
    }

    /// Move one tick toward the creature at `position_x`; returns the new offset.
    pub fn track(&mut self, position_x: f64) -> f64 {
        let target = self.target_for(position_x);
        self.offset += (target - self.offset) / self.damping;
        self.offset
    }

    /// Recentre on the origin.
    pub fn reset(&mut self) {
        self.offset = -self.surface.width / 2.0;
    }
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self::new(SurfaceSize::default())
    }
}
