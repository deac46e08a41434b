//! Creature physics as seen by the animation loops.

/// A creature whose physics can be stepped locally for playback.
///
/// Implemented by the renderer-side physics collaborator; the animation
/// loops only step it and read back its horizontal position.
pub trait CreatureBody {
    /// Advance the physics by `dt` seconds.
    fn step(&mut self, dt: f64);

    /// Current horizontal position in simulation units.
    fn position_x(&self) -> f64;

    /// Return to the starting pose.
    fn reset(&mut self);
}
