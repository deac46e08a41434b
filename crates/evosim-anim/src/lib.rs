//! Evosim Animation
//!
//! Deterministic, wall-clock driven interpolators. Nothing here talks to the
//! engine; everything is advanced by elapsed frame time.
//!
//! - **Sort transition**: creatures glide from their id-indexed grid cell to
//!   their rank-indexed cell over a fixed duration with quartic easing
//! - **Follow camera**: horizontal offset chases a moving creature by a tenth
//!   of the remaining distance per tick
//! - **Frame clock**: splits real elapsed time into fixed simulation steps
//! - **Watch playback**: plays each creature of a generation in turn for a
//!   fixed trial length

mod body;
mod camera;
mod clock;
mod easing;
mod grid;
mod sort;
mod watch;

pub use body::CreatureBody;
pub use camera::FollowCamera;
pub use clock::{FrameClock, FrameTicker};
pub use easing::{ease_in_out_quart, lerp};
pub use grid::{GridLayout, GridPoint, SurfaceSize};
pub use sort::{SortStep, SortTransition};
pub use watch::{WatchPlayback, WatchStatus};
