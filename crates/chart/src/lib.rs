//! Chart rendering and transition animation.
//!
//! [`render`] is a pure function from a series (plus optional prediction
//! overlay) to a list of [`DrawCommand`]s; a thin adapter on the UI side
//! issues them to the actual drawing surface. [`TransitionAnimator`]
//! interpolates between an old and a new series one frame at a time and
//! is cancellable.

pub mod render;
pub mod transition;

pub use render::{render, DrawCommand, Viewport};
pub use transition::{blend, TransitionAnimator, TransitionFrames, PROGRESS_STEP};
