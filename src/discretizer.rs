//! Mapping from raw observations to the 16-level lattice.
//!
//! Each bounded field is linearly rescaled from its source range onto
//! `0..=15`, floored, then clamped. Velocity is carried through unchanged so
//! that distinct velocities remain distinct states.

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    types::{DiscreteKey, MAX_LEVEL, RawObservation},
};

/// Screen height of the game, the source range of both vertical fields.
pub const SCREEN_HEIGHT: f64 = 512.0;

/// Screen width of the game, the source range of the horizontal distance.
pub const SCREEN_WIDTH: f64 = 288.0;

/// Linear quantizer from `[src_min, src_max]` onto `0..=MAX_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantizer {
    src_min: f64,
    src_max: f64,
}

impl Quantizer {
    /// Create a quantizer for the given source range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] unless `src_min < src_max` and
    /// both bounds are finite.
    pub fn new(src_min: f64, src_max: f64) -> Result<Self> {
        if !(src_min.is_finite() && src_max.is_finite()) || src_min >= src_max {
            return Err(Error::config(format!(
                "quantizer range [{src_min}, {src_max}] must be finite and non-empty"
            )));
        }
        Ok(Self { src_min, src_max })
    }

    const fn from_raw(src_min: f64, src_max: f64) -> Self {
        Self { src_min, src_max }
    }

    pub fn src_min(&self) -> f64 {
        self.src_min
    }

    pub fn src_max(&self) -> f64 {
        self.src_max
    }

    /// Quantize a value. Out-of-range inputs land on the nearest edge of the
    /// lattice; NaN maps to 0.
    pub fn quantize(&self, value: f64) -> u8 {
        let scaled = (value - self.src_min) / (self.src_max - self.src_min);
        // float-to-int casts saturate and send NaN to zero
        let level = (scaled * f64::from(MAX_LEVEL)).floor() as i64;
        level.clamp(0, i64::from(MAX_LEVEL)) as u8
    }
}

/// Discretizer over the three bounded observation fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Discretizer {
    player_y: Quantizer,
    next_pipe_top_y: Quantizer,
    next_pipe_dist: Quantizer,
}

impl Discretizer {
    pub fn new(player_y: Quantizer, next_pipe_top_y: Quantizer, next_pipe_dist: Quantizer) -> Self {
        Self {
            player_y,
            next_pipe_top_y,
            next_pipe_dist,
        }
    }

    /// Discretizer for a screen of the given dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if either dimension is not positive.
    pub fn for_screen(width: f64, height: f64) -> Result<Self> {
        Ok(Self::new(
            Quantizer::new(0.0, height)?,
            Quantizer::new(0.0, height)?,
            Quantizer::new(0.0, width)?,
        ))
    }

    /// Map an observation to its lattice key.
    ///
    /// # Panics
    ///
    /// Panics if a quantized component falls outside `0..=15`. That can only
    /// happen if [`Quantizer::quantize`] is broken, and a corrupted key must
    /// never reach the value table.
    pub fn discretize(&self, obs: &RawObservation) -> DiscreteKey {
        let key = DiscreteKey {
            position: self.player_y.quantize(obs.player_y),
            gap_top: self.next_pipe_top_y.quantize(obs.next_pipe_top_y),
            distance: self.next_pipe_dist.quantize(obs.next_pipe_dist_to_player),
            velocity: obs.player_vel,
        };
        assert!(
            key.is_on_lattice(),
            "invariant violated: discretized key {key} is off the lattice"
        );
        key
    }
}

impl Default for Discretizer {
    fn default() -> Self {
        Self::new(
            Quantizer::from_raw(0.0, SCREEN_HEIGHT),
            Quantizer::from_raw(0.0, SCREEN_HEIGHT),
            Quantizer::from_raw(0.0, SCREEN_WIDTH),
        )
    }
}
