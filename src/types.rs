//! Core domain types: raw observations, discrete keys and actions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Highest level of the 16-level quantization lattice.
pub const MAX_LEVEL: u8 = 15;

/// Raw game state as reported by the environment.
///
/// The first three fields have bounded domains (see [`crate::discretizer`]);
/// velocity is unbounded and carried through as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Vertical position of the agent
    pub player_y: f64,
    /// Vertical position of the next gap's top edge
    pub next_pipe_top_y: f64,
    /// Horizontal distance from the agent to the next obstacle
    pub next_pipe_dist_to_player: f64,
    /// Current vertical velocity
    pub player_vel: i32,
}

impl RawObservation {
    pub fn new(
        player_y: f64,
        next_pipe_top_y: f64,
        next_pipe_dist_to_player: f64,
        player_vel: i32,
    ) -> Self {
        Self {
            player_y,
            next_pipe_top_y,
            next_pipe_dist_to_player,
            player_vel,
        }
    }
}

/// Quantized observation used to index the value table.
///
/// Ordering is lexicographic over `(position, gap_top, distance, velocity)`,
/// which gives table serialization a stable row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiscreteKey {
    pub position: u8,
    pub gap_top: u8,
    pub distance: u8,
    pub velocity: i32,
}

impl DiscreteKey {
    /// Build a key, checking the three quantized components against the lattice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OffLattice`] if a component exceeds [`MAX_LEVEL`].
    pub fn new(position: u8, gap_top: u8, distance: u8, velocity: i32) -> Result<Self, Error> {
        let key = Self {
            position,
            gap_top,
            distance,
            velocity,
        };
        if key.is_on_lattice() {
            Ok(key)
        } else {
            Err(Error::OffLattice {
                key: key.to_string(),
                max_level: MAX_LEVEL,
            })
        }
    }

    /// Whether every quantized component lies in `0..=MAX_LEVEL`.
    pub fn is_on_lattice(&self) -> bool {
        self.position <= MAX_LEVEL && self.gap_top <= MAX_LEVEL && self.distance <= MAX_LEVEL
    }

    /// Signed vertical offset between the agent and the gap, in lattice units.
    pub fn delta_y(&self) -> i16 {
        i16::from(self.position) - i16::from(self.gap_top)
    }
}

impl fmt::Display for DiscreteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.position, self.gap_top, self.distance, self.velocity
        )
    }
}

/// The two moves available to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Flap,
    NoOp,
}

impl Action {
    /// Every action, in protocol order.
    pub const ALL: [Action; 2] = [Action::Flap, Action::NoOp];

    /// Protocol code: 0 for flap, 1 for no-op.
    pub fn code(self) -> usize {
        match self {
            Action::Flap => 0,
            Action::NoOp => 1,
        }
    }
}

impl TryFrom<i64> for Action {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Action::Flap),
            1 => Ok(Action::NoOp),
            other => Err(Error::InvalidAction { code: other }),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Flap => write!(f, "flap"),
            Action::NoOp => write!(f, "noop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_codes() {
        assert_eq!(Action::Flap.code(), 0);
        assert_eq!(Action::NoOp.code(), 1);
        assert_eq!(Action::try_from(0).unwrap(), Action::Flap);
        assert_eq!(Action::try_from(1).unwrap(), Action::NoOp);
        assert!(matches!(
            Action::try_from(2),
            Err(Error::InvalidAction { code: 2 })
        ));
    }

    #[test]
    fn test_key_rejects_off_lattice_components() {
        assert!(DiscreteKey::new(15, 15, 15, -9).is_ok());
        assert!(matches!(
            DiscreteKey::new(16, 0, 0, 0),
            Err(Error::OffLattice { max_level: 15, .. })
        ));
        assert!(DiscreteKey::new(0, 0, 200, 0).is_err());
    }

    #[test]
    fn test_key_ordering_is_lexicographic() {
        let a = DiscreteKey::new(1, 9, 9, 9).unwrap();
        let b = DiscreteKey::new(2, 0, 0, -9).unwrap();
        let c = DiscreteKey::new(2, 0, 0, 3).unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_delta_y() {
        let key = DiscreteKey::new(3, 10, 0, 0).unwrap();
        assert_eq!(key.delta_y(), -7);
    }
}
