//! Simplified side-scrolling simulator implementing [`Environment`].
//!
//! Enough physics to exercise the learner end to end: constant gravity, a
//! fixed flap impulse, a capped fall speed and pipes scrolling left at a
//! constant speed with randomly placed gaps. Nothing is rendered.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    app::{RewardValues, ScreenConfig},
    ports::Environment,
    types::{Action, RawObservation},
};

/// Geometry and physics of the simulator, in pixels and pixels per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    pub width: f64,
    pub height: f64,
    /// Top of the ground strip; touching it ends the episode
    pub ground_y: f64,
    pub player_x: f64,
    pub player_width: f64,
    pub player_height: f64,
    pub gravity: i32,
    pub flap_velocity: i32,
    pub max_fall_velocity: i32,
    pub pipe_width: f64,
    pub pipe_gap: f64,
    pub pipe_spacing: f64,
    pub pipe_speed: f64,
    /// Minimum clearance between a gap and the screen top or ground
    pub gap_margin: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 288.0,
            height: 512.0,
            ground_y: 405.0,
            player_x: 57.0,
            player_width: 34.0,
            player_height: 24.0,
            gravity: 1,
            flap_velocity: -9,
            max_fall_velocity: 10,
            pipe_width: 52.0,
            pipe_gap: 100.0,
            pipe_spacing: 196.0,
            pipe_speed: 4.0,
            gap_margin: 25.0,
        }
    }
}

impl SimConfig {
    /// Default physics on a screen of the given size. The ground strip keeps
    /// its share of the height so the playable band scales with the screen.
    pub fn for_screen(screen: &ScreenConfig) -> Self {
        let base = Self::default();
        Self {
            width: screen.width,
            height: screen.height,
            ground_y: (base.ground_y * screen.height / base.height).floor(),
            ..base
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pipe {
    x: f64,
    gap_top: f64,
    passed: bool,
}

/// Seeded Flappy-style game.
#[derive(Debug, Clone)]
pub struct FlappySim {
    config: SimConfig,
    rewards: RewardValues,
    rng: StdRng,
    player_y: f64,
    player_vel: i32,
    pipes: VecDeque<Pipe>,
    terminal: bool,
    pipes_passed: usize,
}

impl FlappySim {
    pub fn new(config: SimConfig, rewards: RewardValues, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let mut sim = Self {
            config,
            rewards,
            rng,
            player_y: 0.0,
            player_vel: 0,
            pipes: VecDeque::new(),
            terminal: false,
            pipes_passed: 0,
        };
        sim.reset_episode();
        sim
    }

    /// Default geometry with the given rewards and seed
    pub fn with_rewards(rewards: RewardValues, seed: Option<u64>) -> Self {
        Self::new(SimConfig::default(), rewards, seed)
    }

    /// Obstacles passed in the current episode
    pub fn pipes_passed(&self) -> usize {
        self.pipes_passed
    }

    fn random_gap_top(&mut self) -> f64 {
        let low = self.config.gap_margin;
        let high = self.config.ground_y - self.config.pipe_gap - self.config.gap_margin;
        if high <= low {
            return low;
        }
        self.rng.random_range(low..high).floor()
    }

    fn spawn_pipe(&mut self, x: f64) {
        let gap_top = self.random_gap_top();
        self.pipes.push_back(Pipe {
            x,
            gap_top,
            passed: false,
        });
    }

    fn next_pipe(&self) -> Option<&Pipe> {
        self.pipes
            .iter()
            .find(|pipe| pipe.x + self.config.pipe_width >= self.config.player_x)
    }

    fn collides(&self) -> bool {
        let c = &self.config;
        if self.player_y <= 0.0 || self.player_y + c.player_height >= c.ground_y {
            return true;
        }
        self.pipes.iter().any(|pipe| {
            let overlaps_x =
                c.player_x + c.player_width > pipe.x && c.player_x < pipe.x + c.pipe_width;
            let inside_gap = self.player_y >= pipe.gap_top
                && self.player_y + c.player_height <= pipe.gap_top + c.pipe_gap;
            overlaps_x && !inside_gap
        })
    }
}

impl Environment for FlappySim {
    fn observation(&self) -> RawObservation {
        let (gap_top, distance) = match self.next_pipe() {
            Some(pipe) => (
                pipe.gap_top,
                pipe.x + self.config.pipe_width - self.config.player_x,
            ),
            None => (self.config.height / 2.0, self.config.width),
        };
        RawObservation::new(self.player_y, gap_top, distance, self.player_vel)
    }

    fn apply_action(&mut self, action: Action) -> f64 {
        if self.terminal {
            return 0.0;
        }
        let c = self.config;

        self.player_vel = match action {
            Action::Flap => c.flap_velocity,
            Action::NoOp => (self.player_vel + c.gravity).min(c.max_fall_velocity),
        };
        self.player_y += f64::from(self.player_vel);

        let mut passed_now = 0;
        for pipe in self.pipes.iter_mut() {
            pipe.x -= c.pipe_speed;
            if !pipe.passed && pipe.x + c.pipe_width < c.player_x {
                pipe.passed = true;
                passed_now += 1;
            }
        }
        self.pipes_passed += passed_now;

        while self
            .pipes
            .front()
            .is_some_and(|pipe| pipe.x + c.pipe_width < 0.0)
        {
            self.pipes.pop_front();
        }
        let last_x = self.pipes.back().map(|pipe| pipe.x).unwrap_or(c.width);
        if last_x <= c.width {
            self.spawn_pipe(last_x + c.pipe_spacing);
        }

        if self.collides() {
            self.terminal = true;
            return self.rewards.loss;
        }
        if passed_now > 0 {
            self.rewards.positive * passed_now as f64
        } else {
            self.rewards.tick
        }
    }

    fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn reset_episode(&mut self) {
        let c = self.config;
        self.player_y = (c.height - c.player_height) / 2.0;
        self.player_vel = 0;
        self.terminal = false;
        self.pipes_passed = 0;
        self.pipes.clear();
        self.spawn_pipe(c.width + c.pipe_width);
        self.spawn_pipe(c.width + c.pipe_width + c.pipe_spacing);
    }
}
