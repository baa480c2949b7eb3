//! Read-only per-tick view handed to presentation

use super::state::{GamePhase, GameState, Player, Projectile, Target};

/// Borrowed snapshot of everything a renderer draws
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub player: &'a Player,
    pub targets: &'a [Target],
    pub projectiles: &'a [Projectile],
    pub score: u64,
    pub level: u32,
    pub elapsed_secs: u32,
    pub phase: GamePhase,
    pub time_ticks: u64,
    /// Thrust was applied this tick
    pub thrusting: bool,
}

/// Consumer of frames, called once per tick after integration
pub trait RenderSink {
    fn present(&mut self, frame: &FrameView<'_>);
}

/// Headless sink
impl RenderSink for () {
    fn present(&mut self, _frame: &FrameView<'_>) {}
}

impl GameState {
    /// Borrowed view of the current state
    pub fn frame(&self) -> FrameView<'_> {
        FrameView {
            player: &self.player,
            targets: &self.targets,
            projectiles: &self.projectiles,
            score: self.score,
            level: self.level,
            elapsed_secs: self.elapsed_secs,
            phase: self.phase,
            time_ticks: self.time_ticks,
            thrusting: false,
        }
    }
}

/// Owned copy of the last presented frame
///
/// The host keeps one of these between animation frames so the renderer can
/// draw without borrowing the simulation.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub player: Player,
    pub targets: Vec<Target>,
    pub projectiles: Vec<Projectile>,
    pub score: u64,
    pub level: u32,
    pub elapsed_secs: u32,
    pub phase: GamePhase,
    pub time_ticks: u64,
    pub thrusting: bool,
    /// Number of frames presented since creation
    pub presented: u64,
}

impl FrameSnapshot {
    pub fn new(state: &GameState) -> Self {
        Self {
            player: state.player.clone(),
            targets: state.targets.clone(),
            projectiles: state.projectiles.clone(),
            score: state.score,
            level: state.level,
            elapsed_secs: state.elapsed_secs,
            phase: state.phase,
            time_ticks: state.time_ticks,
            thrusting: false,
            presented: 0,
        }
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            player: &self.player,
            targets: &self.targets,
            projectiles: &self.projectiles,
            score: self.score,
            level: self.level,
            elapsed_secs: self.elapsed_secs,
            phase: self.phase,
            time_ticks: self.time_ticks,
            thrusting: self.thrusting,
        }
    }
}

impl RenderSink for FrameSnapshot {
    fn present(&mut self, frame: &FrameView<'_>) {
        self.player = frame.player.clone();
        self.targets.clear();
        self.targets.extend_from_slice(frame.targets);
        self.projectiles.clear();
        self.projectiles.extend_from_slice(frame.projectiles);
        self.score = frame.score;
        self.level = frame.level;
        self.elapsed_secs = frame.elapsed_secs;
        self.phase = frame.phase;
        self.time_ticks = frame.time_ticks;
        self.thrusting = frame.thrusting;
        self.presented += 1;
    }
}
