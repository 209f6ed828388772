use arrayvec::ArrayVec;
use glam::DVec2;

use crate::{
    Action, GameConfig, Observation, ObservationFeature, SimRng,
    core::{Ball, BounceAxis, BrickGrid, MAX_BALLS, PowerUp, Rect, random_launch_angle},
};

/// Macro-state of a game. Every variant except [`GamePhase::Running`] is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum GamePhase {
    Running,
    /// Every brick was destroyed.
    Cleared,
    /// The last life was lost.
    OutOfLives,
    /// The step counter reached the configured horizon.
    HorizonReached,
}

impl GamePhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !self.is_running()
    }
}

/// Result of a single [`BreakoutGame::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Reward accrued during this step.
    pub reward: f64,
    /// Whether the game is terminal after this step.
    pub done: bool,
}

/// Deterministic brick-breaking simulation.
///
/// The game advances one discrete step per [`step`](Self::step) call. All randomness
/// (launch angles, power-up drops) comes from an internal [`SimRng`], so a game
/// created with the same config and seed and driven by the same actions always
/// evolves identically.
///
/// Every ball keeps exactly [`GameConfig::ball_speed`] as its speed magnitude: the
/// velocity is re-normalized after each collision that changes it.
///
/// # Example
///
/// ```
/// use brickevo_engine::{Action, BreakoutGame, GameConfig};
///
/// let mut game = BreakoutGame::new(GameConfig::default(), 1234);
/// let mut total = 0.0;
/// while !game.is_done() {
///     let outcome = game.step(Action::Stay);
///     total += outcome.reward;
/// }
///
/// // Terminal games ignore further steps.
/// let outcome = game.step(Action::Left);
/// assert_eq!(outcome.reward, 0.0);
/// assert!(outcome.done);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutGame {
    config: GameConfig,
    rng: SimRng,
    paddle_x: f64,
    balls: ArrayVec<Ball, MAX_BALLS>,
    power_ups: Vec<PowerUp>,
    power_ups_dropped: u32,
    bricks: BrickGrid,
    score: u32,
    lives: u32,
    steps: usize,
    phase: GamePhase,
}

impl BreakoutGame {
    /// Creates a game in its initial state for `seed`.
    #[must_use]
    pub fn new(config: GameConfig, seed: u32) -> Self {
        let bricks = BrickGrid::new(&config);
        let mut game = Self {
            rng: SimRng::new(seed),
            paddle_x: config.centered_paddle_x(),
            balls: ArrayVec::new(),
            power_ups: vec![],
            power_ups_dropped: 0,
            bricks,
            score: 0,
            lives: config.lives,
            steps: 0,
            phase: GamePhase::Running,
            config,
        };
        game.reset(None);
        game
    }

    /// Restores the initial state.
    ///
    /// With `Some(seed)` the random stream restarts from `seed`; with `None` it
    /// continues from where it is.
    pub fn reset(&mut self, seed: Option<u32>) {
        if let Some(seed) = seed {
            self.rng.reseed(seed);
        }
        self.paddle_x = self.config.centered_paddle_x();
        self.balls.clear();
        let ball = self.spawn_ball();
        self.balls.push(ball);
        self.power_ups.clear();
        self.power_ups_dropped = 0;
        self.bricks.restore();
        self.score = 0;
        self.lives = self.config.lives;
        self.steps = 0;
        self.phase = GamePhase::Running;
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Left edge of the paddle.
    #[must_use]
    pub fn paddle_x(&self) -> f64 {
        self.paddle_x
    }

    /// All balls, including the ones that left the arena on the final step.
    #[must_use]
    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn active_balls(&self) -> impl Iterator<Item = &Ball> + '_ {
        self.balls.iter().filter(|b| b.active)
    }

    #[must_use]
    pub fn power_ups(&self) -> &[PowerUp] {
        &self.power_ups
    }

    /// Number of capsules released so far in this episode.
    #[must_use]
    pub fn power_ups_dropped(&self) -> u32 {
        self.power_ups_dropped
    }

    #[must_use]
    pub fn bricks(&self) -> &BrickGrid {
        &self.bricks
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn lives(&self) -> u32 {
        self.lives
    }

    /// Number of steps taken since the last reset.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Computes the normalized observation of the current state.
    ///
    /// When several balls are in play, the features describe the active ball closest
    /// to the bottom of the arena.
    #[must_use]
    pub fn observe(&self) -> Observation {
        let cfg = &self.config;
        let ball = self.tracked_ball();
        let paddle_center = self.paddle_x + cfg.paddle_width / 2.0;
        let velocity_envelope = cfg.ball_speed * 1.2;
        let paddle_travel = cfg.width - cfg.paddle_width;
        #[expect(clippy::cast_precision_loss)]
        let bricks_left = self.bricks.alive_count() as f64 / self.bricks.len() as f64;

        let mut values = [
            (ball.pos.x / cfg.width) * 2.0 - 1.0,
            (ball.pos.y / cfg.height) * 2.0 - 1.0,
            ball.vel.x / velocity_envelope,
            ball.vel.y / velocity_envelope,
            (self.paddle_x / paddle_travel) * 2.0 - 1.0,
            (ball.pos.x - paddle_center) / (cfg.width / 2.0),
            (ball.pos.y - cfg.paddle_y) / cfg.height,
            bricks_left,
        ];
        for (value, feature) in values.iter_mut().zip(ObservationFeature::ALL) {
            let range = feature.range();
            *value = value.clamp(*range.start(), *range.end());
        }
        Observation(values)
    }

    /// Advances the simulation by one step.
    ///
    /// Order of operations:
    ///
    /// 1. move and clamp the paddle
    /// 2. move every active ball, then resolve walls, paddle and (at most one) brick
    /// 3. move capsules and collect the ones touching the paddle
    /// 4. all bricks gone: terminal with the clear reward
    /// 5. balls below the arena are deactivated; losing the last one costs a life
    /// 6. count the step and cut the episode at the horizon
    ///
    /// Once the game is terminal this is a no-op returning a zero reward.
    pub fn step(&mut self, action: Action) -> StepOutcome {
        if self.phase.is_terminal() {
            return StepOutcome {
                reward: 0.0,
                done: true,
            };
        }
        let rewards = self.config.rewards;
        let mut reward = rewards.tick;

        self.move_paddle(action);
        for index in 0..self.balls.len() {
            if self.balls[index].active {
                reward += self.update_ball(index);
            }
        }
        self.update_power_ups();

        if self.bricks.is_cleared() {
            self.phase = GamePhase::Cleared;
            self.steps += 1;
            return StepOutcome {
                reward: reward + rewards.clear,
                done: true,
            };
        }

        reward += self.collect_lost_balls();

        self.steps += 1;
        if self.phase.is_running() && self.steps >= self.config.horizon {
            self.phase = GamePhase::HorizonReached;
            reward += self.bricks.progress() * rewards.horizon_progress;
        }

        StepOutcome {
            reward,
            done: self.phase.is_terminal(),
        }
    }

    fn paddle_rect(&self) -> Rect {
        Rect {
            x: self.paddle_x,
            y: self.config.paddle_y,
            w: self.config.paddle_width,
            h: self.config.paddle_height,
        }
    }

    fn tracked_ball(&self) -> &Ball {
        self.active_balls()
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
            .or_else(|| self.balls.first())
            .expect("a game always holds at least one ball")
    }

    fn spawn_ball(&mut self) -> Ball {
        let origin = DVec2::new(self.config.width / 2.0, self.config.height * 0.6);
        let angle = random_launch_angle(&mut self.rng);
        Ball::launched(origin, angle, self.config.ball_speed)
    }

    fn move_paddle(&mut self, action: Action) {
        let cfg = &self.config;
        let x = self.paddle_x + cfg.paddle_speed * f64::from(action.direction());
        self.paddle_x = x.clamp(0.0, cfg.width - cfg.paddle_width);
    }

    /// Moves one ball and resolves its collisions, returning the reward earned.
    fn update_ball(&mut self, index: usize) -> f64 {
        let cfg = &self.config;
        let radius = cfg.ball_radius;
        let speed = cfg.ball_speed;
        let mut reward = 0.0;
        let mut ball = self.balls[index];

        ball.advance();

        let mut touched_wall = false;
        if ball.pos.x <= radius {
            ball.vel.x = ball.vel.x.abs();
            touched_wall = true;
        } else if ball.pos.x >= cfg.width - radius {
            ball.vel.x = -ball.vel.x.abs();
            touched_wall = true;
        }
        if ball.pos.y <= radius {
            ball.vel.y = ball.vel.y.abs();
            touched_wall = true;
        }
        if touched_wall {
            ball.set_speed(speed);
        }

        let paddle = self.paddle_rect();
        let hit_paddle = ball.vel.y > 0.0
            && paddle.y - radius - 1.0 <= ball.pos.y
            && ball.pos.y <= paddle.y + paddle.h
            && paddle.x - radius <= ball.pos.x
            && ball.pos.x <= paddle.x + paddle.w + radius;
        if hit_paddle {
            let half_width = paddle.w / 2.0;
            let offset = (ball.pos.x - (paddle.x + half_width)) / half_width;
            let max_vx = speed * 1.5;
            ball.vel.y = -ball.vel.y.abs();
            ball.vel.x = (ball.vel.x + offset * cfg.paddle_deflection).clamp(-max_vx, max_vx);
            ball.set_speed(speed);
            reward += cfg.rewards.paddle_hit;
        }

        let mut dropped_from = None;
        if let Some(brick) = self.bricks.first_overlapping(ball.pos, radius) {
            let rect = self.bricks.rect(brick);
            match rect.bounce_axis(ball.pos, radius) {
                BounceAxis::Horizontal => ball.vel.x = -ball.vel.x,
                BounceAxis::Vertical => ball.vel.y = -ball.vel.y,
            }
            ball.set_speed(speed);
            reward += cfg.rewards.brick;
            self.bricks.destroy(brick);
            self.score += 1;
            dropped_from = Some(rect.center());
        }

        self.balls[index] = ball;
        if let Some(origin) = dropped_from {
            self.maybe_drop_power_up(origin);
        }
        reward
    }

    fn maybe_drop_power_up(&mut self, origin: DVec2) {
        let cfg = self.config.power_ups;
        if self.power_ups_dropped >= cfg.max_drops {
            return;
        }
        if self.rng.next_unit() < cfg.drop_chance {
            self.power_ups.push(PowerUp::new(origin));
            self.power_ups_dropped += 1;
        }
    }

    fn update_power_ups(&mut self) {
        if self.power_ups.is_empty() {
            return;
        }
        let cfg = self.config.power_ups;
        let paddle = self.paddle_rect();
        let floor = self.config.height;
        let mut caught = 0;
        self.power_ups.retain_mut(|power_up| {
            power_up.fall(cfg.fall_speed);
            if paddle.overlaps_circle(power_up.pos, cfg.radius) {
                caught += 1;
                return false;
            }
            power_up.pos.y - cfg.radius <= floor
        });
        for _ in 0..caught {
            self.spawn_extra_ball();
        }
    }

    fn spawn_extra_ball(&mut self) {
        let limit = self.config.power_ups.max_balls.min(MAX_BALLS);
        if self.active_balls().count() >= limit || self.balls.is_full() {
            return;
        }
        let origin = DVec2::new(
            self.paddle_x + self.config.paddle_width / 2.0,
            self.config.paddle_y - self.config.ball_radius - 1.0,
        );
        let angle = random_launch_angle(&mut self.rng);
        self.balls
            .push(Ball::launched(origin, angle, self.config.ball_speed));
    }

    /// Deactivates balls below the arena and charges a life when none is left.
    fn collect_lost_balls(&mut self) -> f64 {
        let limit = self.config.height - self.config.ball_radius;
        for ball in self.balls.iter_mut().filter(|b| b.active) {
            if ball.pos.y >= limit {
                ball.active = false;
            }
        }
        if self.balls.iter().any(|b| b.active) {
            self.balls.retain(|b| b.active);
            return 0.0;
        }

        let rewards = self.config.rewards;
        let mut reward = rewards.life_lost;
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.phase = GamePhase::OutOfLives;
            reward += rewards.game_over;
        } else {
            self.balls.clear();
            let ball = self.spawn_ball();
            self.balls.push(ball);
        }
        reward
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const SPEED_TOLERANCE: f64 = 1e-6;

    /// A paddle that can never be reached, so every ball eventually falls out.
    fn unreachable_paddle_config() -> GameConfig {
        GameConfig {
            paddle_y: 10_000.0,
            ..GameConfig::default()
        }
    }

    fn action_from_index(i: u8) -> Action {
        match i % 3 {
            0 => Action::Left,
            1 => Action::Stay,
            _ => Action::Right,
        }
    }

    #[test]
    fn test_initial_state() {
        let config = GameConfig::default();
        let game = BreakoutGame::new(config.clone(), 1234);
        assert_eq!(game.paddle_x(), 205.0);
        assert_eq!(game.balls().len(), 1);
        let ball = game.balls()[0];
        assert_eq!(ball.pos, DVec2::new(240.0, 192.0));
        assert!(ball.vel.y < 0.0);
        assert!((ball.speed() - config.ball_speed).abs() < SPEED_TOLERANCE);
        assert_eq!(game.bricks().alive_count(), 50);
        assert_eq!(game.lives(), 3);
        assert_eq!(game.steps(), 0);
        assert!(game.phase().is_running());
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let mut a = BreakoutGame::new(GameConfig::default(), 99);
        let mut b = BreakoutGame::new(GameConfig::default(), 99);
        for i in 0..3000_u32 {
            #[expect(clippy::cast_possible_truncation)]
            let action = action_from_index((i % 7) as u8);
            let oa = a.step(action);
            let ob = b.step(action);
            assert_eq!(oa.reward.to_bits(), ob.reward.to_bits());
            assert_eq!(oa.done, ob.done);
        }
        assert_eq!(a, b);
    }

    #[test]
    fn test_reset_with_seed_reproduces_initial_state() {
        let mut game = BreakoutGame::new(GameConfig::default(), 5);
        let initial = game.clone();
        for _ in 0..500 {
            game.step(Action::Right);
        }
        game.reset(Some(5));
        assert_eq!(game, initial);
    }

    #[test]
    fn test_paddle_is_clamped_to_arena() {
        let mut game = BreakoutGame::new(GameConfig::default(), 1);
        for _ in 0..200 {
            game.step(Action::Left);
        }
        assert_eq!(game.paddle_x(), 0.0);
        game.reset(None);
        for _ in 0..200 {
            game.step(Action::Right);
        }
        assert_eq!(game.paddle_x(), 480.0 - 70.0);
    }

    #[test]
    fn test_horizon_forces_terminal() {
        let config = GameConfig::default().with_horizon(10);
        let mut game = BreakoutGame::new(config, 3);
        for _ in 0..9 {
            assert!(!game.step(Action::Stay).done);
        }
        let outcome = game.step(Action::Stay);
        assert!(outcome.done);
        assert_eq!(game.phase(), GamePhase::HorizonReached);
        assert_eq!(game.steps(), 10);
        // No brick can be reached in ten steps, so only the tick reward is paid.
        assert!((outcome.reward - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_clearing_last_brick_ends_game() {
        let config = GameConfig {
            rows: 1,
            cols: 1,
            brick_width: 480.0,
            offset_x: 0.0,
            offset_y: 150.0,
            ..GameConfig::default()
        };
        let mut game = BreakoutGame::new(config, 11);
        let mut total = 0.0;
        let mut steps = 0;
        while !game.is_done() {
            total += game.step(Action::Stay).reward;
            steps += 1;
            assert!(steps < 100, "ball never reached the brick");
        }
        assert_eq!(game.phase(), GamePhase::Cleared);
        assert_eq!(game.score(), 1);
        assert!(total >= 60.0, "total reward {total}");
    }

    #[test]
    fn test_losing_a_life_respawns_ball() {
        let config = GameConfig {
            lives: 2,
            ..unreachable_paddle_config()
        };
        let mut game = BreakoutGame::new(config, 21);
        while game.lives() == 2 {
            let outcome = game.step(Action::Stay);
            assert!(!outcome.done);
        }
        assert_eq!(game.lives(), 1);
        assert!(!game.is_done());
        assert_eq!(game.balls().len(), 1);
        let ball = game.balls()[0];
        assert_eq!(ball.pos, DVec2::new(240.0, 192.0));
        assert!(ball.active);
        assert!(ball.vel.y < 0.0);
    }

    #[test]
    fn test_losing_last_life_is_terminal() {
        let config = GameConfig {
            lives: 1,
            ..unreachable_paddle_config()
        };
        let mut game = BreakoutGame::new(config, 8);
        let mut last = None;
        while !game.is_done() {
            last = Some(game.step(Action::Stay));
        }
        assert_eq!(game.phase(), GamePhase::OutOfLives);
        assert_eq!(game.lives(), 0);
        let reward = last.unwrap().reward;
        assert!((reward - (0.01 - 3.0 - 10.0)).abs() < 1e-9, "reward {reward}");
    }

    #[test]
    fn test_terminal_step_is_idempotent() {
        let config = GameConfig {
            lives: 1,
            ..unreachable_paddle_config()
        };
        let mut game = BreakoutGame::new(config, 4);
        while !game.is_done() {
            game.step(Action::Right);
        }
        let frozen = game.clone();
        for action in [Action::Left, Action::Stay, Action::Right] {
            for _ in 0..10 {
                let outcome = game.step(action);
                assert_eq!(outcome.reward, 0.0);
                assert!(outcome.done);
            }
        }
        assert_eq!(game, frozen);
    }

    #[test]
    fn test_power_up_budget_is_respected() {
        let mut config = unreachable_paddle_config();
        config.power_ups.max_drops = 2;
        config.power_ups.drop_chance = 1.0;
        config.horizon = 4000;
        let mut game = BreakoutGame::new(config, 17);
        while !game.is_done() {
            game.step(Action::Stay);
            assert!(game.power_ups_dropped() <= 2);
            assert!(game.power_ups().len() <= 2);
        }
        if game.score() >= 2 {
            assert_eq!(game.power_ups_dropped(), 2);
        }
    }

    #[test]
    fn test_caught_power_up_spawns_ball() {
        let mut config = GameConfig::default();
        config.power_ups.max_drops = 1;
        let mut game = BreakoutGame::new(config, 2);
        let paddle_center = game.paddle_x() + 35.0;
        game.power_ups
            .push(PowerUp::new(DVec2::new(paddle_center, 295.0)));
        game.step(Action::Stay);
        assert!(game.power_ups().is_empty());
        assert_eq!(game.active_balls().count(), 2);
        for ball in game.active_balls() {
            assert!((ball.speed() - 2.8).abs() < SPEED_TOLERANCE);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn test_ball_speed_is_conserved(
            seed in any::<u32>(),
            actions in prop::collection::vec(any::<u8>(), 1..1500),
            power_ups in any::<bool>(),
        ) {
            let mut config = GameConfig::default();
            if power_ups {
                config.power_ups.max_drops = 2;
                config.power_ups.drop_chance = 0.5;
            }
            let speed = config.ball_speed;
            let mut game = BreakoutGame::new(config, seed);
            for a in actions {
                game.step(action_from_index(a));
                for ball in game.balls() {
                    prop_assert!((ball.speed() - speed).abs() < SPEED_TOLERANCE);
                }
            }
        }

        #[test]
        fn test_observation_is_bounded(
            seed in any::<u32>(),
            actions in prop::collection::vec(any::<u8>(), 1..1500),
        ) {
            let mut game = BreakoutGame::new(GameConfig::default(), seed);
            prop_assert!(game.observe().is_within_bounds());
            for a in actions {
                game.step(action_from_index(a));
                let obs = game.observe();
                prop_assert!(obs.is_within_bounds(), "{obs}");
            }
        }

        #[test]
        fn test_observe_has_no_side_effects(seed in any::<u32>(), steps in 0_usize..500) {
            let mut game = BreakoutGame::new(GameConfig::default(), seed);
            for _ in 0..steps {
                game.step(Action::Stay);
            }
            let before = game.clone();
            let first = game.observe();
            let second = game.observe();
            prop_assert_eq!(first, second);
            prop_assert_eq!(game, before);
        }
    }
}
