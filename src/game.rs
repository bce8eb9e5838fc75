use rand::Rng;

use crate::level;
use crate::physics::{self, Animation, Ground, Rect, JUMP_POWER, WALK_SPEED};

pub const PLAYER_WIDTH: i32 = 40;
pub const PLAYER_HEIGHT: i32 = 60;
pub const ENEMY_SIZE: i32 = 40;
pub const SPAWN: (i32, i32) = (100, 400);
pub const FALL_FRAMES: u32 = 20;
pub const CHUNK_LENGTH: i32 = 2500;

/// The rule sets the platformer can run with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Variant {
    /// Three static platforms, plain speech and head nods.
    Classic,
    /// Patrolling enemies, a lift platform, audience cheer/boo keys.
    Arena,
    /// Start menu and a bouncing enemy.
    Menu,
    /// A fixed list of levels with sliding platforms.
    Levels,
    /// Endless side-scroller with generated chunks.
    Scroller,
}

impl Variant {
    /// Vertical speed above which an airborne player counts as falling.
    pub fn fall_threshold(self) -> i32 {
        match self {
            Variant::Classic => 5,
            _ => 6,
        }
    }

    pub fn has_menu(self) -> bool {
        matches!(self, Variant::Menu | Variant::Levels | Variant::Scroller)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Playfield {
    pub width: i32,
    pub height: i32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pose {
    Standing,
    Walking(usize),
}

#[derive(Clone, Copy, Debug)]
pub struct Player {
    pub rect: Rect,
    pub vel_y: i32,
    pub on_ground: bool,
    pub walk: Animation,
    pub pose: Pose,
}

impl Player {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            rect: Rect::new(x, y, PLAYER_WIDTH, PLAYER_HEIGHT),
            vel_y: 0,
            on_ground: false,
            walk: Animation::new(10),
            pose: Pose::Standing,
        }
    }

    pub fn respawn(&mut self, x: i32, y: i32) {
        self.rect.x = x;
        self.rect.y = y;
        self.vel_y = 0;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    Static,
    /// Slides between `start_x` and `start_x + range`.
    Horizontal {
        start_x: i32,
        range: i32,
        speed: i32,
        direction: i32,
    },
    /// Bobs around `start_y` and carries whoever stands on it.
    Vertical { start_y: i32, range: i32, step: i32 },
}

#[derive(Clone, Copy, Debug)]
pub struct Platform {
    pub rect: Rect,
    pub motion: Motion,
    pub skin: usize,
}

impl Platform {
    pub fn fixed(rect: Rect) -> Self {
        Self {
            rect,
            motion: Motion::Static,
            skin: 0,
        }
    }

    pub fn sliding(rect: Rect, range: i32, speed: i32) -> Self {
        Self {
            rect,
            motion: Motion::Horizontal {
                start_x: rect.x,
                range,
                speed,
                direction: 1,
            },
            skin: 0,
        }
    }

    pub fn lift(rect: Rect, step: i32, range: i32) -> Self {
        Self {
            rect,
            motion: Motion::Vertical {
                start_y: rect.y,
                range,
                step,
            },
            skin: 0,
        }
    }

    pub fn with_skin(mut self, skin: usize) -> Self {
        self.skin = skin;
        self
    }

    pub fn update(&mut self) {
        match &mut self.motion {
            Motion::Static => {}
            Motion::Horizontal {
                start_x,
                range,
                speed,
                direction,
            } => {
                self.rect.x += *speed * *direction;
                if self.rect.x < *start_x || self.rect.x > *start_x + *range {
                    *direction = -*direction;
                }
            }
            Motion::Vertical {
                start_y,
                range,
                step,
            } => {
                self.rect.y += *step;
                if (self.rect.y - *start_y).abs() > *range {
                    *step = -*step;
                }
            }
        }
    }
}

impl Ground for Platform {
    fn rect(&self) -> Rect {
        self.rect
    }

    fn carry(&self) -> (i32, i32) {
        match self.motion {
            Motion::Vertical { step, .. } => (0, step),
            _ => (0, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Patrol {
    /// Walks back and forth within `range` of `start_x`.
    Range { start_x: i32, range: i32, speed: i32 },
    /// Turns around at the playfield edges.
    ScreenEdges { direction: i32 },
    /// Walks one way forever.
    Drift { direction: i32 },
}

#[derive(Clone, Copy, Debug)]
pub struct Enemy {
    pub rect: Rect,
    pub patrol: Patrol,
    pub anim: Option<Animation>,
}

impl Enemy {
    pub fn ranged(x: i32, y: i32, range: i32) -> Self {
        Self {
            rect: Rect::new(x, y, ENEMY_SIZE, ENEMY_SIZE),
            patrol: Patrol::Range {
                start_x: x,
                range,
                speed: 2,
            },
            anim: None,
        }
    }

    pub fn bouncing(x: i32, y: i32, period: u32) -> Self {
        Self {
            rect: Rect::new(x, y, ENEMY_SIZE, ENEMY_SIZE),
            patrol: Patrol::ScreenEdges { direction: 1 },
            anim: Some(Animation::new(period)),
        }
    }

    pub fn drifting(x: i32, y: i32) -> Self {
        Self {
            rect: Rect::new(x, y, ENEMY_SIZE, ENEMY_SIZE),
            patrol: Patrol::Drift { direction: 1 },
            anim: Some(Animation::new(20)),
        }
    }

    pub fn image(&self) -> usize {
        self.anim.map_or(0, |a| a.image())
    }

    pub fn update(&mut self, field: Playfield) {
        match &mut self.patrol {
            Patrol::Range {
                start_x,
                range,
                speed,
            } => {
                self.rect.x += *speed;
                if (self.rect.x - *start_x).abs() > *range {
                    *speed = -*speed;
                }
            }
            Patrol::ScreenEdges { direction } => {
                self.rect.x += *direction * 2;
                if self.rect.left() < 0 || self.rect.right() > field.width {
                    *direction = -*direction;
                }
            }
            Patrol::Drift { direction } => {
                self.rect.x += *direction * 2;
            }
        }
        if let Some(anim) = &mut self.anim {
            anim.advance();
        }
    }
}

/// Held-key snapshot for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Input {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

/// Something the robot should react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Jumped,
    Landed,
    Falling,
    HitEnemy,
    FellOut,
    LevelDone,
    LevelAdvanced(usize),
    AllLevelsDone,
    ChunkAppended { start_x: i32 },
}

#[derive(Clone, Debug)]
pub struct GameState {
    pub variant: Variant,
    pub field: Playfield,
    pub player: Player,
    pub platforms: Vec<Platform>,
    pub enemies: Vec<Enemy>,
    pub scroll_x: i32,
    pub level: usize,
    pub level_end_x: i32,
    pub level_done: bool,
    pub fall_timer: u32,
    pub game_over: bool,
}

impl GameState {
    pub fn new<R: Rng>(variant: Variant, field: Playfield, rng: &mut R) -> Self {
        let (platforms, enemies) = match variant {
            Variant::Scroller => level::create_chunk(0, true, rng),
            _ => level::layout(variant, 0, field),
        };
        Self {
            variant,
            field,
            player: Player::new(SPAWN.0, SPAWN.1),
            platforms,
            enemies,
            scroll_x: 0,
            level: 0,
            level_end_x: CHUNK_LENGTH,
            level_done: false,
            fall_timer: 0,
            game_over: false,
        }
    }

    /// Advances the world by one frame and reports what happened.
    pub fn update<R: Rng>(&mut self, input: Input, rng: &mut R) -> Vec<GameEvent> {
        let mut events = Vec::new();

        self.update_player(input, &mut events);
        for p in &mut self.platforms {
            p.update();
        }
        let field = self.field;
        for e in &mut self.enemies {
            e.update(field);
        }

        self.detect_fall(&mut events);
        self.check_enemies(&mut events);
        self.check_level_end(rng, &mut events);
        self.scroll();

        events
    }

    fn update_player(&mut self, input: Input, events: &mut Vec<GameEvent>) {
        let player = &mut self.player;
        let mut dx = 0;
        if input.left {
            dx = -WALK_SPEED;
            player.pose = Pose::Walking(player.walk.advance());
        } else if input.right {
            dx = WALK_SPEED;
            player.pose = Pose::Walking(player.walk.advance());
        } else {
            player.pose = Pose::Standing;
        }

        if input.jump && player.on_ground {
            player.vel_y = JUMP_POWER;
            player.on_ground = false;
            events.push(GameEvent::Jumped);
        }

        player.vel_y = physics::apply_gravity(player.vel_y);

        player.rect.x += dx;
        player.rect.y += player.vel_y;

        if self.variant == Variant::Arena {
            player.rect.x = player.rect.x.clamp(0, self.field.width - player.rect.w);
        }

        let was_on_ground = player.on_ground;
        let landings = physics::resolve_landings(
            &mut player.rect,
            &mut player.vel_y,
            &mut player.on_ground,
            &self.platforms,
        );
        if !landings.is_empty() && !was_on_ground {
            events.push(GameEvent::Landed);
        }
    }

    fn detect_fall(&mut self, events: &mut Vec<GameEvent>) {
        if self.player.vel_y > self.variant.fall_threshold() && !self.player.on_ground {
            self.fall_timer += 1;
            if self.fall_timer == FALL_FRAMES {
                events.push(GameEvent::Falling);
            }
        } else {
            self.fall_timer = 0;
        }

        if self.variant == Variant::Scroller && self.player.rect.top() > self.field.height {
            // A fall that already raised `Falling` respawns silently.
            if self.fall_timer < FALL_FRAMES {
                events.push(GameEvent::FellOut);
            }
            self.player
                .respawn(self.scroll_x + SPAWN.0, self.field.height / 6);
            self.fall_timer = 0;
        }
    }

    fn check_enemies(&mut self, events: &mut Vec<GameEvent>) {
        if self.variant != Variant::Arena {
            return;
        }
        let hit = self
            .enemies
            .iter()
            .any(|e| self.player.rect.collides(&e.rect));
        if hit {
            self.player.respawn(SPAWN.0, SPAWN.1);
            events.push(GameEvent::HitEnemy);
        }
    }

    fn check_level_end<R: Rng>(&mut self, rng: &mut R, events: &mut Vec<GameEvent>) {
        let exit_x = self.field.width - 60;
        match self.variant {
            Variant::Classic => {}
            Variant::Arena | Variant::Menu => {
                if self.player.rect.x > exit_x && !self.level_done {
                    self.level_done = true;
                    events.push(GameEvent::LevelDone);
                }
            }
            Variant::Levels => {
                if self.player.rect.x > exit_x {
                    self.level += 1;
                    if self.level < level::level_count(self.variant) {
                        let (platforms, enemies) = level::layout(self.variant, self.level, self.field);
                        self.platforms = platforms;
                        self.enemies = enemies;
                        self.player.rect.x = 50;
                        self.player.rect.y = self.field.height - 100;
                        events.push(GameEvent::LevelAdvanced(self.level));
                    } else {
                        self.game_over = true;
                        events.push(GameEvent::AllLevelsDone);
                    }
                }
            }
            Variant::Scroller => {
                if self.player.rect.x + self.field.width > self.level_end_x {
                    events.push(GameEvent::LevelDone);
                    let start_x = self.level_end_x;
                    let (platforms, enemies) = level::create_chunk(start_x, false, rng);
                    self.platforms.extend(platforms);
                    self.enemies.extend(enemies);
                    self.level_end_x += CHUNK_LENGTH;
                    self.level += 1;
                    self.prune_behind();
                    events.push(GameEvent::ChunkAppended { start_x });
                }
            }
        }
    }

    fn scroll(&mut self) {
        if self.variant != Variant::Scroller {
            return;
        }
        let half = self.field.width / 2;
        if self.player.rect.x - self.scroll_x > half {
            self.scroll_x = self.player.rect.x - half;
        }
    }

    /// Drops scroller sprites that lie a full chunk behind the view.
    fn prune_behind(&mut self) {
        let cutoff = self.scroll_x - CHUNK_LENGTH;
        self.platforms.retain(|p| p.rect.right() > cutoff);
        self.enemies.retain(|e| e.rect.right() > cutoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state(variant: Variant) -> (GameState, StdRng) {
        let mut rng = StdRng::seed_from_u64(7);
        let state = GameState::new(variant, Playfield::default(), &mut rng);
        (state, rng)
    }

    fn settle(state: &mut GameState, rng: &mut StdRng) -> Vec<GameEvent> {
        let mut all = Vec::new();
        for _ in 0..120 {
            all.extend(state.update(Input::default(), rng));
        }
        all
    }

    #[test]
    fn player_lands_once_and_stays_grounded() {
        let (mut s, mut rng) = state(Variant::Classic);
        let events = settle(&mut s, &mut rng);

        assert!(s.player.on_ground);
        assert_eq!(s.player.vel_y, 0);
        assert_eq!(s.player.rect.bottom(), 560);
        assert_eq!(events.iter().filter(|e| **e == GameEvent::Landed).count(), 1);
    }

    #[test]
    fn jump_only_from_ground() {
        let (mut s, mut rng) = state(Variant::Classic);
        let jump = Input {
            jump: true,
            ..Input::default()
        };
        // Airborne at spawn: no jump.
        assert!(!s.update(jump, &mut rng).contains(&GameEvent::Jumped));

        settle(&mut s, &mut rng);
        let events = s.update(jump, &mut rng);
        assert!(events.contains(&GameEvent::Jumped));
        assert_eq!(s.player.vel_y, JUMP_POWER + 1);
        assert!(!s.player.on_ground);
    }

    #[test]
    fn walking_animates_and_standing_resets_pose() {
        let (mut s, mut rng) = state(Variant::Classic);
        let right = Input {
            right: true,
            ..Input::default()
        };
        let x = s.player.rect.x;
        for _ in 0..5 {
            s.update(right, &mut rng);
        }
        assert_eq!(s.player.rect.x, x + 25);
        assert_eq!(s.player.pose, Pose::Walking(1));

        s.update(Input::default(), &mut rng);
        assert_eq!(s.player.pose, Pose::Standing);
    }

    #[test]
    fn falling_fires_once_after_twenty_frames() {
        let (mut s, mut rng) = state(Variant::Classic);
        s.platforms.clear();
        let mut falls = 0;
        for _ in 0..80 {
            falls += s
                .update(Input::default(), &mut rng)
                .iter()
                .filter(|e| **e == GameEvent::Falling)
                .count();
        }
        assert_eq!(falls, 1);
        assert!(s.fall_timer > FALL_FRAMES);
    }

    #[test]
    fn arena_clamps_to_playfield() {
        let (mut s, mut rng) = state(Variant::Arena);
        let left = Input {
            left: true,
            ..Input::default()
        };
        for _ in 0..60 {
            s.update(left, &mut rng);
        }
        assert_eq!(s.player.rect.x, 0);
    }

    #[test]
    fn arena_enemy_contact_respawns() {
        let (mut s, mut rng) = state(Variant::Arena);
        s.enemies[0].rect.x = s.player.rect.x;
        s.enemies[0].rect.y = s.player.rect.y + 10;
        s.enemies[0].patrol = Patrol::Drift { direction: 0 };

        let events = s.update(Input::default(), &mut rng);

        assert!(events.contains(&GameEvent::HitEnemy));
        assert_eq!((s.player.rect.x, s.player.rect.y), SPAWN);
        assert_eq!(s.player.vel_y, 0);
    }

    #[test]
    fn level_done_fires_once() {
        let (mut s, mut rng) = state(Variant::Menu);
        s.player.rect.x = 760;
        let mut done = 0;
        for _ in 0..5 {
            done += s
                .update(Input::default(), &mut rng)
                .iter()
                .filter(|e| **e == GameEvent::LevelDone)
                .count();
        }
        assert_eq!(done, 1);
        assert!(s.level_done);
    }

    #[test]
    fn levels_advance_then_finish() {
        let (mut s, mut rng) = state(Variant::Levels);
        s.player.rect.x = 760;
        let events = s.update(Input::default(), &mut rng);
        assert!(events.contains(&GameEvent::LevelAdvanced(1)));
        assert_eq!((s.player.rect.x, s.player.rect.y), (50, 500));
        assert_eq!(s.platforms.len(), 4);

        s.player.rect.x = 760;
        let events = s.update(Input::default(), &mut rng);
        assert!(events.contains(&GameEvent::AllLevelsDone));
        assert!(s.game_over);
    }

    #[test]
    fn lift_carries_player() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = GameState::new(Variant::Arena, Playfield::default(), &mut rng);
        s.platforms = vec![Platform::lift(Rect::new(0, 300, 200, 20), 2, 60)];
        s.enemies.clear();
        s.player.respawn(50, 241);
        s.update(Input::default(), &mut rng);
        // Snapped onto the lift top, then carried by one step.
        assert_eq!(s.player.rect.bottom(), 302);
        assert!(s.player.on_ground);
    }

    #[test]
    fn sliding_platform_reverses_at_range() {
        let mut p = Platform::sliding(Rect::new(100, 300, 100, 20), 10, 3);
        let mut max_x = p.rect.x;
        let mut min_x = p.rect.x;
        for _ in 0..50 {
            p.update();
            max_x = max_x.max(p.rect.x);
            min_x = min_x.min(p.rect.x);
        }
        assert!(max_x <= 100 + 10 + 3);
        assert!(min_x >= 100 - 3);
    }

    #[test]
    fn ranged_enemy_turns_around() {
        let mut e = Enemy::ranged(400, 520, 120);
        for _ in 0..200 {
            e.update(Playfield::default());
            assert!((e.rect.x - 400).abs() <= 122);
        }
    }

    #[test]
    fn bouncing_enemy_turns_at_screen_edges() {
        let field = Playfield::default();
        let mut e = Enemy::bouncing(300, 410, 10);
        let (mut min_left, mut max_right) = (e.rect.left(), e.rect.right());
        let mut turns = 0;
        let mut direction = 1;
        for _ in 0..2000 {
            e.update(field);
            min_left = min_left.min(e.rect.left());
            max_right = max_right.max(e.rect.right());
            if let Patrol::ScreenEdges { direction: d } = e.patrol {
                if d != direction {
                    turns += 1;
                    direction = d;
                }
            }
        }
        // One step past either edge before turning.
        assert!(min_left >= -2);
        assert!(max_right <= field.width + 2);
        assert!(turns >= 4);
    }

    #[test]
    fn lift_stays_within_range_plus_one_step() {
        let mut p = Platform::lift(Rect::new(400, 250, 120, 20), 2, 60);
        let (mut min_y, mut max_y) = (p.rect.y, p.rect.y);
        for _ in 0..2000 {
            p.update();
            min_y = min_y.min(p.rect.y);
            max_y = max_y.max(p.rect.y);
        }
        assert!(min_y >= 250 - 60 - 2);
        assert!(max_y <= 250 + 60 + 2);
        // It really travels both ways.
        assert!(min_y < 250 - 50);
        assert!(max_y > 250 + 50);
    }

    #[test]
    fn one_long_fall_reports_once() {
        let (mut s, mut rng) = state(Variant::Scroller);
        s.platforms.clear();
        s.enemies.clear();
        s.player.rect.y = 0;
        let mut reported = Vec::new();
        for _ in 0..200 {
            let events = s.update(Input::default(), &mut rng);
            reported.extend(
                events
                    .into_iter()
                    .filter(|e| matches!(e, GameEvent::Falling | GameEvent::FellOut)),
            );
            if s.player.rect.y == s.field.height / 6 && s.player.vel_y == 0 {
                break;
            }
        }
        assert_eq!(reported, [GameEvent::Falling]);
        assert_eq!(s.player.rect.x, s.scroll_x + SPAWN.0);
        assert_eq!(s.fall_timer, 0);
    }

    #[test]
    fn scroller_appends_chunks_and_scrolls() {
        let (mut s, mut rng) = state(Variant::Scroller);
        s.player.rect.x = 1800;
        let events = s.update(Input::default(), &mut rng);
        assert!(events.contains(&GameEvent::ChunkAppended { start_x: CHUNK_LENGTH }));
        assert_eq!(s.level_end_x, 2 * CHUNK_LENGTH);
        assert_eq!(s.scroll_x, s.player.rect.x - 400);
    }

    #[test]
    fn scroller_respawns_after_falling_out() {
        let (mut s, mut rng) = state(Variant::Scroller);
        s.platforms.clear();
        let mut fell_out = false;
        for _ in 0..200 {
            if s.update(Input::default(), &mut rng).contains(&GameEvent::FellOut) {
                fell_out = true;
                break;
            }
        }
        assert!(fell_out);
        assert!(s.player.rect.top() < s.field.height);
    }
}
