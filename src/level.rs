//! Level layouts for every variant, plus chunk generation for the scroller.

use rand::Rng;

use crate::game::{Enemy, Patrol, Platform, Playfield, Variant, ENEMY_SIZE};
use crate::physics::{Animation, Rect};

pub const CHUNK_PLATFORMS: usize = 10;
pub const CHUNK_SPACING: i32 = 250;
pub const BLOCK_WIDTH: i32 = 200;
pub const BLOCK_HEIGHT: i32 = 30;
pub const BLOCK_SKINS: usize = 2;
const ENEMY_CHANCE: f64 = 0.4;

/// Number of hand-made levels a variant cycles through.
pub fn level_count(variant: Variant) -> usize {
    match variant {
        Variant::Levels => 2,
        _ => 1,
    }
}

fn ground(field: Playfield) -> Rect {
    Rect::new(0, field.height - 40, field.width, 40)
}

fn steps() -> [Rect; 2] {
    [Rect::new(200, 450, 200, 20), Rect::new(500, 350, 200, 20)]
}

/// Platforms and enemies of level `index`.
///
/// Variants without a level list ignore `index`. The scroller has no fixed
/// layout, see [`create_chunk`].
pub fn layout(variant: Variant, index: usize, field: Playfield) -> (Vec<Platform>, Vec<Enemy>) {
    let mut platforms: Vec<Platform> = std::iter::once(ground(field))
        .chain(steps())
        .enumerate()
        .map(|(i, r)| Platform::fixed(r).with_skin(i % BLOCK_SKINS))
        .collect();

    match variant {
        Variant::Classic | Variant::Scroller => (platforms, Vec::new()),
        Variant::Arena => {
            platforms.push(Platform::lift(Rect::new(350, 250, 120, 20), 2, 60));
            let enemies = vec![
                Enemy::ranged(400, field.height - 80, 120),
                Enemy::ranged(600, 330, 100),
            ];
            (platforms, enemies)
        }
        Variant::Menu => (platforms, vec![Enemy::bouncing(300, 410, 10)]),
        Variant::Levels => levels(index, field),
    }
}

fn levels(index: usize, field: Playfield) -> (Vec<Platform>, Vec<Enemy>) {
    let floor = Platform::sliding(ground(field), 0, 0);
    match index {
        0 => (
            vec![
                floor,
                Platform::sliding(Rect::new(200, 450, 200, 20), 100, 2),
                Platform::sliding(Rect::new(500, 350, 200, 20), 150, 3),
            ],
            vec![Enemy::drifting(300, 310)],
        ),
        _ => (
            vec![
                floor,
                Platform::sliding(Rect::new(150, 400, 150, 20), 100, 2),
                Platform::sliding(Rect::new(400, 300, 200, 20), 200, 3),
                Platform::sliding(Rect::new(650, 200, 100, 20), 50, 1),
            ],
            vec![Enemy::drifting(200, 360), Enemy::drifting(500, 260)],
        ),
    }
}

/// Generates the next stretch of the endless level starting at `start_x`.
///
/// Each of the ten blocks sits `CHUNK_SPACING` apart at a random height, half
/// of them slide, and some carry a patrolling enemy. The opening chunk keeps
/// its first block still so the player has somewhere to land.
pub fn create_chunk<R: Rng>(start_x: i32, opening: bool, rng: &mut R) -> (Vec<Platform>, Vec<Enemy>) {
    let mut platforms = Vec::with_capacity(CHUNK_PLATFORMS);
    let mut enemies = Vec::new();

    for i in 0..CHUNK_PLATFORMS {
        let x = start_x + i as i32 * CHUNK_SPACING;
        let y = rng.gen_range(300..=500);
        let rect = Rect::new(x, y, BLOCK_WIDTH, BLOCK_HEIGHT);
        let skin = rng.gen_range(0..BLOCK_SKINS);
        let movable = !(opening && i == 0) && rng.gen_bool(0.5);

        let platform = if movable {
            Platform::sliding(rect, rng.gen_range(100..=300), 2)
        } else {
            Platform::fixed(rect)
        };
        platforms.push(platform.with_skin(skin));

        if rng.gen_bool(ENEMY_CHANCE) {
            enemies.push(Enemy {
                rect: Rect::new(x + 50, y - 40, ENEMY_SIZE, ENEMY_SIZE),
                patrol: Patrol::Range {
                    start_x: x + 50,
                    range: 100,
                    speed: 2,
                },
                anim: Some(Animation::new(20)),
            });
        }
    }

    (platforms, enemies)
}
