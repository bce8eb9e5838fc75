//! Sprite kinematics shared by every game variant.
//!
//! Coordinates are integer pixels on the logical playfield, y grows downward.

pub const GRAVITY: i32 = 1;
pub const TERMINAL_VELOCITY: i32 = 10;
pub const JUMP_POWER: i32 = -15;
pub const WALK_SPEED: i32 = 5;

/// Axis-aligned rectangle in playfield pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn set_bottom(&mut self, bottom: i32) {
        self.y = bottom - self.h;
    }

    /// Half-open intersection: rectangles that only share an edge do not
    /// collide, and empty rectangles never collide.
    pub fn collides(&self, other: &Rect) -> bool {
        if self.w <= 0 || self.h <= 0 || other.w <= 0 || other.h <= 0 {
            return false;
        }
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}

/// Adds one frame of gravity, clamped to the terminal velocity.
pub fn apply_gravity(vel_y: i32) -> i32 {
    (vel_y + GRAVITY).min(TERMINAL_VELOCITY)
}

/// Something the actor can stand on.
pub trait Ground {
    fn rect(&self) -> Rect;

    /// Displacement applied to a body resting on this ground this frame.
    fn carry(&self) -> (i32, i32) {
        (0, 0)
    }
}

impl Ground for Rect {
    fn rect(&self) -> Rect {
        *self
    }
}

/// Outcome of a single landing test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Landing {
    pub platform: usize,
    pub top: i32,
}

/// Snaps `body` onto every ground it overlaps while not moving upward.
///
/// Clears the on-ground flag first, then every overlapping ground sets it
/// again and reports a landing. A carrying ground also moves the body by its
/// displacement.
pub fn resolve_landings<G: Ground>(
    body: &mut Rect,
    vel_y: &mut i32,
    on_ground: &mut bool,
    grounds: &[G],
) -> Vec<Landing> {
    let mut landings = Vec::new();
    *on_ground = false;
    for (index, ground) in grounds.iter().enumerate() {
        let rect = ground.rect();
        if body.collides(&rect) && *vel_y >= 0 {
            body.set_bottom(rect.top());
            *vel_y = 0;
            *on_ground = true;
            let (dx, dy) = ground.carry();
            body.x += dx;
            body.y += dy;
            landings.push(Landing {
                platform: index,
                top: rect.top(),
            });
        }
    }
    landings
}

/// Frame counter that wraps at `period` and selects one of two images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Animation {
    pub frame: u32,
    pub period: u32,
}

impl Animation {
    pub const fn new(period: u32) -> Self {
        Self { frame: 0, period }
    }

    pub fn advance(&mut self) -> usize {
        self.frame += 1;
        if self.frame >= self.period {
            self.frame = 0;
        }
        self.image()
    }

    pub fn image(&self) -> usize {
        (self.frame / (self.period / 2).max(1)) as usize
    }
}
