//! Ambient toy: insects buzzing around a wandering light spot.

use std::f32::consts::{FRAC_PI_3, FRAC_PI_4, TAU};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::game::Playfield;

pub const INSECT_COUNT: usize = 8;
pub const BACKGROUND: (u8, u8, u8) = (10, 10, 10);
pub const LIGHT: (u8, u8, u8) = (255, 255, 255);

const TURN_CHANCE: f64 = 0.02;
const PAUSE_CHANCE: f64 = 0.01;
const SPOT_TURN_CHANCE: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InsectKind {
    /// Sound cue family, also the cue name in the sound bank.
    pub cue: &'static str,
    pub color: (u8, u8, u8),
    pub size: f32,
    pub speed: f32,
}

pub const KINDS: [InsectKind; 3] = [
    InsectKind {
        cue: "buzz",
        color: (255, 255, 100),
        size: 12.0,
        speed: 2.8,
    },
    InsectKind {
        cue: "chirp",
        color: (100, 255, 100),
        size: 18.0,
        speed: 1.6,
    },
    InsectKind {
        cue: "buzz",
        color: (255, 180, 50),
        size: 8.0,
        speed: 3.5,
    },
];

/// Sound families and their files, relative to the sounds directory.
pub const CUES: [(&str, [&str; 3]); 2] = [
    ("buzz", ["buzz1.wav", "buzz2.wav", "buzz3.wav"]),
    ("chirp", ["chirp1.wav", "chirp2.wav", "chirp3.wav"]),
];

#[derive(Clone, Debug, PartialEq)]
pub struct Insect {
    pub kind: InsectKind,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub pause: u32,
}

impl Insect {
    pub fn spawn<R: Rng>(kind: InsectKind, field: Playfield, rng: &mut R) -> Self {
        let r = kind.size as i32;
        Self {
            kind,
            x: rng.gen_range(r..=(field.width - r).max(r)) as f32,
            y: rng.gen_range(r..=(field.height - r).max(r)) as f32,
            angle: rng.gen_range(0.0..TAU),
            pause: 0,
        }
    }

    /// Advances one frame; returns the cue to play, if any.
    pub fn update<R: Rng>(&mut self, field: Playfield, rng: &mut R) -> Option<&'static str> {
        if self.pause > 0 {
            self.pause -= 1;
            return None;
        }

        let mut cue = None;
        if rng.gen_bool(TURN_CHANCE) {
            self.angle += rng.gen_range(-FRAC_PI_3..=FRAC_PI_3);
            cue = Some(self.kind.cue);
        }
        if rng.gen_bool(PAUSE_CHANCE) {
            self.pause = rng.gen_range(10..=30);
            cue = Some(self.kind.cue);
        }

        self.x += self.angle.cos() * self.kind.speed;
        self.y += self.angle.sin() * self.kind.speed;
        self.angle = reflect(
            self.angle,
            self.x,
            self.y,
            self.kind.size,
            field.width as f32 - self.kind.size,
            field.height as f32 - self.kind.size,
        );
        cue
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LightSpot {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub angle: f32,
    pub speed: f32,
    pub phase: f32,
}

impl LightSpot {
    pub fn new<R: Rng>(field: Playfield, rng: &mut R) -> Self {
        Self {
            x: (field.width / 2) as f32,
            y: (field.height / 2) as f32,
            radius: 60.0,
            angle: rng.gen_range(0.0..TAU),
            speed: 2.0,
            phase: 0.0,
        }
    }

    pub fn update<R: Rng>(&mut self, field: Playfield, rng: &mut R) {
        self.phase += 0.03;
        self.x += self.angle.cos() * self.speed;
        self.y += self.angle.sin() * self.speed;
        // Pulses between 40 and 80 px, whole pixels only.
        self.radius = 60.0 + (20.0 * self.phase.sin()).trunc();
        if rng.gen_bool(SPOT_TURN_CHANCE) {
            self.angle += rng.gen_range(-FRAC_PI_4..=FRAC_PI_4);
        }
        self.angle = reflect(
            self.angle,
            self.x,
            self.y,
            0.0,
            field.width as f32,
            field.height as f32,
        );
    }
}

/// Mirrors the heading off whichever bounds the position is outside of.
fn reflect(mut angle: f32, x: f32, y: f32, lo: f32, max_x: f32, max_y: f32) -> f32 {
    if x < lo || x > max_x {
        angle = std::f32::consts::PI - angle;
    }
    if y < lo || y > max_y {
        angle = -angle;
    }
    angle
}

pub struct Toy {
    pub field: Playfield,
    pub insects: Vec<Insect>,
    pub light: LightSpot,
}

impl Toy {
    pub fn new<R: Rng>(field: Playfield, rng: &mut R) -> Self {
        let insects = (0..INSECT_COUNT)
            .map(|_| {
                let kind = *KINDS.choose(rng).unwrap_or(&KINDS[0]);
                Insect::spawn(kind, field, rng)
            })
            .collect();
        let light = LightSpot::new(field, rng);
        tracing::info!(insects = INSECT_COUNT, "toy started");
        Self {
            field,
            insects,
            light,
        }
    }

    /// Moves everything one frame; returns the cues to play.
    pub fn update<R: Rng>(&mut self, rng: &mut R) -> Vec<&'static str> {
        let mut cues = Vec::new();
        for insect in &mut self.insects {
            cues.extend(insect.update(self.field, rng));
        }
        self.light.update(self.field, rng);
        cues
    }
}
