//! NAO show demos.
//!
//! A terminal platformer whose events drive a NAO robot's speech, LEDs and
//! arms, plus a few stand-alone routines: an LED test, a greeting, and an
//! ambient insect toy.

pub mod audio;
pub mod config;
pub mod demos;
pub mod game;
pub mod input;
pub mod level;
pub mod logger;
pub mod menu;
pub mod physics;
pub mod reactions;
pub mod render;
pub mod robot;
pub mod toy;
