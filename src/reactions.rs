//! What the robot (and the speakers) do when something happens in the game.
//!
//! Sound cues always play. Robot calls only go out while connected.

use std::thread;
use std::time::Duration;

use crate::audio::Audio;
use crate::game::{GameEvent, Variant};
use crate::robot::{MemoryValue, Robot, RobotLink, RobotResult, Service, Subscriber};

pub const FALL_EVENT: &str = "NaoGame/FallEvent";

pub const CUE_JUMP: &str = "jump";
pub const CUE_LAND: &str = "land";
pub const CUE_FALL: &str = "fall";
pub const CUE_APPLAUSE: &str = "applause";
pub const GAME_CUES: [&str; 4] = [CUE_JUMP, CUE_LAND, CUE_FALL, CUE_APPLAUSE];

const BLUE: u32 = 0x0000FF;
const GREEN: u32 = 0x00FF00;
const RED: u32 = 0xFF0000;
const YELLOW: u32 = 0xFFFF00;
const WHITE: u32 = 0xFFFFFF;
const OFF: u32 = 0x000000;

/// Proxies each variant opens at startup.
pub fn services(variant: Variant) -> &'static [Service] {
    match variant {
        Variant::Classic => &[
            Service::TextToSpeech,
            Service::Motion,
            Service::RobotPosture,
        ],
        Variant::Scroller => &[
            Service::Motion,
            Service::Leds,
            Service::AnimatedSpeech,
            Service::Memory,
        ],
        _ => &[
            Service::Motion,
            Service::Leds,
            Service::TextToSpeech,
            Service::AnimatedSpeech,
            Service::AudioPlayer,
            Service::Memory,
        ],
    }
}

/// Lines that differ between variants.
struct Lines {
    land: &'static str,
    applaud: &'static str,
}

impl Lines {
    fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Menu | Variant::Scroller => Lines {
                land: "\\style=joyful\\ Gut gelandet!",
                applaud: "\\style=joyful\\ Bravo!",
            },
            _ => Lines {
                land: "\\style=joyful\\ Geschafft! \\pau=200\\ Gut gelandet!",
                applaud: "\\style=joyful\\ Super gemacht! \\pau=400\\ Bravo!",
            },
        }
    }
}

pub struct Reactions {
    variant: Variant,
    lines: Lines,
    robot: Robot,
    audio: Audio,
    fall_events: Option<Subscriber>,
    clap_pause: Duration,
}

impl Reactions {
    pub fn new(variant: Variant, mut robot: Robot, audio: Audio) -> Self {
        let fall_events = if matches!(variant, Variant::Arena | Variant::Menu | Variant::Levels) {
            robot.with(|link| link.subscribe(FALL_EVENT))
        } else {
            None
        };
        Self {
            variant,
            lines: Lines::for_variant(variant),
            robot,
            audio,
            fall_events,
            clap_pause: Duration::from_millis(200),
        }
    }

    /// Pause between the two claps of the applause motion.
    pub fn with_clap_pause(mut self, pause: Duration) -> Self {
        self.clap_pause = pause;
        self
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    pub fn robot_mut(&mut self) -> &mut Robot {
        &mut self.robot
    }

    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut Audio {
        &mut self.audio
    }

    pub fn on_event(&mut self, event: GameEvent) {
        tracing::debug!(?event, "game event");
        match event {
            GameEvent::Jumped => self.jump(),
            GameEvent::Landed => self.land(),
            GameEvent::Falling | GameEvent::HitEnemy | GameEvent::FellOut => self.fall(),
            GameEvent::LevelDone | GameEvent::LevelAdvanced(_) => self.applaud(),
            GameEvent::AllLevelsDone => self
                .robot
                .say("\\style=joyful\\ Herzlichen Glückwunsch, alle Level geschafft!"),
            GameEvent::ChunkAppended { start_x } => {
                tracing::info!(start_x, "level chunk appended");
            }
        }
    }

    /// Handles signals raised on the robot since the last frame.
    pub fn poll(&mut self) {
        let pending = self
            .fall_events
            .as_ref()
            .map(Subscriber::drain)
            .unwrap_or_default();
        for value in pending {
            tracing::debug!(?value, key = FALL_EVENT, "signal");
            self.robot.say("\\style=sad\\ Oh nein, das tat weh!");
        }
    }

    pub fn jump(&mut self) {
        match self.variant {
            Variant::Classic => {
                self.robot.tts("Hüpfen!");
                self.robot
                    .with(|link| link.angle_interpolation_with_speed("HeadPitch", -0.3, 0.2));
            }
            Variant::Scroller => {
                self.audio.play(CUE_JUMP);
                self.robot.say("\\style=excited\\ Hüpfen!");
            }
            _ => {
                self.robot.with(|link| link.fade_rgb("FaceLeds", BLUE, 0.3));
                self.robot
                    .say("\\style=excited\\ Hüpfen! \\pau=400\\ Los geht’s!");
                self.robot.with(|link| {
                    link.set_angles(&["HeadPitch", "RShoulderRoll"], &[-0.3, -0.2], 0.3)
                });
                self.audio.play(CUE_JUMP);
            }
        }
    }

    pub fn land(&mut self) {
        match self.variant {
            Variant::Classic => {
                self.robot
                    .with(|link| link.angle_interpolation_with_speed("HeadPitch", 0.1, 0.2));
            }
            Variant::Scroller => {
                self.audio.play(CUE_LAND);
                self.robot.say(self.lines.land);
            }
            _ => {
                self.robot.with(|link| link.fade_rgb("FaceLeds", GREEN, 0.3));
                self.robot.say(self.lines.land);
                self.robot
                    .with(|link| link.set_angles(&["HeadPitch"], &[0.1], 0.2));
                self.audio.play(CUE_LAND);
            }
        }
    }

    pub fn fall(&mut self) {
        match self.variant {
            Variant::Classic => self.robot.tts("Achtung, ich falle!"),
            Variant::Scroller => {
                self.audio.play(CUE_FALL);
                self.robot.say("\\style=fearful\\ Aaaah, ich falle!");
            }
            _ => {
                self.robot.with(|link| link.fade_rgb("FaceLeds", RED, 0.3));
                self.robot.say("\\style=fearful\\ Aaaah, ich falle!");
                self.robot.with(|link| {
                    link.set_angles(&["HeadPitch"], &[0.4], 0.3)?;
                    link.raise_event(FALL_EVENT, MemoryValue::Int(1))
                });
                self.audio.play(CUE_FALL);
            }
        }
    }

    pub fn applaud(&mut self) {
        if self.variant == Variant::Scroller {
            self.audio.play(CUE_APPLAUSE);
            self.robot.say(self.lines.applaud);
            return;
        }
        self.robot.say(self.lines.applaud);
        let pause = self.clap_pause;
        self.robot.with(|link| {
            link.fade_rgb("FaceLeds", YELLOW, 0.5)?;
            if let Err(e) = clap_hands(link, pause) {
                tracing::debug!(error = %e, "applause motion skipped");
            }
            link.fade_rgb("FaceLeds", WHITE, 0.5)
        });
        self.audio.play(CUE_APPLAUSE);
    }

    pub fn cheer(&mut self) {
        self.robot.say("\\style=joyful\\ Jaa! Weiter so!");
        self.robot.with(|link| link.fade_rgb("FaceLeds", GREEN, 0.5));
    }

    pub fn boo(&mut self) {
        self.robot.say("\\style=sad\\ Oh nein, das war nichts...");
        self.robot.with(|link| link.fade_rgb("FaceLeds", RED, 0.5));
    }

    /// The player chose to start from the menu.
    pub fn start(&mut self) {
        match self.variant {
            Variant::Scroller => self.robot.say("\\style=excited\\ Das Spiel beginnt!"),
            _ => self.robot.say("\\style=excited\\ Lass uns spielen!"),
        }
    }

    /// The player quit from the menu.
    pub fn farewell(&mut self) {
        if self.variant != Variant::Scroller {
            self.robot.say("\\style=neutral\\ Auf Wiedersehen!");
        }
    }

    /// The window was closed mid-game.
    pub fn goodbye(&mut self) {
        match self.variant {
            Variant::Classic => self.robot.tts("Bis bald!"),
            Variant::Scroller => {}
            _ => {
                self.robot.say("\\style=neutral\\ Bis bald, Spieler!");
                self.robot.with(|link| link.fade_rgb("FaceLeds", OFF, 0.5));
            }
        }
    }
}

/// Raise both arms, clap twice, lower them.
fn clap_hands(link: &mut dyn RobotLink, pause: Duration) -> RobotResult<()> {
    link.set_angles(&["LShoulderPitch", "RShoulderPitch"], &[0.4, 0.4], 0.3)?;
    for _ in 0..2 {
        link.set_angles(&["LElbowRoll", "RElbowRoll"], &[-1.0, 1.0], 0.5)?;
        thread::sleep(pause);
        link.set_angles(&["LElbowRoll", "RElbowRoll"], &[-0.3, 0.3], 0.5)?;
    }
    link.set_angles(&["LShoulderPitch", "RShoulderPitch"], &[1.2, 1.2], 0.3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot::{Backend, Endpoint, Service};

    fn reactions(variant: Variant, backend: Backend) -> Reactions {
        let robot = Robot::connect(
            backend,
            Endpoint {
                host: "192.168.13.188".into(),
                port: 9559,
            },
            &Service::ALL,
        );
        Reactions::new(variant, robot, Audio::silent()).with_clap_pause(Duration::ZERO)
    }

    #[test]
    fn sounds_play_even_when_disconnected() {
        let mut r = reactions(Variant::Arena, Backend::Offline);
        r.on_event(GameEvent::Jumped);
        r.on_event(GameEvent::Landed);
        r.on_event(GameEvent::Falling);
        r.on_event(GameEvent::LevelDone);

        assert_eq!(r.audio().played(), GAME_CUES);
        assert_eq!(r.robot().last_said(), None);
    }

    #[test]
    fn fall_event_comes_back_through_memory() {
        let mut r = reactions(Variant::Arena, Backend::Simulated);
        r.on_event(GameEvent::HitEnemy);
        assert_eq!(r.robot().last_said(), Some("Aaaah, ich falle!"));

        r.poll();
        assert_eq!(r.robot().last_said(), Some("Oh nein, das tat weh!"));

        let stored = r.robot_mut().with(|link| link.get_data(FALL_EVENT));
        assert_eq!(stored, Some(MemoryValue::Int(1)));
    }

    #[test]
    fn scroller_has_no_fall_subscriber() {
        let mut r = reactions(Variant::Scroller, Backend::Simulated);
        r.on_event(GameEvent::Falling);
        r.poll();
        assert_eq!(r.robot().last_said(), Some("Aaaah, ich falle!"));
        assert_eq!(r.audio().played(), [CUE_FALL]);
    }

    #[test]
    fn classic_uses_plain_speech_without_sounds() {
        let mut r = reactions(Variant::Classic, Backend::Simulated);
        r.jump();
        assert_eq!(r.robot().last_said(), Some("Hüpfen!"));
        r.goodbye();
        assert_eq!(r.robot().last_said(), Some("Bis bald!"));
        assert!(r.audio().played().is_empty());
    }

    #[test]
    fn applause_moves_the_arms() {
        let mut r = reactions(Variant::Levels, Backend::Simulated);
        r.on_event(GameEvent::LevelAdvanced(1));
        assert_eq!(r.robot().last_said(), Some("Super gemacht! Bravo!"));
        let summary = r.robot_mut().with(|link| link.summary());
        assert!(summary.unwrap().contains("Stiffness: on"));
    }

    #[test]
    fn menu_lines() {
        let mut r = reactions(Variant::Menu, Backend::Simulated);
        r.start();
        assert_eq!(r.robot().last_said(), Some("Lass uns spielen!"));
        r.land();
        assert_eq!(r.robot().last_said(), Some("Gut gelandet!"));
        r.farewell();
        assert_eq!(r.robot().last_said(), Some("Auf Wiedersehen!"));
    }

    #[test]
    fn variant_services_cover_its_calls() {
        for variant in [Variant::Classic, Variant::Arena, Variant::Scroller] {
            let robot = Robot::connect(
                Backend::Simulated,
                Endpoint {
                    host: "192.168.13.188".into(),
                    port: 9559,
                },
                services(variant),
            );
            let mut r = Reactions::new(variant, robot, Audio::silent())
                .with_clap_pause(Duration::ZERO);
            r.jump();
            r.land();
            r.fall();
            assert!(r.robot().last_said().is_some(), "{variant:?}");
        }
    }

    #[test]
    fn audience_keys() {
        let mut r = reactions(Variant::Arena, Backend::Simulated);
        r.cheer();
        assert_eq!(r.robot().last_said(), Some("Jaa! Weiter so!"));
        r.boo();
        assert_eq!(r.robot().last_said(), Some("Oh nein, das war nichts..."));
    }
}
