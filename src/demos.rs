//! Stand-alone robot routines: the LED test and the greeting.

use std::f32::consts::FRAC_PI_2;
use std::thread;
use std::time::Duration;

use crate::robot::{MemoryValue, Robot, RobotLink, RobotResult, Service};

/// Memory key set while the front head button is pressed.
pub const FRONT_TOUCH: &str = "FrontTactilTouched";

pub const GREETING: &str = "Hallo, ich bin NAO! Darf ich bitte eure Aufmerksamkeit haben";

pub const LED_SERVICES: &[Service] = &[
    Service::TextToSpeech,
    Service::Leds,
    Service::Motion,
    Service::Memory,
    Service::System,
    Service::RobotPosture,
    Service::BehaviorManager,
    Service::AudioPlayer,
    Service::AudioDevice,
];

pub const HELLO_SERVICES: &[Service] = &[
    Service::TextToSpeech,
    Service::AudioPlayer,
    Service::AudioDevice,
];

const RED: u32 = 0xFF0000;
const BLUE: u32 = 0x0000FF;
const YELLOW: u32 = 0xFFFF00;

/// Eye segments lit together: even compass points and the diagonals.
const EYE_GROUPS: [(&str, &str, [u32; 4]); 4] = [
    ("LGroup1", "Left", [0, 90, 180, 270]),
    ("RGroup1", "Right", [0, 90, 180, 270]),
    ("LGroup2", "Left", [45, 135, 225, 315]),
    ("RGroup2", "Right", [45, 135, 225, 315]),
];

fn eye_leds(side: &str, degrees: [u32; 4]) -> Vec<String> {
    degrees
        .iter()
        .map(|deg| format!("Face/Led/Blue/{side}/{deg}Deg/Actuator/Value"))
        .collect()
}

/// Head-yaw sweep with the eye segments blinking in alternation.
///
/// Every thirtieth iteration completes one left/right/centre cycle; the face
/// color follows the head.
#[derive(Debug)]
pub struct LedRoutine {
    counter: u32,
    blink: Duration,
}

impl Default for LedRoutine {
    fn default() -> Self {
        Self::new(Duration::from_millis(10))
    }
}

impl LedRoutine {
    pub fn new(blink: Duration) -> Self {
        Self { counter: 0, blink }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Where the head is heading in the current cycle.
    pub fn phase(&self) -> &'static str {
        match self.counter {
            0..=9 => "centre",
            10..=19 => "left",
            _ => "right",
        }
    }

    pub fn begin(&mut self, link: &mut dyn RobotLink) -> RobotResult<()> {
        if !link.go_to_posture("Stand", 1.0)? {
            tracing::warn!("robot did not reach Stand");
        }
        link.fade_rgb("EarLeds", BLUE, 0.1)?;
        link.fade_rgb("FaceLeds", YELLOW, 0.1)?;
        self.counter = 0;
        Ok(())
    }

    pub fn touched(&self, link: &dyn RobotLink) -> RobotResult<bool> {
        Ok(link.get_data(FRONT_TOUCH)?.is_truthy())
    }

    /// One loop iteration.
    pub fn step(&mut self, link: &mut dyn RobotLink) -> RobotResult<()> {
        self.counter += 1;
        match self.counter {
            10 => {
                link.fade_rgb("FaceLeds", RED, 0.1)?;
                link.angle_interpolation("HeadYaw", FRAC_PI_2, 0.4, true)?;
            }
            20 => {
                link.fade_rgb("FaceLeds", BLUE, 0.1)?;
                link.angle_interpolation("HeadYaw", -FRAC_PI_2, 0.4, true)?;
            }
            30 => {
                self.counter = 0;
                link.fade_rgb("FaceLeds", YELLOW, 0.1)?;
                link.angle_interpolation("HeadYaw", 0.0, 0.4, true)?;
            }
            _ => {}
        }

        for (name, side, degrees) in EYE_GROUPS {
            let leds = eye_leds(side, degrees);
            let leds: Vec<&str> = leds.iter().map(String::as_str).collect();
            link.create_group(name, &leds)?;
        }

        thread::sleep(self.blink);
        link.led_on("LGroup1")?;
        link.led_on("RGroup1")?;
        link.led_off("LGroup2")?;
        link.led_off("RGroup2")?;

        thread::sleep(self.blink);
        link.led_on("LGroup2")?;
        link.led_on("RGroup2")?;
        link.led_off("LGroup1")?;
        link.led_off("RGroup1")
    }

    /// Centres the head, rests, and switches the LEDs off. Returns the
    /// motion summary.
    pub fn finish(&mut self, link: &mut dyn RobotLink) -> RobotResult<String> {
        link.angle_interpolation("HeadYaw", 0.0, 0.4, true)?;
        link.fade_rgb("FaceLeds", BLUE, 0.1)?;
        link.rest()?;
        let summary = link.summary()?;
        link.fade_rgb("FaceLeds", 0, 1.0)?;
        link.fade_rgb("EarLeds", 0, 1.0)?;
        Ok(summary)
    }
}

/// Simulates a touch of the front head button.
pub fn press_front_button(link: &mut dyn RobotLink) -> RobotResult<()> {
    link.insert_data(FRONT_TOUCH, MemoryValue::Bool(true))
}

/// Turns the speakers all the way up and greets the room.
///
/// Returns false when no robot is connected.
pub fn hello(robot: &mut Robot) -> bool {
    if !robot.is_connected() {
        return false;
    }
    robot.with(|link| link.set_output_volume(100));
    robot.tts(GREETING);
    robot.last_said() == Some(GREETING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot::{Backend, Endpoint, SimulatedRobot};

    fn endpoint() -> Endpoint {
        Endpoint {
            host: "ignis.local".into(),
            port: 9559,
        }
    }

    fn nao() -> SimulatedRobot {
        let mut robot = SimulatedRobot::new(endpoint());
        for service in LED_SERVICES {
            robot.open(*service).unwrap();
        }
        robot
    }

    #[test]
    fn eye_led_names() {
        assert_eq!(
            eye_leds("Left", [0, 90, 180, 270])[1],
            "Face/Led/Blue/Left/90Deg/Actuator/Value"
        );
    }

    #[test]
    fn head_follows_the_counter() {
        let mut robot = nao();
        let mut routine = LedRoutine::new(Duration::ZERO);
        routine.begin(&mut robot).unwrap();
        assert_eq!(robot.posture(), "Stand");
        assert_eq!(robot.color("EarLeds"), Some(BLUE));
        assert_eq!(robot.color("FaceLeds"), Some(YELLOW));

        for _ in 0..10 {
            routine.step(&mut robot).unwrap();
        }
        assert_eq!(robot.color("FaceLeds"), Some(RED));
        assert!((robot.joint("HeadYaw").unwrap() - FRAC_PI_2).abs() < 1e-6);
        assert_eq!(routine.phase(), "left");

        for _ in 0..10 {
            routine.step(&mut robot).unwrap();
        }
        assert_eq!(robot.color("FaceLeds"), Some(BLUE));
        assert!((robot.joint("HeadYaw").unwrap() + FRAC_PI_2).abs() < 1e-6);

        for _ in 0..10 {
            routine.step(&mut robot).unwrap();
        }
        assert_eq!(routine.counter(), 0);
        assert_eq!(robot.color("FaceLeds"), Some(YELLOW));
        assert_eq!(robot.joint("HeadYaw"), Some(0.0));
    }

    #[test]
    fn eye_groups_alternate() {
        let mut robot = nao();
        let mut routine = LedRoutine::new(Duration::ZERO);
        routine.step(&mut robot).unwrap();
        assert!(robot.is_lit("LGroup2"));
        assert!(robot.is_lit("RGroup2"));
        assert!(!robot.is_lit("LGroup1"));
        assert!(!robot.is_lit("RGroup1"));
    }

    #[test]
    fn runs_until_the_head_is_touched() {
        let mut robot = nao();
        let mut routine = LedRoutine::new(Duration::ZERO);
        routine.begin(&mut robot).unwrap();

        let mut steps = 0;
        while !routine.touched(&robot).unwrap() {
            routine.step(&mut robot).unwrap();
            steps += 1;
            if steps == 15 {
                press_front_button(&mut robot).unwrap();
            }
        }
        assert_eq!(steps, 15);

        let summary = routine.finish(&mut robot).unwrap();
        assert!(summary.contains("Stiffness: off"));
        assert_eq!(robot.color("FaceLeds"), Some(0));
        assert_eq!(robot.color("EarLeds"), Some(0));
        assert_eq!(robot.joint("HeadYaw"), Some(0.0));
    }

    #[test]
    fn hello_sets_volume_and_greets() {
        let mut robot = Robot::connect(Backend::Simulated, endpoint(), HELLO_SERVICES);
        assert!(hello(&mut robot));
        assert_eq!(robot.last_said(), Some(GREETING));

        let mut offline = Robot::connect(Backend::Offline, endpoint(), HELLO_SERVICES);
        assert!(!hello(&mut offline));
    }
}
