use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Sender};

use super::speech::{self, Segment};
use super::{
    Endpoint, MemoryValue, Proxy, RobotError, RobotLink, RobotResult, Service, Subscriber,
};

/// Joint limits in radians.
const JOINTS: &[(&str, f32, f32)] = &[
    ("HeadYaw", -2.0857, 2.0857),
    ("HeadPitch", -0.6720, 0.5149),
    ("LShoulderPitch", -2.0857, 2.0857),
    ("RShoulderPitch", -2.0857, 2.0857),
    ("LShoulderRoll", -0.3142, 1.3265),
    ("RShoulderRoll", -1.3265, 0.3142),
    ("LElbowRoll", -1.5446, -0.0349),
    ("RElbowRoll", 0.0349, 1.5446),
];

const BUILTIN_GROUPS: &[&str] = &["FaceLeds", "EarLeds", "ChestLeds", "FeetLeds", "AllLeds"];

const POSTURES: &[&str] = &["Stand", "StandInit", "StandZero", "Sit", "Crouch", "LyingBack"];

/// In-process stand-in for a NAO.
///
/// Keeps just enough state to make calls observable: LED colors, joint
/// angles, posture, volume, a memory store with subscribers, and what was
/// said.
pub struct SimulatedRobot {
    endpoint: Endpoint,
    hosted: HashSet<Service>,
    opened: HashSet<Service>,
    colors: HashMap<String, u32>,
    groups: HashMap<String, Vec<String>>,
    lit: HashMap<String, bool>,
    joints: HashMap<&'static str, f32>,
    posture: String,
    stiff: bool,
    volume: u32,
    memory: HashMap<String, MemoryValue>,
    subscribers: HashMap<String, Vec<Sender<MemoryValue>>>,
    spoken: Vec<String>,
}

impl SimulatedRobot {
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_services(endpoint, &Service::ALL)
    }

    /// A robot that only hosts `services`; opening anything else fails.
    pub fn with_services(endpoint: Endpoint, services: &[Service]) -> Self {
        Self {
            endpoint,
            hosted: services.iter().copied().collect(),
            opened: HashSet::new(),
            colors: HashMap::new(),
            groups: HashMap::new(),
            lit: HashMap::new(),
            joints: JOINTS.iter().map(|(name, _, _)| (*name, 0.0)).collect(),
            posture: "Crouch".to_string(),
            stiff: false,
            volume: 50,
            memory: HashMap::new(),
            subscribers: HashMap::new(),
            spoken: Vec::new(),
        }
    }

    pub fn spoken(&self) -> &[String] {
        &self.spoken
    }

    pub fn color(&self, group: &str) -> Option<u32> {
        self.colors.get(group).copied()
    }

    pub fn is_lit(&self, group: &str) -> bool {
        self.lit.get(group).copied().unwrap_or(false)
    }

    pub fn joint(&self, name: &str) -> Option<f32> {
        self.joints.get(name).copied()
    }

    pub fn posture(&self) -> &str {
        &self.posture
    }

    pub fn volume(&self) -> u32 {
        self.volume
    }

    fn require(&self, service: Service) -> RobotResult<()> {
        if self.opened.contains(&service) {
            Ok(())
        } else {
            Err(RobotError::NoProxy(service))
        }
    }

    fn known_group(&self, group: &str) -> bool {
        BUILTIN_GROUPS.contains(&group) || self.groups.contains_key(group)
    }

    fn set_joint(&mut self, name: &str, angle: f32) -> RobotResult<()> {
        let (joint, lo, hi) = JOINTS
            .iter()
            .find(|(n, _, _)| *n == name)
            .ok_or_else(|| RobotError::UnknownJoint(name.to_string()))?;
        self.joints.insert(*joint, angle.clamp(*lo, *hi));
        self.stiff = true;
        Ok(())
    }
}

impl RobotLink for SimulatedRobot {
    fn open(&mut self, service: Service) -> RobotResult<Proxy> {
        if !self.hosted.contains(&service) {
            return Err(RobotError::ServiceUnavailable {
                service,
                endpoint: self.endpoint.clone(),
            });
        }
        self.opened.insert(service);
        Ok(Proxy {
            service,
            endpoint: self.endpoint.clone(),
        })
    }

    fn say(&mut self, text: &str) -> RobotResult<()> {
        self.require(Service::TextToSpeech)?;
        tracing::info!(target: "nao::tts", "{text}");
        self.spoken.push(text.to_string());
        Ok(())
    }

    fn animated_say(&mut self, text: &str) -> RobotResult<()> {
        self.require(Service::AnimatedSpeech)?;
        let segments = speech::parse_markup(text);
        let style = segments.iter().find_map(|s| match s {
            Segment::Style(name) => Some(name.as_str()),
            _ => None,
        });
        tracing::info!(
            target: "nao::speech",
            style = style.unwrap_or("neutral"),
            pause_ms = speech::pause_ms(&segments),
            "{}",
            speech::plain_text(text)
        );
        self.spoken.push(speech::plain_text(text));
        Ok(())
    }

    fn fade_rgb(&mut self, group: &str, rgb: u32, duration: f32) -> RobotResult<()> {
        self.require(Service::Leds)?;
        if !self.known_group(group) {
            return Err(RobotError::UnknownLedGroup(group.to_string()));
        }
        tracing::debug!(target: "nao::leds", group, rgb = %format!("{rgb:06X}"), duration, "fade");
        self.colors.insert(group.to_string(), rgb & 0x00FF_FFFF);
        self.lit.insert(group.to_string(), rgb & 0x00FF_FFFF != 0);
        Ok(())
    }

    fn create_group(&mut self, name: &str, leds: &[&str]) -> RobotResult<()> {
        self.require(Service::Leds)?;
        if leds.is_empty() {
            return Err(RobotError::EmptyLedGroup(name.to_string()));
        }
        self.groups
            .insert(name.to_string(), leds.iter().map(|s| s.to_string()).collect());
        Ok(())
    }

    fn led_on(&mut self, group: &str) -> RobotResult<()> {
        self.require(Service::Leds)?;
        if !self.known_group(group) {
            return Err(RobotError::UnknownLedGroup(group.to_string()));
        }
        self.lit.insert(group.to_string(), true);
        Ok(())
    }

    fn led_off(&mut self, group: &str) -> RobotResult<()> {
        self.require(Service::Leds)?;
        if !self.known_group(group) {
            return Err(RobotError::UnknownLedGroup(group.to_string()));
        }
        self.lit.insert(group.to_string(), false);
        Ok(())
    }

    fn set_angles(&mut self, joints: &[&str], angles: &[f32], speed: f32) -> RobotResult<()> {
        self.require(Service::Motion)?;
        if joints.len() != angles.len() {
            return Err(RobotError::AngleMismatch {
                names: joints.len(),
                angles: angles.len(),
            });
        }
        tracing::debug!(target: "nao::motion", ?joints, ?angles, speed, "set angles");
        for (name, angle) in joints.iter().zip(angles) {
            self.set_joint(name, *angle)?;
        }
        Ok(())
    }

    fn angle_interpolation(
        &mut self,
        joint: &str,
        angle: f32,
        time: f32,
        absolute: bool,
    ) -> RobotResult<()> {
        self.require(Service::Motion)?;
        let goal = if absolute {
            angle
        } else {
            self.joint(joint)
                .ok_or_else(|| RobotError::UnknownJoint(joint.to_string()))?
                + angle
        };
        tracing::debug!(target: "nao::motion", joint, goal, time, "interpolate");
        self.set_joint(joint, goal)
    }

    fn angle_interpolation_with_speed(
        &mut self,
        joint: &str,
        angle: f32,
        speed: f32,
    ) -> RobotResult<()> {
        self.require(Service::Motion)?;
        tracing::debug!(target: "nao::motion", joint, angle, speed, "interpolate with speed");
        self.set_joint(joint, angle)
    }

    fn go_to_posture(&mut self, posture: &str, speed: f32) -> RobotResult<bool> {
        self.require(Service::RobotPosture)?;
        if !POSTURES.contains(&posture) {
            tracing::warn!(target: "nao::posture", posture, "unknown posture");
            return Ok(false);
        }
        tracing::debug!(target: "nao::posture", posture, speed, "go to posture");
        self.posture = posture.to_string();
        self.stiff = true;
        Ok(true)
    }

    fn rest(&mut self) -> RobotResult<()> {
        self.require(Service::Motion)?;
        self.posture = "Crouch".to_string();
        self.stiff = false;
        Ok(())
    }

    fn summary(&self) -> RobotResult<String> {
        self.require(Service::Motion)?;
        let mut names: Vec<_> = self.joints.keys().copied().collect();
        names.sort_unstable();
        let mut out = format!(
            "Posture: {}\nStiffness: {}\n",
            self.posture,
            if self.stiff { "on" } else { "off" }
        );
        for name in names {
            out.push_str(&format!("{:<16}{:>8.3}\n", name, self.joints[name]));
        }
        Ok(out)
    }

    fn get_data(&self, key: &str) -> RobotResult<MemoryValue> {
        self.require(Service::Memory)?;
        Ok(self.memory.get(key).cloned().unwrap_or(MemoryValue::Nil))
    }

    fn insert_data(&mut self, key: &str, value: MemoryValue) -> RobotResult<()> {
        self.require(Service::Memory)?;
        self.memory.insert(key.to_string(), value);
        Ok(())
    }

    fn raise_event(&mut self, key: &str, value: MemoryValue) -> RobotResult<()> {
        self.require(Service::Memory)?;
        tracing::debug!(target: "nao::memory", key, ?value, "raise event");
        self.memory.insert(key.to_string(), value.clone());
        if let Some(subs) = self.subscribers.get_mut(key) {
            subs.retain(|tx| tx.send(value.clone()).is_ok());
        }
        Ok(())
    }

    fn subscribe(&mut self, key: &str) -> RobotResult<Subscriber> {
        self.require(Service::Memory)?;
        let (tx, rx) = mpsc::channel();
        self.subscribers.entry(key.to_string()).or_default().push(tx);
        Ok(Subscriber::new(key, rx))
    }

    fn set_output_volume(&mut self, volume: u32) -> RobotResult<()> {
        self.require(Service::AudioDevice)?;
        if volume > 100 {
            return Err(RobotError::Volume(volume));
        }
        self.volume = volume;
        Ok(())
    }
}
