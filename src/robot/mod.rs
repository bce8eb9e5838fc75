//! Robot proxies.
//!
//! A [`Robot`] is opened once at startup. When any proxy fails to open the
//! handle stays disconnected for the rest of the run and every call through
//! [`Robot::with`] becomes a no-op.

mod simulated;
pub mod speech;

use std::fmt;
use std::sync::mpsc::Receiver;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use simulated::SimulatedRobot;

/// Remote subsystems a demo can ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Service {
    TextToSpeech,
    AnimatedSpeech,
    Leds,
    Motion,
    RobotPosture,
    Memory,
    AudioPlayer,
    AudioDevice,
    BehaviorManager,
    System,
}

impl Service {
    pub const ALL: [Service; 10] = [
        Service::TextToSpeech,
        Service::AnimatedSpeech,
        Service::Leds,
        Service::Motion,
        Service::RobotPosture,
        Service::Memory,
        Service::AudioPlayer,
        Service::AudioDevice,
        Service::BehaviorManager,
        Service::System,
    ];

    pub fn module_name(self) -> &'static str {
        match self {
            Service::TextToSpeech => "ALTextToSpeech",
            Service::AnimatedSpeech => "ALAnimatedSpeech",
            Service::Leds => "ALLeds",
            Service::Motion => "ALMotion",
            Service::RobotPosture => "ALRobotPosture",
            Service::Memory => "ALMemory",
            Service::AudioPlayer => "ALAudioPlayer",
            Service::AudioDevice => "ALAudioDevice",
            Service::BehaviorManager => "ALBehaviorManager",
            Service::System => "ALSystem",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.module_name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A client handle for one remote subsystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proxy {
    pub service: Service,
    pub endpoint: Endpoint,
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.service, self.endpoint)
    }
}

#[derive(Debug, Error)]
pub enum RobotError {
    #[error("robot at {0} is unreachable")]
    Unreachable(Endpoint),
    #[error("invalid robot endpoint {0}")]
    InvalidEndpoint(Endpoint),
    #[error("{service} is not available at {endpoint}")]
    ServiceUnavailable { service: Service, endpoint: Endpoint },
    #[error("no proxy to {0} was opened")]
    NoProxy(Service),
    #[error("unknown joint {0}")]
    UnknownJoint(String),
    #[error("{names} joint names but {angles} angles")]
    AngleMismatch { names: usize, angles: usize },
    #[error("unknown LED group {0}")]
    UnknownLedGroup(String),
    #[error("LED group {0} has no members")]
    EmptyLedGroup(String),
    #[error("volume {0} is outside 0..=100")]
    Volume(u32),
}

pub type RobotResult<T> = Result<T, RobotError>;

/// A value stored in the robot's memory.
#[derive(Clone, Debug, PartialEq)]
pub enum MemoryValue {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl MemoryValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            MemoryValue::Nil => false,
            MemoryValue::Bool(b) => *b,
            MemoryValue::Int(i) => *i != 0,
            MemoryValue::Float(f) => *f != 0.0,
            MemoryValue::Text(s) => !s.is_empty(),
        }
    }
}

/// Receives every value raised on one memory key.
pub struct Subscriber {
    key: String,
    rx: Receiver<MemoryValue>,
}

impl Subscriber {
    pub fn new(key: impl Into<String>, rx: Receiver<MemoryValue>) -> Self {
        Self {
            key: key.into(),
            rx,
        }
    }

    /// Pending signal values, oldest first.
    pub fn drain(&self) -> Vec<MemoryValue> {
        let values: Vec<MemoryValue> = self.rx.try_iter().collect();
        if !values.is_empty() {
            tracing::debug!(target: "nao::memory", key = %self.key, count = values.len(), "signals");
        }
        values
    }
}

/// Blocking calls against the robot's subsystems.
pub trait RobotLink {
    /// Opens a proxy to `service`.
    fn open(&mut self, service: Service) -> RobotResult<Proxy>;

    fn say(&mut self, text: &str) -> RobotResult<()>;
    /// Speaks text that may carry `\style=..\` and `\pau=..\` tags.
    fn animated_say(&mut self, text: &str) -> RobotResult<()>;

    fn fade_rgb(&mut self, group: &str, rgb: u32, duration: f32) -> RobotResult<()>;
    fn create_group(&mut self, name: &str, leds: &[&str]) -> RobotResult<()>;
    fn led_on(&mut self, group: &str) -> RobotResult<()>;
    fn led_off(&mut self, group: &str) -> RobotResult<()>;

    fn set_angles(&mut self, joints: &[&str], angles: &[f32], speed: f32) -> RobotResult<()>;
    fn angle_interpolation(
        &mut self,
        joint: &str,
        angle: f32,
        time: f32,
        absolute: bool,
    ) -> RobotResult<()>;
    fn angle_interpolation_with_speed(&mut self, joint: &str, angle: f32, speed: f32)
        -> RobotResult<()>;
    fn go_to_posture(&mut self, posture: &str, speed: f32) -> RobotResult<bool>;
    fn rest(&mut self) -> RobotResult<()>;
    fn summary(&self) -> RobotResult<String>;

    fn get_data(&self, key: &str) -> RobotResult<MemoryValue>;
    fn insert_data(&mut self, key: &str, value: MemoryValue) -> RobotResult<()>;
    fn raise_event(&mut self, key: &str, value: MemoryValue) -> RobotResult<()>;
    fn subscribe(&mut self, key: &str) -> RobotResult<Subscriber>;

    fn set_output_volume(&mut self, volume: u32) -> RobotResult<()>;
}

/// Which implementation stands behind the proxies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process robot model; every call is logged.
    #[default]
    Simulated,
    /// No robot at all; connecting always fails.
    Offline,
}

/// Connection to the robot, decided once at startup.
pub struct Robot {
    endpoint: Endpoint,
    link: Option<Box<dyn RobotLink>>,
    last_said: Option<String>,
}

impl Robot {
    /// Opens proxies to `services` on the configured backend.
    ///
    /// Failure is logged and yields a disconnected robot.
    pub fn connect(backend: Backend, endpoint: Endpoint, services: &[Service]) -> Self {
        let link: RobotResult<Box<dyn RobotLink>> = match backend {
            Backend::Simulated => Ok(Box::new(SimulatedRobot::new(endpoint.clone()))),
            Backend::Offline => Err(RobotError::Unreachable(endpoint.clone())),
        };
        Self::open_all(endpoint, link, services)
    }

    /// Like [`Robot::connect`] with a caller-provided link.
    pub fn open_all(
        endpoint: Endpoint,
        link: RobotResult<Box<dyn RobotLink>>,
        services: &[Service],
    ) -> Self {
        let opened = link.and_then(|mut link| {
            if endpoint.host.is_empty() || endpoint.port == 0 {
                return Err(RobotError::InvalidEndpoint(endpoint.clone()));
            }
            for service in services {
                let proxy = link.open(*service)?;
                tracing::debug!(%proxy, "proxy opened");
            }
            Ok(link)
        });

        match opened {
            Ok(link) => {
                tracing::info!(%endpoint, "NAO connected");
                Self {
                    endpoint,
                    link: Some(link),
                    last_said: None,
                }
            }
            Err(e) => {
                tracing::warn!(%endpoint, error = %e, "NAO not connected");
                Self::disconnected(endpoint)
            }
        }
    }

    pub fn disconnected(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            link: None,
            last_said: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Runs `f` against the link when connected; errors are logged, not raised.
    pub fn with<T>(
        &mut self,
        f: impl FnOnce(&mut dyn RobotLink) -> RobotResult<T>,
    ) -> Option<T> {
        let link = self.link.as_deref_mut()?;
        match f(link) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(error = %e, "robot call failed");
                None
            }
        }
    }

    /// Animated speech, remembered for the status line.
    pub fn say(&mut self, text: &str) {
        if self.with(|link| link.animated_say(text)).is_some() {
            self.last_said = Some(speech::plain_text(text));
        }
    }

    /// Plain text-to-speech, remembered for the status line.
    pub fn tts(&mut self, text: &str) {
        if self.with(|link| link.say(text)).is_some() {
            self.last_said = Some(text.to_string());
        }
    }

    pub fn last_said(&self) -> Option<&str> {
        self.last_said.as_deref()
    }
}
