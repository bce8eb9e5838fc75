//! Scripted play-throughs with the simulated robot reacting.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use nao_showgame::audio::Audio;
use nao_showgame::game::{GameEvent, GameState, Input, Playfield, Variant};
use nao_showgame::reactions::{self, Reactions, CUE_FALL, CUE_LAND};
use nao_showgame::robot::{Backend, Endpoint, Robot};

const RIGHT: Input = Input {
    left: false,
    right: true,
    jump: false,
};

const IDLE: Input = Input {
    left: false,
    right: false,
    jump: false,
};

struct Show {
    state: GameState,
    reactions: Reactions,
    rng: StdRng,
    events: Vec<GameEvent>,
}

impl Show {
    fn new(variant: Variant, backend: Backend) -> Self {
        let mut rng = StdRng::seed_from_u64(42);
        let robot = Robot::connect(
            backend,
            Endpoint {
                host: "192.168.13.188".into(),
                port: 9559,
            },
            reactions::services(variant),
        );
        let reactions = Reactions::new(variant, robot, Audio::silent())
            .with_clap_pause(Duration::ZERO);
        let state = GameState::new(variant, Playfield::default(), &mut rng);
        Self {
            state,
            reactions,
            rng,
            events: Vec::new(),
        }
    }

    /// Runs frames with `input` until `stop` matches an event or `frames` run out.
    fn run(&mut self, input: Input, frames: usize, stop: impl Fn(&GameEvent) -> bool) -> bool {
        for _ in 0..frames {
            let events = self.state.update(input, &mut self.rng);
            let done = events.iter().any(&stop);
            for event in events {
                self.reactions.on_event(event);
                self.events.push(event);
            }
            self.reactions.poll();
            if done {
                return true;
            }
        }
        false
    }
}

#[test]
fn arena_enemy_contact_hurts() {
    let mut show = Show::new(Variant::Arena, Backend::Simulated);

    assert!(show.run(IDLE, 60, |e| *e == GameEvent::Landed));
    assert_eq!(
        show.reactions.robot().last_said(),
        Some("Geschafft! Gut gelandet!")
    );

    assert!(show.run(RIGHT, 300, |e| *e == GameEvent::HitEnemy));
    assert_eq!((show.state.player.rect.x, show.state.player.rect.y), (100, 400));
    // The fall reaction raised the event; its subscriber spoke last.
    assert_eq!(
        show.reactions.robot().last_said(),
        Some("Oh nein, das tat weh!")
    );
    assert!(show.reactions.audio().played().iter().any(|c| c == CUE_FALL));
}

#[test]
fn offline_robot_still_gets_sounds() {
    let mut show = Show::new(Variant::Arena, Backend::Offline);
    assert!(!show.reactions.robot().is_connected());

    assert!(show.run(IDLE, 60, |e| *e == GameEvent::Landed));
    assert_eq!(show.reactions.audio().played(), [CUE_LAND]);
    assert_eq!(show.reactions.robot().last_said(), None);
}

#[test]
fn levels_walk_through_both_levels() {
    let mut show = Show::new(Variant::Levels, Backend::Simulated);

    assert!(show.run(RIGHT, 400, |e| matches!(e, GameEvent::LevelAdvanced(_))));
    assert_eq!(show.state.level, 1);
    assert_eq!(show.state.player.rect.x, 50);
    assert_eq!(
        show.reactions.robot().last_said(),
        Some("Super gemacht! Bravo!")
    );

    assert!(show.run(RIGHT, 400, |e| *e == GameEvent::AllLevelsDone));
    assert!(show.state.game_over);
    assert_eq!(
        show.reactions.robot().last_said(),
        Some("Herzlichen Glückwunsch, alle Level geschafft!")
    );
}

#[test]
fn scroller_appends_chunks_and_catches_falls() {
    let mut show = Show::new(Variant::Scroller, Backend::Simulated);
    assert_eq!(show.state.platforms.len(), 10);

    // Far enough that the next chunk must be appended, above every block.
    show.state.player.rect.x = 1750;
    show.state.player.rect.y = 0;
    assert!(show.run(IDLE, 1, |e| matches!(
        e,
        GameEvent::ChunkAppended { start_x: 2500 }
    )));
    assert!(show.events.contains(&GameEvent::LevelDone));
    assert_eq!(show.state.level_end_x, 5000);
    assert_eq!(show.state.platforms.len(), 20);
    assert_eq!(show.state.scroll_x, 1350);
    assert_eq!(show.reactions.robot().last_said(), Some("Bravo!"));
    assert!(show
        .reactions
        .audio()
        .played()
        .iter()
        .any(|c| c == reactions::CUE_APPLAUSE));

    show.state.player.rect.y = 700;
    assert!(show.run(IDLE, 1, |e| *e == GameEvent::FellOut));
    assert_eq!(show.state.player.rect.x, 1450);
    assert_eq!(show.state.player.rect.y, 100);
    assert_eq!(
        show.reactions.robot().last_said(),
        Some("Aaaah, ich falle!")
    );
}

#[test]
fn scroller_reacts_once_per_fall() {
    let mut show = Show::new(Variant::Scroller, Backend::Simulated);
    show.state.platforms.clear();
    show.state.enemies.clear();
    show.state.player.rect.y = 0;

    // High enough that `Falling` fires long before the drop out of the field.
    assert!(show.run(IDLE, 40, |e| *e == GameEvent::Falling));
    let respawn_y = show.state.field.height / 6;
    let mut frames = 0;
    while !(show.state.player.rect.y == respawn_y && show.state.player.vel_y == 0) {
        assert!(frames < 100, "player never respawned");
        show.run(IDLE, 1, |_| false);
        frames += 1;
    }

    assert!(!show.events.contains(&GameEvent::FellOut));
    let fall_cues = show
        .reactions
        .audio()
        .played()
        .iter()
        .filter(|c| c.as_str() == CUE_FALL)
        .count();
    assert_eq!(fall_cues, 1);
}

#[test]
fn classic_never_finishes() {
    let mut show = Show::new(Variant::Classic, Backend::Simulated);
    assert!(!show.run(RIGHT, 400, |e| matches!(
        e,
        GameEvent::LevelDone | GameEvent::LevelAdvanced(_) | GameEvent::AllLevelsDone
    )));
    assert!(!show.state.game_over);
    // Classic has no clamp; the player walks off the right edge.
    assert!(show.state.player.rect.x > show.state.field.width);
}
