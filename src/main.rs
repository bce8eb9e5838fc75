use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use crossterm::event::KeyCode;

use nao_showgame::audio::{Audio, SoundBank};
use nao_showgame::config::{self, Config};
use nao_showgame::demos::{self, LedRoutine};
use nao_showgame::game::{GameState, Variant};
use nao_showgame::input::Keyboard;
use nao_showgame::logger;
use nao_showgame::menu::{Choice, KeyMenu, SelectMenu};
use nao_showgame::reactions::{self, Reactions, GAME_CUES};
use nao_showgame::render::{self, Canvas, TerminalSession};
use nao_showgame::robot::{Robot, Service};
use nao_showgame::toy::{self, Toy};

#[derive(Parser)]
#[command(name = "nao-showgame", version, about = "NAO robot show demos")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play the platformer with the robot reacting to the game
    Play {
        #[arg(value_enum, default_value_t = Variant::Arena)]
        variant: Variant,
    },
    /// LED and head test; touch the front of the head (or press T) to stop
    Leds,
    /// Turn up the volume and greet the audience
    Hello,
    /// Insects and a light spot, with sound
    Toy,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, source) = config::load(cli.config.as_deref())?;
    logger::init(&config.log)?;
    if let config::Source::Missing(path) = &source {
        tracing::warn!(path = %path.display(), "config file not found, using defaults");
    }
    tracing::info!(command = ?cli.command, robot = %config.robot.endpoint(), "starting");

    match cli.command {
        Command::Play { variant } => play(&config, variant),
        Command::Leds => leds(&config),
        Command::Hello => hello(&config),
        Command::Toy => run_toy(&config),
    }
}

fn connect(config: &Config, services: &[Service]) -> Robot {
    Robot::connect(config.robot.backend, config.robot.endpoint(), services)
}

/// Loads each cue's files from the sounds directory and opens the output.
fn open_audio<'a>(
    config: &Config,
    cues: impl IntoIterator<Item = (&'a str, Vec<String>)>,
) -> Audio {
    let mut bank = SoundBank::new();
    for (cue, files) in cues {
        let paths: Vec<PathBuf> = files
            .iter()
            .map(|file| config.assets.sounds.join(file))
            .collect();
        let loaded = bank.load_cue(cue, &paths);
        tracing::debug!(cue, loaded, "sound cue");
    }
    Audio::open(bank, config.audio.volume, config.audio.enabled)
}

fn tick_rate(config: &Config) -> Duration {
    Duration::from_secs(1) / config.display.fps
}

fn wait_for_tick(start_time: Instant, tick_rate: Duration) {
    let elapsed = start_time.elapsed();
    if let Some(time_to_wait) = tick_rate.checked_sub(elapsed) {
        thread::sleep(time_to_wait);
    }
}

fn play(config: &Config, variant: Variant) -> anyhow::Result<()> {
    let mut rng = rand::thread_rng();
    let robot = connect(config, reactions::services(variant));
    let audio = open_audio(
        config,
        GAME_CUES.iter().map(|cue| (*cue, vec![format!("{cue}.wav")])),
    );
    let mut reactions = Reactions::new(variant, robot, audio);

    let field = config.display.playfield();
    let mut session = TerminalSession::enter().context("cannot set up the terminal")?;
    let mut keyboard = Keyboard::new(session.release_events());
    let mut canvas = Canvas::for_field(field.width, field.height);
    let tick_rate = tick_rate(config);

    if variant.has_menu() {
        match run_menu(variant, &mut session, &mut keyboard, &mut canvas, tick_rate)? {
            Some(Choice::Start) => reactions.start(),
            Some(Choice::Quit) => {
                reactions.farewell();
                return Ok(());
            }
            None => return Ok(()),
        }
    }

    let mut state = GameState::new(variant, field, &mut rng);
    tracing::info!(?variant, connected = reactions.robot().is_connected(), "game started");

    while !state.game_over {
        let start_time = Instant::now();

        // --- INPUT ---
        for key in keyboard.poll()? {
            match (variant, key) {
                (Variant::Arena, KeyCode::Char('c')) => reactions.cheer(),
                (Variant::Arena, KeyCode::Char('b')) => reactions.boo(),
                (Variant::Scroller, KeyCode::Char('p')) => reactions.applaud(),
                (Variant::Scroller, KeyCode::Char('f')) => reactions.fall(),
                _ => {}
            }
        }
        if keyboard.quit_requested() {
            reactions.goodbye();
            break;
        }

        // --- UPDATE ---
        for event in state.update(keyboard.game_input(), &mut rng) {
            reactions.on_event(event);
        }
        reactions.poll();
        reactions.audio_mut().pump();

        // --- DRAW ---
        let robot = reactions.robot();
        render::draw_game(&mut canvas, &state, robot.is_connected(), robot.last_said());
        session.present(&canvas)?;

        wait_for_tick(start_time, tick_rate);
    }

    tracing::info!(level = state.level, "game ended");
    Ok(())
}

/// Shows the variant's start screen until a choice is made; `None` when the
/// terminal was closed instead.
fn run_menu(
    variant: Variant,
    session: &mut TerminalSession,
    keyboard: &mut Keyboard,
    canvas: &mut Canvas,
    tick_rate: Duration,
) -> anyhow::Result<Option<Choice>> {
    let mut select = SelectMenu::new();
    let keys = KeyMenu;
    loop {
        let start_time = Instant::now();
        for key in keyboard.poll()? {
            let choice = if variant == Variant::Scroller {
                keys.press(key)
            } else {
                select.press(key)
            };
            if choice.is_some() {
                tracing::info!(?choice, "menu");
                return Ok(choice);
            }
        }
        if keyboard.quit_requested() {
            return Ok(None);
        }

        if variant == Variant::Scroller {
            render::draw_key_menu(canvas, KeyMenu::TITLE, KeyMenu::KEYS);
        } else {
            render::draw_select_menu(
                canvas,
                SelectMenu::TITLE,
                &SelectMenu::OPTIONS,
                select.selected(),
            );
        }
        session.present(canvas)?;
        wait_for_tick(start_time, tick_rate);
    }
}

fn leds(config: &Config) -> anyhow::Result<()> {
    let mut robot = connect(config, demos::LED_SERVICES);
    if !robot.is_connected() {
        bail!("NAO at {} is not reachable", robot.endpoint());
    }

    let field = config.display.playfield();
    let mut routine = LedRoutine::default();
    robot
        .with(|link| routine.begin(link))
        .context("cannot prepare the robot")?;

    let summary = {
        let mut session = TerminalSession::enter().context("cannot set up the terminal")?;
        let mut keyboard = Keyboard::new(session.release_events());
        let mut canvas = Canvas::for_field(field.width, field.height);

        loop {
            for key in keyboard.poll()? {
                if key == KeyCode::Char('t') {
                    robot.with(demos::press_front_button);
                }
            }
            let touched = robot
                .with(|link| routine.touched(link))
                .context("cannot read the head sensor")?;
            if touched || keyboard.quit_requested() {
                break;
            }
            robot
                .with(|link| routine.step(link))
                .context("LED routine failed")?;

            render::draw_leds(&mut canvas, routine.counter(), routine.phase(), robot.last_said());
            session.present(&canvas)?;
        }

        robot
            .with(|link| routine.finish(link))
            .context("cannot put the robot to rest")?
    };

    tracing::info!("LED test finished");
    println!("{summary}");
    Ok(())
}

fn hello(config: &Config) -> anyhow::Result<()> {
    let mut robot = connect(config, demos::HELLO_SERVICES);
    if !demos::hello(&mut robot) {
        bail!("NAO at {} is not reachable", robot.endpoint());
    }
    println!("NAO: {}", demos::GREETING);
    Ok(())
}

fn run_toy(config: &Config) -> anyhow::Result<()> {
    let mut rng = rand::thread_rng();
    let mut audio = open_audio(
        config,
        toy::CUES
            .iter()
            .map(|(cue, files)| (*cue, files.iter().map(|f| f.to_string()).collect())),
    );

    let field = config.display.playfield();
    let mut session = TerminalSession::enter().context("cannot set up the terminal")?;
    let mut keyboard = Keyboard::new(session.release_events());
    let mut canvas = Canvas::for_field(field.width, field.height);
    let tick_rate = tick_rate(config);
    let mut toy = Toy::new(field, &mut rng);

    loop {
        let start_time = Instant::now();
        keyboard.poll()?;
        if keyboard.quit_requested() {
            break;
        }

        for cue in toy.update(&mut rng) {
            audio.play_random(cue, &mut rng);
        }
        audio.pump();

        render::draw_toy(&mut canvas, &toy);
        session.present(&canvas)?;
        wait_for_tick(start_time, tick_rate);
    }
    Ok(())
}
