/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use config::GameConfig;
use domain::catalog::Room;
use sim::catalog::load_catalog;
use sim::event::GameEvent;
use sim::save::{self, FileStorage, Storage};
use sim::session::{GameSession, Phase};
use sim::step;
use ui::input::{Action, InputState};
use ui::renderer::{Renderer, View};
use ui::sound::{self, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(16);

#[derive(Parser)]
#[command(name = "escapeword")]
#[command(about = "Escape-room word puzzles in the terminal")]
#[command(version)]
struct Cli {
    /// Configuration file (default: search exe dir, CWD, ~/.local/share/escapeword)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of extra room files
    #[arg(long)]
    rooms: Option<PathBuf>,

    /// Delete saved progress and exit
    #[arg(long)]
    reset: bool,

    /// Verbose logging (-v, -vv for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = GameConfig::load(cli.config.as_deref());
    if let Some(dir) = cli.rooms {
        config.rooms_dir = dir;
    }
    let save_dir = config.save_dir.clone().unwrap_or_else(save::default_save_dir);
    init_logging(&save_dir, cli.verbose);

    let mut store = FileStorage::new(&save_dir);
    if cli.reset {
        save::clear_saved(&mut store)
            .with_context(|| format!("could not clear saved progress in {}", save_dir.display()))?;
        println!("Saved progress cleared.");
        return Ok(());
    }

    let rooms = load_catalog(&config.rooms_dir);
    if rooms.is_empty() {
        anyhow::bail!("no playable rooms found");
    }
    log::info!("{} rooms loaded, saving to {}", rooms.len(), store.dir().display());

    let mut session = GameSession::new(config.rules);
    save::restore_snapshot(&mut session, &save::load_snapshot(&store));

    let sound = if config.sound_enabled { SoundEngine::new() } else { None };

    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;

    let result = game_loop(&mut session, &rooms, &mut store, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    result?;

    println!();
    println!("Thanks for playing EscapeWord!");
    println!("Final score: {}", session.score);
    Ok(())
}

/// Log to `escapeword.log` in the save directory; stderr if it cannot be opened.
/// `RUST_LOG` overrides the verbosity flag.
fn init_logging(dir: &Path, verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).parse_default_env();

    let file = std::fs::create_dir_all(dir).and_then(|_| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("escapeword.log"))
    });
    match file {
        Ok(f) => builder.target(env_logger::Target::Pipe(Box::new(f))),
        Err(_) => builder.target(env_logger::Target::Stderr),
    };
    let _ = builder.try_init();
}

// ══════════════════════════════════════════════════════════════
// Loop
// ══════════════════════════════════════════════════════════════

/// Menu cursor and status line; everything else lives in the session.
struct Screen {
    cursor: usize,
    message: String,
}

#[derive(PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

fn game_loop(
    session: &mut GameSession,
    rooms: &[Room],
    store: &mut dyn Storage,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<()> {
    let mut input = InputState::new();
    let mut screen = Screen { cursor: 0, message: String::new() };

    let tick_every = Duration::from_millis(config.timing.tick_ms);
    let check_every = Duration::from_millis(config.timing.expiry_check_ms);
    let mut last_tick = Instant::now();
    let mut last_check = Instant::now();

    loop {
        input.set_text_mode(session.phase == Phase::Playing);
        for action in input.drain_events() {
            let events = match handle_action(session, rooms, &mut screen, action) {
                (Flow::Quit, _) => return Ok(()),
                (Flow::Continue, events) => events,
            };
            dispatch(&events, &mut screen, sound);
            persist(store, session);
            if session.phase == Phase::Playing && events.iter().any(|e| matches!(e, GameEvent::RoomSelected { .. })) {
                last_tick = Instant::now();
                last_check = Instant::now();
            }
        }

        if session.phase == Phase::Playing {
            let mut events = Vec::new();
            if last_tick.elapsed() >= tick_every {
                last_tick += tick_every;
                events.extend(step::tick(session));
            }
            if last_check.elapsed() >= check_every {
                last_check += check_every;
                events.extend(step::expire_power_ups(session));
            }
            if !events.is_empty() {
                dispatch(&events, &mut screen, sound);
                persist(store, session);
            }
        }

        renderer.render(&View {
            session,
            rooms,
            cursor: screen.cursor,
            answer: input.line.as_str(),
            message: &screen.message,
        })?;

        std::thread::sleep(FRAME_SLEEP);
    }
}

fn handle_action(
    session: &mut GameSession,
    rooms: &[Room],
    screen: &mut Screen,
    action: Action,
) -> (Flow, Vec<GameEvent>) {
    if action == Action::Quit {
        return (Flow::Quit, vec![]);
    }

    let events = match session.phase {
        Phase::Menu => match action {
            Action::Up => {
                screen.cursor = screen.cursor.saturating_sub(1);
                vec![]
            }
            Action::Down => {
                screen.cursor = (screen.cursor + 1).min(rooms.len().saturating_sub(1));
                vec![]
            }
            Action::Submit(_) => match rooms.get(screen.cursor) {
                Some(room) => step::select_room(session, room),
                None => vec![],
            },
            Action::Key(c) if c.is_ascii_digit() => {
                let pick = c.to_digit(10).map_or(0, |d| d as usize);
                match pick.checked_sub(1).and_then(|i| rooms.get(i).map(|r| (i, r))) {
                    Some((i, room)) => {
                        screen.cursor = i;
                        step::select_room(session, room)
                    }
                    None => vec![],
                }
            }
            Action::Key('r' | 'R') => {
                screen.message = "Score reset.".into();
                step::reset_game(session)
            }
            Action::Key('q' | 'Q') => return (Flow::Quit, vec![]),
            _ => vec![],
        },

        Phase::Playing | Phase::Paused => {
            let idx = session.puzzle_index;
            match action {
                Action::Submit(text) if !text.trim().is_empty() => step::submit_answer(session, idx, &text),
                Action::Hint => {
                    let events = step::use_hint(session, idx);
                    if events.is_empty() {
                        screen.message = if session.hints == 0 {
                            "No hints left.".into()
                        } else {
                            "Every hint for this puzzle is showing.".into()
                        };
                    }
                    events
                }
                Action::Skip => {
                    let events = step::skip_puzzle(session, idx);
                    if events.is_empty() {
                        screen.message = "Activate Skip Puzzle first.".into();
                    }
                    events
                }
                Action::PowerUp(i) => {
                    let template = session.room.as_ref().and_then(|r| r.power_ups.get(i)).cloned();
                    match template {
                        Some(t) => step::activate_power_up(session, &t),
                        None => vec![],
                    }
                }
                Action::Back => {
                    screen.message = "Attempt abandoned.".into();
                    step::return_to_menu(session)
                }
                _ => vec![],
            }
        }

        Phase::Completed => match action {
            Action::Submit(_) | Action::Back => {
                screen.message.clear();
                step::return_to_menu(session)
            }
            _ => vec![],
        },
    };
    (Flow::Continue, events)
}

fn dispatch(events: &[GameEvent], screen: &mut Screen, sound: Option<&SoundEngine>) {
    sound::play_events(sound, events);
    if let Some(line) = status_line(events) {
        screen.message = line;
    }
}

/// Persistence failures never interrupt play.
fn persist(store: &mut dyn Storage, session: &GameSession) {
    if let Err(e) = save::save_session(store, session) {
        log::warn!("could not save progress: {e}");
    }
}

fn describe(event: &GameEvent) -> String {
    match event {
        GameEvent::RoomSelected { .. } => "The door locks behind you. Good luck!".to_string(),
        GameEvent::CorrectAnswer { points, .. } => format!("Correct! +{points}"),
        GameEvent::WrongAnswer { penalty, .. } => format!("Wrong answer, -{penalty}"),
        GameEvent::HintRevealed { penalty, .. } => format!("Hint revealed, -{penalty}"),
        GameEvent::PuzzleSkipped { .. } => "Puzzle skipped.".to_string(),
        GameEvent::PowerUpActivated { kind } => format!("{} activated", kind.label()),
        GameEvent::PowerUpExpired { kind } => format!("{} wore off", kind.label()),
        GameEvent::AchievementUnlocked { name, reward, .. } => format!("Achievement: {name} +{reward}"),
        GameEvent::RoomCompleted { escaped: true, bonus, .. } => format!("Escaped! Bonus +{bonus}"),
        GameEvent::RoomCompleted { escaped: false, .. } => "Out, but with skipped puzzles: no bonus.".to_string(),
        GameEvent::TimeUp => "Time's up!".to_string(),
    }
}

fn status_line(events: &[GameEvent]) -> Option<String> {
    let parts: Vec<String> = events.iter().map(describe).collect();
    if parts.is_empty() { None } else { Some(parts.join("   ")) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::sim::catalog::builtin_rooms;

    fn screen() -> Screen {
        Screen { cursor: 0, message: String::new() }
    }

    #[test]
    fn menu_digit_selects_room() {
        let rooms = builtin_rooms();
        let mut s = GameSession::new(RulesConfig::default());
        let mut sc = screen();
        let (_, events) = handle_action(&mut s, &rooms, &mut sc, Action::Key('2'));
        assert_eq!(events[0], GameEvent::RoomSelected { room_id: "space".into() });
        assert_eq!(sc.cursor, 1);
        assert_eq!(s.phase, Phase::Playing);
    }

    #[test]
    fn playing_actions_route_to_operations() {
        let rooms = builtin_rooms();
        let mut s = GameSession::new(RulesConfig::default());
        let mut sc = screen();
        handle_action(&mut s, &rooms, &mut sc, Action::Submit(String::new()));
        assert_eq!(s.room.as_ref().map(|r| r.id.as_str()), Some("egypt"));

        // blank answers are ignored
        let (_, events) = handle_action(&mut s, &rooms, &mut sc, Action::Submit("  ".into()));
        assert!(events.is_empty());

        let (_, events) = handle_action(&mut s, &rooms, &mut sc, Action::Submit(" pharaoh ".into()));
        assert!(matches!(events[0], GameEvent::CorrectAnswer { points: 100, .. }));
        assert_eq!(s.puzzle_index, 1);

        let (_, events) = handle_action(&mut s, &rooms, &mut sc, Action::Skip);
        assert!(events.is_empty());
        assert_eq!(sc.message, "Activate Skip Puzzle first.");

        let (flow, _) = handle_action(&mut s, &rooms, &mut sc, Action::Back);
        assert!(flow == Flow::Continue);
        assert_eq!(s.phase, Phase::Menu);
        assert!(s.room.is_none());
    }

    #[test]
    fn quit_from_any_phase() {
        let rooms = builtin_rooms();
        let mut s = GameSession::new(RulesConfig::default());
        let (flow, _) = handle_action(&mut s, &rooms, &mut screen(), Action::Quit);
        assert!(flow == Flow::Quit);
        let (flow, _) = handle_action(&mut s, &rooms, &mut screen(), Action::Key('q'));
        assert!(flow == Flow::Quit);
    }

    #[test]
    fn status_line_joins_events() {
        let line = status_line(&[
            GameEvent::CorrectAnswer { puzzle_id: "p".into(), points: 150 },
            GameEvent::AchievementUnlocked { id: "a".into(), name: "Scribe".into(), reward: 50 },
        ]);
        assert_eq!(line.as_deref(), Some("Correct! +150   Achievement: Scribe +50"));
        assert_eq!(status_line(&[]), None);
    }

    #[test]
    fn persisted_after_actions() {
        let mut store = save::MemoryStorage::default();
        let mut s = GameSession::new(RulesConfig::default());
        s.score = 75;
        persist(&mut store, &s);
        assert_eq!(save::load_snapshot(&store).score, 75);
    }
}
