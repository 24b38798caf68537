/// Terminal renderer: menu, playing and completed screens.
///
/// Frames are composed into an off-screen grid of cells, compared with the
/// previous frame, and only changed cells are written. Everything is queued
/// and flushed once per frame.
///
/// All glyphs used are single-column; one cell = one terminal column.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::catalog::{PowerUpTemplate, Room};
use crate::domain::scoring;
use crate::domain::timer::Urgency;
use crate::sim::session::{GameSession, Outcome, Phase};

const BG: Color = Color::Rgb { r: 18, g: 18, b: 28 };
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 60 };
const GREEN: Color = Color::Rgb { r: 90, g: 230, b: 120 };
const RED: Color = Color::Rgb { r: 255, g: 80, b: 80 };
const AMBER: Color = Color::Rgb { r: 255, g: 170, b: 40 };
const CYAN: Color = Color::Rgb { r: 110, g: 200, b: 255 };
const DIM: Color = Color::DarkGrey;
const TEXT: Color = Color::White;
const BAR_BG: Color = Color::Rgb { r: 200, g: 180, b: 60 };
const CURSOR_BG: Color = Color::Rgb { r: 30, g: 55, b: 40 };

const BADGES: [&str; 3] = ["Rising Star (500 pts)", "Explorer (3 rooms)", "Master (1000 pts)"];

/// Everything one frame needs.
pub struct View<'a> {
    pub session: &'a GameSession,
    pub rooms: &'a [Room],
    /// Highlighted room on the menu.
    pub cursor: usize,
    pub answer: &'a str,
    /// Bottom status bar; empty = hidden.
    pub message: &'a str,
}

// ── Cell / FrameBuffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: TEXT, bg: BG };
    /// Never equal to a drawn cell; forces a repaint.
    const STALE: Cell = Cell { ch: '\0', fg: Color::Magenta, bg: Color::Magenta };
}

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new() -> Self {
        FrameBuffer { width: 0, height: 0, cells: vec![] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.width = w;
        self.height = h;
        self.cells = vec![Cell::BLANK; w * h];
    }

    fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        self.cells[y * self.width + x]
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    /// Write `s` from (x, y); clipped at the right edge.
    fn put(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Cell { ch, fg, bg });
        }
    }

    fn text(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        self.put(x, y, s, fg, BG);
    }

    fn bar(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell { ch: ' ', fg, bg });
        }
        self.put(0, y, s, fg, bg);
    }
}

// ── Renderer ──

pub struct Renderer {
    out: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            out: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(),
            back: FrameBuffer::new(),
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BG),
            Clear(ClearType::All)
        )
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.out, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, view: &View) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let (tw, th) = (tw as usize, th as usize);
        let resized = tw != self.front.width || th != self.front.height;
        let phase = view.session.phase;
        if resized || self.last_phase != Some(phase) {
            if resized {
                self.front.resize(tw, th);
                self.back.resize(tw, th);
            }
            self.back.fill(Cell::STALE);
            queue!(self.out, SetBackgroundColor(BG), Clear(ClearType::All))?;
            self.last_phase = Some(phase);
        }

        self.front.fill(Cell::BLANK);
        match phase {
            Phase::Menu => self.compose_menu(view),
            Phase::Playing | Phase::Paused => self.compose_playing(view),
            Phase::Completed => self.compose_completed(view),
        }
        if !view.message.is_empty() && self.front.height > 0 {
            let row = self.front.height - 1;
            self.front.bar(row, &format!(" * {} ", view.message), Color::Black, BAR_BG);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut fg = TEXT;
        let mut bg = BG;
        queue!(self.out, SetForegroundColor(fg), SetBackgroundColor(bg))?;

        for y in 0..self.front.height {
            // Cursor position after the last print on this row, if contiguous.
            let mut at: Option<usize> = None;
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if at != Some(x) {
                    queue!(self.out, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != fg {
                    fg = cell.fg;
                    queue!(self.out, SetForegroundColor(fg))?;
                }
                if cell.bg != bg {
                    bg = cell.bg;
                    queue!(self.out, SetBackgroundColor(bg))?;
                }
                queue!(self.out, Print(cell.ch))?;
                at = Some(x + 1);
            }
        }
        self.out.flush()
    }

    // ── Menu ──

    fn compose_menu(&mut self, v: &View) {
        let s = v.session;
        let f = &mut self.front;

        f.text(2, 1, "+------------------------------------------+", GOLD);
        f.text(2, 2, "|        E S C A P E W O R D               |", GOLD);
        f.text(2, 3, "|     word puzzles against the clock       |", GOLD);
        f.text(2, 4, "+------------------------------------------+", GOLD);

        let done = s.completed_rooms.len();
        let stats = format!(
            "Score {}   Rank {}   Level {}   Rooms {}/{} ({}%)",
            s.score,
            scoring::rank(s.score).title(),
            scoring::player_level(s.score),
            done,
            v.rooms.len(),
            scoring::completion_percent(done, v.rooms.len()),
        );
        f.text(4, 6, &stats, TEXT);

        let mut x = 4;
        for (earned, label) in scoring::badges(s.score, done).iter().zip(BADGES) {
            let (mark, color) = if *earned { ('*', GOLD) } else { ('.', DIM) };
            let badge = format!("{mark} {label}");
            f.text(x, 7, &badge, color);
            x += badge.chars().count() + 3;
        }

        let top = 9;
        for (i, room) in v.rooms.iter().enumerate() {
            let row = top + i;
            let check = if s.completed_rooms.contains(&room.id) { "✓" } else { " " };
            let line = format!(
                "{check} {:<22} {:<7} {:>2} puzzles  {}",
                room.name,
                room.difficulty.label(),
                room.puzzles.len(),
                mmss(room.time_limit),
            );
            if i == v.cursor {
                for col in 2..50.min(f.width) {
                    f.set(col, row, Cell { ch: ' ', fg: TEXT, bg: CURSOR_BG });
                }
                f.put(2, row, ">", GREEN, CURSOR_BG);
                f.put(4, row, &line, GREEN, CURSOR_BG);
            } else {
                f.text(4, row, &line, TEXT);
            }
        }

        let mut row = top + v.rooms.len() + 1;
        if let Some(room) = v.rooms.get(v.cursor) {
            for line in wrap(&room.description, f.width.saturating_sub(8).max(10)) {
                f.text(4, row, &line, CYAN);
                row += 1;
            }
        }
        f.text(4, row + 1, "Up/Down select   ENTER play   R reset progress   Q quit", DIM);
    }

    // ── Playing ──

    fn compose_playing(&mut self, v: &View) {
        let s = v.session;
        let Some(room) = s.room.as_ref() else { return };
        let f = &mut self.front;

        let timer_color = match s.timer.urgency() {
            Urgency::Calm => GREEN,
            Urgency::Hurry => AMBER,
            Urgency::Critical => RED,
        };
        let hud = format!(" {} ", room.name);
        f.bar(0, &hud, Color::Black, GOLD);
        let mut x = hud.chars().count() + 1;
        let time = format!(" {} ", s.timer.display());
        f.put(x, 0, &time, Color::Black, timer_color);
        x += time.chars().count() + 1;
        let stats = format!(
            "Score {}  Hints {}  Puzzle {}/{}  x{}",
            s.score,
            s.hints,
            s.puzzle_index + 1,
            room.puzzles.len(),
            s.power_ups.multiplier(),
        );
        f.put(x, 0, &stats, Color::Black, GOLD);

        let mut row = 2;
        if let Some(p) = s.current_puzzle() {
            let meta = format!("{} [{}, {} pts]", p.kind.prompt(), p.difficulty.label(), p.points);
            f.text(2, row, &meta, CYAN);
            row += 2;
            for line in wrap(&p.question, f.width.saturating_sub(6).max(10)) {
                f.text(4, row, &line, TEXT);
                row += 1;
            }
            row += 1;
            for (i, hint) in s.revealed().iter().enumerate() {
                f.text(4, row, &format!("Hint {}: {hint}", i + 1), AMBER);
                row += 1;
            }
            row += 1;
        }

        f.text(2, row, &format!("> {}_", v.answer), GREEN);
        row += 2;

        if !room.power_ups.is_empty() {
            f.text(2, row, "Power-ups", GOLD);
            row += 1;
            for (i, tpl) in room.power_ups.iter().take(4).enumerate() {
                let (line, active) = power_up_line(i, tpl, s);
                f.text(4, row, &line, if active { GREEN } else { TEXT });
                row += 1;
            }
            row += 1;
        }

        if !room.achievements.is_empty() {
            f.text(2, row, "Achievements", GOLD);
            row += 1;
            for a in &room.achievements {
                let (mark, color) = if s.unlocked.contains(&a.id) { ('*', GOLD) } else { ('.', DIM) };
                f.text(4, row, &format!("{mark} {}: {} (+{})", a.name, a.description, a.reward), color);
                row += 1;
            }
        }

        let help_row = f.height.saturating_sub(2);
        if help_row > row {
            f.text(2, help_row, "ENTER submit  Ctrl+H hint  Ctrl+S skip  F1-F4 power-ups  ESC menu", DIM);
        }
    }

    // ── Completed ──

    fn compose_completed(&mut self, v: &View) {
        let s = v.session;
        let f = &mut self.front;

        let (title, color) = match s.outcome {
            Some(Outcome::Escaped) => ("ESCAPED!  The room is yours.", GREEN),
            Some(Outcome::Partial) => ("Made it out, but puzzles were skipped.", AMBER),
            Some(Outcome::TimeUp) | None => ("TIME'S UP", RED),
        };
        f.text(4, 2, "+------------------------------------------+", color);
        f.text(4, 3, &format!("| {title:<40} |"), color);
        f.text(4, 4, "+------------------------------------------+", color);

        let name = s.room.as_ref().map_or("", |r| r.name.as_str());
        let lines = [
            format!("Room            {name}"),
            format!("Score           {}", s.score),
            format!("Wrong answers   {}", s.wrong_attempts),
            format!("Hints used      {}", s.hints_used),
            format!("Puzzles skipped {}", s.skipped.len()),
            format!("Power-ups used  {}", s.power_ups.used),
        ];
        for (i, line) in lines.iter().enumerate() {
            f.text(6, 6 + i, line, TEXT);
        }

        let mut row = 6 + lines.len() + 1;
        if let Some(room) = s.room.as_ref() {
            for a in room.achievements.iter().filter(|a| s.unlocked.contains(&a.id)) {
                f.text(6, row, &format!("* {} (+{})", a.name, a.reward), GOLD);
                row += 1;
            }
        }
        f.text(6, row + 1, "ENTER / ESC  back to menu", DIM);
    }
}

// ── Text helpers ──

fn mmss(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Greedy word wrap. Explicit newlines are kept.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for para in text.lines() {
        let mut line = String::new();
        for word in para.split_whitespace() {
            let needed = if line.is_empty() { word.chars().count() } else { line.chars().count() + 1 + word.chars().count() };
            if needed > width && !line.is_empty() {
                out.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        out.push(line);
    }
    out
}

/// `F<n> <label>` plus the live state of that kind. Second value: any instance active.
fn power_up_line(index: usize, tpl: &PowerUpTemplate, s: &GameSession) -> (String, bool) {
    let mut line = format!("F{} {:<14} {}", index + 1, tpl.kind.label(), tpl.description);
    let live: Vec<_> = s.power_ups.active.iter().filter(|p| p.kind() == tpl.kind).collect();
    if let Some(p) = live.first() {
        match p.remaining(s.clock) {
            Some(secs) => line.push_str(&format!("  [active {secs}s]")),
            None => line.push_str("  [active]"),
        }
        if live.len() > 1 {
            line.push_str(&format!(" x{}", live.len()));
        }
    }
    (line, !live.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::domain::catalog::PowerUpKind;

    fn template(kind: PowerUpKind, duration: Option<u32>) -> PowerUpTemplate {
        PowerUpTemplate { kind, duration, multiplier: Some(2.0), description: "desc".into() }
    }

    #[test]
    fn wrap_breaks_on_words_and_keeps_newlines() {
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("a\nb c", 10), vec!["a", "b c"]);
        assert_eq!(wrap("overlongword x", 4), vec!["overlongword", "x"]);
    }

    #[test]
    fn power_up_line_shows_live_state() {
        let mut s = GameSession::new(RulesConfig::default());
        let tpl = template(PowerUpKind::DoublePoints, Some(30));
        let (line, active) = power_up_line(0, &tpl, &s);
        assert!(line.starts_with("F1 Double Points"));
        assert!(!active);

        s.power_ups.activate(&tpl, 0);
        s.clock = 10;
        let (line, active) = power_up_line(0, &tpl, &s);
        assert!(line.ends_with("[active 20s]"), "{line}");
        assert!(active);

        s.power_ups.activate(&tpl, 10);
        let (line, _) = power_up_line(0, &tpl, &s);
        assert!(line.ends_with("x2"), "{line}");
    }

    #[test]
    fn frame_buffer_clips_at_edges() {
        let mut f = FrameBuffer::new();
        f.resize(4, 2);
        f.text(2, 0, "abcdef", TEXT);
        f.text(0, 5, "zzz", TEXT);
        assert_eq!(f.get(2, 0).ch, 'a');
        assert_eq!(f.get(3, 0).ch, 'b');
        assert_eq!(f.get(0, 1).ch, ' ');
    }
}
