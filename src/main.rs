use std::{
    fs::File,
    io::{self, stdout},
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use blockfall::game::{DEFAULT_GRAVITY_MS, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use blockfall::{CellState, Command, Game, GameConfig, GameState, ShapeKind};

// ============================================================================
// Command Line
// ============================================================================

/// Largest well side the layout math handles in `u16` terminal cells.
const MAX_WELL_SIZE: i64 = 200;

#[derive(Debug, Parser)]
#[command(name = "blockfall", version, about = "Falling-block puzzle in the terminal")]
struct Args {
    /// Well width in cells.
    #[arg(
        long,
        default_value_t = DEFAULT_WIDTH as u16,
        value_name = "COLS",
        value_parser = clap::value_parser!(u16).range(1..=MAX_WELL_SIZE),
    )]
    width: u16,

    /// Well height in cells.
    #[arg(
        long,
        default_value_t = DEFAULT_HEIGHT as u16,
        value_name = "ROWS",
        value_parser = clap::value_parser!(u16).range(1..=MAX_WELL_SIZE),
    )]
    height: u16,

    /// Milliseconds between gravity steps.
    #[arg(long, default_value_t = DEFAULT_GRAVITY_MS, value_name = "MS")]
    gravity_ms: u64,

    /// Seed for the piece sequence; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Minimum milliseconds between accepted rotate presses.
    #[arg(long, default_value_t = 200, value_name = "MS")]
    rotate_cooldown_ms: u64,

    /// Write logs to this file (RUST_LOG controls the level).
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn init_logging(path: Option<&PathBuf>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = "  ";

fn shape_color(kind: ShapeKind) -> Color {
    match kind {
        ShapeKind::I => Color::Cyan,
        ShapeKind::O => Color::Yellow,
        ShapeKind::T => Color::Magenta,
        ShapeKind::S => Color::Green,
        ShapeKind::Z => Color::Red,
        ShapeKind::J => Color::Blue,
        ShapeKind::L => Color::Rgb(255, 165, 0),
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, game: &Game) {
    let area = frame.size();

    render_game(frame, game, area);
    match game.state {
        GameState::Playing => {}
        GameState::Paused => render_popup(
            frame,
            area,
            " Paused ",
            vec![
                Line::from(Span::styled("PAUSED", Style::default().fg(Color::Yellow))),
                Line::from(""),
                hint("Press P to continue"),
                hint("Press ESC to quit"),
            ],
        ),
        GameState::GameOver => render_popup(
            frame,
            area,
            " Game Over ",
            vec![
                Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
                Line::from(""),
                Line::from(format!("Lines: {}", game.lines_cleared())),
                Line::from(""),
                hint("Press R to restart"),
                hint("Press ESC to quit"),
            ],
        ),
    }
}

fn hint(text: &str) -> Line<'_> {
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

fn render_game(frame: &mut Frame, game: &Game, area: Rect) {
    let board = game.board();
    let grid_display_width = (board.width() as u16).saturating_mul(CELL_WIDTH).saturating_add(2);
    let grid_display_height = (board.height() as u16).saturating_add(2);
    let info_width = 14;
    let total_width = grid_display_width.saturating_add(info_width + 2);
    let total_height = grid_display_height.saturating_add(3);

    let main_area = centered_rect(total_width, total_height, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);

    let game_row = vertical[0];

    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(info_width),
    ])
    .split(game_row);

    render_grid(frame, game, horizontal[0]);
    render_info(frame, game, horizontal[1]);

    let controls_area = Rect {
        x: area.x,
        y: game_row.y.saturating_add(game_row.height),
        width: area.width,
        height: 2,
    };

    if controls_area.y + 1 < area.height {
        let controls = Paragraph::new(vec![Line::from(
            "A/D: Move | S: Drop | W/Space: Rotate | P: Pause | R: Restart | Q: Quit",
        )])
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

fn render_grid(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Blockfall ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = game
        .render_grid()
        .into_iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .into_iter()
                .map(|cell| match cell {
                    CellState::Empty => Span::raw(EMPTY_CHAR),
                    CellState::Filled(kind) => {
                        Span::styled(BLOCK_CHAR, Style::default().fg(shape_color(kind)))
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let piece = game.current_piece();
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Lines", Style::default().fg(Color::Cyan))),
        Line::from(format!("{}", game.lines_cleared())),
        Line::from(""),
        Line::from(Span::styled("Piece", Style::default().fg(Color::Green))),
        Line::from(Span::styled(
            format!("{:?} {}°", piece.kind(), piece.rotation.degrees()),
            Style::default().fg(shape_color(piece.kind())),
        )),
    ];

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn render_popup(frame: &mut Frame, area: Rect, title: &str, text: Vec<Line>) {
    let height = text.len() as u16 + 3;
    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    frame.render_widget(paragraph, centered_rect(24, height, area));
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Input
// ============================================================================

fn command_for(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Left | KeyCode::Char('a' | 'A' | 'h' | 'H') => Some(Command::MoveLeft),
        KeyCode::Right | KeyCode::Char('d' | 'D' | 'l' | 'L') => Some(Command::MoveRight),
        KeyCode::Down | KeyCode::Char('s' | 'S' | 'j' | 'J') => Some(Command::SoftDrop),
        KeyCode::Up | KeyCode::Char('w' | 'W' | 'k' | 'K' | ' ') => Some(Command::Rotate),
        _ => None,
    }
}

// ============================================================================
// Main Loop
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let config = GameConfig {
        width: usize::from(args.width),
        height: usize::from(args.height),
        gravity_interval: Duration::from_millis(args.gravity_ms),
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut game = Game::seeded(config, seed).context("invalid game configuration")?;
    log::info!("starting {}x{} well, seed {}", args.width, args.height, seed);

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = run(&mut game, Duration::from_millis(args.rotate_cooldown_ms));
    restore_terminal()?;
    result
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Rate limit for rotate presses; the simulation accepts every request.
struct RotateCooldown {
    interval: Duration,
    last: Option<Instant>,
}

impl RotateCooldown {
    fn ready(&mut self) -> bool {
        if self.last.is_some_and(|at| at.elapsed() < self.interval) {
            return false;
        }
        self.last = Some(Instant::now());
        true
    }
}

fn run(game: &mut Game, rotate_cooldown: Duration) -> Result<()> {
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let frame_budget = Duration::from_millis(16);
    let mut last_frame = Instant::now();
    let mut cooldown = RotateCooldown {
        interval: rotate_cooldown,
        last: None,
    };

    loop {
        terminal.draw(|frame| render(frame, game))?;

        let timeout = frame_budget
            .checked_sub(last_frame.elapsed())
            .unwrap_or(Duration::ZERO);

        // Drain every pending event before advancing gravity
        let mut wait = timeout;
        while event::poll(wait)? {
            wait = Duration::ZERO;
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Esc | KeyCode::Char('q' | 'Q') => return Ok(()),
                KeyCode::Char('p' | 'P') => game.toggle_pause(),
                KeyCode::Char('r' | 'R') => game.restart(),
                code => match command_for(code) {
                    Some(Command::Rotate) if !cooldown.ready() => {}
                    Some(command) => {
                        game.apply(command);
                    }
                    None => {}
                },
            }
        }

        let now = Instant::now();
        game.tick(now - last_frame);
        last_frame = now;

        for event in game.take_events() {
            log::debug!("{:?}", event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_size_is_bounded() {
        assert!(Args::try_parse_from(["blockfall", "--width", "40000"]).is_err());
        assert!(Args::try_parse_from(["blockfall", "--height", "0"]).is_err());

        let args = Args::try_parse_from(["blockfall", "--width", "200", "--height", "12"]).unwrap();
        assert_eq!((args.width, args.height), (200, 12));
    }
}
