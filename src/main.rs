mod app;
mod config;
mod event;
mod scramble;
mod session;
mod store;
mod supply;
mod ui;

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use app::{App, AppScreen, ResetScope, TimerPhase};
use config::Config;
use event::{AppEvent, EventHandler};
use scramble::PuzzleId;
use session::RECENT_LIMIT;
use store::json_store::JsonStore;
use ui::components::history_chart::HistoryChart;
use ui::components::puzzle_menu::PuzzleMenu;
use ui::components::stats_sidebar::StatsSidebar;
use ui::components::timer_panel::TimerPanel;
use ui::layout::AppLayout;

#[derive(Parser)]
#[command(name = "cubedr", version, about = "Terminal speedcubing timer")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Puzzle to start on (e.g. \"3x3x3\", \"Pyraminx\")")]
    puzzle: Option<String>,

    #[arg(long, value_name = "DIR", help = "Data directory override")]
    data_dir: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Export all data to FILE and exit")]
    export: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Import data from FILE and exit")]
    import: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let store = match &cli.data_dir {
        Some(dir) => JsonStore::with_base_dir(dir.clone())?,
        None => JsonStore::new()?,
    };
    let mut config = Config::load().unwrap_or_default();

    if let Some(path) = &cli.export {
        let export = store.export_all(&config);
        let json = serde_json::to_string_pretty(&export)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("Exported to {}", path.display());
        return Ok(());
    }

    if let Some(path) = &cli.import {
        let json =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let export = serde_json::from_str(&json).context("parsing export file")?;
        store.import_all(&export)?;
        println!("Imported from {}", path.display());
        return Ok(());
    }

    if store.check_interrupted_import() {
        eprintln!("Note: cleaned up leftovers from an interrupted import.");
    }

    if let Some(theme_name) = &cli.theme {
        config.theme = theme_name.clone();
    }

    let mut app = App::new(config, store);
    if let Some(puzzle) = &cli.puzzle {
        app.switch_puzzle(&PuzzleId::new(puzzle.as_str()));
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // The hold-to-start gesture needs key Release events; without the
    // enhancement the timer degrades to press-to-start.
    let keyboard_enhanced = execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok();
    app.keyboard_enhanced = keyboard_enhanced;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(app.config.tick_ms));

    let result = run_app(&mut terminal, &mut app, &events);

    if keyboard_enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        if key.code == KeyCode::Char(' ') {
            app.space_released();
        }
        return;
    }
    // Repeat events would re-trigger the hold gesture mid-hold.
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Timer => handle_timer_key(app, key),
        AppScreen::Stats => handle_stats_key(app, key),
        AppScreen::PuzzleSelect => handle_selector_key(app, key),
        AppScreen::Settings => handle_settings_key(app, key),
    }
}

fn handle_timer_key(app: &mut App, key: KeyEvent) {
    let running = matches!(app.phase, TimerPhase::Running { .. });
    match key.code {
        KeyCode::Char(' ') => app.space_pressed(),
        // Everything else is locked out while the clock runs.
        _ if running => {}
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('d') => app.delete_last_solve(),
        KeyCode::Char('s') => app.go_to_stats(),
        KeyCode::Char('p') => app.go_to_puzzle_select(),
        KeyCode::Char('c') => app.go_to_settings(),
        _ => {}
    }
}

fn handle_stats_key(app: &mut App, key: KeyEvent) {
    if let Some(scope) = app.pending_reset {
        match key.code {
            KeyCode::Char('y') => {
                app.pending_reset = None;
                match scope {
                    ResetScope::Current => app.reset_current(),
                    ResetScope::All => app.reset_all(),
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => app.pending_reset = None,
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.go_to_timer(),
        KeyCode::Char('r') => app.pending_reset = Some(ResetScope::Current),
        KeyCode::Char('R') => app.pending_reset = Some(ResetScope::All),
        _ => {}
    }
}

fn handle_selector_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_to_timer(),
        KeyCode::Down | KeyCode::Char('j') => app.selector_next(),
        KeyCode::Up | KeyCode::Char('k') => app.selector_prev(),
        KeyCode::Enter => app.selector_confirm(),
        _ => {}
    }
}

fn handle_settings_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            let _ = app.config.save();
            app.go_to_timer();
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.settings_selected = app.settings_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.settings_selected = (app.settings_selected + 1).min(1);
        }
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => app.settings_cycle_forward(),
        KeyCode::Left | KeyCode::Char('h') => app.settings_cycle_backward(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Timer => render_timer(frame, app),
        AppScreen::Stats => render_stats(frame, app),
        AppScreen::PuzzleSelect => render_puzzle_select(frame, app),
        AppScreen::Settings => render_settings(frame, app),
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect) {
    let colors = &app.theme.colors;
    let stats = app.history.stats(&app.current_puzzle);

    let mut info = format!(" {} | Solves: {}", app.current_puzzle, stats.count);
    if let Some(best) = stats.best {
        info.push_str(&format!(" | Best: {}", session::stats::format_time(best)));
    }

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " cubedr ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info,
            Style::default().fg(colors.text_dim()).bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect, hints: &str) {
    let colors = &app.theme.colors;
    let footer = Paragraph::new(Line::from(Span::styled(
        hints,
        Style::default().fg(colors.text_dim()),
    )));
    frame.render_widget(footer, area);
}

fn render_timer(frame: &mut ratatui::Frame, app: &App) {
    let layout = AppLayout::new(frame.area());

    render_header(frame, app, layout.header);

    let clock_text = app.clock_text();
    let panel = TimerPanel::new(
        &app.current_scramble,
        &clock_text,
        app.status_text(),
        app.phase,
        app.generating,
        app.theme,
    );
    frame.render_widget(panel, layout.main);

    if let Some(sidebar_area) = layout.sidebar {
        let recent = app
            .history
            .recent(&app.current_puzzle, RECENT_LIMIT)
            .iter()
            .map(|r| r.elapsed_secs)
            .collect();
        let sidebar = StatsSidebar::new(app.history.stats(&app.current_puzzle), recent, app.theme);
        frame.render_widget(sidebar, sidebar_area);
    }

    render_footer(
        frame,
        app,
        layout.footer,
        " [Space] Time  [d] Delete last  [p] Puzzle  [s] Stats  [c] Settings  [q] Quit ",
    );
}

fn render_stats(frame: &mut ratatui::Frame, app: &App) {
    let layout = AppLayout::new(frame.area());
    render_header(frame, app, layout.header);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(26)])
        .split(layout.main);

    let times = app.history.times(&app.current_puzzle);
    let chart = HistoryChart::new(app.current_puzzle.as_str(), &times, app.theme);
    frame.render_widget(chart, body[0]);

    let recent = app
        .history
        .recent(&app.current_puzzle, RECENT_LIMIT)
        .iter()
        .map(|r| r.elapsed_secs)
        .collect();
    let sidebar = StatsSidebar::new(app.history.stats(&app.current_puzzle), recent, app.theme);
    frame.render_widget(sidebar, body[1]);

    let hints = match app.pending_reset {
        Some(ResetScope::Current) => " Reset this puzzle's history? [y] Yes  [n] No ",
        Some(ResetScope::All) => " Reset ALL puzzles' history? [y] Yes  [n] No ",
        None => " [r] Reset puzzle  [R] Reset all  [Esc] Back ",
    };
    render_footer(frame, app, layout.footer, hints);
}

fn render_puzzle_select(frame: &mut ratatui::Frame, app: &App) {
    let area = ui::layout::centered_rect(46, 85, frame.area());
    let menu = PuzzleMenu::new(app.supply.specs(), app.selector_index, app.theme);
    frame.render_widget(menu, area);
}

fn render_settings(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let centered = ui::layout::centered_rect(50, 50, frame.area());

    let block = Block::bordered()
        .title(" Settings ")
        .border_style(Style::default().fg(colors.accent()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(centered);
    block.render(centered, frame.buffer_mut());

    let fields: [(&str, String); 2] = [
        ("Theme", app.config.theme.clone()),
        ("Hold threshold", format!("{} ms", app.config.hold_ms)),
    ];

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(fields.len() as u16 * 3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(inner);

    let header = Paragraph::new(Line::from(Span::styled(
        "  Arrows to navigate, Enter/Right to change",
        Style::default().fg(colors.text_dim()),
    )));
    header.render(layout[0], frame.buffer_mut());

    let field_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(fields.iter().map(|_| Constraint::Length(3)).collect::<Vec<_>>())
        .split(layout[1]);

    for (i, (label, value)) in fields.iter().enumerate() {
        let is_selected = i == app.settings_selected;
        let indicator = if is_selected { " > " } else { "   " };

        let label_style = Style::default()
            .fg(if is_selected { colors.accent() } else { colors.fg() })
            .add_modifier(if is_selected {
                Modifier::BOLD
            } else {
                Modifier::empty()
            });

        let lines = vec![
            Line::from(Span::styled(format!("{indicator}{label}:"), label_style)),
            Line::from(Span::styled(
                format!("  < {value} >"),
                Style::default().fg(colors.text_dim()),
            )),
        ];
        Paragraph::new(lines).render(field_layout[i], frame.buffer_mut());
    }

    let footer = Paragraph::new(Line::from(Span::styled(
        "  [Esc] Save & back",
        Style::default().fg(colors.accent()),
    )));
    footer.render(layout[3], frame.buffer_mut());
}
