use std::io;

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tracing::info;

use inview_core::AppConfig;
use inview_tui::{
    app::App,
    event::{AppEvent, EventHandler},
    input::{handle_key_event, Action},
    widgets::{NavBarWidget, PageWidget, StatusBarWidget},
    Theme,
};

/// Rows scrolled per mouse wheel notch
const WHEEL_ROWS: i32 = 3;

pub fn run(config: AppConfig) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, SetTitle("inview"))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, config);

    // Restore terminal even if the loop failed
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_loop<B: Backend>(terminal: &mut Terminal<B>, config: AppConfig) -> Result<()> {
    let size = terminal.size()?;
    let event_handler = EventHandler::new(config.ui.tick_rate_ms);
    let mut app = App::new(config, Theme::default(), size.width, content_rows(size.height));
    info!(cols = size.width, rows = size.height, "Demo started");

    loop {
        app.tick();

        terminal.draw(|frame| {
            // Nav bar, page, status bar
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(1), Constraint::Length(1)])
                .split(frame.area());

            NavBarWidget::render(frame, layout[0], &app);
            PageWidget::render(frame, layout[1], &app);
            StatusBarWidget::render(frame, layout[2], &app);
        })?;

        if let Some(event) = event_handler.next()? {
            match event {
                AppEvent::Key(key) => handle_action(&mut app, handle_key_event(key)),
                AppEvent::Wheel(notches) => app.scroll_by(notches as i32 * WHEEL_ROWS),
                AppEvent::Resize(width, height) => app.resize(width, content_rows(height)),
                AppEvent::Tick => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    app.shutdown();
    info!("Demo finished");
    Ok(())
}

/// Rows left for the page between the nav and status bars
fn content_rows(height: u16) -> u16 {
    height.saturating_sub(2)
}

fn handle_action(app: &mut App, action: Action) {
    match action {
        Action::Quit => app.should_quit = true,
        Action::ScrollDown => app.scroll_by(1),
        Action::ScrollUp => app.scroll_by(-1),
        Action::ScrollHalfPageDown => app.scroll_by(app.half_page()),
        Action::ScrollHalfPageUp => app.scroll_by(-app.half_page()),
        Action::ScrollPageDown => app.scroll_by(app.full_page()),
        Action::ScrollPageUp => app.scroll_by(-app.full_page()),
        Action::JumpToTop => app.scroll_to(0),
        Action::JumpToBottom => app.scroll_to_bottom(),
        Action::ResetStats => app.reset_stats(),
        Action::None => {}
    }
}
