use anyhow::Result;

mod app;
mod config;
mod gemini;
mod handler;
mod logging;
mod reminders;
mod situation;
mod tui;
mod ui;

use app::App;

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = logging::init()?;
    tui::install_panic_hook();

    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();
    let mut app = App::new();

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, events: &mut tui::EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event);
        }

        // The generation task settles between draws; ticks keep the
        // loop moving while it is in flight.
        handler::settle_generation(app).await;
    }

    Ok(())
}
