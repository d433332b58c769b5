use cmdbar_core::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
    Terminal,
};
use std::io::{self, stdout};

pub type UiTerminal = Terminal<CrosstermBackend<io::Stdout>>;

/// Run a UI session inside raw mode and the alternate screen, restoring the
/// terminal no matter how the session ends.
pub fn with_terminal<T>(f: impl FnOnce(&mut UiTerminal) -> Result<T>) -> Result<T> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = f(&mut terminal);

    let _ = disable_raw_mode();
    let _ = execute!(stdout(), LeaveAlternateScreen);

    result
}

// Helper function to show messages in a popup
pub fn show_message(terminal: &mut UiTerminal, message: &str, color: Color) -> Result<()> {
    terminal.draw(|f| {
        let size = f.size();
        let area = centered_rect(60, 20, size);

        // Clear the area behind the popup
        f.render_widget(Clear, area);

        let message_box = Paragraph::new(format!("{}\n\nPress any key to continue...", message))
            .style(Style::default().fg(color))
            .block(Block::default().borders(Borders::ALL).title(" cmdbar "))
            .alignment(Alignment::Center);

        f.render_widget(message_box, area);
    })?;

    if crossterm::event::poll(std::time::Duration::from_secs(30))? {
        let _ = crossterm::event::read()?;
    }

    Ok(())
}

// Helper function to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
