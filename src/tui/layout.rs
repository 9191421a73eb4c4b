// Screen layout: panel arrangement and sizing.
//
// Divides the terminal area into fixed zones for the auction dashboard:
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | On-Block Banner (7 rows)                          |
// +-------------------------+------------------------+
// | Team Grid (65%)          | Sidebar (35%)          |
// |                          | +- Unsold Queue (70%)-+|
// |                          | +- Last Sale (30%) ---+|
// +-------------------------+------------------------+
// | Message Line (1 row)                              |
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each dashboard zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: phase, live set, player counters.
    pub status_bar: Rect,
    /// Second block: the player on the block and the running bid.
    pub block_banner: Rect,
    /// Left side of the middle section: per-team budgets and eligibility.
    pub team_grid: Rect,
    /// Right sidebar top: the unsold resurfacing queue.
    pub unsold: Rect,
    /// Right sidebar bottom: most recent sale.
    pub last_sale: Rect,
    /// Transient status messages (rejections, confirmations).
    pub message_line: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the dashboard layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    // Vertical: status(1) | block(7) | middle(fill) | message(1) | help(1)
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(7),
            Constraint::Min(8),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let status_bar = vertical[0];
    let block_banner = vertical[1];
    let middle = vertical[2];
    let message_line = vertical[3];
    let help_bar = vertical[4];

    // Horizontal: team grid (65%) | sidebar (35%)
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(middle);

    let team_grid = horizontal[0];
    let sidebar = horizontal[1];

    // Sidebar vertical: unsold queue (70%) | last sale (30%)
    let sidebar_sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(sidebar);

    AppLayout {
        status_bar,
        block_banner,
        team_grid,
        unsold: sidebar_sections[0],
        last_sale: sidebar_sections[1],
        message_line,
        help_bar,
    }
}

/// A centered rectangle covering the given percentages of `area`, used for
/// modal overlays (introductions, category notices, confirmations).
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
