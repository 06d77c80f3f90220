use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Debug, Clone, Copy)]
pub struct UiAreas {
    pub size: Rect,
    pub header: Rect,
    pub list: Rect,
    pub details: Rect,
    pub activity: Rect,
    pub status_line: Rect,
    pub command_line: Rect,
}

pub fn areas(size: Rect) -> UiAreas {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(8),
            Constraint::Length(2),
        ])
        .split(size);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(42), Constraint::Percentage(58)])
        .split(vertical[1]);

    let footer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(vertical[3]);

    UiAreas {
        size,
        header: vertical[0],
        list: main_chunks[0],
        details: main_chunks[1],
        activity: vertical[2],
        status_line: footer_chunks[0],
        command_line: footer_chunks[1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_areas_cover_screen() {
        let size = Rect::new(0, 0, 120, 40);
        let areas = areas(size);
        assert_eq!(areas.header.height, 4);
        assert_eq!(areas.activity.height, 8);
        assert_eq!(areas.command_line.y, 39);
        assert_eq!(areas.list.width + areas.details.width, 120);
    }
}
