use tui::layout::{Constraint, Layout, Rect, Size};
pub const TAB_BAR_HEIGHT: u16 = 3;
pub const STATUS_HEIGHT: u16 = 1;
pub const LOG_PANE_PERCENT: u16 = 30;

/// Pre-computed layout areas for the main draw loop.
pub struct LayoutAreas {
    pub tab_bar: [Rect; 2],
    pub main: Rect,
    pub status: Rect,
    pub logs: Option<Rect>,
}

impl LayoutAreas {
    pub fn new(size: Size) -> Self {
        let rect = Rect::new(0, 0, size.width, size.height);
        Self::from_rect(rect, false, false)
    }

    pub fn update(&mut self, area: Rect, full_screen: bool, show_logs: bool) {
        *self = Self::from_rect(area, full_screen, show_logs);
    }

    fn from_rect(area: Rect, full_screen: bool, show_logs: bool) -> Self {
        let tab_height = if full_screen { 0 } else { TAB_BAR_HEIGHT };
        let [tab, body, status] = Layout::vertical([
            Constraint::Length(tab_height),
            Constraint::Fill(1),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .areas(area);

        let (main, logs) = if show_logs {
            let [main, logs] = Layout::vertical([
                Constraint::Fill(1),
                Constraint::Percentage(LOG_PANE_PERCENT),
            ])
            .areas(body);
            (main, Some(logs))
        } else {
            (body, None)
        };

        LayoutAreas {
            tab_bar: if full_screen { [Rect::ZERO, Rect::ZERO] } else { Self::split_tab_bar(tab) },
            main,
            status,
            logs,
        }
    }

    fn split_tab_bar(area: Rect) -> [Rect; 2] {
        Layout::horizontal([Constraint::Percentage(85), Constraint::Percentage(15)]).areas(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_screen_drops_the_tab_bar() {
        let mut layout = LayoutAreas::new(Size::new(100, 40));
        assert_eq!(layout.main.y, TAB_BAR_HEIGHT);
        assert_eq!(layout.status.y, 39);

        layout.update(Rect::new(0, 0, 100, 40), true, false);
        assert_eq!(layout.tab_bar, [Rect::ZERO, Rect::ZERO]);
        assert_eq!(layout.main.y, 0);
        assert_eq!(layout.main.height, 39);
    }

    #[test]
    fn log_pane_takes_the_bottom_of_the_body() {
        let mut layout = LayoutAreas::new(Size::new(100, 43));
        layout.update(Rect::new(0, 0, 100, 43), false, true);
        let logs = layout.logs.expect("log pane");
        assert_eq!(logs.y + logs.height, layout.status.y);
        assert_eq!(layout.main.y + layout.main.height, logs.y);
    }
}
