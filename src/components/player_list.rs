use hooptag_core::Player;
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::widgets::Widget;

/// Jersey-ordered player rows with a cursor and an "on court" mark.
pub struct PlayerList<'a> {
    pub players: &'a [&'a Player],
    pub cursor: Option<usize>,
    pub is_marked: &'a dyn Fn(&Player) -> bool,
    /// Highlighted regardless of the cursor (the player being tagged).
    pub active: Option<&'a str>,
}

pub fn row_text(player: &Player, marked: bool, selected: bool) -> String {
    let pointer = if selected { '>' } else { ' ' };
    let mark = if marked { '●' } else { '○' };
    format!(
        "{pointer} {mark} #{:<3} {} ({})",
        player.jersey_number,
        player.name,
        player.position.abbrev()
    )
}

impl Widget for PlayerList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let visible = area.height as usize;
        // keep the cursor on screen
        let offset = self
            .cursor
            .map(|c| c.saturating_sub(visible.saturating_sub(1)))
            .unwrap_or(0);

        for (row, (idx, player)) in self.players.iter().enumerate().skip(offset).take(visible).enumerate() {
            let selected = self.cursor == Some(idx);
            let marked = (self.is_marked)(player);
            let mut style = if marked {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            };
            if self.active == Some(player.id.as_str()) {
                style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
            }
            if selected {
                style = style.add_modifier(Modifier::REVERSED);
            }
            buf.set_stringn(
                area.x,
                area.y + row as u16,
                row_text(player, marked, selected),
                area.width as usize,
                style,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hooptag_core::Position;

    fn players() -> Vec<Player> {
        (1..=8)
            .map(|n| Player::new(n.to_string(), format!("Player {n}"), n, Position::Forward))
            .collect()
    }

    fn render(list: PlayerList, height: u16) -> Vec<String> {
        let area = Rect::new(0, 0, 30, height);
        let mut buf = Buffer::empty(area);
        list.render(area, &mut buf);
        (0..height)
            .map(|y| {
                (0..30)
                    .filter_map(|x| buf.cell((x, y)).map(|c| c.symbol().to_string()))
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn row_text_shows_cursor_and_mark() {
        let p = Player::new("1", "Lena Marsh", 4, Position::Guard);
        assert_eq!(row_text(&p, true, true), "> ● #4   Lena Marsh (G)");
        assert_eq!(row_text(&p, false, false), "  ○ #4   Lena Marsh (G)");
    }

    #[test]
    fn scrolls_to_keep_cursor_visible() {
        let owned = players();
        let refs: Vec<&Player> = owned.iter().collect();
        let marked = |p: &Player| p.jersey_number % 2 == 0;
        let lines = render(
            PlayerList { players: &refs, cursor: Some(6), is_marked: &marked, active: None },
            3,
        );
        assert!(lines[0].contains("Player 5"));
        assert!(lines[2].starts_with("> ○ #7"));
    }
}
