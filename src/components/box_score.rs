use hooptag_core::{BoxScore, PlayerGameStats};
use tui::buffer::Buffer;
use tui::layout::{Constraint, Rect};
use tui::style::{Color, Modifier, Style};
use tui::widgets::{Row, Table, Widget};

const HEADER: [&str; 14] = [
    "#", "Player", "PTS", "FG", "3P", "FT", "AST", "REB", "STL", "BLK", "TOV", "PF", "SUB", "EFF",
];

const WIDTHS: [Constraint; 14] = [
    Constraint::Length(3),
    Constraint::Fill(1),
    Constraint::Length(4),
    Constraint::Length(12),
    Constraint::Length(12),
    Constraint::Length(12),
    Constraint::Length(4),
    Constraint::Length(4),
    Constraint::Length(4),
    Constraint::Length(4),
    Constraint::Length(4),
    Constraint::Length(3),
    Constraint::Length(4),
    Constraint::Length(4),
];

/// Per-player box score with a team totals row at the bottom.
pub struct BoxScoreTable<'a> {
    pub stats: &'a BoxScore,
}

/// `made/attempted pct`, e.g. `3/7 42.9`.
pub fn shooting_line(made: u32, attempted: u32, pct: f64) -> String {
    if attempted == 0 {
        return "0/0".to_string();
    }
    format!("{made}/{attempted} {pct}")
}

fn player_row(p: &PlayerGameStats) -> Row<'static> {
    Row::new(vec![
        p.jersey_number.to_string(),
        p.player_name.clone(),
        p.total_points.to_string(),
        shooting_line(p.field_goals_made, p.field_goals_attempted, p.field_goal_percentage),
        shooting_line(p.three_pointers_made, p.three_pointers_attempted, p.three_point_percentage),
        shooting_line(p.free_throws_made, p.free_throws_attempted, p.free_throw_percentage),
        p.assists.to_string(),
        p.rebounds.to_string(),
        p.steals.to_string(),
        p.blocks.to_string(),
        p.turnovers.to_string(),
        p.fouls.to_string(),
        p.substitutions.to_string(),
        p.efficiency().to_string(),
    ])
}

impl Widget for BoxScoreTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let team = &self.stats.team_stats;
        let mut rows: Vec<Row> = self.stats.player_stats.iter().map(player_row).collect();
        rows.push(
            Row::new(vec![
                String::new(),
                "TEAM".to_string(),
                team.total_points.to_string(),
                shooting_line(team.field_goals_made, team.field_goals_attempted, team.team_field_goal_percentage),
                shooting_line(
                    team.three_pointers_made,
                    team.three_pointers_attempted,
                    team.team_three_point_percentage,
                ),
                shooting_line(team.free_throws_made, team.free_throws_attempted, team.team_free_throw_percentage),
                team.total_assists.to_string(),
                team.total_rebounds.to_string(),
                team.total_steals.to_string(),
                team.total_blocks.to_string(),
                team.total_turnovers.to_string(),
                team.total_fouls.to_string(),
                team.total_substitutions.to_string(),
                String::new(),
            ])
            .style(Style::default().add_modifier(Modifier::BOLD)),
        );

        let header = Row::new(HEADER.to_vec())
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::UNDERLINED));

        Widget::render(Table::new(rows, WIDTHS).header(header).column_spacing(1), area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hooptag_core::stats::extract_stats;
    use hooptag_core::{Event, EventType, Player, Position, Roster};

    fn render_lines(stats: &BoxScore, width: u16, height: u16) -> Vec<String> {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        BoxScoreTable { stats }.render(area, &mut buf);
        (0..height)
            .map(|y| {
                (0..width)
                    .filter_map(|x| buf.cell((x, y)).map(|c| c.symbol().to_string()))
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn shooting_line_formats() {
        assert_eq!(shooting_line(0, 0, 0.0), "0/0");
        assert_eq!(shooting_line(3, 7, 42.9), "3/7 42.9");
        assert_eq!(shooting_line(2, 2, 100.0), "2/2 100");
    }

    #[test]
    fn renders_players_and_team_row() {
        let roster = Roster::new(vec![
            Player::new("a", "Lena Marsh", 4, Position::Guard),
            Player::new("b", "Pia Stoll", 13, Position::Center),
        ]);
        let mut shot = Event::bare("s1", 10.0, EventType::Shot);
        shot.player = Some("Lena Marsh".into());
        shot.player_id = Some("a".into());
        shot.points = Some(3);
        shot.missed = Some(false);
        let stats = extract_stats(&[shot], &roster);

        let lines = render_lines(&stats, 110, 5);
        assert!(lines[0].contains("Player"));
        assert!(lines[1].contains("Lena Marsh"));
        assert!(lines[1].contains("1/1 100"));
        assert!(lines[2].contains("Pia Stoll"));
        assert!(lines[3].contains("TEAM"));
    }
}
