use crate::{Player, PlayerId, Position};
use log::debug;
use uuid::Uuid;

/// The players available for tagging in this session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new(players: Vec<Player>) -> Self {
        Self { players }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    /// Join an event's player reference against the roster. The id wins when
    /// present; events saved before ids existed fall back to the first entry
    /// with that name.
    pub fn resolve(&self, id: Option<&str>, name: Option<&str>) -> Option<&Player> {
        match id {
            Some(id) => self.get(id),
            None => name.and_then(|n| self.find_by_name(n)),
        }
    }

    /// Add an ad-hoc player with a fresh id.
    pub fn add(&mut self, name: &str, jersey_number: u32, position: Position) -> &Player {
        let player = Player::new(Uuid::new_v4().to_string(), name.trim(), jersey_number, position);
        debug!("adding player {} (#{})", player.name, player.jersey_number);
        self.players.push(player);
        &self.players[self.players.len() - 1]
    }

    pub fn remove(&mut self, id: &str) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.remove(idx))
    }

    /// Keep every existing entry and append the incoming players whose id and
    /// name are both unknown.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = Player>) {
        for player in incoming {
            let known = self.players.iter().any(|p| p.id == player.id || p.name == player.name);
            if !known {
                self.players.push(player);
            }
        }
    }

    /// Jersey order; equal numbers keep roster order.
    pub fn sorted_by_jersey(&self) -> Vec<&Player> {
        let mut sorted: Vec<&Player> = self.players.iter().collect();
        sorted.sort_by_key(|p| p.jersey_number);
        sorted
    }

    pub fn into_players(self) -> Vec<Player> {
        self.players
    }

    pub fn ids(&self) -> impl Iterator<Item = &PlayerId> {
        self.players.iter().map(|p| &p.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new(vec![
            Player::new("1", "Lena Marsh", 12, Position::Center),
            Player::new("2", "Otto Fenn", 4, Position::Guard),
            Player::new("3", "Lena Marsh", 30, Position::Forward),
        ])
    }

    #[test]
    fn resolve_prefers_id_then_first_name_match() {
        let r = roster();
        assert_eq!(r.resolve(Some("3"), Some("Lena Marsh")).map(|p| p.jersey_number), Some(30));
        assert_eq!(r.resolve(None, Some("Lena Marsh")).map(|p| p.jersey_number), Some(12));
        // an unknown id never falls back to the name
        assert!(r.resolve(Some("99"), Some("Otto Fenn")).is_none());
        assert!(r.resolve(None, Some("Nobody")).is_none());
        assert!(r.resolve(None, None).is_none());
    }

    #[test]
    fn merge_skips_known_ids_and_names() {
        let mut r = roster();
        r.merge(vec![
            Player::new("2", "Renamed", 4, Position::Guard),
            Player::new("9", "Otto Fenn", 8, Position::Guard),
            Player::new("10", "Ida Krug", 21, Position::Forward),
        ]);
        let names: Vec<&str> = r.players().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Lena Marsh", "Otto Fenn", "Lena Marsh", "Ida Krug"]);
    }

    #[test]
    fn add_assigns_unique_ids_and_remove_drops_them() {
        let mut r = Roster::default();
        let a = r.add(" Pia Stoll ", 9, Position::Guard).id.clone();
        let b = r.add("Pia Stoll", 9, Position::Guard).id.clone();
        assert_ne!(a, b);
        assert_eq!(r.get(&a).map(|p| p.name.as_str()), Some("Pia Stoll"));
        assert!(r.remove(&a).is_some());
        assert!(r.get(&a).is_none());
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn jersey_sort_is_stable() {
        let mut r = roster();
        r.merge(vec![Player::new("4", "Ida Krug", 12, Position::Guard)]);
        let order: Vec<&str> = r.sorted_by_jersey().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec!["2", "1", "4", "3"]);
    }
}
