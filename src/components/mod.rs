pub mod box_score;
pub mod player_list;
