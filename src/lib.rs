pub mod dataset;
pub mod features;
pub mod match_log;
pub mod model;
pub mod player_db;
pub mod roster;
pub mod scanner;
pub mod serve;
pub mod venue_table;
