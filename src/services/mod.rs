pub mod innings_service;
pub mod match_service;
pub mod read_models;
pub mod rules;
pub mod stats;
