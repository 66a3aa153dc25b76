pub mod scoring_dtos;
