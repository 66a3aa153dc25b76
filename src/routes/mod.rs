pub mod innings;
pub mod matches;
pub mod overs;
