pub(crate) mod innings;
pub(crate) mod matches;
