pub mod broadcast;
pub mod eval;
