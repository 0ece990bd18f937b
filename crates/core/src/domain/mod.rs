pub mod market;
pub mod profile;
pub mod recommendation;
