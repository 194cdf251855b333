pub mod language;
pub mod rating;
