pub mod outcome;
pub mod track;
