pub mod cubed;
pub mod refine;
