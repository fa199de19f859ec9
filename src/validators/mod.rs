pub mod cultural;
pub mod municipal;
pub mod regulatory;
