// Board document models
// These structs are the JSON shapes exchanged with the board UI

pub mod app;
pub mod board;
pub mod lexeme;
pub mod comparison;

pub use app::*;
pub use board::*;
pub use lexeme::*;
pub use comparison::*;
