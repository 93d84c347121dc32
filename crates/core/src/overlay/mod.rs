pub mod canvas;
pub mod colors;
