//! LUCA command-line front end: transcript replay and text rendering

pub mod render;
pub mod replay;
