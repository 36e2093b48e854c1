pub mod client;
pub mod gate;
pub mod prompt;
