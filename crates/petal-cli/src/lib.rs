pub mod classify;
pub mod cli;
pub mod prepare;
pub mod train;
pub mod util;
