//! Small ambient helpers that don't belong to any one module: frame
//! timing ([`time`]).

pub mod time;

pub use time::Timer;
