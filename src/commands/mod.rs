pub mod ask;
pub mod common;
pub mod copy;
pub mod export;
pub mod history;
pub mod key;
pub mod open;
pub mod resolve;
pub mod watch;
