pub mod init;
pub mod replay;
pub mod show;

pub use init::{init, InitArgs};
pub use replay::{replay, ReplayArgs};
pub use show::{show, ShowArgs};
