pub mod edit;
pub mod init;
pub mod stream;

pub use edit::{edit, EditArgs};
pub use init::{init, InitArgs};
pub use stream::{stream, StreamArgs};
