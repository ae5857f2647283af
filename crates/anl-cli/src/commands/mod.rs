pub mod dispatch;
pub mod login;
pub mod project;
pub mod sync;
pub mod train;
