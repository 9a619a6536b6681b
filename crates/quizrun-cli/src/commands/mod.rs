pub mod init;
pub mod list;
pub mod review;
pub mod take;
pub mod validate;
