pub mod init;
pub mod mistakes;
pub mod simulate;
