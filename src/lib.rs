pub mod archive;
pub mod dispatch;
pub mod error;
pub mod manifest;
pub mod packager;
pub mod platform;
pub mod runtime;
