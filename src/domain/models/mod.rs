pub mod file;
pub mod gallery;
pub mod upload;
