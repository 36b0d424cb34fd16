pub mod codegen;
pub mod config;
pub mod drive;
pub mod project;
pub mod vault;
