#![forbid(unsafe_code)]

pub mod archive;
pub mod catalog;
pub mod cli;
pub mod encoding;
pub mod fetch;
pub mod lessons;
pub mod logging;
pub mod pages;
pub mod pdf_meta;
pub mod store;
pub mod titles;
pub mod versions;
