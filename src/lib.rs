use std::error::Error;

pub mod accounts;
pub mod api;
pub mod assets;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod handler;
pub mod journal;
pub mod reference;
pub mod scripture;
pub mod studies;

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
