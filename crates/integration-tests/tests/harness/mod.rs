#![allow(dead_code)]

pub mod config;
pub mod fake_client;
pub mod server;
