#![allow(dead_code)]

pub mod mock_backend;
pub mod recording_handler;
