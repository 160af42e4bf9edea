#![allow(dead_code)]

pub mod fake;
pub mod ingest_server;
