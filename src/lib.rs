pub mod ask;
pub mod cache;
pub mod chunker;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod errors;
pub mod history;
pub mod ingest;
pub mod logging;
pub mod server;
pub mod state;
pub mod vector;
