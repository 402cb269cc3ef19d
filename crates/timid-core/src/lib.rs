pub mod config;
pub mod logging;

// Engine, leaf-first.
pub mod control;
pub mod dedup;
pub mod error;
pub mod fetcher;
pub mod media;
pub mod observer;
pub mod pipeline;
pub mod progress;
pub mod retry;
pub mod scheduler;
pub mod segmenter;
pub mod source;
pub mod storage;
