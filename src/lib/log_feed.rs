pub mod emitter;
pub mod feed;
pub mod models;
