pub mod aggregator_core;
pub mod pipeline;
pub mod server;
pub mod streamer_core;
