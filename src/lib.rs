pub mod attributes;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod money;
pub mod nations;
pub mod percentiles;
pub mod pipeline;
pub mod player;
pub mod positions;
pub mod ratings;
pub mod row_parser;
pub mod row_pool;
pub mod weights;
pub mod workers;
