pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod imdb;
pub mod imsdb;
pub mod models;
pub mod parser;
pub mod render;
pub mod scraper;
pub mod store;

pub use error::ConvertError;
pub use parser::{
    convert_forward, convert_forward_with, convert_reverse, convert_transcript, Conversion, ForwardOptions, SourceFormat,
};
