//! Convert a weibo-crawler export (CSV plus downloaded media) into a Blinko
//! `.bko` backup bundle.

pub mod archive;
pub mod bundle;
pub mod config;
pub mod media;
pub mod model;
pub mod pipeline;
pub mod records;
pub mod render;
pub mod sequence;
pub mod template;
