//! Market Brief — incremental market-news briefing pipeline.
//!
//! One run: collect items from every source, drop what the previous run
//! already reported, have the generation backend write a briefing from the
//! rest, and deliver it in transport-sized chunks.

pub mod collect;
pub mod config;
pub mod deliver;
pub mod error;
pub mod generate;
pub mod item;
pub mod pipeline;
pub mod prompt;
pub mod store;
