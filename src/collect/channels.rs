//! Channel feed collector.
//!
//! Pulls recent posts from a list of channel feed URLs (any endpoint that
//! serves a JSON array of posts, e.g. an RSS-to-JSON bridge in front of a
//! chat channel). Each URL is an independent sub-query: a dead feed is
//! logged and skipped without affecting the others.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::collect::Collector;
use crate::item::Item;

const POSTS_PER_CHANNEL: usize = 5;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// One configured channel feed.
#[derive(Debug, Clone)]
pub struct ChannelFeed {
    /// Tag attached to items from this feed (channel name).
    pub tag: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ChannelPost {
    #[serde(default)]
    title: String,
    text: String,
    date: Option<String>,
}

/// Collects recent posts from configured channel feeds.
pub struct ChannelFeedCollector {
    feeds: Vec<ChannelFeed>,
    client: reqwest::Client,
}

impl ChannelFeedCollector {
    pub fn new(feeds: Vec<ChannelFeed>) -> Self {
        Self {
            feeds,
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    async fn fetch_feed(&self, feed: &ChannelFeed) -> Result<Vec<Item>, reqwest::Error> {
        let posts: Vec<ChannelPost> = self
            .client
            .get(&feed.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(posts
            .into_iter()
            .take(POSTS_PER_CHANNEL)
            .map(|post| post_to_item(&feed.tag, post))
            .collect())
    }
}

/// Posts without an explicit title use their first line as the title and the
/// rest as the body.
fn post_to_item(tag: &str, post: ChannelPost) -> Item {
    let (title, body) = if post.title.trim().is_empty() {
        match post.text.split_once('\n') {
            Some((first, rest)) => (first.to_string(), rest.to_string()),
            None => (post.text.clone(), String::new()),
        }
    } else {
        (post.title, post.text)
    };

    let mut item = Item::new(tag, title, body);
    if let Some(date) = post.date {
        item = item.with_timestamp(date);
    }
    item
}

#[async_trait]
impl Collector for ChannelFeedCollector {
    fn name(&self) -> &str {
        "channel-feeds"
    }

    async fn collect(&self) -> Vec<Item> {
        let mut items = Vec::new();
        for feed in &self.feeds {
            match self.fetch_feed(feed).await {
                Ok(posts) => items.extend(posts),
                Err(e) => {
                    tracing::warn!(channel = %feed.tag, error = %e, "Channel feed fetch failed; skipping");
                }
            }
        }
        items
    }
}
