//! Prometheus counters for board activity.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CommandLabels {
    pub command: String,
    pub outcome: String,
}

pub struct BoardMetrics {
    registry: Registry,
    posts: Counter,
    commands: Family<CommandLabels, Counter>,
    rate_limited: Counter,
    pruned: Counter,
}

impl BoardMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("board");
        let posts = Counter::default();
        let commands = Family::<CommandLabels, Counter>::default();
        let rate_limited = Counter::default();
        let pruned = Counter::default();

        registry.register("posts", "Ordinary posts stored", posts.clone());
        registry.register("commands", "Moderation commands by outcome", commands.clone());
        registry.register(
            "rate_limited",
            "Submissions rejected by the rate limiter",
            rate_limited.clone(),
        );
        registry.register("pruned_posts", "Posts removed by retention", pruned.clone());

        Self {
            registry,
            posts,
            commands,
            rate_limited,
            pruned,
        }
    }

    pub fn post_stored(&self, pruned: u64) {
        self.posts.inc();
        if pruned > 0 {
            self.pruned.inc_by(pruned);
        }
    }

    pub fn command(&self, command: &str, outcome: &str) {
        self.commands
            .get_or_create(&CommandLabels {
                command: command.to_string(),
                outcome: outcome.to_string(),
            })
            .inc();
    }

    pub fn rate_limited(&self) {
        self.rate_limited.inc();
    }

    /// OpenMetrics text exposition.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

impl Default for BoardMetrics {
    fn default() -> Self {
        Self::new()
    }
}
