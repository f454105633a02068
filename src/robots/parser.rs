//! Robots.txt rules
//!
//! Allow/Disallow matching is delegated to the robotstxt crate; Crawl-delay is
//! read here since that crate ignores it.

use robotstxt::DefaultMatcher;

/// The rules a host publishes in its robots.txt
#[derive(Debug, Clone)]
pub struct RobotsRules {
    content: String,
    allow_all: bool,
}

impl RobotsRules {
    /// Builds rules from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Rules that permit everything
    ///
    /// Used when a host has no robots.txt or it cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks whether `agent` may fetch `url`
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL or path to check
    /// * `agent` - The crawler's product token (e.g. `LeichteSpracheBot`)
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        if self.allow_all || self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url)
    }

    /// Returns the Crawl-delay (seconds) that applies to `agent`
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, agent: &str) -> Option<f64> {
        if self.allow_all {
            return None;
        }

        let agent = agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut in_agent_lines = false;
        let mut wildcard_delay = None;
        let mut agent_delay = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                // a user-agent line after rules opens a new group
                if !in_agent_lines {
                    group.clear();
                }
                group.push(value.to_lowercase());
                in_agent_lines = true;
                continue;
            }
            in_agent_lines = false;

            if key != "crawl-delay" {
                continue;
            }
            let Ok(delay) = value.parse::<f64>() else {
                continue;
            };

            if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                agent_delay = Some(delay);
            } else if group.iter().any(|ua| ua == "*") {
                wildcard_delay = Some(delay);
            }
        }

        agent_delay.or(wildcard_delay)
    }
}
