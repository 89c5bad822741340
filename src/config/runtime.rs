use std::path::PathBuf;

/// Per-invocation options taken from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Captured feed to replay (`.jsonl` or `.jsonl.gz`)
    pub feed_path: Option<PathBuf>,
    /// TOML config; defaults apply when unset
    pub config_path: Option<PathBuf>,
    /// Where the report is written
    pub report_path: PathBuf,
    /// Overrides `filter.max_matches`
    pub max_matches: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            feed_path: None,
            config_path: None,
            report_path: PathBuf::from("replaylens-report.json.gz"),
            max_matches: None,
        }
    }
}

impl RunOptions {
    /// Build from env vars, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let mut opts = Self::default();

        if let Some(v) = lookup("REPLAYLENS_FEED") {
            opts.feed_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("REPLAYLENS_CONFIG") {
            opts.config_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("REPLAYLENS_REPORT") {
            opts.report_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("REPLAYLENS_MAX_MATCHES") {
            if let Ok(n) = v.parse::<usize>() {
                opts.max_matches = Some(n);
            }
        }

        opts
    }
}
