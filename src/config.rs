//! Per-tool defaults and the optional JSON config overlay.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Hard ceiling on the admission gate regardless of what callers ask for.
pub const MAX_CONCURRENCY: usize = 5_000;

/// Largest subnet sweep accepted by default (a /22 worth of hosts).
pub const DEFAULT_MAX_HOSTS: usize = 1024;

/// The tools this crate runs; each has its own defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Sweep,
    Ports,
    Dirs,
    Subdomains,
    Ping,
    Resolve,
}

/// Knobs shared by every run: worker count, per-probe timeout, candidate cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub concurrency: usize,
    pub timeout_ms: u64,
    #[serde(default)]
    pub max_candidates: Option<usize>,
}

impl ToolConfig {
    pub fn for_tool(tool: Tool) -> Self {
        let (concurrency, timeout_ms, max_candidates) = match tool {
            Tool::Sweep => (100, 2_000, Some(DEFAULT_MAX_HOSTS)),
            Tool::Ports => (50, 2_000, None),
            Tool::Dirs => (20, 10_000, None),
            Tool::Subdomains => (50, 5_000, None),
            Tool::Ping => (1, 5_000, None),
            Tool::Resolve => (1, 10_000, None),
        };
        Self {
            concurrency,
            timeout_ms,
            max_candidates,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Apply command-line overrides; zero values are ignored.
    pub fn with_overrides(mut self, concurrency: Option<usize>, timeout_ms: Option<u64>) -> Self {
        if let Some(c) = concurrency.filter(|c| *c > 0) {
            self.concurrency = c;
        }
        if let Some(t) = timeout_ms.filter(|t| *t > 0) {
            self.timeout_ms = t;
        }
        self
    }
}

/// Per-field overrides for one tool. Absent fields keep the tool's default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ToolOverlay {
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub max_candidates: Option<usize>,
}

impl ToolOverlay {
    pub fn apply(&self, mut base: ToolConfig) -> ToolConfig {
        if let Some(c) = self.concurrency {
            base.concurrency = c;
        }
        if let Some(t) = self.timeout_ms {
            base.timeout_ms = t;
        }
        if let Some(m) = self.max_candidates {
            base.max_candidates = Some(m);
        }
        base
    }
}

/// Optional file overlay, merged field by field over each tool's defaults.
///
/// ```json
/// { "sweep": { "concurrency": 200, "max_candidates": 4096 } }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub sweep: Option<ToolOverlay>,
    #[serde(default)]
    pub ports: Option<ToolOverlay>,
    #[serde(default)]
    pub dirs: Option<ToolOverlay>,
    #[serde(default)]
    pub subdomains: Option<ToolOverlay>,
    #[serde(default)]
    pub ping: Option<ToolOverlay>,
    #[serde(default)]
    pub resolve: Option<ToolOverlay>,
}

impl ConfigFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read config file: {}", path.as_ref().display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid config file: {}", path.as_ref().display()))
    }

    pub fn resolve(&self, tool: Tool) -> ToolConfig {
        let section = match tool {
            Tool::Sweep => &self.sweep,
            Tool::Ports => &self.ports,
            Tool::Dirs => &self.dirs,
            Tool::Subdomains => &self.subdomains,
            Tool::Ping => &self.ping,
            Tool::Resolve => &self.resolve,
        };
        let base = ToolConfig::for_tool(tool);
        match section {
            Some(overlay) => overlay.apply(base),
            None => base,
        }
    }
}
