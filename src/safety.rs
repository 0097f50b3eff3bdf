//! Command safety gate
//!
//! A coarse denylist check run before any shell command is launched. Matching
//! is case-insensitive substring containment against the common list plus the
//! list for the current platform. There is no shell tokenization, so this is a
//! speed bump and not an isolation boundary.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Substrings rejected when no policy file can be read
pub const BASELINE_DENYLIST: &[&str] = &[
    "rm -rf", "deltree", "format", "del /s", "del /q", "shutdown", "reboot", "halt",
];

/// Operating platform, selects the platform-specific denylist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
}

impl Platform {
    /// Every non-Windows host uses the `linux` list
    pub fn current() -> Self {
        if cfg!(windows) { Platform::Windows } else { Platform::Linux }
    }
}

/// Denylist loaded once at startup, read-only for the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPolicy {
    #[serde(default)]
    pub common: BTreeSet<String>,
    #[serde(default)]
    pub windows: BTreeSet<String>,
    #[serde(default)]
    pub linux: BTreeSet<String>,
}

impl CommandPolicy {
    /// Hard-coded fallback policy
    pub fn baseline() -> Self {
        Self {
            common: BASELINE_DENYLIST.iter().map(|s| s.to_string()).collect(),
            windows: BTreeSet::new(),
            linux: BTreeSet::new(),
        }
    }

    /// Load the policy, falling back to the baseline when the file is absent or unusable
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::info!("No command policy file configured, using baseline denylist");
            return Self::baseline();
        };

        if !path.exists() {
            log::warn!(
                "Command policy file {} not found, using baseline denylist",
                path.display()
            );
            return Self::baseline();
        }

        match Self::from_file(path) {
            Ok(policy) => {
                log::info!("Loaded command policy from: {}", path.display());
                policy
            }
            Err(e) => {
                log::warn!(
                    "Failed to load command policy from {}: {}; using baseline denylist",
                    path.display(),
                    e
                );
                Self::baseline()
            }
        }
    }

    /// Parse a JSON policy file
    pub fn from_file(path: &Path) -> eyre::Result<Self> {
        let content = fs::read_to_string(path)?;
        let policy: Self = serde_json::from_str(&content)?;
        Ok(policy.without_blank_entries())
    }

    fn without_blank_entries(mut self) -> Self {
        for list in [&mut self.common, &mut self.windows, &mut self.linux] {
            list.retain(|entry| !entry.trim().is_empty());
        }
        self
    }

    /// Union of the common list and the platform list
    pub fn denylist_for(&self, platform: Platform) -> impl Iterator<Item = &str> {
        let platform_list = match platform {
            Platform::Windows => &self.windows,
            Platform::Linux => &self.linux,
        };
        self.common.iter().chain(platform_list.iter()).map(String::as_str)
    }

    /// First denylist entry contained in `command`, if any
    pub fn first_match(&self, command: &str, platform: Platform) -> Option<&str> {
        let command = command.to_lowercase();
        self.denylist_for(platform)
            .find(|entry| command.contains(&entry.to_lowercase()))
    }
}

/// Pure safety check of one command
pub fn is_command_safe(command: &str, policy: &CommandPolicy, platform: Platform) -> bool {
    policy.first_match(command, platform).is_none()
}

/// Policy bound to the platform it runs on
#[derive(Debug, Clone)]
pub struct CommandGate {
    policy: CommandPolicy,
    platform: Platform,
}

impl CommandGate {
    pub fn new(policy: CommandPolicy, platform: Platform) -> Self {
        Self { policy, platform }
    }

    /// Gate for the current host
    pub fn for_current_platform(policy: CommandPolicy) -> Self {
        Self::new(policy, Platform::current())
    }

    pub fn is_safe(&self, command: &str) -> bool {
        is_command_safe(command, &self.policy, self.platform)
    }

    /// `Err` carries the denylist entry that matched
    pub fn check(&self, command: &str) -> Result<(), String> {
        match self.policy.first_match(command, self.platform) {
            Some(entry) => Err(entry.to_string()),
            None => Ok(()),
        }
    }

    pub fn policy(&self) -> &CommandPolicy {
        &self.policy
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}

impl Default for CommandGate {
    fn default() -> Self {
        Self::for_current_platform(CommandPolicy::baseline())
    }
}
