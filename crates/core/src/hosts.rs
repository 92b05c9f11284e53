//! Hosts-table alias installer
//!
//! Adds and removes a `<address> <domain>` mapping in the system hosts file
//! without disturbing unrelated entries. Matching is token-exact: the domain
//! must appear as a whole alias on a non-comment line, never as a substring.
//! Lines may carry comments, leading whitespace, and multiple aliases.

use crate::config::Config;
use crate::errors::{HostsError, MinerError};
use crate::registry::{Integration, IntegrationKind};
use std::path::PathBuf;
use tracing::{debug, info};

/// Hosts-file installer for one domain → address mapping
#[derive(Debug, Clone)]
pub struct HostsAlias {
    path: PathBuf,
    domain: String,
    address: String,
}

impl HostsAlias {
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.hosts_path.clone(),
            domain: config.domain.clone(),
            address: config.host.clone(),
        }
    }

    fn read(&self) -> Result<String, HostsError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            // A missing hosts file is an empty table, not an error
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, content: &str) -> Result<(), HostsError> {
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl Integration for HostsAlias {
    fn kind(&self) -> IntegrationKind {
        IntegrationKind::HostsAlias
    }

    fn install(&self) -> Result<(), MinerError> {
        let content = self.read().map_err(MinerError::from)?;
        if contains_alias(&content, &self.domain) {
            debug!("Hosts entry for {} already present", self.domain);
            return Ok(());
        }
        let updated = append_alias(&content, &self.address, &self.domain);
        self.write(&updated).map_err(MinerError::from)?;
        info!("Added hosts entry: {} -> {}", self.domain, self.address);
        Ok(())
    }

    fn uninstall(&self) -> Result<(), MinerError> {
        let content = self.read().map_err(MinerError::from)?;
        if !contains_alias(&content, &self.domain) {
            debug!("No hosts entry for {}; nothing to remove", self.domain);
            return Ok(());
        }
        let updated = remove_alias(&content, &self.domain);
        self.write(&updated).map_err(MinerError::from)?;
        info!("Removed hosts entry: {}", self.domain);
        Ok(())
    }

    fn is_installed(&self) -> Result<bool, MinerError> {
        let content = self.read().map_err(MinerError::from)?;
        Ok(contains_alias(&content, &self.domain))
    }
}

/// True iff `domain` appears as a whole alias token on a non-comment line
pub fn contains_alias(content: &str, domain: &str) -> bool {
    content.lines().any(|line| line_has_alias(line, domain))
}

fn line_has_alias(line: &str, domain: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return false;
    }
    // Ignore trailing comments on entry lines
    let entry = trimmed.split('#').next().unwrap_or("");
    let mut fields = entry.split_whitespace();
    // First field is the address; aliases follow
    if fields.next().is_none() {
        return false;
    }
    fields.any(|alias| alias == domain)
}

/// Append an `<address> <domain>` line, preserving existing content verbatim
fn append_alias(content: &str, address: &str, domain: &str) -> String {
    let mut updated = content.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(address);
    updated.push(' ');
    updated.push_str(domain);
    updated.push('\n');
    updated
}

/// Remove the domain alias from every entry line it appears on
///
/// A line that only mapped this domain is dropped entirely; a shared line
/// keeps its other aliases. Comments and blank lines pass through untouched.
fn remove_alias(content: &str, domain: &str) -> String {
    let mut result = String::with_capacity(content.len());
    for line in content.lines() {
        if !line_has_alias(line, domain) {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let (entry, comment) = match line.find('#') {
            Some(idx) => (&line[..idx], Some(&line[idx..])),
            None => (line, None),
        };
        let mut fields = entry.split_whitespace();
        let address = fields.next().unwrap_or("");
        let remaining: Vec<&str> = fields.filter(|alias| *alias != domain).collect();
        if remaining.is_empty() {
            // Nothing left but the address; drop the line
            continue;
        }
        result.push_str(address);
        for alias in remaining {
            result.push(' ');
            result.push_str(alias);
        }
        if let Some(comment) = comment {
            result.push(' ');
            result.push_str(comment.trim_end());
        }
        result.push('\n');
    }
    result
}
