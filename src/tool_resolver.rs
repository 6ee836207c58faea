//! # Tool Path Resolver
//!
//! Finds the external compression tools:
//! - `TOOLS_DIR` environment variable (bundled tools, checked first)
//! - Directories listed in `PATH`

use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Tool path resolver for bundled and system-installed tools
#[derive(Debug, Clone)]
pub struct ToolPathResolver {
    /// Directories searched in order
    search_path: Vec<PathBuf>,
}

impl ToolPathResolver {
    /// Create a resolver from `TOOLS_DIR` and `PATH`
    pub fn new() -> Self {
        let mut search_path = Vec::new();

        if let Some(tools_dir) = env::var_os("TOOLS_DIR") {
            let tools_dir = PathBuf::from(tools_dir);
            debug!("Checking TOOLS_DIR environment variable: {:?}", tools_dir);
            if tools_dir.is_dir() {
                search_path.push(tools_dir);
            }
        }

        if let Some(path) = env::var_os("PATH") {
            search_path.extend(env::split_paths(&path));
        }

        Self { search_path }
    }

    /// Create a resolver that only looks in the given directories
    pub fn with_search_path(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        let tool_with_ext = format!("{}{}", tool_name, env::consts::EXE_SUFFIX);

        let found = self
            .search_path
            .iter()
            .map(|dir| dir.join(&tool_with_ext))
            .find(|path| Self::is_executable(path));

        match &found {
            Some(path) => debug!("Resolved tool: {} -> {:?}", tool_name, path),
            None => debug!("Tool not found: {}", tool_name),
        }
        found
    }

    /// Check if a specific tool is available
    pub fn is_tool_available(&self, tool_name: &str) -> bool {
        self.resolve_tool(tool_name).is_some()
    }

    #[cfg(unix)]
    fn is_executable(path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    fn is_executable(path: &Path) -> bool {
        path.is_file()
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new()
    }
}
