// Copyright (C) 2025 Kashin Vladislav (Rust adaptation author)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("An error occurred while trying to create regex: {0}")]
pub struct InvalidRegexError(#[from] regex::Error);

/// Thread-safe memo of compiled metadata patterns.
///
/// Patterns are stored twice at most: once as given (used for prefix
/// consumption) and once wrapped as `^(?:...)$` for full matches, because
/// `regex` has no "match the whole haystack" mode for an already compiled
/// expression.
pub struct RegexCache {
    cache: DashMap<String, Arc<regex::Regex>>,
    anchored_cache: DashMap<String, Arc<regex::Regex>>,
}

impl RegexCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: DashMap::with_capacity(capacity),
            anchored_cache: DashMap::with_capacity(capacity),
        }
    }

    pub fn get_regex(&self, pattern: &str) -> Result<Arc<regex::Regex>, InvalidRegexError> {
        Self::get_or_compile(&self.cache, pattern, || pattern.to_owned())
    }

    /// Returns the regex matching `pattern` against a whole string only.
    pub fn get_anchored_regex(&self, pattern: &str) -> Result<Arc<regex::Regex>, InvalidRegexError> {
        Self::get_or_compile(&self.anchored_cache, pattern, || {
            fast_cat::concat_str!("^(?:", pattern, ")$")
        })
    }

    fn get_or_compile(
        cache: &DashMap<String, Arc<regex::Regex>>,
        pattern: &str,
        source: impl FnOnce() -> String,
    ) -> Result<Arc<regex::Regex>, InvalidRegexError> {
        if let Some(regex) = cache.get(pattern) {
            return Ok(regex.value().clone());
        }
        let entry = cache
            .entry(pattern.to_string())
            .or_try_insert_with(|| regex::Regex::new(&source()).map(Arc::new))?;
        Ok(entry.value().clone())
    }
}
