// Copyright 2026 The Matrix.org Foundation C.I.C.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-session input configuration and the explicit presentation theme.

use std::collections::BTreeSet;

use serde::Deserialize;
use url::{Host, Url};

use crate::attachments::PlayPolicy;
use crate::error::ConfigError;

/// Which key combination sends the message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendShortcut {
    /// Enter sends, Shift+Enter or Option+Enter inserts a line break.
    #[default]
    Enter,
    /// Command+Enter sends, Enter inserts a line break.
    CommandEnter,
}

/// Configuration owned by one [`InputInteractions`](crate::InputInteractions).
///
/// Every field has a default, so a TOML file only needs the keys it
/// overrides:
///
/// ```
/// let config = chat_input::InputConfig::from_toml_str(
///     r#"
///     max_input_length = 4096
///     allowed_link_hosts = ["example.org"]
///     "#,
/// )
/// .unwrap();
/// assert_eq!(config.max_input_length, 4096);
/// assert!(config.input_enabled);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub max_height: f64,
    pub min_height: f64,
    pub max_input_length: usize,
    pub supports_continuity_camera: bool,
    pub input_enabled: bool,
    pub can_transform: bool,
    /// Only character formatting and clear; no links or quotes.
    pub simple_transform_only: bool,
    pub emoji_play_policy: PlayPolicy,
    /// Render emoji as still images.
    pub emoji_lite_mode: bool,
    /// Link hosts accepted from the link editor. Empty means any host.
    pub allowed_link_hosts: BTreeSet<String>,
    pub send_shortcut: SendShortcut,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_height: 50.0,
            min_height: 50.0,
            max_input_length: 100_000,
            supports_continuity_camera: false,
            input_enabled: true,
            can_transform: true,
            simple_transform_only: false,
            emoji_play_policy: PlayPolicy::Loop,
            emoji_lite_mode: false,
            allowed_link_hosts: BTreeSet::new(),
            send_shortcut: SendShortcut::Enter,
        }
    }
}

impl InputConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_height > self.max_height {
            return Err(ConfigError::HeightRange {
                min: self.min_height,
                max: self.max_height,
            });
        }
        for host in &self.allowed_link_hosts {
            if Host::parse(host).is_err() {
                return Err(ConfigError::InvalidHost(host.clone()));
            }
        }
        Ok(())
    }

    /// Whether `url` may be attached as a link. A host matches itself and
    /// its subdomains.
    pub fn allows_link(&self, url: &Url) -> bool {
        if self.allowed_link_hosts.is_empty() {
            return true;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.allowed_link_hosts.iter().any(|allowed| {
            let allowed = allowed.to_ascii_lowercase();
            host == allowed || host.ends_with(&format!(".{allowed}"))
        })
    }
}

/// Colours and metrics for rendering the input, passed in explicitly.
///
/// Colours are ARGB.
#[derive(Clone, Debug, PartialEq)]
pub struct InputTheme {
    pub font_size: f32,
    pub text_color: u32,
    pub accent_color: u32,
    pub gray_text_color: u32,
}

impl Default for InputTheme {
    fn default() -> Self {
        Self {
            font_size: 13.0,
            text_color: 0xFF00_0000,
            accent_color: 0xFF2A_9EF1,
            gray_text_color: 0xFF8E_8E93,
        }
    }
}

impl InputTheme {
    /// Side of the square an inline emoji is drawn in: one line of text
    /// plus a 1.5 point overhang on each edge.
    pub fn emoji_size(&self) -> f32 {
        self.font_size + 3.0
    }
}
