use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::net::{Format, Paster, PetriNet, Rgb, Token};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_token")]
    pub default_token: String,
    #[serde(default)]
    pub default_token_color: Rgb,
    #[serde(default = "default_place_prefix")]
    pub place_prefix: String,
    #[serde(default = "default_transition_prefix")]
    pub transition_prefix: String,
    #[serde(default)]
    pub paste_offset: [f64; 2],
    #[serde(default)]
    pub format: Format,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_token: default_token(),
            default_token_color: Rgb::BLACK,
            place_prefix: default_place_prefix(),
            transition_prefix: default_transition_prefix(),
            paste_offset: [0.0, 0.0],
            format: Format::default(),
        }
    }
}

impl EngineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn token(&self) -> Token {
        Token::new(self.default_token.as_str(), self.default_token_color)
    }

    /// Empty net holding the configured default token.
    pub fn new_net(&self) -> PetriNet {
        PetriNet::with_token(self.token())
    }

    pub fn paster(&self) -> Paster {
        Paster::new(self.place_prefix.as_str(), self.transition_prefix.as_str())
            .with_offset(self.paste_offset[0], self.paste_offset[1])
    }
}

fn default_token() -> String {
    crate::net::DEFAULT_TOKEN.to_string()
}

fn default_place_prefix() -> String {
    "P".to_string()
}

fn default_transition_prefix() -> String {
    "T".to_string()
}
