//! Engine settings.
//!
//! Defaults cover the GBT SDFITS conventions, so `Settings::default()` is all most
//! sessions need. A site can override them from a file (any format the `config` crate
//! understands) and from `OBSEL_*` environment variables, e.g. `OBSEL_TAG_LENGTH=12`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Result, SelectionError};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of hex characters kept from the criteria digest when a rule gets no tag.
    pub tag_length: usize,
    /// Columns whose values are angles and get converted to decimal degrees.
    pub coordinate_columns: Vec<String>,
    /// Aliases registered when a selection is created, alias -> column.
    pub aliases: BTreeMap<String, String>,
    /// Characters text criteria may not contain. Empty means anything goes.
    pub disallowed_chars: String,
    /// Column used by time selections.
    pub time_column: String,
}

impl Default for Settings {
    fn default() -> Self {
        let aliases = [
            ("freq", "crval1"),
            ("ra", "crval2"),
            ("dec", "crval3"),
            ("glon", "crval2"),
            ("glat", "crval3"),
            ("gallon", "crval2"),
            ("gallat", "crval3"),
            ("elevation", "elevatio"),
            ("source", "object"),
            ("pol", "plnum"),
        ]
        .into_iter()
        .map(|(a, c)| (a.to_string(), c.to_string()))
        .collect();
        Self {
            tag_length: 9,
            coordinate_columns: ["RA", "DEC", "GALLON", "GALLAT", "GLON", "GLAT", "CRVAL2", "CRVAL3"]
                .into_iter()
                .map(String::from)
                .collect(),
            aliases,
            disallowed_chars: String::new(),
            time_column: "DATE-OBS".to_string(),
        }
    }
}

impl Settings {
    /// The length of a full BLAKE3 hex digest.
    pub const MAX_TAG_LENGTH: usize = 64;

    /// Loads settings from `path` (which may be missing) layered with the environment.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("OBSEL")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("coordinate_columns"),
            )
            .build()?
            .try_deserialize::<Settings>()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tag_length == 0 || self.tag_length > Self::MAX_TAG_LENGTH {
            return Err(SelectionError::Config(format!(
                "tag_length must be between 1 and {}, got {}",
                Self::MAX_TAG_LENGTH,
                self.tag_length
            )));
        }
        if self.time_column.trim().is_empty() {
            return Err(SelectionError::Config("time_column must not be empty".into()));
        }
        Ok(())
    }

    pub fn is_coordinate(&self, column: &str) -> bool {
        self.coordinate_columns
            .iter()
            .any(|c| c.eq_ignore_ascii_case(column))
    }
}
