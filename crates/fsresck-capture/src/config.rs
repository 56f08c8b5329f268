//! Validation of the capture plugin's `key=value` configuration surface.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// The two recognized configuration keys: `disk=<path>` and `log=<path>`. Any other key is a hard
/// `BadArgument` error, not a silently ignored one.
#[derive(Debug, Clone)]
pub struct Config {
    pub disk: PathBuf,
    pub log: PathBuf,
}

impl Config {
    /// Parse `key=value` pairs as handed to the plugin by its host. Both `disk` and `log` are
    /// required; any other key is rejected.
    pub fn parse<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut disk = None;
        let mut log = None;

        for (key, value) in pairs {
            match key {
                "disk" => disk = Some(PathBuf::from(value)),
                "log" => log = Some(PathBuf::from(value)),
                other => return Err(Error::BadArgument(format!("unknown configuration key {other:?}"))),
            }
        }

        let disk = disk.ok_or_else(|| Error::BadArgument("missing required key \"disk\"".into()))?;
        let log = log.ok_or_else(|| Error::BadArgument("missing required key \"log\"".into()))?;
        Ok(Self { disk, log })
    }
}
