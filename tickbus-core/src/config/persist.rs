//! Binary configuration storage
//!
//! Boards without a filesystem keep their [`BoardConfig`] as postcard
//! binary. Decoding checks the version and validates before handing the
//! config out.

use super::types::{BoardConfig, ConfigError, CONFIG_VERSION};

/// Serialize a board config into `buf`, returning the used prefix
pub fn encode<'a>(config: &BoardConfig, buf: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
    postcard::to_slice(config, buf).map_err(|_| ConfigError::Encode)
}

/// Deserialize and validate a board config
pub fn decode(bytes: &[u8]) -> Result<BoardConfig, ConfigError> {
    let config: BoardConfig = postcard::from_bytes(bytes).map_err(|_| ConfigError::Decode)?;
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::VersionMismatch);
    }
    config.validate()?;
    Ok(config)
}
