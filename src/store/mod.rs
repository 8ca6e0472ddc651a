pub mod disk;
pub mod memory;

use crate::core::error::ValuationError;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;

pub const HOLDINGS_PARTITION: &str = "holdings";
pub const QUOTES_PARTITION: &str = "quotes";

/// Opens (creating if needed) the fjall keyspace under `path`.
pub fn open_keyspace(path: &Path) -> Result<Keyspace, ValuationError> {
    std::fs::create_dir_all(path).map_err(|e| {
        ValuationError::Storage(format!("cannot create {}: {e}", path.display()))
    })?;
    Ok(fjall::Config::new(path).open()?)
}

pub fn open_partition(keyspace: &Keyspace, name: &str) -> Result<PartitionHandle, ValuationError> {
    Ok(keyspace.open_partition(name, PartitionCreateOptions::default())?)
}
