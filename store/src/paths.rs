use std::path::{Path, PathBuf};

use networks::{NetworkParams, NetworkRegistry, TESTNET};

/// Directory name of the database inside the network's data directory.
pub const DB_NAME: &str = "anchorage.db";

/// Resolves the database directory for a network.
///
/// The default network lives directly under the data directory; the
/// testnet keeps its historical `testnet3` subdirectory; every other
/// network gets a subdirectory named after it.
pub fn database_path(registry: &NetworkRegistry, params: &NetworkParams, data_dir: &Path) -> PathBuf {
    if registry.is_default(&params.name) {
        data_dir.join(DB_NAME)
    } else if params.name == TESTNET {
        data_dir.join("testnet3").join(DB_NAME)
    } else {
        data_dir.join(&params.name).join(DB_NAME)
    }
}
