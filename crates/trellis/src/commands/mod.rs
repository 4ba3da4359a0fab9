//! Command implementations that work on the filesystem rather than a store.

pub mod init;

pub use init::{
    find_trellis_root, init, is_initialized, BackendKind, HistoryConfig, InitResult,
    RemoteSettings, StorageConfig, TrellisConfig, CONFIG_FILE_NAME, TRELLIS_DIR_NAME,
};
