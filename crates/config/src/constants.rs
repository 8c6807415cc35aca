//! Fixed names shared across natstage
//!
//! Environment variable names are kept here so hosts and tests refer to the
//! same spelling.

pub const DEFAULT_TEMP_PREFIX: &str = "natstage-";

pub const ENV_EPHEMERAL: &str = "NATSTAGE_EPHEMERAL";
pub const ENV_TEMP_ROOT: &str = "NATSTAGE_TEMP_ROOT";
pub const ENV_TEMP_PREFIX: &str = "NATSTAGE_TEMP_PREFIX";
pub const ENV_WORKING_DIR: &str = "NATSTAGE_WORKING_DIR";
pub const ENV_REGISTER_SEARCH_PATH: &str = "NATSTAGE_REGISTER_SEARCH_PATH";
pub const ENV_SEARCH_PATH_KEY: &str = "NATSTAGE_SEARCH_PATH_KEY";
pub const ENV_EXPORT_ENV: &str = "NATSTAGE_EXPORT_ENV";
