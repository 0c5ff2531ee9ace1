/// Version byte prefixed to every v1 thread identifier
pub const THREAD_ID_V1: u8 = 0x01;

/// Variant codes carried in the second byte of a thread identifier
pub const VARIANT_RAW: u8 = 0x55;
pub const VARIANT_ACCESS_CONTROLLED: u8 = 0x70;

/// Default number of random bytes in a freshly minted thread identifier
pub const THREAD_ID_RANDOM_LEN: usize = 32;

/// Ed25519 secret key size in bytes
pub const SECRET_KEY_SIZE: usize = 32;

/// Scope key used for unkeyed records when the default scope is shared
pub const DEFAULT_SCOPE_KEY: &str = "default";

/// Prefixes for derived scope keys
pub const API_KEY_SCOPE_PREFIX: &str = "key:";
pub const OWNER_SCOPE_PREFIX: &str = "owner:";

/// Environment variables read by `RegistryConfig::from_env`
pub const ENV_DB_PATH: &str = "THREADHUB_DB_PATH";
pub const ENV_DEFAULT_SCOPE: &str = "THREADHUB_DEFAULT_SCOPE";
pub const ENV_OP_TIMEOUT_MS: &str = "THREADHUB_OP_TIMEOUT_MS";
pub const ENV_MAX_IDLE_CONNS: &str = "THREADHUB_MAX_IDLE_CONNS";

/// Default number of idle store connections kept by the registry
pub const DEFAULT_MAX_IDLE_CONNS: usize = 4;
