/// Application name, used for temporary directory prefixes and the user agent.
pub const APP_NAME: &str = "giftwrap";

/// File name of the build descriptor written into a container build context.
pub const DESCRIPTOR_FILE: &str = "Dockerfile";

/// Root directory inside the image that project sources are copied under.
pub const IMAGE_SOURCE_ROOT: &str = "/opt";

/// Daemon connection timeout used when the manifest does not set one.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
