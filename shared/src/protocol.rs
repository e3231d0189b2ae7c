/// Unique id of the system that carries dashboard configuration on a node
pub const CONFIG_SYSTEM_UID: &str = "urn:ornl:client:configs";

/// Output name of the configuration datastream within that system
pub const CONFIG_OUTPUT_NAME: &str = "config";

/// Query parameters used against the Connected Systems API
pub const QUERY_UID: &str = "uid";
pub const QUERY_OUTPUT_NAME: &str = "outputName";
pub const QUERY_RESULT_TIME: &str = "resultTime";
pub const QUERY_LIMIT: &str = "limit";

/// `resultTime` filter value selecting the newest observation
pub const RESULT_TIME_LATEST: &str = "latest";

/// Path segments
pub const SYSTEMS_PATH: &str = "/systems";
pub const DATASTREAMS_PATH: &str = "/datastreams";
pub const OBSERVATIONS_PATH: &str = "/observations";

/// User recorded when the dashboard has no active user
pub const UNKNOWN_USER: &str = "Unknown";
