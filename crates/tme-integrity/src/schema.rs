//! Section and field names of the persisted threat-model layout

/// Technical assets, keyed by entity key
pub const TECHNICAL_ASSETS: &str = "technical_assets";
/// Data assets, keyed by entity key (the key may double as an anchor)
pub const DATA_ASSETS: &str = "data_assets";
/// Trust boundaries, keyed by entity key
pub const TRUST_BOUNDARIES: &str = "trust_boundaries";
/// Shared runtimes, keyed by entity key
pub const SHARED_RUNTIMES: &str = "shared_runtimes";
/// Communication links, nested under a technical asset or top-level
pub const COMMUNICATION_LINKS: &str = "communication_links";
/// Document-wide tag list
pub const TAGS_AVAILABLE: &str = "tags_available";
/// Risk tracking entries, keyed by `category@id[@id...]`
pub const RISK_TRACKING: &str = "risk_tracking";

/// Stable identifier field of every entity
pub const ID: &str = "id";
/// Tag list of an entity
pub const TAGS: &str = "tags";
/// Link target (technical asset id)
pub const TARGET: &str = "target";

/// Data asset ids processed by a technical asset
pub const DATA_ASSETS_PROCESSED: &str = "data_assets_processed";
/// Data asset ids stored by a technical asset
pub const DATA_ASSETS_STORED: &str = "data_assets_stored";
/// Data asset ids sent over a link
pub const DATA_ASSETS_SENT: &str = "data_assets_sent";
/// Data asset ids received over a link
pub const DATA_ASSETS_RECEIVED: &str = "data_assets_received";
/// Technical asset ids inside a trust boundary
pub const TECHNICAL_ASSETS_INSIDE: &str = "technical_assets_inside";
/// Trust boundary ids nested in a trust boundary
pub const TRUST_BOUNDARIES_NESTED: &str = "trust_boundaries_nested";
/// Technical asset ids running on a shared runtime
pub const TECHNICAL_ASSETS_RUNNING: &str = "technical_assets_running";

/// Separator inside synthetic risk ids
pub const RISK_ID_SEPARATOR: char = '@';
