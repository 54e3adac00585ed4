// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Provider role - offers services, reports location, receives dispatches
pub const ROLE_PROVIDER: &str = "provider";

/// Client role - posts gigs and emergency requests
#[allow(dead_code)]
pub const ROLE_CLIENT: &str = "client";

/// Admin role - platform operations
#[allow(dead_code)]
pub const ROLE_ADMIN: &str = "admin";
