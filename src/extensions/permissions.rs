//! Permission tokens and the capability → permission map.
//!
//! Permissions are opaque string tokens granted per extension and stored in
//! its sandbox context. Capabilities are the names the action executor (and
//! the permission-checked API layer) hand to the capability bridge. This
//! module is the single place that says which token a capability requires.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Write to the system clipboard.
pub const WRITE_CLIPBOARD: &str = "write:clipboard";

/// Read the system clipboard.
pub const READ_CLIPBOARD: &str = "read:clipboard";

/// Open URLs / make network requests through the host.
pub const NETWORK_REQUEST: &str = "network:request";

/// Show system notifications.
pub const SHOW_NOTIFICATION: &str = "show:notification";

/// Capabilities that require a permission token. Capabilities absent from
/// this map (display surfaces, the custom slot) are not gated.
static REQUIRED_TOKENS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("clipboard.write", WRITE_CLIPBOARD),
        ("clipboard.write.fallback", WRITE_CLIPBOARD),
        ("clipboard.read", READ_CLIPBOARD),
        ("url.open", NETWORK_REQUEST),
    ])
});

/// Look up the permission token a capability requires, if any.
pub fn required_permission(capability: &str) -> Option<&'static str> {
    REQUIRED_TOKENS.get(capability).copied()
}

/// Human-readable description of a permission token.
pub fn permission_description(token: &str) -> &'static str {
    match token {
        WRITE_CLIPBOARD => "Write to the system clipboard",
        READ_CLIPBOARD => "Read the system clipboard",
        NETWORK_REQUEST => "Open URLs and make network requests",
        SHOW_NOTIFICATION => "Show system notifications",
        _ => "Unknown permission",
    }
}
