//! Admin user configuration loaded from environment variables.
//!
//! Admin endpoints (order listing, manual status updates, wallet top-ups) are
//! restricted to the external identity ids listed in `ADMIN_USER_IDS`, in
//! addition to any listed under `[server].admin_user_ids` in config.toml.

/// Splits a comma separated id list, trimming whitespace and dropping blanks
/// and duplicates while keeping first-seen order.
#[must_use]
pub fn parse_admin_ids(raw: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in raw.split(',').map(str::trim).filter(|id| !id.is_empty()) {
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }
    ids
}
