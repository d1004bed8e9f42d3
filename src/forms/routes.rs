//! Where to send a user once a feature has been unlocked.

/// Route used for any feature without a dedicated page.
pub const DEFAULT_ROUTE: &str = "/";

/// Maps a feature id to the UI route that hosts it.
#[must_use]
pub fn redirect_path(feature_id: &str) -> &'static str {
    match feature_id {
        "pitch-to-grant" => "/pitch-to-grant",
        "application-tracker" => "/grants/applications",
        "grant-matching" => "/grants",
        "deal-flow" => "/catalyzor/deal-flow",
        _ => DEFAULT_ROUTE,
    }
}
