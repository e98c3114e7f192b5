//! Post-login redirect resolution. A requested target can never silently
//! reach a third-party origin: only explicit `http(s)://` URLs pass through
//! unchanged, everything else is joined onto the trusted base origin. This
//! is the open-redirect guard and is a required invariant, not a nicety.

use url::Url;

/// Resolves the navigation target after a successful login.
///
/// - no requested target: the default authenticated landing route;
/// - absolute `http(s)://` target: used as-is (cross-origin hand-off to a
///   calling application);
/// - leading `/`: joined to the trusted base;
/// - anything else, including scheme-less hosts like `evil.example/cb` and
///   non-web schemes: treated as a relative path under the trusted base.
#[must_use]
pub fn resolve_post_login_target(
    redirect: Option<&str>,
    trusted_base: &str,
    dashboard_route: &str,
) -> String {
    let target = redirect.map_or("", str::trim);
    if target.is_empty() {
        return dashboard_route.to_string();
    }

    if let Ok(url) = Url::parse(target) {
        if matches!(url.scheme(), "http" | "https") {
            return target.to_string();
        }
        // Parsed, but not a web origin (javascript:, data:, ...). Fall
        // through so it is joined as an ordinary path.
    }

    let base = trusted_base.trim().trim_end_matches('/');
    if target.starts_with('/') {
        format!("{base}{target}")
    } else {
        format!("{base}/{target}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://console.example.com";

    #[test]
    fn no_target_lands_on_dashboard() {
        assert_eq!(resolve_post_login_target(None, BASE, "/dashboard"), "/dashboard");
        assert_eq!(
            resolve_post_login_target(Some("   "), BASE, "/dashboard"),
            "/dashboard"
        );
    }

    #[test]
    fn absolute_http_targets_pass_through() {
        assert_eq!(
            resolve_post_login_target(Some("https://partner.example/cb"), BASE, "/dashboard"),
            "https://partner.example/cb"
        );
        assert_eq!(
            resolve_post_login_target(Some("http://partner.example/cb"), BASE, "/dashboard"),
            "http://partner.example/cb"
        );
    }

    #[test]
    fn rooted_paths_join_the_trusted_base() {
        assert_eq!(
            resolve_post_login_target(Some("/dashboard/widgets"), BASE, "/dashboard"),
            "https://console.example.com/dashboard/widgets"
        );
    }

    #[test]
    fn schemeless_hosts_never_escape_the_trusted_base() {
        assert_eq!(
            resolve_post_login_target(Some("evil.example/cb"), BASE, "/dashboard"),
            "https://console.example.com/evil.example/cb"
        );
    }

    #[test]
    fn non_web_schemes_are_neutralized() {
        assert_eq!(
            resolve_post_login_target(Some("javascript:alert(1)"), BASE, "/dashboard"),
            "https://console.example.com/javascript:alert(1)"
        );
    }

    #[test]
    fn trailing_slash_on_base_does_not_double() {
        assert_eq!(
            resolve_post_login_target(
                Some("/return"),
                "https://console.example.com/",
                "/dashboard"
            ),
            "https://console.example.com/return"
        );
    }
}
