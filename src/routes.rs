//! Client-side route table and login redirect helpers.
//!
//! The login redirect carries the originating path in a `redirect` query
//! parameter; after sign-in the shell returns there when it names a known
//! route.

use reqwest::Url;

/// Base used only to run relative paths through the URL parser.
const PARSE_BASE: &str = "http://shell.invalid";
pub const REDIRECT_PARAM: &str = "redirect";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppRoute {
    Login,
    Signup,
    ResetPassword,
    Dashboard,
}

impl AppRoute {
    pub const ALL: [AppRoute; 4] = [Self::Login, Self::Signup, Self::ResetPassword, Self::Dashboard];

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Signup => "/signup",
            Self::ResetPassword => "/reset-password",
            Self::Dashboard => "/dashboard",
        }
    }

    /// Only the dashboard requires a signed-in user.
    #[must_use]
    pub fn is_protected(self) -> bool {
        matches!(self, Self::Dashboard)
    }

    /// Match a path (query and fragment ignored, trailing slash tolerated).
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let bare = path.split(['?', '#']).next().unwrap_or_default();
        let bare = if bare.len() > 1 { bare.trim_end_matches('/') } else { bare };
        Self::ALL.into_iter().find(|route| route.path() == bare)
    }
}

/// `/login?redirect=<from>` with `from` form-encoded.
#[must_use]
pub fn login_redirect(from: &str) -> String {
    let login = AppRoute::Login.path();
    match Url::parse_with_params(&format!("{PARSE_BASE}{login}"), &[(REDIRECT_PARAM, from)]) {
        Ok(url) => format!("{}?{}", url.path(), url.query().unwrap_or_default()),
        Err(_) => login.to_owned(),
    }
}

/// Extract the `redirect` parameter from a path such as `/login?redirect=%2Fdashboard`.
#[must_use]
pub fn redirect_param(path_and_query: &str) -> Option<String> {
    let base = Url::parse(PARSE_BASE).ok()?;
    let url = base.join(path_and_query).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == REDIRECT_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// Where to land after a successful sign-in.
///
/// Unknown or public targets fall back to the dashboard so a crafted
/// `redirect` cannot bounce the user back to a form page or off-site.
#[must_use]
pub fn post_login_target(redirect: Option<&str>) -> AppRoute {
    redirect
        .and_then(AppRoute::from_path)
        .filter(|route| route.is_protected())
        .unwrap_or(AppRoute::Dashboard)
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
