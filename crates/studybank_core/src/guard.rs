//! crates/studybank_core/src/guard.rs
//!
//! Navigation gate. Decides from the stored credential alone whether a view
//! may be entered; the server is not consulted.

use crate::domain::Id;
use crate::ports::KeyValueStore;
use crate::session::TOKEN_KEY;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Register,
    Dashboard,
    Questions,
    QuestionUpload,
    QuestionDetail(Id),
    NotFound(String),
}

impl Route {
    /// The view authenticated users land on.
    pub const DEFAULT: Route = Route::Dashboard;

    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Root,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["dashboard"] => Route::Dashboard,
            ["questions"] => Route::Questions,
            ["questions", "upload"] => Route::QuestionUpload,
            ["questions", id] => match id.parse() {
                Ok(id) => Route::QuestionDetail(id),
                Err(_) => Route::NotFound(path.to_string()),
            },
            _ => Route::NotFound(path.to_string()),
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Route::Dashboard | Route::Questions | Route::QuestionUpload | Route::QuestionDetail(_)
        )
    }

    /// Login and registration forms, which a signed-in user skips.
    pub fn is_auth_form(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Root => f.write_str("/"),
            Route::Login => f.write_str("/login"),
            Route::Register => f.write_str("/register"),
            Route::Dashboard => f.write_str("/dashboard"),
            Route::Questions => f.write_str("/questions"),
            Route::QuestionUpload => f.write_str("/questions/upload"),
            Route::QuestionDetail(id) => write!(f, "/questions/{}", id),
            Route::NotFound(path) => f.write_str(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(Route),
}

pub struct RouteGuard {
    storage: Arc<dyn KeyValueStore>,
}

impl RouteGuard {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    fn has_credential(&self) -> bool {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.is_some_and(|t| !t.is_empty()),
            Err(e) => {
                warn!("Failed to read stored credential: {}", e);
                false
            }
        }
    }

    /// Decides a single navigation step.
    pub fn check(&self, target: &Route) -> Navigation {
        if *target == Route::Root {
            return Navigation::Redirect(Route::DEFAULT);
        }

        let signed_in = self.has_credential();
        if target.requires_auth() && !signed_in {
            Navigation::Redirect(Route::Login)
        } else if target.is_auth_form() && signed_in {
            Navigation::Redirect(Route::DEFAULT)
        } else {
            Navigation::Proceed
        }
    }

    /// Follows redirects from `path` to the view that will be rendered.
    pub fn resolve(&self, path: &str) -> Route {
        let mut route = Route::parse(path);
        // Redirect chains are at most two steps long.
        for _ in 0..4 {
            match self.check(&route) {
                Navigation::Proceed => break,
                Navigation::Redirect(next) => route = next,
            }
        }
        route
    }
}
