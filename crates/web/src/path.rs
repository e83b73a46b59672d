//! Path matching of routes.
//!
//! A route path without `{` is compared verbatim against the request path. A
//! path with named segments such as `/post/{id}` is compiled once and yields
//! the captured segments as [`PathParams`] on a match.

use std::fmt;

use micro_gateway::protocol::PathParams;

use crate::router::RouterBuildError;

type InnerRouter = matchit::Router<()>;

pub struct PathPattern {
    path: String,
    kind: PatternKind,
}

enum PatternKind {
    Exact,
    Params(InnerRouter),
}

impl PathPattern {
    /// Compiles a route path, failing when its parameter syntax is invalid.
    pub fn new(path: impl Into<String>) -> Result<Self, RouterBuildError> {
        let path = path.into();
        if !path.contains('{') {
            return Ok(Self { path, kind: PatternKind::Exact });
        }

        let mut inner_router = InnerRouter::new();
        inner_router.insert(path.as_str(), ()).map_err(|e| RouterBuildError::invalid_path(&path, e))?;

        Ok(Self { path, kind: PatternKind::Params(inner_router) })
    }

    /// Matches a request path, returning the captured parameters.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        match &self.kind {
            PatternKind::Exact => (self.path == path).then(PathParams::empty),
            PatternKind::Params(inner_router) => inner_router.at(path).ok().map(|matched| matched.params.iter().collect()),
        }
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.path).finish()
    }
}
