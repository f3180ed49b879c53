use axum::http::Method;

use super::gate::Role;

/// One `(method, path pattern) -> minimum role` entry. Patterns are literal
/// segment paths; a `:name` segment matches any single segment.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub method: Method,
    pub pattern: &'static str,
    pub required: Role,
}

impl RouteRule {
    pub fn new(method: Method, pattern: &'static str, required: Role) -> Self {
        Self {
            method,
            pattern,
            required,
        }
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        if self.method != *method {
            return false;
        }

        let mut want = self.pattern.trim_matches('/').split('/');
        let mut got = path.trim_matches('/').split('/');

        loop {
            match (want.next(), got.next()) {
                (None, None) => return true,
                (Some(w), Some(g)) => {
                    if !w.starts_with(':') && w != g {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }
}

/// Static route permission table, built at startup and read-only afterwards.
/// Routes with no entry are public.
#[derive(Debug, Clone)]
pub struct RouteRules {
    rules: Vec<RouteRule>,
}

impl RouteRules {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// The production table. Kept in one place so the protected surface can
    /// be read at a glance.
    pub fn standard() -> Self {
        use Role::*;

        Self::new(vec![
            RouteRule::new(Method::GET, "/setting", Admin),
            RouteRule::new(Method::POST, "/setting", Admin),
            RouteRule::new(Method::PATCH, "/setting", Admin),
            RouteRule::new(Method::DELETE, "/setting/:name", Admin),
            RouteRule::new(Method::GET, "/user/current/session", User),
            RouteRule::new(Method::GET, "/post", User),
            RouteRule::new(Method::POST, "/post", User),
            RouteRule::new(Method::PATCH, "/post/:id/approve", Approver),
        ])
    }

    /// Minimum role for a concrete request, or `None` for public routes.
    pub fn required_role(&self, method: &Method, path: &str) -> Option<Role> {
        self.rules
            .iter()
            .find(|rule| rule.matches(method, path))
            .map(|rule| rule.required)
    }
}
