use std::collections::HashMap;

use crate::http::handler::HandlerFunc;
use crate::http::method::Method;

/// Exact-match route table: one handler per (method, path) key.
///
/// The table is populated before the server starts and then moved into the
/// `Server`, which only hands out shared references — workers read it
/// concurrently without locking because nothing can mutate it afterwards.
#[derive(Default)]
pub struct Router {
    routes: HashMap<(Method, String), HandlerFunc>,
}

impl Router {
    pub fn new() -> Router {
        Router {
            routes: HashMap::new(),
        }
    }

    /// Registers a handler for an exact (method, path) key. Registering the
    /// same key again silently replaces the previous handler.
    pub fn register(&mut self, method: Method, path: &str, f: HandlerFunc) {
        self.routes.insert((method, path.to_string()), f);
    }

    /// Looks up the handler for a query-stripped path. A miss is not an
    /// error; the caller falls back to static resolution.
    pub fn lookup(&self, method: Method, path: &str) -> Option<&HandlerFunc> {
        self.routes.get(&(method, path.to_string()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handler::{Body, Headers, Payload};

    #[test]
    fn lookup_miss_is_none() {
        let router = Router::new();
        assert!(router.lookup(Method::GET, "/nope").is_none());
    }

    #[test]
    fn exact_match_only() {
        let mut router = Router::new();
        router.register(
            Method::GET,
            "/list",
            Box::new(|_: &Headers, _: &Body| Ok(Payload::Text("list".into()))),
        );

        assert!(router.lookup(Method::GET, "/list").is_some());
        assert!(router.lookup(Method::POST, "/list").is_none());
        assert!(router.lookup(Method::GET, "/list/").is_none());
    }

    #[test]
    fn re_registration_replaces_previous_handler() {
        let mut router = Router::new();
        router.register(
            Method::GET,
            "/version",
            Box::new(|_: &Headers, _: &Body| Ok(Payload::Text("v1".into()))),
        );
        router.register(
            Method::GET,
            "/version",
            Box::new(|_: &Headers, _: &Body| Ok(Payload::Text("v2".into()))),
        );

        assert_eq!(router.len(), 1);
        let f = router.lookup(Method::GET, "/version").unwrap();
        let out = f(&Headers::default(), &Body::Empty).unwrap();
        assert_eq!(out, Payload::Text("v2".into()));
    }
}
