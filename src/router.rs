//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup via [`matchit`]. Each leaf
//! holds the route's [`Queue`]. The router only decides *which* queue runs;
//! everything after that is the queue's job.

use std::collections::HashMap;

use matchit::{InsertError, Router as MatchitRouter};
use percent_encoding::percent_decode_str;

use crate::method::Method;
use crate::queue::Queue;

/// What a lookup found for a (method, path) pair.
pub(crate) enum Lookup<'a> {
    Found(&'a Queue, HashMap<String, String>),
    /// The path exists under other methods, listed in [`Method::ALL`] order.
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

#[derive(Default)]
pub(crate) struct Router {
    routes: HashMap<Method, MatchitRouter<Queue>>,
}

impl Router {
    /// Path parameters use `{name}` syntax, catch-alls `{*name}`.
    pub(crate) fn insert(&mut self, method: Method, path: &str, queue: Queue) -> Result<(), InsertError> {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, queue)
    }

    /// Param values come back percent-decoded; invalid UTF-8 is replaced
    /// with U+FFFD.
    pub(crate) fn lookup(&self, method: Method, path: &str) -> Lookup<'_> {
        if let Some(matched) = self.routes.get(&method).and_then(|tree| tree.at(path).ok()) {
            let params = matched.params.iter()
                .map(|(k, v)| (k.to_owned(), percent_decode_str(v).decode_utf8_lossy().into_owned()))
                .collect();
            return Lookup::Found(matched.value, params);
        }

        let allowed: Vec<Method> = Method::ALL
            .into_iter()
            .filter(|m| *m != method)
            .filter(|m| self.routes.get(m).is_some_and(|tree| tree.at(path).is_ok()))
            .collect();

        if allowed.is_empty() {
            Lookup::NotFound
        } else {
            Lookup::MethodNotAllowed(allowed)
        }
    }
}
