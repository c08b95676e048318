//! Saved routes.
//!
//! The whole route list is persisted as a single JSON blob under
//! [`SAVED_ROUTES_KEY`], rewritten on every mutation. A missing or unreadable
//! blob loads as an empty list.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::events::{EventBus, RoutesChanged};
use crate::storage::{KeyValueStore, Value};

/// Key the encoded route list is stored under.
pub const SAVED_ROUTES_KEY: &str = "SavedRoutes";

/// An origin/destination pair entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    /// Starting location label.
    pub from: String,
    /// Destination label.
    pub to: String,
}

impl Route {
    /// Create a route between two labels.
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.from, self.to)
    }
}

/// Encode a route list as a JSON array of `{"from", "to"}` records.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_routes(routes: &[Route]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(routes)?)
}

/// Decode a blob produced by [`encode_routes`].
///
/// # Errors
///
/// Returns an error if the blob is not a JSON array of routes.
pub fn decode_routes(bytes: &[u8]) -> Result<Vec<Route>> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Copy `items` minus the positions in `indices`.
///
/// Returns the kept items, in their original order, and how many were
/// removed. Indices past the end are ignored; repeated indices count once.
pub(crate) fn without_indices<T: Clone>(
    items: &[T],
    indices: impl IntoIterator<Item = usize>,
) -> (Vec<T>, usize) {
    let doomed: BTreeSet<usize> = indices.into_iter().filter(|i| *i < items.len()).collect();
    let kept = items
        .iter()
        .enumerate()
        .filter(|(i, _)| !doomed.contains(i))
        .map(|(_, item)| item.clone())
        .collect();
    (kept, doomed.len())
}

/// Write-through store for the saved route list.
#[derive(Debug)]
pub struct RouteStore {
    backend: Arc<dyn KeyValueStore>,
    routes: Vec<Route>,
    events: EventBus<RoutesChanged>,
}

impl RouteStore {
    /// Load the saved routes from `backend`.
    ///
    /// An absent key, an unreadable entry, a value that is not a data blob,
    /// or a blob that does not decode all yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend itself cannot be read.
    pub fn load(backend: Arc<dyn KeyValueStore>) -> Result<Self> {
        let routes = match backend.get_or_discard(SAVED_ROUTES_KEY)? {
            None => Vec::new(),
            Some(Value::Data(bytes)) => decode_routes(&bytes).unwrap_or_else(|e| {
                warn!("Discarding undecodable saved routes: {}", e);
                Vec::new()
            }),
            Some(other) => {
                warn!(
                    "Discarding saved routes stored as {} instead of data",
                    other.kind()
                );
                Vec::new()
            }
        };

        debug!("Loaded {} saved route(s)", routes.len());
        Ok(Self {
            backend,
            routes,
            events: EventBus::new(),
        })
    }

    /// Subscribe to list changes.
    pub fn subscribe(&self) -> Receiver<RoutesChanged> {
        self.events.subscribe()
    }

    /// All saved routes in order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The route at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Route> {
        self.routes.get(index)
    }

    /// Number of saved routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no routes are saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Append `route` to the end of the list. Duplicates are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted.
    pub fn save_route(&mut self, route: Route) -> Result<()> {
        let mut next = self.routes.clone();
        debug!("Saving route {}", route);
        next.push(route);
        self.replace(next)
    }

    /// Remove the routes at `indices`, keeping the order of the rest.
    /// Out-of-range indices are ignored.
    ///
    /// Returns how many routes were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted.
    pub fn delete_routes(&mut self, indices: impl IntoIterator<Item = usize>) -> Result<usize> {
        let (kept, removed) = without_indices(&self.routes, indices);
        self.replace(kept)?;
        Ok(removed)
    }

    /// Remove every saved route.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted.
    pub fn clear_all(&mut self) -> Result<()> {
        let count = self.routes.len();
        self.replace(Vec::new())?;
        info!("Cleared {} saved route(s)", count);
        Ok(())
    }

    /// Persist `next` as the whole list, then adopt it and notify.
    fn replace(&mut self, next: Vec<Route>) -> Result<()> {
        let blob = encode_routes(&next)?;
        self.backend.set(SAVED_ROUTES_KEY, &Value::Data(blob))?;
        self.routes = next;
        self.events.emit(&RoutesChanged {
            len: self.routes.len(),
        });
        Ok(())
    }
}
