use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use models::{CollectionPage, CollectionQuery};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::Resource;
use crate::client::ApiClient;
use crate::errors::AdminError;
use crate::observability::STALE_RESPONSES_TOTAL;

/// What a view currently shows. Loading and errored states keep the last
/// good page so the table does not blank out.
#[derive(Debug)]
pub enum ViewState<R> {
    Idle,
    Loading { previous: Option<Arc<CollectionPage<R>>> },
    Ready(Arc<CollectionPage<R>>),
    Errored { message: String, previous: Option<Arc<CollectionPage<R>>> },
}

impl<R> Clone for ViewState<R> {
    fn clone(&self) -> Self {
        match self {
            ViewState::Idle => ViewState::Idle,
            ViewState::Loading { previous } => ViewState::Loading { previous: previous.clone() },
            ViewState::Ready(page) => ViewState::Ready(page.clone()),
            ViewState::Errored { message, previous } => {
                ViewState::Errored { message: message.clone(), previous: previous.clone() }
            }
        }
    }
}

impl<R> ViewState<R> {
    /// The page on screen, current or retained.
    pub fn page(&self) -> Option<&Arc<CollectionPage<R>>> {
        match self {
            ViewState::Idle => None,
            ViewState::Ready(page) => Some(page),
            ViewState::Loading { previous } | ViewState::Errored { previous, .. } => previous.as_ref(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Errored { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Outcome of [`CollectionView::resolve`].
#[derive(Debug)]
pub enum Resolution<R> {
    /// A request was issued and its page applied.
    Fetched(Arc<CollectionPage<R>>),
    /// The current tuple was already resolved; nothing was sent.
    Unchanged,
    /// A request for the current tuple is already outstanding.
    Pending,
    /// The response arrived after the query moved on and was dropped.
    Discarded,
}

struct Inner<R> {
    query: CollectionQuery,
    state: ViewState<R>,
    /// Outstanding request per tuple, keyed to the ticket that owns it.
    in_flight: HashMap<CollectionQuery, u64>,
    next_ticket: u64,
    /// Last applied tuple and the resource epoch it was fetched under.
    resolved: Option<(CollectionQuery, u64)>,
    known_total_pages: Option<u32>,
}

impl<R> Inner<R> {
    /// Release `ticket` if it still owns `query`. Returns whether it did.
    fn release(&mut self, query: &CollectionQuery, ticket: u64) -> bool {
        if self.in_flight.get(query) != Some(&ticket) {
            return false;
        }
        self.in_flight.remove(query);
        true
    }

    /// Leave `Loading` when nothing is outstanding for the current tuple.
    fn settle(&mut self) {
        if self.in_flight.contains_key(&self.query) {
            return;
        }
        if let ViewState::Loading { previous } = &self.state {
            self.state = match previous.clone() {
                Some(page) => ViewState::Ready(page),
                None => ViewState::Idle,
            };
        }
    }
}

/// Holds a tuple's in-flight slot for one `resolve()` call and gives it
/// back if that call is dropped before the response is applied.
struct InFlight<'a, R> {
    inner: &'a Mutex<Inner<R>>,
    query: CollectionQuery,
    ticket: u64,
    armed: bool,
}

impl<R> Drop for InFlight<'_, R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.release(&self.query, self.ticket) {
            debug!(page = self.query.page(), "fetch abandoned");
            inner.settle();
        }
    }
}

/// One paginated, filterable listing bound to a [`Resource`].
pub struct CollectionView<R> {
    resource: Resource,
    client: Arc<ApiClient>,
    inner: Mutex<Inner<R>>,
}

impl<R> CollectionView<R>
where
    R: DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(resource: Resource, client: Arc<ApiClient>) -> Self {
        Self::with_query(resource, client, CollectionQuery::default())
    }

    pub fn with_query(resource: Resource, client: Arc<ApiClient>, query: CollectionQuery) -> Self {
        let inner = Inner {
            query,
            state: ViewState::Idle,
            in_flight: HashMap::new(),
            next_ticket: 0,
            resolved: None,
            known_total_pages: None,
        };
        Self { resource, client, inner: Mutex::new(inner) }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    fn lock(&self) -> MutexGuard<'_, Inner<R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn query(&self) -> CollectionQuery {
        self.lock().query.clone()
    }

    pub async fn state(&self) -> ViewState<R> {
        self.lock().state.clone()
    }

    pub async fn known_total_pages(&self) -> Option<u32> {
        self.lock().known_total_pages
    }

    /// Set (or clear, with an empty value) one filter; back to page 1.
    pub async fn set_filter(&self, name: &str, value: &str) -> Result<CollectionQuery, AdminError> {
        if !self.resource.filters().contains(&name) {
            return Err(AdminError::Validation(format!("{} cannot be filtered by {name}", self.resource)));
        }
        let mut inner = self.lock();
        inner.query.set_filter(name, value);
        inner.known_total_pages = None;
        Ok(inner.query.clone())
    }

    /// Replace the search term; back to page 1.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use models::CollectionQuery;
    /// use service::auth::repository::mock::MemorySessionRepository;
    /// use service::transport::mock::MockTransport;
    /// use service::{ApiClient, CollectionView, Resource, SessionManager};
    ///
    /// let transport = Arc::new(MockTransport::new());
    /// let session = Arc::new(SessionManager::new(Arc::new(MemorySessionRepository::default()), transport.clone()));
    /// let client = Arc::new(ApiClient::new(transport, session));
    /// let view: CollectionView<serde_json::Value> =
    ///     CollectionView::with_query(Resource::Users, client, CollectionQuery::new().with_page(2));
    /// let key = tokio_test::block_on(view.set_search("john")).unwrap();
    /// assert_eq!(key, CollectionQuery::new().with_search("john"));
    /// ```
    pub async fn set_search(&self, term: &str) -> Result<CollectionQuery, AdminError> {
        if !self.resource.supports_search() {
            return Err(AdminError::Validation(format!("{} cannot be searched", self.resource)));
        }
        let mut inner = self.lock();
        inner.query.set_search(term);
        inner.known_total_pages = None;
        Ok(inner.query.clone())
    }

    /// Move to page `n`. Out-of-range pages are refused locally.
    pub async fn set_page(&self, n: u32) -> Result<CollectionQuery, AdminError> {
        let mut inner = self.lock();
        if n < 1 {
            return Err(AdminError::Validation("page must be at least 1".into()));
        }
        if let Some(total) = inner.known_total_pages {
            if n > total.max(1) {
                return Err(AdminError::Validation(format!("page {n} is past the last page ({total})")));
            }
        }
        inner.query.set_page(n);
        Ok(inner.query.clone())
    }

    pub async fn next_page(&self) -> Result<CollectionQuery, AdminError> {
        let current = self.lock().query.page();
        self.set_page(current.saturating_add(1)).await
    }

    pub async fn previous_page(&self) -> Result<CollectionQuery, AdminError> {
        let current = self.lock().query.page();
        self.set_page(current.saturating_sub(1)).await
    }

    /// Make sure the current tuple is fetched. At most one request per tuple
    /// is issued; a response for a tuple that is no longer current is dropped.
    /// Dropping the returned future releases the tuple for the next call.
    #[instrument(skip(self), fields(resource = %self.resource))]
    pub async fn resolve(&self) -> Result<Resolution<R>, AdminError> {
        let epoch = self.client.epoch(self.resource);
        let mut guard = {
            let mut inner = self.lock();
            let query = inner.query.clone();
            if inner.resolved.as_ref() == Some(&(query.clone(), epoch)) {
                return Ok(Resolution::Unchanged);
            }
            if inner.in_flight.contains_key(&query) {
                return Ok(Resolution::Pending);
            }
            inner.next_ticket += 1;
            let ticket = inner.next_ticket;
            inner.in_flight.insert(query.clone(), ticket);
            let previous = inner.state.page().cloned();
            inner.state = ViewState::Loading { previous };
            InFlight { inner: &self.inner, query, ticket, armed: true }
        };

        let query = guard.query.clone();
        debug!(page = query.page(), search = query.search(), "fetching page");
        let result = self.client.fetch_page::<R>(self.resource, &query).await;
        guard.armed = false;

        let mut inner = self.lock();
        let owned = inner.release(&query, guard.ticket);
        if !owned || inner.query != query {
            STALE_RESPONSES_TOTAL.inc();
            debug!(page = query.page(), "discarding response for superseded query");
            inner.settle();
            return Ok(Resolution::Discarded);
        }
        inner.resolved = Some((query, epoch));
        match result {
            Ok(page) => {
                let page = Arc::new(page);
                inner.known_total_pages = Some(page.total_pages);
                inner.state = ViewState::Ready(page.clone());
                Ok(Resolution::Fetched(page))
            }
            Err(e) => {
                let previous = inner.state.page().cloned();
                inner.state = ViewState::Errored { message: e.to_string(), previous };
                Err(e)
            }
        }
    }

    /// Mark this collection stale after a mutation; the next `resolve()`
    /// refetches the current tuple.
    pub fn invalidate(&self) {
        self.client.invalidate(self.resource);
    }

    /// Explicit re-trigger of the current tuple, e.g. after an error. An
    /// outstanding request for the tuple is superseded and its response dropped.
    pub async fn retry(&self) -> Result<Resolution<R>, AdminError> {
        {
            let mut inner = self.lock();
            let query = inner.query.clone();
            inner.in_flight.remove(&query);
            inner.resolved = None;
        }
        self.resolve().await
    }
}
