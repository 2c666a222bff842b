//! Plant catalog browsing state.
//!
//! `CatalogBrowser` owns everything the plant-selection screen knows about the
//! remote catalog: the environment facets, the pages accumulated so far, the
//! active filter and the pagination lifecycle. It performs no I/O. Every
//! operation that needs data from the server returns the [`Fetch`] to issue,
//! and the caller feeds the response back in.
//!
//! The filtered list is never stored. It is recomputed from the accumulated
//! plants and the selected environment, so a page that lands after the filter
//! changed is filtered by the filter active when it is applied.

use tracing::{debug, info, warn};

use crate::capabilities::FetchError;
use crate::model::{Environment, EnvironmentKey, Plant, RemoteEnvironment, SessionId};

/// A request the browser needs answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    Environments,
    PlantsPage(u32),
}

/// Pagination lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Page 1 requested, nothing to show yet.
    LoadingInitial,
    /// Page 1 failed; only a retry gets out of here.
    InitialFailed,
    Idle,
    LoadingMore { page: u32 },
    /// The server returned an empty page. Permanent for the session.
    Exhausted,
}

/// What happened when a page response was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Appended { count: usize },
    Exhausted,
    Failed,
    /// Not the page in flight; dropped.
    Stale,
}

#[derive(Debug)]
pub struct CatalogBrowser {
    session: SessionId,
    environments: Vec<Environment>,
    all_plants: Vec<Plant>,
    selected: EnvironmentKey,
    page: u32,
    applied_page: u32,
    phase: Phase,
    environments_pending: bool,
    environments_error: Option<FetchError>,
    page_error: Option<FetchError>,
}

impl CatalogBrowser {
    /// Creates the browser for a freshly mounted screen together with the two
    /// initial fetches.
    #[must_use]
    pub fn mount(session: SessionId) -> (Self, [Fetch; 2]) {
        info!(%session, "catalog session mounted");
        let browser = Self {
            session,
            environments: vec![Environment::all()],
            all_plants: Vec::new(),
            selected: EnvironmentKey::all(),
            page: 1,
            applied_page: 0,
            phase: Phase::LoadingInitial,
            environments_pending: true,
            environments_error: None,
            page_error: None,
        };
        (browser, [Fetch::Environments, Fetch::PlantsPage(1)])
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }

    pub fn all_plants(&self) -> &[Plant] {
        &self.all_plants
    }

    pub fn selected_environment(&self) -> &EnvironmentKey {
        &self.selected
    }

    #[must_use]
    pub fn filtered_plants(&self) -> Vec<&Plant> {
        filter_plants(&self.all_plants, &self.selected)
    }

    pub fn loading_initial(&self) -> bool {
        self.phase == Phase::LoadingInitial
    }

    pub fn loading_more(&self) -> bool {
        matches!(self.phase, Phase::LoadingMore { .. })
    }

    pub fn exhausted(&self) -> bool {
        self.phase == Phase::Exhausted
    }

    /// Error that blocks the whole screen (page 1 never arrived).
    pub fn blocking_error(&self) -> Option<&FetchError> {
        match self.phase {
            Phase::InitialFailed => self.page_error.as_ref(),
            _ => None,
        }
    }

    /// Error shown next to content that is already on screen.
    pub fn banner_error(&self) -> Option<&FetchError> {
        match self.phase {
            Phase::InitialFailed => self.environments_error.as_ref(),
            _ => self.page_error.as_ref().or(self.environments_error.as_ref()),
        }
    }

    pub fn apply_environments(&mut self, result: Result<Vec<RemoteEnvironment>, FetchError>) {
        self.environments_pending = false;
        match result {
            Ok(remote) => {
                self.environments = with_sentinel(remote);
                self.environments_error = None;
                debug!(
                    session = %self.session,
                    count = self.environments.len(),
                    "environments loaded"
                );
            }
            Err(e) => {
                warn!(session = %self.session, error = %e, "environments fetch failed");
                self.environments_error = Some(e);
            }
        }
    }

    /// Applies the response for `page`. Only the page currently in flight is
    /// accepted, which keeps pages in order even if the shell reorders
    /// completions.
    pub fn apply_page(
        &mut self,
        page: u32,
        result: Result<Option<Vec<Plant>>, FetchError>,
    ) -> PageOutcome {
        let expected = match self.phase {
            Phase::LoadingInitial => 1,
            Phase::LoadingMore { page } => page,
            Phase::InitialFailed | Phase::Idle | Phase::Exhausted => {
                debug!(session = %self.session, page, "no page in flight, dropping response");
                return PageOutcome::Stale;
            }
        };
        if page != expected {
            debug!(session = %self.session, page, expected, "out-of-order page dropped");
            return PageOutcome::Stale;
        }

        let plants = match result {
            Ok(plants) => plants.unwrap_or_default(),
            Err(e) => {
                warn!(session = %self.session, page, error = %e, "plant page fetch failed");
                self.phase = if page == 1 {
                    Phase::InitialFailed
                } else {
                    Phase::Idle
                };
                self.page_error = Some(e);
                return PageOutcome::Failed;
            }
        };

        self.page_error = None;
        self.applied_page = page;

        if plants.is_empty() {
            info!(session = %self.session, page, total = self.all_plants.len(), "catalog exhausted");
            self.phase = Phase::Exhausted;
            return PageOutcome::Exhausted;
        }

        let count = plants.len();
        self.all_plants.extend(plants);
        self.phase = Phase::Idle;
        debug!(session = %self.session, page, count, total = self.all_plants.len(), "page appended");
        PageOutcome::Appended { count }
    }

    /// No validation: an unknown key simply matches nothing.
    pub fn select_environment(&mut self, key: EnvironmentKey) {
        if !self.environments.iter().any(|env| env.key == key) {
            debug!(session = %self.session, key = %key, "selected environment is not loaded");
        }
        self.selected = key;
    }

    /// Scroll-driven pagination. Returns the page to fetch, or `None` when the
    /// trigger is ignored.
    pub fn request_more(&mut self, distance_from_end: f64) -> Option<Fetch> {
        if distance_from_end.is_nan() || distance_from_end < 1.0 {
            return None;
        }
        if self.phase != Phase::Idle {
            debug!(session = %self.session, phase = ?self.phase, "load more ignored");
            return None;
        }

        // A failed page is requested again rather than skipped.
        if self.applied_page == self.page {
            self.page += 1;
        }
        self.phase = Phase::LoadingMore { page: self.page };
        self.page_error = None;
        Some(Fetch::PlantsPage(self.page))
    }

    /// Re-issues whatever failed. Returns the fetches to run.
    pub fn retry(&mut self) -> Vec<Fetch> {
        let mut fetches = Vec::new();

        if self.environments_error.is_some() && !self.environments_pending {
            self.environments_error = None;
            self.environments_pending = true;
            fetches.push(Fetch::Environments);
        }

        match self.phase {
            Phase::InitialFailed => {
                self.page_error = None;
                self.phase = Phase::LoadingInitial;
                fetches.push(Fetch::PlantsPage(1));
            }
            Phase::Idle if self.page_error.is_some() => {
                self.page_error = None;
                self.phase = Phase::LoadingMore { page: self.page };
                fetches.push(Fetch::PlantsPage(self.page));
            }
            _ => {}
        }

        fetches
    }

    /// Clears non-blocking errors. A failed initial load stays visible until
    /// retried.
    pub fn dismiss_error(&mut self) {
        self.environments_error = None;
        if self.phase != Phase::InitialFailed {
            self.page_error = None;
        }
    }
}

/// Pure derivation of the filtered view.
#[must_use]
pub fn filter_plants<'a>(plants: &'a [Plant], key: &EnvironmentKey) -> Vec<&'a Plant> {
    if key.is_all() {
        return plants.iter().collect();
    }
    plants.iter().filter(|plant| plant.grows_in(key)).collect()
}

/// Puts the synthetic "all" facet first. Remote records without a key, or
/// that try to claim the sentinel key, are dropped.
fn with_sentinel(remote: Vec<RemoteEnvironment>) -> Vec<Environment> {
    let mut environments = Vec::with_capacity(remote.len() + 1);
    environments.push(Environment::all());

    for record in remote {
        let Some(key) = record.key.filter(|k| !k.is_empty()) else {
            warn!(title = %record.title, "environment without key dropped");
            continue;
        };
        let key = EnvironmentKey::new(key);
        if environments.iter().any(|env| env.key == key) {
            warn!(key = %key, "duplicate environment key dropped");
            continue;
        }
        environments.push(Environment {
            key,
            title: record.title,
        });
    }

    environments
}
