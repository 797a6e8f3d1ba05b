//! AddressResolver - text, map point or device position to a validated address
//!
//! Every resolution runs under an `Address` ticket. On success the address
//! is committed to the session only if no newer resolution (or direct
//! write) has started since; on failure the session is not touched.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::ResolveError;
use crate::config::RegionConfig;
use crate::domain::{Address, GeoPoint};
use crate::services::{ForwardGeocoder, LocationProvider, ReverseGeocoder, Services};
use crate::session::{Commit, SessionManager, SessionUpdate, Slot, Ticket};

/// Resolves and stores the session address
#[derive(Clone)]
pub struct AddressResolver {
    session: SessionManager,
    region: RegionConfig,
    forward: Arc<dyn ForwardGeocoder>,
    reverse: Arc<dyn ReverseGeocoder>,
    location: Arc<dyn LocationProvider>,
}

impl AddressResolver {
    pub fn new(
        session: SessionManager,
        region: RegionConfig,
        forward: Arc<dyn ForwardGeocoder>,
        reverse: Arc<dyn ReverseGeocoder>,
        location: Arc<dyn LocationProvider>,
    ) -> Self {
        Self {
            session,
            region,
            forward,
            reverse,
            location,
        }
    }

    pub fn from_services(session: SessionManager, region: RegionConfig, services: &Services) -> Self {
        Self::new(
            session,
            region,
            services.forward.clone(),
            services.reverse.clone(),
            services.location.clone(),
        )
    }

    pub fn region(&self) -> &RegionConfig {
        &self.region
    }

    /// Forward-geocode `query` within the region and take the top match
    pub async fn resolve_from_text(&self, query: &str) -> Result<Commit<Address>, ResolveError> {
        debug!(%query, "resolve_from_text: called");
        let query = query.trim();
        if query.is_empty() {
            return Err(ResolveError::EmptyQuery);
        }

        let ticket = self.session.begin(Slot::Address).await?;
        let candidates = self
            .forward
            .search(query, &self.region.filter())
            .await
            .map_err(ResolveError::LookupFailed)?;

        let Some(top) = candidates.into_iter().next() else {
            debug!(%query, "resolve_from_text: no candidates");
            return Err(ResolveError::NotFound(query.to_string()));
        };

        self.store(ticket, top.into_address()).await
    }

    /// Reverse-geocode a user-picked point
    ///
    /// Points outside the region's bounding box are rejected before any
    /// lookup. Inside the box the reverse lookup's region code decides.
    pub async fn resolve_from_point(&self, point: GeoPoint) -> Result<Commit<Address>, ResolveError> {
        debug!(%point, "resolve_from_point: called");
        self.precheck(point)?;
        let ticket = self.session.begin(Slot::Address).await?;
        self.lookup(ticket, point).await
    }

    /// Ask the device for its position, then resolve it as a point
    ///
    /// Starting this supersedes any address resolution already in flight,
    /// even when the device position then fails or lands out of region.
    pub async fn resolve_from_device(&self) -> Result<Commit<Address>, ResolveError> {
        debug!("resolve_from_device: called");
        // The position request is part of the resolution, so the ticket comes first
        let ticket = self.session.begin(Slot::Address).await?;
        let point = self.location.current_position().await?;
        debug!(%point, "resolve_from_device: got position");
        self.precheck(point)?;
        self.lookup(ticket, point).await
    }

    fn precheck(&self, point: GeoPoint) -> Result<(), ResolveError> {
        if !point.is_valid() {
            return Err(ResolveError::InvalidCoordinates(point));
        }
        if !self.region.bounds.contains(point) {
            warn!(%point, region = %self.region.code, "precheck: outside bounding box");
            return Err(self.out_of_region(point));
        }
        Ok(())
    }

    async fn lookup(&self, ticket: Ticket, point: GeoPoint) -> Result<Commit<Address>, ResolveError> {
        let answer = self.reverse.reverse(point).await.map_err(ResolveError::LookupFailed)?;

        let in_region = answer
            .region_code
            .as_deref()
            .is_some_and(|code| self.region.matches_code(code));
        if !in_region {
            warn!(
                %point,
                code = ?answer.region_code,
                expected = %self.region.code,
                "lookup: region code mismatch"
            );
            return Err(self.out_of_region(point));
        }

        self.store(ticket, Address::new(answer.display_name, point)).await
    }

    fn out_of_region(&self, point: GeoPoint) -> ResolveError {
        ResolveError::OutOfRegion {
            point,
            region: self.region.name.clone(),
        }
    }

    async fn store(&self, ticket: Ticket, address: Address) -> Result<Commit<Address>, ResolveError> {
        let applied = self
            .session
            .commit(ticket, SessionUpdate::Address(Some(address.clone())))
            .await?;
        if applied {
            info!(text = %address.text, lat = address.lat, lng = address.lng, "Address resolved");
            Ok(Commit::Applied(address))
        } else {
            debug!(generation = ticket.generation, "store: superseded, result dropped");
            Ok(Commit::Stale)
        }
    }
}
