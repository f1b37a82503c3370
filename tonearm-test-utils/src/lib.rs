//! tonearm Test Utilities
//!
//! Shared test infrastructure for the tonearm workspace:
//! - An in-memory [`MockCatalog`] that counts every call it receives
//! - A scripted [`MockRequester`] for driving the real remote fetcher
//! - Proptest generators for ids and entities
//! - Fixtures for common entities and their wire JSON
//! - Assertions for catalog results

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

// Re-export core types for convenience
pub use tonearm_core::{
    Artist, Catalog, CatalogError, CatalogResult, EntityKind, Record, Release, ReleaseGroup,
    RequestContext, SearchReleaseGroupRequest, SearchReleaseGroupResult, SearchReleaseRequest,
    SearchReleaseResult,
};
use tonearm_remote::{RawResponse, Requester};

// ============================================================================
// MOCK CATALOG
// ============================================================================

#[derive(Debug, Default)]
struct MockCatalogState {
    artists: HashMap<String, Artist>,
    releases: HashMap<String, Release>,
    release_groups: HashMap<String, ReleaseGroup>,
    failure: Option<CatalogError>,
    lookups: HashMap<(EntityKind, String), usize>,
    searches: usize,
}

/// Catalog backed by in-memory maps.
///
/// Unknown ids answer `NotFound`, like the remote service. Each lookup is
/// counted per `(kind, id)` whether it succeeds or not, so decorator tests
/// can assert exactly how often the inner catalog was reached.
#[derive(Debug, Default)]
pub struct MockCatalog {
    state: Mutex<MockCatalogState>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artist(self, artist: Artist) -> Self {
        self.state().artists.insert(artist.id.clone(), artist);
        self
    }

    pub fn with_release(self, release: Release) -> Self {
        self.state().releases.insert(release.id.clone(), release);
        self
    }

    pub fn with_release_group(self, group: ReleaseGroup) -> Self {
        self.state().release_groups.insert(group.id.clone(), group);
        self
    }

    /// Make every call fail with `err` until [`MockCatalog::recover`].
    pub fn fail_with(&self, err: CatalogError) {
        self.state().failure = Some(err);
    }

    pub fn recover(&self) {
        self.state().failure = None;
    }

    /// Lookups received for one entity.
    pub fn calls_for(&self, kind: EntityKind, id: &str) -> usize {
        self.state()
            .lookups
            .get(&(kind, id.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Lookups received across all entities.
    pub fn lookup_calls(&self) -> usize {
        self.state().lookups.values().sum()
    }

    pub fn search_calls(&self) -> usize {
        self.state().searches
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockCatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup<T: Clone>(
        &self,
        ctx: &RequestContext,
        kind: EntityKind,
        id: &str,
        table: impl FnOnce(&MockCatalogState) -> Option<&T>,
    ) -> CatalogResult<Record<T>> {
        if ctx.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }
        let mut state = self.state();
        *state.lookups.entry((kind, id.to_string())).or_default() += 1;
        if let Some(err) = &state.failure {
            return Err(err.clone());
        }
        table(&*state)
            .cloned()
            .map(Record::now)
            .ok_or_else(|| CatalogError::NotFound {
                kind,
                id: id.to_string(),
            })
    }

    fn search(&self, ctx: &RequestContext) -> CatalogResult<MockCatalogSnapshot> {
        if ctx.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }
        let mut state = self.state();
        state.searches += 1;
        if let Some(err) = &state.failure {
            return Err(err.clone());
        }
        Ok(MockCatalogSnapshot {
            releases: state.releases.values().cloned().collect(),
            release_groups: state.release_groups.values().cloned().collect(),
        })
    }
}

struct MockCatalogSnapshot {
    releases: Vec<Release>,
    release_groups: Vec<ReleaseGroup>,
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn artist(&self, ctx: &RequestContext, id: &str) -> CatalogResult<Record<Artist>> {
        self.lookup(ctx, EntityKind::Artist, id, |s| s.artists.get(id))
    }

    async fn release(&self, ctx: &RequestContext, id: &str) -> CatalogResult<Record<Release>> {
        self.lookup(ctx, EntityKind::Release, id, |s| s.releases.get(id))
    }

    async fn release_group(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> CatalogResult<Record<ReleaseGroup>> {
        self.lookup(ctx, EntityKind::ReleaseGroup, id, |s| {
            s.release_groups.get(id)
        })
    }

    /// Returns every stored release regardless of the criteria.
    async fn search_release(
        &self,
        ctx: &RequestContext,
        _request: &SearchReleaseRequest,
    ) -> CatalogResult<SearchReleaseResult> {
        let snapshot = self.search(ctx)?;
        Ok(SearchReleaseResult {
            created: None,
            count: snapshot.releases.len() as i64,
            offset: 0,
            releases: snapshot.releases,
        })
    }

    /// Returns every stored release group regardless of the criteria.
    async fn search_release_group(
        &self,
        ctx: &RequestContext,
        _request: &SearchReleaseGroupRequest,
    ) -> CatalogResult<SearchReleaseGroupResult> {
        let snapshot = self.search(ctx)?;
        Ok(SearchReleaseGroupResult {
            created: None,
            count: snapshot.release_groups.len() as i64,
            offset: 0,
            release_groups: snapshot.release_groups,
        })
    }
}

// ============================================================================
// MOCK REQUESTER
// ============================================================================

/// Transport that answers from a table of `path -> (status, body)`.
///
/// Unscripted paths answer `404` with the service's error body. Every request
/// is counted per path.
#[derive(Debug, Default)]
pub struct MockRequester {
    responses: Mutex<HashMap<String, RawResponse>>,
    hits: Mutex<HashMap<String, usize>>,
}

impl MockRequester {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, path: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                path.into(),
                RawResponse {
                    status,
                    body: body.into(),
                },
            );
        self
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }
}

#[async_trait]
impl Requester for MockRequester {
    async fn get(
        &self,
        ctx: &RequestContext,
        path: &str,
        _query: &[(&str, String)],
    ) -> CatalogResult<RawResponse> {
        if ctx.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }
        *self
            .hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(path.to_string())
            .or_default() += 1;

        let response = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned();
        Ok(response.unwrap_or_else(|| RawResponse {
            status: 404,
            body: r#"{"error":"Not Found"}"#.to_string(),
        }))
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for tonearm types.

    use super::*;
    use proptest::prelude::*;

    /// Ids shaped like the service's UUIDs.
    pub fn arb_entity_id() -> impl Strategy<Value = String> {
        "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}"
    }

    pub fn arb_entity_kind() -> impl Strategy<Value = EntityKind> {
        prop_oneof![
            Just(EntityKind::Artist),
            Just(EntityKind::Release),
            Just(EntityKind::ReleaseGroup),
        ]
    }

    pub fn arb_artist() -> impl Strategy<Value = Artist> {
        (arb_entity_id(), "[A-Za-z ]{1,24}", "[A-Z]{2}").prop_map(|(id, name, country)| Artist {
            id,
            name,
            country,
            ..Default::default()
        })
    }

    pub fn arb_release_group() -> impl Strategy<Value = ReleaseGroup> {
        (
            arb_entity_id(),
            "[A-Za-z ]{1,24}",
            prop_oneof![Just("Album"), Just("Single"), Just("EP")],
        )
            .prop_map(|(id, title, primary_type)| ReleaseGroup {
                id,
                title,
                primary_type: primary_type.to_string(),
                ..Default::default()
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Entities and their wire JSON.

    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    pub const AIR_ID: &str = "cb67438a-7f50-4f2b-a6f1-2bb2729fd538";
    pub const MOON_SAFARI_ID: &str = "b10bbbfc-cf9e-42e0-be17-e2c3e1d2600d";
    pub const MOON_SAFARI_GROUP_ID: &str = "49a28b04-6a85-3a4b-b4d5-1de8ac4e7e69";
    pub const MISSING_ID: &str = "nonexistent-id";

    /// A fixed timestamp well in the past.
    pub fn fetched_long_ago() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5)
            .single()
            .unwrap_or_default()
    }

    pub fn artist(id: &str, name: &str) -> Artist {
        Artist {
            id: id.to_string(),
            name: name.to_string(),
            artist_type: "Group".to_string(),
            country: "FR".to_string(),
            ..Default::default()
        }
    }

    pub fn release(id: &str, title: &str) -> Release {
        Release {
            id: id.to_string(),
            title: title.to_string(),
            status: "Official".to_string(),
            date: "1998-01-16".to_string(),
            ..Default::default()
        }
    }

    pub fn release_group(id: &str, title: &str) -> ReleaseGroup {
        ReleaseGroup {
            id: id.to_string(),
            title: title.to_string(),
            primary_type: "Album".to_string(),
            first_release_date: "1998-01-16".to_string(),
            ..Default::default()
        }
    }

    /// Catalog holding Air, Moon Safari and its release group.
    pub fn air_catalog() -> MockCatalog {
        MockCatalog::new()
            .with_artist(artist(AIR_ID, "Air"))
            .with_release(release(MOON_SAFARI_ID, "Moon Safari"))
            .with_release_group(release_group(MOON_SAFARI_GROUP_ID, "Moon Safari"))
    }

    /// Body the service returns for an artist lookup.
    pub fn artist_json(id: &str, name: &str) -> String {
        json!({
            "id": id,
            "name": name,
            "type": "Group",
            "country": "FR",
            "life-span": {"begin": "1995", "end": null, "ended": false},
            "tags": [{"name": "electronic", "count": 7}],
            "relations": []
        })
        .to_string()
    }

    /// Body the service returns for a release group lookup.
    pub fn release_group_json(id: &str, title: &str) -> String {
        json!({
            "id": id,
            "title": title,
            "primary-type": "Album",
            "secondary-types": [],
            "first-release-date": "1998-01-16",
            "artist-credit": [{"name": "Air", "joinphrase": "", "artist": {"id": AIR_ID, "name": "Air"}}],
            "genres": [{"id": "g-1", "name": "downtempo", "count": 3}]
        })
        .to_string()
    }

    /// Requester that knows Air and Moon Safari's release group.
    pub fn air_requester() -> MockRequester {
        MockRequester::new()
            .respond(format!("artist/{}", AIR_ID), 200, artist_json(AIR_ID, "Air"))
            .respond(
                format!("release-group/{}", MOON_SAFARI_GROUP_ID),
                200,
                release_group_json(MOON_SAFARI_GROUP_ID, "Moon Safari"),
            )
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for catalog results.

    use super::*;

    /// Assert that a result is a `NotFound` for the given kind and id.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(
        result: &CatalogResult<T>,
        kind: EntityKind,
        id: &str,
    ) {
        match result {
            Err(CatalogError::NotFound { kind: k, id: i }) => {
                assert_eq!(*k, kind, "Wrong kind in NotFound error");
                assert_eq!(i, id, "Wrong id in NotFound error");
            }
            other => panic!("Expected NotFound for {} {}, got: {:?}", kind, id, other),
        }
    }

    /// Assert that a result is a `CacheIo` error.
    #[track_caller]
    pub fn assert_cache_io<T: std::fmt::Debug>(result: &CatalogResult<T>) {
        match result {
            Err(CatalogError::CacheIo { .. }) => {}
            other => panic!("Expected CacheIo error, got: {:?}", other),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_mock_catalog_counts_and_not_found() {
        let catalog = fixtures::air_catalog();
        let ctx = RequestContext::new();

        let record = catalog.artist(&ctx, fixtures::AIR_ID).await.unwrap();
        assert_eq!(record.data.name, "Air");

        let missing = catalog.artist(&ctx, fixtures::MISSING_ID).await;
        assertions::assert_not_found(&missing, EntityKind::Artist, fixtures::MISSING_ID);

        assert_eq!(catalog.calls_for(EntityKind::Artist, fixtures::AIR_ID), 1);
        assert_eq!(catalog.lookup_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_catalog_failure_injection() {
        let catalog = fixtures::air_catalog();
        let ctx = RequestContext::new();

        catalog.fail_with(CatalogError::status(503, "Service Unavailable"));
        assert!(catalog.release(&ctx, fixtures::MOON_SAFARI_ID).await.is_err());

        catalog.recover();
        assert!(catalog.release(&ctx, fixtures::MOON_SAFARI_ID).await.is_ok());
        assert_eq!(catalog.calls_for(EntityKind::Release, fixtures::MOON_SAFARI_ID), 2);
    }

    #[tokio::test]
    async fn test_mock_requester_defaults_to_not_found() {
        let requester = fixtures::air_requester();
        let ctx = RequestContext::new();

        let response = requester.get(&ctx, "artist/unknown", &[]).await.unwrap();
        assert_eq!(response.status, 404);

        let response = requester
            .get(&ctx, &format!("artist/{}", fixtures::AIR_ID), &[])
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(requester.total_hits(), 2);
    }

    #[test]
    fn test_fixture_json_decodes() {
        let artist: Artist =
            serde_json::from_str(&fixtures::artist_json(fixtures::AIR_ID, "Air")).unwrap();
        assert_eq!(artist.life_span.begin, "1995");

        let group: ReleaseGroup = serde_json::from_str(&fixtures::release_group_json(
            fixtures::MOON_SAFARI_GROUP_ID,
            "Moon Safari",
        ))
        .unwrap();
        assert_eq!(group.artist_credit[0].name, "Air");
    }

    proptest! {
        #[test]
        fn prop_generated_ids_are_valid(id in generators::arb_entity_id()) {
            prop_assert!(tonearm_core::validate_id(&id).is_ok());
        }

        #[test]
        fn prop_generated_kinds(kind in generators::arb_entity_kind()) {
            match kind {
                EntityKind::Artist | EntityKind::Release | EntityKind::ReleaseGroup => {}
            }
        }

        #[test]
        fn prop_uncredited_release_group_display(group in generators::arb_release_group()) {
            prop_assert_eq!(
                group.to_string(),
                format!("[{}]  - {} ()", group.id, group.title)
            );
        }

        #[test]
        fn prop_generated_artists_roundtrip_through_record(artist in generators::arb_artist()) {
            let record = Record::now(artist.clone());
            let json = serde_json::to_string(&record).unwrap();
            let back: Record<Artist> = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back.data, artist);
        }
    }
}
