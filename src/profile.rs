// Group profile: the enrollment fields the join call needs. Resolved
// once from the last-info endpoint and cached to group.json; a cache
// file, once present, is trusted unconditionally on later runs.

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::api::ApiError;
use crate::logging::RunLog;
use crate::store::KvStore;

/// Cache file holding the resolved profile, pretty-printed.
pub const PROFILE_FILE: &str = "group.json";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("group.json contents could not be used as a profile")]
    Json(#[from] serde_json::Error),
    #[error("cache store error")]
    Store(#[from] io::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The three enrollment fields. Kept as `serde_json::Value`: the
/// backend returns numbers for some of them and strings for others, and
/// the join call echoes them back untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GroupProfile {
    pub nid: Value,
    #[serde(rename = "cardNo")]
    pub card_no: Value,
    #[serde(rename = "subOrg")]
    pub sub_org: Value,
}

impl GroupProfile {
    /// The degraded record: all three fields explicitly null. Produced
    /// when the last-info response cannot be read; the submission still
    /// goes out with it and the platform gets to decide.
    pub fn unresolved() -> GroupProfile {
        GroupProfile {
            nid: Value::Null,
            card_no: Value::Null,
            sub_org: Value::Null,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !(self.nid.is_null() && self.card_no.is_null() && self.sub_org.is_null())
    }
}

/// Pull the three fields out of a last-info response body. The body
/// must be JSON; a body missing any of `result.nid`, `result.cardNo`,
/// `result.subOrg` yields `None` rather than a partial record.
pub fn parse_last_info(body: &str) -> Result<Option<GroupProfile>, ApiError> {
    let json: Value = serde_json::from_str(body).map_err(|source| ApiError::Decode {
        endpoint: "course/last-info",
        source,
    })?;
    let result = &json["result"];
    match (result.get("nid"), result.get("cardNo"), result.get("subOrg")) {
        (Some(nid), Some(card_no), Some(sub_org)) => Ok(Some(GroupProfile {
            nid: nid.clone(),
            card_no: card_no.clone(),
            sub_org: sub_org.clone(),
        })),
        _ => Ok(None),
    }
}

/// Resolve the profile: group.json wins if present, stale or not (see
/// DESIGN.md for why that stays), otherwise ask the platform via
/// `fetch` and cache the answer. A response that parses but lacks
/// fields degrades to the all-null record and caches nothing, so the
/// next run retries the lookup.
pub fn resolve_profile<S: KvStore>(
    store: &mut S,
    log: &mut RunLog,
    fetch: impl FnOnce() -> Result<String, ApiError>,
) -> Result<GroupProfile, ProfileError> {
    if let Some(cached) = store.get(PROFILE_FILE)? {
        log.info("read the group information from group.json");
        return Ok(serde_json::from_str(&cached)?);
    }

    log.info("group.json not found, reading the group information online");
    let body = fetch()?;
    match parse_last_info(&body)? {
        Some(profile) => {
            store.put(PROFILE_FILE, &serde_json::to_string_pretty(&profile)?)?;
            log.info("group information resolved, group.json saved");
            Ok(profile)
        }
        None => {
            log.info("failed to read the group information online");
            Ok(GroupProfile::unresolved())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use serde_json::json;

    fn last_info_body() -> String {
        json!({"result": {"nid": 1, "cardNo": "C1", "subOrg": "S1"}}).to_string()
    }

    #[test]
    fn first_resolution_fetches_and_caches() {
        let mut store = MemStore::default();
        let mut log = RunLog::discard();

        let profile = resolve_profile(&mut store, &mut log, || Ok(last_info_body())).unwrap();
        assert_eq!(profile.nid, json!(1));
        assert_eq!(profile.card_no, json!("C1"));
        assert_eq!(profile.sub_org, json!("S1"));

        let cached = store.get(PROFILE_FILE).unwrap().unwrap();
        assert_eq!(
            serde_json::from_str::<GroupProfile>(&cached).unwrap(),
            profile
        );
    }

    #[test]
    fn second_resolution_never_fetches() {
        let mut store = MemStore::default();
        let mut log = RunLog::discard();

        let first = resolve_profile(&mut store, &mut log, || Ok(last_info_body())).unwrap();
        let second = resolve_profile(&mut store, &mut log, || {
            panic!("cache hit must not go online")
        })
        .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn cache_file_wins_over_the_network() {
        let mut store = MemStore::default();
        store
            .put(
                PROFILE_FILE,
                r#"{"nid": 7, "cardNo": "old", "subOrg": "old"}"#,
            )
            .unwrap();
        let mut log = RunLog::discard();

        let profile = resolve_profile(&mut store, &mut log, || {
            panic!("cache hit must not go online")
        })
        .unwrap();
        assert_eq!(profile.card_no, json!("old"));
    }

    #[test]
    fn missing_field_degrades_to_all_null_and_caches_nothing() {
        let mut store = MemStore::default();
        let mut log = RunLog::discard();

        let body = json!({"result": {"nid": 1, "subOrg": "S1"}}).to_string();
        let profile = resolve_profile(&mut store, &mut log, || Ok(body)).unwrap();
        assert_eq!(profile, GroupProfile::unresolved());
        assert!(!profile.is_resolved());
        assert_eq!(store.get(PROFILE_FILE).unwrap(), None);
    }

    #[test]
    fn missing_result_envelope_also_degrades() {
        let mut store = MemStore::default();
        let mut log = RunLog::discard();

        let profile =
            resolve_profile(&mut store, &mut log, || Ok(r#"{"status": 500}"#.to_string()))
                .unwrap();
        assert_eq!(profile, GroupProfile::unresolved());
    }

    #[test]
    fn unparseable_body_is_a_hard_error() {
        let mut store = MemStore::default();
        let mut log = RunLog::discard();

        let err = resolve_profile(&mut store, &mut log, || Ok("<html>".to_string()))
            .unwrap_err();
        assert!(matches!(err, ProfileError::Api(ApiError::Decode { .. })));
    }

    #[test]
    fn corrupt_cache_is_a_hard_error() {
        let mut store = MemStore::default();
        store.put(PROFILE_FILE, "not json").unwrap();
        let mut log = RunLog::discard();

        let err = resolve_profile(&mut store, &mut log, || {
            panic!("cache hit must not go online")
        })
        .unwrap_err();
        assert!(matches!(err, ProfileError::Json(_)));
    }

    #[test]
    fn profile_serializes_with_platform_field_names() {
        let profile = GroupProfile {
            nid: json!(1),
            card_no: json!("C1"),
            sub_org: json!("S1"),
        };
        assert_eq!(
            serde_json::to_value(&profile).unwrap(),
            json!({"nid": 1, "cardNo": "C1", "subOrg": "S1"})
        );
    }
}
