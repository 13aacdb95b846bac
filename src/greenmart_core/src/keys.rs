//! Cache-key codec.
//!
//! Every cache entry in the system is addressed through this module so that
//! invalidation patterns are guaranteed to cover every key a read path can
//! produce. Filter payloads are serialized as structs, so field order is
//! fixed and the same logical query always encodes to the same key.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;

use crate::domain::entity::{EntityKind, ListFilter};
use crate::domain::otp::{OtpIdentity, OtpStrategy};
use crate::domain::user::UserType;

#[derive(Serialize)]
struct ListKeyPayload<'a> {
    search_key: Option<&'a str>,
    skip: u64,
    limit: u64,
    select: Option<&'a [String]>,
}

#[derive(Serialize)]
struct IdKeyPayload {
    id: i64,
}

fn encode(payload: &impl Serialize) -> String {
    let json = serde_json::to_string(payload).unwrap_or_default();
    BASE64.encode(json)
}

fn prefix(entity: &EntityKind, scope: Option<i64>) -> String {
    match scope {
        Some(owner) => format!("{}.{owner}", entity.name),
        None => entity.name.to_string(),
    }
}

/// Key for one list query: `{entity}[.{scope}].list.{base64(filters)}`.
pub fn list_key(entity: &EntityKind, scope: Option<i64>, filter: &ListFilter) -> String {
    let payload = ListKeyPayload {
        search_key: filter.search_key.as_deref(),
        skip: filter.skip_or_default(),
        limit: filter.limit_or_default(),
        select: filter.select.as_deref(),
    };
    format!("{}.list.{}", prefix(entity, scope), encode(&payload))
}

/// Key for one row: `{entity}[.{scope}].{id}.{base64({id})}`.
pub fn id_key(entity: &EntityKind, scope: Option<i64>, id: i64) -> String {
    format!("{}.{id}.{}", prefix(entity, scope), encode(&IdKeyPayload { id }))
}

/// Pattern covering every key `list_key`/`id_key` ever produced for the
/// entity (and scope, when present), regardless of filter suffix.
pub fn invalidation_pattern(entity: &EntityKind, scope: Option<i64>) -> String {
    format!("{}.*", prefix(entity, scope))
}

/// Key holding the live one-time code for (strategy, identity).
pub fn otp_code_key(strategy: OtpStrategy, identity: &OtpIdentity) -> String {
    format!("otp.{}.{}", strategy.as_str(), identity.key_fragment())
}

/// Short-TTL marker throttling repeated OTP sends for (strategy, identity).
pub fn otp_last_request_key(strategy: OtpStrategy, identity: &OtpIdentity) -> String {
    format!("{}.last_request", otp_code_key(strategy, identity))
}

/// Forward refresh-token index:
/// `session.{user_type}.{user_id}.refresh_token`.
///
/// Session keys live under their own `session.` root so that entity
/// invalidation patterns (`user.*` included) can never sweep live refresh
/// lineages - the entity repository stays the only writer of its namespace.
pub fn refresh_forward_key(user_type: UserType, user_id: i64) -> String {
    format!("session.{}.{user_id}.refresh_token", user_type.as_str())
}

/// Reverse refresh-token index:
/// `session.{user_type}.refresh_token.{token}`.
pub fn refresh_reverse_key(user_type: UserType, token: &str) -> String {
    format!("session.{}.refresh_token.{token}", user_type.as_str())
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    fn filter(search_key: Option<&str>, skip: Option<u64>, limit: Option<u64>) -> ListFilter {
        ListFilter {
            search_key: search_key.map(str::to_string),
            select: None,
            skip,
            limit,
        }
    }

    #[test]
    fn same_logical_query_yields_the_same_key() {
        let a = list_key(&EntityKind::CATEGORY, None, &filter(Some("milk"), Some(0), Some(10)));
        let b = list_key(&EntityKind::CATEGORY, None, &filter(Some("milk"), Some(0), Some(10)));
        assert_eq!(a, b);
    }

    #[test]
    fn defaults_and_explicit_defaults_encode_identically() {
        let implicit = list_key(&EntityKind::CATEGORY, None, &filter(None, None, None));
        let explicit = list_key(&EntityKind::CATEGORY, None, &filter(None, Some(0), Some(10)));
        assert_eq!(implicit, explicit);
    }

    #[test]
    fn scoped_keys_carry_the_owner() {
        let key = list_key(&EntityKind::ADDRESS, Some(42), &ListFilter::default());
        assert!(key.starts_with("address.42.list."));

        let key = id_key(&EntityKind::ADDRESS, Some(42), 7);
        assert!(key.starts_with("address.42.7."));
    }

    #[test]
    fn invalidation_pattern_covers_list_and_id_keys() {
        let pattern = invalidation_pattern(&EntityKind::ADDRESS, Some(42));
        assert_eq!(pattern, "address.42.*");

        let list = list_key(&EntityKind::ADDRESS, Some(42), &ListFilter::default());
        let id = id_key(&EntityKind::ADDRESS, Some(42), 7);
        assert!(list.starts_with("address.42."));
        assert!(id.starts_with("address.42."));
    }

    #[test]
    fn otp_and_refresh_keys_match_their_documented_shapes() {
        let identity = OtpIdentity::Email("a@b.com".to_string().try_into().unwrap());
        assert_eq!(otp_code_key(OtpStrategy::Login, &identity), "otp.login.a@b.com");
        assert_eq!(
            otp_last_request_key(OtpStrategy::Reset, &identity),
            "otp.reset.a@b.com.last_request"
        );
        assert_eq!(
            refresh_forward_key(UserType::User, 9),
            "session.user.9.refresh_token"
        );
        assert_eq!(
            refresh_reverse_key(UserType::User, "tok"),
            "session.user.refresh_token.tok"
        );
    }

    #[test]
    fn entity_invalidation_never_sweeps_session_keys() {
        let pattern = invalidation_pattern(&EntityKind::USER, None);
        let forward = refresh_forward_key(UserType::User, 9);
        let reverse = refresh_reverse_key(UserType::User, "tok");
        assert!(!forward.starts_with(pattern.trim_end_matches('*')));
        assert!(!reverse.starts_with(pattern.trim_end_matches('*')));
    }

    #[quickcheck]
    fn keys_collide_only_for_equal_filters(
        search_a: Option<String>,
        skip_a: u64,
        limit_a: u64,
        search_b: Option<String>,
        skip_b: u64,
        limit_b: u64,
    ) -> bool {
        let a = ListFilter {
            search_key: search_a,
            select: None,
            skip: Some(skip_a),
            limit: Some(limit_a),
        };
        let b = ListFilter {
            search_key: search_b,
            select: None,
            skip: Some(skip_b),
            limit: Some(limit_b),
        };
        let key_a = list_key(&EntityKind::PRODUCT, None, &a);
        let key_b = list_key(&EntityKind::PRODUCT, None, &b);
        (key_a == key_b) == (a == b)
    }

    #[quickcheck]
    fn id_and_list_keys_never_collide(id: i64, skip: u64, limit: u64) -> bool {
        let list = list_key(
            &EntityKind::PRODUCT,
            None,
            &filter(None, Some(skip), Some(limit)),
        );
        let by_id = id_key(&EntityKind::PRODUCT, None, id);
        list != by_id
    }
}
