//! Row-level tenant isolation for storage queries.
//!
//! A non-System principal sees records whose id is its own party id or its
//! direct parent's id. Children are not visible through this path. Claims
//! without a tenant location see nothing.

use crate::models::{Claims, Filter, TenantLocation};

/// Scope a party query by the record `id` field.
pub fn scope(filter: Filter, claims: &Claims) -> Filter {
    scope_by("id", filter, claims)
}

/// Scope a query on a collection whose owning-party id lives in `field`.
pub fn scope_by(field: &str, filter: Filter, claims: &Claims) -> Filter {
    scope_location(field, filter, &claims.tenant_location())
}

pub fn scope_location(field: &str, filter: Filter, location: &TenantLocation) -> Filter {
    if location.is_system() {
        return filter;
    }
    if location.party_type.is_none() {
        return filter.and(Filter::Or(vec![]));
    }

    filter.and(Filter::Or(vec![
        Filter::eq(field, location.party_id.as_str()),
        Filter::eq(field, location.parent_id.as_str()),
    ]))
}
