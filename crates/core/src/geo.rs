//! Countries and cities referenced by job postings.
//!
//! These are read-only collaborators for the reconciler: it resolves feed
//! slugs to foreign keys and never writes geo records.

use serde::{Deserialize, Serialize};

use crate::id::{CityId, CountryId};

/// A country, addressable by slug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub slug: String,
    pub name: String,
}

/// A city within a country, addressable by slug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub slug: String,
    pub name: String,
    pub country: CountryId,
}
