//! HTTP geographic data source for the extraction pipeline.
//!
//! [`HttpGeoDataSource`] implements [`sitescore_core::GeoDataSource`] with two
//! public OpenStreetMap services:
//!
//! - feature queries are Overpass QL `nwr(around:...)` selections built from
//!   the caller's tag filter;
//! - boundary lookups are Nominatim searches returning a GeoJSON outline.
//!
//! Both endpoints, the timeout and the user agent are configurable through
//! [`HttpGeoDataSourceConfig`].

mod nominatim;
mod overpass;
mod provider;

pub use nominatim::{Place, boundary_from_places};
pub use overpass::{OverpassResponse, build_query};
pub use provider::{
    DEFAULT_NOMINATIM_URL, DEFAULT_OVERPASS_URL, DEFAULT_USER_AGENT, HttpGeoDataSource,
    HttpGeoDataSourceConfig, SourceBuildError,
};
