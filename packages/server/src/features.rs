//! Snapshot → GeoJSON `FeatureCollection` conversion.
//!
//! One Point feature per incident that has coordinates; incidents
//! without a usable position are left out of the collection entirely
//! rather than emitted with a null geometry.

use citizen_watch_engine::classify::ClassifiedIncident;
use citizen_watch_engine::poller::TickSnapshot;
use citizen_watch_server_models::IncidentProperties;
use geojson::{Feature, FeatureCollection, Geometry, Value, feature::Id};

/// Builds the published `FeatureCollection` for a snapshot. The initial
/// empty snapshot yields an empty collection, the neutral cold-start
/// state.
#[must_use]
pub fn feature_collection(snapshot: &TickSnapshot) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: snapshot.incidents.iter().filter_map(to_feature).collect(),
        foreign_members: None,
    }
}

/// Converts one classified incident, or `None` when it has no
/// coordinates.
fn to_feature(classified: &ClassifiedIncident) -> Option<Feature> {
    let coords = classified.incident.coordinates()?;
    let properties = serde_json::to_value(IncidentProperties::from(classified))
        .ok()
        .and_then(|value| match value {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        })?;

    Some(Feature {
        bbox: None,
        // GeoJSON positions are [lng, lat] order.
        geometry: Some(Geometry::new(Value::Point(vec![coords.lon, coords.lat]))),
        id: Some(Id::String(classified.incident.key.clone())),
        properties: Some(properties),
        foreign_members: None,
    })
}
