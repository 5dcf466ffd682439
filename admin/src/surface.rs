use std::collections::BTreeMap;

use shared::GeoPoint;
use shared::picker::{MapSurface, MarkerRole};

/// A map surface without a screen: keeps the markers and the active route
/// overlay in memory and logs every change.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    next_id: u32,
    markers: BTreeMap<u32, (MarkerRole, GeoPoint)>,
    route: Option<Vec<GeoPoint>>,
}

impl HeadlessSurface {
    pub fn markers(&self) -> impl Iterator<Item = (MarkerRole, GeoPoint)> + '_ {
        self.markers.values().copied()
    }

    pub fn route(&self) -> Option<&[GeoPoint]> {
        self.route.as_deref()
    }
}

impl MapSurface for HeadlessSurface {
    type Marker = u32;

    fn place_marker(&mut self, role: MarkerRole, at: GeoPoint) -> u32 {
        self.next_id += 1;
        self.markers.insert(self.next_id, (role, at));
        tracing::debug!(
            "{} marker #{} at ({:.5}, {:.5})",
            role.color(),
            self.next_id,
            at.latitude(),
            at.longitude()
        );
        self.next_id
    }

    fn remove_marker(&mut self, marker: u32) {
        if self.markers.remove(&marker).is_none() {
            tracing::warn!("marker #{marker} was already removed");
        }
    }

    fn draw_route(&mut self, path: &[GeoPoint]) {
        if self.route.is_some() {
            tracing::warn!("drawing a route over an existing overlay");
        }
        self.route = Some(path.to_vec());
    }

    fn clear_route(&mut self) {
        self.route = None;
    }

    fn teardown(&mut self) {
        tracing::debug!(
            "headless map torn down with {} markers left",
            self.markers.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use shared::picker::{MapConfig, PickerAction, PickerSeed, RoutePicker, ScreenPoint};

    use super::*;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    #[test]
    fn tracks_markers_through_picker() {
        let mut picker = RoutePicker::new(
            HeadlessSurface::default(),
            MapConfig::default(),
            PickerSeed {
                start: Some(point(1.0, 1.0)),
                end: Some(point(2.0, 2.0)),
            },
        );
        assert_eq!(picker.surface().markers().count(), 2);

        picker.click(ScreenPoint::default(), 0.5, 0.5).unwrap();
        let query = picker.choose(PickerAction::SetStart).unwrap().unwrap();
        let roles: Vec<_> = picker.surface().markers().map(|(role, _)| role).collect();
        assert_eq!(roles, vec![MarkerRole::End, MarkerRole::Start]);

        picker
            .apply_route(query.token, Ok(vec![point(0.5, 0.5), point(2.0, 2.0)]))
            .unwrap();
        assert_eq!(picker.surface().route().map(<[GeoPoint]>::len), Some(2));
    }
}
