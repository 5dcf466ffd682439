//! Click-driven route picking on a map surface.
//!
//! The picker is sans-IO: it owns the markers and the route overlay on a
//! [`MapSurface`], decides when a walking route must be fetched and hands the
//! caller a [`RouteQuery`]. The caller performs the request however it likes
//! (Seed `fetch`, `reqwest`, a test double) and feeds the result back through
//! [`RoutePicker::apply_route`], which yields the [`RouteUpdateEvent`] the host
//! form consumes.

use serde::Serialize;

use crate::directions::{DirectionsError, walking_path};
use crate::geo::{GeoError, GeoPoint};

pub const DEFAULT_DIRECTIONS_ROOT: &str = "https://api.mapbox.com";
pub const DEFAULT_STYLE: &str = "mapbox://styles/mapbox/streets-v11";

/// Map and directions settings handed to the picker at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub access_token: String,
    pub directions_root: String,
    pub style: String,
    pub center: GeoPoint,
    pub zoom: f64,
}

impl MapConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..Self::default()
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            directions_root: DEFAULT_DIRECTIONS_ROOT.to_string(),
            style: DEFAULT_STYLE.to_string(),
            // Los Angeles
            center: GeoPoint::new(34.052235, -118.243683).expect("constant coordinate in range"),
            zoom: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerRole {
    Start,
    Waypoint,
    End,
}

impl MarkerRole {
    pub fn color(self) -> &'static str {
        match self {
            MarkerRole::Start => "green",
            MarkerRole::Waypoint => "blue",
            MarkerRole::End => "red",
        }
    }
}

/// The drawing surface the picker mutates.
///
/// Marker handles are moved back into [`MapSurface::remove_marker`], so each
/// placed marker is released exactly once.
pub trait MapSurface {
    type Marker;

    fn place_marker(&mut self, role: MarkerRole, at: GeoPoint) -> Self::Marker;
    fn remove_marker(&mut self, marker: Self::Marker);
    fn draw_route(&mut self, path: &[GeoPoint]);
    fn clear_route(&mut self);
    /// Releases the map session itself. Called once, when the picker is dropped.
    fn teardown(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerAction {
    SetStart,
    SetWaypoint,
    SetEnd,
}

impl PickerAction {
    pub fn label(self) -> &'static str {
        match self {
            PickerAction::SetStart => "Set Start Point",
            PickerAction::SetWaypoint => "Set Waypoint",
            PickerAction::SetEnd => "Set End Point",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    HasStart,
    Complete,
}

impl Phase {
    pub fn options(self) -> &'static [PickerAction] {
        match self {
            Phase::Empty | Phase::Complete => &[PickerAction::SetStart],
            Phase::HasStart => &[PickerAction::SetWaypoint, PickerAction::SetEnd],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    pub screen: ScreenPoint,
    pub at: GeoPoint,
    pub options: &'static [PickerAction],
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PickerError {
    #[error("invalid map coordinate: {0}")]
    Coordinate(#[from] GeoError),
    #[error("no context menu is open")]
    NoMenu,
    #[error("{action:?} is not offered while the route is {phase:?}")]
    NotOffered { action: PickerAction, phase: Phase },
}

/// Optional start/end markers rendered at mount (edit flow).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PickerSeed {
    pub start: Option<GeoPoint>,
    pub end: Option<GeoPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchToken(u64);

/// A walking-route lookup the caller must perform.
///
/// Only `start` and `end` go to the directions service; the waypoint is
/// carried so it can be reported back to the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteQuery {
    pub token: FetchToken,
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub waypoint: Option<GeoPoint>,
}

impl RouteQuery {
    pub fn url(&self, config: &MapConfig) -> String {
        format!(
            "{}/{}?geometries=geojson&access_token={}",
            config.directions_root.trim_end_matches('/'),
            walking_path(self.start, self.end),
            config.access_token
        )
    }
}

/// Emitted to the host after a successful route lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteUpdateEvent {
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub waypoints: Vec<GeoPoint>,
    /// Full path geometry, for rendering only.
    pub route: Vec<GeoPoint>,
}

impl RouteUpdateEvent {
    /// `[start, ...waypoints, end]`
    pub fn ordered_points(&self) -> Vec<GeoPoint> {
        let mut points = Vec::with_capacity(self.waypoints.len() + 2);
        points.push(self.start);
        points.extend_from_slice(&self.waypoints);
        points.push(self.end);
        points
    }
}

struct Placed<M> {
    point: GeoPoint,
    marker: M,
}

enum Selection<M> {
    Empty,
    HasStart {
        start: Placed<M>,
        waypoint: Option<Placed<M>>,
    },
    Complete {
        start: Placed<M>,
        waypoint: Option<Placed<M>>,
        end: Placed<M>,
    },
}

impl<M> Selection<M> {
    fn phase(&self) -> Phase {
        match self {
            Selection::Empty => Phase::Empty,
            Selection::HasStart { .. } => Phase::HasStart,
            Selection::Complete { .. } => Phase::Complete,
        }
    }
}

pub struct RoutePicker<S: MapSurface> {
    surface: S,
    config: MapConfig,
    selection: Selection<S::Marker>,
    menu: Option<ContextMenu>,
    pending: Option<RouteQuery>,
    next_token: u64,
    overlay_drawn: bool,
}

impl<S: MapSurface> RoutePicker<S> {
    pub fn new(mut surface: S, config: MapConfig, seed: PickerSeed) -> Self {
        let mut place = |role: MarkerRole, point: GeoPoint| Placed {
            point,
            marker: surface.place_marker(role, point),
        };
        let selection = match (seed.start, seed.end) {
            (Some(start), Some(end)) => Selection::Complete {
                start: place(MarkerRole::Start, start),
                waypoint: None,
                end: place(MarkerRole::End, end),
            },
            (Some(start), None) => Selection::HasStart {
                start: place(MarkerRole::Start, start),
                waypoint: None,
            },
            (None, Some(end)) => {
                tracing::warn!(
                    "ignoring end seed ({:.5}, {:.5}) without a start point",
                    end.latitude(),
                    end.longitude()
                );
                Selection::Empty
            }
            (None, None) => Selection::Empty,
        };

        Self {
            surface,
            config,
            selection,
            menu: None,
            pending: None,
            next_token: 0,
            overlay_drawn: false,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn phase(&self) -> Phase {
        self.selection.phase()
    }

    pub fn menu(&self) -> Option<&ContextMenu> {
        self.menu.as_ref()
    }

    pub fn start(&self) -> Option<GeoPoint> {
        match &self.selection {
            Selection::Empty => None,
            Selection::HasStart { start, .. } | Selection::Complete { start, .. } => {
                Some(start.point)
            }
        }
    }

    pub fn waypoint(&self) -> Option<GeoPoint> {
        match &self.selection {
            Selection::Empty => None,
            Selection::HasStart { waypoint, .. } | Selection::Complete { waypoint, .. } => {
                waypoint.as_ref().map(|w| w.point)
            }
        }
    }

    pub fn end(&self) -> Option<GeoPoint> {
        match &self.selection {
            Selection::Complete { end, .. } => Some(end.point),
            _ => None,
        }
    }

    /// The lookup whose result will still be accepted, if any.
    pub fn pending(&self) -> Option<&RouteQuery> {
        self.pending.as_ref()
    }

    /// Opens the context menu for a map click, replacing any menu already open.
    pub fn click(
        &mut self,
        screen: ScreenPoint,
        lng: f64,
        lat: f64,
    ) -> Result<&ContextMenu, PickerError> {
        let at = GeoPoint::new(lat, lng)?;
        let options = self.phase().options();
        tracing::debug!("map click at ({lat:.5}, {lng:.5}), offering {options:?}");
        Ok(&*self.menu.insert(ContextMenu {
            screen,
            at,
            options,
        }))
    }

    pub fn dismiss_menu(&mut self) {
        self.menu = None;
    }

    /// Applies a context-menu choice. Returns the route lookup to perform when
    /// both start and end are now known and one of them changed.
    pub fn choose(&mut self, action: PickerAction) -> Result<Option<RouteQuery>, PickerError> {
        let menu = self.menu.take().ok_or(PickerError::NoMenu)?;
        let phase = self.phase();
        if !menu.options.contains(&action) {
            self.menu = Some(menu);
            return Err(PickerError::NotOffered { action, phase });
        }

        let at = menu.at;
        let selection = std::mem::replace(&mut self.selection, Selection::Empty);
        let (selection, query) = match (selection, action) {
            (Selection::Empty, PickerAction::SetStart) => {
                let start = self.place(MarkerRole::Start, at);
                (
                    Selection::HasStart {
                        start,
                        waypoint: None,
                    },
                    None,
                )
            }
            (Selection::HasStart { start, waypoint }, PickerAction::SetWaypoint) => {
                if let Some(previous) = waypoint {
                    self.surface.remove_marker(previous.marker);
                }
                let waypoint = Some(self.place(MarkerRole::Waypoint, at));
                (Selection::HasStart { start, waypoint }, None)
            }
            (Selection::HasStart { start, waypoint }, PickerAction::SetEnd) => {
                let end = self.place(MarkerRole::End, at);
                let query = self.issue(start.point, end.point, waypoint.as_ref());
                (
                    Selection::Complete {
                        start,
                        waypoint,
                        end,
                    },
                    Some(query),
                )
            }
            (
                Selection::Complete {
                    start,
                    waypoint,
                    end,
                },
                PickerAction::SetStart,
            ) => {
                self.surface.remove_marker(start.marker);
                let start = self.place(MarkerRole::Start, at);
                let query = self.issue(start.point, end.point, waypoint.as_ref());
                (
                    Selection::Complete {
                        start,
                        waypoint,
                        end,
                    },
                    Some(query),
                )
            }
            (selection, action) => {
                self.selection = selection;
                return Err(PickerError::NotOffered { action, phase });
            }
        };

        self.selection = selection;
        Ok(query)
    }

    /// Feeds back the outcome of a lookup issued by [`RoutePicker::choose`].
    ///
    /// Results for anything but the most recent query are dropped, as are
    /// failures; in both cases nothing on the map changes and no event is
    /// produced.
    pub fn apply_route(
        &mut self,
        token: FetchToken,
        result: Result<Vec<GeoPoint>, DirectionsError>,
    ) -> Option<RouteUpdateEvent> {
        let query = match self.pending {
            Some(query) if query.token == token => query,
            _ => {
                tracing::debug!("discarding stale route result {token:?}");
                return None;
            }
        };
        self.pending = None;

        let route = match result {
            Ok(route) => route,
            Err(err) => {
                tracing::warn!("route lookup failed: {err}");
                return None;
            }
        };

        if self.overlay_drawn {
            self.surface.clear_route();
        }
        self.surface.draw_route(&route);
        self.overlay_drawn = true;
        tracing::info!("route drawn with {} points", route.len());

        Some(RouteUpdateEvent {
            start: query.start,
            end: query.end,
            waypoints: query.waypoint.into_iter().collect(),
            route,
        })
    }

    /// Releases markers, overlay and the map session.
    pub fn teardown(self) {}

    fn place(&mut self, role: MarkerRole, point: GeoPoint) -> Placed<S::Marker> {
        tracing::debug!(
            "placing {role:?} marker at ({:.5}, {:.5})",
            point.latitude(),
            point.longitude()
        );
        Placed {
            point,
            marker: self.surface.place_marker(role, point),
        }
    }

    fn issue(
        &mut self,
        start: GeoPoint,
        end: GeoPoint,
        waypoint: Option<&Placed<S::Marker>>,
    ) -> RouteQuery {
        self.next_token += 1;
        let query = RouteQuery {
            token: FetchToken(self.next_token),
            start,
            end,
            waypoint: waypoint.map(|w| w.point),
        };
        tracing::info!(
            "requesting walking route ({:.5}, {:.5}) -> ({:.5}, {:.5})",
            start.latitude(),
            start.longitude(),
            end.latitude(),
            end.longitude()
        );
        self.pending = Some(query);
        query
    }
}

impl<S: MapSurface> Drop for RoutePicker<S> {
    fn drop(&mut self) {
        match std::mem::replace(&mut self.selection, Selection::Empty) {
            Selection::Empty => {}
            Selection::HasStart { start, waypoint } => {
                self.surface.remove_marker(start.marker);
                if let Some(waypoint) = waypoint {
                    self.surface.remove_marker(waypoint.marker);
                }
            }
            Selection::Complete {
                start,
                waypoint,
                end,
            } => {
                self.surface.remove_marker(start.marker);
                if let Some(waypoint) = waypoint {
                    self.surface.remove_marker(waypoint.marker);
                }
                self.surface.remove_marker(end.marker);
            }
        }
        if self.overlay_drawn {
            self.surface.clear_route();
        }
        self.pending = None;
        self.surface.teardown();
    }
}
