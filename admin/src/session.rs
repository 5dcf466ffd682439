use shared::picker::{PickerAction, PickerSeed, RoutePicker, ScreenPoint};
use shared::{ChallengeForm, FormTransition, GeoPoint, RouteUpdateEvent};

use crate::api::ChallengeApi;
use crate::directions::DirectionsClient;
use crate::error::AdminError;
use crate::surface::HeadlessSurface;

/// Points to place, in slot order. Only the points that are set are placed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RoutePlan {
    pub start: Option<GeoPoint>,
    pub waypoint: Option<GeoPoint>,
    pub end: Option<GeoPoint>,
}

impl RoutePlan {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.waypoint.is_none() && self.end.is_none()
    }

    /// Plan and picker seed for placing these points over a stored route.
    ///
    /// A lone start keeps the stored end. Points given without a start build
    /// on the stored start, and a lone waypoint is closed with the stored end.
    pub fn over_stored(self, stored: PickerSeed) -> (RoutePlan, PickerSeed) {
        match (self.start, self.waypoint, self.end) {
            (None, None, None) => (self, PickerSeed::default()),
            (Some(_), None, None) => (self, stored),
            (None, waypoint, end) => (
                RoutePlan {
                    start: None,
                    waypoint,
                    end: end.or(stored.end),
                },
                PickerSeed {
                    start: stored.start,
                    end: None,
                },
            ),
            _ => (self, PickerSeed::default()),
        }
    }
}

/// Drives a [`RoutePicker`] on a headless surface, performing lookups
/// through the directions service as the picker requests them.
pub struct PickerSession {
    picker: RoutePicker<HeadlessSurface>,
    directions: DirectionsClient,
}

impl PickerSession {
    pub fn new(directions: DirectionsClient, seed: PickerSeed) -> Self {
        let picker = RoutePicker::new(
            HeadlessSurface::default(),
            directions.config().clone(),
            seed,
        );
        Self { picker, directions }
    }

    pub fn picker(&self) -> &RoutePicker<HeadlessSurface> {
        &self.picker
    }

    /// Clicks `at`, chooses `action`, and runs the lookup if one is due.
    /// Returns the emitted update, if any.
    pub async fn place(
        &mut self,
        action: PickerAction,
        at: GeoPoint,
    ) -> Result<Option<RouteUpdateEvent>, AdminError> {
        self.picker
            .click(ScreenPoint::default(), at.longitude(), at.latitude())?;
        let Some(query) = self.picker.choose(action)? else {
            return Ok(None);
        };
        let result = self.directions.walking_route(&query).await;
        Ok(self.picker.apply_route(query.token, result))
    }

    /// Places every point of the plan; the last emitted update wins.
    pub async fn apply_plan(
        &mut self,
        plan: RoutePlan,
    ) -> Result<Option<RouteUpdateEvent>, AdminError> {
        let steps = [
            (PickerAction::SetStart, plan.start),
            (PickerAction::SetWaypoint, plan.waypoint),
            (PickerAction::SetEnd, plan.end),
        ];
        let mut latest = None;
        for (action, point) in steps {
            if let Some(point) = point {
                if let Some(event) = self.place(action, point).await? {
                    latest = Some(event);
                }
            }
        }
        Ok(latest)
    }
}

/// Runs one submission round trip for `form`. `None` when nothing was sent
/// (already pending or invalid draft; see [`ChallengeForm::notice`]).
pub async fn submit(form: &mut ChallengeForm, api: &ChallengeApi) -> Option<FormTransition> {
    let request = form.begin_submit()?;
    let outcome = api.submit(&request).await;
    Some(form.finish_submit(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    fn stored() -> PickerSeed {
        PickerSeed {
            start: Some(point(1.0, 1.0)),
            end: Some(point(2.0, 2.0)),
        }
    }

    #[test]
    fn lone_start_keeps_stored_end() {
        let plan = RoutePlan {
            start: Some(point(0.5, 0.5)),
            ..RoutePlan::default()
        };
        assert_eq!(plan.over_stored(stored()), (plan, stored()));
    }

    #[test]
    fn end_without_start_builds_on_stored_start() {
        let plan = RoutePlan {
            end: Some(point(3.0, 3.0)),
            ..RoutePlan::default()
        };
        let (plan, seed) = plan.over_stored(stored());
        assert_eq!(plan.end, Some(point(3.0, 3.0)));
        assert_eq!(
            seed,
            PickerSeed {
                start: Some(point(1.0, 1.0)),
                end: None,
            }
        );
    }

    #[test]
    fn lone_waypoint_is_closed_with_stored_end() {
        let plan = RoutePlan {
            waypoint: Some(point(1.5, 1.5)),
            ..RoutePlan::default()
        };
        let (plan, seed) = plan.over_stored(stored());
        assert_eq!(
            plan,
            RoutePlan {
                start: None,
                waypoint: Some(point(1.5, 1.5)),
                end: Some(point(2.0, 2.0)),
            }
        );
        assert_eq!(seed.start, Some(point(1.0, 1.0)));
        assert_eq!(seed.end, None);
    }

    #[test]
    fn full_plan_starts_from_scratch() {
        let plan = RoutePlan {
            start: Some(point(0.0, 0.0)),
            waypoint: None,
            end: Some(point(3.0, 3.0)),
        };
        assert_eq!(plan.over_stored(stored()), (plan, PickerSeed::default()));
    }
}
