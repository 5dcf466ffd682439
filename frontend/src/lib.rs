use seed::{prelude::*, virtual_dom::AtValue, *};
use serde::Deserialize;
use serde_wasm_bindgen::to_value;
use shared::draft::records_from_listing;
use shared::form::{FormMode, LIST_CHALLENGES_PATH, LISTING_SCREEN};
use shared::picker::{FetchToken, MarkerRole, RouteQuery, ScreenPoint};
use shared::{
    ChallengeDraft, ChallengeForm, ChallengeRecord, DirectionsError, DirectionsResponse,
    FieldInput, FormTransition, GeoPoint, MapConfig, MapSurface, Notice, PickerAction,
    RoutePicker, SubmitOutcome, SubmitRequest,
};
use wasm_bindgen::{
    JsCast,
    prelude::{JsValue, wasm_bindgen},
};

#[wasm_bindgen(module = "/mapbox_map.js")]
extern "C" {
    #[wasm_bindgen(js_name = initMap)]
    fn init_map(container: &str, access_token: &str, style: &str, lng: f64, lat: f64, zoom: f64);
    #[wasm_bindgen(js_name = addMarker)]
    fn add_marker(id: u32, color: &str, lng: f64, lat: f64);
    #[wasm_bindgen(js_name = removeMarker)]
    fn remove_marker_js(id: u32);
    #[wasm_bindgen(js_name = setRouteOverlay)]
    fn set_route_overlay(coords: JsValue);
    #[wasm_bindgen(js_name = clearRouteOverlay)]
    fn clear_route_overlay();
    #[wasm_bindgen(js_name = destroyMap)]
    fn destroy_map();
}

const MAP_CONTAINER: &str = "map";

fn api_root() -> String {
    if let Some(url) = option_env!("FRONTEND_API_ROOT") {
        return url.trim_end_matches('/').to_string();
    }
    "http://localhost:8080".to_string()
}

fn map_config() -> MapConfig {
    MapConfig::new(option_env!("FRONTEND_MAPBOX_TOKEN").unwrap_or_default())
}

/// Map surface backed by the Mapbox GL glue in `mapbox_map.js`.
pub struct JsMapSurface {
    next_marker: u32,
}

impl JsMapSurface {
    fn mount(config: &MapConfig) -> Self {
        init_map(
            MAP_CONTAINER,
            &config.access_token,
            &config.style,
            config.center.longitude(),
            config.center.latitude(),
            config.zoom,
        );
        Self { next_marker: 0 }
    }
}

impl MapSurface for JsMapSurface {
    type Marker = u32;

    fn place_marker(&mut self, role: MarkerRole, at: GeoPoint) -> u32 {
        self.next_marker += 1;
        add_marker(self.next_marker, role.color(), at.longitude(), at.latitude());
        self.next_marker
    }

    fn remove_marker(&mut self, marker: u32) {
        remove_marker_js(marker);
    }

    fn draw_route(&mut self, path: &[GeoPoint]) {
        let coords: Vec<[f64; 2]> = path.iter().map(|point| point.lng_lat()).collect();
        match to_value(&coords) {
            Ok(value) => set_route_overlay(value),
            Err(err) => {
                web_sys::console::error_1(&format!("[frontend] route overlay: {err:?}").into())
            }
        }
    }

    fn clear_route(&mut self) {
        clear_route_overlay();
    }

    fn teardown(&mut self) {
        destroy_map();
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Page {
    Create,
    Edit(String),
}

impl Page {
    fn from_path(path: &[String]) -> Self {
        match path {
            [challenge, edit, id] if challenge == "challenge" && edit == "edit" && !id.is_empty() => {
                Page::Edit(id.clone())
            }
            _ => Page::Create,
        }
    }
}

pub struct Model {
    page: Page,
    form: ChallengeForm,
    picker: Option<RoutePicker<JsMapSurface>>,
    /// Bumped for every mounted picker so lookups from an earlier map are ignored.
    generation: u64,
    load_error: Option<String>,
}

pub enum Msg {
    MapReady,
    RecordLoaded(Result<ChallengeRecord, String>),
    FieldChanged(&'static str, FieldInput),
    MapClicked { x: f64, y: f64, lng: f64, lat: f64 },
    MenuChosen(PickerAction),
    MenuDismissed,
    RouteFetched {
        generation: u64,
        token: FetchToken,
        result: Result<Vec<GeoPoint>, DirectionsError>,
    },
    Submit,
    Submitted(SubmitOutcome),
}

#[derive(Deserialize)]
struct MapClickPayload {
    x: f64,
    y: f64,
    lng: f64,
    lat: f64,
}

pub fn init(url: Url, orders: &mut impl Orders<Msg>) -> Model {
    orders.stream(streams::window_event(Ev::from("map-click"), |event| {
        let event = event.dyn_into::<web_sys::CustomEvent>().ok()?;
        let payload: MapClickPayload = serde_wasm_bindgen::from_value(event.detail()).ok()?;
        web_sys::console::debug_1(
            &format!(
                "[frontend] map click lng={:.5} lat={:.5}",
                payload.lng, payload.lat
            )
            .into(),
        );
        Some(Msg::MapClicked {
            x: payload.x,
            y: payload.y,
            lng: payload.lng,
            lat: payload.lat,
        })
    }));

    let page = Page::from_path(url.path());
    match &page {
        Page::Create => {
            orders.after_next_render(|_| Msg::MapReady);
        }
        Page::Edit(id) => {
            orders.perform_cmd(load_record(id.clone()));
        }
    }

    Model {
        page,
        form: ChallengeForm::create(),
        picker: None,
        generation: 0,
        load_error: None,
    }
}

pub fn update(msg: Msg, model: &mut Model, orders: &mut impl Orders<Msg>) {
    match msg {
        Msg::MapReady => mount_picker(model),
        Msg::RecordLoaded(Ok(record)) => {
            model.form = ChallengeForm::edit(&record);
            model.load_error = None;
            orders.after_next_render(|_| Msg::MapReady);
        }
        Msg::RecordLoaded(Err(err)) => {
            web_sys::console::error_1(&format!("[frontend] loading challenge: {err}").into());
            model.load_error = Some(err);
        }
        Msg::FieldChanged(name, input) => {
            if let Err(err) = model.form.set_field(name, input) {
                web_sys::console::error_1(&format!("[frontend] {err}").into());
            }
        }
        Msg::MapClicked { x, y, lng, lat } => {
            if let Some(picker) = model.picker.as_mut() {
                if let Err(err) = picker.click(ScreenPoint { x, y }, lng, lat) {
                    web_sys::console::warn_1(&format!("[frontend] ignored click: {err}").into());
                }
            }
        }
        Msg::MenuDismissed => {
            if let Some(picker) = model.picker.as_mut() {
                picker.dismiss_menu();
            }
        }
        Msg::MenuChosen(action) => {
            let Some(picker) = model.picker.as_mut() else {
                return;
            };
            match picker.choose(action) {
                Ok(Some(query)) => {
                    let url = query.url(picker.config());
                    orders.perform_cmd(fetch_route(model.generation, query, url));
                }
                Ok(None) => {}
                Err(err) => web_sys::console::warn_1(&format!("[frontend] {err}").into()),
            }
        }
        Msg::RouteFetched {
            generation,
            token,
            result,
        } => {
            if generation != model.generation {
                return;
            }
            if let Err(err) = &result {
                web_sys::console::warn_1(&format!("[frontend] directions lookup: {err}").into());
            }
            let event = model
                .picker
                .as_mut()
                .and_then(|picker| picker.apply_route(token, result));
            if let Some(event) = event {
                model.form.apply_route_update(&event);
            }
        }
        Msg::Submit => {
            if let Some(request) = model.form.begin_submit() {
                orders.perform_cmd(send_submission(request));
            }
        }
        Msg::Submitted(outcome) => {
            if model.form.finish_submit(outcome) == FormTransition::NavigateToListing {
                Url::go_and_load_with_str(LISTING_SCREEN);
            }
        }
    }
}

/// Replaces any mounted picker with a fresh one seeded from the form.
fn mount_picker(model: &mut Model) {
    model.picker = None;
    model.generation += 1;
    let config = map_config();
    let surface = JsMapSurface::mount(&config);
    model.picker = Some(RoutePicker::new(surface, config, model.form.seed()));
}

async fn fetch_route(generation: u64, query: RouteQuery, url: String) -> Msg {
    web_sys::console::debug_1(
        &format!(
            "[frontend] directions lookup start={:?} end={:?}",
            query.start.lng_lat(),
            query.end.lng_lat()
        )
        .into(),
    );
    let result = match Request::new(url).fetch().await {
        Err(err) => Err(DirectionsError::Transport(format!("{err:?}"))),
        Ok(raw) => match raw.json::<DirectionsResponse>().await {
            Ok(body) => body.into_first_path(),
            Err(err) => Err(DirectionsError::Transport(format!("{err:?}"))),
        },
    };
    Msg::RouteFetched {
        generation,
        token: query.token,
        result,
    }
}

async fn send_submission(request: SubmitRequest) -> Msg {
    let url = format!("{}{}", api_root(), request.endpoint.path());
    let outcome = match Request::new(url).method(Method::Post).json(&request.payload) {
        Err(err) => {
            web_sys::console::error_1(&format!("[frontend] encoding challenge: {err:?}").into());
            SubmitOutcome::transport_error()
        }
        Ok(request) => match request.fetch().await {
            Err(err) => {
                web_sys::console::error_1(&format!("[frontend] submitting: {err:?}").into());
                SubmitOutcome::transport_error()
            }
            Ok(response) => {
                let status = response.status().code;
                match response.bytes().await {
                    Ok(body) => SubmitOutcome::from_response(status, &body),
                    Err(err) => {
                        web_sys::console::error_1(&format!("[frontend] reading reply: {err:?}").into());
                        SubmitOutcome::transport_error()
                    }
                }
            }
        },
    };
    Msg::Submitted(outcome)
}

async fn load_record(id: String) -> Msg {
    let url = format!("{}{LIST_CHALLENGES_PATH}", api_root());
    let response = match Request::new(url).method(Method::Post).fetch().await {
        Err(err) => Err(format!("{err:?}")),
        Ok(raw) => match raw.check_status() {
            Err(status_err) => Err(format!("{status_err:?}")),
            Ok(resp) => match resp.json::<serde_json::Value>().await {
                Ok(body) => records_from_listing(body)
                    .into_iter()
                    .find(|record| record.id == id)
                    .ok_or_else(|| format!("challenge {id} not found")),
                Err(err) => Err(format!("{err:?}")),
            },
        },
    };
    Msg::RecordLoaded(response)
}

pub fn view(model: &Model) -> Node<Msg> {
    let title = match model.form.mode() {
        FormMode::Create => "Add Challenge",
        FormMode::Edit { .. } => "Edit Challenge",
    };
    if let Some(err) = &model.load_error {
        return div![C!["app-container"], h1![title], p![C!["error"], err]];
    }
    if matches!(model.page, Page::Edit(_)) && matches!(model.form.mode(), FormMode::Create) {
        return div![C!["app-container"], h1![title], p!["Loading challenge..."]];
    }

    div![
        C!["app-container"],
        h1![title],
        view_notice(model.form.notice()),
        view_form(&model.form),
        view_map(model),
    ]
}

fn view_notice(notice: Option<&Notice>) -> Node<Msg> {
    match notice {
        Some(Notice::Success(message)) => p![C!["success"], message],
        Some(Notice::Error(message)) => p![C!["error"], message],
        None => empty![],
    }
}

/// Label, wire name and input type of each text field, in display order.
const TEXT_FIELDS: [(&str, &str, &str); 12] = [
    ("Title", "title", "text"),
    ("Challenge Name", "challengeName", "text"),
    ("Elevation Gain (ft)", "elevationGain", "number"),
    ("Difficulty (1-10)", "difficulty", "number"),
    ("How It Works", "howItWorks", "text"),
    ("Country", "countryId", "text"),
    ("Challenge Type", "challengeType", "text"),
    ("Distance (miles)", "distance", "number"),
    ("Price", "price", "number"),
    ("Gradient Color 1", "color1", "text"),
    ("Gradient Color 2", "color2", "text"),
    ("Image URL", "image", "url"),
];

fn text_value<'a>(draft: &'a ChallengeDraft, name: &str) -> &'a str {
    match name {
        "title" => &draft.title,
        "challengeName" => &draft.challenge_name,
        "elevationGain" => &draft.elevation_gain,
        "difficulty" => &draft.difficulty,
        "howItWorks" => &draft.how_it_works,
        "countryId" => &draft.country_id,
        "challengeType" => &draft.challenge_type,
        "distance" => &draft.distance,
        "price" => &draft.price,
        "color1" => &draft.color1,
        "color2" => &draft.color2,
        "image" => &draft.image,
        _ => "",
    }
}

fn view_form(form: &ChallengeForm) -> Node<Msg> {
    let draft = form.draft();
    let text_inputs = TEXT_FIELDS.iter().map(|&(label, name, kind)| {
        div![
            C!["input-field"],
            label![label],
            input![
                attrs! {
                    At::Type => kind,
                    At::Name => name,
                    At::Value => text_value(draft, name),
                    At::AutoComplete => "off",
                },
                input_ev(Ev::Input, move |value| {
                    Msg::FieldChanged(name, FieldInput::Text(value))
                }),
            ]
        ]
    });
    let checkbox = |label: &str, name: &'static str, checked: bool| {
        label![
            input![
                attrs! {
                    At::Type => "checkbox",
                    At::Name => name,
                    At::Checked => bool_attr(checked),
                },
                ev(Ev::Change, move |_| {
                    Msg::FieldChanged(name, FieldInput::Checked(!checked))
                }),
            ],
            span![label],
        ]
    };

    form![
        C!["controls"],
        fieldset![legend!["Challenge"], text_inputs],
        fieldset![
            legend!["Options"],
            checkbox("Hide", "isHide", draft.is_hide),
            checkbox("With Redemption", "withRedemption", draft.with_redemption),
        ],
        p![format!(
            "{} route points selected",
            draft.route.coordinates.len()
        )],
        button![
            match form.mode() {
                FormMode::Create => "Add Challenge",
                FormMode::Edit { .. } => "Update Challenge",
            },
            ev(Ev::Click, |event| {
                event.prevent_default();
                Msg::Submit
            }),
            attrs! { At::Disabled => bool_attr(form.pending()) },
        ],
    ]
}

fn view_map(model: &Model) -> Node<Msg> {
    let menu = model
        .picker
        .as_ref()
        .and_then(|picker| picker.menu())
        .map(|menu| {
            let options = menu.options.iter().map(|&action| {
                li![
                    C!["menu-option"],
                    action.label(),
                    ev(Ev::Click, move |_| Msg::MenuChosen(action)),
                ]
            });
            ul![
                C!["context-menu"],
                style! {
                    St::Position => "absolute",
                    St::Left => format!("{}px", menu.screen.x),
                    St::Top => format!("{}px", menu.screen.y),
                },
                options,
                li![
                    C!["menu-option", "cancel"],
                    "Cancel",
                    ev(Ev::Click, |_| Msg::MenuDismissed),
                ],
            ]
        })
        .unwrap_or_else(|| empty![]);

    div![
        C!["map-wrapper"],
        style! { St::Position => "relative" },
        div![id![MAP_CONTAINER], C!["map"]],
        menu,
    ]
}

#[wasm_bindgen(start)]
pub fn start() {
    App::start("app", init, update, view);
}

fn bool_attr(value: bool) -> AtValue {
    if value {
        AtValue::Some("true".into())
    } else {
        AtValue::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| part.to_string()).collect()
    }

    #[test]
    fn test_page_from_path() {
        assert_eq!(Page::from_path(&path(&["challenge", "new"])), Page::Create);
        assert_eq!(
            Page::from_path(&path(&["challenge", "edit", "abc123"])),
            Page::Edit("abc123".to_string())
        );
        assert_eq!(Page::from_path(&path(&["challenge", "edit", ""])), Page::Create);
        assert_eq!(Page::from_path(&path(&[])), Page::Create);
    }

    #[test]
    fn test_text_fields_are_writable() {
        let mut draft = ChallengeDraft::default();
        for (_, name, _) in TEXT_FIELDS {
            draft
                .set_field(name, FieldInput::Text(format!("{name}-value")))
                .unwrap();
            assert_eq!(text_value(&draft, name), format!("{name}-value"));
        }
    }

    #[test]
    fn test_unknown_field_reads_empty() {
        assert_eq!(text_value(&ChallengeDraft::default(), "isHide"), "");
    }

    #[test]
    fn test_map_click_payload_shape() {
        let payload: MapClickPayload = serde_json::from_value(serde_json::json!({
            "x": 120.0, "y": 48.5, "lng": -118.24, "lat": 34.05
        }))
        .unwrap();
        assert_eq!((payload.x, payload.y), (120.0, 48.5));
        assert_eq!((payload.lng, payload.lat), (-118.24, 34.05));
    }
}
