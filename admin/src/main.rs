use admin::{
    AdminConfig, ChallengeApi, DirectionsClient, PickerSession, RoutePlan, api::created_date,
    submit,
};
use clap::{Args, Parser, Subcommand};
use shared::picker::PickerSeed;
use shared::{ChallengeForm, FieldInput, FormTransition, GeoPoint, Notice};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Manage trail challenges and their routes from the command line"
)]
struct Cli {
    /// Challenge API root (overrides CHALLENGE_API_ROOT)
    #[arg(long, global = true)]
    api_root: Option<String>,

    /// Mapbox access token (overrides MAPBOX_ACCESS_TOKEN)
    #[arg(long, global = true)]
    mapbox_token: Option<String>,

    /// Per-request timeout in seconds (overrides HTTP_TIMEOUT_SECS)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Look up a walking route and print the coordinates a challenge would store
    Route {
        #[command(flatten)]
        points: PointArgs,
    },
    /// List every challenge
    List,
    /// Create a challenge
    Create {
        #[command(flatten)]
        fields: DraftArgs,
        #[command(flatten)]
        points: PointArgs,
    },
    /// Edit an existing challenge; only the given fields change
    Edit {
        #[arg(long)]
        id: String,
        #[command(flatten)]
        fields: DraftArgs,
        #[command(flatten)]
        points: PointArgs,
    },
}

/// Route points as `lng,lat`.
#[derive(Debug, Args)]
struct PointArgs {
    #[arg(long, allow_hyphen_values = true)]
    start: Option<GeoPoint>,
    #[arg(long, allow_hyphen_values = true)]
    waypoint: Option<GeoPoint>,
    #[arg(long, allow_hyphen_values = true)]
    end: Option<GeoPoint>,
}

impl PointArgs {
    fn plan(&self) -> RoutePlan {
        RoutePlan {
            start: self.start,
            waypoint: self.waypoint,
            end: self.end,
        }
    }
}

#[derive(Debug, Args)]
struct DraftArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    challenge_name: Option<String>,
    /// Elevation gain in feet
    #[arg(long)]
    elevation_gain: Option<String>,
    /// 1 to 10
    #[arg(long)]
    difficulty: Option<String>,
    #[arg(long)]
    how_it_works: Option<String>,
    #[arg(long)]
    country_id: Option<String>,
    #[arg(long)]
    challenge_type: Option<String>,
    /// Distance in miles
    #[arg(long)]
    distance: Option<String>,
    #[arg(long)]
    price: Option<String>,
    /// First gradient colour, e.g. #000000
    #[arg(long)]
    color1: Option<String>,
    /// Second gradient colour, e.g. #FFFFFF
    #[arg(long)]
    color2: Option<String>,
    /// Image URL
    #[arg(long)]
    image: Option<String>,
    #[arg(long)]
    hide: Option<bool>,
    #[arg(long)]
    with_redemption: Option<bool>,
}

impl DraftArgs {
    fn apply(&self, form: &mut ChallengeForm) -> Result<(), shared::draft::DraftError> {
        let text = [
            ("title", &self.title),
            ("challengeName", &self.challenge_name),
            ("elevationGain", &self.elevation_gain),
            ("difficulty", &self.difficulty),
            ("howItWorks", &self.how_it_works),
            ("countryId", &self.country_id),
            ("challengeType", &self.challenge_type),
            ("distance", &self.distance),
            ("price", &self.price),
            ("color1", &self.color1),
            ("color2", &self.color2),
            ("image", &self.image),
        ];
        for (name, value) in text {
            if let Some(value) = value {
                form.set_field(name, FieldInput::Text(value.clone()))?;
            }
        }
        for (name, value) in [("isHide", self.hide), ("withRedemption", self.with_redemption)] {
            if let Some(value) = value {
                form.set_field(name, FieldInput::Checked(value))?;
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "admin=info,shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = AdminConfig::from_env()?;
    if let Some(root) = cli.api_root {
        config.api_root = root.trim_end_matches('/').to_string();
    }
    if let Some(token) = cli.mapbox_token {
        config.map.access_token = token;
    }
    if let Some(secs) = cli.timeout_secs {
        config.timeout = Some(std::time::Duration::from_secs(secs));
    }

    match cli.command {
        Command::Route { points } => {
            let mut session = PickerSession::new(DirectionsClient::new(&config)?, PickerSeed::default());
            let event = session
                .apply_plan(points.plan())
                .await?
                .ok_or("no route: set both --start and --end, or the service found none")?;
            let output = serde_json::json!({
                "coordinates": event.ordered_points(),
                "path": event.route,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::List => {
            let api = ChallengeApi::new(&config)?;
            for record in api.list().await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    record.id,
                    record.title.as_deref().unwrap_or("-"),
                    record.challenge_type.as_deref().unwrap_or("N/A"),
                    created_date(&record)
                        .map(|date| date.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }
        Command::Create { fields, points } => {
            let api = ChallengeApi::new(&config)?;
            let mut form = ChallengeForm::create();
            fields.apply(&mut form)?;
            route_into(&config, &mut form, &points).await?;
            finish(submit(&mut form, &api).await, &form)?;
        }
        Command::Edit { id, fields, points } => {
            let api = ChallengeApi::new(&config)?;
            let record = api.find(&id).await?;
            let mut form = ChallengeForm::edit(&record);
            fields.apply(&mut form)?;
            route_into(&config, &mut form, &points).await?;
            finish(submit(&mut form, &api).await, &form)?;
        }
    }

    Ok(())
}

/// Re-plans the route when points were given, on top of the stored route
/// (see [`RoutePlan::over_stored`]).
async fn route_into(
    config: &AdminConfig,
    form: &mut ChallengeForm,
    points: &PointArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let plan = points.plan();
    if plan.is_empty() {
        return Ok(());
    }
    let (plan, seed) = plan.over_stored(form.seed());
    let mut session = PickerSession::new(DirectionsClient::new(config)?, seed);
    match session.apply_plan(plan).await? {
        Some(event) => form.apply_route_update(&event),
        None => tracing::warn!("no route found, keeping the stored coordinates"),
    }
    Ok(())
}

fn finish(
    transition: Option<FormTransition>,
    form: &ChallengeForm,
) -> Result<(), Box<dyn std::error::Error>> {
    match (transition, form.notice()) {
        (Some(FormTransition::NavigateToListing), Some(Notice::Success(message))) => {
            println!("{message}");
            Ok(())
        }
        (_, Some(Notice::Error(message))) => Err(message.clone().into()),
        _ => Err("challenge was not submitted".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_flag_must_be_positive() {
        let err = Cli::try_parse_from(["trail-admin", "--timeout-secs", "0", "list"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let cli = Cli::try_parse_from(["trail-admin", "list", "--timeout-secs", "30"]).unwrap();
        assert_eq!(cli.timeout_secs, Some(30));
    }

    #[test]
    fn points_accept_negative_longitudes() {
        let cli = Cli::try_parse_from(["trail-admin", "route", "--end", "-118.23,34.06"]).unwrap();
        let Command::Route { points } = cli.command else {
            panic!("expected route command");
        };
        assert_eq!(points.end, Some(GeoPoint::new(34.06, -118.23).unwrap()));
        assert_eq!(points.start, None);
    }
}
