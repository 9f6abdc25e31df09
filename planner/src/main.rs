use std::env;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use planner::assembler::assemble;
use planner::config::DEFAULT_ROUTES_API_URL;
use planner::render::MapRenderer;
use planner::{
    GoogleMapsClient, HttpRouteApi, Msg, PlannerConfig, RouteApi, Runtime, TracingRenderer,
};
use shared::LatLng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(author, version, about = "Plan a walking route and save it to the routes API")]
struct Cli {
    /// Maps web-service key (falls back to MAPS_API_KEY)
    #[arg(long, global = true)]
    maps_api_key: Option<String>,

    /// Maps web-service base URL (falls back to MAPS_API_BASE)
    #[arg(long, global = true)]
    maps_api_base: Option<String>,

    /// Routes API base URL (falls back to ROUTES_API_URL)
    #[arg(long, global = true)]
    routes_api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a route from a start address and clicked points, then save it
    Plan {
        /// Address or place name for the first waypoint
        #[arg(long)]
        start: String,

        /// Further waypoints as `lat,lng`, in walking order
        #[arg(long = "point", value_parser = parse_lat_lng)]
        points: Vec<LatLng>,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Print the request that would be saved instead of saving it
        #[arg(long)]
        dry_run: bool,
    },
    /// List saved routes, newest first
    List,
}

impl Cli {
    fn lookup(&self, key: &str) -> Option<String> {
        let flag = match key {
            "MAPS_API_KEY" => &self.maps_api_key,
            "MAPS_API_BASE" => &self.maps_api_base,
            "ROUTES_API_URL" => &self.routes_api_url,
            _ => &None,
        };
        flag.clone().or_else(|| env::var(key).ok())
    }
}

fn parse_lat_lng(raw: &str) -> Result<LatLng, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `lat,lng`, got `{raw}`"))?;
    let parse = |value: &str, label: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid {label} `{}`", value.trim()))
    };
    let point = LatLng::new(parse(lat, "latitude")?, parse(lng, "longitude")?);
    if !point.is_valid() {
        return Err(format!("`{raw}` is outside valid coordinates"));
    }
    Ok(point)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "planner=info,plan_route=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::List => {
            let base = cli
                .lookup("ROUTES_API_URL")
                .unwrap_or_else(|| DEFAULT_ROUTES_API_URL.to_string());
            let routes = HttpRouteApi::new(&base).list_routes().await?;
            if routes.is_empty() {
                println!("no saved routes");
            }
            for route in routes {
                println!(
                    "#{:<4} {:<32} {:>7.2} km  +{:.0}m/-{:.0}m  {}",
                    route.id,
                    route.name,
                    route.distance,
                    route.elevation_gain,
                    route.elevation_loss,
                    route.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Plan {
            start,
            points,
            name,
            description,
            dry_run,
        } => {
            let config = PlannerConfig::from_lookup(|key| cli.lookup(key))?;
            let renderer: Arc<dyn MapRenderer> = Arc::new(TracingRenderer::default());
            let provider = Arc::new(GoogleMapsClient::from_config(&config));
            let routes = Arc::new(HttpRouteApi::new(&config.routes_api_url));
            let (mut runtime, _sender) = Runtime::new(renderer, provider, routes);

            runtime.dispatch(Msg::PlaceSearched(start.clone()));
            runtime.settle().await;
            if runtime.model().waypoints().is_empty() {
                return Err(runtime
                    .model()
                    .last_error()
                    .unwrap_or("start place not found")
                    .into());
            }

            for point in points {
                runtime.dispatch(Msg::MapClicked {
                    lat: point.lat,
                    lng: point.lng,
                });
            }
            runtime.settle().await;

            let model = runtime.model();
            tracing::info!(
                "{} waypoints, {} segments",
                model.waypoints().len(),
                model.segments().len()
            );
            println!("{}", serde_json::to_string_pretty(&model.metrics())?);

            if *dry_run {
                let request = assemble(
                    model.waypoints(),
                    model.segments(),
                    &model.metrics(),
                    name,
                    description,
                )?;
                println!("{}", serde_json::to_string_pretty(&request)?);
                return Ok(());
            }

            runtime.dispatch(Msg::Save {
                name: name.clone(),
                description: description.clone(),
            });
            runtime.settle().await;

            match runtime.model().last_saved() {
                Some(saved) => println!("{}", serde_json::to_string_pretty(saved)?),
                None => {
                    return Err(runtime
                        .model()
                        .last_error()
                        .unwrap_or("route was not saved")
                        .into())
                }
            }
        }
    }

    Ok(())
}
