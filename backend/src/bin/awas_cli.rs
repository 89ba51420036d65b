use clap::{Parser, Subcommand};
use serde::Serialize;

use awas::{
    AppState, assistant::ActionPlanRequest, config::Config, geocode::resolve_point,
    init_tracing, models::Coordinate, records::UserProfile, reports::parse_keywords,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Route planning and safety lookups from the terminal")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Split the route into at most this many segments
    #[arg(long, global = true)]
    max_segments: Option<usize>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve an address to a coordinate
    Geocode { address: String },
    /// Route between two coordinates
    Route {
        #[arg(allow_hyphen_values = true)]
        start_lat: f64,
        #[arg(allow_hyphen_values = true)]
        start_lon: f64,
        #[arg(allow_hyphen_values = true)]
        end_lat: f64,
        #[arg(allow_hyphen_values = true)]
        end_lon: f64,
    },
    /// Geocode two addresses and route between them
    Plan { from: String, to: String },
    /// Safety forecast for the stored profile location, or `--location`
    Forecast {
        #[arg(long)]
        location: Option<String>,
    },
    /// Recent news coverage of protests in a city
    Reports {
        city: String,
        /// Comma-separated keywords to filter by
        #[arg(long, default_value = "")]
        keywords: String,
        #[arg(long, default_value_t = awas::reports::DEFAULT_REPORT_LIMIT)]
        limit: usize,
    },
    /// Ask the assistant a question
    Ask { question: Vec<String> },
    /// Generate a checklist-style action plan
    ActionPlan {
        #[arg(long)]
        location: String,
        #[arg(long, default_value = "unknown")]
        weather: String,
        #[arg(long)]
        situation: String,
    },
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("awas=warn");

    let args = Args::parse();
    let config = Config::from_env()?;
    let state = AppState::from_config(&config)?;
    let max_segments = args.max_segments.unwrap_or(state.max_segments);

    match args.command {
        Command::Geocode { address } => {
            let point = resolve_point(state.geocoder.as_ref(), &address).await?;
            print_json(&point)?;
        }
        Command::Route {
            start_lat,
            start_lon,
            end_lat,
            end_lon,
        } => {
            let planned = state
                .engine
                .route(
                    Coordinate::new(start_lat, start_lon),
                    Coordinate::new(end_lat, end_lon),
                )
                .await?;
            print_json(&planned.into_response(max_segments)?)?;
        }
        Command::Plan { from, to } => {
            let geocoder = state.geocoder.as_ref();
            let (start, end) = tokio::join!(
                resolve_point(geocoder, &from),
                resolve_point(geocoder, &to)
            );
            let (start, end) = (start?, end?);
            tracing::info!("planning {} -> {}", start.label, end.label);
            let planned = state.engine.route(start.coord, end.coord).await?;
            print_json(&planned.into_response(max_segments)?)?;
        }
        Command::Forecast { location } => {
            let location = match location {
                Some(location) => Some(location),
                None => state
                    .store
                    .load::<UserProfile>()?
                    .location()
                    .map(str::to_string),
            };
            print_json(&state.forecast.forecast(location.as_deref()).await)?;
        }
        Command::Reports {
            city,
            keywords,
            limit,
        } => {
            let keywords = parse_keywords(&keywords);
            print_json(&state.reports.city_reports(&city, &keywords, limit).await?)?;
        }
        Command::Ask { question } => {
            let answer = state.assistant.ask(&question.join(" ")).await?;
            print_json(&answer)?;
        }
        Command::ActionPlan {
            location,
            weather,
            situation,
        } => {
            let plan = state
                .assistant
                .action_plan(&ActionPlanRequest {
                    location,
                    weather,
                    situation,
                })
                .await?;
            println!("{plan}");
        }
    }

    Ok(())
}
