mod setup;

use anyhow::{anyhow, Context, Result};
use citypulse_core::assistant::{Assistant, FallbackAssistant};
use citypulse_core::community::{self, Author, CommentSort, Target};
use citypulse_core::config::{Config, CONFIG_FILE, ENV_FILE};
use citypulse_core::insight::{
    self, CrewType, FakeImpactEstimator, FakeRouteOptimizer, FakeSeverityPredictor,
    FakeWeatherProvider, ImpactEstimator, RouteOptimizer, SeverityPredictor, WeatherProvider,
};
use citypulse_core::notify::{LoggingGateway, Notifier, Recipient};
use citypulse_core::registry::{self, Region};
use citypulse_core::schema::{
    AdminProfile, Category, Coordinates, Issue, IssueStatus, MediaFile, NewIssue, Reporter, Role,
    SocialPlatform,
};
use citypulse_core::store::{IssueFilter, IssueStore, Selector};
use citypulse_core::users::{self, NewUser};
use citypulse_core::{db, geo};
use clap::{Parser, Subcommand};
use schemars::schema_for;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "citypulse")]
#[command(about = "CityPulse civic issue reporting CLI", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Document store path (overrides [store] path)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive credential setup; writes the config file and .env.local
    Setup,
    /// Report, triage and browse issues
    Issue {
        #[command(subcommand)]
        command: IssueCommands,
    },
    /// Issue counts by status and category
    Stats {
        /// Restrict to one corporation (name or six-digit code)
        #[arg(long)]
        corp: Option<String>,
    },
    /// Municipal corporation lookups
    Registry {
        #[command(subcommand)]
        command: RegistryCommands,
    },
    /// Simulated triage insights
    Predict {
        #[command(subcommand)]
        command: PredictCommands,
    },
    /// User profiles
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Community discussion board
    Community {
        #[command(subcommand)]
        command: CommunityCommands,
    },
    /// Markdown digest of the store
    Digest {
        #[command(subcommand)]
        command: DigestCommands,
    },
    /// Export canonical JSON Schemas
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
    /// Ask the help assistant a question about using CityPulse
    Ask {
        /// Question text
        #[arg(required = true)]
        message: Vec<String>,
    },
}

#[derive(Subcommand)]
enum IssueCommands {
    /// Report a new issue
    Add {
        /// Reporting user id
        #[arg(long)]
        user: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "")]
        subcategory: String,
        /// Corporation name
        #[arg(long)]
        corp: String,
        /// Six-digit code; looked up from --corp when omitted
        #[arg(long, default_value = "")]
        code: String,
        #[arg(long, default_value = "")]
        area: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long, requires = "lng")]
        lat: Option<f64>,
        #[arg(long, requires = "lat")]
        lng: Option<f64>,
        /// Attach a file (metadata only)
        #[arg(long)]
        media: Vec<PathBuf>,
    },
    /// List issues matching the filters
    List {
        #[arg(long, default_value = "all")]
        status: String,
        #[arg(long, default_value = "all")]
        category: String,
        #[arg(long, default_value = "all")]
        area: String,
        #[arg(long, default_value = "all")]
        corp: String,
        /// Only issues reported by this user
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Print one issue as JSON
    Show { id: String },
    /// Change status (admin)
    Status {
        id: String,
        status: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    Comment {
        id: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        text: String,
    },
    Upvote { id: String },
    /// Mark as escalated and post to social media
    Escalate {
        id: String,
        /// instagram or twitter; both when omitted
        #[arg(long)]
        platform: Vec<String>,
    },
    /// Issues sorted by distance
    Nearby {
        #[arg(long, requires = "lng")]
        lat: Option<f64>,
        #[arg(long, requires = "lat")]
        lng: Option<f64>,
        /// Only issues within this many kilometres
        #[arg(long)]
        radius: Option<f64>,
    },
    /// Search descriptions and reporter names
    Search {
        term: String,
        /// Search escalated issues instead
        #[arg(long)]
        escalated: bool,
        #[arg(long, requires = "escalated")]
        platform: Option<String>,
    },
}

#[derive(Subcommand)]
enum RegistryCommands {
    /// Resolve a name to its code or a code to its name
    Lookup { query: String },
    Search { query: String },
    /// Corporations grouped by region
    Regions {
        #[arg(long)]
        region: Option<String>,
    },
    /// Validate the name/code table
    Check,
}

#[derive(Subcommand)]
enum PredictCommands {
    Severity { id: String },
    Weather { location: String },
    Impact {
        location: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// Plan a crew route over two or more issues
    Route {
        ids: Vec<String>,
        #[arg(long, default_value = "general")]
        crew: String,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    Add {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        /// citizen or admin
        #[arg(long, default_value = "citizen")]
        role: String,
        /// Municipal code (admins)
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        designation: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        area: Option<String>,
    },
    Show { uid: String },
}

#[derive(Subcommand)]
enum CommunityCommands {
    Post {
        #[arg(long)]
        user: String,
        #[arg(long)]
        text: String,
    },
    Reply {
        id: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        text: String,
    },
    Like {
        id: String,
        #[arg(long)]
        user: String,
        /// React to this reply instead of the comment
        #[arg(long)]
        reply: Option<usize>,
    },
    Dislike {
        id: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        reply: Option<usize>,
    },
    List {
        /// recent, popular or trending
        #[arg(long, default_value = "recent")]
        sort: String,
    },
}

#[derive(Subcommand)]
enum DigestCommands {
    /// Write issue notes and index pages
    Build {
        #[arg(long, default_value = "digest")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Export JSON Schema files for canonical types
    Export {
        /// Output directory (default: ./schemas)
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;
    if let Some(path) = cli.db {
        config.store.path = path;
    }

    match cli.command {
        Commands::Setup => run_setup(&cli.config, config),
        Commands::Issue { command } => issue_command(&config, command),
        Commands::Stats { corp } => stats(&config, corp.as_deref()),
        Commands::Registry { command } => registry_command(command),
        Commands::Predict { command } => predict_command(&config, command),
        Commands::User { command } => user_command(&config, command),
        Commands::Community { command } => community_command(&config, command),
        Commands::Digest { command } => match command {
            DigestCommands::Build { out } => {
                let conn = db::open(&config.store.path)?;
                let summary = digest::build_digest(&conn, &out)?;
                println!(
                    "Wrote {} issue notes ({} corporations, {} community threads) to {}",
                    summary.issues,
                    summary.corporations,
                    summary.community_threads,
                    out.display()
                );
                Ok(())
            }
        },
        Commands::Schema { command } => match command {
            SchemaCommands::Export { out_dir } => schema_export(out_dir),
        },
        Commands::Ask { message } => {
            println!("{}", FallbackAssistant.respond(&message.join(" ")));
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run_setup(config_path: &Path, existing: Config) -> Result<()> {
    let stdin = io::stdin();
    let config = setup::ask_credentials(&mut stdin.lock(), &mut io::stdout(), existing)?;

    println!();
    println!("Configuring CityPulse...");
    config.save(config_path)?;
    println!("Wrote {}", config_path.display());
    fs::write(ENV_FILE, config.env_local())
        .with_context(|| format!("failed to write {ENV_FILE}"))?;
    println!("Wrote {ENV_FILE}");

    let commands = config.functions_config_commands();
    if !commands.is_empty() {
        println!();
        println!("Set the cloud function credentials with:");
        for command in commands {
            println!("  {command}");
        }
    }
    println!();
    println!("Setup completed successfully!");
    Ok(())
}

fn open_store(config: &Config) -> Result<IssueStore> {
    IssueStore::open(db::open(&config.store.path)?)
}

fn notifier(config: &Config) -> Notifier<LoggingGateway> {
    if !config.twilio.is_configured() {
        warn!("twilio credentials not configured, messages are only logged");
    }
    let authority = config.twilio.authority_number.clone().unwrap_or_default();
    Notifier::new(LoggingGateway, authority)
}

fn latency(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

fn issue_command(config: &Config, command: IssueCommands) -> Result<()> {
    let mut store = open_store(config)?;

    match command {
        IssueCommands::Add {
            user,
            description,
            category,
            subcategory,
            corp,
            code,
            area,
            address,
            lat,
            lng,
            media,
        } => {
            let profile = db::get_user(store.connection(), &user)?;
            let reporter = match &profile {
                Some(profile) => Reporter {
                    user_id: profile.uid.clone(),
                    user_name: Author::from_user(profile).user_name,
                    user_email: profile.email.clone(),
                },
                None => {
                    warn!(user = %user, "reporting user has no profile");
                    Reporter {
                        user_id: user.clone(),
                        user_name: user.clone(),
                        user_email: String::new(),
                    }
                }
            };
            let category = category.map(|value| value.parse::<Category>()).transpose()?;
            let coordinates = lat.zip(lng).map(|(lat, lng)| Coordinates { lat, lng });
            let media = media
                .iter()
                .map(|path| media_file(path))
                .collect::<Result<Vec<_>>>()?;

            let issue = store.add_issue(NewIssue {
                description,
                category,
                subcategory,
                municipal_corp: corp,
                municipal_code: code,
                area,
                address,
                coordinates,
                media,
                reporter,
            })?;
            println!("Reported issue {}", issue.id);

            let notifier = notifier(config);
            if let Some(profile) = &profile {
                let delivery = notifier.issue_confirmation(
                    &issue,
                    &Recipient {
                        display_name: Some(profile.display_name.clone())
                            .filter(|name| !name.is_empty()),
                        email: profile.email.clone(),
                        phone_number: profile.phone_number.clone(),
                    },
                );
                println!("{}", delivery.message);
            }
            if config.twilio.authority_number.is_some() {
                println!("{}", notifier.alert_authorities(&issue).message);
            }
            Ok(())
        }
        IssueCommands::List {
            status,
            category,
            area,
            corp,
            user,
            json,
        } => {
            store.set_filters(IssueFilter {
                status: status.parse::<Selector<IssueStatus>>()?,
                category: category.parse::<Selector<Category>>()?,
                area: area.parse::<Selector<String>>()?,
                municipal_corp: corp.parse::<Selector<String>>()?,
            });
            let issues: Vec<&Issue> = store
                .filtered_issues()
                .into_iter()
                .filter(|issue| user.as_deref().is_none_or(|uid| issue.user_id == uid))
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&issues)?);
            } else {
                print_issues(&issues);
            }
            Ok(())
        }
        IssueCommands::Show { id } => {
            let issue = store.issue(&id).ok_or_else(|| anyhow!("Issue not found: {id}"))?;
            println!("{}", serde_json::to_string_pretty(issue)?);
            Ok(())
        }
        IssueCommands::Status { id, status, notes } => {
            let status: IssueStatus = status.parse()?;
            let issue = store.update_issue_status(&id, status, &notes)?;
            println!("Issue {} is now {}", issue.id, issue.status);

            let phone = db::get_user(store.connection(), &issue.user_id)?
                .and_then(|reporter| reporter.phone_number);
            match phone {
                Some(phone) => {
                    let delivery = notifier(config).status_update(&issue, &phone);
                    println!("{}", delivery.message);
                }
                None => {
                    info!(id = %issue.id, "reporter has no phone number, status update not sent")
                }
            }
            Ok(())
        }
        IssueCommands::Comment { id, user, text } => {
            let author = db::get_user(store.connection(), &user)?
                .map(|profile| Author::from_user(&profile).user_name)
                .unwrap_or_else(|| user.clone());
            let issue = store.add_comment(&id, &text, &user, &author)?;
            println!("Issue {} has {} comments", issue.id, issue.comments.len());
            Ok(())
        }
        IssueCommands::Upvote { id } => {
            let issue = store.upvote_issue(&id)?;
            println!("Issue {} has {} upvotes", issue.id, issue.upvotes);
            Ok(())
        }
        IssueCommands::Escalate { id, platform } => {
            let platforms = if platform.is_empty() {
                vec![SocialPlatform::Instagram, SocialPlatform::Twitter]
            } else {
                platform
                    .iter()
                    .map(|value| value.parse::<SocialPlatform>())
                    .collect::<Result<Vec<_>, _>>()?
            };
            let issue = store.escalate_issue(&id)?;
            let posted = notifier(config).escalate(&issue, &platforms);
            for (platform, post_ref) in &posted {
                store.record_social_post(&issue.id, *platform, post_ref)?;
                println!("Posted to {}: {post_ref}", platform.as_str());
            }
            if posted.len() < platforms.len() {
                warn!(id = %issue.id, "some social posts failed");
            }
            Ok(())
        }
        IssueCommands::Nearby { lat, lng, radius } => {
            let origin = match lat.zip(lng) {
                Some((lat, lng)) => Coordinates { lat, lng },
                None => {
                    warn!("no location given, using the configured fallback");
                    config.location.fallback()
                }
            };
            let nearby = match radius {
                Some(km) => geo::within_radius(store.issues(), origin, km),
                None => geo::sort_by_distance(store.issues(), origin),
            };
            for entry in nearby {
                println!(
                    "{:>8.2} km  {}  [{}] {}",
                    entry.distance_km, entry.issue.id, entry.issue.status, entry.issue.description
                );
            }
            Ok(())
        }
        IssueCommands::Search {
            term,
            escalated,
            platform,
        } => {
            let issues = if escalated {
                let platform = platform.map(|value| value.parse::<SocialPlatform>()).transpose()?;
                store.escalated_issues(platform, Some(&term))
            } else {
                store.search(&term)
            };
            print_issues(&issues);
            Ok(())
        }
    }
}

fn media_file(path: &Path) -> Result<MediaFile> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("Invalid media path: {}", path.display()))?
        .to_string();
    let size_bytes = fs::metadata(path)
        .with_context(|| format!("cannot read {}", path.display()))?
        .len();
    Ok(MediaFile { name, size_bytes })
}

fn print_issues(issues: &[&Issue]) {
    if issues.is_empty() {
        println!("No issues found.");
        return;
    }
    for issue in issues {
        println!(
            "{}  [{}] {} / {}  {} ({})  {} upvotes",
            issue.id,
            issue.status,
            issue.category.label(),
            issue.subcategory,
            issue.area,
            issue.municipal_corp,
            issue.upvotes
        );
        println!("    {}", issue.description);
    }
}

fn stats(config: &Config, corp: Option<&str>) -> Result<()> {
    let store = open_store(config)?;
    let stats = match corp {
        Some(corp) => {
            citypulse_core::store::compute_statistics(store.issues_by_municipal_corp(corp))
        }
        None => store.statistics(),
    };
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn registry_command(command: RegistryCommands) -> Result<()> {
    match command {
        RegistryCommands::Lookup { query } => {
            let entry = registry::corporation_by_code(&query)
                .or_else(|| registry::corporation_by_name(&query))
                .ok_or_else(|| anyhow!("No municipal corporation matches {query}"))?;
            let classified = registry::classify(entry);
            println!(
                "{}  {}  ({}, {})",
                classified.code, classified.name, classified.state, classified.region
            );
            Ok(())
        }
        RegistryCommands::Search { query } => {
            for entry in registry::search(&query) {
                println!("{}  {}", entry.code, entry.name);
            }
            Ok(())
        }
        RegistryCommands::Regions { region } => {
            let regions = match region {
                Some(region) => vec![region.parse::<Region>()?],
                None => Region::ALL.to_vec(),
            };
            for region in regions {
                let entries = registry::corporations_by_region(region);
                println!("{region} ({})", entries.len());
                for entry in entries {
                    println!("  {}  {}", entry.code, entry.name);
                }
            }
            Ok(())
        }
        RegistryCommands::Check => {
            let report = registry::check_mappings();
            println!("{}/{} mappings valid", report.valid, report.total);
            for error in &report.errors {
                println!("  {error}");
            }
            if report.all_valid() {
                Ok(())
            } else {
                Err(anyhow!("{} invalid mappings", report.invalid))
            }
        }
    }
}

fn predict_command(config: &Config, command: PredictCommands) -> Result<()> {
    let sim = &config.simulation;
    match command {
        PredictCommands::Severity { id } => {
            let store = open_store(config)?;
            let issue = store.issue(&id).ok_or_else(|| anyhow!("Issue not found: {id}"))?;
            let prediction =
                FakeSeverityPredictor::new(latency(sim.severity_latency_ms)).predict(issue);
            println!("{}", serde_json::to_string_pretty(&prediction)?);
        }
        PredictCommands::Weather { location } => {
            let weather = FakeWeatherProvider::new(latency(sim.weather_latency_ms))
                .current(&location)
                .ok_or_else(|| anyhow!("A location is required for weather data"))?;
            println!("{}", serde_json::to_string_pretty(&weather)?);
            for alert in insight::weather_alerts(&weather) {
                println!("{:?}: {}", alert.kind, alert.message);
            }
            println!("Maintenance impact:");
            for impact in insight::maintenance_impact(&weather) {
                println!("  - {impact}");
            }
        }
        PredictCommands::Impact { location, category } => {
            let category = category.map(|value| value.parse::<Category>()).transpose()?;
            let impact = FakeImpactEstimator::new(latency(sim.impact_latency_ms))
                .estimate(&location, category)
                .ok_or_else(|| anyhow!("Both a location and a category are required"))?;
            println!("{}", serde_json::to_string_pretty(&impact)?);
            println!("Impact level: {:?}", insight::impact_level(impact.priority_score));
        }
        PredictCommands::Route { ids, crew } => {
            let crew: CrewType = crew.parse()?;
            let store = open_store(config)?;
            let stops = ids
                .iter()
                .map(|id| store.issue(id).ok_or_else(|| anyhow!("Issue not found: {id}")))
                .collect::<Result<Vec<_>>>()?;
            let mut optimizer = FakeRouteOptimizer::new(latency(sim.route_latency_ms));
            let route = optimizer.optimize(&stops, crew)?;
            println!("{}", serde_json::to_string_pretty(&route)?);
        }
    }
    Ok(())
}

fn user_command(config: &Config, command: UserCommands) -> Result<()> {
    let conn = db::open(&config.store.path)?;
    match command {
        UserCommands::Add {
            uid,
            email,
            name,
            phone,
            role,
            code,
            designation,
            department,
            area,
        } => {
            let role: Role = role.parse()?;
            let admin = code.map(|municipal_code| AdminProfile {
                municipal_code,
                designation,
                department,
                area_name: area,
            });
            let user = users::register(
                &conn,
                NewUser {
                    uid,
                    email,
                    display_name: name,
                    phone_number: phone,
                    role,
                    admin,
                    photo_url: None,
                },
            )?;
            println!("Registered {} as {:?}", user.uid, user.role);
        }
        UserCommands::Show { uid } => {
            let user = db::get_user(&conn, &uid)?.ok_or_else(|| anyhow!("User not found: {uid}"))?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
    }
    Ok(())
}

fn community_command(config: &Config, command: CommunityCommands) -> Result<()> {
    let conn = db::open(&config.store.path)?;
    let author_of = |uid: &str| -> Result<Author> {
        db::get_user(&conn, uid)?
            .map(|user| Author::from_user(&user))
            .ok_or_else(|| anyhow!("User not found: {uid}"))
    };
    let target_of = |reply: Option<usize>| reply.map_or(Target::Comment, Target::Reply);

    let updated = match command {
        CommunityCommands::Post { user, text } => {
            let comment = community::post_comment(&conn, &author_of(&user)?, &text)?;
            println!("Posted {}", comment.id);
            return Ok(());
        }
        CommunityCommands::Reply { id, user, text } => {
            community::reply(&conn, &id, &author_of(&user)?, &text)?
        }
        CommunityCommands::Like { id, user, reply } => {
            community::like(&conn, &id, &user, target_of(reply))?
        }
        CommunityCommands::Dislike { id, user, reply } => {
            community::dislike(&conn, &id, &user, target_of(reply))?
        }
        CommunityCommands::List { sort } => {
            let sort: CommentSort = sort.parse()?;
            let now = time::OffsetDateTime::now_utc();
            for comment in community::list(&conn, sort)? {
                println!(
                    "{}  {} ({})  +{} -{}  {} replies",
                    comment.id,
                    comment.user_name,
                    community::relative_time(&comment.timestamp, now),
                    comment.likes.len(),
                    comment.dislikes.len(),
                    comment.replies.len()
                );
                println!("    {}", comment.text);
            }
            return Ok(());
        }
    };

    let comment = updated.ok_or_else(|| anyhow!("Comment not found"))?;
    println!("Comment {} engagement {}", comment.id, comment.engagement);
    Ok(())
}

fn schema_export(out_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&out_dir)?;

    let schemas = [
        ("Issue", schema_for!(citypulse_core::schema::Issue)),
        ("User", schema_for!(citypulse_core::schema::User)),
        ("CommunityComment", schema_for!(citypulse_core::schema::CommunityComment)),
        ("MunicipalCorporation", schema_for!(citypulse_core::schema::MunicipalCorporation)),
    ];
    for (name, schema) in schemas {
        let json = serde_json::to_string_pretty(&schema)?;
        fs::write(out_dir.join(format!("{name}.schema.json")), json)?;
    }

    println!("Exported schemas to {}", out_dir.display());
    Ok(())
}
