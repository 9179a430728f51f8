use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod analytics;
mod config;
mod db;
mod models;
mod nps;
mod projects;
mod report;
mod validation;

use config::Config;
use models::NewProject;
use nps::NpsCategory;

#[derive(Parser)]
#[command(name = "survey-analytics")]
#[command(about = "Client impact survey store and analytics", long_about = None)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load sample projects and responses
    Seed,
    /// Import survey responses from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Register a project and print its survey link
    CreateProject {
        #[arg(long)]
        name: String,
        #[arg(long)]
        sow: String,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        engagement_date: Option<NaiveDate>,
        #[arg(long)]
        engagement_type: Option<String>,
    },
    /// List projects with response counts and survey links
    Projects,
    /// Delete a project together with its responses
    DeleteProject {
        #[arg(long)]
        project: String,
    },
    /// Page through responses, newest first
    Responses {
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        category: Option<NpsCategory>,
        #[arg(long, default_value_t = 1)]
        page: i64,
        /// Responses per page, capped at 100
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Compute NPS, impact dimensions and the weekly trend
    Analytics {
        #[arg(long)]
        project: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;
    debug!(max_connections = config.max_connections, "connected to Postgres");

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} responses from {}.", csv.display());
        }
        Commands::CreateProject {
            name,
            sow,
            client,
            engagement_date,
            engagement_type,
        } => {
            let project = db::create_project(
                &pool,
                &NewProject {
                    project_name: name,
                    sow_number: sow,
                    client_name: client,
                    engagement_date,
                    engagement_type,
                },
            )
            .await?;
            println!("Created project {} ({}).", project.project_name, project.id);
            println!(
                "Survey link: {}",
                projects::survey_url(&config.base_url, &project.id)
            );
        }
        Commands::Projects => {
            let registered = db::list_projects(&pool).await?;
            if registered.is_empty() {
                println!("No projects registered.");
                return Ok(());
            }

            for project in &registered {
                let engagement = match (&project.engagement_type, project.engagement_date) {
                    (Some(kind), Some(date)) => format!("{kind}, {date}"),
                    (Some(kind), None) => kind.clone(),
                    (None, Some(date)) => date.to_string(),
                    (None, None) => "engagement not recorded".to_string(),
                };
                println!(
                    "- {} [{}] {} for {} ({}; {} responses{}; created {})",
                    project.project_name,
                    project.sow_number,
                    project.id,
                    project.client_name.as_deref().unwrap_or("unknown client"),
                    engagement,
                    project.response_count,
                    if project.is_active { "" } else { ", inactive" },
                    project.created_at.date_naive()
                );
                println!("  {}", projects::survey_url(&config.base_url, &project.id));
            }
        }
        Commands::DeleteProject { project } => {
            if db::delete_project(&pool, &project).await? {
                println!("Deleted project {project} and its responses.");
            } else {
                println!("No project with id {project}.");
            }
        }
        Commands::Responses {
            project,
            category,
            page,
            limit,
        } => {
            let (responses, pagination) =
                db::fetch_response_page(&pool, project.as_deref(), category, page, limit).await?;

            if responses.is_empty() {
                println!("No responses found.");
                return Ok(());
            }

            for response in &responses {
                println!(
                    "- {} {} {} ({}) NPS {} [{}]{}",
                    response.completed_at.format("%Y-%m-%d"),
                    response.id,
                    response.display_name(),
                    response.project_id,
                    response.experience_nps,
                    NpsCategory::classify(response.experience_nps),
                    response
                        .respondent_organization
                        .as_deref()
                        .filter(|_| !response.is_anonymous)
                        .map(|org| format!(" {org}"))
                        .unwrap_or_default()
                );
            }
            println!(
                "Page {} of {} ({} responses)",
                pagination.page, pagination.total_pages, pagination.total
            );
        }
        Commands::Analytics {
            project,
            format,
            out,
        } => {
            let responses = db::fetch_responses(&pool, project.as_deref()).await?;
            let summary = analytics::compute_analytics(analytics::filter_by_project(
                &responses,
                project.as_deref(),
            ));
            info!(
                responses = summary.overview.total_responses,
                nps = summary.overview.nps,
                "computed survey analytics"
            );

            let rendered = match format {
                OutputFormat::Json => report::to_json(&summary)?,
                OutputFormat::Markdown => {
                    report::build_report(project.as_deref(), Utc::now(), &summary, &responses)
                }
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Report written to {}.", path.display());
                }
                None => println!("{rendered}"),
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
