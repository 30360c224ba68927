use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use client_core::{
    catalog::select_category,
    views::{course_id_from_route, render_course_card, render_lesson, CourseDetailView, HomeView},
    CatalogApi, CatalogClient, CourseEditSession, CourseSnapshot, DialogOutcome, EditError,
    HttpCatalogApi,
};
use shared::domain::{Category, CourseId};
use storage::LocalStorage;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, Overrides};

#[derive(Parser, Debug)]
#[command(name = "catalog", about = "Browse and edit the course catalog")]
struct Args {
    /// Backend base URL.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Where the session is kept between runs.
    #[arg(long, global = true)]
    storage_url: Option<String>,
    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true)]
    log: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    /// List courses, optionally a single category.
    List {
        #[arg(long)]
        category: Option<Category>,
    },
    /// Show a course and its lessons. Accepts an id or a `/courses/{id}` route.
    Show { course: String },
    Edit {
        id: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        long_description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        released_at: Option<DateTime<Utc>>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(Overrides {
        api_url: args.api_url,
        storage_url: args.storage_url,
        log: args.log,
    });

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    info!(
        "config: api_url={} storage_url={}",
        settings.api_url, settings.storage_url
    );

    let api: Arc<dyn CatalogApi> = Arc::new(
        HttpCatalogApi::new(&settings.api_url)
            .with_context(|| format!("invalid api url '{}'", settings.api_url))?,
    );
    let storage = LocalStorage::new(&settings.storage_url)
        .await
        .with_context(|| format!("failed to open storage '{}'", settings.storage_url))?;
    let client = CatalogClient::start(api, Arc::new(storage))
        .await
        .context("failed to restore session")?;

    run(&client, args.command).await
}

async fn run(client: &CatalogClient, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let user = match client.auth.login(&email, &password).await {
                Ok(user) => user,
                Err(err) if err.is_unauthorized() => bail!("login rejected for {email}"),
                Err(err) => return Err(err.into()),
            };
            println!("Logged in as {} (id={})", user.email, user.id);
        }
        Command::Logout => {
            client.auth.logout().await;
            println!("Logged out");
        }
        Command::Whoami => match client.auth.current_user() {
            Some(user) => println!("{} (id={})", user.email, user.id),
            None => println!("Not logged in"),
        },
        Command::List { category } => {
            let courses = load_catalog(client).await?;
            match category {
                Some(category) => print_section(
                    category,
                    select_category(&courses, category)
                        .iter()
                        .map(render_course_card),
                ),
                None => {
                    let home = HomeView::new(&client.courses);
                    print_section(Category::Beginner, home.beginner.render().into_iter());
                    print_section(Category::Advanced, home.advanced.render().into_iter());
                }
            }
        }
        Command::Show { course } => {
            let course_id = course_id_from_route(&course).unwrap_or_else(|| CourseId::new(course));
            let view = CourseDetailView::load(Arc::clone(&client.api), course_id);
            view.done()
                .await
                .with_context(|| format!("failed to load course {}", view.course_id()))?;
            let data = view.data();
            if let Some(course) = &data.course {
                println!("{}", render_course_card(course));
            }
            for lesson in &data.lessons {
                println!("{}", render_lesson(lesson));
            }
        }
        Command::Edit {
            id,
            description,
            long_description,
            category,
            released_at,
        } => {
            load_catalog(client).await?;
            let course_id = CourseId::new(id);
            let Some(course) = client.courses.course(&course_id) else {
                bail!("no course with id {course_id}");
            };

            let mut session = CourseEditSession::open(course);
            if let Some(description) = description {
                session.description = description;
            }
            if let Some(long_description) = long_description {
                session.long_description = long_description;
            }
            if let Some(category) = category {
                session.category = category;
            }
            if released_at.is_some() {
                session.released_at = released_at;
            }

            let outcome = match session.confirm(&client.courses) {
                Ok(outcome) => outcome,
                Err(EditError::Invalid { violations, .. }) => {
                    for violation in &violations {
                        eprintln!("  {violation}");
                    }
                    bail!("course {course_id} not saved");
                }
                Err(err) => return Err(err.into()),
            };
            if let DialogOutcome::Saved { save, .. } = outcome {
                if save.outcome().await.is_err() {
                    report_messages(client);
                    bail!("course {course_id} was changed locally but not saved");
                }
                println!("Saved course {course_id}");
            }
        }
    }
    Ok(())
}

async fn load_catalog(client: &CatalogClient) -> Result<CourseSnapshot> {
    match client.courses.initial_load().await {
        Ok(courses) => Ok(courses),
        Err(err) => {
            report_messages(client);
            Err(err).context("catalog unavailable")
        }
    }
}

fn report_messages(client: &CatalogClient) {
    for message in client.messages.current_errors() {
        eprintln!("{message}");
    }
}

fn print_section(category: Category, cards: impl Iterator<Item = String>) {
    println!("== {category} ==");
    for card in cards {
        println!("{card}");
    }
}
