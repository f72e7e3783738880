use std::{io::Write, process, sync::Arc};

use quire::{
    application::{
        error::AppError,
        pagination::{PageRequest, page_count},
        posts::PostService,
        repos::{PostsRepo, PostsWriteRepo, TagsRepo},
    },
    cache::CacheConfig,
    config::{self, Command},
    domain::{
        entities::{PostId, PostRecord},
        posts::{PostDraft, PostEdit},
        sort::PostSortKey,
    },
    infra::{db::PostgresRepositories, error::InfraError, memory::InMemoryRepositories, telemetry},
};
use serde::Serialize;
use serde_json::json;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    if dispatcher::has_been_set() {
        error!(error = %report.chain(), source = report.source, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %report.chain(), source = report.source, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        Command::Migrate => {
            if cli_args.in_memory {
                return Err(InfraError::configuration(
                    "migrate needs a database; drop --in-memory",
                )
                .into());
            }
            run_migrations(&settings).await
        }
        command => {
            let service = if cli_args.in_memory {
                build_service(Arc::new(InMemoryRepositories::new()), &settings)
            } else {
                build_service(Arc::new(init_postgres(&settings).await?), &settings)
            };

            let result = execute(&service, command).await;

            if cli_args.stats {
                eprintln!("{}", service.get_cache_stats());
            }
            result
        }
    }
}

fn build_service<R>(repositories: Arc<R>, settings: &config::Settings) -> PostService
where
    R: PostsRepo + PostsWriteRepo + TagsRepo + 'static,
{
    PostService::new(
        repositories.clone(),
        repositories.clone(),
        repositories,
        &CacheConfig::from(&settings.cache),
    )
}

async fn connect_pool(settings: &config::Settings) -> Result<sqlx::PgPool, InfraError> {
    let url = settings.database.url.as_deref().ok_or_else(|| {
        InfraError::configuration("database.url must be set unless --in-memory is used")
    })?;

    PostgresRepositories::connect(
        url,
        settings.database.max_connections.get(),
        settings.database.acquire_timeout,
    )
    .await
    .map_err(|err| InfraError::database(err.to_string()))
}

async fn init_postgres(settings: &config::Settings) -> Result<PostgresRepositories, InfraError> {
    let pool = connect_pool(settings).await?;

    if settings.database.run_migrations {
        PostgresRepositories::run_migrations(&pool).await?;
        info!(target = "quire::migrations", "database migrations applied");
    }

    let repositories = PostgresRepositories::new(pool);
    repositories
        .health_check()
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    Ok(repositories)
}

async fn run_migrations(settings: &config::Settings) -> Result<(), AppError> {
    let pool = connect_pool(settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;
    info!(target = "quire::migrations", "database migrations applied");
    print_json(&json!({ "migrated": true }))
}

#[derive(Serialize)]
struct PostPage {
    page: u32,
    page_size: u32,
    total: u64,
    page_count: u64,
    posts: Vec<PostRecord>,
}

async fn execute(service: &PostService, command: Command) -> Result<(), AppError> {
    match command {
        Command::Show(args) => {
            let mut posts = Vec::with_capacity(args.ids.len());
            for id in args.ids {
                posts.push(require_post(service, id).await?);
            }
            print_json(&posts)
        }
        Command::List(args) => {
            let request = PageRequest::new(args.page, args.page_size);
            let posts = service
                .get_posts_page(request.page(), args.page_size)
                .await?;
            let total = service.get_total_post_count().await?;
            print_json(&PostPage {
                page: request.page(),
                page_size: args.page_size,
                total,
                page_count: page_count(total, args.page_size),
                posts,
            })
        }
        Command::Search(args) => print_json(&service.search_posts(&args.keyword).await?),
        Command::Sorted(args) => {
            let posts = service
                .get_sorted_posts(args.limit, PostSortKey::parse(&args.by))
                .await?;
            print_json(&posts)
        }
        Command::Tagged(args) => print_json(&service.get_posts_by_tag(&args.tag).await?),
        Command::Popular(args) => print_json(&service.get_most_viewed_posts(args.limit).await?),
        Command::Count => {
            let total = service.get_total_post_count().await?;
            print_json(&json!({ "total": total }))
        }
        Command::Create(args) => {
            let draft = PostDraft::new(args.owner_id, args.title, args.content)?;
            let post = service.create_post(&draft, &args.tags).await?;
            print_json(&post)
        }
        Command::Update(args) => {
            let edit = PostEdit::new(args.id, args.title, args.content)?;
            if !service.update_post(&edit).await? {
                return Err(AppError::PostNotFound(args.id));
            }
            print_json(&require_post(service, args.id).await?)
        }
        Command::Delete(args) => {
            if !service.delete_post(args.id).await? {
                return Err(AppError::PostNotFound(args.id));
            }
            print_json(&json!({ "deleted": args.id }))
        }
        Command::View(args) => {
            service.increment_view_count(args.id).await?;
            print_json(&require_post(service, args.id).await?)
        }
        Command::Migrate => Err(AppError::unexpected(
            "migrations run before any post service is built",
        )),
    }
}

async fn require_post(service: &PostService, id: PostId) -> Result<PostRecord, AppError> {
    service
        .get_post(id)
        .await?
        .ok_or(AppError::PostNotFound(id))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    writeln!(handle).map_err(InfraError::from)?;
    Ok(())
}
