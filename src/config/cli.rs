use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the Quire binary.
#[derive(Debug, Parser)]
#[command(name = "quire", version, about = "Quire post access tool")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "QUIRE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: SettingsOverrides,

    /// Use a throwaway in-process store instead of PostgreSQL.
    #[arg(long = "in-memory", action = clap::ArgAction::SetTrue)]
    pub in_memory: bool,

    /// Print cache statistics to stderr after the command finishes.
    #[arg(long = "stats", action = clap::ArgAction::SetTrue)]
    pub stats: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SettingsOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override how long to wait for a pooled connection.
    #[arg(long = "database-acquire-timeout-ms", value_name = "MILLISECONDS")]
    pub database_acquire_timeout_ms: Option<u64>,

    /// Apply pending migrations before running the command.
    #[arg(
        long = "database-run-migrations",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub database_run_migrations: Option<bool>,

    /// Override how long a cached post stays valid.
    #[arg(long = "cache-post-ttl-ms", value_name = "MILLISECONDS")]
    pub cache_post_ttl_ms: Option<u64>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Show posts by id; repeated ids are answered from the cache.
    Show(ShowArgs),
    /// List one page of posts, newest first.
    List(ListArgs),
    /// Search titles and content for a keyword, ignoring case.
    Search(SearchArgs),
    /// List the newest posts reordered by date, views or title.
    Sorted(SortedArgs),
    /// List posts carrying a tag.
    Tagged(TaggedArgs),
    /// List the most viewed posts.
    Popular(PopularArgs),
    /// Print the number of stored posts.
    Count,
    /// Create a post.
    Create(CreateArgs),
    /// Replace the title and content of a post.
    Update(UpdateArgs),
    /// Delete a post together with its tag links and comments.
    Delete(PostIdArg),
    /// Record a view of a post.
    View(PostIdArg),
    /// Apply pending database migrations.
    Migrate,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Post ids to look up, in order.
    #[arg(value_name = "ID", required = true, num_args = 1..)]
    pub ids: Vec<i64>,
}

#[derive(Debug, Args, Clone)]
pub struct ListArgs {
    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Posts per page.
    #[arg(long = "page-size", default_value_t = 10)]
    pub page_size: u32,
}

#[derive(Debug, Args, Clone)]
pub struct SearchArgs {
    #[arg(value_name = "KEYWORD")]
    pub keyword: String,
}

#[derive(Debug, Args, Clone)]
pub struct SortedArgs {
    /// How many of the newest posts to load.
    #[arg(long, default_value_t = 20)]
    pub limit: u32,

    /// Sort key: date, views or title. Unknown keys sort by date.
    #[arg(long = "by", default_value = "date")]
    pub by: String,
}

#[derive(Debug, Args, Clone)]
pub struct TaggedArgs {
    #[arg(value_name = "TAG")]
    pub tag: String,
}

#[derive(Debug, Args, Clone)]
pub struct PopularArgs {
    #[arg(long, default_value_t = 10)]
    pub limit: u32,
}

#[derive(Debug, Args, Clone)]
pub struct CreateArgs {
    /// Id of the owning user.
    #[arg(long = "owner", value_name = "USER_ID")]
    pub owner_id: i64,

    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub content: String,

    /// Tag to attach; may be repeated.
    #[arg(long = "tag", value_name = "NAME")]
    pub tags: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct UpdateArgs {
    #[arg(value_name = "ID")]
    pub id: i64,

    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub content: String,
}

#[derive(Debug, Args, Clone)]
pub struct PostIdArg {
    #[arg(value_name = "ID")]
    pub id: i64,
}
