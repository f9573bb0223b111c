use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use loadstate::articles::{
  Article, ArticleRequest, ArticlesEvent, ArticlesFeature, ArticlesRepository, ARTICLES_CACHE_KEY,
};
use loadstate::config::Config;
use loadstate::transport::ApiClient;
use loadstate::{EventHandling, Feature, PaginatedState, Paginator, ViewState};

#[derive(Parser, Debug)]
#[command(name = "loadstate")]
#[command(about = "Cache-first article feed with search and paging")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/loadstate/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show the article feed, from storage when available
  List {
    /// Skip stored data and fetch a fresh copy
    #[arg(short, long)]
    refresh: bool,
  },
  /// Search articles (never cached)
  Search { query: String },
  /// Walk the paged feed until it runs out
  Pages {
    /// Stop after this many pages
    #[arg(short, long)]
    max: Option<usize>,
  },
  /// Remove the stored feed
  ClearCache,
}

/// Log to a daily file so stdout only carries rendered output.
fn init_tracing() -> Result<WorkerGuard> {
  let appender = tracing_appender::rolling::daily(Config::log_dir()?, "loadstate.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("loadstate=info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_tracing()?;

  let config = Config::load(args.config.as_deref())?;
  let token = Config::get_api_token();

  let client = ApiClient::with_reqwest(config.api_config(token.as_deref())?)?;
  let storage = config.open_storage()?;
  let repository = ArticlesRepository::new(Arc::new(client), storage.clone());

  match args.command {
    Command::List { refresh } => {
      let mut feature = ArticlesFeature::new(repository);
      let event = if refresh {
        ArticlesEvent::PullToRefresh
      } else {
        ArticlesEvent::Appeared
      };
      feature.handle(event).await;
      render(feature.state());
    }
    Command::Search { query } => {
      let mut feature = ArticlesFeature::new(repository);
      feature.handle(ArticlesEvent::SearchSubmitted(query)).await;
      render(feature.state());
    }
    Command::Pages { max } => {
      let page_size = config.pagination.page_size;
      let mut pages = Paginator::new(repository, move |page| ArticleRequest::Page { page, page_size });

      pages.load().await;
      let mut fetched = 1;
      while max.map_or(true, |max| fetched < max) && pages.load_next_page().await {
        fetched += 1;
      }
      render_pages(pages.state());
    }
    Command::ClearCache => {
      storage.remove(ARTICLES_CACHE_KEY)?;
      println!("Cleared stored articles");
    }
  }

  Ok(())
}

fn render(state: &ViewState<Vec<Article>>) {
  match state {
    ViewState::Loading => println!("Loading..."),
    ViewState::Loaded(articles) => articles.iter().for_each(print_article),
    ViewState::Empty(message) => println!("{}", message),
    ViewState::Failed(e) => eprintln!("Error: {}", e),
  }
}

fn render_pages(state: &PaginatedState<Article>) {
  state.items.iter().for_each(print_article);

  println!(
    "-- {} articles, {} pages{}",
    state.items.len(),
    state.current_page + 1,
    if state.has_next_page { ", more available" } else { "" }
  );
  if let Some(e) = &state.error {
    eprintln!("Error: {}", e);
  }
}

fn print_article(article: &Article) {
  println!(
    "{}  {:<40}  {}",
    article.publish_date.format("%Y-%m-%d"),
    article.title,
    article.author
  );
}
