use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moviegate_rs::browse::{BrowseOptions, GatewayClient, MovieBrowser, SortField, SortOrder};

#[derive(Parser, Debug)]
#[command(name = "moviegate")]
#[command(about = "Movie metadata gateway and browser", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "moviegate.yaml")]
    config: String,

    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP gateway (default).
    Serve,
    /// Fetch one page of movies through a running gateway.
    Browse {
        #[arg(long, default_value = "http://localhost:8080")]
        server: String,
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long)]
        sort: Option<SortField>,
        #[arg(long)]
        order: Option<SortOrder>,
        #[arg(short, long)]
        page: Option<u32>,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_filter = if args.debug {
        "moviegate_rs=debug,tower_http=debug"
    } else {
        "moviegate_rs=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match args.command.unwrap_or(Command::Serve) {
        Command::Serve => moviegate_rs::run(&args.config)
            .await
            .map_err(|e| e.to_string()),
        Command::Browse {
            server,
            query,
            sort,
            order,
            page,
        } => browse(&server, query, sort, order, page).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn browse(
    server: &str,
    query: Option<String>,
    sort: Option<SortField>,
    order: Option<SortOrder>,
    page: Option<u32>,
) -> Result<(), String> {
    let client = GatewayClient::new(server, Duration::from_secs(30)).map_err(|e| e.to_string())?;
    let browser = MovieBrowser::new(Arc::new(client), BrowseOptions::default());

    if let Some(sort) = sort {
        browser.set_sort_field(sort);
    }
    if let Some(order) = order {
        browser.set_sort_order(order);
    }
    if let Some(query) = query {
        browser.set_query(query);
    }
    if let Some(page) = page {
        browser.set_page(page);
    }

    let state = browser.settled().await;
    if let Some(error) = state.last_error {
        return Err(error);
    }

    let intent = browser.intent();
    println!(
        "page {}/{} ({} results) {}",
        state.page,
        state.total_pages,
        state.total_results,
        if intent.query.is_empty() {
            format!("sorted by {}", intent.sort_key())
        } else {
            format!("matching \"{}\"", intent.query)
        }
    );
    for movie in &state.results {
        println!(
            "{:>8}  {:<50}  {:>4.1}  {}",
            movie.id,
            movie.title,
            movie.vote_average,
            movie.release_date.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
