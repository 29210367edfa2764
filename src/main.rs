use clap::Parser;
use muhtar::classify::{Classifier, InferenceEndpoint};
use muhtar::feed::{flatten, FeedConfig, GraphClient};
use muhtar::gazetteer::Gazetteer;
use muhtar::report;
use muhtar::resolve::{FuzzyStrategy, NeighborhoodResolver, ResolverConfig};
use muhtar::server::{self, AppState};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Muhtar — municipal complaint radar.
///
/// Pulls the town's Facebook page posts and comments, geotags each comment
/// to a known neighborhood, classifies it, and serves the rows to a
/// dashboard.
///
/// Examples:
///   muhtar "Akbayır mah. yollar çok kötü"
///   muhtar --fetch --summary
///   muhtar --fetch --gazetteer mahalleler.json
///   muhtar --serve --port 8737
#[derive(Parser)]
#[command(name = "muhtar", version, about, long_about = None)]
struct Cli {
    /// Comment text for a one-off resolution probe (positional).
    #[arg(index = 1)]
    text: Option<String>,

    /// Fetch the page feed, analyze it, and print rows as JSON.
    #[arg(long)]
    fetch: bool,

    /// Start the dashboard API server.
    #[arg(long)]
    serve: bool,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8737)]
    port: u16,

    /// Gazetteer JSON file. Defaults to the built-in Olur list.
    #[arg(long)]
    gazetteer: Option<PathBuf>,

    /// Disable the fuzzy fallback stages (exact matching only).
    #[arg(long)]
    no_fuzzy: bool,

    /// Fuzzy acceptance threshold for suffix-anchored spans (0-100).
    #[arg(long, default_value_t = 92)]
    span_threshold: u8,

    /// Fuzzy acceptance threshold for free-form text (0-100).
    #[arg(long, default_value_t = 94)]
    text_threshold: u8,

    /// How many posts to pull per fetch cycle.
    #[arg(long, default_value_t = 30)]
    limit_posts: usize,

    /// How many comments to pull per post.
    #[arg(long, default_value_t = 300)]
    limit_comments: usize,

    /// With --fetch: print per-neighborhood and per-category counts
    /// instead of the full rows.
    #[arg(long)]
    summary: bool,

    /// Complaint classifier endpoint (or MUHTAR_COMPLAINT_URL).
    #[arg(long)]
    complaint_url: Option<String>,

    /// Category classifier endpoint (or MUHTAR_CATEGORY_URL).
    #[arg(long)]
    category_url: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    // ── Gazetteer ───────────────────────────────────────────────

    let gazetteer = match &cli.gazetteer {
        Some(path) => Gazetteer::from_json_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
        None => Gazetteer::builtin_olur(),
    };
    let gazetteer = Arc::new(gazetteer);

    let resolver_config = ResolverConfig {
        span_threshold: cli.span_threshold,
        text_threshold: cli.text_threshold,
        fuzzy: if cli.no_fuzzy {
            FuzzyStrategy::Disabled
        } else {
            FuzzyStrategy::TokenSet
        },
        ..ResolverConfig::default()
    };

    let complaint_url = cli
        .complaint_url
        .clone()
        .or_else(|| std::env::var("MUHTAR_COMPLAINT_URL").ok());
    let category_url = cli
        .category_url
        .clone()
        .or_else(|| std::env::var("MUHTAR_CATEGORY_URL").ok());

    // ── Mode dispatch ───────────────────────────────────────────

    if cli.serve {
        let state = Arc::new(AppState {
            gazetteer: RwLock::new(gazetteer),
            resolver_config,
            rows: RwLock::new(Vec::new()),
            gazetteer_path: cli.gazetteer.clone(),
            limit_posts: cli.limit_posts,
            limit_comments: cli.limit_comments,
            complaint_url,
            category_url,
        });
        let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("Error: Cannot start runtime: {}", e);
            std::process::exit(1);
        });
        runtime.block_on(server::start(&cli.host, cli.port, state));
        return;
    }

    let resolver = NeighborhoodResolver::with_config(gazetteer, resolver_config);

    if cli.fetch {
        run_fetch(&cli, &resolver, complaint_url, category_url);
        return;
    }

    if let Some(ref text) = cli.text {
        run_probe(text, &resolver);
        return;
    }

    eprintln!("Error: Nothing to do.");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  muhtar \"Akbayır mah. yollar çok kötü\"");
    eprintln!("  muhtar --fetch");
    eprintln!("  muhtar --fetch --summary --gazetteer mahalleler.json");
    eprintln!("  muhtar --serve --port 8737");
    std::process::exit(1);
}

fn run_probe(text: &str, resolver: &NeighborhoodResolver) {
    let result = resolver.resolve(text);
    match &result {
        Some(r) => eprintln!("  {} ({}, score {})", r.name, r.stage, r.score),
        None => eprintln!("  no match"),
    }
    let out = match result {
        Some(r) => serde_json::json!({
            "input": text,
            "matched": true,
            "name": r.name,
            "stage": r.stage.to_string(),
            "score": r.score,
        }),
        None => serde_json::json!({ "input": text, "matched": false }),
    };
    println!("{}", serde_json::to_string_pretty(&out).unwrap());
}

fn run_fetch(
    cli: &Cli,
    resolver: &NeighborhoodResolver,
    complaint_url: Option<String>,
    category_url: Option<String>,
) {
    let config = FeedConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let client = GraphClient::new(config);

    let bundle = client
        .fetch_posts_with_comments(cli.limit_posts, cli.limit_comments)
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    let records = flatten(&bundle);
    let complaint = complaint_url.map(InferenceEndpoint::new);
    let category = category_url.map(InferenceEndpoint::new);

    let rows = report::analyze(
        records,
        resolver,
        complaint.as_ref().map(|c| c as &dyn Classifier),
        category.as_ref().map(|c| c as &dyn Classifier),
    );

    let geotagged = rows.iter().filter(|r| !r.neighborhood.is_empty()).count();
    eprintln!("  {} records, {} geotagged", rows.len(), geotagged);

    if cli.summary {
        let all: Vec<&report::AnalyzedComment> = rows.iter().collect();
        let out = serde_json::json!({
            "neighborhoods": report::summarize_by_neighborhood(&all),
            "categories": report::summarize_by_category(&all),
        });
        println!("{}", serde_json::to_string_pretty(&out).unwrap());
    } else {
        println!("{}", serde_json::to_string_pretty(&rows).unwrap());
    }
}
