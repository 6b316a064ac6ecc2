use std::env;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use eatwell_core::config::Config;
use eatwell_embed::get_default_provider;
use eatwell_hybrid::{ScoringEngine, TurnReport};

const HELP: &str = "Type a message to score it. Commands: score (s), export (e), reset (r), quit (q)";

fn init_tracing() {
    let filter = EnvFilter::try_from_env("EATWELL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn print_turn(report: &TurnReport) {
    for (id, terms) in &report.new_terms {
        if !terms.is_empty() {
            let list: Vec<&str> = terms.iter().map(String::as_str).collect();
            println!("  + {}: {}", id, list.join(", "));
        }
    }
    for warning in &report.warnings {
        println!("  ! {warning}");
    }
    println!("  total {}/{}", report.score.total, report.score.max_possible);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {e}"); e })?;
    let conversation = env::args().nth(1).unwrap_or_else(|| "default".to_string());

    let scoring = config.scoring()?;
    let embedding = config.embedding()?;
    let provider = get_default_provider(&embedding)?;
    let warm = scoring.warm_up;
    let engine = ScoringEngine::new(config.catalog()?, scoring, provider)?;
    if warm {
        match engine.warm_up(embedding.batch_size).await {
            Ok(n) => info!(keywords = n, "warm-up complete"),
            Err(e) => warn!(error = %e, "warm-up failed; keywords will be embedded on demand"),
        }
    }

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "q" => break,
            "score" | "s" => {
                let score = engine.get_score(&conversation).await;
                for c in &score.categories {
                    println!("  {:<28} {:>2}/{:<2} {}", c.name, c.points, c.max_points, c.matched_terms.join(", "));
                }
                println!("{}", score.summary());
            }
            "export" | "e" => match engine.export_state(&conversation).await {
                Ok(state) => println!("{}", serde_json::to_string_pretty(&state)?),
                Err(e) => eprintln!("{e}"),
            },
            "reset" | "r" => {
                engine.reset(&conversation).await;
                println!("  conversation '{conversation}' cleared");
            }
            text => match engine.record_turn(&conversation, text).await {
                Ok(report) => print_turn(&report),
                Err(e) => eprintln!("  rejected: {e}"),
            },
        }
    }
    Ok(())
}
