// src/bin/similarity_threshold_tuner.rs
//
// Scores a file of labelled name pairs with the hybrid scorer and reports
// precision, recall and F1 across the threshold sweep, then recommends the
// threshold with the best F1.
//
// Input is a JSON array: [{ "s1": "...", "s2": "...", "is_duplicate": true }, ...]

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};

use dedupe_lib::models::similarity::SimilarityWeights;
use dedupe_lib::similarity::evaluation::{
    evaluate_scores, optimal_threshold, sweep_thresholds, LabeledPair,
};
use dedupe_lib::similarity::SimilarityService;
use dedupe_lib::utils::config::ResolutionConfig;
use dedupe_lib::utils::env::load_env;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct TunerArgs {
    /// JSON file of labelled pairs
    pairs: PathBuf,

    /// Weights to evaluate: jaro_winkler,lcs,phonetic,ngram,jaccard
    #[arg(long)]
    weights: Option<String>,
}

fn load_pairs(path: &Path) -> Result<Vec<LabeledPair>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read labelled pairs from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse labelled pairs in {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    load_env();
    info!("Starting Similarity Threshold Tuner...");

    let args = TunerArgs::parse();
    let config = ResolutionConfig::from_env();
    let service = SimilarityService::from_config(&config)?;
    if let Some(raw) = &args.weights {
        let weights = SimilarityWeights::parse_list(raw)?;
        service.set_weights(Some(&weights))?;
    }
    info!("Evaluating with weights {:?}", service.current_weights());

    let pairs = load_pairs(&args.pairs)?;
    if pairs.is_empty() {
        bail!("{} contains no labelled pairs", args.pairs.display());
    }
    info!("Loaded {} labelled pairs", pairs.len());

    let scoring_pb = ProgressBar::new(pairs.len() as u64);
    scoring_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("█▉▊▋▌▍▎▏  "),
    );
    scoring_pb.set_message("Scoring labelled pairs...");

    let mut scored: Vec<(f64, bool)> = Vec::with_capacity(pairs.len());
    let mut skipped = 0usize;
    for pair in &pairs {
        match service.similarity(&pair.s1, &pair.s2) {
            Ok(score) => scored.push((score, pair.is_duplicate)),
            Err(e) => {
                warn!("Skipping pair ('{}', '{}'): {}", pair.s1, pair.s2, e);
                skipped += 1;
            }
        }
        scoring_pb.inc(1);
    }
    scoring_pb.finish_with_message("Scoring complete.");

    if scored.is_empty() {
        bail!("No pair could be scored");
    }
    let positives = scored.iter().filter(|(_, dup)| *dup).count();
    println!(
        "\nScored {} pairs ({} duplicates, {} distinct, {} skipped)\n",
        scored.len(),
        positives,
        scored.len() - positives,
        skipped
    );

    println!("Threshold | Precision | Recall | F1     | Accuracy | TP   FP   FN   TN");
    for threshold in sweep_thresholds() {
        let m = evaluate_scores(&scored, threshold);
        println!(
            "{:>9.2} | {:>9.4} | {:>6.4} | {:>6.4} | {:>8.4} | {:<4} {:<4} {:<4} {:<4}",
            threshold,
            m.precision(),
            m.recall(),
            m.f1_score(),
            m.accuracy(),
            m.true_positives,
            m.false_positives,
            m.false_negatives,
            m.true_negatives
        );
    }

    let (best, metrics) = optimal_threshold(&scored);
    println!("\nRecommended threshold: {:.2}", best);
    println!("{}", metrics);
    Ok(())
}
