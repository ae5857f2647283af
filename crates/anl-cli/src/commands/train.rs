use anl_config::AnlConfig;
use anl_train::{
    DEFAULT_SPLIT, NerOptions, SentimentOptions, load_entity_data, load_sentiment_data, train_ner,
    train_sentiment,
};
use anyhow::Context;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{NerArgs, SentimentArgs, TrainCommands};
use crate::output::output;

/// Handle `anl train`.
pub fn handle(
    action: &TrainCommands,
    config: &AnlConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        TrainCommands::Ner(args) => ner(args, config, flags),
        TrainCommands::Sentiment(args) => sentiment(args, config, flags),
    }
}

fn rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

fn ner(args: &NerArgs, config: &AnlConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let data = args.data.as_ref().unwrap_or(&config.training.ner_data);
    let examples = load_entity_data(data)
        .with_context(|| format!("failed to load entity data from {}", data.display()))?;
    tracing::info!(examples = examples.len(), data = %data.display(), "entity data loaded");

    let options = NerOptions {
        model: args.model.clone(),
        output_dir: args.output.clone(),
        n_iter: args.iterations,
        ..NerOptions::default()
    };
    let report = train_ner(examples, &options, &mut rng(args.seed))
        .context("entity recognizer training failed")?;
    output(&report, flags.format)
}

fn sentiment(args: &SentimentArgs, config: &AnlConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let data = args.data.as_ref().unwrap_or(&config.training.sentiment_data);
    let mut rng = rng(args.seed);

    tracing::info!("Loading sentiment data...");
    let dataset = load_sentiment_data(data, args.limit, DEFAULT_SPLIT, &mut rng)
        .with_context(|| format!("failed to load sentiment data from {}", data.display()))?;

    let mut options = SentimentOptions {
        model: args.model.clone(),
        output_dir: args.output.clone(),
        n_iter: args.iterations,
        n_texts: args.texts,
        ..SentimentOptions::default()
    };
    if let Some(text) = &args.test_text {
        options.test_text.clone_from(text);
    }

    let report = train_sentiment(dataset, &options, &mut rng)
        .context("sentiment categorizer training failed")?;
    output(&report, flags.format)
}
