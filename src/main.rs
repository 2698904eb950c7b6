use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use serde::Serialize;

use seqtag::evaluation::Estimation;
use seqtag::train::{CostIndexing, Method, OptimizerKind, TrainConfig};
use seqtag::{dataset, Gazetteer, SparseVector, Tagger, TemplateSet};

/// CoNLL 2003 style BIO tagset; START/STOP are positional anchors, never
/// scorable tags, so they are not listed.
const DEFAULT_TAGSET: &[&str] = &[
    "B-PER", "B-LOC", "B-ORG", "B-MISC", "I-PER", "I-LOC", "I-ORG", "I-MISC", "O",
];

#[derive(Debug, Parser)]
#[command(version)]
#[command(propagate_version = true)]
struct Argv {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Train a model, evaluating on dev data after every epoch.
    Train {
        /// Training data (CoNLL rows: word pos chunk tag).
        #[arg(long, default_value = "ner.train")]
        train: PathBuf,
        /// Development data used by the early-stopping observer.
        #[arg(long, default_value = "ner.dev")]
        dev: PathBuf,
        #[arg(long, default_value = "gazetteer.txt")]
        gazetteer: PathBuf,
        /// Per-epoch models, predictions and the summary land here.
        #[arg(short, long, default_value = "outputs")]
        output_dir: PathBuf,
        #[arg(short, long, default_value_t = 20)]
        epochs: usize,
        #[arg(short, long, value_enum, default_value_t = Method::StructuredPerceptron)]
        method: Method,
        #[arg(long, value_enum, default_value_t = OptimizerKind::Sgd)]
        optimizer: OptimizerKind,
        #[arg(long, default_value_t = 1.0)]
        step_size: f64,
        #[arg(long, default_value_t = 0.0)]
        l2: f64,
        #[arg(long, value_enum, default_value_t = CostIndexing::PrevPosition)]
        cost_indexing: CostIndexing,
        /// Active feature templates; all of them when empty.
        #[arg(short, long)]
        features: Vec<String>,
    },
    /// Tag data with a trained model and write CoNLL predictions.
    Tag {
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value = "gazetteer.txt")]
        gazetteer: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        features: Vec<String>,
    },
}

#[derive(Debug, Serialize)]
struct EpochReport {
    epoch: usize,
    dev: Estimation,
}

#[derive(Debug, Serialize)]
struct TrainingSummary {
    config: TrainConfig,
    templates: Vec<String>,
    epochs: Vec<EpochReport>,
}

fn resolve_templates(names: &[String]) -> seqtag::Result<TemplateSet> {
    if names.is_empty() {
        Ok(TemplateSet::all())
    } else {
        TemplateSet::resolve(names)
    }
}

fn default_tagset() -> Vec<String> {
    DEFAULT_TAGSET.iter().map(|t| t.to_string()).collect()
}

fn run_train(
    train: PathBuf,
    dev: PathBuf,
    gazetteer: PathBuf,
    output_dir: PathBuf,
    config: TrainConfig,
    features: Vec<String>,
) -> seqtag::Result<()> {
    let templates = resolve_templates(&features)?;
    let tagset = default_tagset();
    let gazetteer = Gazetteer::from_file(&gazetteer)?;
    log::info!("gazetteer entries: {}", gazetteer.len());

    let train_data = dataset::read_data(&train)?;
    log::info!("training sentences: {}", train_data.len());
    let dev_data = dataset::read_data(&dev)?;
    log::info!("dev sentences: {}", dev_data.len());

    std::fs::create_dir_all(&output_dir)?;
    let mut reports: Vec<EpochReport> = Vec::new();
    let mut failure: Option<seqtag::Error> = None;

    let begin = Instant::now();
    let parameters = {
        let observer = |epoch: usize, parameters: &SparseVector| -> f64 {
            let tagger = Tagger::new(parameters, &templates, &tagset, &gazetteer);
            let result = (|| -> seqtag::Result<Estimation> {
                let est = tagger.evaluate(&dev_data)?;
                let out = File::create(output_dir.join(format!("ner.dev.out{}", epoch)))?;
                tagger.write_predictions(&mut BufWriter::new(out), &dev_data)?;
                parameters.save(output_dir.join(format!("model.iter{}", epoch)))?;
                Ok(est)
            })();
            match result {
                Ok(est) => {
                    reports.push(EpochReport { epoch, dev: est });
                    est.fmeasure
                }
                Err(e) => {
                    /* Abort training through the metric: nothing beats
                    negative infinity, so patience runs out. */
                    log::error!("observer failed on epoch {}: {}", epoch, e);
                    failure.get_or_insert(e);
                    f64::NEG_INFINITY
                }
            }
        };
        seqtag::train(&train_data, &config, &templates, &tagset, &gazetteer, observer)?
    };
    if let Some(e) = failure {
        return Err(e);
    }
    log::info!("training took: {:?}", begin.elapsed());

    parameters.save(output_dir.join("model"))?;
    let summary = TrainingSummary {
        config,
        templates: templates.names().map(|n| n.to_string()).collect(),
        epochs: reports,
    };
    let summary_file = File::create(output_dir.join("summary.json"))?;
    serde_json::to_writer_pretty(BufWriter::new(summary_file), &summary)
        .map_err(|e| seqtag::Error::Config(format!("failed to write summary: {}", e)))?;
    log::info!("model and summary written to {}", output_dir.display());
    Ok(())
}

fn run_tag(
    model: PathBuf,
    data: PathBuf,
    gazetteer: PathBuf,
    output: PathBuf,
    features: Vec<String>,
) -> seqtag::Result<()> {
    let templates = resolve_templates(&features)?;
    let tagset = default_tagset();
    let gazetteer = Gazetteer::from_file(&gazetteer)?;
    let parameters = SparseVector::load(&model)?;
    log::info!("loaded {} weights from {}", parameters.len(), model.display());

    let data = dataset::read_data(&data)?;
    let tagger = Tagger::new(&parameters, &templates, &tagset, &gazetteer);
    let out = File::create(&output)?;
    tagger.write_predictions(&mut BufWriter::new(out), &data)?;
    let estimation = tagger.evaluate(&data)?;
    log::info!(
        "precision: {:.4}, recall: {:.4}, F1: {:.4}",
        estimation.precision,
        estimation.recall,
        estimation.fmeasure
    );
    Ok(())
}

fn main() -> seqtag::Result<()> {
    env_logger::init();
    let argv = Argv::parse();
    log::info!("argv: {:?}", argv);
    match argv.command {
        Command::Train {
            train,
            dev,
            gazetteer,
            output_dir,
            epochs,
            method,
            optimizer,
            step_size,
            l2,
            cost_indexing,
            features,
        } => {
            let config = TrainConfig {
                epochs,
                method,
                optimizer,
                step_size,
                l2,
                cost_indexing,
            };
            run_train(train, dev, gazetteer, output_dir, config, features)
        }
        Command::Tag {
            model,
            data,
            gazetteer,
            output,
            features,
        } => run_tag(model, data, gazetteer, output, features),
    }
}
