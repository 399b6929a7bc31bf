//! neurosim_cli - Batch experiment driver
//!
//! Reads an experiment description from a JSON file, runs it against the
//! engine, and writes a JSON report (and optionally a binary network
//! image) with the results.
//!
//! Usage:
//!   neurosim_cli <experiment.json>

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use neurosim::prelude::*;

#[derive(Debug, Error)]
enum CliError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad experiment file: {0}")]
    Config(#[from] serde_json::Error),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("usage: neurosim_cli <experiment.json>")]
    Usage,
}

fn default_recall_sweeps() -> usize {
    4
}

fn default_epochs() -> usize {
    20
}

/// Per-field overridable competitive parameters; anything omitted in the
/// JSON falls back to the engine default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ParamsConfig {
    learning_rate: f64,
    win_value: f64,
    lose_value: f64,
    use_leaky_learning: bool,
    leaky_learning_rate: f64,
    normalize_inputs: bool,
    synapse_decay_percent: f64,
    alvarez_squire: bool,
}

impl Default for ParamsConfig {
    fn default() -> Self {
        let p = CompetitiveParams::default();
        Self {
            learning_rate: p.learning_rate,
            win_value: p.win_value,
            lose_value: p.lose_value,
            use_leaky_learning: p.use_leaky_learning,
            leaky_learning_rate: p.leaky_learning_rate,
            normalize_inputs: p.normalize_inputs,
            synapse_decay_percent: p.synapse_decay_percent,
            alvarez_squire: false,
        }
    }
}

impl ParamsConfig {
    fn to_params(&self) -> CompetitiveParams {
        CompetitiveParams {
            learning_rate: self.learning_rate,
            win_value: self.win_value,
            lose_value: self.lose_value,
            use_leaky_learning: self.use_leaky_learning,
            leaky_learning_rate: self.leaky_learning_rate,
            normalize_inputs: self.normalize_inputs,
            synapse_decay_percent: self.synapse_decay_percent,
            update_method: if self.alvarez_squire {
                UpdateMethod::AlvarezSquire
            } else {
                UpdateMethod::RummZipser
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Experiment {
    /// Store patterns in an associative memory, then recall from a cue.
    Hopfield {
        neurons: usize,
        patterns: Vec<Vec<f64>>,
        /// Cue to recall from; defaults to the first stored pattern.
        #[serde(default)]
        cue: Option<Vec<f64>>,
        #[serde(default = "default_recall_sweeps")]
        recall_sweeps: usize,
        /// Zero trained weights before storing (instead of the random
        /// construction weights).
        #[serde(default)]
        zero_weights: bool,
    },
    /// Cluster patterns with a winner-take-all output layer.
    Competitive {
        inputs: usize,
        outputs: usize,
        patterns: Vec<Vec<f64>>,
        #[serde(default = "default_epochs")]
        epochs: usize,
        #[serde(default)]
        params: ParamsConfig,
    },
}

#[derive(Debug, Deserialize)]
struct ExperimentFile {
    experiment: Experiment,
    /// Where to save the trained network image, if anywhere.
    #[serde(default)]
    image: Option<PathBuf>,
    /// Where to write the JSON report; stdout when omitted.
    #[serde(default)]
    report: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Report {
    Hopfield {
        stored_patterns: usize,
        cue: Vec<f64>,
        sweeps: Vec<Vec<f64>>,
    },
    Competitive {
        epochs: usize,
        winners: Vec<usize>,
        incoming_weights: Vec<Vec<f64>>,
    },
}

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let path = std::env::args().nth(1).ok_or(CliError::Usage)?;
    let file = File::open(&path)?;
    let config: ExperimentFile = serde_json::from_reader(file)?;
    info!("loaded experiment from {path}");

    let (report, net) = match config.experiment {
        Experiment::Hopfield {
            neurons,
            patterns,
            cue,
            recall_sweeps,
            zero_weights,
        } => run_hopfield(neurons, patterns, cue, recall_sweeps, zero_weights)?,
        Experiment::Competitive {
            inputs,
            outputs,
            patterns,
            epochs,
            params,
        } => run_competitive(inputs, outputs, patterns, epochs, &params.to_params())?,
    };

    if let Some(image_path) = &config.image {
        let mut w = BufWriter::new(File::create(image_path)?);
        net.save_image_to(&mut w)?;
        w.flush()?;
        info!("network image written to {}", image_path.display());
    }

    let json = serde_json::to_string_pretty(&report)?;
    match &config.report {
        Some(report_path) => {
            std::fs::write(report_path, json)?;
            info!("report written to {}", report_path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_hopfield(
    neurons: usize,
    patterns: Vec<Vec<f64>>,
    cue: Option<Vec<f64>>,
    recall_sweeps: usize,
    zero_weights: bool,
) -> Result<(Report, Network), CliError> {
    let mut hopfield = Hopfield::new(neurons)?;
    if zero_weights {
        for &sid in &hopfield.network().synapse_ids().to_vec() {
            hopfield.network_mut().set_strength(sid, 0.0);
        }
    }

    for pattern in &patterns {
        hopfield.set_pattern(pattern)?;
        hopfield.train()?;
    }
    info!(
        "stored {} pattern(s) in a {neurons}-neuron memory",
        patterns.len()
    );

    let cue = match cue {
        Some(c) => c,
        None => patterns
            .first()
            .cloned()
            .ok_or_else(|| EngineError::InvalidConfiguration("no patterns given".into()))?,
    };
    hopfield.set_pattern(&cue)?;

    let mut sweeps = Vec::with_capacity(recall_sweeps);
    for _ in 0..recall_sweeps {
        hopfield.update();
        sweeps.push(hopfield.pattern());
    }

    let report = Report::Hopfield {
        stored_patterns: patterns.len(),
        cue,
        sweeps,
    };
    Ok((report, hopfield.network().clone()))
}

fn run_competitive(
    inputs: usize,
    outputs: usize,
    patterns: Vec<Vec<f64>>,
    epochs: usize,
    params: &CompetitiveParams,
) -> Result<(Report, Network), CliError> {
    let mut net = Competitive::new(inputs, outputs, *params)?;

    let mut winners = vec![0usize; patterns.len()];
    for epoch in 0..epochs {
        for (i, pattern) in patterns.iter().enumerate() {
            winners[i] = net.train(pattern)?;
        }
        if epoch % 10 == 0 {
            info!("epoch {epoch}: winners {winners:?}");
        }
    }

    let mut incoming_weights = Vec::with_capacity(outputs);
    for index in 0..outputs {
        incoming_weights.push(net.incoming_weights(index)?);
    }

    let report = Report::Competitive {
        epochs,
        winners,
        incoming_weights,
    };
    Ok((report, net.network().clone()))
}
