// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `submit` and `pseudo`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::pseudo_use_case::PseudoConfig;
use crate::application::submit_use_case::SubmitConfig;
use crate::application::train_use_case::TrainConfig;
use crate::data::{augment::AugmentSettings, features::FeatureSettings};

/// The three top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the keyword classifier on a word-folder audio tree
    Train(TrainArgs),

    /// Classify the test clips and write a fname,label CSV
    Submit(SubmitArgs),

    /// Copy consensus-labelled test clips into a training tree
    Pseudo(PseudoArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directories holding <word>/*.wav folders; pass the flag more
    /// than once to train on several trees (e.g. a pseudo-label tree)
    #[arg(long = "data-dir", default_values_t = vec!["data/train/audio".to_string()])]
    pub data_dirs: Vec<String>,

    /// Directory to save model checkpoints and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Model architecture: conv-2d or conv-2d-fast
    #[arg(long, default_value = "conv-2d")]
    pub model: String,

    /// Number of clips processed together in one forward pass
    #[arg(long, default_value_t = 100)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 40)]
    pub epochs: usize,

    /// Base learning rate — the schedule steps it down after
    /// epochs 20 and 30
    #[arg(long, default_value_t = 1e-3)]
    pub base_lr: f64,

    /// Dropout probability — randomly zeroes activations during training
    /// to prevent overfitting
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Train on the 10 target words only instead of all 30
    #[arg(long, default_value_t = false)]
    pub wanted_only: bool,

    /// Chance [0,1] that a training clip is swapped for a
    /// pseudo-labelled one
    #[arg(long, default_value_t = 0.0)]
    pub pseudo_frequency: f64,

    /// Share of each partition synthesised as silence
    #[arg(long, default_value_t = 15.0)]
    pub silence_percentage: f64,

    /// Share of each partition drawn from out-of-vocabulary words
    #[arg(long, default_value_t = 7.0)]
    pub unknown_percentage: f64,

    /// Share of clips hashed into the validation partition
    #[arg(long, default_value_t = 10.0)]
    pub validation_percentage: f64,

    /// Share of clips hashed into the held-out testing partition
    #[arg(long, default_value_t = 0.0)]
    pub testing_percentage: f64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dirs:      a.data_dirs,
            checkpoint_dir: a.checkpoint_dir,
            model:          a.model,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            base_lr:        a.base_lr,
            dropout:        a.dropout,
            wanted_only:    a.wanted_only,

            pseudo_frequency: a.pseudo_frequency,

            silence_percentage:    a.silence_percentage,
            unknown_percentage:    a.unknown_percentage,
            validation_percentage: a.validation_percentage,
            testing_percentage:    a.testing_percentage,

            // The 16 kHz / 30 ms / 13-coefficient layout and the
            // distortion strengths are fixed alongside the model —
            // changing them invalidates every saved checkpoint.
            features: FeatureSettings::default(),
            augment:  AugmentSettings::default(),
        }
    }
}

/// All arguments for the `submit` command
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Directory holding the unlabelled test clips (flat *.wav)
    #[arg(long, default_value = "data/test/audio")]
    pub test_dir: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Checkpoint stem to load (e.g. ep-036-vl-0.2950);
    /// defaults to the newest one
    #[arg(long)]
    pub checkpoint: Option<String>,

    /// Path of the submission CSV to write
    #[arg(long, default_value = "submission.csv")]
    pub output: String,

    /// Clips per inference batch
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,
}

impl From<SubmitArgs> for SubmitConfig {
    fn from(a: SubmitArgs) -> Self {
        SubmitConfig {
            test_dir:       a.test_dir,
            checkpoint_dir: a.checkpoint_dir,
            checkpoint:     a.checkpoint,
            output:         a.output,
            batch_size:     a.batch_size,
        }
    }
}

/// All arguments for the `pseudo` command
#[derive(Args, Debug)]
pub struct PseudoArgs {
    /// Submission CSVs to cross-check; pass at least two
    #[arg(long = "submission", required = true, num_args = 1..)]
    pub submissions: Vec<String>,

    /// Directory holding the test clips the CSVs refer to
    #[arg(long, default_value = "data/test/audio")]
    pub test_dir: String,

    /// Root of the word-folder tree to write
    #[arg(long, default_value = "data/pseudo/audio")]
    pub out_dir: String,
}

impl From<PseudoArgs> for PseudoConfig {
    fn from(a: PseudoArgs) -> Self {
        PseudoConfig {
            submissions: a.submissions,
            test_dir:    a.test_dir,
            out_dir:     a.out_dir,
        }
    }
}
