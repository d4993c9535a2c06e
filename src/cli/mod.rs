// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`  — trains the classifier on the word-folder tree
//   2. `submit` — classifies the test clips into a fname,label CSV
//   3. `pseudo` — mines consensus labels out of old submissions
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PseudoArgs, SubmitArgs, TrainArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "speech-kws",
    version = "0.1.0",
    about = "Train a keyword-spotting CNN on short speech clips, then classify test audio."
)]
pub struct Cli {
    /// The subcommand to run (train, submit or pseudo)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    ///
    /// The match consumes `self`: the args structs own their strings,
    /// so they move out of the enum and into the handlers.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)  => Self::run_train(args),
            Commands::Submit(args) => Self::run_submit(args),
            Commands::Pseudo(args) => Self::run_pseudo(args),
        }
    }

    /// Handles the `train` subcommand.
    /// Converts CLI args into a TrainConfig and hands off to Layer 2.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on audio in: {:?}", args.data_dirs);

        // Convert CLI args → application config (separates presentation from domain)
        let use_case = TrainUseCase::new(args.into());
        use_case.execute()?;

        println!("Training complete. Checkpoints saved.");
        Ok(())
    }

    /// Handles the `submit` subcommand.
    /// Classifies every test clip and writes the submission CSV.
    fn run_submit(args: SubmitArgs) -> Result<()> {
        use crate::application::submit_use_case::SubmitUseCase;

        let output = args.output.clone();
        let use_case = SubmitUseCase::new(args.into());
        use_case.execute()?;

        println!("Submission written to {}", output);
        Ok(())
    }

    /// Handles the `pseudo` subcommand.
    /// Copies consensus-labelled test clips into a training tree.
    fn run_pseudo(args: PseudoArgs) -> Result<()> {
        use crate::application::pseudo_use_case::PseudoUseCase;

        let out_dir = args.out_dir.clone();
        let use_case = PseudoUseCase::new(args.into());
        use_case.execute()?;

        println!("Pseudo-labelled clips written to {}", out_dir);
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;

    #[test]
    fn train_args_parse_with_original_defaults() {
        let cli = Cli::try_parse_from(["speech-kws", "train"]).unwrap();
        let Commands::Train(args) = cli.command else {
            panic!("expected the train subcommand");
        };

        let cfg = TrainConfig::from(args);
        assert_eq!(cfg.data_dirs, vec!["data/train/audio".to_string()]);
        assert_eq!(cfg.model, "conv-2d");
        assert_eq!(cfg.batch_size, 100);
        assert_eq!(cfg.epochs, 40);
        assert_eq!(cfg.silence_percentage, 15.0);
        assert_eq!(cfg.unknown_percentage, 7.0);
        assert_eq!(cfg.validation_percentage, 10.0);
    }

    #[test]
    fn run_consumes_the_parsed_command() {
        // Dispatch must move the owned args out of the enum and into
        // the handler. The pseudo use case rejects a single submission
        // file before touching the filesystem, so the whole path runs.
        let cli = Cli::try_parse_from([
            "speech-kws", "pseudo", "--submission", "only.csv",
        ])
        .unwrap();
        assert!(cli.run().is_err());
    }

    #[test]
    fn unknown_subcommands_are_rejected() {
        assert!(Cli::try_parse_from(["speech-kws", "evaluate"]).is_err());
    }
}
