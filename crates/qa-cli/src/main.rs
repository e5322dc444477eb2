mod logging;
mod wizard;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use futures::executor::block_on;
use qa_flow::{
    AnimationConfig, AnimationPreset, CompletionError, ComponentRegistry, NavigationOutcome,
    QuestionnaireController, QuestionnaireHooks, QuestionnaireOptions, render_step,
};
use qa_spec::{
    FormValues, StepConfig, answers_schema, config_schema, validate_config, values_from_json,
};
use serde_json::Value;
use wizard::{Input, Verbosity, WizardPresenter, read_input};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Text-based multi-step questionnaire runner",
    long_about = "Runs step configurations in the terminal and validates answer files against them"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk through a step configuration in the terminal.
    Run(RunArgs),
    /// Validate an answers file against every step of a configuration.
    Validate {
        /// Path to the step configuration JSON.
        #[arg(long, value_name = "STEPS")]
        steps: PathBuf,
        /// Path to the answers JSON object.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Print the JSON schema of step configuration files, or of the answers
    /// accepted by one configuration.
    Schema {
        /// Emit the answers schema for this configuration instead.
        #[arg(long, value_name = "STEPS")]
        steps: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to the step configuration JSON.
    #[arg(long, value_name = "STEPS")]
    steps: PathBuf,
    /// Optional JSON file containing initial answers.
    #[arg(long, value_name = "ANSWERS")]
    answers: Option<PathBuf>,
    /// Zero-based step to start on.
    #[arg(long, default_value_t = 0)]
    start: usize,
    /// Transition preset for both phases.
    #[arg(long, value_name = "NAME")]
    preset: Option<AnimationPreset>,
    /// Transition preset for the enter phase.
    #[arg(long, value_name = "NAME")]
    enter_preset: Option<AnimationPreset>,
    /// Transition preset for the exit phase.
    #[arg(long, value_name = "NAME")]
    exit_preset: Option<AnimationPreset>,
    /// Enter phase length in milliseconds.
    #[arg(long, value_name = "MS")]
    enter_ms: Option<u64>,
    /// Exit phase length in milliseconds.
    #[arg(long, value_name = "MS")]
    exit_ms: Option<u64>,
    /// Show verbose output (status line, presets, navigation logs).
    #[arg(long, alias = "debug")]
    verbose: bool,
    /// Print the collected answers as JSON on completion.
    #[arg(long)]
    answers_json: bool,
}

impl RunArgs {
    fn animation(&self) -> AnimationConfig {
        let mut config = AnimationConfig::shared(self.preset.unwrap_or_default());
        if let Some(preset) = self.enter_preset {
            config = config.enter(preset);
        }
        if let Some(preset) = self.exit_preset {
            config = config.exit(preset);
        }
        if let Some(ms) = self.enter_ms {
            config = config.enter_duration(Duration::from_millis(ms));
        }
        if let Some(ms) = self.exit_ms {
            config = config.exit_duration(Duration::from_millis(ms));
        }
        config
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let verbose = matches!(&cli.command, Command::Run(args) if args.verbose);
    logging::init_logging(verbose);

    match cli.command {
        Command::Run(args) => run_questionnaire(args),
        Command::Validate { steps, answers } => run_validate(&steps, &answers),
        Command::Schema { steps } => run_schema(steps.as_deref()),
    }
}

fn run_questionnaire(args: RunArgs) -> CliResult<()> {
    let config = StepConfig::from_path(&args.steps)?;
    let initial_values = match &args.answers {
        Some(path) => load_answers(path)?,
        None => FormValues::new(),
    };
    let options = QuestionnaireOptions::new()
        .initial_index(args.start)
        .initial_values(initial_values)
        .verbose(args.verbose)
        .animation(args.animation());

    let completed: Arc<Mutex<Option<FormValues>>> = Arc::new(Mutex::new(None));
    let hooks = {
        let completed = Arc::clone(&completed);
        QuestionnaireHooks::new()
            .on_complete(move |values: FormValues| {
                if let Ok(mut slot) = completed.lock() {
                    *slot = Some(values);
                }
                async { Ok::<(), CompletionError>(()) }
            })
            .on_exit(|| tracing::info!("left the questionnaire from the first step"))
    };

    let controller = QuestionnaireController::new(config, options, hooks)?;
    let presenter = WizardPresenter::new(Verbosity::from_verbose(args.verbose), args.answers_json);
    let registry = wizard::terminal_registry();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let outcome = match collect_step(&controller, &presenter, &registry, &mut lines)? {
            None | Some(Input::Answer(_)) => block_on(controller.advance())?,
            Some(Input::Back) => block_on(controller.retreat())?,
            Some(Input::Skip) => block_on(controller.skip())?,
            Some(Input::Exit) => return Err("questionnaire aborted by user".into()),
        };

        match outcome {
            NavigationOutcome::Advanced { .. }
            | NavigationOutcome::Retreated { .. }
            | NavigationOutcome::Cancelled
            | NavigationOutcome::Busy => {}
            NavigationOutcome::Blocked(errors) => presenter.show_errors(&errors),
            NavigationOutcome::Submitted => {
                let values = completed
                    .lock()
                    .map_err(|_| "answer store poisoned")?
                    .take()
                    .unwrap_or_default();
                presenter.show_completion(&values);
                return Ok(());
            }
            NavigationOutcome::SubmitFailed(message) => {
                return Err(format!("submission failed: {}", message).into());
            }
            NavigationOutcome::ExitRequested => {
                println!("Exited before the first step was completed.");
                return Ok(());
            }
            NavigationOutcome::Disposed => return Ok(()),
        }
    }
}

/// Prompts for every rendered question of the active step. `None` means
/// the step was answered and the session should advance.
fn collect_step<B: BufRead>(
    controller: &QuestionnaireController,
    presenter: &WizardPresenter,
    registry: &ComponentRegistry<String>,
    lines: &mut io::Lines<B>,
) -> CliResult<Option<Input>> {
    let snapshot = controller.snapshot()?;
    let rendered = render_step(presenter, registry, &snapshot);
    presenter.show_step(&rendered);

    for (name, prompt) in &rendered.questions {
        let Some(question) = snapshot.step.questions.iter().find(|q| &q.name == name) else {
            continue;
        };
        loop {
            println!("{}", prompt);
            print!("> ");
            io::stdout().flush()?;
            let line = lines
                .next()
                .ok_or("input ended before the questionnaire was finished")??;

            match read_input(question, &line) {
                Ok(Input::Answer(Some(value))) => {
                    controller.set_field(name.as_str(), value)?;
                    break;
                }
                Ok(Input::Answer(None)) => break,
                Ok(Input::Skip) if !snapshot.has_skippable => {
                    println!("Nothing on this step can be skipped.");
                }
                Ok(command) => return Ok(Some(command)),
                Err(err) => presenter.show_parse_error(&err),
            }
        }
    }
    Ok(None)
}

fn run_validate(steps: &Path, answers: &Path) -> CliResult<()> {
    let config = StepConfig::from_path(steps)?;
    let answers = load_answers(answers)?;

    let failures = validate_config(&config, &answers);
    println!(
        "Validation result: {}",
        if failures.is_empty() { "valid" } else { "invalid" }
    );
    for (index, errors) in &failures {
        println!("Step {} ({}):", index + 1, config.steps[*index].header);
        for (name, message) in errors {
            println!("  {} - {}", name, message);
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn run_schema(steps: Option<&Path>) -> CliResult<()> {
    let schema = match steps {
        Some(path) => answers_schema(&StepConfig::from_path(path)?),
        None => config_schema(),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn load_answers(path: &Path) -> CliResult<FormValues> {
    let contents = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&contents)?;
    if !value.is_object() {
        return Err(format!("{} must contain a JSON object", path.display()).into());
    }
    Ok(values_from_json(&value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["greentic-qa", "run", "--steps", "steps.json"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Run(args) => args,
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn animation_flags_override_the_shared_preset() {
        let args = run_args(&[
            "--preset",
            "slide-vertical",
            "--exit-preset",
            "fade",
            "--enter-ms",
            "0",
        ]);
        let config = args.animation();
        assert_eq!(config.enter, AnimationPreset::SlideVertical);
        assert_eq!(config.exit, AnimationPreset::Fade);
        assert_eq!(config.enter_duration, Duration::ZERO);
        assert_eq!(config.exit_duration, Duration::from_millis(160));
    }

    #[test]
    fn unknown_presets_are_rejected() {
        let result = Cli::try_parse_from([
            "greentic-qa",
            "run",
            "--steps",
            "steps.json",
            "--preset",
            "wobble",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn answers_must_be_an_object() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("answers.json");
        fs::write(&path, "[1, 2]").expect("write");
        assert!(load_answers(&path).is_err());

        fs::write(&path, r#"{"name": "Ada"}"#).expect("write");
        let values = load_answers(&path).expect("object");
        assert_eq!(values["name"], Value::String("Ada".into()));
    }
}
