//! Kickoff CLI
//!
//! Football match outcome prediction with walk-forward validated models.

use clap::{Parser, Subcommand};
use kickoff::{Config, Result};

#[derive(Parser)]
#[command(name = "kickoff")]
#[command(about = "Football match outcome prediction", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: features, cross-validation, final model, predictions
    Run,
    /// Build the feature table and summarise it
    Features {
        /// Write train and upcoming rows to this CSV file
        #[arg(long)]
        export: Option<String>,
    },
    /// Walk-forward cross-validation only (nothing is written)
    Evaluate,
    /// Train the production model on every completed match
    Train {
        /// Override number of epochs
        #[arg(long)]
        epochs: Option<usize>,
    },
    /// Predict upcoming fixtures with the saved model
    Predict {
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Show database status
    Status,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show saved model information
    Info,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                log::error!("{}", e);
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Run => commands::run(config),
        Commands::Features { export } => commands::features(config, export),
        Commands::Evaluate => commands::evaluate(config),
        Commands::Train { epochs } => commands::train(config, epochs),
        Commands::Predict { format } => commands::predict(config, format),
        Commands::Data { action } => match action {
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        log::error!("Run failed: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use kickoff::data::MatchStore;
    use kickoff::model::artifact;
    use kickoff::pipeline::Pipeline;
    use kickoff::predict::{write_predictions_csv, Prediction};
    use kickoff::training::CvSummary;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        for path in [&config.data.database_path, &config.data.dashboard_path] {
            if let Some(parent) = std::path::Path::new(path).parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::create_dir_all(&config.data.model_dir)?;
        println!("Created data and model directories");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!(
            "  2. Load fixtures into {} and standings into {}",
            config.data.database_path, config.data.standings_path
        );
        println!("  3. Run 'kickoff run' to evaluate, train and predict");

        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let store = MatchStore::open(&config.data.database_path)?;
        let status = store.status()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:        {}", config.data.database_path);
        println!("  Matches:     {}", status.match_count);
        println!("  Played:      {}", status.played_count);
        println!("  Upcoming:    {}", status.upcoming_count);
        println!("  Statistics:  {}", status.statistics_count);
        println!("  Predictions: {}", status.prediction_count);
        if let Some(at) = store.latest_prediction_time()? {
            println!("  Predicted:   {}", at);
        }
        if let (Some(earliest), Some(latest)) = (status.earliest_match, status.latest_match) {
            println!("  Range:       {} to {}", earliest, latest);
        }
        if !status.seasons.is_empty() {
            let seasons: Vec<String> = status.seasons.iter().map(|s| s.to_string()).collect();
            println!("  Seasons:     {}", seasons.join(", "));
        }

        Ok(())
    }

    pub fn features(config: Config, export: Option<String>) -> Result<()> {
        let pipeline = Pipeline::new(config);
        let table = pipeline.build_features()?;

        println!("Feature Table");
        println!("───────────────────────────────");
        println!("  Completed: {}", table.train.len());
        println!("  Upcoming:  {}", table.predict.len());
        if let Some(latest) = table.latest_played_date() {
            println!("  Latest:    {}", latest);
        }
        println!("  Columns:   {}", pipeline.config().features.columns.join(", "));

        if let Some(path) = export {
            table.export_csv(&path, &pipeline.config().features)?;
            println!("Exported feature table to {}", path);
        }
        Ok(())
    }

    fn print_cv(cv: &CvSummary) {
        let labels: Vec<&str> = cv.labels.iter().map(|l| l.code()).collect();
        println!("\nWalk-forward validation");
        println!("═══════════════════════════════════════════════════════");
        for result in &cv.folds {
            println!(
                "Fold {} ({}) train={} val={}",
                result.index, result.fold, result.train_rows, result.val_rows
            );
            println!("  {}", result.metrics);
            for class in &result.metrics.per_class {
                println!(
                    "    {:>2}  precision {:.2}  recall {:.2}  f1 {:.2}  support {}",
                    labels.get(class.class).copied().unwrap_or("?"),
                    class.precision,
                    class.recall,
                    class.f1,
                    class.support
                );
            }
        }
        for index in &cv.skipped {
            println!("Fold {} skipped (empty window)", index);
        }
        match (cv.mean_accuracy(), cv.mean_f1_weighted()) {
            (Some(acc), Some(f1)) => println!(
                "\nMean accuracy: {:.2}%  Mean weighted F1: {:.4}",
                acc * 100.0,
                f1
            ),
            _ => println!("\nNo fold could be evaluated"),
        }
    }

    pub fn evaluate(config: Config) -> Result<()> {
        let pipeline = Pipeline::new(config);
        let table = pipeline.build_features()?;
        let cv = pipeline.evaluate(&table)?;
        print_cv(&cv);
        Ok(())
    }

    pub fn train(config: Config, epochs: Option<usize>) -> Result<()> {
        let config = match epochs {
            Some(e) => config.with_epochs(e)?,
            None => config,
        };
        let pipeline = Pipeline::new(config);
        let table = pipeline.build_features()?;
        let metadata = pipeline.train(&table)?;

        let labels: Vec<&str> = metadata.labels.iter().map(|l| l.code()).collect();
        println!("\nTrained on {} matches", metadata.training_rows);
        println!("  Labels:  {}", labels.join(", "));
        println!("  Saved:   {}", pipeline.config().data.model_dir);
        Ok(())
    }

    fn print_predictions(predictions: &[Prediction], format: &OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Table => {
                println!(
                    "{:<10} {:<22} {:<22} {:>4} {:>6} {:>6} {:>6}",
                    "Date", "Home", "Away", "Pick", "H", "D", "A"
                );
                for p in predictions {
                    println!(
                        "{:<10} {:<22} {:<22} {:>4} {:>6.3} {:>6.3} {:>6.3}",
                        p.date.format("%Y-%m-%d"),
                        p.home_team,
                        p.away_team,
                        p.prediction.code(),
                        p.proba_home,
                        p.proba_draw,
                        p.proba_away
                    );
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(predictions)?);
            }
            OutputFormat::Csv => {
                write_predictions_csv(predictions, std::io::stdout())?;
            }
        }
        Ok(())
    }

    pub fn predict(config: Config, format: OutputFormat) -> Result<()> {
        let pipeline = Pipeline::new(config);
        let predictions = pipeline.predict()?;
        if predictions.is_empty() {
            println!("No predictions made");
            return Ok(());
        }
        print_predictions(&predictions, &format)
    }

    pub fn run(config: Config) -> Result<()> {
        let pipeline = Pipeline::new(config);
        let summary = pipeline.run()?;

        print_cv(&summary.cv);
        println!("\nFinal model trained on {} matches", summary.training_rows);
        println!(
            "Dashboard: accuracy {}, F1 {}, updated {}",
            summary.kpis.accuracy, summary.kpis.f1, summary.kpis.last_update
        );
        if !summary.predictions.is_empty() {
            println!();
            print_predictions(&summary.predictions, &OutputFormat::Table)?;
        }
        Ok(())
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let loaded = artifact::load(&config.data.model_dir)?;
        let meta = &loaded.metadata;
        let labels: Vec<&str> = meta.labels.iter().map(|l| l.code()).collect();

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Path:          {}", config.data.model_dir);
        println!("  Trained at:    {}", meta.trained_at.format("%Y-%m-%d %H:%M:%S"));
        println!("  Training rows: {}", meta.training_rows);
        println!("  Labels:        {}", labels.join(", "));
        println!("  Hidden layers: {:?}", meta.shape.hidden_dims);
        println!("  Team vocab:    {}", meta.preprocessor.teams.len());
        println!("  Columns:       {}", meta.feature_columns.join(", "));

        Ok(())
    }
}
