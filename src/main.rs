use anyhow::{Context, Result};
use clap::Parser;
use grid_snake::game::GameConfig;
use grid_snake::modes::HumanMode;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Log filter when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "info";

/// High score file used when neither a flag nor the config names one
const DEFAULT_HIGH_SCORE_FILE: &str = "snake-high-score.json";

#[derive(Parser)]
#[command(name = "grid_snake")]
#[command(version, about = "Classic snake on a fixed grid")]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid width
    #[arg(long)]
    width: Option<usize>,

    /// Grid height
    #[arg(long)]
    height: Option<usize>,

    /// Milliseconds between simulation steps
    #[arg(long)]
    tick_ms: Option<u64>,

    /// File holding the high score across runs [default: snake-high-score.json]
    #[arg(long, conflicts_with = "no_save")]
    high_score_file: Option<PathBuf>,

    /// Keep the high score in memory for this run only
    #[arg(long)]
    no_save: bool,

    /// Never spawn food on the snake
    #[arg(long)]
    avoid_snake: bool,

    /// Write logs here; the terminal is taken by the game
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::load(path)?,
            None => GameConfig::default(),
        };

        if let Some(width) = self.width {
            config.grid_width = width;
        }
        if let Some(height) = self.height {
            config.grid_height = height;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_interval_ms = tick_ms;
        }
        if self.avoid_snake {
            config.food_avoids_snake = true;
        }
        if self.no_save {
            config.high_score_path = None;
        } else if let Some(path) = &self.high_score_file {
            config.high_score_path = Some(path.clone());
        } else if config.high_score_path.is_none() {
            config.high_score_path = Some(PathBuf::from(DEFAULT_HIGH_SCORE_FILE));
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };

    let file = File::create(path).with_context(|| format!("Failed to create log file {:?}", path))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();

    Ok(())
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_file.as_deref())?;

    let config = cli.game_config()?;
    tracing::info!(?config, "Starting grid_snake");

    let mut human_mode = HumanMode::new(config);
    human_mode.run().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tracing_subscriber::filter::LevelFilter;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("grid_snake").chain(args.iter().copied())).unwrap()
    }

    fn config_file(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{json}").unwrap();
        file
    }

    #[test]
    fn test_default_high_score_file() {
        let config = parse(&[]).game_config().unwrap();
        assert_eq!(
            config.high_score_path,
            Some(PathBuf::from(DEFAULT_HIGH_SCORE_FILE))
        );
    }

    #[test]
    fn test_high_score_flag_beats_config_file() {
        let file = config_file(r#"{ "high_score_path": "from-config.json" }"#);
        let path = file.path().to_str().unwrap();

        let from_config = parse(&["--config", path]).game_config().unwrap();
        assert_eq!(
            from_config.high_score_path,
            Some(PathBuf::from("from-config.json"))
        );

        let overridden = parse(&["--config", path, "--high-score-file", "flag.json"])
            .game_config()
            .unwrap();
        assert_eq!(overridden.high_score_path, Some(PathBuf::from("flag.json")));
    }

    #[test]
    fn test_no_save_keeps_score_in_memory() {
        let file = config_file(r#"{ "high_score_path": "from-config.json" }"#);
        let path = file.path().to_str().unwrap();

        let config = parse(&["--config", path, "--no-save"]).game_config().unwrap();
        assert_eq!(config.high_score_path, None);

        assert!(
            Cli::try_parse_from(["grid_snake", "--no-save", "--high-score-file", "x.json"])
                .is_err()
        );
    }

    #[test]
    fn test_grid_flags_override_config_file() {
        let file = config_file(r#"{ "grid_width": 12, "grid_height": 8 }"#);
        let path = file.path().to_str().unwrap();

        let config = parse(&["--config", path, "--width", "20"]).game_config().unwrap();
        assert_eq!(config.grid_width, 20);
        assert_eq!(config.grid_height, 8);
    }

    #[test]
    fn test_default_log_filter_lets_warnings_through() {
        let filter = EnvFilter::new(DEFAULT_LOG_FILTER);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }
}
