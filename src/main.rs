use bughunt::{
    app::App,
    app_dirs::AppDirs,
    backend::StaticName,
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{CrosstermEventSource, FixedTicker, MonotonicClock, Runner},
    session::{Session, SessionConfig},
    store::{write_csv, ScoreDb, LEADERBOARD_LIMIT},
    ui,
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Arc,
};

/// tap-the-bug arcade minigame with a countdown timer and a local leaderboard
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Swat as many bugs as you can before the timer runs out. Bugs appear at random spots on the board; hit them with their key or a mouse click. Every finished round is saved to a local leaderboard."
)]
pub struct Cli {
    /// player name shown in the header and stored with your scores
    #[clap(short = 'p', long)]
    player: Option<String>,

    /// length of a round in seconds
    #[clap(short = 's', long)]
    secs: Option<u32>,

    /// seed the random source for reproducible spawn positions
    #[clap(long)]
    seed: Option<u64>,

    /// print the leaderboard and exit
    #[clap(long)]
    leaderboard: bool,

    /// write the leaderboard as CSV to PATH and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// score database location
    #[clap(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// remember --player in the config file
    #[clap(long)]
    save_player: bool,
}

impl Cli {
    /// Command line flags take precedence over the config file
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(player) = &self.player {
            cfg.player_name = Some(player.clone());
        }
        if let Some(secs) = self.secs {
            cfg.session_secs = secs;
        }
        cfg
    }

    /// Config to persist for `--save-player`: only the name changes, other
    /// flags stay one-off
    fn remembered(&self, stored: &Config) -> Option<Config> {
        if !self.save_player {
            return None;
        }
        let player = self.player.clone()?;
        Some(Config {
            player_name: Some(player),
            ..stored.clone()
        })
    }

    fn open_scores(&self) -> Result<ScoreDb, Box<dyn Error>> {
        let db = match &self.db {
            Some(path) => ScoreDb::open(path)?,
            None => ScoreDb::new()?,
        };
        Ok(db)
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    // stdout belongs to the TUI, so logs go to a file
    let _ = env_logger::Builder::from_env(env_logger::Env::new().filter_or("BUGHUNT_LOG", "info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

fn print_leaderboard(scores: &ScoreDb) -> Result<(), Box<dyn Error>> {
    let entries = scores.top_scores(LEADERBOARD_LIMIT)?;
    if entries.is_empty() {
        println!("No scores yet.");
        return Ok(());
    }
    println!("{:>4}  {:<20} {:>6}  {}", "#", "player", "score", "date");
    for (i, e) in entries.iter().enumerate() {
        println!(
            "{:>4}  {:<20} {:>6}  {}",
            i + 1,
            e.player,
            e.score,
            e.display_date()
        );
    }
    println!("\n{} rounds played", scores.count()?);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let config_store = FileConfigStore::new();
    let stored = config_store.load();
    if let Some(remembered) = cli.remembered(&stored) {
        config_store.save(&remembered)?;
    }
    let cfg = cli.apply(stored);

    let scores = Arc::new(cli.open_scores()?);

    if let Some(path) = &cli.export {
        let file = fs::File::create(path)?;
        write_csv(&scores.top_scores(LEADERBOARD_LIMIT)?, file)?;
        println!("wrote leaderboard to {}", path.display());
        return Ok(());
    }
    if cli.leaderboard {
        return print_leaderboard(&scores);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let session = Session::with_seed(
        SessionConfig::from(&cfg),
        cli.seed,
        Box::new(StaticName(cfg.player_name.clone())),
        scores.clone(),
    );
    let mut app = App::new(session, scores, MonotonicClock::new());

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    log::info!("bughunt starting");
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    terminal.draw(|f| ui::draw(app, f))?;

    while !app.should_quit {
        let event = runner.step();
        if app.handle(event) {
            terminal.draw(|f| ui::draw(app, f))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bughunt::session::SESSION_DURATION;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["bughunt"]);

        assert_eq!(cli.player, None);
        assert_eq!(cli.secs, None);
        assert_eq!(cli.seed, None);
        assert!(!cli.leaderboard);
        assert_eq!(cli.export, None);
        assert_eq!(cli.db, None);
        assert!(!cli.save_player);
    }

    #[test]
    fn test_cli_player_and_secs() {
        let cli = Cli::parse_from(["bughunt", "-p", "ana", "-s", "60"]);
        assert_eq!(cli.player.as_deref(), Some("ana"));
        assert_eq!(cli.secs, Some(60));

        let cli = Cli::parse_from(["bughunt", "--player", "bo", "--secs", "15"]);
        assert_eq!(cli.player.as_deref(), Some("bo"));
        assert_eq!(cli.secs, Some(15));
    }

    #[test]
    fn test_cli_paths_and_flags() {
        let cli = Cli::parse_from([
            "bughunt",
            "--db",
            "/tmp/s.db",
            "--export",
            "out.csv",
            "--leaderboard",
            "--seed",
            "7",
        ]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/s.db")));
        assert_eq!(cli.export, Some(PathBuf::from("out.csv")));
        assert!(cli.leaderboard);
        assert_eq!(cli.seed, Some(7));
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from(["bughunt", "-p", "ana", "-s", "45"]);
        let cfg = cli.apply(Config {
            player_name: Some("old".into()),
            ..Config::default()
        });
        assert_eq!(cfg.player_name.as_deref(), Some("ana"));
        assert_eq!(cfg.session_secs, 45);

        let cli = Cli::parse_from(["bughunt"]);
        let cfg = cli.apply(Config {
            player_name: Some("kept".into()),
            ..Config::default()
        });
        assert_eq!(cfg.player_name.as_deref(), Some("kept"));
        assert_eq!(cfg.session_secs, SESSION_DURATION);
    }

    #[test]
    fn test_save_player_keeps_other_settings() {
        let stored = Config {
            player_name: Some("old".into()),
            session_secs: 20,
            ..Config::default()
        };

        let cli = Cli::parse_from(["bughunt", "-s", "60", "-p", "x", "--save-player"]);
        let saved = cli.remembered(&stored).unwrap();
        assert_eq!(saved.player_name.as_deref(), Some("x"));
        assert_eq!(saved.session_secs, 20);
        assert_eq!(cli.apply(stored.clone()).session_secs, 60);

        let cli = Cli::parse_from(["bughunt", "--save-player"]);
        assert!(cli.remembered(&stored).is_none());
        let cli = Cli::parse_from(["bughunt", "-p", "x"]);
        assert!(cli.remembered(&stored).is_none());
    }

    #[test]
    fn test_open_scores_with_custom_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.db");
        let cli = Cli::parse_from(["bughunt", "--db", path.to_str().unwrap()]);

        let db = cli.open_scores().unwrap();
        assert_eq!(db.count().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_cli_rejects_non_numeric_secs() {
        assert!(Cli::try_parse_from(["bughunt", "-s", "soon"]).is_err());
    }
}
