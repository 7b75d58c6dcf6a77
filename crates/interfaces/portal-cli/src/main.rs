use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use portal_cli::{commands, SessionOptions};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Where settings and animation memory are stored
    #[arg(long, global = true, env = "PORTAL_DATA_DIR")]
    data_dir: Option<Utf8PathBuf>,
    /// Seed for reproducible selection
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Directory of sound files, loaded by file stem
    #[arg(long, global = true)]
    sound_dir: Option<Utf8PathBuf>,
    /// Act as if the user already interacted, so sounds may play
    #[arg(long, global = true)]
    unlock_audio: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in animations and scripts
    Catalogue {
        #[arg(long)]
        themes: bool,
    },
    /// Weighted pick for a set of context tags
    Select {
        #[arg(short, long, value_delimiter = ',', required = true)]
        tags: Vec<String>,
        #[arg(long)]
        theme: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        draws: usize,
    },
    /// Play a script or catalogue animation by name
    Play { name: String },
    Navigate {
        route: String,
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        non_blocking: bool,
        #[arg(long, help = "Use the page's hand-authored entry script")]
        page_script: bool,
    },
    /// Open the gate (first visit only)
    Gate,
    Memory {
        #[command(subcommand)]
        command: MemoryCommands,
    },
    Welcome {
        #[arg(long)]
        theme: Option<String>,
    },
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Feed key codes, e.g. ArrowUp ArrowUp ... KeyB KeyA
    Keys {
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

#[derive(Subcommand)]
enum MemoryCommands {
    Show,
    Reset,
}

#[derive(Subcommand)]
enum SettingsCommands {
    Show,
    SetWeight {
        theme: String,
        weight: u32,
    },
    Set {
        #[arg(long)]
        sound: Option<bool>,
        #[arg(long)]
        reduce_repeats: Option<bool>,
        #[arg(long)]
        blocking: Option<bool>,
    },
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let options = SessionOptions {
        data_dir: cli.data_dir,
        seed: cli.seed,
        sound_dir: cli.sound_dir,
        unlock_audio: cli.unlock_audio,
    };

    match cli.command {
        Commands::Catalogue { themes } => commands::cmd_catalogue(themes)?,
        Commands::Select {
            tags,
            theme,
            draws,
        } => commands::cmd_select(&options, tags, theme, draws)?,
        Commands::Play { name } => commands::cmd_play(&options, &name).await?,
        Commands::Navigate {
            route,
            tags,
            theme,
            non_blocking,
            page_script,
        } => {
            commands::cmd_navigate(&options, &route, tags, theme, non_blocking, page_script)
                .await?
        }
        Commands::Gate => commands::cmd_gate(&options).await?,
        Commands::Memory { command } => match command {
            MemoryCommands::Show => commands::cmd_memory_show(&options)?,
            MemoryCommands::Reset => commands::cmd_memory_reset(&options)?,
        },
        Commands::Welcome { theme } => commands::cmd_welcome(&options, theme)?,
        Commands::Settings { command } => match command {
            SettingsCommands::Show => commands::cmd_settings_show(&options)?,
            SettingsCommands::SetWeight { theme, weight } => {
                commands::cmd_settings_set_weight(&options, &theme, weight).await?
            }
            SettingsCommands::Set {
                sound,
                reduce_repeats,
                blocking,
            } => commands::cmd_settings_toggle(&options, sound, reduce_repeats, blocking).await?,
        },
        Commands::Keys { keys } => commands::cmd_keys(&options, keys).await?,
    }

    Ok(())
}
