mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::create::CreateArgs;
use commands::{
    EndpointOverrides, CONFIG_PREFIX, EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_LOOKUP_FAILED,
    LOOKUP_PREFIX,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "diskimg", version, about = "Browse and manage cloud disk images")]
struct Cli {
    /// API endpoint (overrides config file and DISKIMG_URL).
    #[arg(long, global = true)]
    url: Option<String>,

    /// API key sent as a bearer token (overrides DISKIMG_API_KEY).
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Region appended to every request (overrides DISKIMG_REGION).
    #[arg(long, global = true)]
    region: Option<String>,

    /// Path to the config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List disk images, hiding k3s and talos images.
    List {
        /// Include custom (uploaded) images.
        #[arg(long, default_value_t = false)]
        custom: bool,
    },
    /// Show one disk image by id, name, or unique fragment of either.
    Show { search: String },
    /// Show the highest-versioned image whose name contains a distribution.
    Latest { distribution: String },
    /// Register a local image file as a custom disk image.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        distribution: String,
        #[arg(long)]
        version: String,
        /// Local image file; its SHA-256, MD5, and size are sent.
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = "upload")]
        source: String,
        #[arg(long)]
        os: Option<String>,
        #[arg(long)]
        initial_user: Option<String>,
        /// Logo image, sent base64-encoded.
        #[arg(long)]
        logo: Option<PathBuf>,
    },
    /// Delete a custom disk image.
    Delete {
        /// Id, name, or unique fragment of either.
        search: String,
        /// Skip the confirmation prompt.
        #[arg(short, long, default_value_t = false)]
        yes: bool,
    },
    /// Read or write the endpoint config file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Save --url, --api-key, --region, and --timeout into the config file.
    Set {
        /// Request timeout in seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Print the config file with the API key masked.
    Show,
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("DISKIMG_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let overrides = EndpointOverrides {
        url: cli.url,
        api_key: cli.api_key,
        region: cli.region,
        config_path: cli.config,
    };
    let json = cli.json;

    let result = match cli.command {
        Commands::List { custom } => commands::make_client(&overrides)
            .and_then(|client| commands::list::run(&client, custom, json)),
        Commands::Show { search } => commands::make_client(&overrides)
            .and_then(|client| commands::show::run(&client, &search, json)),
        Commands::Latest { distribution } => commands::make_client(&overrides)
            .and_then(|client| commands::latest::run(&client, &distribution, json)),
        Commands::Create {
            name,
            distribution,
            version,
            file,
            source,
            os,
            initial_user,
            logo,
        } => {
            let args = CreateArgs {
                name,
                distribution,
                version,
                file,
                source,
                os,
                initial_user,
                logo,
            };
            commands::make_client(&overrides)
                .and_then(|client| commands::create::run(&client, &args, json))
        }
        Commands::Delete { search, yes } => commands::make_client(&overrides)
            .and_then(|client| commands::delete::run(&client, &search, yes, json)),
        Commands::Config { action } => match action {
            ConfigAction::Set { timeout } => commands::config::set(&overrides, timeout),
            ConfigAction::Show => commands::config::show(&overrides, json),
        },
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with(LOOKUP_PREFIX) {
                EXIT_LOOKUP_FAILED
            } else if msg.starts_with(CONFIG_PREFIX) {
                EXIT_CONFIG_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
