use clap::Parser;

use camsnap::cli::{self, Args, Command};
use camsnap::config::Config;

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // CLI flags override the config file
    let mut settings = config.capture_settings();
    if let Some(size) = args.size {
        settings.resolution = size;
    }
    if args.no_mirror {
        settings.mirror = false;
    }
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.output.path.clone());
    let host = args.backend.host();

    let result = match args.command {
        Some(Command::ListCameras) => cli::list_cameras(host).await,
        Some(Command::Snap { device }) => cli::snap(host, device, settings, output).await,
        Some(Command::Config { action }) => {
            cli::handle_config_action(action, &config, args.config.as_deref());
            Ok(())
        }
        None => cli::interactive(host, settings, output).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
