mod cli;

use vidforge::{
    batch::{BatchDriver, BatchOptions},
    config, console,
};
use vf_av::{EncoderMatch, ToolRegistry, FFMPEG};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, EncodeArgs};

async fn encode(args: EncodeArgs, config_path: Option<&std::path::Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    args.apply(&mut config);

    let options = BatchOptions::from_config(&config);
    tracing::info!(
        "Encoding {:?} with {} (preset={}, crf={}, threads={}, subtitles={})",
        options.folder,
        options.params.codec,
        options.params.preset,
        options.params.crf,
        options.params.threads,
        options.subtitles,
    );

    let registry = ToolRegistry::discover(&config.tools);

    if args.dry_run {
        // Dry runs never launch the encoder, so a missing binary is fine.
        let ffmpeg = registry
            .require(FFMPEG)
            .map(|t| t.path.clone())
            .unwrap_or_else(|_| FFMPEG.into());
        let driver = BatchDriver::new(ffmpeg, options);
        let jobs = driver.plan()?;
        for job in &jobs {
            println!("{}", driver.supervisor().command(job).display_line());
        }
        println!("\n[DRY RUN] Would encode {} files", jobs.len());
        return Ok(());
    }

    let ffmpeg = registry.require(FFMPEG)?.path.clone();
    let driver = BatchDriver::new(ffmpeg, options);
    let mut observer = console::ConsoleObserver::new(args.quiet);
    let report = driver.run(&mut observer).await?;

    console::print_summary(&report);

    if !report.all_succeeded() {
        anyhow::bail!(
            "{} of {} files failed to convert",
            report.failed.len(),
            report.candidates
        );
    }

    Ok(())
}

async fn check_encoder(
    codec: Option<String>,
    strict: bool,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let mut params = config.encode.params();
    if let Some(codec) = codec {
        params.codec = codec;
    }
    params.validate()?;
    let codec = params.codec;
    let mode = EncoderMatch::from_strict(strict || config.batch.strict_encoder_match);

    let registry = ToolRegistry::discover(&config.tools);
    let ffmpeg = registry.require(FFMPEG)?;
    vf_av::check_encoder(&ffmpeg.path, &codec, mode).await?;

    println!("✓ Encoder {} is available ({:?} match)", codec, mode);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vidforge=debug,vf_av=debug,vf_core=debug".to_string()
        } else {
            "vidforge=info,vf_av=info,vf_core=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Encode(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(encode(args, cli.config.as_deref()))
        }
        Commands::CheckTools { json } => check_tools(cli.config.as_deref(), json),
        Commands::Encoders { codec, strict } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(check_encoder(codec, strict, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("vidforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn check_tools(config_path: Option<&std::path::Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools).check_all();

    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    println!("Checking external tools...\n");

    let mut all_ok = true;
    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("ffmpeg is missing. Install it or set tools.ffmpeg_path in the config.");
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::Config::load(p)?;
            let warnings = config.validate();
            println!("✓ Configuration is valid");
            println!("  Folder: {}", config.encode.folder.display());
            println!(
                "  Encoder: {} (preset {}, crf {}, threads {})",
                config.encode.codec, config.encode.preset, config.encode.crf, config.encode.threads
            );
            println!("  Subtitles: {}", config.encode.subtitles);
            println!("  Fail fast: {}", config.batch.fail_fast);
            for warning in &warnings {
                println!("  warning: {}", warning);
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!(
                "  Encoder: {} (preset {}, crf {})",
                config.encode.codec, config.encode.preset, config.encode.crf
            );
        }
    }

    Ok(())
}
