//! `placard` - CLI for full-screen announcements
//!
//! This binary shows announcements on the terminal and manages the saved
//! announcement history.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, Read};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use placard::cli::{Cli, Command, ConfigCommand, ContentArgs};
use placard::clock::format_local;
use placard::session::{Display, Notifier, SaveOutcome};
use placard::terminal::{spawn_event_listener, TerminalDisplay, TerminalEvent, TerminalNotifier};
use placard::{
    init_logging, Announcer, Config, DisplayClock, HistoryStore, HttpTimeSource, OffsetReading,
    RecordId, Storage, SystemClock, TimeSync,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match cli.command {
        Command::Config(config_cmd) => handle_config(cli.config, config_cmd),
        command => {
            // Load configuration
            let config = Config::load_from(cli.config)?;
            run(&config, command).await
        }
    }
}

async fn run(config: &Config, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Show(cmd) => handle_show(config, &cmd.announcement).await,
        Command::Save(cmd) => handle_save(config, &cmd.announcement),
        Command::History(cmd) => handle_history(config, cmd.json),
        Command::Replay(cmd) => handle_replay(config, cmd.id).await,
        Command::Delete(cmd) => handle_delete(config, cmd.id, cmd.yes),
        Command::Clear(cmd) => handle_clear(config, cmd.yes),
        Command::Time(cmd) => handle_time(config, cmd.json).await,
        Command::Config(cmd) => handle_config(None, cmd),
    }
}

fn time_sync(config: &Config) -> anyhow::Result<TimeSync> {
    let source = HttpTimeSource::from_config(config)?;
    Ok(TimeSync::new(Arc::new(source), Arc::new(SystemClock)))
}

fn build_announcer(
    config: &Config,
    display: Arc<TerminalDisplay>,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<Announcer> {
    let path = config.database_path();
    let storage = Storage::open(&path)
        .with_context(|| format!("cannot open history database {}", path.display()))?;
    let history = HistoryStore::open(storage, config.storage.history_key.clone())?;

    let clock = DisplayClock::new(
        time_sync(config)?,
        display.clone(),
        config.tick_interval(),
        config.clock.time_format.clone(),
    );

    Ok(Announcer::new(
        history,
        clock,
        display,
        notifier,
        config.display.timestamp_format.clone(),
    ))
}

fn read_content(args: &ContentArgs) -> anyhow::Result<String> {
    if args.content != "-" {
        return Ok(args.content.clone());
    }
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .context("cannot read announcement from stdin")?;
    Ok(content)
}

/// Keep the announcement up until the user closes it or leaves full screen.
async fn wait_for_exit(announcer: &mut Announcer, display: &TerminalDisplay) -> anyhow::Result<()> {
    let (mut events, listener) = spawn_event_listener();

    while let Some(event) = events.recv().await {
        match event {
            TerminalEvent::Resize => display.redraw()?,
            TerminalEvent::Close => {
                announcer.close()?;
                break;
            }
            TerminalEvent::FullscreenExited => {
                display.exit_fullscreen()?;
                announcer.fullscreen_changed(false)?;
                break;
            }
        }
    }

    if announcer.is_showing() {
        announcer.close()?;
    }

    drop(events);
    listener.await?;
    Ok(())
}

async fn handle_show(config: &Config, args: &ContentArgs) -> anyhow::Result<()> {
    let content = read_content(args)?;
    let display = Arc::new(TerminalDisplay::new(false));
    let mut announcer =
        build_announcer(config, display.clone(), Arc::new(TerminalNotifier::default()))?;

    if !announcer.generate(&content, args.clock)?.is_shown() {
        return Ok(());
    }
    wait_for_exit(&mut announcer, &display).await
}

fn handle_save(config: &Config, args: &ContentArgs) -> anyhow::Result<()> {
    let content = read_content(args)?;
    let display = Arc::new(TerminalDisplay::new(false));
    let mut announcer = build_announcer(config, display, Arc::new(TerminalNotifier::default()))?;

    if let SaveOutcome::Saved(id) = announcer.save(&content, args.clock, false)? {
        println!("Saved as {id}");
    }
    Ok(())
}

fn handle_history(config: &Config, json: bool) -> anyhow::Result<()> {
    let display = Arc::new(TerminalDisplay::new(!json));
    let mut announcer = build_announcer(config, display, Arc::new(TerminalNotifier::default()))?;

    let view = announcer.list()?;
    let storage = announcer.history().storage();
    debug!(
        "History database {} is {} bytes",
        storage.path().display(),
        storage.size_bytes()
    );
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    }
    Ok(())
}

async fn handle_replay(config: &Config, id: RecordId) -> anyhow::Result<()> {
    let display = Arc::new(TerminalDisplay::new(false));
    let mut announcer =
        build_announcer(config, display.clone(), Arc::new(TerminalNotifier::default()))?;

    if !announcer.replay(id)? {
        debug!("Nothing to replay for {}", id);
        return Ok(());
    }
    wait_for_exit(&mut announcer, &display).await
}

fn handle_delete(config: &Config, id: RecordId, yes: bool) -> anyhow::Result<()> {
    let display = Arc::new(TerminalDisplay::new(true));
    let mut announcer = build_announcer(config, display, Arc::new(TerminalNotifier::new(yes)))?;
    announcer.delete(id)?;
    Ok(())
}

fn handle_clear(config: &Config, yes: bool) -> anyhow::Result<()> {
    let display = Arc::new(TerminalDisplay::new(true));
    let mut announcer = build_announcer(config, display, Arc::new(TerminalNotifier::new(yes)))?;
    announcer.clear_all()?;
    Ok(())
}

async fn handle_time(config: &Config, json: bool) -> anyhow::Result<()> {
    let sync = time_sync(config)?;
    let reading = sync.acquire_offset().await;
    let offset = reading.offset();
    let corrected = offset.apply(sync.local_now());

    if json {
        let status = serde_json::json!({
            "endpoint": sync.endpoint(),
            "corrected": reading.is_corrected(),
            "offset_ms": offset.as_millis(),
            "now": corrected.to_rfc3339(),
            "reason": match &reading {
                OffsetReading::Corrected(_) => None,
                OffsetReading::Unavailable(reason) => Some(reason.as_str()),
            },
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("placard time");
        println!("------------");
        println!("Endpoint:      {}", sync.endpoint());
        match &reading {
            OffsetReading::Corrected(offset) => println!("Offset:        {offset}"),
            OffsetReading::Unavailable(reason) => {
                println!("Offset:        unavailable ({reason}), using local clock");
            }
        }
        println!(
            "Now:           {}",
            format_local(corrected, &config.clock.time_format)
        );
    }
    Ok(())
}

fn handle_config(
    config_path: Option<std::path::PathBuf>,
    cmd: ConfigCommand,
) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  History key:        {}", config.storage.history_key);
                println!();
                println!("[Clock]");
                println!("  Endpoint:           {}", config.clock.endpoint);
                println!("  Tick interval (ms): {}", config.clock.tick_interval_ms);
                println!("  Time format:        {}", config.clock.time_format);
                match config.clock.request_timeout_secs {
                    Some(secs) => println!("  Request timeout:    {secs}s"),
                    None => println!("  Request timeout:    client default"),
                }
                println!();
                println!("[Display]");
                println!("  Timestamp format:   {}", config.display.timestamp_format);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
