/*
 * This file is part of Radeon Monitor.
 *
 * Copyright (C) 2025 Radeon Monitor contributors
 *
 * Radeon Monitor is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Radeon Monitor is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Radeon Monitor. If not, see <https://www.gnu.org/licenses/>.
 */

use std::io::stdout;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use radeon_monitor::app::App;
use radeon_monitor::config::{self, validate_config, MonitorConfig};
use radeon_monitor::device::{Device, ScriptedDevice};
use radeon_monitor::events::handle_key_event;
use radeon_monitor::headless;
use radeon_monitor::logger;
use radeon_monitor::scheduler::{FeatureFlags, InitialSampling, RefreshScheduler};
use radeon_monitor::ui::ui;

#[derive(Parser, Debug)]
#[command(name = "radeon-monitor", version, about = "GPU telemetry monitor with curve-based fan control")]
struct Cli {
    /// Replay device readings from a JSON trace
    #[arg(long, value_name = "TRACE")]
    replay: Option<PathBuf>,

    /// Log snapshots instead of drawing the TUI
    #[arg(long)]
    headless: bool,

    /// Append JSON events to the event log
    #[arg(long)]
    logging: bool,

    /// Refresh interval in seconds, overrides the config
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the effective config to disk and exit
    Save,
}

fn init_tracing(headless: bool) {
    let default = if headless { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.headless);

    let root_mode = unsafe { libc::geteuid() } == 0;
    let config_path = cli.config.clone().unwrap_or_else(config::config_path);
    let mut cfg = config::load_or_default(&config_path);
    if let Some(secs) = cli.interval {
        cfg.interval_secs = secs;
        validate_config(&cfg).context("--interval")?;
    }

    if let Some(Command::Save) = cli.command {
        config::save_config(&config_path, &cfg)
            .with_context(|| format!("write {}", config_path.display()))?;
        println!("Wrote config to {}", config_path.display());
        return Ok(());
    }

    if cli.logging {
        match logger::init_logging(&logger::default_log_path()) {
            Some(p) => info!("Event log: {}", p.display()),
            None => warn!("Event log could not be opened"),
        }
        logger::log_event("startup", serde_json::json!({
            "headless": cli.headless,
            "root": root_mode,
        }));
    }

    let Some(trace) = cli.replay.as_ref() else {
        bail!("no GPU device available; pass --replay <TRACE> to replay recorded readings");
    };
    let device = ScriptedDevice::from_path(trace)?;

    // first read happens while the terminal is set up
    let init = InitialSampling::start(device);

    if cli.headless {
        let mut sched = init.finish(cfg)?;
        if let Err(e) = sched.restore_fan_mode() {
            warn!("Could not restore fan mode: {}", e);
        }
        let flags = FeatureFlags::from_config(sched.config());
        return headless::run_headless(&mut sched, flags);
    }

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, init, cfg, root_mode);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    logger::log_event("shutdown", serde_json::json!({ "ok": res.is_ok() }));
    if let Err(err) = res {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

fn run_app<D: Device + 'static>(
    terminal: &mut Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    init: InitialSampling<D>,
    cfg: MonitorConfig,
    root_mode: bool,
) -> anyhow::Result<()> {
    let mut app = App::new(&cfg, root_mode);
    terminal.draw(|f| ui(f, &app))?;

    let mut sched: RefreshScheduler<D> = init.finish(cfg)?;
    if let Err(e) = sched.restore_fan_mode() {
        app.push_notice(format!("could not restore fan mode: {}", e));
    }
    app.sync_from(&sched);
    // show the startup sample right away
    if let Some(earlier) = app.last_refresh.checked_sub(app.refresh_interval) {
        app.last_refresh = earlier;
    }

    loop {
        terminal.draw(|f| ui(f, &app))?;

        if event::poll(app.time_until_tick()).unwrap_or(false) {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, &mut sched, key_event)? {
                    return Ok(());
                }
            }
        }

        if app.tick_due() {
            let flags = app.flags;
            let window = app.window;
            sched.tick(&flags, window, &mut app);
            app.mark_refreshed();
        }
    }
}
