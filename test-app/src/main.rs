// lx200 test application -- CLI tool for exercising the Astro-Physics and
// OpenAstroTech backends against real hardware or a scripted mock.
//
// Usage:
//   lx200-test-app list
//   lx200-test-app --dialect ap --model gtocp4 --port /dev/ttyUSB0 status
//   lx200-test-app --dialect ap --mock target --ra 5.5 --dec -12.25
//   lx200-test-app --dialect oat --port /dev/ttyACM0 focuser rel in 150
//   lx200-test-app --dialect oat --mock raw ':GVP#'
//   lx200-test-app -vv --dialect ap --mock poll --count 20

use std::fmt::Debug;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use lx200::astrophysics::models as ap_models;
use lx200::astrophysics::{AstroPhysicsBuilder, AstroPhysicsMount, StatusSnapshot};
use lx200::oat::models as oat_models;
use lx200::oat::{OatBuilder, OpenAstroTechMount};
use lx200::protocol::Command as MeadeCommand;
use lx200::{FocusDirection, Focuser, GuideDirection, MountMotion};
use lx200_test_harness::MockTransport;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// lx200 test application -- exercises mount backends from the command line.
#[derive(Parser)]
#[command(name = "lx200-test-app", version, about)]
struct Cli {
    /// Controller dialect. Required for all commands except `list`.
    #[arg(long, value_enum)]
    dialect: Option<Dialect>,

    /// Astro-Physics model: gtocp3, gtocp4, gtocp4-p02 (default gtocp4).
    #[arg(long)]
    model: Option<String>,

    /// Serial port path (e.g. /dev/ttyUSB0, COM3). Required unless --mock.
    #[arg(long)]
    port: Option<String>,

    /// Override the model's default baud rate.
    #[arg(long)]
    baud: Option<u32>,

    /// Reply timeout for blocking commands, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    /// Use a scripted mock transport instead of a real serial port.
    #[arg(long)]
    mock: bool,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Dialect {
    /// Astro-Physics GTOCP3/GTOCP4.
    Ap,
    /// OpenAstroTech.
    Oat,
}

#[derive(Subcommand)]
enum Command {
    /// List supported controller models.
    List,

    /// Print mount information.
    Info,

    /// Read and decode the status block (Astro-Physics only).
    Status,

    /// Poll the status block repeatedly and report failures (Astro-Physics only).
    Poll {
        /// Number of polls.
        #[arg(long, default_value_t = 10)]
        count: u32,
        /// Pause between polls in milliseconds.
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },

    /// Set the goto/sync target.
    Target {
        /// Right ascension in hours.
        #[arg(long, allow_hyphen_values = true)]
        ra: f64,
        /// Declination in degrees.
        #[arg(long, allow_hyphen_values = true)]
        dec: f64,
    },

    /// Set the observing site.
    Site {
        /// Latitude in degrees, north positive.
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in degrees, east positive.
        #[arg(long, allow_hyphen_values = true)]
        long: f64,
    },

    /// UTC offset operations.
    UtcOffset {
        #[command(subcommand)]
        action: UtcOffsetAction,
    },

    /// Sync to the current target.
    Sync,

    /// Send a guide pulse.
    Pulse {
        /// Direction: n, s, e, w.
        direction: GuideDirection,
        /// Duration in milliseconds (capped at the controller maximum).
        duration_ms: u32,
    },

    /// Park the mount.
    Park,

    /// Unpark the mount.
    Unpark,

    /// Stop any slew in progress.
    Abort,

    /// Focuser operations (OpenAstroTech only).
    Focuser {
        #[command(subcommand)]
        action: FocuserAction,
    },

    /// Send a raw Meade command such as ':GR#' and print the reply.
    Raw {
        /// Complete command including ':' and '#'.
        command: String,
    },
}

#[derive(Subcommand)]
enum UtcOffsetAction {
    /// Read the UTC offset.
    Get,
    /// Set the UTC offset in hours.
    Set {
        #[arg(allow_hyphen_values = true)]
        hours: f64,
    },
}

#[derive(Subcommand)]
enum FocuserAction {
    /// Move to an absolute position.
    Abs { ticks: u32 },
    /// Move by a number of ticks: in or out.
    Rel {
        direction: FocusDirection,
        ticks: u32,
    },
    /// Run the motor for a duration: in or out.
    Timed {
        direction: FocusDirection,
        duration_ms: u32,
    },
    /// Stop focuser motion.
    Abort,
    /// Read the focuser position.
    Position,
}

// ---------------------------------------------------------------------------
// Mount construction
// ---------------------------------------------------------------------------

enum Mount {
    Ap(AstroPhysicsMount),
    Oat(OpenAstroTechMount),
}

impl Mount {
    fn motion(&self) -> &dyn MountMotion {
        match self {
            Mount::Ap(m) => m,
            Mount::Oat(m) => m,
        }
    }

    fn astro_physics(&self) -> Result<&AstroPhysicsMount> {
        match self {
            Mount::Ap(m) => Ok(m),
            Mount::Oat(_) => bail!("this command is only supported for --dialect ap"),
        }
    }

    fn focuser(&self) -> Result<&dyn Focuser> {
        match self {
            Mount::Oat(m) => Ok(m),
            Mount::Ap(_) => bail!("this command is only supported for --dialect oat"),
        }
    }

    async fn shutdown(&self) -> Result<()> {
        match self {
            Mount::Ap(m) => m.shutdown().await?,
            Mount::Oat(m) => m.shutdown().await?,
        }
        Ok(())
    }
}

fn lookup_ap_model(name: Option<&str>) -> Result<ap_models::ApModel> {
    match name.map(str::to_ascii_lowercase).as_deref() {
        None | Some("gtocp4") => Ok(ap_models::gtocp4()),
        Some("gtocp3") => Ok(ap_models::gtocp3()),
        Some("gtocp4-p02") | Some("p02") => Ok(ap_models::gtocp4_p02()),
        Some(other) => bail!("unknown Astro-Physics model '{other}'. Supported: gtocp3, gtocp4, gtocp4-p02"),
    }
}

/// Canned replies so every subcommand has something to talk to.
fn scripted_mock(dialect: Dialect) -> MockTransport {
    let mut mock = MockTransport::new();
    match dialect {
        Dialect::Ap => {
            mock.reply(b"#:GOS#", b"029000000O0000#");
            mock.reply(b"#:GG#", b"A5:00:00#");
            mock.reply(b"#:GR#", b"05:30:00#");
            mock.reply(b"#:GH#", b"01:15:00#");
            mock.reply(b"#:CM#", b"Coordinates matched.#");
            mock.reply_prefix(b"#:S", b"1");
            mock.reply_prefix(b"#:", b"");
            mock.reply_prefix(b":R", b"1");
            mock.reply_prefix(b":", b"");
        }
        Dialect::Oat => {
            mock.reply(b":GG#", b"-05:00:00#");
            mock.reply(b":GR#", b"05:30:00#");
            mock.reply(b":GVP#", b"OpenAstroTracker#");
            mock.reply(b":Fp#", b"1500#");
            mock.reply(b":CM#", b"Coordinates matched.#");
            mock.reply_prefix(b":S", b"1");
            mock.reply_prefix(b":", b"");
        }
    }
    mock
}

async fn create_mount(cli: &Cli, dialect: Dialect) -> Result<Mount> {
    let timeout = Duration::from_millis(cli.timeout_ms);

    if !cli.mock && cli.port.is_none() {
        bail!("--port is required when not using --mock");
    }

    match dialect {
        Dialect::Ap => {
            let model = lookup_ap_model(cli.model.as_deref())?;
            let mut builder = AstroPhysicsBuilder::new(model.clone()).command_timeout(timeout);
            if let Some(baud) = cli.baud {
                builder = builder.baud_rate(baud);
            }

            let mount = if cli.mock {
                let mount = builder
                    .build_with_transport(Box::new(scripted_mock(dialect)))
                    .await
                    .context("failed to build AstroPhysicsMount with mock transport")?;
                println!("Connected (mock transport) -- Astro-Physics {}", model.name);
                mount
            } else {
                let port = cli.port.as_deref().unwrap_or_default();
                let mount = builder
                    .serial_port(port)
                    .build()
                    .await
                    .with_context(|| format!("failed to open serial port {port}"))?;
                mount
                    .check_connection()
                    .await
                    .context("mount did not answer the connection probe")?;
                println!("Connected to {port} -- Astro-Physics {}", model.name);
                mount
            };
            Ok(Mount::Ap(mount))
        }
        Dialect::Oat => {
            let model = oat_models::openastrotech();
            let mut builder = OatBuilder::new(model.clone()).command_timeout(timeout);
            if let Some(baud) = cli.baud {
                builder = builder.baud_rate(baud);
            }

            let mount = if cli.mock {
                let mount = builder
                    .build_with_transport(Box::new(scripted_mock(dialect)))
                    .await
                    .context("failed to build OpenAstroTechMount with mock transport")?;
                println!("Connected (mock transport) -- {}", model.name);
                mount
            } else {
                let port = cli.port.as_deref().unwrap_or_default();
                let mount = builder
                    .serial_port(port)
                    .build()
                    .await
                    .with_context(|| format!("failed to open serial port {port}"))?;
                println!("Connected to {port} -- {}", model.name);
                mount
            };
            Ok(Mount::Oat(mount))
        }
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_list() -> Result<()> {
    println!("{:<16} {:<22} {:>7}  Focuser", "Vendor", "Model", "Baud");
    for mount in lx200::supported_mounts() {
        println!(
            "{:<16} {:<22} {:>7}  {}",
            mount.vendor.to_string(),
            mount.model_name,
            mount.default_baud_rate,
            if mount.has_focuser { "yes" } else { "no" }
        );
    }
    Ok(())
}

fn cmd_info(mount: &dyn MountMotion) -> Result<()> {
    let info = mount.info();
    println!("Mount Information");
    println!("  Vendor:         {}", info.vendor);
    println!("  Model:          {}", info.model_name);
    println!("  Device name:    {}", info.device_name);
    Ok(())
}

fn show<T: Debug>(value: lx200::Result<T>) -> String {
    match value {
        Ok(v) => format!("{v:?}"),
        Err(e) => format!("<{e}>"),
    }
}

fn print_status(status: &StatusSnapshot) {
    println!("Status block:     {}", status.raw());
    println!("  Generation:     {:?}", status.generation());
    println!("  Parked:         {}", status.is_parked());
    println!("  Slewing:        {}", status.is_slewing());
    println!("  Park state:     {}", show(status.park_state()));
    println!("  RA tracking:    {}", show(status.ra_tracking()));
    println!("  Dec tracking:   {}", show(status.dec_tracking()));
    println!("  RA motion:      {}", show(status.ra_motion()));
    println!("  Dec motion:     {}", show(status.dec_motion()));
    println!("  Guide rate:     {}", show(status.guide_rate()));
    println!("  Center rate:    {}", show(status.center_rate()));
    println!("  Slew rate:      {}", show(status.slew_rate()));
    println!("  PEM:            {}", show(status.pem_state()));
    println!("  Condition:      {}", show(status.mount_condition()));
    println!("  E/W reversed:   {}", show(status.ew_buttons_reversed()));
    println!("  N/S reversed:   {}", show(status.ns_buttons_reversed()));
    println!("  Button rates:   {}", show(status.button_rate_table()));
}

async fn cmd_status(mount: &AstroPhysicsMount) -> Result<()> {
    let status = mount.status().await?;
    print_status(&status);
    Ok(())
}

async fn cmd_poll(mount: &AstroPhysicsMount, count: u32, interval_ms: u64) -> Result<()> {
    let mut success = 0u32;
    let mut failures = 0u32;
    let start = Instant::now();

    for i in 1..=count {
        match mount.status().await {
            Ok(status) => {
                success += 1;
                println!(
                    "[{i}/{count}] {} parked={} slewing={}",
                    status.raw(),
                    status.is_parked(),
                    status.is_slewing()
                );
            }
            Err(e) => {
                eprintln!("[{i}/{count}] status failed: {e}");
                failures += 1;
            }
        }
        if i < count {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        }
    }

    println!();
    println!("Results:");
    println!("  Polls:          {count}");
    println!("  Successes:      {success}");
    println!("  Failures:       {failures}");
    println!("  Elapsed:        {:.3} s", start.elapsed().as_secs_f64());

    if failures > 0 {
        bail!("{failures} out of {count} status polls failed");
    }
    Ok(())
}

async fn cmd_raw(mount: &Mount, raw: &str) -> Result<()> {
    let reply = match mount {
        Mount::Oat(m) => m.execute_meade_command(raw).await?,
        Mount::Ap(m) => {
            let command = MeadeCommand::parse_meade(raw)?;
            m.channel().execute(&command).await?.into_text()
        }
    };
    if reply.is_empty() {
        println!("(no reply expected)");
    } else {
        println!("{reply}");
    }
    Ok(())
}

async fn cmd_focuser(focuser: &dyn Focuser, action: &FocuserAction) -> Result<()> {
    match action {
        FocuserAction::Abs { ticks } => {
            let status = focuser.move_focuser_absolute(*ticks).await?;
            println!("Focuser: {status}");
        }
        FocuserAction::Rel { direction, ticks } => {
            let status = focuser.move_focuser_relative(*direction, *ticks).await?;
            println!("Focuser: {status}");
        }
        FocuserAction::Timed {
            direction,
            duration_ms,
        } => {
            let status = focuser.move_focuser_timed(*direction, *duration_ms).await?;
            println!("Focuser: {status}");
        }
        FocuserAction::Abort => {
            focuser.abort_focuser().await?;
            println!("Focuser stopped");
        }
        FocuserAction::Position => {
            let (min, max) = focuser.focuser_limits();
            println!(
                "Focuser position: {} (limits {min}..={max})",
                focuser.get_focuser_position().await?
            );
        }
    }
    Ok(())
}

async fn run(mount: &Mount, command: &Command) -> Result<()> {
    let motion = mount.motion();
    match command {
        Command::List => unreachable!("list handled before connecting"),
        Command::Info => cmd_info(motion),
        Command::Status => cmd_status(mount.astro_physics()?).await,
        Command::Poll { count, interval_ms } => {
            cmd_poll(mount.astro_physics()?, *count, *interval_ms).await
        }
        Command::Target { ra, dec } => {
            motion.set_target_ra(*ra).await?;
            motion.set_target_dec(*dec).await?;
            println!("Target set: RA {ra} h, Dec {dec} deg");
            Ok(())
        }
        Command::Site { lat, long } => {
            motion.set_site_latitude(*lat).await?;
            motion.set_site_longitude(*long).await?;
            println!("Site set: lat {lat} deg, long {long} deg");
            Ok(())
        }
        Command::UtcOffset { action } => match action {
            UtcOffsetAction::Get => {
                println!("UTC offset: {} h", motion.get_utc_offset().await?);
                Ok(())
            }
            UtcOffsetAction::Set { hours } => {
                motion.set_utc_offset(*hours).await?;
                println!("UTC offset set to {hours} h");
                Ok(())
            }
        },
        Command::Sync => {
            println!("Synced: {}", motion.sync().await?.trim());
            Ok(())
        }
        Command::Pulse {
            direction,
            duration_ms,
        } => {
            let sent = motion.pulse_guide(*direction, *duration_ms).await?;
            println!("Pulse {direction} {sent} ms");
            Ok(())
        }
        Command::Park => Ok(motion.park().await?),
        Command::Unpark => Ok(motion.unpark().await?),
        Command::Abort => Ok(motion.abort_slew().await?),
        Command::Focuser { action } => cmd_focuser(mount.focuser()?, action).await,
        Command::Raw { command } => cmd_raw(mount, command).await,
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "lx200-test-app starting");

    if matches!(cli.command, Command::List) {
        return cmd_list();
    }

    let dialect = cli
        .dialect
        .context("--dialect is required for this command")?;
    let mount = create_mount(&cli, dialect).await?;

    let result = run(&mount, &cli.command).await;
    mount.shutdown().await.ok();
    result
}
