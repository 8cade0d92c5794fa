//! DeviceReactor host simulation.
//!
//! Runs a scripted session against [`SimHardware`] and a [`ManualClock`]:
//! a button toggles an LED, an encoder drives a counter, a potentiometer
//! is swept through three zones and an RGB indicator follows the zone.
//! Two intervals report status while the script runs.
//!
//! ```text
//! devicereactor-sim [config.json] [duration_ms]
//! DEVICEREACTOR_LOG=debug devicereactor-sim
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, info, warn};

use devicereactor::adapters::sim::SimHardware;
use devicereactor::adapters::time::ManualClock;
use devicereactor::diagnostics::OrHalt;
use devicereactor::{Fired, Intervals, Preset, Reactor, ReactorConfig, Ticks};

// ── Wiring ────────────────────────────────────────────────────

const LED_PIN: u8 = 13;
const BUTTON_PIN: u8 = 2;
const ENC_SW: u8 = 5;
const ENC_DT: u8 = 6;
const ENC_CLK: u8 = 7;
const POT_PIN: u8 = 34;
const RGB_PINS: (u8, u8, u8) = (9, 10, 11);

const DEFAULT_DURATION_MS: Ticks = 6_000;

// ── Logging ───────────────────────────────────────────────────

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logger() -> Result<()> {
    let level = match std::env::var("DEVICEREACTOR_LOG") {
        Ok(spec) => spec
            .parse::<LevelFilter>()
            .map_err(|_| anyhow!("unknown log level {:?}", spec))?,
        Err(_) => LevelFilter::Info,
    };
    log::set_logger(&LOGGER).map_err(|_| anyhow!("logger already installed"))?;
    log::set_max_level(level);
    Ok(())
}

// ── Session state ─────────────────────────────────────────────

#[derive(Debug, Default)]
struct Session {
    presses: u32,
    toggle_requested: bool,
    counter: i32,
    percent: i32,
    zone: Option<u8>,
    zone_changed: bool,
    heartbeats: u32,
    reports: u32,
}

type Sim<'a> = Reactor<SimHardware, &'a ManualClock, Session>;
type Timers = Intervals<Session, 8>;

fn status(session: &mut Session, timers: &mut Timers, fired: Fired) {
    session.reports += 1;
    info!(
        "status @{}ms: presses={} counter={} percent={} zone={:?}",
        fired.now, session.presses, session.counter, session.percent, session.zone
    );
    if session.reports == 3 {
        timers.log_status();
    }
}

fn heartbeat(session: &mut Session, _timers: &mut Timers, fired: Fired) {
    session.heartbeats += 1;
    info!("heartbeat {} (slot {})", session.heartbeats, fired.id.index());
}

// ── Stimulus ──────────────────────────────────────────────────

/// Drive the simulated pins for tick `t`.
fn stimulate(io: &mut SimHardware, t: Ticks) {
    match t {
        // Button press with contact bounce on the way down.
        500 | 503 => io.set_digital(BUTTON_PIN, false),
        501 => io.set_digital(BUTTON_PIN, true),
        700 => io.set_digital(BUTTON_PIN, true),
        // Second press toggles the LED back.
        1_800 => io.set_digital(BUTTON_PIN, false),
        1_900 => io.set_digital(BUTTON_PIN, true),
        _ => {}
    }

    // Three clockwise detents, then one counter-clockwise.
    if (1_000..1_400).contains(&t) {
        let phase = (t - 1_000) % 100;
        let clockwise = t < 1_300;
        match phase {
            0 => io.set_digital(ENC_DT, clockwise),
            10 => io.set_digital(ENC_CLK, true),
            30 => {
                io.set_digital(ENC_CLK, false);
                io.set_digital(ENC_DT, false);
            }
            _ => {}
        }
    }

    // Pot sweep 0 → full scale over two seconds.
    if (2_000..=4_000).contains(&t) {
        let raw = (t - 2_000) as i32 * 1023 / 2_000;
        io.set_analog(POT_PIN, raw);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn load_config(path: Option<&str>) -> Result<ReactorConfig> {
    let Some(path) = path else {
        return Ok(ReactorConfig::default());
    };
    let json = std::fs::read(path).with_context(|| format!("reading {}", path))?;
    let config = ReactorConfig::from_json(&json).with_context(|| format!("parsing {}", path))?;
    info!("config loaded from {}", path);
    Ok(config)
}

fn main() -> Result<()> {
    init_logger()?;
    info!("DeviceReactor simulation v{}", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(args.first().map(String::as_str))?;
    let duration = match args.get(1) {
        Some(ms) => ms.parse::<Ticks>().context("duration must be milliseconds")?,
        None => DEFAULT_DURATION_MS,
    };

    // Round-trip through the flash encoding, as a board would on boot.
    let blob = config.to_bytes()?;
    let config = ReactorConfig::from_bytes(&blob)?;
    info!("config blob: {} bytes ({})", blob.len(), config.to_json()?);

    let clock = ManualClock::new(0);
    let mut io = SimHardware::new();
    io.set_digital(BUTTON_PIN, true);
    io.set_digital(ENC_SW, true);

    let mut reactor: Sim<'_> = Reactor::with_config(io, &clock, config)?;

    let led = reactor.new_output(LED_PIN)?;
    let (r, g, b) = RGB_PINS;
    let indicator = reactor.new_rgb_output(r, g, b)?;

    let button = reactor.new_button(BUTTON_PIN)?;
    reactor.input(button)?.on_press(|s| {
        s.presses += 1;
        s.toggle_requested = true;
    });

    let encoder = reactor.new_encoder(ENC_SW, ENC_DT, ENC_CLK)?;
    reactor
        .encoder(encoder)?
        .on_clockwise(|s| s.counter += 1)
        .on_counter_clockwise(|s| s.counter -= 1)
        .on_press(|s| s.counter = 0);

    let pot = reactor.new_analog(POT_PIN)?;
    reactor
        .analog(pot)?
        .configure(Preset::PotForPercentage)
        .on_change(|s, v| s.percent = v)
        .on_zone_change(|s, zone| {
            s.zone = zone;
            s.zone_changed = true;
        })
        .add_zone(0, 0, 33)?
        .add_zone(1, 34, 66)?
        .add_zone(2, 67, 100)?;

    reactor.every(1_000, status)?;
    reactor.repeat(250, 4, heartbeat)?;
    reactor.output(led)?.blink_times(100, 3);

    let mut session = Session::default();
    info!("running for {} ms", duration);

    for t in 0..duration {
        clock.set(t);
        stimulate(reactor.io_mut(), t);
        reactor.update(&mut session);

        if std::mem::take(&mut session.toggle_requested) {
            reactor.output(led).or_halt().flip();
        }
        if std::mem::take(&mut session.zone_changed) {
            let (red, green, blue) = match session.zone {
                Some(0) => (0, 0, 255),
                Some(1) => (0, 255, 0),
                Some(2) => (255, 0, 0),
                _ => (0, 0, 0),
            };
            reactor.output(indicator).or_halt().set_color(red, green, blue);
        }
        if t == 4_500 {
            reactor.output(led).or_halt().fade_out(500);
        }
    }

    let final_percent = reactor.analog_value(pot)?;
    if final_percent != session.percent {
        warn!("pot reported {} but session saw {}", final_percent, session.percent);
    }

    let (io, _clock) = reactor.into_parts();
    info!("── summary ──");
    info!("button presses : {}", session.presses);
    info!("encoder counter: {}", session.counter);
    info!("pot percent    : {} (zone {:?})", session.percent, session.zone);
    info!("heartbeats     : {}", session.heartbeats);
    info!("status reports : {}", session.reports);
    info!("pin writes     : {}", io.history().len());
    Ok(())
}
