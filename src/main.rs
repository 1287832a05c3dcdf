//! This crate builds the signal chain of a digital transmitter for given parameters, produces its
//! baseband signal at a higher sample rate by direct synthesis, by FIR interpolation and by
//! reduced-tap interpolation, and compares the interpolated signals with the directly synthesized
//! one. Chain parameters are specified on the command line, and the comparison report is saved to
//! a JSON file.
//!
//! Build the executable with `cargo build --release` and then run `./target/release/adtx -h` for
//! help on the command-line interface. Set `RUST_LOG` (for example `RUST_LOG=debug`) to control
//! logging.

#![warn(
    clippy::complexity,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_allocation,
    unused_import_braces,
    unused_qualifications
)]

use adtx::{
    BitMapper, ChainParams, ChainState, ComparisonReport, ModParams, ModulationScheme,
    PulseParams, PulseShape, RateConversionEngine,
};
use anyhow::{ensure, Result};
use clap::{crate_name, crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Main function
fn main() -> Result<()> {
    init_logging();
    let timer = Instant::now();
    let matches = command_line_parser().get_matches();
    let engine = RateConversionEngine::new(factor_from_matches(&matches))?;
    let state = ChainState::new(chain_params(&matches)?)?;
    let report = ComparisonReport::new(&state, &engine)?;
    tracing::info!(
        internal_rate = report.internal_rate,
        target_rate = report.target_rate,
        loopback_bit_errors = report.loopback_bit_errors,
        "Compared interpolation methods"
    );
    for method in &report.methods {
        tracing::info!(
            method = %method.method,
            num_taps = method.num_taps,
            window = %method.window,
            max_abs = method.stats.max_abs,
            rms = method.stats.rms,
            relative_db = method.stats.relative_db,
            "Residual against direct synthesis"
        );
    }
    report.save_json(json_filename_from_matches(&matches))?;
    tracing::info!("Elapsed time: {:.3?}", timer.elapsed());
    Ok(())
}

/// Installs the log subscriber, with level from `RUST_LOG` and `info` by default.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

/// Returns command line parser.
fn command_line_parser() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about("Compares direct, FIR and reduced-tap interpolation of a transmitter baseband signal")
        .arg(bits())
        .arg(barker_prefix())
        .arg(scheme_name())
        .arg(cardinality())
        .arg(mapper_name())
        .arg(seed())
        .arg(pulse_shape_name())
        .arg(span())
        .arg(roll_off())
        .arg(symbol_rate())
        .arg(target_rate())
        .arg(factor())
        .arg(carrier())
        .arg(json_filename())
}

/// Returns argument for bits.
fn bits() -> Arg {
    Arg::new("bits")
        .short('b')
        .default_value("1011001110001011")
        .help("Bits to be transmitted (characters 0 and 1 only)")
}

/// Returns argument for Barker-7 preamble flag.
fn barker_prefix() -> Arg {
    Arg::new("barker_prefix")
        .short('k')
        .action(ArgAction::SetTrue)
        .help("Prepend the Barker-7 preamble to the bits")
}

/// Returns argument for modulation scheme name.
fn scheme_name() -> Arg {
    Arg::new("scheme_name")
        .short('m')
        .value_parser(["ASK", "PSK"])
        .default_value("ASK")
        .help("Modulation scheme name")
}

/// Returns argument for modulation alphabet size.
fn cardinality() -> Arg {
    Arg::new("cardinality")
        .short('M')
        .value_parser(value_parser!(usize))
        .default_value("2")
        .help("Modulation alphabet size (power of 2)")
}

/// Returns argument for bit mapper name.
fn mapper_name() -> Arg {
    Arg::new("mapper_name")
        .short('g')
        .value_parser(["Binary", "Gray", "Random"])
        .default_value("Binary")
        .help("Bit-to-symbol mapping name")
}

/// Returns argument for seed of random bit mapper.
fn seed() -> Arg {
    Arg::new("seed")
        .short('d')
        .value_parser(value_parser!(u64))
        .default_value("0")
        .help("Seed of random bit-to-symbol mapping")
}

/// Returns argument for pulse shape name.
fn pulse_shape_name() -> Arg {
    Arg::new("pulse_shape_name")
        .short('p')
        .value_parser(["Rectangle", "Cosine-Squared", "Raised-Cosine"])
        .default_value("Raised-Cosine")
        .help("Pulse shape name")
}

/// Returns argument for pulse span.
fn span() -> Arg {
    Arg::new("span")
        .short('n')
        .value_parser(value_parser!(usize))
        .default_value("2")
        .help("Pulse span (symbol periods)")
}

/// Returns argument for roll-off factor.
fn roll_off() -> Arg {
    Arg::new("roll_off")
        .short('r')
        .value_parser(value_parser!(f64))
        .default_value("0.2")
        .help("Roll-off factor of raised-cosine pulse")
}

/// Returns argument for symbol rate.
fn symbol_rate() -> Arg {
    Arg::new("symbol_rate")
        .short('s')
        .value_parser(value_parser!(u32))
        .default_value("100")
        .help("Symbol rate (symbols per second)")
}

/// Returns argument for target sample rate.
fn target_rate() -> Arg {
    Arg::new("target_rate")
        .short('t')
        .value_parser(value_parser!(u32))
        .default_value("48000")
        .help("Sample rate after interpolation (samples per second)")
}

/// Returns argument for interpolation factor.
fn factor() -> Arg {
    Arg::new("factor")
        .short('l')
        .value_parser(value_parser!(usize))
        .default_value("10")
        .help("Interpolation factor")
}

/// Returns argument for carrier frequency.
fn carrier() -> Arg {
    Arg::new("carrier")
        .short('c')
        .value_parser(value_parser!(u32))
        .default_value("440")
        .help("Carrier frequency (Hz)")
}

/// Returns argument for name of JSON file to which the report must be saved.
fn json_filename() -> Arg {
    Arg::new("json_filename")
        .short('f')
        .default_value("report.json")
        .help("Name of JSON file to which the report must be saved")
}

/// Returns chain parameters at the internal sample rate, based on command-line arguments.
///
/// # Errors
///
/// Returns an error if the target sample rate is not a multiple of the interpolation factor.
fn chain_params(matches: &ArgMatches) -> Result<ChainParams> {
    let target_rate = *matches.get_one::<u32>("target_rate").unwrap();
    let factor = factor_from_matches(matches);
    ensure!(
        factor > 0 && target_rate as usize % factor == 0,
        "Target sample rate {target_rate} is not a multiple of interpolation factor {factor}"
    );
    // OK to unwrap: All command-line arguments have default values, and the target rate is a
    // multiple of the factor, so an error cannot occur in any of the calls below.
    Ok(ChainParams {
        bits: matches.get_one::<String>("bits").unwrap().to_string(),
        barker_prefix: matches.get_flag("barker_prefix"),
        modulation: mod_params_from_matches(matches),
        pulse: pulse_params_from_matches(matches),
        symbol_rate: *matches.get_one("symbol_rate").unwrap(),
        sample_rate: target_rate / u32::try_from(factor)?,
        carrier: *matches.get_one("carrier").unwrap(),
    })
}

/// Returns modulation parameters.
fn mod_params_from_matches(matches: &ArgMatches) -> ModParams {
    let scheme = match matches.get_one::<String>("scheme_name").unwrap().as_str() {
        "ASK" => ModulationScheme::AmplitudeShiftKeying,
        "PSK" => ModulationScheme::PhaseShiftKeying,
        _ => panic!("Invalid modulation scheme name"),
    };
    let mapper = match matches.get_one::<String>("mapper_name").unwrap().as_str() {
        "Binary" => BitMapper::Identity,
        "Gray" => BitMapper::Gray,
        "Random" => BitMapper::Random {
            seed: *matches.get_one("seed").unwrap(),
        },
        _ => panic!("Invalid bit mapper name"),
    };
    ModParams::new(scheme, *matches.get_one("cardinality").unwrap(), mapper)
}

/// Returns pulse parameters.
fn pulse_params_from_matches(matches: &ArgMatches) -> PulseParams {
    let shape = match matches
        .get_one::<String>("pulse_shape_name")
        .unwrap()
        .as_str()
    {
        "Rectangle" => PulseShape::Rectangular,
        "Cosine-Squared" => PulseShape::CosineSquared,
        "Raised-Cosine" => PulseShape::RaisedCosine {
            roll_off: *matches.get_one("roll_off").unwrap(),
        },
        _ => panic!("Invalid pulse shape name"),
    };
    PulseParams::new(shape, *matches.get_one("span").unwrap())
}

/// Returns interpolation factor.
fn factor_from_matches(matches: &ArgMatches) -> usize {
    *matches.get_one("factor").unwrap()
}

/// Returns name of JSON file to which the report must be saved.
fn json_filename_from_matches(matches: &ArgMatches) -> String {
    matches
        .get_one::<String>("json_filename")
        .unwrap()
        .to_string()
}
