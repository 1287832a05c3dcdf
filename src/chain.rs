//! # Versioned state of the complete signal chain
//!
//! A [`ChainState`] holds every entity of the chain (bits, codebook, pulse, symbols, baseband
//! signal, passband signal) computed from one set of [`ChainParams`]. States are immutable: a
//! [`ChainController`] owns the current state, turns each [`ParamChange`] into a new state with
//! the next version number, and sends the new state to every subscriber. Only entities that
//! depend on a changed parameter are recomputed; the others are shared with the previous state.
//!
//! # Examples
//!
//! ```
//! use adtx::{ChainController, ChainParams, ParamChange};
//!
//! let mut controller = ChainController::new(ChainParams::default())?;
//! let updates = controller.subscribe();
//! let before = controller.state();
//! let after = controller.apply(ParamChange::Carrier(880))?;
//! assert_eq!(after.version(), before.version() + 1);
//! assert_eq!(updates.recv()?.passband().carrier(), 880);
//! assert!(std::sync::Arc::ptr_eq(before.baseband(), after.baseband()));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::resample::{InterpolationMethod, RateConversionEngine, ResidualStats};
use crate::{
    baseband, pulse, quadrature, sequencer, utils, BasebandSignal, BitMapper, BitSequence, Error,
    ModParams, ModulationCodebook, ModulationScheme, PassbandSignal, PulseParams, PulseShape,
    PulseWaveform, SymbolSequence, Window,
};

/// Window of the lowpass filter used to demodulate the passband signal
const DEMOD_WINDOW: Window = Window::Kaiser { beta: 8.6 };

/// Number of demodulation filter taps per carrier period
const DEMOD_TAPS_PER_CARRIER_PERIOD: usize = 8;

/// Parameters of the complete signal chain
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct ChainParams {
    /// Bits as text of `0` and `1` characters
    pub bits: String,
    /// Whether the Barker-7 preamble is prepended to the bits
    pub barker_prefix: bool,
    /// Modulation parameters
    pub modulation: ModParams,
    /// Pulse parameters
    pub pulse: PulseParams,
    /// Symbol rate (symbols per second)
    pub symbol_rate: u32,
    /// Sample rate (samples per second)
    pub sample_rate: u32,
    /// Carrier frequency (Hz)
    pub carrier: u32,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            bits: "1011001110001011".to_string(),
            barker_prefix: false,
            modulation: ModParams::default(),
            pulse: PulseParams::new(PulseShape::RaisedCosine { roll_off: 0.2 }, 2),
            symbol_rate: 100,
            sample_rate: 48000,
            carrier: 440,
        }
    }
}

/// Change of one chain parameter
#[derive(Clone, PartialEq, Debug)]
pub enum ParamChange {
    /// New bit text
    Bits(String),
    /// Whether the Barker-7 preamble is prepended
    BarkerPrefix(bool),
    /// New modulation parameters
    Modulation(ModParams),
    /// New pulse parameters
    Pulse(PulseParams),
    /// New symbol rate
    SymbolRate(u32),
    /// New sample rate
    SampleRate(u32),
    /// New carrier frequency
    Carrier(u32),
}

impl ParamChange {
    /// Applies the change to the parameters, and returns the entities it invalidates.
    fn apply_to(self, params: &mut ChainParams) -> Stale {
        match self {
            ParamChange::Bits(bits) => {
                params.bits = bits;
                Stale::BITS
            }
            ParamChange::BarkerPrefix(barker_prefix) => {
                params.barker_prefix = barker_prefix;
                Stale::BITS
            }
            ParamChange::Modulation(modulation) => {
                params.modulation = modulation;
                Stale::CODEBOOK
            }
            ParamChange::Pulse(pulse) => {
                params.pulse = pulse;
                Stale::PULSE
            }
            ParamChange::SymbolRate(symbol_rate) => {
                params.symbol_rate = symbol_rate;
                Stale::PULSE
            }
            ParamChange::SampleRate(sample_rate) => {
                params.sample_rate = sample_rate;
                Stale::PULSE
            }
            ParamChange::Carrier(carrier) => {
                params.carrier = carrier;
                Stale::NONE
            }
        }
    }
}

/// Upstream entities that must be recomputed; symbols, baseband and passband follow from these
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
struct Stale {
    /// Bit sequence
    bits: bool,
    /// Modulation codebook
    codebook: bool,
    /// Pulse waveform
    pulse: bool,
}

impl Stale {
    const NONE: Self = Self {
        bits: false,
        codebook: false,
        pulse: false,
    };
    const BITS: Self = Self {
        bits: true,
        ..Self::NONE
    };
    const CODEBOOK: Self = Self {
        codebook: true,
        ..Self::NONE
    };
    const PULSE: Self = Self {
        pulse: true,
        ..Self::NONE
    };
    const ALL: Self = Self {
        bits: true,
        codebook: true,
        pulse: true,
    };

    fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits || other.bits,
            codebook: self.codebook || other.codebook,
            pulse: self.pulse || other.pulse,
        }
    }
}

/// Immutable state of the complete signal chain
#[derive(Clone, PartialEq, Debug)]
pub struct ChainState {
    /// Version number, increasing by one with every successful change
    version: u64,
    /// Parameters the state was computed from
    params: ChainParams,
    /// Bit sequence
    bits: Arc<BitSequence>,
    /// Modulation codebook
    codebook: Arc<ModulationCodebook>,
    /// Pulse waveform
    pulse: Arc<PulseWaveform>,
    /// Symbol sequence
    symbols: Arc<SymbolSequence>,
    /// Baseband signal
    baseband: Arc<BasebandSignal>,
    /// Passband signal
    passband: Arc<PassbandSignal>,
}

impl ChainState {
    /// Returns state computed from scratch for the given parameters, with version zero.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage of the chain rejects the parameters.
    pub fn new(params: ChainParams) -> Result<Self, Error> {
        Self::build(params, Stale::ALL, None)
    }

    /// Returns state for the given parameters, reusing the entities of the previous state that
    /// are not stale.
    fn build(params: ChainParams, stale: Stale, previous: Option<&Self>) -> Result<Self, Error> {
        let reuse = |is_stale: bool| previous.filter(|_| !is_stale);
        let bits = match reuse(stale.bits) {
            Some(prev) => Arc::clone(&prev.bits),
            None => Arc::new(bits_from_params(&params)?),
        };
        let codebook = match reuse(stale.codebook) {
            Some(prev) => Arc::clone(&prev.codebook),
            None => Arc::new(ModulationCodebook::new(&params.modulation)?),
        };
        let pulse = match reuse(stale.pulse) {
            Some(prev) => Arc::clone(&prev.pulse),
            None => Arc::new(pulse::generate(
                &params.pulse,
                params.symbol_rate,
                params.sample_rate,
            )?),
        };
        let symbols = match reuse(stale.bits || stale.codebook) {
            Some(prev) => Arc::clone(&prev.symbols),
            None => Arc::new(sequencer::sequence_symbols(
                Arc::clone(&bits),
                Arc::clone(&codebook),
            )?),
        };
        let baseband = match reuse(stale != Stale::NONE) {
            Some(prev) => Arc::clone(&prev.baseband),
            None => Arc::new(baseband::synthesize(
                Arc::clone(&pulse),
                Arc::clone(&symbols),
                params.sample_rate,
                params.symbol_rate,
            )?),
        };
        let passband = Arc::new(quadrature::modulate(
            Arc::clone(&baseband),
            params.carrier,
        )?);
        Ok(Self {
            version: previous.map_or(0, |prev| prev.version + 1),
            params,
            bits,
            codebook,
            pulse,
            symbols,
            baseband,
            passband,
        })
    }

    /// Returns the version number.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the parameters the state was computed from.
    #[must_use]
    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Returns the bit sequence.
    #[must_use]
    pub fn bits(&self) -> &Arc<BitSequence> {
        &self.bits
    }

    /// Returns the modulation codebook.
    #[must_use]
    pub fn codebook(&self) -> &Arc<ModulationCodebook> {
        &self.codebook
    }

    /// Returns the pulse waveform.
    #[must_use]
    pub fn pulse(&self) -> &Arc<PulseWaveform> {
        &self.pulse
    }

    /// Returns the symbol sequence.
    #[must_use]
    pub fn symbols(&self) -> &Arc<SymbolSequence> {
        &self.symbols
    }

    /// Returns the baseband signal.
    #[must_use]
    pub fn baseband(&self) -> &Arc<BasebandSignal> {
        &self.baseband
    }

    /// Returns the passband signal.
    #[must_use]
    pub fn passband(&self) -> &Arc<PassbandSignal> {
        &self.passband
    }

    /// Returns the record of parameters needed to reproduce the passband signal.
    #[must_use]
    pub fn export_metadata(&self) -> ExportMetadata {
        let shape = self.params.pulse.shape;
        ExportMetadata {
            sample_rate: self.params.sample_rate,
            symbol_rate: self.params.symbol_rate,
            carrier: self.params.carrier,
            pulse_shape: shape.name().to_string(),
            span: self.params.pulse.span,
            roll_off: shape.roll_off(),
            scheme: self.params.modulation.scheme,
            cardinality: self.params.modulation.cardinality,
            mapper: self.params.modulation.mapper,
            bits: self.bits.to_string(),
            num_samples: self.passband.samples().len(),
        }
    }

    /// Returns the number of bit errors after demodulating the passband signal, sampling it at
    /// the symbol centers and deciding on the nearest codebook symbols.
    ///
    /// # Errors
    ///
    /// Returns an error if demodulation fails.
    pub fn loopback_bit_errors(&self) -> Result<usize, Error> {
        let num_taps = DEMOD_TAPS_PER_CARRIER_PERIOD
            * (self.params.sample_rate / self.params.carrier) as usize
            + 1;
        let recovered = self.passband.demodulate(num_taps, DEMOD_WINDOW)?;
        let decisions: Vec<_> = self
            .baseband
            .symbol_centers()
            .map(|n| recovered[n])
            .collect();
        let indices = sequencer::nearest_indices(&decisions, &self.codebook);
        let bits = sequencer::indices_to_bits(&indices, self.codebook.bits_per_symbol());
        Ok(utils::bit_errors(&bits, &self.symbols.recover_bits()))
    }
}

/// Returns bit sequence for the bit text and preamble setting of the parameters.
fn bits_from_params(params: &ChainParams) -> Result<BitSequence, Error> {
    let bits = BitSequence::from_text(&params.bits)?;
    Ok(if params.barker_prefix {
        bits.with_barker_prefix()
    } else {
        bits
    })
}

/// Single owner of the current chain state
#[derive(Debug)]
pub struct ChainController {
    /// Current state
    state: Arc<ChainState>,
    /// Senders to subscribers of new states
    subscribers: Vec<Sender<Arc<ChainState>>>,
}

impl ChainController {
    /// Returns controller owning the state computed from the given parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage of the chain rejects the parameters.
    pub fn new(params: ChainParams) -> Result<Self, Error> {
        let state = Arc::new(ChainState::new(params)?);
        tracing::info!(version = state.version, "Built chain state");
        Ok(Self {
            state,
            subscribers: Vec::new(),
        })
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> Arc<ChainState> {
        Arc::clone(&self.state)
    }

    /// Returns a receiver of every state produced from now on.
    pub fn subscribe(&mut self) -> Receiver<Arc<ChainState>> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// Applies a parameter change and returns the new state.
    ///
    /// # Errors
    ///
    /// Returns an error if the changed parameters are rejected, in which case the current state
    /// is kept.
    pub fn apply(&mut self, change: ParamChange) -> Result<Arc<ChainState>, Error> {
        self.apply_all([change])
    }

    /// Applies several parameter changes at once and returns the new state.
    ///
    /// Entities are recomputed once, after all changes are applied to the parameters, so no
    /// intermediate state is produced.
    ///
    /// # Errors
    ///
    /// Returns an error if the changed parameters are rejected, in which case the current state
    /// is kept.
    pub fn apply_all<I>(&mut self, changes: I) -> Result<Arc<ChainState>, Error>
    where
        I: IntoIterator<Item = ParamChange>,
    {
        let mut params = self.state.params.clone();
        let stale = changes
            .into_iter()
            .fold(Stale::NONE, |stale, change| {
                stale.union(change.apply_to(&mut params))
            });
        let state = Arc::new(ChainState::build(params, stale, Some(&self.state))?);
        tracing::info!(
            version = state.version,
            bits_changed = stale.bits,
            codebook_changed = stale.codebook,
            pulse_changed = stale.pulse,
            "Updated chain state"
        );
        self.subscribers
            .retain(|sender| sender.send(Arc::clone(&state)).is_ok());
        self.state = Arc::clone(&state);
        Ok(state)
    }
}

/// Record of the parameters needed to reproduce a passband signal
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct ExportMetadata {
    /// Sample rate (samples per second)
    pub sample_rate: u32,
    /// Symbol rate (symbols per second)
    pub symbol_rate: u32,
    /// Carrier frequency (Hz)
    pub carrier: u32,
    /// Pulse shape name
    pub pulse_shape: String,
    /// Pulse span (symbol periods)
    pub span: usize,
    /// Roll-off factor of a raised-cosine pulse
    pub roll_off: Option<f64>,
    /// Modulation scheme
    pub scheme: ModulationScheme,
    /// Alphabet size
    pub cardinality: usize,
    /// Bit-to-symbol index mapping
    pub mapper: BitMapper,
    /// Transmitted bits, including any preamble
    pub bits: String,
    /// Number of passband samples
    pub num_samples: usize,
}

/// Residual statistics and filter details of one interpolation method
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct MethodReport {
    /// Interpolation method
    pub method: InterpolationMethod,
    /// Number of filter taps
    pub num_taps: usize,
    /// Window used in the filter design
    pub window: Window,
    /// Group delay removed from the filter output (samples)
    pub group_delay: usize,
    /// Residual statistics against direct synthesis
    pub stats: ResidualStats,
}

/// Outcome of comparing the interpolation methods on one chain state
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct ComparisonReport {
    /// Parameters of the chain, whose `sample_rate` is the internal rate
    pub metadata: ExportMetadata,
    /// Sample rate of the chain before upsampling
    pub internal_rate: u32,
    /// Upsampling factor
    pub factor: usize,
    /// Sample rate after upsampling
    pub target_rate: u32,
    /// Number of bit errors in the demodulation loopback at the internal rate
    pub loopback_bit_errors: usize,
    /// Reports of the filtering methods
    pub methods: Vec<MethodReport>,
}

impl ComparisonReport {
    /// Returns report comparing the interpolation methods on the baseband signal of the state.
    ///
    /// # Errors
    ///
    /// Returns an error if rate conversion or loopback demodulation fails.
    pub fn new(state: &ChainState, engine: &RateConversionEngine) -> Result<Self, Error> {
        let comparison = engine.compare(state.baseband())?;
        let methods = [
            (&comparison.fir, comparison.fir_stats),
            (&comparison.reduced_tap, comparison.reduced_tap_stats),
        ]
        .into_iter()
        .filter_map(|(signal, stats)| {
            engine
                .filter_spec(signal.method())
                .map(|spec| MethodReport {
                    method: signal.method(),
                    num_taps: spec.num_taps(engine.factor()),
                    window: spec.window,
                    group_delay: signal.group_delay(),
                    stats,
                })
        })
        .collect();
        Ok(Self {
            metadata: state.export_metadata(),
            internal_rate: state.params.sample_rate,
            factor: engine.factor(),
            target_rate: comparison.reference.sample_rate(),
            loopback_bit_errors: state.loopback_bit_errors()?,
            methods,
        })
    }

    /// Saves the report to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests_of_chain_state {
    use super::*;

    fn params(scheme: ModulationScheme, cardinality: usize, mapper: BitMapper) -> ChainParams {
        ChainParams {
            bits: "101100111000101101101001".to_string(),
            barker_prefix: false,
            modulation: ModParams::new(scheme, cardinality, mapper),
            pulse: PulseParams::new(PulseShape::RaisedCosine { roll_off: 0.5 }, 8),
            symbol_rate: 100,
            sample_rate: 4800,
            carrier: 1200,
        }
    }

    #[test]
    fn test_new() {
        // Invalid input
        let bad = ChainParams {
            bits: "10a1".to_string(),
            ..ChainParams::default()
        };
        assert!(matches!(ChainState::new(bad), Err(Error::InvalidBitText(_))));
        let bad = ChainParams {
            bits: String::new(),
            ..ChainParams::default()
        };
        assert!(matches!(ChainState::new(bad), Err(Error::LengthMismatch(_))));
        let bad = ChainParams {
            sample_rate: 44150,
            ..ChainParams::default()
        };
        assert!(matches!(ChainState::new(bad), Err(Error::InvalidParameter(_))));
        let bad = ChainParams {
            carrier: 24000,
            ..ChainParams::default()
        };
        assert!(matches!(ChainState::new(bad), Err(Error::InvalidParameter(_))));
        // Valid input
        let state = ChainState::new(ChainParams::default()).unwrap();
        assert_eq!(state.version(), 0);
        assert_eq!(state.symbols().len(), 16);
        assert_eq!(state.pulse().samples().len(), 960);
        assert_eq!(state.baseband().samples().len(), 15 * 480 + 960);
        assert_eq!(
            state.passband().samples().len(),
            state.baseband().samples().len()
        );
    }

    #[test]
    fn test_barker_prefix() {
        let params = ChainParams {
            bits: "01".to_string(),
            barker_prefix: true,
            ..ChainParams::default()
        };
        let state = ChainState::new(params).unwrap();
        assert_eq!(state.bits().to_string(), "111001001");
        assert_eq!(state.symbols().len(), 9);
    }

    #[test]
    fn test_export_metadata() {
        let state = ChainState::new(ChainParams::default()).unwrap();
        let metadata = state.export_metadata();
        assert_eq!(metadata.sample_rate, 48000);
        assert_eq!(metadata.symbol_rate, 100);
        assert_eq!(metadata.carrier, 440);
        assert_eq!(metadata.pulse_shape, "Raised-Cosine");
        assert_eq!(metadata.span, 2);
        assert_eq!(metadata.roll_off, Some(0.2));
        assert_eq!(metadata.scheme, ModulationScheme::AmplitudeShiftKeying);
        assert_eq!(metadata.cardinality, 2);
        assert_eq!(metadata.mapper, BitMapper::Identity);
        assert_eq!(metadata.bits, "1011001110001011");
        assert_eq!(metadata.num_samples, state.passband().samples().len());
        let json = serde_json::to_string(&metadata).unwrap();
        let parsed: ExportMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn test_loopback_bit_errors() {
        for (scheme, cardinality) in [
            (ModulationScheme::AmplitudeShiftKeying, 2),
            (ModulationScheme::AmplitudeShiftKeying, 4),
            (ModulationScheme::PhaseShiftKeying, 4),
            (ModulationScheme::PhaseShiftKeying, 8),
        ] {
            for mapper in [BitMapper::Identity, BitMapper::Gray, BitMapper::Random { seed: 5 }] {
                let state = ChainState::new(params(scheme, cardinality, mapper)).unwrap();
                assert_eq!(state.loopback_bit_errors().unwrap(), 0);
            }
        }
        let state = ChainState::new(ChainParams::default()).unwrap();
        assert_eq!(state.loopback_bit_errors().unwrap(), 0);
    }

    #[test]
    fn test_concrete_scenario() {
        // "10110100" with 2-ASK and a one-symbol rectangular pulse at 4 samples per symbol
        let chain_params = ChainParams {
            bits: "10110100".to_string(),
            barker_prefix: false,
            modulation: ModParams::default(),
            pulse: PulseParams::new(PulseShape::Rectangular, 1),
            symbol_rate: 100,
            sample_rate: 400,
            carrier: 100,
        };
        let state = ChainState::new(chain_params).unwrap();
        let samples = state.baseband().samples();
        assert_eq!(samples.len(), 32);
        for (block, bit) in samples.chunks(4).zip("10110100".chars()) {
            let level = if bit == '1' { 1.0 } else { -1.0 };
            assert!(block.iter().all(|x| x.re == level && x.im == 0.0));
        }
    }
}
