//! Discretized photon energy spectrum of the X-ray beam

use std::collections::BTreeMap;
use std::path::Path;

use ordered_float::OrderedFloat;

use units::{Energy, EnergyUnit, mev, mev_, todo::Energyf64};
use crate::error::{FatalError, Result};

/// One bin of the spectrum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyChannel {
    pub energy: Energy,
    pub photon_count: f64,
}

/// Channels are kept sorted by energy, so the order in which they were added
/// has no effect on any result. Adding a channel at an energy which is
/// already present increases the count of that channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    /// photon counts, keyed by energy in MeV
    channels: BTreeMap<OrderedFloat<Energyf64>, f64>,
}

impl Spectrum {
    pub fn new() -> Self { Self::default() }

    pub fn monochromatic(energy: Energy, photon_count: f64) -> Self {
        let mut spectrum = Self::new();
        spectrum.add_channel(energy, photon_count);
        spectrum
    }

    /// Ignores (with a warning) non-positive energies and negative counts
    pub fn add_channel(&mut self, energy: Energy, photon_count: f64) {
        let e = mev_(energy);
        if !(e > 0.0) || !(photon_count >= 0.0) {
            tracing::warn!("Ignoring spectrum channel with energy {e} MeV and {photon_count} photons");
            return;
        }
        *self.channels.entry(OrderedFloat(e)).or_default() += photon_count;
    }

    pub fn reset(&mut self) { self.channels.clear() }

    pub fn is_empty(&self) -> bool { self.channels.is_empty() }

    pub fn len(&self) -> usize { self.channels.len() }

    pub fn channels(&self) -> impl Iterator<Item = EnergyChannel> + '_ {
        self.channels.iter().map(|(e, &n)| EnergyChannel { energy: mev(e.0), photon_count: n })
    }

    /// Energies of the channels, expressed in `unit`
    pub fn energies(&self, unit: EnergyUnit) -> Vec<f64> {
        self.channels.keys().map(|e| unit.value(mev(e.0))).collect()
    }

    pub fn photon_counts(&self) -> Vec<f64> { self.channels.values().copied().collect() }

    pub fn total_photon_count(&self) -> f64 { self.channels.values().sum() }

    /// Sum over channels of energy times photon count
    pub fn total_energy(&self) -> Energy {
        mev(self.channels.iter().map(|(e, n)| e.0 * n).sum())
    }

    /// Scale the photon counts so that the total energy becomes 1 MeV
    pub fn normalise(&mut self) {
        let total = mev_(self.total_energy());
        if total > 0.0 {
            for n in self.channels.values_mut() { *n /= total }
        }
    }

    /// Replace every `k` consecutive channels with a single one carrying
    /// their total photon count at their count-weighted mean energy
    pub fn merge_channels(&mut self, k: usize) {
        if k < 2 { return }
        let old: Vec<_> = std::mem::take(&mut self.channels).into_iter().collect();
        for group in old.chunks(k) {
            let count: f64 = group.iter().map(|(_, n)| n).sum();
            if count > 0.0 {
                let energy = group.iter().map(|(e, n)| e.0 * n).sum::<f64>() / count;
                self.add_channel(mev(energy), count);
            }
        }
    }

    /// Read a spectrum from a text file containing one `energy count` pair
    /// per line. Blank lines and lines starting with `#` are ignored, as are
    /// channels whose count is not positive.
    pub fn load_tsv(path: &Path, unit: EnergyUnit, normalise: bool, merge: usize) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(FatalError::file(path))?;
        let mut spectrum = Self::new();
        for (line, pair) in parse_pairs(&text, path)? {
            let (e, n) = pair;
            if n > 0.0 {
                spectrum.add_channel(unit.energy(e), n);
            } else {
                tracing::debug!("{}:{line}: skipping channel with {n} photons", path.display());
            }
        }
        spectrum.merge_channels(merge);
        if normalise { spectrum.normalise() }
        tracing::info!("Loaded {} spectrum channels from {}", spectrum.len(), path.display());
        Ok(spectrum)
    }
}

/// Parse whitespace-separated pairs of numbers, one pair per line, returning
/// them with their (1-based) line numbers
pub(crate) fn parse_pairs(text: &str, path: &Path) -> Result<Vec<(usize, (f64, f64))>> {
    let error = |line: usize, msg: String| FatalError::Parse { path: path.into(), line, msg };
    let mut pairs = vec![];
    for (n, line) in text.lines().enumerate() {
        let n = n + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue }
        let mut words = line.split_whitespace();
        let (Some(a), Some(b), None) = (words.next(), words.next(), words.next()) else {
            return Err(error(n, format!("expected two numbers, found `{line}`")))
        };
        let a: f64 = a.parse().map_err(|e| error(n, format!("`{a}`: {e}")))?;
        let b: f64 = b.parse().map_err(|e| error(n, format!("`{b}`: {e}")))?;
        pairs.push((n, (a, b)));
    }
    Ok(pairs)
}
