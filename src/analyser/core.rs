//! The scoring and thresholding engine.
//!
//! Turns one static batch of connection pairs into per-source metrics and
//! answers quantile-threshold classification queries against them.
use super::containers::{ConnectionPair, SourceMetrics};
use super::error::{Result, ScanError};
use ipnet::Ipv4Net;
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;

/// Scoring engine over one batch of observed connection pairs.
///
/// [`ScanEngine::build`] performs subnet filtering, deduplication and all
/// score computation eagerly; the engine is read-only afterwards and serves
/// repeated threshold queries on the same batch.
#[derive(Debug)]
pub struct ScanEngine {
    pairs: Vec<ConnectionPair>,
    destination_weights: HashMap<Ipv4Addr, f64>,
    source_metrics: HashMap<Ipv4Addr, SourceMetrics>,
    sorted_rarity: Vec<f64>,
    sorted_breadth: Vec<u32>,
}

impl ScanEngine {
    /// Builds the engine from raw pairs and an internal subnet in CIDR notation.
    pub fn build(pairs: Vec<ConnectionPair>, internal_subnet: &str) -> Result<Self> {
        let subnet: Ipv4Net = internal_subnet
            .parse()
            .map_err(|_| ScanError::SubnetParse(internal_subnet.to_string()))?;

        log::info!("Scoring connection pairs against {subnet}.");

        let filtered = filter_by_subnet(pairs, &subnet);
        let pairs = dedup_pairs(filtered);
        log::debug!("{} unique pairs with destinations inside {subnet}", pairs.len());

        let destination_weights = weigh_destinations(&pairs);
        let source_metrics = score_sources(&pairs, &destination_weights);
        log::debug!("{} distinct sources scored", source_metrics.len());

        let (sorted_rarity, sorted_breadth) = sorted_metric_arrays(&source_metrics);

        Ok(Self {
            pairs,
            destination_weights,
            source_metrics,
            sorted_rarity,
            sorted_breadth,
        })
    }

    /// Derives the rarity and breadth cut-offs for the given quantile.
    ///
    /// The quantile is a strictness dial: 0 selects the smallest observed
    /// value of each population, 1 an unreachable one, so the scanner set
    /// shrinks monotonically as the quantile grows.
    pub fn thresholds(&self, quantile: f64) -> Result<(f64, u32)> {
        if !(0.0..=1.0).contains(&quantile) {
            return Err(ScanError::InvalidQuantile(quantile));
        }
        if self.source_metrics.is_empty() {
            return Err(ScanError::EmptyPopulation);
        }

        let rarity_threshold = match threshold_index(self.sorted_rarity.len(), quantile) {
            Some(index) => self.sorted_rarity[index],
            None => self.sorted_rarity[self.sorted_rarity.len() - 1] + 1.0,
        };

        let breadth_threshold = match threshold_index(self.sorted_breadth.len(), quantile) {
            Some(index) => self.sorted_breadth[index],
            None => self.sorted_breadth[self.sorted_breadth.len() - 1] + 1,
        };

        Ok((rarity_threshold, breadth_threshold))
    }

    /// Returns every source meeting both cut-offs at the given quantile.
    ///
    /// A source must be broad *and* have touched at least one rare
    /// destination; either score alone is not enough.
    pub fn find_scanners(&self, quantile: f64) -> Result<HashMap<Ipv4Addr, SourceMetrics>> {
        let (rarity_threshold, breadth_threshold) = self.thresholds(quantile)?;
        log::debug!("Thresholds: rarity {rarity_threshold}, breadth {breadth_threshold}");

        Ok(self
            .source_metrics
            .iter()
            .filter(|(_, metrics)| {
                metrics.rarity >= rarity_threshold && metrics.breadth >= breadth_threshold
            })
            .map(|(source, metrics)| (*source, *metrics))
            .collect())
    }

    /// Filtered, deduplicated pairs the scores were computed from.
    pub fn pairs(&self) -> &[ConnectionPair] {
        &self.pairs
    }

    /// Per-destination rarity weights, one entry per distinct destination.
    pub fn destination_weights(&self) -> &HashMap<Ipv4Addr, f64> {
        &self.destination_weights
    }

    /// Per-source metrics, one entry per distinct source.
    pub fn source_metrics(&self) -> &HashMap<Ipv4Addr, SourceMetrics> {
        &self.source_metrics
    }
}

/// Keeps only pairs whose destination lies inside the subnet, preserving order.
fn filter_by_subnet(pairs: Vec<ConnectionPair>, subnet: &Ipv4Net) -> Vec<ConnectionPair> {
    pairs
        .into_iter()
        .filter(|pair| subnet.contains(&pair.destination))
        .collect()
}

/// Collapses the list to first-occurrence-unique (source, destination) pairs.
fn dedup_pairs(pairs: Vec<ConnectionPair>) -> Vec<ConnectionPair> {
    let mut seen: HashSet<(Ipv4Addr, Ipv4Addr)> = HashSet::new();
    pairs
        .into_iter()
        .filter(|pair| seen.insert((pair.source, pair.destination)))
        .collect()
}

/// Weighs each destination by the inverse of its fan-in.
///
/// Pairs are already unique, so the pair count per destination equals the
/// number of distinct sources contacting it. Weights land in (0, 1], with 1
/// reserved for destinations only a single source ever touched.
fn weigh_destinations(pairs: &[ConnectionPair]) -> HashMap<Ipv4Addr, f64> {
    let fan_in = pairs
        .iter()
        .fold(HashMap::<Ipv4Addr, u32>::new(), |mut counts, pair| {
            *counts.entry(pair.destination).or_insert(0) += 1;
            counts
        });

    fan_in
        .into_iter()
        .map(|(destination, count)| (destination, 1.0 / f64::from(count)))
        .collect()
}

/// Folds the pair list into per-source metrics.
///
/// Max and count are order-independent, so any processing order yields the
/// same metrics. Every destination weight exists by construction.
fn score_sources(
    pairs: &[ConnectionPair],
    weights: &HashMap<Ipv4Addr, f64>,
) -> HashMap<Ipv4Addr, SourceMetrics> {
    pairs.iter().fold(HashMap::new(), |mut metrics, pair| {
        let weight = weights[&pair.destination];
        metrics
            .entry(pair.source)
            .and_modify(|source_metrics: &mut SourceMetrics| {
                source_metrics.breadth += 1;
                if weight > source_metrics.rarity {
                    source_metrics.rarity = weight;
                }
            })
            .or_insert(SourceMetrics {
                rarity: weight,
                breadth: 1,
            });
        metrics
    })
}

/// Builds the ascending score populations the threshold selector indexes into.
fn sorted_metric_arrays(metrics: &HashMap<Ipv4Addr, SourceMetrics>) -> (Vec<f64>, Vec<u32>) {
    let mut rarity: Vec<f64> = metrics.values().map(|metric| metric.rarity).collect();
    let mut breadth: Vec<u32> = metrics.values().map(|metric| metric.breadth).collect();

    rarity.sort_by(f64::total_cmp);
    breadth.sort_unstable();

    (rarity, breadth)
}

/// Index into a sorted population for the given quantile, or None when
/// `ceil(n * quantile)` lands past the last element.
fn threshold_index(population: usize, quantile: f64) -> Option<usize> {
    let index = (population as f64 * quantile).ceil() as usize;
    (index + 1 <= population).then_some(index)
}
