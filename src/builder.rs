//! Estimator configuration and the `EntropyEstimator` facade.
//!
//! `EntropyEstimatorBuilder` collects the numeric parameters shared by the
//! estimators (Laplacian mode, Lanczos budget, probe count, seed, DeltaCon
//! groups, dense eigensolver limit, NetLSD normalisation) and builds an
//! `EntropyEstimator` that runs every estimator with them.

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::belief::DELTACON_GROUPS;
use crate::bounds::EntropyBounds;
use crate::distance;
use crate::eigen::{AutoEigensolver, DEFAULT_DENSE_LIMIT};
use crate::errors::{EntropyError, EntropyResult};
use crate::exact::{structural_entropy, von_neumann_entropy_with};
use crate::finger::{finger_hat_with, finger_tilde};
use crate::graph::Graph;
use crate::laplacian::LaplacianMode;
use crate::optimizer::{MaxEntropyOptimizer, SearchPolicy};
use crate::slq::{self, NetLsdNormalization, SlqParams, DEFAULT_LANCZOS_STEPS, DEFAULT_NVECTORS};

/// Serializable estimator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyConfig {
    pub laplacian_mode: LaplacianMode,
    pub lanczos_steps: usize,
    pub nvectors: usize,
    pub seed: Option<u64>,
    pub deltacon_groups: usize,
    pub dense_limit: usize,
    pub netlsd_normalization: NetLsdNormalization,
}

impl Default for EntropyConfig {
    fn default() -> Self {
        Self {
            laplacian_mode: LaplacianMode::Combinatorial,
            lanczos_steps: DEFAULT_LANCZOS_STEPS,
            nvectors: DEFAULT_NVECTORS,
            seed: None,
            deltacon_groups: DELTACON_GROUPS,
            dense_limit: DEFAULT_DENSE_LIMIT,
            netlsd_normalization: NetLsdNormalization::None,
        }
    }
}

impl EntropyConfig {
    pub fn slq_params(&self) -> SlqParams {
        SlqParams {
            lanczos_steps: self.lanczos_steps,
            nvectors: self.nvectors,
            seed: self.seed,
        }
    }

    fn validate(&self) -> EntropyResult<()> {
        if self.lanczos_steps == 0 {
            return Err(EntropyError::invalid("lanczos_steps must be positive"));
        }
        if self.nvectors == 0 {
            return Err(EntropyError::invalid("nvectors must be positive"));
        }
        if self.deltacon_groups == 0 {
            return Err(EntropyError::invalid("deltacon_groups must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntropyEstimatorBuilder {
    config: EntropyConfig,
}

impl EntropyEstimatorBuilder {
    pub fn new() -> Self {
        debug!("Creating EntropyEstimatorBuilder with default parameters");
        Self::default()
    }

    pub fn from_config(config: EntropyConfig) -> Self {
        Self { config }
    }

    pub fn with_laplacian_mode(mut self, mode: LaplacianMode) -> Self {
        info!("Configuring Laplacian mode: {}", mode);
        self.config.laplacian_mode = mode;
        self
    }

    pub fn with_lanczos_steps(mut self, steps: usize) -> Self {
        info!("Configuring Lanczos steps: {}", steps);
        self.config.lanczos_steps = steps;
        self
    }

    pub fn with_nvectors(mut self, nvectors: usize) -> Self {
        info!("Configuring SLQ probe vectors: {}", nvectors);
        self.config.nvectors = nvectors;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        info!("Configuring seed: {}", seed);
        self.config.seed = Some(seed);
        self
    }

    pub fn with_deltacon_groups(mut self, groups: usize) -> Self {
        info!("Configuring DeltaCon groups: {}", groups);
        self.config.deltacon_groups = groups;
        self
    }

    pub fn with_dense_limit(mut self, dense_limit: usize) -> Self {
        info!("Configuring dense eigensolver limit: {}", dense_limit);
        self.config.dense_limit = dense_limit;
        self
    }

    pub fn with_netlsd_normalization(mut self, normalization: NetLsdNormalization) -> Self {
        info!("Configuring NetLSD normalization: {}", normalization);
        self.config.netlsd_normalization = normalization;
        self
    }

    pub fn config(&self) -> &EntropyConfig {
        &self.config
    }

    pub fn build(self) -> EntropyResult<EntropyEstimator> {
        self.config.validate()?;
        debug!("Building EntropyEstimator: {:?}", self.config);
        Ok(EntropyEstimator {
            solver: AutoEigensolver::with_dense_limit(self.config.dense_limit),
            config: self.config,
        })
    }
}

/// All estimators of one graph under a single configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntropyReport {
    pub structural_information: f64,
    pub von_neumann_entropy: f64,
    pub bounds: EntropyBounds,
    pub finger_hat: f64,
    pub finger_tilde: f64,
    pub slq_vnge: f64,
}

impl EntropyReport {
    pub fn entropy_gap(&self) -> f64 {
        self.structural_information - self.von_neumann_entropy
    }
}

impl fmt::Display for EntropyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "EntropyReport {{")?;
        writeln!(f, "  structural information: {:.7}", self.structural_information)?;
        writeln!(f, "  von Neumann entropy:    {:.7}", self.von_neumann_entropy)?;
        writeln!(
            f,
            "  gap bounds:             [{:.7}, {:.7}]",
            self.bounds.lower, self.bounds.upper
        )?;
        writeln!(f, "  FINGER-hat:             {:.7}", self.finger_hat)?;
        writeln!(f, "  FINGER-tilde:           {:.7}", self.finger_tilde)?;
        writeln!(f, "  SLQ vnge:               {:.7}", self.slq_vnge)?;
        write!(f, "}}")
    }
}

/// Configured entry point to every estimator in the crate.
#[derive(Debug, Clone)]
pub struct EntropyEstimator {
    config: EntropyConfig,
    solver: AutoEigensolver,
}

impl EntropyEstimator {
    pub fn builder() -> EntropyEstimatorBuilder {
        EntropyEstimatorBuilder::new()
    }

    pub fn config(&self) -> &EntropyConfig {
        &self.config
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    pub fn structural_entropy(&self, graph: &Graph) -> f64 {
        structural_entropy(graph)
    }

    pub fn von_neumann_entropy(&self, graph: &Graph) -> EntropyResult<f64> {
        von_neumann_entropy_with(graph, self.config.laplacian_mode, &self.solver)
    }

    pub fn bounds(&self, graph: &Graph) -> EntropyBounds {
        EntropyBounds::compute(graph)
    }

    pub fn finger_hat(&self, graph: &Graph) -> EntropyResult<f64> {
        finger_hat_with(graph, &self.solver)
    }

    pub fn finger_tilde(&self, graph: &Graph) -> f64 {
        finger_tilde(graph)
    }

    pub fn slq_vnge(&self, graph: &Graph) -> EntropyResult<f64> {
        slq::vnge(graph, &self.config.slq_params())
    }

    pub fn netlsd(&self, graph: &Graph, timescales: &[f64]) -> EntropyResult<Vec<f64>> {
        slq::netlsd(
            graph,
            timescales,
            &self.config.slq_params(),
            self.config.netlsd_normalization,
        )
    }

    pub fn delta_con_distance(&self, g1: &Graph, g2: &Graph) -> EntropyResult<f64> {
        distance::delta_con_distance(g1, g2, self.config.deltacon_groups, &mut self.rng())
    }

    pub fn structural_information_distance(&self, g1: &Graph, g2: &Graph) -> EntropyResult<f64> {
        distance::structural_information_distance(g1, g2)
    }

    pub fn von_neumann_distance(&self, g1: &Graph, g2: &Graph) -> EntropyResult<f64> {
        distance::von_neumann_distance(g1, g2, &self.solver)
    }

    /// Edge-addition session sharing this estimator's eigensolver and seed.
    pub fn optimizer(
        &self,
        graph: &Graph,
        policy: SearchPolicy,
        budget: usize,
        interval: usize,
    ) -> EntropyResult<MaxEntropyOptimizer> {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        Ok(MaxEntropyOptimizer::new(graph, policy, budget, interval, seed)?
            .with_solver(Box::new(self.solver.clone())))
    }

    /// Every scalar estimator on `graph`.
    pub fn report(&self, graph: &Graph) -> EntropyResult<EntropyReport> {
        let report = EntropyReport {
            structural_information: self.structural_entropy(graph),
            von_neumann_entropy: self.von_neumann_entropy(graph)?,
            bounds: self.bounds(graph),
            finger_hat: self.finger_hat(graph)?,
            finger_tilde: self.finger_tilde(graph),
            slq_vnge: self.slq_vnge(graph)?,
        };
        info!("{}", report);
        Ok(report)
    }

    pub fn builder_config_typed(&self) -> HashMap<String, ConfigValue> {
        let mut config = HashMap::new();

        config.insert(
            "laplacian_mode".to_string(),
            ConfigValue::LaplacianMode(self.config.laplacian_mode),
        );
        config.insert(
            "lanczos_steps".to_string(),
            ConfigValue::Usize(self.config.lanczos_steps),
        );
        config.insert("nvectors".to_string(), ConfigValue::Usize(self.config.nvectors));
        config.insert("seed".to_string(), ConfigValue::OptionU64(self.config.seed));
        config.insert(
            "deltacon_groups".to_string(),
            ConfigValue::Usize(self.config.deltacon_groups),
        );
        config.insert(
            "dense_limit".to_string(),
            ConfigValue::Usize(self.config.dense_limit),
        );
        config.insert(
            "netlsd_normalization".to_string(),
            ConfigValue::NetLsdNormalization(self.config.netlsd_normalization),
        );

        config
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Usize(usize),
    OptionU64(Option<u64>),
    LaplacianMode(LaplacianMode),
    NetLsdNormalization(NetLsdNormalization),
}

impl ConfigValue {
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            ConfigValue::Usize(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ConfigValue::OptionU64(v) => *v,
            _ => None,
        }
    }

    pub fn as_laplacian_mode(&self) -> Option<LaplacianMode> {
        match self {
            ConfigValue::LaplacianMode(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_netlsd_normalization(&self) -> Option<NetLsdNormalization> {
        match self {
            ConfigValue::NetLsdNormalization(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Usize(v) => write!(f, "{}", v),
            ConfigValue::OptionU64(opt) => match opt {
                Some(v) => write!(f, "{}", v),
                None => write!(f, "None"),
            },
            ConfigValue::LaplacianMode(mode) => write!(f, "{}", mode),
            ConfigValue::NetLsdNormalization(norm) => write!(f, "{}", norm),
        }
    }
}
