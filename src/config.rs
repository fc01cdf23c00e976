// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Engine tunables (`spec.md` §6 "Tunables"): `EngineConfig` collects the
//! options recognized by the pair-search kernel and phase reconciliation,
//! built with the teacher's owned-pattern builder and loadable from a YAML
//! file the way `src/cli.rs` loads a scenario.

use derive_builder::Builder;
use std::fs::File;
use std::io::Read as _;
use std::path::Path;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::errors::Result;
use crate::kernel::KernelVariant;
use crate::reconciliation::FastMethod;

/// Default window width in typed markers, per `spec.md` §6's design note
/// ("400 or 700 or 1200 per call site"). Chosen as a middle ground; call
/// sites that need a different width pass it explicitly.
pub const DEFAULT_WIDTH: usize = 700;

/// Default `flankwidth` as 10% of `DEFAULT_WIDTH`, per `spec.md` §6.
pub const DEFAULT_FLANKWIDTH: usize = DEFAULT_WIDTH / 10;

pub const DEFAULT_MAX_HAPLOTYPES: usize = 1000;

pub const DEFAULT_LAMBDA: f64 = 1.0;

/// Selects intersection-mode or DP-mode phase reconciliation, mirroring
/// the teacher's `VariantType`'s `EnumString`/`EnumIter` derive so it can
/// be listed as a `possible_values` set on the CLI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, EnumIter, IntoStaticStr, Serialize, Deserialize)]
pub enum FastMethodTag {
    Intersection,
    Dp,
}

impl From<FastMethodTag> for FastMethod {
    fn from(tag: FastMethodTag) -> Self {
        match tag {
            FastMethodTag::Intersection => FastMethod::Intersection,
            FastMethodTag::Dp => FastMethod::Dp,
        }
    }
}

/// Screening strategy for the pair-search kernel, mirroring `KernelVariant`
/// but flattened into a config-friendly, serde/strum-derivable shape: the
/// `r`/`tf` parameters that `KernelVariant`'s variants carry live alongside
/// as separate fields (`lasso_r`, `thinning_tf`) rather than inside the tag,
/// since `EnumString`/`EnumIter` need a fieldless enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, EnumIter, IntoStaticStr, Serialize, Deserialize)]
pub enum KernelVariantTag {
    Exhaustive,
    LassoPrescreen,
    Thinning,
}

/// The tunables recognized by the engine, per `spec.md` §6. Built with the
/// teacher's `#[derive(Builder)] #[builder(pattern = "owned")]` idiom
/// (`SampleBuilder`, `ObservationProcessor` in the teacher crate).
#[derive(Clone, Debug, Builder, Serialize, Deserialize)]
#[builder(pattern = "owned")]
pub struct EngineConfig {
    /// Number of typed markers per window.
    #[builder(default = "DEFAULT_WIDTH")]
    pub width: usize,
    /// Extra markers each side of a window, used by breakpoint search.
    #[builder(default = "DEFAULT_FLANKWIDTH")]
    pub flankwidth: usize,
    /// Intersection mode vs DP mode for phase reconciliation.
    #[builder(default = "FastMethodTag::Intersection")]
    pub fast_method: FastMethodTag,
    /// Threshold above which screening variants activate.
    #[builder(default = "DEFAULT_MAX_HAPLOTYPES")]
    pub max_haplotypes: usize,
    /// Which screening strategy to use once `max_haplotypes` is exceeded.
    #[builder(default = "KernelVariantTag::Exhaustive")]
    pub kernel_variant: KernelVariantTag,
    /// Lasso prescreen's `r`: number of columns retained by stepwise
    /// selection. Only consulted when `kernel_variant == LassoPrescreen`.
    #[builder(default = "64")]
    pub lasso_r: usize,
    /// Thinning's `tf`: number of columns retained by alignment ranking.
    /// Only consulted when `kernel_variant == Thinning`.
    #[builder(default = "64")]
    pub thinning_tf: usize,
    /// Enables post-search observed-entry rescoring.
    #[builder(default = "true")]
    pub rescreen: bool,
    /// Enables inverse-variance row scaling in the pair-search objective.
    #[builder(default = "true")]
    pub scale_allelefreq: bool,
    /// Whether redundancy expansion includes a column's whole equivalence
    /// class, or only a representative singleton (`spec.md` §9 Open
    /// Question; default decided in `DESIGN.md`).
    #[builder(default = "true")]
    pub expand_redundants: bool,
    /// DP-mode switch penalty.
    #[builder(default = "DEFAULT_LAMBDA")]
    pub lambda: f64,
    /// Worker threads for the window driver; `0` lets `rayon` pick.
    #[builder(default = "0")]
    pub threads: usize,
}

impl EngineConfig {
    /// Resolve the configured tag + parameter into the `KernelVariant` the
    /// pair-search kernel actually dispatches on.
    pub fn kernel_variant(&self) -> KernelVariant {
        match self.kernel_variant {
            KernelVariantTag::Exhaustive => KernelVariant::Exhaustive,
            KernelVariantTag::LassoPrescreen => KernelVariant::LassoPrescreen { r: self.lasso_r },
            KernelVariantTag::Thinning => KernelVariant::Thinning { tf: self.thinning_tf },
        }
    }

    pub fn fast_method(&self) -> FastMethod {
        self.fast_method.into()
    }

    /// Load an `EngineConfig` from a YAML file, mirroring the teacher's
    /// scenario-YAML loading in `src/cli.rs`.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut content = String::new();
        File::open(path)
            .and_then(|mut f| f.read_to_string(&mut content))
            .map_err(|e| crate::errors::Error::Io(e.to_string()))?;
        serde_yaml::from_str(&content).map_err(|e| crate::errors::Error::Config(e.to_string()))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfigBuilder::default()
            .build()
            .expect("every field has a default")
    }
}
