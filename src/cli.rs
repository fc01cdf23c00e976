// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::PathBuf;

use anyhow::Result;
use itertools::Itertools;
use strum::IntoEnumIterator;
use structopt::StructOpt;

use crate::chunk;
use crate::chunk::{ChunkSizingInputs, MEMORY_FRACTION};
use crate::config::{EngineConfig, EngineConfigBuilder, FastMethodTag, KernelVariantTag};

/// Actual genotype/reference-panel I/O, VCF/BCF record handling and final
/// emission are out-of-scope collaborators (`spec.md` §1): callers embed
/// this crate as a library and supply `GenotypeMatrixSource`/
/// `ReferencePanelSource`/`PhaseWriter` implementations themselves. This
/// CLI only exposes the ambient, self-contained pieces of the engine that
/// do not require such a collaborator: validating a tunables file, and
/// estimating chunk sizes against a declared memory budget.
#[derive(Debug, StructOpt, Serialize, Deserialize, Clone)]
#[structopt(
    name = "haplohedron",
    about = "Windowed haplotype-pair imputation and phase reconciliation against a reference panel.",
    setting = structopt::clap::AppSettings::ColoredHelp,
)]
pub enum Haplohedron {
    #[structopt(
        name = "impute",
        about = "Validate an engine configuration file and print its resolved tunables.",
        setting = structopt::clap::AppSettings::ColoredHelp,
    )]
    Impute {
        #[structopt(
            parse(from_os_str),
            long,
            help = "YAML file with engine tunables (width, flankwidth, fast-method, max-haplotypes, lasso, tf, rescreen, scale-allelefreq, lambda). If omitted, defaults are used."
        )]
        config: Option<PathBuf>,
        #[structopt(long, help = "Override the configured window width.")]
        width: Option<usize>,
        #[structopt(
            long = "fast-method",
            possible_values = &FastMethodTag::iter().map(|v| v.into()).collect_vec(),
            help = "Phase reconciliation strategy."
        )]
        fast_method: Option<FastMethodTag>,
        #[structopt(
            long = "kernel-variant",
            possible_values = &KernelVariantTag::iter().map(|v| v.into()).collect_vec(),
            help = "Pair-search screening strategy."
        )]
        kernel_variant: Option<KernelVariantTag>,
        #[structopt(long, help = "Worker threads for the window driver (0 lets rayon pick).")]
        threads: Option<usize>,
    },
    #[structopt(
        name = "chunk-plan",
        about = "Estimate how many windows fit in one chunk under a memory budget.",
        setting = structopt::clap::AppSettings::ColoredHelp,
    )]
    ChunkPlan {
        #[structopt(long, help = "Average number of unique haplotype columns per window.")]
        avg_unique_d: usize,
        #[structopt(long, help = "Total number of haplotype columns across all windows.")]
        total_d: usize,
        #[structopt(long, help = "Typed markers per window.")]
        p_per_window: usize,
        #[structopt(long, help = "Number of samples.")]
        n_samples: usize,
        #[structopt(long, default_value = "1", help = "Worker threads.")]
        threads: usize,
        #[structopt(long, default_value = "0", help = "Bytes occupied by the typed genotype slab.")]
        size_x_bytes: usize,
        #[structopt(long, default_value = "0", help = "Bytes occupied by the compressed haplotype dictionary.")]
        size_ch_bytes: usize,
        #[structopt(long, help = "Bytes of RAM the chunker is allowed to spend.")]
        budget_bytes: usize,
    },
}

impl Default for Haplohedron {
    fn default() -> Self {
        Haplohedron::from_iter(vec!["--help"])
    }
}

fn build_config(
    config: Option<PathBuf>,
    width: Option<usize>,
    fast_method: Option<FastMethodTag>,
    kernel_variant: Option<KernelVariantTag>,
    threads: Option<usize>,
) -> Result<EngineConfig> {
    let mut builder: EngineConfigBuilder = match config {
        Some(path) => {
            let loaded = EngineConfig::from_yaml_file(&path)?;
            EngineConfigBuilder::default()
                .width(loaded.width)
                .flankwidth(loaded.flankwidth)
                .fast_method(loaded.fast_method)
                .max_haplotypes(loaded.max_haplotypes)
                .kernel_variant(loaded.kernel_variant)
                .lasso_r(loaded.lasso_r)
                .thinning_tf(loaded.thinning_tf)
                .rescreen(loaded.rescreen)
                .scale_allelefreq(loaded.scale_allelefreq)
                .expand_redundants(loaded.expand_redundants)
                .lambda(loaded.lambda)
                .threads(loaded.threads)
        }
        None => EngineConfigBuilder::default(),
    };
    if let Some(width) = width {
        builder = builder.width(width);
    }
    if let Some(fast_method) = fast_method {
        builder = builder.fast_method(fast_method);
    }
    if let Some(kernel_variant) = kernel_variant {
        builder = builder.kernel_variant(kernel_variant);
    }
    if let Some(threads) = threads {
        builder = builder.threads(threads);
    }
    Ok(builder.build()?)
}

pub fn run(opt: Haplohedron) -> Result<()> {
    match opt {
        Haplohedron::Impute {
            config,
            width,
            fast_method,
            kernel_variant,
            threads,
        } => {
            let config = build_config(config, width, fast_method, kernel_variant, threads)?;
            info!("resolved engine configuration: {:?}", config);
            println!(
                "width={} flankwidth={} fast_method={:?} kernel_variant={:?} rescreen={} scale_allelefreq={} lambda={}",
                config.width,
                config.flankwidth,
                config.fast_method(),
                config.kernel_variant(),
                config.rescreen,
                config.scale_allelefreq,
                config.lambda,
            );
            println!(
                "note: genotype/reference-panel I/O and VCF emission are embedding-application concerns; \
                 link this crate as a library and supply GenotypeMatrixSource/ReferencePanelSource/PhaseWriter \
                 implementations to run an imputation."
            );
        }
        Haplohedron::ChunkPlan {
            avg_unique_d,
            total_d,
            p_per_window,
            n_samples,
            threads,
            size_x_bytes,
            size_ch_bytes,
            budget_bytes,
        } => {
            let inputs = ChunkSizingInputs {
                avg_unique_d,
                total_d,
                p_per_window,
                n_samples,
                threads,
                size_x_bytes,
                size_ch_bytes,
                budget_bytes,
            };
            let windows = chunk::max_windows_per_chunk(&inputs);
            println!(
                "{} windows per chunk (budget {} bytes at {:.0}% utilization)",
                windows,
                budget_bytes,
                MEMORY_FRACTION * 100.0
            );
        }
    }
    Ok(())
}
