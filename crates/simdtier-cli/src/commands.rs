//! Subcommand handlers.

use std::path::Path;
use std::time::Instant;

use anyhow::{ensure, Context};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use serde::Serialize;
use simdtier_core::config::FORCED_TIER_HOOK_ENABLED;
use simdtier_core::hierarchy::supported_tiers;
use simdtier_core::{
    snapshot, DispatchConfig, Feature, KernelSet, SelectorSnapshot, Tier, COMPILED_TIERS,
};

// =============================================================================
// info
// =============================================================================

#[derive(Debug, Serialize)]
struct InfoReport {
    #[serde(flatten)]
    selector: SelectorSnapshot,
    supported_tiers: Vec<Tier>,
    configured_force_tier: Option<Tier>,
    /// Whether the selector honors `configured_force_tier`. The selector reads
    /// only `SIMDTIER_` variables, so a `--config` file is validated but never applied.
    force_tier_applied: bool,
    forced_tier_hook: bool,
}

pub fn info(json: bool, config_file: Option<&Path>) -> anyhow::Result<()> {
    let config = match config_file {
        Some(path) => DispatchConfig::from_figment(&DispatchConfig::figment_with_file(path))
            .with_context(|| format!("reading {}", path.display()))?,
        None => DispatchConfig::load().context("reading SIMDTIER_ configuration")?,
    };
    let selector = snapshot();
    let report = InfoReport {
        supported_tiers: supported_tiers(&selector.capabilities, COMPILED_TIERS),
        configured_force_tier: config.force_tier,
        force_tier_applied: config.force_tier.is_some()
            && config_file.is_none()
            && FORCED_TIER_HOOK_ENABLED,
        forced_tier_hook: FORCED_TIER_HOOK_ENABLED,
        selector,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let caps = &report.selector.capabilities;
    let mut features = Table::new();
    features.load_preset(UTF8_FULL);
    features.set_header(vec!["Feature", "Available"]);
    for feature in Feature::ALL {
        features.add_row(vec![
            Cell::new(feature.name()),
            Cell::new(if caps.has(feature) { "yes" } else { "no" }),
        ]);
    }
    println!("{features}");

    let mut tiers = Table::new();
    tiers.load_preset(UTF8_FULL);
    tiers.set_header(vec!["Tier", "Compiled", "Supported", "Alignment", ""]);
    for tier in Tier::ALL {
        let marker = if tier == report.selector.tier { "selected" } else { "" };
        tiers.add_row(vec![
            Cell::new(tier.name()),
            Cell::new(if tier.is_compiled() { "yes" } else { "no" }),
            Cell::new(if caps.supports(tier) { "yes" } else { "no" }),
            Cell::new(tier.alignment()),
            Cell::new(marker),
        ]);
    }
    println!("{tiers}");

    println!(
        "Selected: {} (index {} of {} compiled), alignment {} bytes",
        report.selector.tier,
        report.selector.index,
        report.selector.compiled_tiers.len(),
        report.selector.alignment
    );
    match (report.configured_force_tier, config_file) {
        (Some(tier), Some(path)) => println!(
            "force_tier = {tier} in {} (not applied; the selector reads SIMDTIER_FORCE_TIER only)",
            path.display()
        ),
        (Some(tier), None) if report.force_tier_applied => {
            println!("Forced by SIMDTIER_FORCE_TIER: {tier}");
        }
        (Some(tier), None) => {
            println!("SIMDTIER_FORCE_TIER={tier} ignored (built without forced-tier)");
        }
        (None, _) => {}
    }
    Ok(())
}

// =============================================================================
// bench
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Kernel {
    Fill,
    Add,
    Sub,
    Mul,
    Div,
    MulAdd,
    ReduceSum,
    Dot,
    Sin,
    Cos,
}

impl Kernel {
    const ALL: [Kernel; 10] = [
        Kernel::Fill,
        Kernel::Add,
        Kernel::Sub,
        Kernel::Mul,
        Kernel::Div,
        Kernel::MulAdd,
        Kernel::ReduceSum,
        Kernel::Dot,
        Kernel::Sin,
        Kernel::Cos,
    ];

    fn name(self) -> &'static str {
        match self {
            Kernel::Fill => "fill",
            Kernel::Add => "add",
            Kernel::Sub => "sub",
            Kernel::Mul => "mul",
            Kernel::Div => "div",
            Kernel::MulAdd => "mul_add",
            Kernel::ReduceSum => "reduce_sum",
            Kernel::Dot => "dot",
            Kernel::Sin => "sin",
            Kernel::Cos => "cos",
        }
    }

    /// Runs the kernel once; reductions leave their single result in `out`.
    fn run(self, set: &KernelSet, input: &Inputs, out: &mut Vec<f32>) {
        let (a, b, c) = (&input.a[..], &input.b[..], &input.c[..]);
        if matches!(self, Kernel::ReduceSum | Kernel::Dot) {
            let value = match self {
                Kernel::ReduceSum => set.reduce_sum(a),
                _ => set.dot(a, b),
            };
            out.clear();
            out.push(value);
            return;
        }

        out.resize(a.len(), 0.0);
        match self {
            Kernel::Fill => set.fill(out, 1.5),
            Kernel::Add => set.add(a, b, out),
            Kernel::Sub => set.sub(a, b, out),
            Kernel::Mul => set.mul(a, b, out),
            Kernel::Div => set.div(a, b, out),
            Kernel::MulAdd => set.mul_add(a, b, c, out),
            Kernel::Sin => set.sin(c, out),
            Kernel::Cos => set.cos(c, out),
            Kernel::ReduceSum | Kernel::Dot => {}
        }
    }
}

struct Inputs {
    a: Vec<f32>,
    b: Vec<f32>,
    c: Vec<f32>,
}

impl Inputs {
    #[allow(clippy::cast_precision_loss)] // index to sample value
    fn generate(len: usize) -> Self {
        let a = (0..len).map(|i| (i as f32 * 0.1).sin()).collect();
        // Bounded away from zero for div.
        let b = (0..len).map(|i| 1.5 + (i as f32 * 0.07).cos()).collect();
        let c = (0..len).map(|i| i as f32 * 0.37 - 500.0).collect();
        Self { a, b, c }
    }
}

#[derive(Debug, Serialize)]
struct BenchRow {
    kernel: &'static str,
    tier: Tier,
    ns_per_element: f64,
    max_deviation: f32,
}

fn max_deviation(got: &[f32], reference: &[f32]) -> f32 {
    got.iter()
        .zip(reference)
        .map(|(g, r)| (g - r).abs())
        .fold(0.0, f32::max)
}

#[allow(clippy::cast_precision_loss)] // timing ratios
fn time_kernel(kernel: Kernel, set: &KernelSet, input: &Inputs, iters: u32, out: &mut Vec<f32>) -> f64 {
    // warmup
    kernel.run(set, input, out);

    let start = Instant::now();
    for _ in 0..iters {
        kernel.run(set, input, out);
        std::hint::black_box(&*out);
    }
    let elapsed = start.elapsed().as_nanos() as f64;
    elapsed / (f64::from(iters) * input.a.len().max(1) as f64)
}

pub fn bench(len: usize, iters: u32, json: bool) -> anyhow::Result<()> {
    ensure!(iters > 0, "--iters must be at least 1");

    let input = Inputs::generate(len);
    let scalar = KernelSet::for_tier(Tier::Scalar)?;
    let sets: Vec<KernelSet> = COMPILED_TIERS
        .iter()
        .filter_map(|&tier| KernelSet::for_tier(tier).ok())
        .collect();
    tracing::info!(len, iters, tiers = sets.len(), "benchmarking kernels");

    let mut rows = Vec::with_capacity(Kernel::ALL.len() * sets.len());
    let mut reference = Vec::new();
    let mut out = Vec::new();
    for kernel in Kernel::ALL {
        kernel.run(&scalar, &input, &mut reference);
        for set in &sets {
            let ns_per_element = time_kernel(kernel, set, &input, iters, &mut out);
            let row = BenchRow {
                kernel: kernel.name(),
                tier: set.tier(),
                ns_per_element,
                max_deviation: max_deviation(&out, &reference),
            };
            tracing::debug!(kernel = row.kernel, tier = %row.tier, ns = row.ns_per_element, "timed");
            rows.push(row);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Kernel", "Tier", "ns/elem", "Max dev vs scalar"]);
    for row in &rows {
        table.add_row(vec![
            Cell::new(row.kernel),
            Cell::new(row.tier.name()),
            Cell::new(format!("{:.3}", row.ns_per_element)),
            Cell::new(format!("{:.2e}", row.max_deviation)),
        ]);
    }
    println!("{table}");
    println!("{len} elements, {iters} iterations per kernel and tier");
    Ok(())
}
