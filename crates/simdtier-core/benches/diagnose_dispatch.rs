//! Diagnostic: detected features, selected tier and the cost of dispatch.
//!
//! Compares a call through the safe kernel (table lookup each call), through
//! a resolved `KernelSet`, and straight to the table entry.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::uninlined_format_args)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use simdtier_core::{kernel_set, kernels, snapshot};

fn diagnose_dispatch(c: &mut Criterion) {
    let snap = snapshot();
    println!("\n=== Dispatch Diagnostic ===");
    println!("Selected tier: {} (index {})", snap.tier, snap.index);
    println!("Alignment: {} bytes", snap.alignment);
    println!("Compiled tiers: {:?}", snap.compiled_tiers);
    println!(
        "Features: {}",
        snap.capabilities
            .features()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(" ")
    );

    #[cfg(target_arch = "x86_64")]
    {
        println!("std avx512f: {}", is_x86_feature_detected!("avx512f"));
        println!("std avx2: {}", is_x86_feature_detected!("avx2"));
        println!("std fma: {}", is_x86_feature_detected!("fma"));
    }

    // Short slices so the call itself dominates.
    let a: Vec<f32> = (0..8).map(|i| i as f32 * 0.5).collect();
    let b: Vec<f32> = (0..8).map(|i| (8 - i) as f32 * 0.5).collect();

    c.bench_function("dot_8_dispatched", |bencher| {
        bencher.iter(|| black_box(kernels::dot(black_box(&a), black_box(&b))));
    });

    let set = *kernel_set();
    c.bench_function("dot_8_kernel_set", |bencher| {
        bencher.iter(|| black_box(set.dot(black_box(&a), black_box(&b))));
    });

    let entry = kernels::dot_table().dispatch();
    c.bench_function("dot_8_table_entry", |bencher| {
        // SAFETY: dispatch returns the entry of the selected, host-supported tier.
        bencher.iter(|| black_box(unsafe { entry(black_box(&a), black_box(&b)) }));
    });

    println!("=== End Diagnostic ===\n");
}

criterion_group!(benches, diagnose_dispatch);
criterion_main!(benches);
