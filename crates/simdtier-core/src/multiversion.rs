//! The `multiversion!` macro: one kernel body, one entry per compiled tier.
//!
//! ```rust
//! use simdtier_core::{multiversion, SimdOps};
//!
//! multiversion! {
//!     #[table(scale_table)]
//!     /// Multiplies every element by `factor`.
//!     pub fn scale<S>(simd: S, data: &mut [f32], factor: f32) {
//!         let f = simd.set(factor);
//!         let mut chunks = data.chunks_exact_mut(S::LANES);
//!         for chunk in &mut chunks {
//!             let v = simd.load_slice(chunk);
//!             simd.store_slice(chunk, simd.mul(v, f));
//!         }
//!         for x in chunks.into_remainder() {
//!             *x *= factor;
//!         }
//!     }
//! }
//!
//! let mut data = vec![1.0_f32; 37];
//! scale(&mut data, 2.0);
//! assert!(data.iter().all(|&x| x == 2.0));
//! assert_eq!(scale_table().len(), simdtier_core::COMPILED_TIERS.len());
//! ```
//!
//! For every compiled tier the macro emits a private `#[target_feature]`
//! function that instantiates the body with that tier's token, so the
//! compiler emits the tier's instructions for the whole kernel. The entries
//! are collected into a lazily built [`KernelTable`](crate::KernelTable)
//! returned by the `#[table(..)]` accessor, and the safe function dispatches
//! through it.
//!
//! Which tiers exist is decided by the cargo features of `simdtier-core`, not
//! of the crate invoking the macro: the expansion goes through the hidden
//! `__simdtier_if_*` macros below, whose definitions are selected when this
//! crate is compiled.

/// Defines a multi-version kernel.
///
/// See the [module documentation](crate::multiversion) for an example. The
/// body is written once, generic over the token type `S: SimdOps`; argument
/// types must be nameable in a function pointer type.
#[macro_export]
macro_rules! multiversion {
    (
        #[table($table:ident)]
        $(#[$meta:meta])*
        $vis:vis fn $name:ident<$S:ident>($simd:ident : $_S:ident $(, $arg:ident : $ty:ty)* $(,)?)
            $(-> $ret:ty)?
        $body:block
    ) => {
        $(#[$meta])*
        #[inline]
        $vis fn $name($($arg: $ty),*) $(-> $ret)? {
            let entry = $table().dispatch();
            // SAFETY: dispatch hands out the entry of the selected tier, which
            // the host supports.
            unsafe { entry($($arg),*) }
        }

        #[doc = concat!("Multi-version table of [`", stringify!($name), "`].")]
        $vis fn $table() -> &'static $crate::KernelTable<unsafe fn($($ty),*) $(-> $ret)?> {
            #[inline(always)]
            #[allow(clippy::needless_pass_by_value)]
            fn kernel<$S: $crate::SimdOps>($simd: $S, $($arg: $ty),*) $(-> $ret)? $body

            static TABLE: ::std::sync::OnceLock<$crate::KernelTable<unsafe fn($($ty),*) $(-> $ret)?>> =
                ::std::sync::OnceLock::new();

            TABLE.get_or_init(|| {
                fn scalar_entry($($arg: $ty),*) $(-> $ret)? {
                    kernel($crate::backend::Scalar::new(), $($arg),*)
                }
                let builder = $crate::KernelTableBuilder::new(stringify!($name)).insert(
                    $crate::Tier::Scalar,
                    scalar_entry as unsafe fn($($ty),*) $(-> $ret)?,
                );

                $crate::__simdtier_if_sse! {
                    #[target_feature(enable = "sse")]
                    unsafe fn sse_entry($($arg: $ty),*) $(-> $ret)? {
                        // SAFETY: only reachable through the table on SSE hosts.
                        kernel(unsafe { <$crate::backend::Sse as $crate::SimdOps>::new_unchecked() }, $($arg),*)
                    }
                    let builder = builder.insert(
                        $crate::Tier::Sse,
                        sse_entry as unsafe fn($($ty),*) $(-> $ret)?,
                    );
                }

                $crate::__simdtier_if_sse2! {
                    #[target_feature(enable = "sse2")]
                    unsafe fn sse2_entry($($arg: $ty),*) $(-> $ret)? {
                        // SAFETY: only reachable through the table on SSE2 hosts.
                        kernel(unsafe { <$crate::backend::Sse2 as $crate::SimdOps>::new_unchecked() }, $($arg),*)
                    }
                    let builder = builder.insert(
                        $crate::Tier::Sse2,
                        sse2_entry as unsafe fn($($ty),*) $(-> $ret)?,
                    );
                }

                $crate::__simdtier_if_sse3! {
                    #[target_feature(enable = "sse3")]
                    unsafe fn sse3_entry($($arg: $ty),*) $(-> $ret)? {
                        // SAFETY: only reachable through the table on SSE3 hosts.
                        kernel(unsafe { <$crate::backend::Sse3 as $crate::SimdOps>::new_unchecked() }, $($arg),*)
                    }
                    let builder = builder.insert(
                        $crate::Tier::Sse3,
                        sse3_entry as unsafe fn($($ty),*) $(-> $ret)?,
                    );
                }

                $crate::__simdtier_if_sse41! {
                    #[target_feature(enable = "sse4.1")]
                    unsafe fn sse41_entry($($arg: $ty),*) $(-> $ret)? {
                        // SAFETY: only reachable through the table on SSE4.1 hosts.
                        kernel(unsafe { <$crate::backend::Sse41 as $crate::SimdOps>::new_unchecked() }, $($arg),*)
                    }
                    let builder = builder.insert(
                        $crate::Tier::Sse41,
                        sse41_entry as unsafe fn($($ty),*) $(-> $ret)?,
                    );
                }

                $crate::__simdtier_if_avx! {
                    #[target_feature(enable = "avx")]
                    unsafe fn avx_entry($($arg: $ty),*) $(-> $ret)? {
                        // SAFETY: only reachable through the table on AVX hosts.
                        kernel(unsafe { <$crate::backend::Avx as $crate::SimdOps>::new_unchecked() }, $($arg),*)
                    }
                    let builder = builder.insert(
                        $crate::Tier::Avx,
                        avx_entry as unsafe fn($($ty),*) $(-> $ret)?,
                    );
                }

                $crate::__simdtier_if_avx2! {
                    #[target_feature(enable = "avx2")]
                    unsafe fn avx2_entry($($arg: $ty),*) $(-> $ret)? {
                        // SAFETY: only reachable through the table on AVX2 hosts.
                        kernel(unsafe { <$crate::backend::Avx2 as $crate::SimdOps>::new_unchecked() }, $($arg),*)
                    }
                    let builder = builder.insert(
                        $crate::Tier::Avx2,
                        avx2_entry as unsafe fn($($ty),*) $(-> $ret)?,
                    );
                }

                $crate::__simdtier_if_avx2_fma3! {
                    #[target_feature(enable = "avx2,fma")]
                    unsafe fn avx2_fma3_entry($($arg: $ty),*) $(-> $ret)? {
                        // SAFETY: only reachable through the table on AVX2+FMA3 hosts.
                        kernel(unsafe { <$crate::backend::Avx2Fma3 as $crate::SimdOps>::new_unchecked() }, $($arg),*)
                    }
                    let builder = builder.insert(
                        $crate::Tier::Avx2Fma3,
                        avx2_fma3_entry as unsafe fn($($ty),*) $(-> $ret)?,
                    );
                }

                $crate::__simdtier_if_avx512f! {
                    #[target_feature(enable = "avx512f")]
                    unsafe fn avx512f_entry($($arg: $ty),*) $(-> $ret)? {
                        // SAFETY: only reachable through the table on AVX-512F hosts.
                        kernel(unsafe { <$crate::backend::Avx512F as $crate::SimdOps>::new_unchecked() }, $($arg),*)
                    }
                    let builder = builder.insert(
                        $crate::Tier::Avx512F,
                        avx512f_entry as unsafe fn($($ty),*) $(-> $ret)?,
                    );
                }

                builder.finish()
            })
        }
    };
}

// =============================================================================
// Tier gates
// =============================================================================
//
// Each gate expands to its input when the tier is compiled into simdtier-core
// and to nothing otherwise. The cfg is evaluated here, against this crate's
// features, whatever crate the expansion ends up in.

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __simdtier_if_sse {
    ($($tt:tt)*) => { $($tt)* };
}
#[cfg(not(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse")))]
#[doc(hidden)]
#[macro_export]
macro_rules! __simdtier_if_sse {
    ($($tt:tt)*) => {};
}

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse2"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __simdtier_if_sse2 {
    ($($tt:tt)*) => { $($tt)* };
}
#[cfg(not(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse2")))]
#[doc(hidden)]
#[macro_export]
macro_rules! __simdtier_if_sse2 {
    ($($tt:tt)*) => {};
}

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse3"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __simdtier_if_sse3 {
    ($($tt:tt)*) => { $($tt)* };
}
#[cfg(not(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse3")))]
#[doc(hidden)]
#[macro_export]
macro_rules! __simdtier_if_sse3 {
    ($($tt:tt)*) => {};
}

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse41"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __simdtier_if_sse41 {
    ($($tt:tt)*) => { $($tt)* };
}
#[cfg(not(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse41")))]
#[doc(hidden)]
#[macro_export]
macro_rules! __simdtier_if_sse41 {
    ($($tt:tt)*) => {};
}

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __simdtier_if_avx {
    ($($tt:tt)*) => { $($tt)* };
}
#[cfg(not(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx")))]
#[doc(hidden)]
#[macro_export]
macro_rules! __simdtier_if_avx {
    ($($tt:tt)*) => {};
}

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx2"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __simdtier_if_avx2 {
    ($($tt:tt)*) => { $($tt)* };
}
#[cfg(not(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx2")))]
#[doc(hidden)]
#[macro_export]
macro_rules! __simdtier_if_avx2 {
    ($($tt:tt)*) => {};
}

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx2-fma3"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __simdtier_if_avx2_fma3 {
    ($($tt:tt)*) => { $($tt)* };
}
#[cfg(not(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx2-fma3")))]
#[doc(hidden)]
#[macro_export]
macro_rules! __simdtier_if_avx2_fma3 {
    ($($tt:tt)*) => {};
}

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx512f"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __simdtier_if_avx512f {
    ($($tt:tt)*) => { $($tt)* };
}
#[cfg(not(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx512f")))]
#[doc(hidden)]
#[macro_export]
macro_rules! __simdtier_if_avx512f {
    ($($tt:tt)*) => {};
}
