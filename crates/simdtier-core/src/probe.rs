//! Feature probe: CPUID and XCR0 decoding.
//!
//! The probe reports what the CPU *and* the operating system support, not what
//! the compiler was told to target. A CPU may advertise AVX while the OS has
//! not enabled saving of the YMM registers; such a host reports AVX as absent.
//!
//! Register reads go through [`CpuidSource`] so the decoding logic can be
//! exercised with synthetic CPUs. [`HostCpu`] is the real source.

use tracing::debug;

use crate::capability::CapabilitySet;

// =============================================================================
// Register bit positions
// =============================================================================

/// CPUID leaf 1, ECX.
mod leaf1_ecx {
    pub const SSE3: u32 = 0;
    pub const SSSE3: u32 = 9;
    pub const FMA3: u32 = 12;
    pub const SSE4_1: u32 = 19;
    pub const SSE4_2: u32 = 20;
    pub const XSAVE: u32 = 26;
    pub const OSXSAVE: u32 = 27;
    pub const AVX: u32 = 28;
    pub const F16C: u32 = 29;
}

/// CPUID leaf 1, EDX.
mod leaf1_edx {
    pub const SSE: u32 = 25;
    pub const SSE2: u32 = 26;
}

/// CPUID leaf 7 sub-leaf 0, EBX.
mod leaf7_ebx {
    pub const AVX2: u32 = 5;
    pub const AVX512F: u32 = 16;
}

/// XCR0 state-component bits.
mod xcr0 {
    /// XMM0-15 and MXCSR.
    pub const SSE: u32 = 1;
    /// Upper halves of YMM0-15.
    pub const AVX: u32 = 2;
    /// Opmask registers k0-k7.
    pub const OPMASK: u32 = 5;
    /// Upper 256 bits of ZMM0-15.
    pub const ZMM_HI256: u32 = 6;
    /// ZMM16-31.
    pub const HI16_ZMM: u32 = 7;
}

/// Lowest leaf carrying the basic feature flags.
const LEAF_BASIC_FEATURES: u32 = 1;
/// Lowest leaf carrying the extended feature flags (AVX2, AVX-512).
const LEAF_EXTENDED_FEATURES: u32 = 7;

#[inline]
fn bit(reg: u32, pos: u32) -> bool {
    reg & (1 << pos) != 0
}

#[inline]
fn bit64(reg: u64, pos: u32) -> bool {
    reg & (1 << pos) != 0
}

// =============================================================================
// Register sources
// =============================================================================

/// The four general-purpose registers returned by a CPUID query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuidRegisters {
    /// EAX.
    pub eax: u32,
    /// EBX.
    pub ebx: u32,
    /// ECX.
    pub ecx: u32,
    /// EDX.
    pub edx: u32,
}

/// Source of CPUID results and the XCR0 register.
pub trait CpuidSource {
    /// Executes CPUID for `leaf`/`sub_leaf`.
    fn cpuid(&self, leaf: u32, sub_leaf: u32) -> CpuidRegisters;

    /// Reads XCR0.
    ///
    /// The probe only calls this after CPUID reported both XSAVE and OSXSAVE;
    /// on real hardware the read faults otherwise.
    fn xcr0(&self) -> u64;
}

/// The CPU the process is running on.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostCpu;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl CpuidSource for HostCpu {
    fn cpuid(&self, leaf: u32, sub_leaf: u32) -> CpuidRegisters {
        #[cfg(target_arch = "x86")]
        use std::arch::x86::__cpuid_count;
        #[cfg(target_arch = "x86_64")]
        use std::arch::x86_64::__cpuid_count;

        // SAFETY: CPUID is available on every x86_64 CPU, and `probe` checks
        // `has_cpuid` before querying on 32-bit x86. Newer toolchains expose
        // the intrinsic as safe.
        #[allow(unused_unsafe)]
        let r = unsafe { __cpuid_count(leaf, sub_leaf) };
        CpuidRegisters {
            eax: r.eax,
            ebx: r.ebx,
            ecx: r.ecx,
            edx: r.edx,
        }
    }

    fn xcr0(&self) -> u64 {
        // SAFETY: only reached after CPUID.1:ECX reported XSAVE and OSXSAVE,
        // which is the architectural condition for XGETBV not to fault.
        unsafe { read_xcr0() }
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[target_feature(enable = "xsave")]
unsafe fn read_xcr0() -> u64 {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::_xgetbv;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::_xgetbv;

    _xgetbv(0)
}

// =============================================================================
// Probe
// =============================================================================

/// Probes the host CPU and operating system.
///
/// Never fails. Hosts that cannot answer a query (CPUID unavailable, maximum
/// leaf too low, non-x86 architecture) report the corresponding extensions as
/// unsupported. Safe to call from any thread; the selector calls it once.
#[must_use]
pub fn probe() -> CapabilitySet {
    #[cfg(target_arch = "x86")]
    {
        if !std::arch::x86::has_cpuid() {
            debug!("cpuid unavailable, reporting baseline capabilities");
            return CapabilitySet::baseline();
        }
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        probe_with(&HostCpu)
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    {
        debug!("non-x86 target, reporting baseline capabilities");
        CapabilitySet::baseline()
    }
}

/// Decodes the capability set reported by `source`.
#[must_use]
pub fn probe_with<S: CpuidSource + ?Sized>(source: &S) -> CapabilitySet {
    let mut caps = CapabilitySet::baseline();

    let max_leaf = source.cpuid(0, 0).eax;
    if max_leaf < LEAF_BASIC_FEATURES {
        debug!(max_leaf, "basic feature leaf unavailable");
        return caps;
    }

    let leaf1 = source.cpuid(LEAF_BASIC_FEATURES, 0);
    let (ecx, edx) = (leaf1.ecx, leaf1.edx);

    // SSE family
    caps.sse = bit(edx, leaf1_edx::SSE);
    caps.sse2 = caps.sse && bit(edx, leaf1_edx::SSE2);
    caps.sse3 = caps.sse2 && bit(ecx, leaf1_ecx::SSE3);
    caps.ssse3 = caps.sse3 && bit(ecx, leaf1_ecx::SSSE3);
    caps.sse4_1 = caps.ssse3 && bit(ecx, leaf1_ecx::SSE4_1);
    caps.sse4_2 = caps.sse4_1 && bit(ecx, leaf1_ecx::SSE4_2);

    let xsave = bit(ecx, leaf1_ecx::XSAVE);
    let os_xsave = bit(ecx, leaf1_ecx::OSXSAVE);
    let mut xcr0_value = None;

    // XCR0 may only be read once the OS has enabled XSAVE.
    if xsave && os_xsave {
        let xcr0 = source.xcr0();
        xcr0_value = Some(xcr0);

        // AVX family
        let os_avx = bit64(xcr0, xcr0::SSE) && bit64(xcr0, xcr0::AVX);
        caps.avx = caps.sse4_1 && bit(ecx, leaf1_ecx::AVX) && os_avx;
        caps.f16c = caps.avx && bit(ecx, leaf1_ecx::F16C);
        caps.fma3 = caps.avx && bit(ecx, leaf1_ecx::FMA3);

        if max_leaf >= LEAF_EXTENDED_FEATURES {
            let ebx = source.cpuid(LEAF_EXTENDED_FEATURES, 0).ebx;

            caps.avx2 = caps.avx && bit(ebx, leaf7_ebx::AVX2);
            caps.avx2_fma3 = caps.avx2 && caps.fma3;

            // AVX-512 family
            let os_avx512 = os_avx
                && bit64(xcr0, xcr0::OPMASK)
                && bit64(xcr0, xcr0::ZMM_HI256)
                && bit64(xcr0, xcr0::HI16_ZMM);
            caps.avx512f = caps.avx2 && bit(ebx, leaf7_ebx::AVX512F) && os_avx512;
        }
    }

    let caps = caps.normalized();
    debug!(
        max_leaf,
        xsave,
        os_xsave,
        xcr0 = ?xcr0_value,
        sse2 = caps.sse2,
        sse4_1 = caps.sse4_1,
        avx = caps.avx,
        avx2 = caps.avx2,
        fma3 = caps.fma3,
        avx512f = caps.avx512f,
        "cpu features probed"
    );
    caps
}
