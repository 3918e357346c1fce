// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Built-in benchmark subjects.
//!
//! The functions below are the instrumentation targets. They are plain
//! `extern "C"` functions kept out of line so every call really happens,
//! published as an [`ExportTable`] under [`MODULE_NAME`].
//!
//! [`TargetCaller`] routes calls through an [`InProcessInterceptor`] so that
//! whatever is attached to a target runs around it.

use std::ffi::{c_char, c_int, CStr};
use std::hint::black_box;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::probe::{CallArgs, ExportTable, InProcessInterceptor, StaticResolver};
use crate::types::{Address, ReturnKind, SymbolName};
use crate::workload::hash::rolling_hash;
use crate::workload::kernels::{
    fib_index, fibonacci, heavy_result, is_prime, matrix_reduce, mix_scratch, prime_candidate,
};
use crate::workload::SNAPSHOT_INTERVAL;

/// Module name the built-in targets are published under.
pub const MODULE_NAME: &str = "libfuncs.so";

/// Bytes touched by [`allocate_and_free`].
const TOUCHED_BYTES: usize = 10;

const ORIGINAL: &CStr = match CStr::from_bytes_with_nul(b"ORIGINAL\0") {
    Ok(s) => s,
    Err(_) => panic!("literal is NUL-terminated"),
};

#[inline(never)]
pub extern "C" fn compute_sum(a: c_int, b: c_int) -> c_int {
    black_box(a).wrapping_add(b)
}

/// A short mixing loop whose result is discarded, then `a + b`.
#[inline(never)]
pub extern "C" fn compute_sum_heavy(a: c_int, b: c_int) -> c_int {
    let mut result: c_int = 0;
    for i in 0..100 {
        result = black_box(result.wrapping_add(i * i));
        result ^= result.wrapping_shl(1);
    }
    black_box(result);
    a.wrapping_add(b)
}

#[derive(Debug, Serialize)]
struct ComplexTotals {
    calls: u64,
    sum: f64,
    min: f64,
    max: f64,
}

static COMPLEX_TOTALS: Mutex<ComplexTotals> = Mutex::new(ComplexTotals {
    calls: 0,
    sum: 0.0,
    min: 1e9,
    max: -1e9,
});

/// The workload compiled into the target itself: string hash, trig
/// accumulation, running totals, Fibonacci, primality, matrix reduction and
/// a mixing pass, folded into one integer.
#[inline(never)]
pub extern "C" fn compute_sum_complex(a: c_int, b: c_int) -> c_int {
    let hash = (rolling_hash(&format!("{:x}_{:x}", a as u32, b as u32)) as u32) & 0x7FFF_FFFF;
    let heavy = heavy_result(a, b);

    let value = a as f64 + b as f64;
    {
        let mut totals = COMPLEX_TOTALS.lock().unwrap_or_else(PoisonError::into_inner);
        totals.calls += 1;
        totals.sum += value;
        totals.min = totals.min.min(value);
        totals.max = totals.max.max(value);
        if totals.calls % SNAPSHOT_INTERVAL == 0 {
            black_box(serde_json::to_string(&*totals).map(|s| s.len()).ok());
        }
    }

    let fib_value = fibonacci(fib_index(a, b));
    let prime = is_prime(prime_candidate(a, b));
    let matrix = matrix_reduce(a, b);

    let mut folded = heavy as c_int;
    for _ in 0..5 {
        folded = folded.wrapping_mul(7).wrapping_add(fib_value as c_int) % 1000;
    }
    let scratch = mix_scratch(folded, matrix, prime);
    let median = scratch[scratch.len() / 2];

    let mixed = (hash as u64)
        .wrapping_add(fib_value)
        .wrapping_add(matrix as i64 as u64)
        .wrapping_add(median as i64 as u64)
        % 1000;
    (mixed as c_int).wrapping_add(a.wrapping_add(b))
}

#[inline(never)]
pub extern "C" fn factorial(n: c_int) -> u64 {
    if n <= 1 {
        return 1;
    }
    (n as u64).wrapping_mul(factorial(black_box(n - 1)))
}

/// Sum `size` elements of `arr` into `*result`. Returns 0.
///
/// # Safety
///
/// `arr` must point to `size` readable `c_int`s and `result` must be valid
/// for writes.
#[inline(never)]
pub unsafe extern "C" fn process_array(arr: *const c_int, size: usize, result: *mut c_int) -> c_int {
    let values = std::slice::from_raw_parts(arr, size);
    *result = values.iter().fold(0, |acc: c_int, &v| acc.wrapping_add(v));
    0
}

/// Allocate `size` bytes, touch the first few, free them. Returns 1.
#[inline(never)]
pub extern "C" fn allocate_and_free(size: usize) -> c_int {
    let mut block = vec![0u8; size];
    for byte in block.iter_mut().take(TOUCHED_BYTES) {
        *byte = 0x42;
    }
    black_box(&block);
    1
}

#[inline(never)]
pub extern "C" fn test_intercept() -> *const c_char {
    ORIGINAL.as_ptr()
}

/// The built-in targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    ComputeSum,
    ComputeSumHeavy,
    ComputeSumComplex,
    Factorial,
    ProcessArray,
    AllocateAndFree,
    TestIntercept,
}

impl Target {
    pub const ALL: [Target; 7] = [
        Target::ComputeSum,
        Target::ComputeSumHeavy,
        Target::ComputeSumComplex,
        Target::Factorial,
        Target::ProcessArray,
        Target::AllocateAndFree,
        Target::TestIntercept,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ComputeSum => "compute_sum",
            Self::ComputeSumHeavy => "compute_sum_heavy",
            Self::ComputeSumComplex => "compute_sum_complex",
            Self::Factorial => "factorial",
            Self::ProcessArray => "process_array",
            Self::AllocateAndFree => "allocate_and_free",
            Self::TestIntercept => "test_intercept",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// How the default probes rewrite this target's return value.
    pub fn returns(&self) -> ReturnKind {
        match self {
            Self::TestIntercept => ReturnKind::String,
            _ => ReturnKind::Int,
        }
    }

    pub fn address(&self) -> Address {
        let raw = match self {
            Self::ComputeSum => compute_sum as usize,
            Self::ComputeSumHeavy => compute_sum_heavy as usize,
            Self::ComputeSumComplex => compute_sum_complex as usize,
            Self::Factorial => factorial as usize,
            Self::ProcessArray => process_array as usize,
            Self::AllocateAndFree => allocate_and_free as usize,
            Self::TestIntercept => test_intercept as usize,
        };
        Address::new_unchecked(raw)
    }

    pub fn symbol(&self) -> SymbolName {
        SymbolName::new(self.name()).unwrap_or_else(|_| unreachable!("built-in names are valid"))
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The built-in targets as a resolvable module.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetLibrary;

impl TargetLibrary {
    pub fn export_table() -> ExportTable {
        Target::ALL
            .iter()
            .fold(ExportTable::new(MODULE_NAME), |table, t| {
                table.with(t.symbol(), t.address())
            })
    }

    pub fn resolver() -> StaticResolver {
        StaticResolver::new().with_table(Self::export_table())
    }

    pub fn symbols() -> Vec<SymbolName> {
        Target::ALL.iter().map(Target::symbol).collect()
    }
}

/// Calls the built-in targets through an interceptor.
#[derive(Debug, Clone, Copy)]
pub struct TargetCaller<'a> {
    interceptor: &'a InProcessInterceptor,
}

impl<'a> TargetCaller<'a> {
    pub fn new(interceptor: &'a InProcessInterceptor) -> Self {
        Self { interceptor }
    }

    pub fn compute_sum(&self, a: i32, b: i32) -> i32 {
        self.interceptor.invoke(
            Target::ComputeSum.address(),
            CallArgs::ints(a, b),
            |args| compute_sum(args.int(0), args.int(1)) as i64,
        ) as i32
    }

    pub fn compute_sum_heavy(&self, a: i32, b: i32) -> i32 {
        self.interceptor.invoke(
            Target::ComputeSumHeavy.address(),
            CallArgs::ints(a, b),
            |args| compute_sum_heavy(args.int(0), args.int(1)) as i64,
        ) as i32
    }

    pub fn compute_sum_complex(&self, a: i32, b: i32) -> i32 {
        self.interceptor.invoke(
            Target::ComputeSumComplex.address(),
            CallArgs::ints(a, b),
            |args| compute_sum_complex(args.int(0), args.int(1)) as i64,
        ) as i32
    }

    pub fn factorial(&self, n: i32) -> u64 {
        self.interceptor.invoke(
            Target::Factorial.address(),
            CallArgs::new(&[n as i64]),
            |args| factorial(args.int(0)) as i64,
        ) as u64
    }

    /// Sums `values` into `out`; returns the (possibly rewritten) status word.
    pub fn process_array(&self, values: &[i32], out: &mut i32) -> i32 {
        let out: *mut i32 = out;
        let args = CallArgs::new(&[values.as_ptr() as i64, values.len() as i64, out as i64]);
        self.interceptor.invoke(Target::ProcessArray.address(), args, |_| {
            // SAFETY: the slice and the output borrow are valid for the call.
            unsafe { process_array(values.as_ptr(), values.len(), out) as i64 }
        }) as i32
    }

    pub fn allocate_and_free(&self, size: usize) -> i32 {
        self.interceptor.invoke(
            Target::AllocateAndFree.address(),
            CallArgs::new(&[size as i64]),
            |args| allocate_and_free(args.word(0) as usize) as i64,
        ) as i32
    }

    /// The returned string, or `None` when a probe replaced the pointer with
    /// something that is not a known string.
    pub fn test_intercept(&self) -> Option<&'static CStr> {
        let raw = self.interceptor.invoke(
            Target::TestIntercept.address(),
            CallArgs::default(),
            |_| test_intercept() as i64,
        );
        if raw == ORIGINAL.as_ptr() as i64 {
            Some(ORIGINAL)
        } else {
            self.interceptor.interned(raw)
        }
    }
}
