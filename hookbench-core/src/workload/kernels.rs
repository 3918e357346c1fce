// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Numeric micro-kernels composed by the workload engines.
//!
//! All kernels are pure, bounded-iteration and infallible. Integer inputs are
//! widened to `i64` before multiplying so no intermediate can overflow.

use std::collections::HashMap;

/// Exclusive ceiling for the Fibonacci index.
pub const FIB_MAX: u32 = 25;

/// Iterations of the trigonometric accumulation.
pub const TRIG_ITERATIONS: usize = 50;

/// Angle step of the trigonometric accumulation.
pub const TRIG_STEP: f64 = 0.01;

/// Length of the expanded array in the heavy computation.
pub const HEAVY_ARRAY_LEN: usize = 30;

/// Side length of the synthetic matrix.
pub const MATRIX_SIZE: usize = 10;

/// Length of the native mixing scratch buffer.
pub const SCRATCH_LEN: usize = 20;

/// Iterative Fibonacci: `nth(0) = 0`, `nth(1) = 1`.
pub fn fibonacci(n: u32) -> u64 {
    if n <= 1 {
        return n as u64;
    }
    let (mut prev, mut curr) = (0u64, 1u64);
    for _ in 2..=n {
        let next = prev.wrapping_add(curr);
        prev = curr;
        curr = next;
    }
    curr
}

/// Fibonacci evaluator with an optional per-index memo table.
///
/// The memo only short-circuits; every value it returns equals [`fibonacci`].
#[derive(Debug, Clone, Default)]
pub struct SequenceMemo {
    memo: Option<HashMap<u32, u64>>,
}

impl SequenceMemo {
    /// Evaluator that recomputes on every call.
    pub fn iterative() -> Self {
        Self { memo: None }
    }

    /// Evaluator that remembers values by index.
    pub fn memoized() -> Self {
        Self {
            memo: Some(HashMap::new()),
        }
    }

    pub fn nth(&mut self, n: u32) -> u64 {
        let Some(memo) = self.memo.as_mut() else {
            return fibonacci(n);
        };
        *memo.entry(n).or_insert_with(|| fibonacci(n))
    }

    pub fn memoized_len(&self) -> usize {
        self.memo.as_ref().map_or(0, HashMap::len)
    }
}

/// Trial division over the 6k±1 wheel.
pub fn is_prime(n: i64) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut i = 5i64;
    while i * i <= n {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

/// Reduce the synthetic matrix `cell(i, j) = (a*i + b*j) mod 100` to a signed
/// sum, `+cell` where `(i + j) mod 3 == 0` and `-cell` elsewhere.
///
/// `mod` is the truncated remainder, so cells carry the sign of `a*i + b*j`.
pub fn matrix_reduce(a: i32, b: i32) -> i32 {
    let (a, b) = (a as i64, b as i64);
    let mut matrix = [[0i64; MATRIX_SIZE]; MATRIX_SIZE];
    for (i, row) in matrix.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (a * i as i64 + b * j as i64) % 100;
        }
    }

    let mut result = 0i64;
    for (i, row) in matrix.iter().enumerate() {
        for (j, &cell) in row.iter().enumerate() {
            result += if (i + j) % 3 == 0 { cell } else { -cell };
        }
    }
    // |result| < 100 * MATRIX_SIZE^2, well inside i32.
    result as i32
}

/// The cache-miss computation: trig accumulation, expand, keep even floors,
/// square, sum.
pub fn heavy_result(a: i32, b: i32) -> f64 {
    let (a, b) = (a as f64, b as f64);
    let acc: f64 = (0..TRIG_ITERATIONS)
        .map(|i| {
            let i = i as f64;
            (a * i * TRIG_STEP).sin() * (b * i * TRIG_STEP).cos()
        })
        .sum();

    let expanded: [f64; HEAVY_ARRAY_LEN] = std::array::from_fn(|i| i as f64 * acc);
    expanded
        .iter()
        .filter(|v| (v.floor() as i64).rem_euclid(2) == 0)
        .map(|v| v * v)
        .sum()
}

/// `|a + b| mod FIB_MAX`.
pub fn fib_index(a: i32, b: i32) -> u32 {
    ((a as i64 + b as i64).unsigned_abs() % FIB_MAX as u64) as u32
}

/// `|a * b| mod 100`, the value fed to the primality test.
pub fn prime_candidate(a: i32, b: i32) -> i64 {
    ((a as i64 * b as i64).unsigned_abs() % 100) as i64
}

/// Swap the two low bytes of `scalar`, XOR in the matrix value, expand into
/// the scratch buffer and sort it.
pub fn mix_scratch(scalar: i32, matrix: i32, prime: bool) -> [i32; SCRATCH_LEN] {
    let swapped = ((scalar & 0xFF) << 8) | ((scalar >> 8) & 0xFF);
    let bits = swapped ^ matrix;
    let factor = if prime { 2 } else { 1 };

    let mut scratch: [i32; SCRATCH_LEN] =
        std::array::from_fn(|i| bits.wrapping_add(i as i32).wrapping_mul(factor));
    insertion_sort(&mut scratch);
    scratch
}

/// In-place ascending insertion sort.
pub fn insertion_sort(values: &mut [i32]) {
    for i in 1..values.len() {
        let current = values[i];
        let mut j = i;
        while j > 0 && values[j - 1] > current {
            values[j] = values[j - 1];
            j -= 1;
        }
        values[j] = current;
    }
}
