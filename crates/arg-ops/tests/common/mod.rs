#![allow(dead_code)]

use std::collections::VecDeque;

use arg_core::ArgRng;

/// Replays fixed answers, one queue per kind of draw. `uniform_int(n)` with
/// `n <= 1` answers `0` without consuming a value, like `RngHandle`.
#[derive(Debug, Default)]
pub struct ScriptedRng {
    ints: VecDeque<usize>,
    doubles: VecDeque<f64>,
    bools: VecDeque<bool>,
    exponentials: VecDeque<f64>,
}

impl ScriptedRng {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ints(mut self, values: &[usize]) -> Self {
        self.ints.extend(values);
        self
    }

    pub fn doubles(mut self, values: &[f64]) -> Self {
        self.doubles.extend(values);
        self
    }

    pub fn bools(mut self, values: &[bool]) -> Self {
        self.bools.extend(values);
        self
    }

    pub fn exponentials(mut self, values: &[f64]) -> Self {
        self.exponentials.extend(values);
        self
    }

    pub fn exhausted(&self) -> bool {
        self.ints.is_empty()
            && self.doubles.is_empty()
            && self.bools.is_empty()
            && self.exponentials.is_empty()
    }
}

impl ArgRng for ScriptedRng {
    fn uniform_int(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        let value = self.ints.pop_front().expect("unscripted uniform_int");
        assert!(value < n, "scripted {value} out of range 0..{n}");
        value
    }

    fn uniform_double(&mut self) -> f64 {
        self.doubles.pop_front().expect("unscripted uniform_double")
    }

    fn bernoulli(&mut self, _p: f64) -> bool {
        self.bools.pop_front().expect("unscripted bernoulli")
    }

    fn gaussian(&mut self) -> f64 {
        panic!("unscripted gaussian")
    }

    fn exponential(&mut self, _rate: f64) -> f64 {
        self.exponentials.pop_front().expect("unscripted exponential")
    }

    fn random_permutation(&mut self, n: usize) -> Vec<usize> {
        (0..n).collect()
    }
}
