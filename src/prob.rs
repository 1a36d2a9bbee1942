// BgpSim: BGP Network Simulator written in Rust
// Copyright 2022-2024 Tibor Schneider <sctibor@ethz.ch>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Numerically stable probability values, kept in log-space.
//!
//! The exploration engine only ever adds disjoint probability masses and multiplies independent
//! ones, so it is enough to track `log(p)` plus an explicit zero sentinel (since `log(0)` is
//! undefined and would otherwise have to be special-cased at every call site).

use std::fmt;

/// A probability in `[0, 1]`, represented as `log(p)` to avoid underflow on long products of
/// small per-link probabilities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prob {
    log_val: f64,
    is_zero: bool,
}

impl Prob {
    /// Construct a probability from a plain `[0, 1]` value.
    pub fn new(p: f64) -> Self {
        if p == 0.0 {
            Prob {
                log_val: f64::NEG_INFINITY,
                is_zero: true,
            }
        } else {
            Prob {
                log_val: p.ln(),
                is_zero: false,
            }
        }
    }

    /// The probability representing certainty (`p = 1`).
    pub fn one() -> Self {
        Prob::new(1.0)
    }

    /// The probability representing impossibility (`p = 0`).
    pub fn zero() -> Self {
        Prob::new(0.0)
    }

    /// Construct directly from a log-probability (must be `<= 0`).
    pub fn from_log(log_val: f64) -> Self {
        Prob {
            log_val,
            is_zero: false,
        }
    }

    /// Recover the plain `[0, 1]` value. Only used at the boundary (reporting, tests).
    pub fn val(&self) -> f64 {
        if self.is_zero {
            0.0
        } else {
            self.log_val.exp()
        }
    }

    /// `1 - p`, clamped to `[0, 1]` so rounding error in long products never produces a
    /// negative width.
    pub fn invert(&self) -> Prob {
        if self.is_zero {
            Prob::one()
        } else {
            let v = self.val();
            if v >= 1.0 {
                Prob::zero()
            } else {
                Prob::new(1.0 - v)
            }
        }
    }
}

impl std::ops::Add for Prob {
    type Output = Prob;

    /// Probability of disjoint events: log-sum-exp.
    fn add(self, rhs: Prob) -> Prob {
        if self.is_zero {
            return rhs;
        }
        if rhs.is_zero {
            return self;
        }
        let (a, b) = (self.log_val, rhs.log_val);
        let m = a.max(b);
        Prob::from_log(m + ((a - m).exp() + (b - m).exp()).ln())
    }
}

impl std::ops::AddAssign for Prob {
    fn add_assign(&mut self, rhs: Prob) {
        *self = *self + rhs;
    }
}

impl std::ops::Mul for Prob {
    type Output = Prob;

    /// Probability of independent events: sum of logs.
    fn mul(self, rhs: Prob) -> Prob {
        if self.is_zero || rhs.is_zero {
            Prob::zero()
        } else {
            Prob::from_log(self.log_val + rhs.log_val)
        }
    }
}

impl fmt::Display for Prob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.val())
    }
}

impl Default for Prob {
    fn default() -> Self {
        Prob::zero()
    }
}
