//! Fuzzy inference engine.
//!
//! One engine instance per controlled variable. Each rule pairs a
//! piecewise-linear membership shape over the error domain with a crisp
//! output singleton; the engine computes every membership degree and
//! defuzzifies by weighted average:
//!
//! ```text
//!   output = Σ(degree_i × singleton_i) / Σ(degree_i)
//! ```
//!
//! When every degree is (near) zero the engine returns a fixed fallback
//! — the "at setpoint" singleton — instead of dividing by zero.
//!
//! Breakpoints and singletons are tuning data injected at construction;
//! [`FuzzyEngine::temperature`] and [`FuzzyEngine::turbidity`] build the
//! stock rule tables.

use heapless::Vec;

/// Maximum rules per engine. The stock tables use five.
pub const MAX_RULES: usize = 8;

/// Degrees summing below this are treated as total underflow.
const DEGREE_EPSILON: f32 = 0.01;

// ---------------------------------------------------------------------------
// Membership shapes
// ---------------------------------------------------------------------------

/// A piecewise-linear membership function over the error domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Rising shoulder: 0 at/below `foot`, 1 at/above `shoulder`.
    RampUp { foot: f32, shoulder: f32 },
    /// Falling shoulder: 1 at/below `shoulder`, 0 at/above `foot`.
    RampDown { shoulder: f32, foot: f32 },
    /// Flat top between `b` and `c`, feet at `a` and `d`.
    /// `b == c` degenerates to a triangle.
    Trapezoid { a: f32, b: f32, c: f32, d: f32 },
}

impl Shape {
    /// Membership degree of `x`, always in [0, 1].
    pub fn degree(&self, x: f32) -> f32 {
        match *self {
            Self::RampUp { foot, shoulder } => {
                if x <= foot {
                    0.0
                } else if x >= shoulder {
                    1.0
                } else {
                    (x - foot) / (shoulder - foot)
                }
            }
            Self::RampDown { shoulder, foot } => {
                if x <= shoulder {
                    1.0
                } else if x >= foot {
                    0.0
                } else {
                    (foot - x) / (foot - shoulder)
                }
            }
            Self::Trapezoid { a, b, c, d } => {
                if x <= a || x >= d {
                    0.0
                } else if x >= b && x <= c {
                    1.0
                } else if x < b {
                    (x - a) / (b - a)
                } else {
                    (d - x) / (d - c)
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rules and engine
// ---------------------------------------------------------------------------

/// One fuzzy rule: a named membership shape and its output singleton.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyRule {
    pub label: &'static str,
    pub shape: Shape,
    /// Crisp actuation level (0-100 %) this rule votes for.
    pub singleton: f32,
}

/// Weighted-average fuzzy inference engine for a single variable.
#[derive(Debug, Clone)]
pub struct FuzzyEngine {
    rules: Vec<FuzzyRule, MAX_RULES>,
    /// Output returned when all membership degrees underflow.
    fallback: f32,
}

impl FuzzyEngine {
    /// Build an engine from an arbitrary rule table.
    ///
    /// Panics if more than [`MAX_RULES`] rules are supplied — rule
    /// tables are compile-time tuning data, never runtime input.
    pub fn new(rules: &[FuzzyRule], fallback: f32) -> Self {
        let mut v: Vec<FuzzyRule, MAX_RULES> = Vec::new();
        for r in rules {
            v.push(*r).expect("rule table exceeds MAX_RULES");
        }
        Self { rules: v, fallback }
    }

    /// Crisp output for `error`, in the closed interval spanned by the
    /// rule singletons (or the fallback on underflow).
    pub fn evaluate(&self, error: f32) -> f32 {
        let mut numerator = 0.0f32;
        let mut denominator = 0.0f32;
        for rule in &self.rules {
            let mu = rule.shape.degree(error);
            numerator += mu * rule.singleton;
            denominator += mu;
        }
        if denominator < DEGREE_EPSILON {
            return self.fallback;
        }
        numerator / denominator
    }

    /// Closed interval spanned by the rule singletons.
    pub fn output_span(&self) -> (f32, f32) {
        let mut lo = self.fallback;
        let mut hi = self.fallback;
        for rule in &self.rules {
            lo = lo.min(rule.singleton);
            hi = hi.max(rule.singleton);
        }
        (lo, hi)
    }

    /// Membership degree of the rule named `label` at `error` (tests,
    /// diagnostics). `None` if no such rule exists.
    pub fn degree_of(&self, label: &str, error: f32) -> Option<f32> {
        self.rules
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.shape.degree(error))
    }

    // ── Stock tunings ─────────────────────────────────────────

    /// Temperature engine: error = setpoint − measurement, positive
    /// when the tank is too cold. Singletons are heater duty levels.
    pub fn temperature() -> Self {
        Self::new(
            &[
                FuzzyRule {
                    label: "very_cold",
                    shape: Shape::RampUp {
                        foot: 4.0,
                        shoulder: 6.0,
                    },
                    singleton: 85.0,
                },
                FuzzyRule {
                    label: "cold",
                    shape: Shape::Trapezoid {
                        a: 1.0,
                        b: 2.0,
                        c: 4.0,
                        d: 5.0,
                    },
                    singleton: 60.0,
                },
                FuzzyRule {
                    label: "at_target",
                    shape: Shape::Trapezoid {
                        a: -3.0,
                        b: -1.0,
                        c: 1.0,
                        d: 3.0,
                    },
                    singleton: 30.0,
                },
                FuzzyRule {
                    label: "hot",
                    shape: Shape::Trapezoid {
                        a: -5.0,
                        b: -4.0,
                        c: -2.0,
                        d: -1.0,
                    },
                    singleton: 10.0,
                },
                FuzzyRule {
                    label: "very_hot",
                    shape: Shape::RampDown {
                        shoulder: -6.0,
                        foot: -4.0,
                    },
                    singleton: 0.0,
                },
            ],
            30.0, // hold-at-setpoint heater duty
        )
    }

    /// Turbidity engine: error = measurement − setpoint, positive when
    /// the water is too turbid. Singletons are pump duty levels.
    pub fn turbidity() -> Self {
        Self::new(
            &[
                FuzzyRule {
                    label: "very_clear",
                    shape: Shape::RampDown {
                        shoulder: -8.0,
                        foot: -6.0,
                    },
                    singleton: 0.0,
                },
                FuzzyRule {
                    label: "clear",
                    shape: Shape::Trapezoid {
                        a: -8.0,
                        b: -4.0,
                        c: -2.0,
                        d: 0.0,
                    },
                    singleton: 15.0,
                },
                FuzzyRule {
                    label: "at_target",
                    shape: Shape::Trapezoid {
                        a: -4.0,
                        b: -1.0,
                        c: 1.0,
                        d: 4.0,
                    },
                    singleton: 30.0,
                },
                FuzzyRule {
                    label: "turbid",
                    shape: Shape::Trapezoid {
                        a: 1.0,
                        b: 5.0,
                        c: 8.0,
                        d: 12.0,
                    },
                    singleton: 60.0,
                },
                FuzzyRule {
                    label: "very_turbid",
                    shape: Shape::RampUp {
                        foot: 9.0,
                        shoulder: 15.0,
                    },
                    singleton: 85.0,
                },
            ],
            30.0, // hold-circulation pump duty
        )
    }
}
