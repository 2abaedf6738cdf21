use std::fmt;
use std::str::FromStr;

use super::shape_descriptor::ShapeDescriptor;

/// Invariants at or below this magnitude are ignored.
const HU_EPSILON: f64 = 1e-5;

/// How the log-scaled Hu invariants of two shapes are compared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchMethod {
    /// Sum of differences of reciprocals.
    #[default]
    I1,
    /// Sum of absolute differences.
    I2,
    /// Largest difference relative to the first shape.
    I3,
}

impl FromStr for MatchMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "i1" | "1" => Ok(Self::I1),
            "i2" | "2" => Ok(Self::I2),
            "i3" | "3" => Ok(Self::I3),
            other => Err(format!("unknown match method '{other}' (expected i1, i2 or i3)")),
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::I1 => "i1",
            Self::I2 => "i2",
            Self::I3 => "i3",
        };
        f.write_str(name)
    }
}

/// Dissimilarity of two descriptors; zero means identical shapes.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct MatchScore(f64);

impl MatchScore {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for MatchScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct ShapeMatcher {
    method: MatchMethod,
}

impl ShapeMatcher {
    pub fn new(method: MatchMethod) -> Self {
        Self { method }
    }

    pub fn method(&self) -> MatchMethod {
        self.method
    }

    /// Compares two descriptors through their Hu moment invariants.
    ///
    /// Both descriptors must be non-empty. Scores are symmetric for
    /// [`MatchMethod::I1`] and [`MatchMethod::I2`].
    pub fn compare(&self, a: &ShapeDescriptor, b: &ShapeDescriptor) -> MatchScore {
        debug_assert!(!a.is_empty() && !b.is_empty(), "cannot match an empty descriptor");
        MatchScore(compare_hu(&a.hu_moments(), &b.hu_moments(), self.method))
    }
}

impl Default for ShapeMatcher {
    fn default() -> Self {
        Self::new(MatchMethod::default())
    }
}

fn compare_hu(ha: &[f64; 7], hb: &[f64; 7], method: MatchMethod) -> f64 {
    let log_scaled = |h: f64| h.signum() * h.abs().log10();

    let mut result: f64 = 0.0;
    let (mut any_a, mut any_b) = (false, false);
    for (&a, &b) in ha.iter().zip(hb) {
        any_a |= a.abs() > 0.0;
        any_b |= b.abs() > 0.0;
        if a.abs() <= HU_EPSILON || b.abs() <= HU_EPSILON {
            continue;
        }
        let (ma, mb) = (log_scaled(a), log_scaled(b));
        match method {
            MatchMethod::I1 => result += (1.0 / ma - 1.0 / mb).abs(),
            MatchMethod::I2 => result += (ma - mb).abs(),
            MatchMethod::I3 => result = result.max(((ma - mb) / ma).abs()),
        }
    }

    if any_a != any_b {
        f64::MAX
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use imageproc::point::Point;
    use rstest::rstest;

    fn descriptor(coords: &[(i32, i32)]) -> ShapeDescriptor {
        ShapeDescriptor::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    fn ear_like() -> ShapeDescriptor {
        descriptor(&[
            (10, 0), (30, 4), (42, 20), (40, 50), (28, 70), (14, 66), (6, 40), (4, 14),
            (18, 20), (30, 26), (32, 44), (22, 54), (16, 40),
        ])
    }

    fn blob() -> ShapeDescriptor {
        descriptor(&[(0, 0), (50, 0), (60, 10), (60, 15), (0, 15)])
    }

    #[rstest]
    #[case::i1(MatchMethod::I1)]
    #[case::i2(MatchMethod::I2)]
    #[case::i3(MatchMethod::I3)]
    fn test_self_match_is_zero(#[case] method: MatchMethod) {
        let d = ear_like();
        assert_eq!(ShapeMatcher::new(method).compare(&d, &d).value(), 0.0);
    }

    #[rstest]
    #[case::i1(MatchMethod::I1)]
    #[case::i2(MatchMethod::I2)]
    fn test_symmetric(#[case] method: MatchMethod) {
        let m = ShapeMatcher::new(method);
        let (a, b) = (ear_like(), blob());
        assert_relative_eq!(m.compare(&a, &b).value(), m.compare(&b, &a).value());
    }

    #[test]
    fn test_different_shapes_score_above_zero() {
        let m = ShapeMatcher::default();
        assert!(m.compare(&ear_like(), &blob()).value() > 0.0);
    }

    #[test]
    fn test_translated_scaled_copy_scores_low() {
        let d = ear_like();
        let moved = ShapeDescriptor::new(
            d.points()
                .iter()
                .map(|p| Point::new(p.x * 2 + 31, p.y * 2 + 7))
                .collect(),
        );
        let score = ShapeMatcher::default().compare(&d, &moved).value();
        assert!(score < 0.5, "score {score}");
        assert!(score >= 0.0);
    }

    #[test]
    fn test_one_sided_zero_invariants_is_max() {
        let zero = [0.0; 7];
        let some = [0.2, 0.01, 0.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(compare_hu(&zero, &some, MatchMethod::I1), f64::MAX);
        assert_eq!(compare_hu(&some, &zero, MatchMethod::I2), f64::MAX);
        assert_eq!(compare_hu(&zero, &zero, MatchMethod::I1), 0.0);
    }

    #[test]
    fn test_tiny_invariants_count_as_present() {
        let zero = [0.0; 7];
        let tiny = [3e-7, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let other_tiny = [8e-6, 1e-9, 0.0, 0.0, 0.0, 0.0, 0.0];
        // below the comparison epsilon nothing is summed, but presence still counts
        assert_eq!(compare_hu(&tiny, &zero, MatchMethod::I1), f64::MAX);
        assert_eq!(compare_hu(&zero, &tiny, MatchMethod::I3), f64::MAX);
        assert_eq!(compare_hu(&tiny, &other_tiny, MatchMethod::I1), 0.0);
    }

    #[test]
    fn test_i3_uses_largest_relative_difference() {
        let a = [0.1, 0.01, 0.0, 0.0, 0.0, 0.0, 0.0];
        let b = [0.01, 0.01, 0.0, 0.0, 0.0, 0.0, 0.0];
        // log10: -1 vs -2 → |(-1 - -2) / -1| = 1
        assert_relative_eq!(compare_hu(&a, &b, MatchMethod::I3), 1.0);
        // I1: |1/-1 - 1/-2| = 0.5
        assert_relative_eq!(compare_hu(&a, &b, MatchMethod::I1), 0.5);
        assert_relative_eq!(compare_hu(&a, &b, MatchMethod::I2), 1.0);
    }

    #[rstest]
    #[case::lower("i1", MatchMethod::I1)]
    #[case::upper("I2", MatchMethod::I2)]
    #[case::digit("3", MatchMethod::I3)]
    fn test_parse_method(#[case] input: &str, #[case] expected: MatchMethod) {
        assert_eq!(input.parse::<MatchMethod>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_method() {
        assert!("contours".parse::<MatchMethod>().is_err());
        assert_eq!(MatchMethod::I2.to_string(), "i2");
    }
}
