use std::str::FromStr;

use rand::Rng;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{Candidate, CandidateError, Coordinate, HeatmapPoint};

/// Which path produced a [`MatchResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
  /// Intensities are min-max normalized similarity distances.
  Ranked,
  /// Intensities are random placeholders and carry no ranking signal.
  Fallback,
}

/// Non-fatal conditions met while building a result.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchWarning {
  /// The candidate was dropped from the heatmap.
  InvalidInput {
    camera_id: String,
    index: usize,
    coordinate: Coordinate,
  },
  /// Every usable distance was equal, so no intensity could be computed.
  DegenerateRange { distance: f64 },
}

impl From<CandidateError> for MatchWarning {
  fn from(err: CandidateError) -> Self {
    match err {
      CandidateError::MissingCoordinate {
        camera_id,
        index,
        coordinate,
      } => Self::InvalidInput {
        camera_id,
        index,
        coordinate,
      },
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
  pub best_match: String,
  /// One point per retained candidate, in input order.
  pub heatmap: Vec<HeatmapPoint>,
  pub mode: MatchMode,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub warnings: Vec<MatchWarning>,
}

impl MatchResult {
  #[must_use]
  pub fn is_degenerate(&self) -> bool {
    self
      .warnings
      .iter()
      .any(|w| matches!(w, MatchWarning::DegenerateRange { .. }))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
  #[error("no usable candidates")]
  NoCandidates,
}

/// How the ranked path picks `best_match`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BestMatchPolicy {
  /// First usable candidate; relies on the search returning rows sorted by
  /// ascending distance.
  #[default]
  InputOrder,
  /// Smallest usable distance, first one on ties.
  MinDistance,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown best match policy {0:?}, expected `input_order` or `min_distance`")]
pub struct ParsePolicyError(String);

impl FromStr for BestMatchPolicy {
  type Err = ParsePolicyError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "input_order" => Ok(Self::InputOrder),
      "min_distance" => Ok(Self::MinDistance),
      _ => Err(ParsePolicyError(s.to_owned())),
    }
  }
}

/// Turns candidate sets into a best match plus heatmap intensities.
///
/// Pure and stateless: a single instance can be shared across requests.
/// Reports problems through [`MatchWarning`] and [`MatchError`], never logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchEngine {
  policy: BestMatchPolicy,
}

/// A candidate that survived coordinate validation.
struct Placed<'a> {
  candidate: &'a Candidate,
  latitude: f64,
  longitude: f64,
}

fn place(candidates: &[Candidate]) -> (Vec<Placed<'_>>, Vec<MatchWarning>) {
  let mut placed = Vec::with_capacity(candidates.len());
  let mut warnings = Vec::new();

  for (index, candidate) in candidates.iter().enumerate() {
    match candidate.position(index) {
      Ok((latitude, longitude)) => placed.push(Placed {
        candidate,
        latitude,
        longitude,
      }),
      Err(err) => warnings.push(err.into()),
    }
  }

  (placed, warnings)
}

impl MatchEngine {
  #[must_use]
  pub const fn new() -> Self {
    Self {
      policy: BestMatchPolicy::InputOrder,
    }
  }

  #[must_use]
  pub const fn with_policy(policy: BestMatchPolicy) -> Self {
    Self { policy }
  }

  /// Ranked mode: min-max invert the distances into `[0, 1]` intensities.
  ///
  /// Returns [`MatchError::NoCandidates`] when no candidate has both
  /// coordinates and a finite, non-negative distance; callers are expected
  /// to switch to [`Self::fallback`] in that case.
  pub fn normalize(&self, candidates: &[Candidate]) -> Result<MatchResult, MatchError> {
    let (placed, mut warnings) = place(candidates);

    let usable = placed
      .iter()
      .enumerate()
      .filter_map(|(i, p)| p.candidate.usable_distance().map(|d| (i, d)))
      .collect::<Vec<_>>();

    let Some(&(first, _)) = usable.first() else {
      return Err(MatchError::NoCandidates);
    };

    let (min, max) = usable
      .iter()
      .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, d)| {
        (lo.min(d), hi.max(d))
      });
    let range = max - min;
    let degenerate = range <= 0.0;
    if degenerate {
      warnings.push(MatchWarning::DegenerateRange { distance: min });
    }

    let best = match self.policy {
      BestMatchPolicy::InputOrder => first,
      BestMatchPolicy::MinDistance => usable
        .iter()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(first, |&(i, _)| i),
    };

    let heatmap = placed
      .iter()
      .map(|p| HeatmapPoint {
        latitude: p.latitude,
        longitude: p.longitude,
        intensity: if degenerate {
          None
        } else {
          p.candidate
            .usable_distance()
            .map(|d| ((max - d) / range).clamp(0.0, 1.0))
        },
      })
      .collect();

    Ok(MatchResult {
      best_match: placed[best].candidate.camera_id.clone(),
      heatmap,
      mode: MatchMode::Ranked,
      warnings,
    })
  }

  /// Fallback mode with the thread-local RNG.
  pub fn fallback(&self, candidates: &[Candidate]) -> Result<MatchResult, MatchError> {
    self.fallback_with_rng(candidates, &mut rand::rng())
  }

  /// Unranked mode: placeholder intensities in `[0, 1)` and a uniformly
  /// random best match. Any distances on the input are ignored.
  pub fn fallback_with_rng<R: Rng>(
    &self,
    candidates: &[Candidate],
    rng: &mut R,
  ) -> Result<MatchResult, MatchError> {
    let (placed, warnings) = place(candidates);

    if placed.is_empty() {
      return Err(MatchError::NoCandidates);
    }

    let best = rng.random_range(0..placed.len());
    let heatmap = placed
      .iter()
      .map(|p| HeatmapPoint {
        latitude: p.latitude,
        longitude: p.longitude,
        intensity: Some(rng.random::<f64>()),
      })
      .collect();

    Ok(MatchResult {
      best_match: placed[best].candidate.camera_id.clone(),
      heatmap,
      mode: MatchMode::Fallback,
      warnings,
    })
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use rand::{SeedableRng, rngs::StdRng};

  use super::*;

  fn ranked(pairs: &[(&str, f64)]) -> Vec<Candidate> {
    pairs
      .iter()
      .enumerate()
      .map(|(i, (id, d))| Candidate::ranked(*id, 40.7 + i as f64 * 0.01, -73.9, *d))
      .collect()
  }

  fn intensities(result: &MatchResult) -> Vec<Option<f64>> {
    result.heatmap.iter().map(|p| p.intensity).collect()
  }

  #[test]
  fn evenly_spaced_distances() {
    let result = MatchEngine::new()
      .normalize(&ranked(&[("A", 2.0), ("B", 4.0), ("C", 6.0)]))
      .unwrap();

    assert_eq!(result.best_match, "A");
    assert_eq!(result.mode, MatchMode::Ranked);
    assert_eq!(intensities(&result), vec![Some(1.0), Some(0.5), Some(0.0)]);
    assert!(result.warnings.is_empty());
  }

  #[test]
  fn tied_distances_have_no_intensity() {
    let result = MatchEngine::new()
      .normalize(&ranked(&[("A", 5.0), ("B", 5.0)]))
      .unwrap();

    assert_eq!(result.best_match, "A");
    assert_eq!(intensities(&result), vec![None, None]);
    assert!(result.is_degenerate());
  }

  #[test]
  fn single_candidate_is_degenerate() {
    let result = MatchEngine::new().normalize(&ranked(&[("only", 0.3)])).unwrap();

    assert_eq!(result.best_match, "only");
    assert_eq!(intensities(&result), vec![None]);
    assert_eq!(
      result.warnings,
      vec![MatchWarning::DegenerateRange { distance: 0.3 }]
    );
  }

  #[test]
  fn extremes_map_to_one_and_zero() {
    let input = ranked(&[
      ("a", 0.41),
      ("b", 0.12),
      ("c", 0.77),
      ("d", 0.12),
      ("e", 0.5),
    ]);
    let result = MatchEngine::new().normalize(&input).unwrap();
    let values = intensities(&result);

    assert_eq!(values[1], Some(1.0));
    assert_eq!(values[3], Some(1.0));
    assert_eq!(values[2], Some(0.0));
    assert!(
      values
        .iter()
        .all(|v| v.is_some_and(|v| (0.0..=1.0).contains(&v)))
    );
  }

  #[test]
  fn output_follows_input_order() {
    let input = ranked(&[("far", 9.0), ("near", 1.0), ("mid", 5.0)]);
    let result = MatchEngine::new().normalize(&input).unwrap();

    let coords = result
      .heatmap
      .iter()
      .map(|p| (p.latitude, p.longitude))
      .collect::<Vec<_>>();
    let expected = input
      .iter()
      .map(|c| (c.latitude.unwrap(), c.longitude.unwrap()))
      .collect::<Vec<_>>();
    assert_eq!(coords, expected);
    assert_eq!(intensities(&result), vec![Some(0.0), Some(1.0), Some(0.5)]);
  }

  #[test]
  fn input_order_policy_trusts_upstream_sort() {
    let input = ranked(&[("far", 9.0), ("near", 1.0)]);

    let trusted = MatchEngine::new().normalize(&input).unwrap();
    assert_eq!(trusted.best_match, "far");

    let argmin = MatchEngine::with_policy(BestMatchPolicy::MinDistance)
      .normalize(&input)
      .unwrap();
    assert_eq!(argmin.best_match, "near");
  }

  #[test]
  fn min_distance_policy_takes_first_of_ties() {
    let input = ranked(&[("x", 3.0), ("y", 1.0), ("z", 1.0)]);
    let result = MatchEngine::with_policy(BestMatchPolicy::MinDistance)
      .normalize(&input)
      .unwrap();
    assert_eq!(result.best_match, "y");
  }

  #[test]
  fn unusable_distances_are_kept_without_intensity() {
    let mut input = ranked(&[("nan", 0.0), ("A", 2.0), ("neg", 0.0), ("B", 4.0)]);
    input[0].distance = Some(f64::NAN);
    input[2].distance = Some(-1.0);

    let result = MatchEngine::new().normalize(&input).unwrap();

    assert_eq!(result.heatmap.len(), 4);
    assert_eq!(result.best_match, "A");
    assert_eq!(
      intensities(&result),
      vec![None, Some(1.0), None, Some(0.0)]
    );
  }

  #[test]
  fn no_usable_distance_is_no_candidates() {
    let mut input = ranked(&[("a", 0.0), ("b", 0.0)]);
    input[0].distance = Some(f64::INFINITY);
    input[1].distance = None;

    assert_eq!(
      MatchEngine::new().normalize(&input),
      Err(MatchError::NoCandidates)
    );
    assert_eq!(MatchEngine::new().normalize(&[]), Err(MatchError::NoCandidates));
  }

  #[test]
  fn missing_coordinates_are_dropped_with_warning() {
    let mut input = ranked(&[("A", 2.0), ("broken", 3.0), ("C", 6.0)]);
    input[1].longitude = None;

    let result = MatchEngine::new().normalize(&input).unwrap();

    assert_eq!(result.heatmap.len(), 2);
    assert_eq!(intensities(&result), vec![Some(1.0), Some(0.0)]);
    assert_eq!(
      result.warnings,
      vec![MatchWarning::InvalidInput {
        camera_id: "broken".to_owned(),
        index: 1,
        coordinate: Coordinate::Longitude,
      }]
    );
  }

  #[test]
  fn dropped_first_candidate_moves_best_match() {
    let mut input = ranked(&[("A", 1.0), ("B", 2.0)]);
    input[0].latitude = Some(f64::NAN);

    let result = MatchEngine::new().normalize(&input).unwrap();
    assert_eq!(result.best_match, "B");
    assert_eq!(intensities(&result), vec![None]);
  }

  #[test]
  fn fallback_covers_every_candidate() {
    let input = vec![
      Candidate::unranked("X", 40.70, -73.99),
      Candidate::unranked("Y", 40.71, -73.98),
      Candidate::unranked("Z", 40.72, -73.97),
    ];
    let mut rng = StdRng::seed_from_u64(7);
    let result = MatchEngine::new().fallback_with_rng(&input, &mut rng).unwrap();

    assert_eq!(result.mode, MatchMode::Fallback);
    assert_eq!(result.heatmap.len(), 3);
    assert!(["X", "Y", "Z"].contains(&result.best_match.as_str()));
    assert!(
      result
        .heatmap
        .iter()
        .all(|p| p.intensity.is_some_and(|v| (0.0..1.0).contains(&v)))
    );
  }

  #[test]
  fn fallback_picks_uniformly() {
    let input = (0..4)
      .map(|i| Candidate::unranked(format!("cam-{i}"), 40.7, -73.9))
      .collect::<Vec<_>>();
    let engine = MatchEngine::new();
    let mut rng = StdRng::seed_from_u64(42);
    let trials = 8000;

    let mut counts: HashMap<String, usize> = HashMap::new();
    for _ in 0..trials {
      let result = engine.fallback_with_rng(&input, &mut rng).unwrap();
      *counts.entry(result.best_match).or_default() += 1;
    }

    assert_eq!(counts.len(), 4);
    let expected = trials / 4;
    for (id, count) in counts {
      assert!(
        count.abs_diff(expected) < expected * 15 / 100,
        "{id} picked {count} times, expected about {expected}"
      );
    }
  }

  #[test]
  fn fallback_on_empty_set_fails() {
    assert_eq!(MatchEngine::new().fallback(&[]), Err(MatchError::NoCandidates));

    let broken = Candidate {
      camera_id: "no-coords".to_owned(),
      latitude: None,
      longitude: None,
      distance: None,
    };
    assert_eq!(
      MatchEngine::new().fallback(&[broken]),
      Err(MatchError::NoCandidates)
    );
  }

  #[test]
  fn serializes_with_null_intensity() {
    let result = MatchEngine::new()
      .normalize(&[Candidate::ranked("A", 1.5, 2.5, 0.2)])
      .unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["bestMatch"], "A");
    assert_eq!(json["mode"], "ranked");
    assert!(json["heatmap"][0]["intensity"].is_null());
    assert_eq!(json["warnings"][0]["kind"], "degenerate_range");
  }

  #[test]
  fn policy_names_parse() {
    assert_eq!(
      "input_order".parse::<BestMatchPolicy>(),
      Ok(BestMatchPolicy::InputOrder)
    );
    assert_eq!(
      " MIN_DISTANCE ".parse::<BestMatchPolicy>(),
      Ok(BestMatchPolicy::MinDistance)
    );
    assert!("closest".parse::<BestMatchPolicy>().is_err());
  }

  #[test]
  fn seeded_sweep_keeps_ranked_shape() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let engine = MatchEngine::new();

    for round in 0..500 {
      let len: usize = rng.random_range(1..=40);
      // A narrow pool of distances makes ties and degenerate sets common.
      let pool: u32 = rng.random_range(1..=6);
      let mut distances = (0..len)
        .map(|_| f64::from(rng.random_range(0..pool)) * 0.125)
        .collect::<Vec<_>>();
      distances.sort_by(f64::total_cmp);
      let input = distances
        .iter()
        .enumerate()
        .map(|(i, d)| Candidate::ranked(format!("cam-{i}"), 40.0, -74.0, *d))
        .collect::<Vec<_>>();

      let result = engine.normalize(&input).unwrap();
      let values = intensities(&result);

      assert_eq!(result.heatmap.len(), input.len(), "round {round}");
      assert_eq!(result.best_match, "cam-0", "round {round}");

      let min = distances[0];
      let max = distances[len - 1];
      if min == max {
        assert!(values.iter().all(Option::is_none), "round {round}");
        assert!(result.is_degenerate(), "round {round}");
        continue;
      }

      for (d, v) in distances.iter().zip(&values) {
        let v = v.unwrap();
        assert!((0.0..=1.0).contains(&v), "round {round}: {v}");
        if *d == min {
          assert_eq!(v, 1.0, "round {round}");
        }
        if *d == max {
          assert_eq!(v, 0.0, "round {round}");
        }
      }
    }
  }
}
