use crate::EmbedError;

/// Threshold for determining if L2 normalization is needed.
const L2_NORM_TOLERANCE: f32 = 1e-6;

/// Validate an embedding and make sure it is L2 normalized.
///
/// - empty vectors and vectors with NaN/inf components are rejected
/// - the length must equal `dim` exactly, the stored camera vectors have a
///   fixed width and pgvector refuses anything else
/// - already-normalized vectors are returned untouched
pub fn process_embedding(mut vec: Vec<f32>, dim: usize) -> Result<Vec<f32>, EmbedError> {
  if vec.is_empty() {
    return Err(EmbedError::InvalidResponse("empty embedding".to_owned()));
  }
  if vec.iter().any(|x| !x.is_finite()) {
    return Err(EmbedError::NonFinite);
  }
  if vec.len() != dim {
    return Err(EmbedError::Dimension {
      expected: dim,
      actual: vec.len(),
    });
  }

  let norm_sq: f32 = vec.iter().map(|x| x * x).sum();
  if (norm_sq - 1.0).abs() > L2_NORM_TOLERANCE {
    l2_normalize(&mut vec);
  }
  Ok(vec)
}

/// L2 normalize a vector in-place.
fn l2_normalize(vec: &mut [f32]) {
  let norm_sq: f32 = vec.iter().map(|x| x * x).sum();
  let norm = norm_sq.sqrt();
  if norm > 1e-12 {
    for x in vec.iter_mut() {
      *x /= norm;
    }
  }
}
