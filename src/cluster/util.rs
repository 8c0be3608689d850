use crate::error::{Error, Result, Stage};

#[inline]
pub(crate) fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Check that every point has the same, nonzero dimension and only finite values.
///
/// Returns the dimension.
pub(crate) fn check_points(data: &[Vec<f32>], stage: Stage) -> Result<usize> {
    let d = data.first().map_or(0, Vec::len);
    if d == 0 {
        return Err(Error::invalid_input(stage, "points have no dimensions"));
    }
    for (i, point) in data.iter().enumerate() {
        if point.len() != d {
            return Err(Error::invalid_input(
                stage,
                format!("point {i} has dimension {}, expected {d}", point.len()),
            ));
        }
        if point.iter().any(|v| !v.is_finite()) {
            return Err(Error::invalid_input(
                stage,
                format!("point {i} has a non-finite coordinate"),
            ));
        }
    }
    Ok(d)
}
