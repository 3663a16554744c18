use crate::math::GridPos;

/// Collapse a dense polyline to its turning points.
///
/// Single O(n) pass: an interior point survives only when the unit step
/// direction (sign of Δx, sign of Δz) changes between its incoming and
/// outgoing edge. First and last points are always kept; inputs of length
/// ≤ 2 pass through unchanged. Deterministic and idempotent.
pub fn simplify_path(path: &[GridPos]) -> Vec<GridPos> {
    if path.len() <= 2 {
        return path.to_vec();
    }

    let mut simplified = Vec::with_capacity(path.len() / 2 + 2);
    simplified.push(path[0]);

    for i in 1..path.len() - 1 {
        let incoming = path[i - 1].step_sign(path[i]);
        let outgoing = path[i].step_sign(path[i + 1]);
        if incoming != outgoing {
            simplified.push(path[i]);
        }
    }

    simplified.push(path[path.len() - 1]);
    simplified
}
