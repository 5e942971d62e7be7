use crate::habitat::Coord;

/// Normalized inverse-distance weights of `targets` seen from `origin`.
///
/// If some targets share the origin's cell their distance is zero; those
/// targets then split the whole weight evenly and all others get none.
/// Returns an empty vector for no targets.
pub fn inverse_distance_weights(origin: Coord, targets: &[Coord]) -> Vec<f64> {
    let n_coincident = targets.iter().filter(|&&t| t == origin).count();
    let mut weights: Vec<f64> = if n_coincident > 0 {
        targets
            .iter()
            .map(|&t| if t == origin { 1.0 } else { 0.0 })
            .collect()
    } else {
        targets.iter().map(|t| 1.0 / origin.distance(t)).collect()
    };

    let sum: f64 = weights.iter().sum();
    if sum > 0.0 {
        weights.iter_mut().for_each(|w| *w /= sum);
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let origin = Coord::new(5, 5);
        let targets = [
            Coord::new(6, 5),
            Coord::new(7, 7),
            Coord::new(2, 9),
            Coord::new(5, 4),
        ];
        let weights = inverse_distance_weights(origin, &targets);
        let sum: f64 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(weights[0] > weights[1]);
        assert_eq!(weights[0], weights[3]);
    }

    #[test]
    fn coincident_targets_take_all_weight() {
        let origin = Coord::new(1, 1);
        let targets = [Coord::new(2, 1), Coord::new(1, 1), Coord::new(1, 1)];
        let weights = inverse_distance_weights(origin, &targets);
        assert_eq!(weights, vec![0.0, 0.5, 0.5]);
    }

    #[test]
    fn no_targets_gives_no_weights() {
        assert!(inverse_distance_weights(Coord::new(0, 0), &[]).is_empty());
    }
}
