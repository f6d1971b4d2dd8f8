use crate::utils::error::{EtlError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified shuffle split: every class keeps roughly its share in both
/// halves. The test half has `ceil(test_size * n)` rows.
pub fn stratified_split(labels: &[usize], test_size: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(EtlError::validation(format!(
            "test_size must be strictly between 0 and 1, got {}",
            test_size
        )));
    }

    let n = labels.len();
    let n_classes = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (i, &label) in labels.iter().enumerate() {
        by_class[label].push(i);
    }
    by_class.retain(|members| !members.is_empty());

    if let Some(smallest) = by_class.iter().map(Vec::len).min() {
        if smallest < 2 {
            return Err(EtlError::validation(
                "the least populated class has only 1 member; stratified splitting needs at least 2",
            ));
        }
    }

    let n_test = (test_size * n as f64).ceil() as usize;
    let n_train = n - n_test;
    if n_test < by_class.len() || n_train < by_class.len() {
        return Err(EtlError::validation(format!(
            "a split of {} train / {} test rows cannot hold all {} classes",
            n_train,
            n_test,
            by_class.len()
        )));
    }

    // floor of each class's share, then largest remainders
    let shares: Vec<f64> = by_class
        .iter()
        .map(|members| n_test as f64 * members.len() as f64 / n as f64)
        .collect();
    let mut per_class: Vec<usize> = shares.iter().map(|s| s.floor() as usize).collect();
    let mut order: Vec<usize> = (0..by_class.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = shares[a] - shares[a].floor();
        let rb = shares[b] - shares[b].floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut remaining = n_test - per_class.iter().sum::<usize>();
    for &class in order.iter().cycle() {
        if remaining == 0 {
            break;
        }
        if per_class[class] < by_class[class].len() - 1 {
            per_class[class] += 1;
            remaining -= 1;
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for (members, take) in by_class.iter_mut().zip(&per_class) {
        members.shuffle(&mut rng);
        test.extend_from_slice(&members[..*take]);
        train.extend_from_slice(&members[*take..]);
    }
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Ok(SplitIndices { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<usize> {
        // 10 seasons of 20 teams, one winner each
        (0..200).map(|i| usize::from(i % 20 == 0)).collect()
    }

    #[test]
    fn test_split_sizes_and_stratification() {
        let labels = labels();
        let split = stratified_split(&labels, 0.2, 42).unwrap();

        assert_eq!(split.test.len(), 40);
        assert_eq!(split.train.len(), 160);
        let test_winners = split.test.iter().filter(|&&i| labels[i] == 1).count();
        let train_winners = split.train.iter().filter(|&&i| labels[i] == 1).count();
        assert_eq!(test_winners, 2);
        assert_eq!(train_winners, 8);
    }

    #[test]
    fn test_split_is_a_partition() {
        let labels = labels();
        let split = stratified_split(&labels, 0.2, 42).unwrap();

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_deterministic() {
        let labels = labels();
        assert_eq!(
            stratified_split(&labels, 0.2, 42).unwrap(),
            stratified_split(&labels, 0.2, 42).unwrap()
        );
    }

    #[test]
    fn test_split_rejects_singleton_class() {
        let mut labels = vec![0; 10];
        labels[3] = 1;
        assert!(stratified_split(&labels, 0.2, 42).is_err());
    }

    #[test]
    fn test_split_rejects_bad_test_size() {
        assert!(stratified_split(&labels(), 0.0, 42).is_err());
        assert!(stratified_split(&labels(), 1.0, 42).is_err());
    }
}
