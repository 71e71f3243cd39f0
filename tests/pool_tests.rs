use std::collections::HashSet;

use command_quiz::error::PoolError;
use command_quiz::quiz::CommandPool;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn pool_of(size: usize) -> CommandPool {
    CommandPool::new((0..size).map(|i| format!("command-{i}")).collect())
}

#[test]
fn select_then_commit_shrinks_by_n_for_every_valid_n() {
    for total in 1..=8 {
        for n in 1..=total {
            let mut pool = pool_of(total);
            let mut rng = StdRng::seed_from_u64((total * 31 + n) as u64);
            let picked = pool.select_unused_with(n, &mut rng).unwrap();

            let distinct: HashSet<_> = picked.iter().collect();
            assert_eq!(distinct.len(), n, "indices must be distinct");
            assert!(picked.iter().all(|&i| i < total));

            pool.commit_used(&picked);
            assert_eq!(pool.remaining(), total - n);
        }
    }
}

#[test]
fn committed_indices_never_reappear_until_reset() {
    let mut pool = pool_of(10);
    let mut rng = StdRng::seed_from_u64(9);
    let mut seen = HashSet::new();

    while pool.remaining() > 0 {
        let n = pool.remaining().min(3);
        let picked = pool.select_unused_with(n, &mut rng).unwrap();
        for i in &picked {
            assert!(seen.insert(*i), "index {i} was selected twice");
        }
        pool.commit_used(&picked);
    }

    assert_eq!(seen.len(), 10);
    assert!(pool.is_exhausted());
    assert_eq!(
        pool.select_unused(1),
        Err(PoolError::InvalidSelection { requested: 1, available: 0 })
    );
}

#[test]
fn reset_after_exhaustion_restores_everything() {
    let mut pool = CommandPool::new(vec!["ls".into(), "cd".into(), "grep".into(), "chmod".into()]);
    pool.commit_used(&[0, 1, 2, 3]);
    assert_eq!(pool.remaining(), 0);
    assert_eq!(pool.progress(), 1.0);

    pool.reset();
    assert_eq!(pool.remaining(), 4);
    assert_eq!(pool.total(), 4);
    assert_eq!(pool.progress(), 0.0);
}

#[test]
fn load_replaces_commands_and_availability() {
    let mut pool = pool_of(5);
    pool.commit_used(&[0, 1]);
    pool.load(vec!["tar".into(), "ssh".into()]);
    assert_eq!(pool.total(), 2);
    assert_eq!(pool.remaining(), 2);
    assert_eq!(pool.commands_for(&[1, 0, 7]), vec!["ssh", "tar"]);
}

#[test]
fn selection_draws_from_whole_available_set() {
    // With enough draws every available index shows up at least once.
    let mut pool = pool_of(6);
    pool.commit_used(&[2]);
    let mut rng = StdRng::seed_from_u64(1);
    let mut seen = HashSet::new();
    for _ in 0..200 {
        seen.extend(pool.select_unused_with(1, &mut rng).unwrap());
    }
    let expected: HashSet<usize> = [0, 1, 3, 4, 5].into_iter().collect();
    assert_eq!(seen, expected);
}
