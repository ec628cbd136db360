//! Record generation: counts, references, identifiers and amounts.

use daybatch_core::{
    config::GeneratorConfig,
    context::ExecutionContext,
    error::GenError,
    generator::RawDataGenerator,
    record::TransactionType,
    types::CountRange,
    vocabulary::Vocabulary,
};
use std::collections::HashSet;

const FIVE_NAMES: [&str; 5] = [
    "Ada Lovelace",
    "Alan Turing",
    "Grace Hopper",
    "Edsger Dijkstra",
    "Barbara Liskov",
];

fn generator_with(names: &[&str], config: GeneratorConfig) -> RawDataGenerator {
    RawDataGenerator::new(
        config,
        Vocabulary::from_lines("names", names.iter().copied()).unwrap(),
        Vocabulary::from_lines("languages", ["en", "es", "pt"]).unwrap(),
    )
    .unwrap()
}

fn pool(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("Test User{i}")).collect()
}

#[test]
fn five_user_scenario_on_the_fixture_day() {
    let g = generator_with(&FIVE_NAMES, GeneratorConfig::default());
    let ctx = ExecutionContext::fixture();

    for seed in 0..50 {
        let data = g.generate_with_count(&ctx, seed, 5).unwrap();

        assert_eq!(data.users.len(), 5);
        let ids: Vec<u64> = data.users.iter().map(|u| u.id.raw()).collect();
        assert_eq!(ids, (2024121201..=2024121205).collect::<Vec<_>>());

        assert_eq!(data.preferences.len(), 5);
        for (p, u) in data.preferences.iter().zip(&data.users) {
            assert_eq!(p.user_id, u.id);
        }

        // 0..=3 per user today, 1..=4 for each of the two prior days.
        let total = data.transactions.len();
        assert!((2..=3 * 5 + 4 + 4).contains(&total), "seed {seed}: {total} transactions");

        let violations = data.verify(g.config());
        assert!(violations.is_empty(), "seed {seed}: {violations:?}");
    }
}

#[test]
fn every_name_is_used_at_most_once() {
    let g = generator_with(&FIVE_NAMES, GeneratorConfig::default());
    let data = g.generate_with_count(&ExecutionContext::fixture(), 3, 5).unwrap();
    let names: HashSet<&str> = data.users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names.len(), 5);
    assert_eq!(data.users[0].email, data.users[0].name.to_lowercase().replace(' ', ".") + "@example.com");
}

#[test]
fn small_name_pool_aborts_before_any_record() {
    let g = generator_with(&FIVE_NAMES[..3], GeneratorConfig::default());
    let err = g.generate_with_count(&ExecutionContext::fixture(), 1, 5).unwrap_err();
    assert!(matches!(
        err,
        GenError::InsufficientNames { requested: 5, available: 3 }
    ));
}

#[test]
fn drawn_user_count_stays_in_configured_range() {
    let names = pool(40);
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let g = generator_with(&refs, GeneratorConfig::default());
    let ctx = ExecutionContext::fixture();
    for seed in 0..30 {
        let data = g.generate(&ctx, seed).unwrap();
        assert!((5..=30).contains(&data.users.len()));
        assert!(data.verify(g.config()).is_empty());
    }
}

#[test]
fn identifiers_unique_within_each_record_set() {
    let names = pool(30);
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let g = generator_with(&refs, GeneratorConfig::default());
    let data = g.generate_with_count(&ExecutionContext::fixture(), 11, 30).unwrap();

    let users: HashSet<_> = data.users.iter().map(|u| u.id).collect();
    let prefs: HashSet<_> = data.preferences.iter().map(|p| p.id).collect();
    let txns: HashSet<_> = data.transactions.iter().map(|t| t.id).collect();
    assert_eq!(users.len(), data.users.len());
    assert_eq!(prefs.len(), data.preferences.len());
    assert_eq!(txns.len(), data.transactions.len());

    // The transaction counter runs across today's and both prior-day passes.
    let seqs: Vec<u32> = data.transactions.iter().map(|t| t.id.sequence()).collect();
    assert_eq!(seqs, (1..=data.transactions.len() as u32).collect::<Vec<_>>());
}

#[test]
fn prior_day_transactions_reference_prior_day_users() {
    let g = generator_with(&FIVE_NAMES, GeneratorConfig::default());
    let ctx = ExecutionContext::fixture();
    let prior = [ctx.days_ago(1), ctx.days_ago(2)];
    let user_ids: HashSet<_> = {
        let data = g.generate_with_count(&ctx, 5, 5).unwrap();
        data.users.iter().map(|u| u.id).collect()
    };

    for seed in 0..20 {
        let data = g.generate_with_count(&ctx, seed, 5).unwrap();
        let mut per_day = [0usize; 2];
        for t in &data.transactions {
            assert_eq!(t.id.date(), Some(ctx.date()), "ids are always today's");
            if t.transaction_date == ctx.date() {
                assert!(user_ids.contains(&t.user_id));
            } else {
                let slot = prior.iter().position(|d| *d == t.transaction_date).unwrap();
                assert_eq!(t.user_id.date(), Some(prior[slot]));
                assert!((1..=4).contains(&t.user_id.sequence()));
                per_day[slot] += 1;
            }
        }
        assert!(per_day.iter().all(|n| (1..=4).contains(n)), "seed {seed}: {per_day:?}");
    }
}

#[test]
fn amounts_carry_sign_of_type_and_stay_in_bounds() {
    let names = pool(30);
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let g = generator_with(&refs, GeneratorConfig::default());
    let ctx = ExecutionContext::fixture();
    let mut kinds = HashSet::new();
    for seed in 0..10 {
        for t in g.generate_with_count(&ctx, seed, 30).unwrap().transactions {
            let cents = t.amount.cents();
            match t.kind {
                TransactionType::Deposit => assert!((1..=10_000).contains(&cents)),
                TransactionType::Withdrawal => assert!((-10_000..=-1).contains(&cents)),
            }
            let text = t.amount.to_string();
            let decimals = text.split('.').nth(1).unwrap();
            assert_eq!(decimals.len(), 2, "{text}");
            kinds.insert(t.kind);
        }
    }
    assert_eq!(kinds.len(), 2, "both deposits and withdrawals should appear");
}

#[test]
fn sequence_limit_is_fatal() {
    let config = GeneratorConfig {
        transactions_per_user: CountRange::new(3, 3),
        ..GeneratorConfig::default()
    };
    let names = pool(40);
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let g = generator_with(&refs, config);

    // 34 users * 3 = 102 current-day transactions, past the 99 limit.
    let err = g.generate_with_count(&ExecutionContext::fixture(), 1, 34).unwrap_err();
    assert!(matches!(err, GenError::SequenceExhausted { sequence: 100, .. }));

    // 33 * 3 = 99 fits today, but the prior-day passes push past it.
    let err = g.generate_with_count(&ExecutionContext::fixture(), 1, 33).unwrap_err();
    assert!(matches!(err, GenError::SequenceExhausted { .. }));
}

#[test]
fn more_than_ninety_nine_users_is_fatal() {
    let names = pool(120);
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let g = generator_with(&refs, GeneratorConfig::default());
    let err = g.generate_with_count(&ExecutionContext::fixture(), 1, 100).unwrap_err();
    assert!(matches!(err, GenError::SequenceExhausted { .. }));
}

#[test]
fn out_of_bounds_config_is_refused_up_front() {
    let vocab = || {
        (
            Vocabulary::from_lines("names", FIVE_NAMES).unwrap(),
            Vocabulary::from_lines("languages", ["en"]).unwrap(),
        )
    };

    let (names, languages) = vocab();
    let big_amounts = GeneratorConfig {
        amount_cents: CountRange::new(20_000, 30_000),
        ..GeneratorConfig::default()
    };
    let err = RawDataGenerator::new(big_amounts, names, languages).err();
    assert!(matches!(err, Some(GenError::InvalidConfig(_))));

    let (names, languages) = vocab();
    let endless_window = GeneratorConfig {
        preference_window_secs: u64::MAX,
        ..GeneratorConfig::default()
    };
    let err = RawDataGenerator::new(endless_window, names, languages).err();
    assert!(matches!(err, Some(GenError::InvalidConfig(_))));
}

#[test]
fn widest_preference_window_stays_on_schedule() {
    let config = GeneratorConfig {
        preference_window_secs: 24 * 60 * 60,
        ..GeneratorConfig::default()
    };
    let g = generator_with(&FIVE_NAMES, config);
    for seed in 0..10 {
        let data = g.generate_with_count(&ExecutionContext::fixture(), seed, 5).unwrap();
        assert!(data.verify(g.config()).is_empty());
    }
}

#[test]
fn loads_vocabularies_from_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("random_names.txt"), FIVE_NAMES.join("\n") + "\n").unwrap();
    std::fs::write(dir.path().join("languages.txt"), "en\nde\n").unwrap();
    let g = RawDataGenerator::from_data_dir(GeneratorConfig::default(), dir.path()).unwrap();
    let data = g.generate_with_count(&ExecutionContext::fixture(), 2, 5).unwrap();
    assert!(data
        .preferences
        .iter()
        .all(|p| p.preferred_language == "en" || p.preferred_language == "de"));
}

#[test]
fn empty_language_file_aborts() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("random_names.txt"), "Ada Lovelace\n").unwrap();
    std::fs::write(dir.path().join("languages.txt"), "").unwrap();
    let err = RawDataGenerator::from_data_dir(GeneratorConfig::default(), dir.path()).err();
    assert!(matches!(err, Some(GenError::EmptyVocabulary { .. })));
}
