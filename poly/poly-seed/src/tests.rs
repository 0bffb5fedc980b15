//! Tests for seed primitives.

use chrono::NaiveDate;

use crate::{
    Error, LITERAL_SUFFIX, MACRO_NAME, PolyStream, RngSource, Seed, SeedSource, default_seed,
    default_seed_at, squares32,
};

// ============================================================================
// Seed literals
// ============================================================================

#[test]
fn literal_has_ull_suffix() {
    assert_eq!(Seed::new(1234567890).to_literal(), "1234567890ull");
    assert_eq!(Seed::new(0).to_literal(), format!("0{LITERAL_SUFFIX}"));
}

#[test]
fn literal_covers_full_range() {
    assert_eq!(Seed::new(u64::MAX).to_literal(), "18446744073709551615ull");
}

#[test]
fn display_is_plain_decimal() {
    assert_eq!(Seed::new(42).to_string(), "42");
}

#[test]
fn parse_accepts_suffixes() {
    for input in ["77", "77ull", "77ULL", "77llu", "77LLU", "77u", "77U", " 77ull "] {
        assert_eq!(input.parse::<Seed>(), Ok(Seed::new(77)), "input {input:?}");
    }
}

#[test]
fn parse_round_trips_literal() {
    let seed = Seed::new(18446744073709551615);
    assert_eq!(seed.to_literal().parse::<Seed>(), Ok(seed));
}

#[test]
fn parse_rejects_empty() {
    assert_eq!("".parse::<Seed>(), Err(Error::EmptyLiteral));
    assert_eq!("ull".parse::<Seed>(), Err(Error::EmptyLiteral));
}

#[test]
fn parse_rejects_non_digits() {
    for input in ["-1", "0x10", "12ll", "1_000", "seed"] {
        assert_eq!(
            input.parse::<Seed>(),
            Err(Error::InvalidLiteral(input.into())),
        );
    }
}

#[test]
fn parse_rejects_overflow() {
    assert_eq!(
        "18446744073709551616ull".parse::<Seed>(),
        Err(Error::LiteralOverflow("18446744073709551616ull".into())),
    );
}

#[test]
fn macro_name_matches_header() {
    assert_eq!(MACRO_NAME, "__POLY_RANDOM_SEED__");
}

// ============================================================================
// Serde
// ============================================================================

#[test]
fn deserialize_from_integer_or_literal() {
    let from_int: Seed = serde_json::from_str("1234567890").unwrap();
    let from_lit: Seed = serde_json::from_str("\"1234567890ull\"").unwrap();
    assert_eq!(from_int, Seed::new(1234567890));
    assert_eq!(from_lit, from_int);
}

#[test]
fn deserialize_toml_above_i64() {
    #[derive(serde::Deserialize)]
    struct Doc {
        seed: Seed,
    }

    let doc: Doc = toml::from_str("seed = \"18446744073709551615ull\"").unwrap();
    assert_eq!(doc.seed, Seed::new(u64::MAX));

    let doc: Doc = toml::from_str("seed = 99").unwrap();
    assert_eq!(doc.seed, Seed::new(99));
}

#[test]
fn deserialize_rejects_bad_literal() {
    assert!(serde_json::from_str::<Seed>("\"abc\"").is_err());
    assert!(serde_json::from_str::<Seed>("-5").is_err());
}

#[test]
fn serialize_as_integer() {
    assert_eq!(serde_json::to_string(&Seed::new(7)).unwrap(), "7");
}

// ============================================================================
// Sources
// ============================================================================

#[test]
fn closure_is_a_source() {
    let mut next = 10;
    let mut source = move || {
        next += 1;
        next
    };
    assert_eq!(source.draw(), 11);
    assert_eq!(source.draw(), 12);
}

#[test]
fn seeded_rng_source_is_reproducible() {
    let mut a = RngSource::seeded(7);
    let mut b = RngSource::seeded(7);
    let drawn_a: Vec<u64> = (0..4).map(|_| a.draw()).collect();
    let drawn_b: Vec<u64> = (0..4).map(|_| b.draw()).collect();
    assert_eq!(drawn_a, drawn_b);
}

#[test]
fn seeded_rng_sources_diverge() {
    let mut a = RngSource::seeded(1);
    let mut b = RngSource::seeded(2);
    assert_ne!(a.draw(), b.draw());
}

// ============================================================================
// Squares
// ============================================================================

#[test]
fn squares_known_vectors() {
    let seed = 1234567890;
    let expected = [2482572298, 2023382698, 4249908070, 1198281695];
    for (counter, want) in expected.into_iter().enumerate() {
        assert_eq!(squares32(counter as u64, seed), want);
    }
}

#[test]
fn squares_zero_seed_is_zero() {
    assert_eq!(squares32(0, 0), 0);
    assert_eq!(squares32(5, 0), 0);
}

#[test]
fn stream_consumes_counters_in_order() {
    let mut stream = PolyStream::new(Seed::new(1234567890));
    assert_eq!(stream.uint(), 2482572298);
    assert_eq!(stream.uint(), 2023382698);
    assert_eq!(stream.counter(), 2);

    let mut offset = PolyStream::starting_at(Seed::new(1234567890), 2);
    assert_eq!(offset.uint(), 4249908070);
}

#[test]
fn stream_ull_uses_two_counters() {
    let mut stream = PolyStream::new(Seed::new(1234567890));
    assert_eq!(stream.ull(), 10662566831888948906);
    assert_eq!(stream.counter(), 2);
}

#[test]
fn stream_random_matches_simple_example() {
    // What `poly_random(10000)` prints as the first expansion.
    let mut stream = PolyStream::new(Seed::new(1234567890));
    assert_eq!(stream.random(10000), Ok(2298));
}

#[test]
fn stream_random_rejects_zero() {
    let mut stream = PolyStream::new(Seed::new(1));
    assert_eq!(stream.random(0), Err(Error::ZeroModulus));
    assert_eq!(stream.counter(), 0);
}

#[test]
fn stream_unit_values_in_range() {
    let mut stream = PolyStream::new(Seed::new(987654321));
    for _ in 0..64 {
        let f = stream.float();
        let d = stream.double();
        assert!((0.0..=1.0).contains(&f), "float {f}");
        assert!((0.0..=1.0).contains(&d), "double {d}");
    }
}

#[test]
fn stream_normal_is_finite() {
    let mut stream = PolyStream::new(Seed::new(0));
    // Zero seed yields zero doubles; the log guard keeps this finite.
    let value = stream.normal(1.0, 0.0);
    assert!(value.is_finite());
    assert_eq!(stream.counter(), 4);
}

// ============================================================================
// Timestamp seed
// ============================================================================

#[test]
fn default_seed_reference_value() {
    // Day 16, month 10, year digits reversed to 62, time digits reversed.
    let seed = default_seed("Oct 16 2026", "12:34:56").unwrap();
    assert_eq!(seed, Seed::new(62_102_254_321));
}

#[test]
fn default_seed_space_padded_day() {
    let seed = default_seed("Jan  5 2024", "00:00:00").unwrap();
    assert_eq!(seed, Seed::new(42 * 1_000_000_000 + 10_000_000 + 500_000));
}

#[test]
fn default_seed_all_months() {
    let months = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    for (i, month) in months.iter().enumerate() {
        let seed = default_seed(&format!("{month} 10 2000"), "00:00:00").unwrap();
        assert_eq!(seed.get(), 10_000_000 * (i as u64 + 1) + 1_000_000);
    }
}

#[test]
fn default_seed_rejects_malformed() {
    assert!(matches!(
        default_seed("October 16 2026", "12:34:56"),
        Err(Error::InvalidDate(_))
    ));
    assert!(matches!(
        default_seed("Foo 16 2026", "12:34:56"),
        Err(Error::InvalidDate(_))
    ));
    assert!(matches!(
        default_seed("Oct 1x 2026", "12:34:56"),
        Err(Error::InvalidDate(_))
    ));
    assert!(matches!(
        default_seed("Oct 16 2026", "12-34-56"),
        Err(Error::InvalidTime(_))
    ));
    assert!(matches!(
        default_seed("Oct 16 2026", "12:3a:56"),
        Err(Error::InvalidTime(_))
    ));
}

#[test]
fn default_seed_at_formats_like_macros() {
    let at = NaiveDate::from_ymd_opt(2026, 10, 16)
        .unwrap()
        .and_hms_opt(12, 34, 56)
        .unwrap();
    assert_eq!(default_seed_at(at), default_seed("Oct 16 2026", "12:34:56"));

    let padded = NaiveDate::from_ymd_opt(2024, 1, 5)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(default_seed_at(padded), default_seed("Jan  5 2024", "00:00:00"));
}
