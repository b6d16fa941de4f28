//! Property-based tests using proptest
//!
//! These tests verify name resolution over paginated listings, short-name
//! derivation, receive clamping and query validation using randomized inputs.

use cloudgate::error::ApiError;
use cloudgate::resource::resolver::find_topic_arn;
use cloudgate::resource::{short_name, BackendResult};
use cloudgate::routes::sqs::receive_limits;
use cloudgate::validate::QueryParams;
use futures::stream::{self, StreamExt};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Generate topic names as SNS allows them
fn arb_topic_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,40}"
}

/// Generate a listing: topic names split into pages
fn arb_listing() -> impl Strategy<Value = (Vec<String>, usize)> {
    (prop::collection::vec(arb_topic_name(), 0..40), 1usize..6)
}

fn topic_arn(region: &str, name: &str) -> String {
    format!("arn:aws:sns:{}:000000000000:{}", region, name)
}

fn paginate(names: &[String], page_size: usize) -> Vec<Vec<String>> {
    names
        .chunks(page_size)
        .map(|chunk| chunk.iter().map(|n| topic_arn("us-east-1", n)).collect())
        .collect()
}

/// Resolve `name` over `pages`, returning the result and how many pages were pulled
fn resolve(pages: Vec<Vec<String>>, name: &str) -> (Option<String>, usize) {
    let pulled = AtomicUsize::new(0);
    let stream = stream::iter(pages.into_iter().map(Ok::<_, cloudgate::error::BackendError>))
        .inspect(|_| {
            pulled.fetch_add(1, Ordering::SeqCst);
        });

    let found: BackendResult<Option<String>> =
        tokio_test::block_on(find_topic_arn(stream, name));
    (found.unwrap(), pulled.load(Ordering::SeqCst))
}

proptest! {
    /// The short name of an ARN is everything after its last colon
    #[test]
    fn short_name_recovers_topic_name(
        name in arb_topic_name(),
        region in "[a-z]{2}-[a-z]{4,9}-[1-3]"
    ) {
        let arn = topic_arn(&region, &name);
        prop_assert_eq!(short_name(&arn), name.as_str());
    }

    /// Short names never contain a colon
    #[test]
    fn short_name_has_no_colon(arn in ".*") {
        prop_assert!(!short_name(&arn).contains(':'));
    }

    /// A listed topic is always found, and the ARN returned names it exactly
    #[test]
    fn listed_topic_is_found(
        (names, page_size) in arb_listing(),
        target in arb_topic_name(),
        position in any::<prop::sample::Index>()
    ) {
        let mut names = names;
        let at = position.index(names.len() + 1);
        names.insert(at, target.clone());

        let (found, _) = resolve(paginate(&names, page_size), &target);

        let arn = found.expect("listed topic should resolve");
        prop_assert_eq!(short_name(&arn), target.as_str());
    }

    /// Resolution stops at the page holding the first match
    #[test]
    fn resolution_stops_at_first_match(
        (names, page_size) in arb_listing(),
        target in arb_topic_name()
    ) {
        let pages = paginate(&names, page_size);
        let first_hit = names.iter().position(|n| *n == target);

        let (found, pulled) = resolve(pages.clone(), &target);

        match first_hit {
            Some(index) => {
                prop_assert_eq!(found, Some(topic_arn("us-east-1", &target)));
                prop_assert_eq!(pulled, index / page_size + 1);
            }
            None => {
                prop_assert_eq!(found, None);
                prop_assert_eq!(pulled, pages.len());
            }
        }
    }

    /// Absence is only reported after every page has been seen
    #[test]
    fn absence_scans_every_page(
        (names, page_size) in arb_listing()
    ) {
        // Generated names never contain a dot
        let target = "not.listed";
        let pages = paginate(&names, page_size);

        let (found, pulled) = resolve(pages.clone(), target);

        prop_assert_eq!(found, None);
        prop_assert_eq!(pulled, pages.len());
    }

    /// A name that is only a prefix or suffix of a listed name does not match
    #[test]
    fn match_is_exact(name in "[a-z]{2,20}") {
        let listed = vec![format!("{}-dlq", name), format!("prod-{}", name), name.to_uppercase()];
        let pages = paginate(&listed, 2);

        let (found, _) = resolve(pages, &name);

        prop_assert_eq!(found, None);
    }

    /// Receive limits always land inside the provider's bounds
    #[test]
    fn receive_limits_are_clamped(
        max_number in proptest::option::of(any::<i64>()),
        wait_time_seconds in proptest::option::of(any::<i64>())
    ) {
        let (max, wait) = receive_limits(max_number, wait_time_seconds);
        prop_assert!((1..=10).contains(&max));
        prop_assert!((0..=20).contains(&wait));
    }

    /// In-range values pass through untouched
    #[test]
    fn receive_limits_keep_valid_values(max_number in 1i64..=10, wait_time_seconds in 0i64..=20) {
        prop_assert_eq!(
            receive_limits(Some(max_number), Some(wait_time_seconds)),
            (max_number, wait_time_seconds)
        );
    }

    /// Every missing parameter is reported, in the order it was asked for
    #[test]
    fn require_reports_all_missing(present in prop::collection::vec(any::<bool>(), 3)) {
        let names = ["table_name", "partition_key_name", "partition_key_value"];
        let query: Vec<String> = names
            .iter()
            .zip(&present)
            .filter(|(_, present)| **present)
            .map(|(name, _)| format!("{}=v", name))
            .collect();
        let query = QueryParams::parse(Some(&query.join("&")));

        let expected: Vec<String> = names
            .iter()
            .zip(&present)
            .filter(|(_, present)| !**present)
            .map(|(name, _)| name.to_string())
            .collect();

        match query.require(names) {
            Ok(values) => {
                prop_assert!(expected.is_empty());
                prop_assert_eq!(values, ["v", "v", "v"]);
            }
            Err(ApiError::MissingParameter(missing)) => prop_assert_eq!(missing, expected),
            Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
        }
    }

    /// Integer query parameters parse any decimal i64
    #[test]
    fn query_integer_parses_decimal(n in any::<i64>()) {
        let query = QueryParams::parse(Some(&format!("max_number={}", n)));
        prop_assert_eq!(query.integer("max_number").unwrap(), Some(n));
    }
}
