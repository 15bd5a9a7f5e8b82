use portal_core::booking::{BOOKING_ID_LEN, BookingId, accept_input, is_valid, normalize};
use portal_core::error::LoginError;
use proptest::prelude::*;
use proptest::test_runner::Config;

proptest! {
    #![proptest_config(Config::with_cases(512))]

    #[test]
    fn accepted_input_is_short_and_clean(raw in any::<String>()) {
        if let Some(value) = accept_input(&raw) {
            prop_assert!(value.len() <= BOOKING_ID_LEN);
            prop_assert!(value.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn normalize_only_emits_uppercase_alphanumerics(raw in "\\PC{0,32}") {
        let value = normalize(&raw);
        prop_assert!(value.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        prop_assert_eq!(normalize(&value), value.clone());
    }

    #[test]
    fn dropped_input_was_overlong(raw in "[a-zA-Z0-9 _-]{0,16}") {
        let kept = raw.chars().filter(char::is_ascii_alphanumeric).count();
        prop_assert_eq!(accept_input(&raw).is_some(), kept <= BOOKING_ID_LEN);
    }

    #[test]
    fn validator_matches_definition(raw in any::<String>()) {
        let expected = raw.chars().count() == BOOKING_ID_LEN
            && raw.chars().all(|c| c.is_ascii_alphanumeric());
        prop_assert_eq!(is_valid(&raw), expected);
    }

    #[test]
    fn eight_alphanumerics_always_parse(raw in "[a-zA-Z0-9]{8}") {
        prop_assert!(is_valid(&raw));
        let id = BookingId::parse(&raw);
        prop_assert!(id.is_ok());
        if let Ok(id) = id {
            prop_assert_eq!(id.as_str(), raw.to_ascii_uppercase());
        }
    }

    #[test]
    fn wrong_lengths_are_invalid_shape(raw in "[A-Z0-9]{1,7}|[A-Z0-9]{9,20}") {
        prop_assert_eq!(BookingId::parse(&raw), Err(LoginError::InvalidShape));
    }
}
