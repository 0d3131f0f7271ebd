//! Declarative macros for generating CLI parsing tests.
//!
//! This module provides macros to reduce boilerplate in CLI argument parsing tests.
//! Instead of writing repetitive test functions, you can declare the test cases
//! and let the macro generate the actual test code.
//!
//! The generated tests expect `Args` and `rstest` to be in scope.

/// Generate a test for default values when invoked with minimal args.
#[macro_export]
macro_rules! cli_defaults_test {
    (
        required_args: [$($req_arg:literal),*],
        defaults: {
            $($def_field:ident : $def_expected:expr),* $(,)?
        } $(,)?
    ) => {
        #[rstest]
        fn test_defaults() {
            let args = Args::try_parse_from(["epd_extract", $($req_arg),*]).unwrap();
            $(
                assert_eq!(args.$def_field, $def_expected,
                    concat!("Default value mismatch for field: ", stringify!($def_field)));
            )*
        }
    };
}

/// Generate a single CLI option test.
///
/// # Example
///
/// ```ignore
/// cli_option_test! {
///     test_name: test_tsv_format,
///     args: ["--format", "tsv"],
///     field: format,
///     expected: OutputFormat::Tsv,
/// }
/// ```
#[macro_export]
macro_rules! cli_option_test {
    (
        test_name: $test_name:ident,
        args: [$($arg:literal),+],
        field: $field:ident,
        expected: $expected:expr $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            let args = Args::try_parse_from([
                "epd_extract",
                $($arg),+
            ]).unwrap();
            assert_eq!(args.$field, $expected,
                concat!("Field ", stringify!($field), " mismatch"));
        }
    };
}

/// Generate a test that verifies parsing fails with specific invalid args.
#[macro_export]
macro_rules! cli_error_test {
    (
        test_name: $test_name:ident,
        args: [$($arg:literal),+] $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            let result = Args::try_parse_from([
                "epd_extract",
                $($arg),+
            ]);
            assert!(result.is_err());
        }
    };
}
