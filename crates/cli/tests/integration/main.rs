mod common;
mod generate_tests;
mod inspect_tests;
mod validate_tests;
