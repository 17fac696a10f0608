mod service_tests;
mod test_helpers;
