pub mod clock;
pub mod http_test_utils;
pub mod test_logging;
