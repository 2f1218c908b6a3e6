pub mod records_tests;
