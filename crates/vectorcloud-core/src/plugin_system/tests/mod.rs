
mod manager_tests;
