mod common;
mod cookie_tests;
mod profile_tests;
