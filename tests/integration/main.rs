//! Integration tests for ls-crawler

mod crawl_tests;
