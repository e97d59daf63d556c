//! Integration tests for crawling, classification and publishing

mod client_plate;
mod crawl_publish;
mod snapshot_roundtrip;
