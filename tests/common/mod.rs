//! Shared fixtures for integration tests
#![allow(dead_code)]

use asset_search::enrichment::EnrichmentPipeline;
use asset_search::indexing::{InMemoryAssetSource, ReindexConfig};
use asset_search::models::{
    ConditionSummary, IssuePriority, IssueStatus, IssueSummary, SearchResult, SearchableAsset,
};
use asset_search::search::{IndexManager, SearchConfig, SearchService};
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

/// Helper to build an asset with brand, type and description
pub fn asset(id: &str, name: &str, brand: &str, type_name: &str, status: &str, description: &str) -> SearchableAsset {
    let mut asset = SearchableAsset::new(id, name, status);
    asset.brand_name = Some(brand.to_string());
    asset.type_name = Some(type_name.to_string());
    asset.description = Some(description.to_string());
    asset.category_name = Some("Hardware".to_string());
    asset
}

pub fn issue(title: &str, priority: IssuePriority, status: IssueStatus) -> IssueSummary {
    IssueSummary::new(title, priority, status)
}

pub fn condition(value: &str, days_ago: i64) -> ConditionSummary {
    ConditionSummary {
        condition: value.to_string(),
        notes: String::new(),
        recorded_at: Utc::now() - Duration::days(days_ago),
        recorded_by: "inspector".to_string(),
    }
}

/// Five assets covering the issue and filter combinations used across tests:
///
/// | id  | brand  | status    | issues                          |
/// |-----|--------|-----------|---------------------------------|
/// | a-1 | Dell   | ACTIVE    | OPEN/HIGH, RESOLVED/LOW         |
/// | a-2 | Dell   | ACTIVE    | OPEN/MEDIUM, IN_PROGRESS/LOW    |
/// | a-3 | HP     | IN_REPAIR | OPEN/CRITICAL                   |
/// | a-4 | Lenovo | ACTIVE    | none                            |
/// | a-5 | Cisco  | RETIRED   | CLOSED/LOW                      |
pub fn fixture_assets() -> Vec<SearchableAsset> {
    let mut laptop = asset(
        "a-1",
        "Dell Laptop",
        "Dell",
        "Laptop",
        "ACTIVE",
        "Latitude business laptop for the sales team",
    );
    laptop.brand_description = Some("Dell Technologies computers".to_string());
    laptop.purchase_price = Some(1249.5);
    laptop.purchase_date = Utc.with_ymd_and_hms(2023, 3, 14, 0, 0, 0).single();
    laptop.issues = vec![
        issue("Battery drains quickly", IssuePriority::High, IssueStatus::Open),
        issue("Sticky space bar", IssuePriority::Low, IssueStatus::Resolved),
    ];
    laptop.condition_history = vec![condition("Fair", 2), condition("Good", 200)];

    let mut monitor = asset("a-2", "Dell Monitor", "Dell", "Monitor", "ACTIVE", "27 inch UltraSharp display");
    monitor.issues = vec![
        issue("Dead pixel cluster", IssuePriority::Medium, IssueStatus::Open),
        issue("Flickering at low brightness", IssuePriority::Low, IssueStatus::InProgress),
    ];

    let mut printer = asset(
        "a-3",
        "HP LaserJet Printer",
        "HP",
        "Printer",
        "IN_REPAIR",
        "Shared office printer on the third floor",
    );
    printer.issues = vec![issue("Paper jam sensor failure", IssuePriority::Critical, IssueStatus::Open)];
    printer.condition_history = vec![condition("Damaged", 1)];

    let mut thinkpad = asset(
        "a-4",
        "Lenovo ThinkPad",
        "Lenovo",
        "Laptop",
        "ACTIVE",
        "Engineering laptop with docking station",
    );
    thinkpad.condition_history = vec![condition("Good", 10)];

    let mut router = asset("a-5", "Cisco Router", "Cisco", "Network", "RETIRED", "Branch office edge router");
    router.issues = vec![issue("Firmware outdated", IssuePriority::Low, IssueStatus::Closed)];

    vec![laptop, monitor, printer, thinkpad, router]
}

/// Search service over an in-memory index populated with `assets`
pub async fn service_with(assets: Vec<SearchableAsset>, enrichment: EnrichmentPipeline) -> SearchService {
    service_with_config(assets, enrichment, SearchConfig::default()).await
}

pub async fn service_with_config(
    assets: Vec<SearchableAsset>,
    enrichment: EnrichmentPipeline,
    config: SearchConfig,
) -> SearchService {
    let store = Arc::new(IndexManager::in_memory(&config).unwrap());
    let source = Arc::new(InMemoryAssetSource::from_assets(assets));
    let service = SearchService::new(store, source, enrichment, config);
    service.reindex_all(&ReindexConfig::full_rebuild()).await.unwrap();
    service
}

/// Service over [`fixture_assets`] without enrichment
pub async fn fixture_service() -> SearchService {
    service_with(fixture_assets(), EnrichmentPipeline::disabled()).await
}

/// Result ids, sorted
pub fn sorted_ids(results: &[SearchResult]) -> Vec<String> {
    let mut ids: Vec<String> = results.iter().map(|r| r.id.clone()).collect();
    ids.sort();
    ids
}
