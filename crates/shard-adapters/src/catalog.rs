use shard_core::{Provider, ProviderCategory, SyncDirection};

/// Static rate-limit/category table, one row per supported vendor, matching
/// the external interface's rate-limit table.
pub fn provider_catalog() -> Vec<Provider> {
    vec![
        Provider {
            provider_id: "salesforce".into(),
            display_name: "Salesforce".into(),
            category: ProviderCategory::Crm,
            direction: SyncDirection::Bidirectional,
            rate_limit_per_second: 25,
        },
        Provider {
            provider_id: "dynamics".into(),
            display_name: "Microsoft Dynamics".into(),
            category: ProviderCategory::Crm,
            direction: SyncDirection::Bidirectional,
            rate_limit_per_second: 60,
        },
        Provider {
            provider_id: "hubspot".into(),
            display_name: "HubSpot".into(),
            category: ProviderCategory::Crm,
            direction: SyncDirection::Bidirectional,
            rate_limit_per_second: 10,
        },
        Provider {
            provider_id: "teams".into(),
            display_name: "Microsoft Teams".into(),
            category: ProviderCategory::Messaging,
            direction: SyncDirection::PullOnly,
            rate_limit_per_second: 30,
        },
        Provider {
            provider_id: "slack".into(),
            display_name: "Slack".into(),
            category: ProviderCategory::Messaging,
            direction: SyncDirection::PullOnly,
            rate_limit_per_second: 20,
        },
        Provider {
            provider_id: "gong".into(),
            display_name: "Gong".into(),
            category: ProviderCategory::Meetings,
            direction: SyncDirection::PullOnly,
            rate_limit_per_second: 5,
        },
        Provider {
            provider_id: "zoom".into(),
            display_name: "Zoom".into(),
            category: ProviderCategory::Meetings,
            direction: SyncDirection::PullOnly,
            rate_limit_per_second: 10,
        },
        Provider {
            provider_id: "google_drive".into(),
            display_name: "Google Drive".into(),
            category: ProviderCategory::Storage,
            direction: SyncDirection::PullOnly,
            rate_limit_per_second: 100,
        },
        Provider {
            provider_id: "onedrive".into(),
            display_name: "OneDrive".into(),
            category: ProviderCategory::Storage,
            direction: SyncDirection::PullOnly,
            rate_limit_per_second: 60,
        },
        Provider {
            provider_id: "google_news".into(),
            display_name: "Google News".into(),
            category: ProviderCategory::News,
            direction: SyncDirection::PullOnly,
            rate_limit_per_second: 10,
        },
        Provider {
            provider_id: "notion".into(),
            display_name: "Notion".into(),
            category: ProviderCategory::Documents,
            direction: SyncDirection::Bidirectional,
            rate_limit_per_second: 10,
        },
    ]
}
