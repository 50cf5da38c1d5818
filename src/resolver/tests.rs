use super::*;
use crate::config::FileType;
use crate::integration::{catalog, Capabilities, DefaultLimits, FlowKind};

fn host_with(enabled: Vec<IntegrationOptions>) -> HostConfig {
    HostConfig {
        enabled_integrations: enabled,
        ..Default::default()
    }
}

fn enable(ids: &[IntegrationName]) -> Vec<IntegrationOptions> {
    ids.iter().map(|id| IntegrationOptions::new(*id)).collect()
}

static SMALL_CATALOG: &[IntegrationDescriptor] = &[
    IntegrationDescriptor {
        id: IntegrationName::Guru,
        name: "Guru",
        description: "",
        logo: "",
        data_source_type: "GURU",
        active: true,
        flow: FlowKind::Credentials,
        endpoint: Some("guru"),
        credentials: &[],
        capabilities: Capabilities {
            file_picker: false,
            ocr: false,
            sparse_vectors: false,
        },
        defaults: DefaultLimits {
            chunk_size: Some(800),
            overlap_size: Some(5),
            max_file_size: Some(1_000),
            max_files_count: Some(2),
        },
    },
    IntegrationDescriptor {
        id: IntegrationName::LocalFiles,
        name: "File Upload",
        description: "",
        logo: "",
        data_source_type: "LOCAL_FILES",
        active: true,
        flow: FlowKind::Upload,
        endpoint: None,
        credentials: &[],
        capabilities: Capabilities {
            file_picker: true,
            ocr: true,
            sparse_vectors: true,
        },
        defaults: DefaultLimits {
            chunk_size: None,
            overlap_size: None,
            max_file_size: None,
            max_files_count: None,
        },
    },
];

#[test]
fn test_only_enabled_and_active_integrations_resolved() {
    let host = host_with(enable(&[
        IntegrationName::Guru,
        IntegrationName::Salesforce,
        IntegrationName::LocalFiles,
    ]));
    let resolution = resolve(catalog(), &host);

    let ids: Vec<_> = resolution.integrations.iter().map(|p| p.id()).collect();
    // Catalog order, inactive Salesforce dropped.
    assert_eq!(ids, vec![IntegrationName::LocalFiles, IntegrationName::Guru]);
    assert!(!resolution.is_enabled(IntegrationName::Notion));
    assert_eq!(
        resolution.errors,
        vec![ConfigError::IntegrationInactive(IntegrationName::Salesforce)]
    );
}

#[test]
fn test_duplicate_host_entries_resolve_once_first_wins() {
    let mut first = IntegrationOptions::new(IntegrationName::Guru);
    first.chunk_size = Some(111);
    let mut second = IntegrationOptions::new(IntegrationName::Guru);
    second.chunk_size = Some(222);
    let host = host_with(vec![first, second]);

    let resolution = resolve(catalog(), &host);
    assert_eq!(resolution.integrations.len(), 1);
    assert_eq!(resolution.integrations[0].config.chunk_size, 111);
}

#[test]
fn test_host_values_take_precedence() {
    let mut guru = IntegrationOptions::new(IntegrationName::Guru);
    guru.chunk_size = Some(800);
    guru.skip_embedding_generation = Some(true);
    guru.embedding_model = Some(EmbeddingModel::CohereMultilingualV3);
    guru.sync_files_on_connection = Some(false);

    let mut host = host_with(vec![guru, IntegrationOptions::new(IntegrationName::Github)]);
    host.chunk_size = Some(1200);
    host.overlap_size = Some(40);
    host.embedding_model = EmbeddingModel::OpenaiAdaSmall512;
    host.prepend_filename_to_chunks = true;
    host.max_items_per_chunk = Some(5);
    host.tags.insert("team".into(), serde_json::json!("support"));

    let resolution = resolve(catalog(), &host);
    let guru = &resolution.get(IntegrationName::Guru).unwrap().config;
    assert_eq!(guru.chunk_size, 800);
    assert_eq!(guru.overlap_size, 40);
    assert!(guru.skip_embedding_generation);
    assert_eq!(guru.embedding_model, EmbeddingModel::CohereMultilingualV3);
    assert!(!guru.sync_files_on_connection);
    assert!(guru.prepend_filename_to_chunks);
    assert_eq!(guru.max_items_per_chunk, Some(5));
    assert_eq!(guru.tags["team"], serde_json::json!("support"));

    let github = &resolution.get(IntegrationName::Github).unwrap().config;
    assert_eq!(github.chunk_size, 1200);
    assert_eq!(github.embedding_model, EmbeddingModel::OpenaiAdaSmall512);
    assert!(github.sync_files_on_connection);
}

#[test]
fn test_catalog_chunking_defaults_apply_below_host_values() {
    let host = host_with(enable(&[IntegrationName::Guru, IntegrationName::LocalFiles]));
    let resolution = resolve(SMALL_CATALOG, &host);

    let guru = &resolution.get(IntegrationName::Guru).unwrap().config;
    assert_eq!((guru.chunk_size, guru.overlap_size), (800, 5));
    let local = &resolution.get(IntegrationName::LocalFiles).unwrap().config;
    assert_eq!((local.chunk_size, local.overlap_size), (1500, 20));

    let mut global = host_with(enable(&[IntegrationName::Guru]));
    global.chunk_size = Some(1200);
    let guru = &resolve(SMALL_CATALOG, &global).integrations[0].config;
    assert_eq!((guru.chunk_size, guru.overlap_size), (1200, 5));

    let mut per_integration = IntegrationOptions::new(IntegrationName::Guru);
    per_integration.overlap_size = Some(50);
    let mut both = host_with(vec![per_integration]);
    both.overlap_size = Some(30);
    let guru = &resolve(SMALL_CATALOG, &both).integrations[0].config;
    assert_eq!((guru.chunk_size, guru.overlap_size), (800, 50));
}

#[test]
fn test_hardcoded_defaults_when_nothing_configured() {
    let host = host_with(enable(&[IntegrationName::Notion]));
    let config = &resolve(catalog(), &host).integrations[0].config;
    assert_eq!(config.chunk_size, 1500);
    assert_eq!(config.overlap_size, 20);
    assert_eq!(config.max_file_size, 20_000_000);
    assert_eq!(config.embedding_model, EmbeddingModel::Openai);
    assert!(config.show_files_tab);
    assert!(config.allowed_extensions.is_empty());
}

#[test]
fn test_ocr_and_sparse_vectors_gated_by_capability() {
    let mut host = host_with(enable(&[IntegrationName::Guru, IntegrationName::LocalFiles]));
    host.use_ocr = true;
    host.parse_pdf_tables_with_ocr = true;
    host.generate_sparse_vectors = true;

    let resolution = resolve(SMALL_CATALOG, &host);
    let guru = &resolution.get(IntegrationName::Guru).unwrap().config;
    assert!(!guru.use_ocr);
    assert!(!guru.parse_pdf_tables_with_ocr);
    assert!(!guru.generate_sparse_vectors);

    let local = &resolution.get(IntegrationName::LocalFiles).unwrap().config;
    assert!(local.use_ocr);
    assert!(local.parse_pdf_tables_with_ocr);
    assert!(local.generate_sparse_vectors);
}

#[test]
fn test_allowed_extensions_normalized() {
    let mut local = IntegrationOptions::new(IntegrationName::LocalFiles);
    local.allowed_file_types = Some(
        [".PDF", "txt", " "]
            .iter()
            .map(|e| FileType {
                extension: e.to_string(),
            })
            .collect(),
    );
    let resolution = resolve(catalog(), &host_with(vec![local]));
    assert_eq!(
        resolution.integrations[0].config.allowed_extensions,
        vec!["pdf".to_string(), "txt".to_string()]
    );
}

#[test]
fn test_missing_catalog_entry_reported() {
    let host = host_with(enable(&[IntegrationName::Guru, IntegrationName::Slack]));
    let resolution = resolve(SMALL_CATALOG, &host);
    assert_eq!(resolution.integrations.len(), 1);
    assert_eq!(
        resolution.errors,
        vec![ConfigError::MissingCatalogEntry(IntegrationName::Slack)]
    );
}

#[test]
fn test_entry_point_resolution() {
    let mut host = host_with(enable(&[IntegrationName::Guru]));

    host.entry_point = Some(EntryPoint::Integration(IntegrationName::Guru));
    let resolution = resolve(catalog(), &host);
    assert_eq!(resolution.entry, Some(IntegrationName::Guru));
    assert!(resolution.errors.is_empty());

    host.entry_point = Some(EntryPoint::IntegrationList);
    assert_eq!(resolve(catalog(), &host).entry, None);
}

#[test]
fn test_entry_point_errors_are_distinguishable() {
    let mut host = host_with(enable(&[IntegrationName::Guru]));

    host.entry_point = Some(EntryPoint::Integration(IntegrationName::Github));
    let not_enabled = resolve(catalog(), &host);
    assert_eq!(not_enabled.entry, None);
    assert_eq!(
        not_enabled.errors,
        vec![ConfigError::EntryPointNotEnabled(IntegrationName::Github)]
    );

    host.entry_point = Some(EntryPoint::Unknown("GONG".to_string()));
    let unknown = resolve(catalog(), &host);
    assert_eq!(unknown.entry, None);
    assert_eq!(
        unknown.errors,
        vec![ConfigError::UnknownEntryPoint("GONG".to_string())]
    );

    // Known identity, but absent from the catalog being resolved against.
    host.entry_point = Some(EntryPoint::Integration(IntegrationName::Slack));
    let absent = resolve(SMALL_CATALOG, &host);
    assert_eq!(
        absent.errors,
        vec![ConfigError::UnknownEntryPoint("SLACK".to_string())]
    );

    // Inactive in the catalog counts as not enabled.
    host.enabled_integrations = enable(&[IntegrationName::Salesforce]);
    host.entry_point = Some(EntryPoint::Integration(IntegrationName::Salesforce));
    let inactive = resolve(catalog(), &host);
    assert!(inactive
        .errors
        .contains(&ConfigError::EntryPointNotEnabled(IntegrationName::Salesforce)));
}

#[test]
fn test_config_error_messages() {
    assert!(ConfigError::UnknownEntryPoint("X".into())
        .to_string()
        .contains("Make sure that right integration id is passed"));
    assert!(ConfigError::EntryPointNotEnabled(IntegrationName::Guru)
        .to_string()
        .contains("enabled_integrations"));
}

#[test]
fn test_file_size_limit_is_minimum_of_sources() {
    let mut local = IntegrationOptions::new(IntegrationName::LocalFiles);
    local.max_file_size = Some(8_000);
    local.allow_multiple_files = Some(true);
    let mut host = host_with(vec![local]);
    host.max_file_size = 10_000;

    let resolution = resolve(SMALL_CATALOG, &host);
    let local = resolution.get(IntegrationName::LocalFiles).unwrap();

    // Org not loaded: unbounded.
    assert_eq!(file_limits(local, &host, None).max_file_size, 8_000);

    let org = CustomLimits {
        file_size_limit: Some(9_000),
        max_files_count: None,
    };
    assert_eq!(file_limits(local, &host, Some(&org)).max_file_size, 8_000);

    let org = CustomLimits {
        file_size_limit: Some(5_000),
        max_files_count: None,
    };
    assert_eq!(file_limits(local, &host, Some(&org)).max_file_size, 5_000);

    // Lowering the global limit lowers the result.
    host.max_file_size = 3_000;
    assert_eq!(file_limits(local, &host, Some(&org)).max_file_size, 3_000);
}

#[test]
fn test_raising_a_source_never_raises_limit() {
    let local = IntegrationOptions {
        max_file_size: Some(4_000),
        ..IntegrationOptions::new(IntegrationName::LocalFiles)
    };
    let mut host = host_with(vec![local]);
    host.max_file_size = 6_000;
    let resolution = resolve(SMALL_CATALOG, &host);
    let local = resolution.get(IntegrationName::LocalFiles).unwrap();
    let org = CustomLimits {
        file_size_limit: Some(5_000),
        max_files_count: None,
    };

    let before = file_limits(local, &host, Some(&org)).max_file_size;
    host.max_file_size = 60_000;
    let raised = CustomLimits {
        file_size_limit: Some(50_000),
        max_files_count: None,
    };
    let after = file_limits(local, &host, Some(&raised)).max_file_size;
    assert_eq!(before, 4_000);
    assert_eq!(after, 4_000);
}

#[test]
fn test_catalog_limit_participates() {
    let mut host = host_with(enable(&[IntegrationName::Guru]));
    host.allow_multiple_files = true;
    let resolution = resolve(SMALL_CATALOG, &host);
    let guru = resolution.get(IntegrationName::Guru).unwrap();

    let limits = file_limits(guru, &host, None);
    assert_eq!(limits.max_file_size, 1_000);
    assert_eq!(limits.max_files_count, 2);
}

#[test]
fn test_max_files_count() {
    let local = IntegrationOptions {
        allow_multiple_files: Some(true),
        ..IntegrationOptions::new(IntegrationName::LocalFiles)
    };
    let host = host_with(vec![local]);
    let resolution = resolve(SMALL_CATALOG, &host);
    let local = resolution.get(IntegrationName::LocalFiles).unwrap();

    assert_eq!(file_limits(local, &host, None).max_files_count, 10);
    let org = CustomLimits {
        file_size_limit: None,
        max_files_count: Some(4),
    };
    assert_eq!(file_limits(local, &host, Some(&org)).max_files_count, 4);

    let single = host_with(enable(&[IntegrationName::LocalFiles]));
    let resolution = resolve(SMALL_CATALOG, &single);
    let local = resolution.get(IntegrationName::LocalFiles).unwrap();
    let limits = file_limits(local, &single, Some(&org));
    assert!(!limits.allow_multiple_files);
    assert_eq!(limits.max_files_count, 1);
}

#[test]
fn test_most_restrictive() {
    assert_eq!(most_restrictive::<u64>(&[]), None);
    assert_eq!(most_restrictive(&[None, Some(3u32), Some(1), None]), Some(1));
}
