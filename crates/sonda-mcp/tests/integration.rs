//! Integration tests for sonda-mcp tools.
//!
//! These tests run the tools against real source trees in a temporary
//! directory, covering:
//! - Routine lookup and the not-found envelope
//! - Table search ranking and standard exclusion
//! - Argument and configuration errors
//! - Classifier state reported by `environments`

use rstest::rstest;
use sonda::{RoutineOrigin, Sonda, SondaConfig, UsageCategory};
use sonda_mcp::error::Error;
use sonda_mcp::models::{FindRoutineParams, SearchTableParams};
use sonda_mcp::tools::Tools;
use tempfile::TempDir;

mod helpers {
    use super::*;
    use std::fs;

    /// Create a temporary tree with `hml/` (staging) and `padrao/` (standard) roots.
    pub fn create_workspace(files: &[(&str, &str)]) -> (TempDir, Tools) {
        let temp = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(temp.path().join("hml")).expect("Failed to create hml dir");
        fs::create_dir_all(temp.path().join("padrao")).expect("Failed to create padrao dir");

        for (path, content) in files {
            let full_path = temp.path().join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).expect("Failed to create parent dir");
            }
            fs::write(&full_path, content).expect("Failed to write source file");
        }

        let mut config = SondaConfig::default();
        config.roots.staging = Some(temp.path().join("hml"));
        config.roots.standard = Some(temp.path().join("padrao"));
        (temp, Tools::new(Sonda::new(config)))
    }

    pub fn find(routine: &str) -> FindRoutineParams {
        FindRoutineParams {
            routine: routine.to_string(),
            ..FindRoutineParams::default()
        }
    }

    pub fn search(table: &str) -> SearchTableParams {
        SearchTableParams {
            table: table.to_string(),
            ..SearchTableParams::default()
        }
    }
}

use helpers::*;

const CUSTOM_BROWSE: &str = "User Function PCMBRW()\n\
    Local oBrowse := FWMBrowse():New()\n\
    oBrowse:SetAlias(\"PD3\")\n\
Return\n";

const CUSTOM_CRUD: &str = "User Function PCMGRV()\n\
    DbSelectArea(\"PD3\")\n\
    RecLock(\"PD3\", .T.)\n\
    PD3->PD3_COD := \"1\"\n\
    MsUnlock()\n\
Return\n";

const STANDARD_QUERY: &str = "Function MATA410()\n\
    BeginSql Alias \"QRY\"\n\
        SELECT * FROM %table:PD3%\n\
    EndSql\n\
Return\n";

// =============================================================================
// find_routine
// =============================================================================

#[tokio::test]
async fn test_find_routine_in_staging() {
    let (temp, tools) = create_workspace(&[("hml/compras/PCMGRV.prw", CUSTOM_CRUD)]);

    let envelope = tools.find_routine(find("U_PCMGRV")).await.unwrap();

    assert!(envelope.success);
    let data = envelope.data.unwrap();
    assert!(data.path.starts_with(temp.path().join("hml")));

    let metadata = envelope.metadata.unwrap();
    assert_eq!(metadata.environment, "staging");
    assert_eq!(metadata.classification, Some(RoutineOrigin::Custom));
}

#[tokio::test]
async fn test_find_routine_structure_action() {
    let (_temp, tools) = create_workspace(&[("hml/PCMGRV.prw", CUSTOM_CRUD)]);

    let params = FindRoutineParams {
        action: Some("structure".to_string()),
        ..find("u_pcmgrv")
    };
    let envelope = tools.find_routine(params).await.unwrap();

    let structure = envelope.data.unwrap().structure.unwrap();
    assert!(structure.tables.contains(&"PD3".to_string()));
}

#[tokio::test]
async fn test_find_routine_not_found_has_diagnostics() {
    let (_temp, tools) = create_workspace(&[("hml/OUTRO.prw", CUSTOM_CRUD)]);

    let envelope = tools.find_routine(find("U_PCMXYZ")).await.unwrap();

    assert!(!envelope.success);
    assert!(envelope.data.is_none());
    let diagnostics = envelope.diagnostics.unwrap();
    assert!(diagnostics.files_scanned >= 1);
    assert!(
        diagnostics
            .attempted_variations
            .contains(&"PCMXYZ.prw".to_string())
    );
}

#[rstest]
#[case::environment(Some("qa"), None, "environment")]
#[case::action(None, Some("compile"), "action")]
#[tokio::test]
async fn test_find_routine_invalid_argument(
    #[case] environment: Option<&str>,
    #[case] action: Option<&str>,
    #[case] expected_field: &str,
) {
    let (_temp, tools) = create_workspace(&[]);

    let params = FindRoutineParams {
        environment: environment.map(String::from),
        action: action.map(String::from),
        ..find("U_PCMGRV")
    };
    let result = tools.find_routine(params).await;

    match result {
        Err(ref e @ Error::InvalidArgument { field, .. }) => {
            assert_eq!(field, expected_field);
            assert!(e.is_input_error());
        }
        other => panic!("Expected InvalidArgument, got {other:?}"),
    }
}

#[tokio::test]
async fn test_find_routine_unconfigured_environment() {
    let (_temp, tools) = create_workspace(&[]);

    let params = FindRoutineParams {
        environment: Some("prd".to_string()),
        ..find("U_PCMGRV")
    };
    let err = tools.find_routine(params).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Sonda(sonda::Error::ConfigurationMissing { .. })
    ));
    assert!(err.is_input_error());
}

#[tokio::test]
async fn test_find_routine_blank_name_is_input_error() {
    let (_temp, tools) = create_workspace(&[]);

    let err = tools.find_routine(find("   ")).await.unwrap_err();

    assert!(matches!(err, Error::Sonda(sonda::Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_find_routine_rejects_paths_outside_root() {
    let (_temp, tools) = create_workspace(&[("SECRET.txt", "top secret\n")]);

    let params = FindRoutineParams {
        action: Some("source".to_string()),
        ..find("../SECRET.txt")
    };
    let err = tools.find_routine(params).await.unwrap_err();

    assert!(matches!(err, Error::Sonda(sonda::Error::InvalidInput(_))));
    assert!(err.is_input_error());
}

// =============================================================================
// search_table
// =============================================================================

#[tokio::test]
async fn test_search_table_ranks_rows() {
    let (_temp, tools) = create_workspace(&[
        ("hml/PCMGRV.prw", CUSTOM_CRUD),
        ("hml/PCMBRW.prw", CUSTOM_BROWSE),
    ]);

    let envelope = tools.search_table(search("pd3")).await.unwrap();

    assert!(envelope.success);
    let rows = envelope.data.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].category, UsageCategory::Browse);
    assert_eq!(rows[1].category, UsageCategory::Crud);
    assert_eq!(envelope.metadata.unwrap().table.as_deref(), Some("PD3"));
}

#[tokio::test]
async fn test_search_table_excludes_standard_by_default() {
    let (temp, tools) = create_workspace(&[
        ("hml/PCMGRV.prw", CUSTOM_CRUD),
        ("padrao/MATA410.prx", STANDARD_QUERY),
    ]);
    let root = temp.path().join("padrao").display().to_string();

    let excluded = tools
        .search_table(SearchTableParams {
            root: Some(root.clone()),
            ..search("PD3")
        })
        .await
        .unwrap();
    assert!(!excluded.success);
    assert_eq!(excluded.metadata.unwrap().standard_excluded, Some(1));

    let included = tools
        .search_table(SearchTableParams {
            root: Some(root),
            include_standard: Some(true),
            ..search("PD3")
        })
        .await
        .unwrap();
    assert!(included.success);
    let rows = included.data.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].origin, RoutineOrigin::Standard);
}

#[tokio::test]
async fn test_search_table_zero_max_results_is_rejected() {
    let (_temp, tools) = create_workspace(&[("hml/PCMGRV.prw", CUSTOM_CRUD)]);

    let err = tools
        .search_table(SearchTableParams {
            max_results: Some(0),
            ..search("PD3")
        })
        .await
        .unwrap_err();

    assert!(err.is_input_error());
}

// =============================================================================
// environments
// =============================================================================

#[tokio::test]
async fn test_environments_reports_roots_and_discovery() {
    let (temp, tools) = create_workspace(&[
        ("padrao/FINA050.prx", "Function FINA050()\nReturn\n"),
        ("padrao/ZZXA100.prw", "Function ZZXA100()\nReturn\n"),
    ]);

    let before = tools.environments(false).await.unwrap();
    assert_eq!(before.environments.len(), 3);
    let staging = &before.environments[0];
    assert_eq!(staging.root.as_deref(), Some(temp.path().join("hml").as_path()));
    assert!(staging.exists);
    assert!(before.environments[1].root.is_none());

    let after = tools.environments(true).await.unwrap();
    assert!(after.classifier.discovered_prefixes.contains(&"ZZXA".to_string()));
}
