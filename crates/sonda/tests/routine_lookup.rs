//! Integration tests for locating and describing a single routine.

use std::fs;

use sonda::{
    Environment, Error, RoutineAction, RoutineOrigin, RoutineRequest, Sonda, SondaConfig,
    STAGING_ROOT_VAR,
};
use tempfile::TempDir;

/// Create a temporary tree with `hml/` (staging) and `padrao/` (standard) roots.
fn workspace_with_files(files: &[(&str, &[u8])]) -> (TempDir, Sonda) {
    let dir = tempfile::tempdir().expect("should create temp dir");
    fs::create_dir_all(dir.path().join("hml")).expect("should create staging root");
    fs::create_dir_all(dir.path().join("padrao")).expect("should create standard root");

    for (path, content) in files {
        let full_path = dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("should create parent dirs");
        }
        fs::write(&full_path, content).expect("should write file");
    }

    let mut config = SondaConfig::default();
    config.roots.staging = Some(dir.path().join("hml"));
    config.roots.standard = Some(dir.path().join("padrao"));
    (dir, Sonda::new(config))
}

fn request(routine: &str, action: RoutineAction) -> RoutineRequest {
    RoutineRequest {
        action,
        ..RoutineRequest::new(routine)
    }
}

const CUSTOM_SOURCE: &[u8] = b"#include \"protheus.ch\"\r\n\
/*/{Protheus.doc} PCMCTF43\r\n\
/*/\r\n\
User Function PCMCTF43()\r\n\
    DbSelectArea(\"PD3\")\r\n\
    Grava()\r\n\
Return\r\n\
Static Function Grava()\r\n\
    RecLock(\"PD3\", .T.)\r\n\
Return\r\n";

// === Locate ===

#[test]
fn custom_routine_is_found_in_staging_by_auto_environment() {
    let (dir, sonda) = workspace_with_files(&[("hml/compras/PCMCTF43.prw", CUSTOM_SOURCE)]);

    let envelope = sonda
        .resolve_routine(&RoutineRequest::new("U_PCMCTF43"))
        .expect("request should succeed");

    assert!(envelope.success);
    let data = envelope.data.expect("should carry data");
    assert!(data.path.ends_with("compras/PCMCTF43.prw"));
    assert!(data.path.is_absolute());

    let metadata = envelope.metadata.expect("should carry metadata");
    assert_eq!(metadata.environment, "staging");
    assert_eq!(metadata.root, dir.path().join("hml"));
    assert!(!metadata.manual_override);
    assert_eq!(metadata.routine.as_deref(), Some("U_PCMCTF43"));
    assert_eq!(metadata.classification, Some(RoutineOrigin::Custom));
    assert_eq!(metadata.classification_rule, Some("custom_prefix"));
}

#[test]
fn unprefixed_routine_is_looked_up_in_standard_tree() {
    let (_dir, sonda) = workspace_with_files(&[(
        "padrao/MATA010.PRX",
        b"#include \"protheus.ch\"\nFunction MATA010()\nReturn\n",
    )]);

    let envelope = sonda
        .resolve_routine(&RoutineRequest::new("mata010"))
        .expect("request should succeed");

    assert!(envelope.success);
    let metadata = envelope.metadata.expect("should carry metadata");
    assert_eq!(metadata.environment, "standard");
    assert_eq!(metadata.classification, Some(RoutineOrigin::Standard));
}

#[test]
fn content_decides_for_unprefixed_custom_routine() {
    let (_dir, sonda) = workspace_with_files(&[("hml/PCMCTF43.prw", CUSTOM_SOURCE)]);

    let envelope = sonda
        .resolve_routine(&RoutineRequest {
            environment: Environment::Staging,
            ..RoutineRequest::new("PCMCTF43")
        })
        .expect("request should succeed");

    let metadata = envelope.metadata.expect("should carry metadata");
    assert_eq!(metadata.classification, Some(RoutineOrigin::Custom));
    assert_eq!(metadata.classification_rule, Some("content_markers"));
}

#[test]
fn explicit_root_is_a_manual_override() {
    let (dir, sonda) = workspace_with_files(&[("outro/PCMCTF43.prw", CUSTOM_SOURCE)]);

    let envelope = sonda
        .resolve_routine(&RoutineRequest {
            root: Some(dir.path().join("outro")),
            ..RoutineRequest::new("U_PCMCTF43")
        })
        .expect("request should succeed");

    assert!(envelope.success);
    let metadata = envelope.metadata.expect("should carry metadata");
    assert_eq!(metadata.environment, "manual");
    assert!(metadata.manual_override);
}

// === Not found ===

#[test]
fn missing_routine_reports_diagnostics() {
    let (dir, sonda) = workspace_with_files(&[("hml/OUTRO.prw", b"User Function OUTRO()\n")]);

    let envelope = sonda
        .resolve_routine(&RoutineRequest::new("U_XYZ999"))
        .expect("not found is not an error");

    assert!(!envelope.success);
    assert!(envelope.data.is_none());
    assert!(envelope.message.expect("should explain").contains("XYZ999"));

    let diagnostics = envelope.diagnostics.expect("should carry diagnostics");
    assert_eq!(diagnostics.searched_root, dir.path().join("hml"));
    assert!(diagnostics.attempted_variations.len() >= 10);
    assert!(diagnostics.attempted_variations.iter().any(|v| v == "XYZ999.prw"));
    assert_eq!(diagnostics.files_scanned, 1);
}

#[test]
fn not_found_envelope_serializes_without_data() {
    let (_dir, sonda) = workspace_with_files(&[]);

    let envelope = sonda
        .resolve_routine(&RoutineRequest::new("U_XYZ999"))
        .expect("not found is not an error");
    let json = serde_json::to_value(&envelope).expect("should serialize");

    assert_eq!(json["success"], false);
    assert!(json.get("data").is_none());
    assert_eq!(json["metadata"]["environment"], "staging");
    assert!(json["diagnostics"]["attempted_variations"].as_array().unwrap().len() >= 10);
}

// === Request failures ===

#[test]
fn blank_name_is_invalid_input() {
    let (_dir, sonda) = workspace_with_files(&[]);

    let result = sonda.resolve_routine(&RoutineRequest::new("   "));

    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn names_that_leave_the_root_are_invalid_input() {
    let (dir, sonda) = workspace_with_files(&[("SECRET.txt", b"top secret\n")]);
    let absolute = dir.path().join("SECRET.txt").display().to_string();

    for routine in ["../SECRET.txt", "..\\SECRET.txt", absolute.as_str()] {
        let result = sonda.resolve_routine(&request(routine, RoutineAction::Source));
        assert!(
            matches!(result, Err(Error::InvalidInput(_))),
            "{routine} should be rejected, got {result:?}"
        );
    }
}

#[test]
fn unconfigured_environment_names_the_setting() {
    let sonda = Sonda::new(SondaConfig::default());

    let result = sonda.resolve_routine(&RoutineRequest::new("U_PCMCTF43"));

    match result {
        Err(Error::ConfigurationMissing { setting }) => assert_eq!(setting, STAGING_ROOT_VAR),
        other => panic!("Expected ConfigurationMissing, got {other:?}"),
    }
}

// === Actions ===

#[test]
fn structure_action_outlines_the_file() {
    let (_dir, sonda) = workspace_with_files(&[("hml/PCMCTF43.prw", CUSTOM_SOURCE)]);

    let envelope = sonda
        .resolve_routine(&request("U_PCMCTF43", RoutineAction::Structure))
        .expect("request should succeed");

    let outline = envelope.data.and_then(|d| d.structure).expect("should carry structure");
    assert_eq!(outline.protheus_doc_blocks, 1);
    assert_eq!(outline.includes, vec!["protheus.ch"]);
    assert_eq!(outline.tables, vec!["PD3"]);
    assert_eq!(outline.declarations.len(), 2);
}

#[test]
fn report_action_renders_markdown_with_flowchart() {
    let (_dir, sonda) = workspace_with_files(&[("hml/PCMCTF43.prw", CUSTOM_SOURCE)]);

    let envelope = sonda
        .resolve_routine(&request("U_PCMCTF43", RoutineAction::Report))
        .expect("request should succeed");

    let report = envelope.data.and_then(|d| d.report).expect("should carry report");
    assert!(report.starts_with("# Routine U_PCMCTF43"));
    assert!(report.contains("```mermaid"));
    assert!(report.contains("F_Grava"));
}

#[test]
fn source_action_decodes_latin1_files() {
    let latin1: &[u8] = b"User Function PCMA()\n// Fun\xe7\xe3o de teste\nReturn\n";
    let (_dir, sonda) = workspace_with_files(&[("hml/PCMA.prw", latin1)]);

    let envelope = sonda
        .resolve_routine(&request("U_PCMA", RoutineAction::Source))
        .expect("request should succeed");

    let source = envelope.data.and_then(|d| d.source).expect("should carry source");
    assert!(source.contains("Função de teste"));
}

#[test]
fn git_status_outside_repository_is_a_message_not_an_error() {
    let (_dir, sonda) = workspace_with_files(&[("hml/PCMCTF43.prw", CUSTOM_SOURCE)]);

    let envelope = sonda
        .resolve_routine(&request("U_PCMCTF43", RoutineAction::GitStatus))
        .expect("request should succeed");

    let git = envelope.data.and_then(|d| d.git).expect("should carry git status");
    assert!(git.message.is_some() || git.branch.is_some());
}

#[test]
fn repeated_lookups_share_the_classification_cache() {
    let (_dir, sonda) = workspace_with_files(&[("hml/PCMCTF43.prw", CUSTOM_SOURCE)]);
    let req = RoutineRequest {
        environment: Environment::Staging,
        ..RoutineRequest::new("PCMCTF43")
    };

    sonda.resolve_routine(&req).expect("first lookup");
    let inspections = sonda.classifier().content_inspections();
    let second = sonda.clone().resolve_routine(&req).expect("second lookup");

    assert_eq!(sonda.classifier().content_inspections(), inspections);
    assert_eq!(
        second.metadata.and_then(|m| m.classification_rule),
        Some("cache")
    );
}
