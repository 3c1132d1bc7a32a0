use std::fs;

use case_types::CaseVariant;
use feature_engine::{
    build_front, BackParams, BuildOptions, FrontParametrics, FrontParams, StepOutcome,
};
use file_format::{
    load_project, save_project, write_case_artifacts, CaseArtifacts, CaseParameters,
    CaseProject, ExportError, LoadError, ProjectMetadata, RenderedCase, FORMAT_VERSION,
};
use geom_kernel::MockKernel;

fn back_project() -> CaseProject {
    CaseProject {
        metadata: ProjectMetadata::new("back"),
        parameters: CaseParameters::Back(BackParams {
            wall_thickness: 7.5,
            include_back_lip: true,
            ..BackParams::default()
        }),
        report: None,
    }
}

fn rendered(variant: CaseVariant) -> RenderedCase {
    RenderedCase {
        variant,
        step: "ISO-10303-21;\nEND-ISO-10303-21;\n".to_string(),
        stl: vec![0u8; 84],
        project: "{}".to_string(),
    }
}

#[test]
fn project_round_trips_with_report() {
    let mut k = MockKernel::new();
    let params = FrontParams {
        pcb_clearance: 2.5,
        ..FrontParams::default()
    };
    let out = build_front(
        &mut k,
        &FrontParametrics::new(params.clone()),
        &BuildOptions::default(),
    )
    .unwrap();
    let project = CaseProject {
        metadata: ProjectMetadata::new("front"),
        parameters: CaseParameters::Front(params),
        report: Some(out.report),
    };

    let json = save_project(&project).unwrap();
    assert!(json.contains("\"format\": \"enclosure-case\""));
    let loaded = load_project(&json).unwrap();
    assert_eq!(loaded, project);
    let report = loaded.report.unwrap();
    assert_eq!(
        report.step("cavity").unwrap().outcome,
        StepOutcome::Applied
    );
}

#[test]
fn back_parameters_load_as_back() {
    let project = back_project();
    let loaded = load_project(&save_project(&project).unwrap()).unwrap();
    assert_eq!(loaded.variant(), CaseVariant::Back);
    match loaded.parameters {
        CaseParameters::Back(p) => {
            assert_eq!(p.wall_thickness, 7.5);
            assert!(p.include_back_lip);
        }
        other => panic!("expected back parameters, got {other:?}"),
    }
}

#[test]
fn missing_parameters_take_defaults() {
    let mut value: serde_json::Value =
        serde_json::from_str(&save_project(&back_project()).unwrap()).unwrap();
    value["parameters"] = serde_json::json!({ "wall_thickness": 8.0 });
    let loaded = load_project(&value.to_string()).unwrap();
    match loaded.parameters {
        CaseParameters::Back(p) => {
            assert_eq!(p.wall_thickness, 8.0);
            assert_eq!(p.bottom_thickness, BackParams::default().bottom_thickness);
        }
        other => panic!("expected back parameters, got {other:?}"),
    }
}

#[test]
fn rejects_other_formats_and_future_versions() {
    let mut value: serde_json::Value =
        serde_json::from_str(&save_project(&back_project()).unwrap()).unwrap();

    value["format"] = "other-cad".into();
    assert!(matches!(
        load_project(&value.to_string()),
        Err(LoadError::UnknownFormat(f)) if f == "other-cad"
    ));

    value["format"] = "enclosure-case".into();
    value["version"] = (FORMAT_VERSION + 1).into();
    assert!(matches!(
        load_project(&value.to_string()),
        Err(LoadError::FutureVersion { .. })
    ));

    assert!(matches!(load_project("not json"), Err(LoadError::Parse(_))));
}

#[test]
fn version_zero_files_are_migrated() {
    let mut value: serde_json::Value =
        serde_json::from_str(&save_project(&back_project()).unwrap()).unwrap();
    value["version"] = 0.into();
    let loaded = load_project(&value.to_string()).unwrap();
    assert_eq!(loaded.variant(), CaseVariant::Back);
}

#[test]
fn writes_three_files_and_no_temporaries() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("out");
    let paths = rendered(CaseVariant::Front).write_to(&out).unwrap();

    assert_eq!(paths, CaseArtifacts::in_dir(&out, CaseVariant::Front));
    for p in paths.paths() {
        assert!(p.is_file(), "{} missing", p.display());
    }
    assert_eq!(fs::read(&paths.stl).unwrap().len(), 84);
    let names: Vec<_> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 3, "{names:?}");
}

#[test]
fn failed_write_removes_earlier_files() {
    let dir = tempfile::tempdir().unwrap();
    let paths = CaseArtifacts::in_dir(dir.path(), CaseVariant::Back);
    // A directory where the project file belongs makes the last rename fail.
    fs::create_dir_all(&paths.project).unwrap();

    let err = rendered(CaseVariant::Back).write_to(dir.path()).unwrap_err();
    assert!(matches!(err, ExportError::Io { .. }));
    assert!(!paths.step.exists());
    assert!(!paths.stl.exists());
    let leftovers = fs::read_dir(dir.path())
        .unwrap()
        .filter(|e| e.as_ref().unwrap().path() != paths.project)
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn nothing_is_written_when_rendering_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut k = MockKernel::new();
    let params = FrontParams::default();
    let out = build_front(
        &mut k,
        &FrontParametrics::new(params.clone()),
        &BuildOptions::default(),
    )
    .unwrap();
    let project = CaseProject {
        metadata: ProjectMetadata::new("front"),
        parameters: CaseParameters::Front(params),
        report: Some(out.report),
    };

    // The mock kernel has no STEP writer.
    let err = write_case_artifacts(&mut k, &out.solid, &project, dir.path()).unwrap_err();
    assert!(matches!(err, ExportError::Step(_)));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
