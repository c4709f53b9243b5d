use super::*;
use std::fs;

const DUMP: &str = r#"[
  { "nodeid": 0, "split": "f5", "split_condition": 0.3, "yes": 1, "no": 2,
    "children": [ { "nodeid": 1, "leaf": -0.1 }, { "nodeid": 2, "leaf": 0.2 } ] },
  { "nodeid": 0, "split": "f1", "split_condition": -2.5, "yes": 1, "no": 2,
    "children": [ { "nodeid": 1, "leaf": 0.05 }, { "nodeid": 2, "leaf": -0.05 } ] },
  { "nodeid": 0, "leaf": 0.01 }
]"#;

fn write_model(dir: &Path) -> PathBuf {
    let path = dir.join("model.json");
    fs::write(&path, DUMP).unwrap();
    path
}

fn rust() -> Backend {
    Backend::builtin("rust").unwrap().unwrap()
}

fn zokrates() -> Backend {
    Backend::builtin("zokrates").unwrap().unwrap()
}

#[test]
fn test_convert_defaults_to_all_trees() {
    let dumps = crate::model::parse_dump(DUMP, Path::new("model.json")).unwrap();
    let out = convert(&dumps, FeatureUniverse::indexed(8), &rust(), None).unwrap();
    assert_eq!(out.tree_limit, 3);
    assert!(out.source.contains("// Tree 2"));

    let out = convert(&dumps, FeatureUniverse::indexed(8), &rust(), Some(1)).unwrap();
    assert!(!out.source.contains("// Tree 1"));
}

#[test]
fn test_convert_file() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(dir.path());
    let out = convert_file(&model, FeatureUniverse::indexed(8), "zokrates", &[], Some(2)).unwrap();
    assert_eq!(out.backend, "zokrates");
    assert!(out.source.contains("def main(private i64[8] f) -> i64 {"));

    let missing = dir.path().join("nope.json");
    assert!(matches!(
        convert_file(&missing, FeatureUniverse::indexed(8), "rust", &[], None),
        Err(ConvertError::Io { .. })
    ));
}

#[test]
fn test_unknown_feature_aborts_conversion() {
    let dumps = crate::model::parse_dump(DUMP, Path::new("model.json")).unwrap();
    match convert(&dumps, FeatureUniverse::indexed(4), &rust(), None) {
        Err(ConvertError::UnknownFeature {
            feature,
            tree,
            node,
            feature_count,
        }) => {
            assert_eq!(feature, "f5");
            assert_eq!(tree, 0);
            assert_eq!(node, 0);
            assert_eq!(feature_count, 4);
        }
        other => panic!("unexpected result: {:?}", other.map(|e| e.tree_limit)),
    }
}

#[test]
fn test_batch_matches_sequential() {
    let dumps = crate::model::parse_dump(DUMP, Path::new("model.json")).unwrap();
    let ensemble = build_ensemble(&dumps, FeatureUniverse::indexed(8)).unwrap();
    let backends = vec![rust(), zokrates()];
    let batch = convert_batch(&ensemble, &backends, &[1, 3, 2]).unwrap();
    assert_eq!(batch.len(), 6);
    let order: Vec<(&str, usize)> = batch
        .iter()
        .map(|e| (e.backend.as_str(), e.tree_limit))
        .collect();
    assert_eq!(
        order,
        vec![
            ("rust", 1),
            ("rust", 3),
            ("rust", 2),
            ("zokrates", 1),
            ("zokrates", 3),
            ("zokrates", 2)
        ]
    );
    for (emission, (backend, limit)) in batch.iter().zip([
        (&backends[0], 1),
        (&backends[0], 3),
        (&backends[0], 2),
        (&backends[1], 1),
        (&backends[1], 3),
        (&backends[1], 2),
    ]) {
        assert_eq!(emission, &assemble(&ensemble, backend, limit).unwrap());
    }
}

#[test]
fn test_batch_rejects_bad_limit_up_front() {
    let dumps = crate::model::parse_dump(DUMP, Path::new("model.json")).unwrap();
    let ensemble = build_ensemble(&dumps, FeatureUniverse::indexed(8)).unwrap();
    assert!(matches!(
        convert_batch(&ensemble, &[rust()], &[1, 4]),
        Err(ConvertError::InvalidTreeLimit {
            requested: 4,
            available: 3
        })
    ));
}

#[test]
fn test_build_project_writes_outputs() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path());
    let toml_path = dir.path().join("forest.toml");
    fs::write(
        &toml_path,
        r#"[project]
name = "demo"
model = "model.json"
feature_count = 8

[output]
dir = "out"
backends = ["rust", "zokrates"]
tree_limits = [2, 3]
"#,
    )
    .unwrap();
    let project = Project::load(&toml_path).unwrap();
    let written = build_project(&project).unwrap();
    assert_eq!(written.len(), 4);

    let out = dir.path().join("out");
    assert!(out.join("rust").join("demo_2trees.rs").exists());
    assert!(out.join("rust").join("demo_3trees.rs").exists());
    assert!(out.join("zokrates").join("demo_3trees.zok").exists());
    assert!(out.join("zokrates").join("fixed_i64.zok").exists());
    assert_eq!(written[3].artifacts, vec![out.join("zokrates").join("fixed_i64.zok")]);

    let features = fs::read_to_string(out.join("demo.features.txt")).unwrap();
    assert_eq!(features.lines().count(), 8);
    assert!(features.contains("5 f5 *"));
    let trees = fs::read_to_string(out.join("demo.trees.txt")).unwrap();
    assert!(trees.starts_with("tree 0: 1 splits, 2 leaves, depth 1\n"));
}

#[test]
fn test_prepared_model_resolves_backends_first() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    // the bad backend is reported even though the model does not exist
    let err = PreparedModel::build(
        &missing,
        FeatureUniverse::indexed(8),
        &["rust".to_string(), "../evil".to_string()],
        &[],
    )
    .unwrap_err();
    assert!(matches!(err, ConvertError::InvalidDescriptor { .. }));
}
