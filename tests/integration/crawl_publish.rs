use centipede::config::TaskConfig;
use centipede::crawler::{json_contents, Classifier, Registry};
use centipede::task::{Pipeline, TaskRegistry};
use serde_json::json;
use std::fs;
use std::path::Path;

fn write_incoming(root: &Path) {
    fs::create_dir_all(root.join("incoming/sh010")).unwrap();
    fs::create_dir_all(root.join("config/templates")).unwrap();
    fs::write(root.join("incoming/sh010/plate.1001.exr"), vec![0u8; 300]).unwrap();
    fs::write(root.join("incoming/sh010/plate.1002.exr"), vec![0u8; 200]).unwrap();
    fs::write(root.join("incoming/sh010/edit.txt"), "cut v3").unwrap();
    fs::write(root.join("config/ingestor.toml"), "").unwrap();
    fs::write(root.join("config/templates/publish.txt"), "{publishRoot}").unwrap();
}

#[test]
fn test_crawl_copy_and_publish() {
    let dir = tempfile::tempdir().unwrap();
    write_incoming(dir.path());
    let publish_root = dir.path().join("publish").display().to_string();

    let classifier = Classifier::new(Registry::with_defaults());
    let incoming = classifier
        .create_from_path(dir.path().join("incoming"), None, None)
        .unwrap();
    incoming.set_var("publishRoot", publish_root.clone(), true);
    incoming.set_var("configPath", dir.path().join("config").display().to_string(), true);

    let mut copy = TaskConfig::new("copy");
    copy.target = Some("{publishRoot}/v012/data/{baseName}".to_string());
    copy.filter_types = vec!["image".to_string()];
    let mut version = TaskConfig::new("createVersion");
    version.target = Some("{publishRoot}/v012/info.json".to_string());
    version.options.insert("verify_inputs".to_string(), json!(true));

    let mut pipeline = Pipeline::from_config(&[copy, version], &TaskRegistry::with_defaults()).unwrap();
    let inputs = incoming.glob(&[], true).unwrap();
    let outputs = pipeline.run(inputs, &classifier).unwrap();

    let version_dir = Path::new(&publish_root).join("v012");
    assert_eq!(outputs.len(), 2);
    assert_eq!(
        outputs[0].file_path(),
        version_dir.join("info.json").display().to_string()
    );

    let info = json_contents(&outputs[0]).unwrap();
    assert_eq!(info["version"], json!(12));
    assert_eq!(info["size"], json!(500));

    let data = json_contents(&outputs[1]).unwrap();
    let keys: Vec<&String> = data.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["data/plate.1001.exr", "data/plate.1002.exr"]);
    assert_eq!(data["data/plate.1002.exr"]["size"], json!(200));
    assert_eq!(data["data/plate.1002.exr"]["type"], json!("exr"));

    assert!(version_dir.join("env.json").is_file());
    assert!(version_dir
        .join("ingestorConfig/templates/publish.txt")
        .is_file());
    assert!(!version_dir.join("data/edit.txt").exists());
}

#[test]
fn test_info_json_is_indented_and_sorted() {
    let dir = tempfile::tempdir().unwrap();
    write_incoming(dir.path());
    let publish_root = dir.path().join("publish").display().to_string();

    let classifier = Classifier::new(Registry::with_defaults());
    let incoming = classifier
        .create_from_path(dir.path().join("incoming"), None, None)
        .unwrap();
    incoming.set_var("publishRoot", publish_root.clone(), true);
    incoming.set_var("configPath", dir.path().join("config").display().to_string(), true);
    incoming.set_var("assetName", "plate", true);
    incoming.set_var("variant", "main", true);

    let mut copy = TaskConfig::new("copy");
    copy.target = Some("{publishRoot}/v001/data/{baseName}".to_string());
    copy.filter_types = vec!["image".to_string()];
    let mut version = TaskConfig::new("createVersion");
    version.target = Some("{publishRoot}/v001/info.json".to_string());

    let mut pipeline = Pipeline::from_config(&[copy, version], &TaskRegistry::with_defaults()).unwrap();
    pipeline
        .run(incoming.glob(&[], true).unwrap(), &classifier)
        .unwrap();

    let text = fs::read_to_string(Path::new(&publish_root).join("v001/info.json")).unwrap();
    let keys: Vec<&str> = text
        .lines()
        .filter(|line| line.starts_with("    \""))
        .map(|line| line.trim_start().split('"').nth(1).unwrap())
        .collect();
    assert_eq!(
        keys,
        vec!["assetName", "size", "totalTime", "user", "variant", "version"]
    );
}

#[test]
fn test_glob_cache_survives_filesystem_changes() {
    let dir = tempfile::tempdir().unwrap();
    write_incoming(dir.path());

    let classifier = Classifier::new(Registry::with_defaults());
    let incoming = classifier
        .create_from_path(dir.path().join("incoming"), None, None)
        .unwrap();

    let first = incoming.glob(&[], true).unwrap();
    fs::write(dir.path().join("incoming/sh010/plate.1003.exr"), "late").unwrap();

    let cached = incoming.glob(&[], true).unwrap();
    assert_eq!(cached.len(), first.len());
    assert!(first
        .iter()
        .zip(&cached)
        .all(|(a, b)| std::rc::Rc::ptr_eq(a, b)));

    let refreshed = incoming.glob(&[], false).unwrap();
    assert_eq!(refreshed.len(), first.len() + 1);
    assert_eq!(incoming.glob(&[], true).unwrap().len(), refreshed.len());

    for crawler in &refreshed {
        let contributes = crawler.glob(&[], true).unwrap().len() > 1;
        assert_eq!(crawler.is_leaf().unwrap(), !contributes);
    }
}
