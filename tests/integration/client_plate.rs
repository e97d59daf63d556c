use centipede::crawler::{
    Classifier, Crawler, ImageRecognizer, PathCrawler, PathHolder, Recognizer, RecognizerType, Registry,
};
use serde_json::json;
use std::fs;

/// Client plates named like `XHE102_013_010.1084.dpx`.
struct ClientPlateRecognizer;

impl Recognizer for ClientPlateRecognizer {
    fn test(&self, path: &PathHolder, parent: Option<&PathCrawler>) -> anyhow::Result<bool> {
        if !path.ext().eq_ignore_ascii_case("dpx") || !ImageRecognizer.test(path, parent)? {
            return Ok(false);
        }
        let parts: Vec<&str> = path.base_name().split('_').collect();
        Ok(parts.len() >= 3 && parts[0].len() > 3)
    }

    fn construct(
        &self,
        crawler: &mut Crawler,
        path: &PathHolder,
        parent: Option<&PathCrawler>,
    ) -> anyhow::Result<()> {
        ImageRecognizer.construct(crawler, path, parent)?;

        let name = crawler
            .var("name")?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("name is not a string"))?;
        let parts: Vec<&str> = name.split('_').collect();
        let seq = format!("EP{}", &parts[0][3..]);
        crawler.set_var("shot", format!("HVN-{}-{}-{}", seq, parts[1], parts[2]), false);
        crawler.set_var("seq", seq, false);
        crawler.set_var("plateName", "plate", false);
        if crawler.var("imageType")? == &json!("sequence") {
            crawler.set_var("version", 0, false);
        }
        Ok(())
    }
}

fn classifier() -> Classifier {
    let mut registry = Registry::with_defaults();
    registry.register(
        RecognizerType::new("clientPlate", ClientPlateRecognizer).with_capabilities(["image", "file"]),
    );
    Classifier::new(registry)
}

fn write_delivery(root: &std::path::Path) {
    fs::create_dir_all(root.join("delivery/notes")).unwrap();
    fs::write(root.join("delivery/XHE102_013_010.1084.dpx"), "a").unwrap();
    fs::write(root.join("delivery/XHE102_013_010.1085.dpx"), "b").unwrap();
    fs::write(root.join("delivery/poster.png"), "c").unwrap();
    fs::write(root.join("delivery/notes/readme.txt"), "d").unwrap();
}

#[test]
fn test_client_plate_wins_over_image() {
    let dir = tempfile::tempdir().unwrap();
    write_delivery(dir.path());

    let root = classifier()
        .create_from_path(dir.path().join("delivery"), None, None)
        .unwrap();
    let plates = root.glob(&["clientPlate"], true).unwrap();

    assert_eq!(plates.len(), 2);
    let plate = &plates[0];
    assert_eq!(plate.type_name(), "clientPlate");
    assert_eq!(plate.var("seq").unwrap(), json!("EP102"));
    assert_eq!(plate.var("shot").unwrap(), json!("HVN-EP102-013-010"));
    assert_eq!(plate.var("frame").unwrap(), json!(1084));
    assert_eq!(plate.var("version").unwrap(), json!(0));
}

#[test]
fn test_capability_filter_includes_specializations() {
    let dir = tempfile::tempdir().unwrap();
    write_delivery(dir.path());

    let root = classifier()
        .create_from_path(dir.path().join("delivery"), None, None)
        .unwrap();

    let images: Vec<String> = root
        .glob(&["image"], true)
        .unwrap()
        .iter()
        .map(|c| c.type_name().to_string())
        .collect();
    assert_eq!(images, vec!["clientPlate", "clientPlate", "image"]);

    let files = root.glob(&["file"], true).unwrap();
    assert_eq!(files.len(), 4);

    let everything = root.glob(&[], true).unwrap();
    assert_eq!(everything.len(), 6);
    assert!(root.glob(&["shader"], true).is_err());
}

#[test]
fn test_file_filter_reaches_types_declaring_only_image() {
    let dir = tempfile::tempdir().unwrap();
    write_delivery(dir.path());

    let mut registry = Registry::with_defaults();
    registry.register(RecognizerType::new("clientPlate", ClientPlateRecognizer).with_capabilities(["image"]));
    let root = Classifier::new(registry)
        .create_from_path(dir.path().join("delivery"), None, None)
        .unwrap();

    let files: Vec<String> = root
        .glob(&["file"], true)
        .unwrap()
        .iter()
        .map(|c| c.type_name().to_string())
        .collect();
    assert_eq!(files, vec!["clientPlate", "clientPlate", "file", "image"]);
}

#[test]
fn test_context_vars_reach_descendants() {
    let dir = tempfile::tempdir().unwrap();
    write_delivery(dir.path());

    let root = classifier()
        .create_from_path(dir.path().join("delivery"), None, None)
        .unwrap();
    root.set_var("job", "RND", true);
    root.set_var("scratch", "not inherited", false);

    let readme = root
        .glob(&["file"], true)
        .unwrap()
        .into_iter()
        .find(|c| c.var("baseName").unwrap() == json!("readme.txt"))
        .unwrap();

    assert_eq!(readme.var("job").unwrap(), json!("RND"));
    assert!(readme.context_var_names().contains(&"job".to_string()));
    assert!(!readme.has_var("scratch"));
    assert_eq!(readme.parent().unwrap().type_name(), "directory");
}
