use centipede::crawler::{Classifier, PathHolder, Registry};
use proptest::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-zA-Z0-9 _./-]{0,16}".prop_map(Value::from),
    ]
}

proptest! {
    #[test]
    fn snapshot_roundtrip_preserves_state(
        vars in prop::collection::btree_map("v_[a-z]{1,8}", (scalar(), any::<bool>()), 0..8),
        tags in prop::collection::btree_map("[a-z]{1,8}", scalar(), 0..4),
        file_name in "[a-z]{1,8}\\.(exr|txt|json)",
    ) {
        let classifier = Classifier::new(Registry::with_defaults());
        let crawler = classifier
            .create(PathHolder::with_kind(format!("/jobs/rnd/{}", file_name), false), None)
            .unwrap();
        for (name, (value, is_context)) in &vars {
            crawler.set_var(name.clone(), value.clone(), *is_context);
        }
        for (name, value) in &tags {
            crawler.set_tag(name.clone(), value.clone());
        }

        let restored = classifier.create_from_json(&crawler.to_json().unwrap()).unwrap();

        prop_assert_eq!(restored.type_name(), crawler.type_name());
        prop_assert_eq!(restored.var_names(), crawler.var_names());
        prop_assert_eq!(restored.context_var_names(), crawler.context_var_names());
        prop_assert_eq!(restored.tag_names(), crawler.tag_names());
        for name in crawler.var_names() {
            prop_assert_eq!(restored.var(&name).unwrap(), crawler.var(&name).unwrap());
        }
        let restored_tags: BTreeMap<String, Value> = restored
            .tag_names()
            .into_iter()
            .map(|name| {
                let value = restored.tag(&name).unwrap();
                (name, value)
            })
            .collect();
        prop_assert_eq!(restored_tags, tags);
        prop_assert!(restored.parent().is_none());
    }
}
