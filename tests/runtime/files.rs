//! Integration tests for scene files

use scenefold_folders::FoldersConfig;
use scenefold_foundation::{ErrorKind, PartitionHandle};
use scenefold_runtime::{Scene, from_bytes, load_from_file, save_to_file, to_bytes};

fn level_scene() -> Scene {
    let mut scene = Scene::new(FoldersConfig::deterministic(10));
    let root = scene.folders().root(PartitionHandle::DEFAULT).unwrap();
    let props = scene.emplace_folder(None, root);
    scene.rename_folder(props, "props");
    scene.select_folder(props);
    for _ in 0..3 {
        scene.create_entity();
    }
    scene.select_folder(root);
    scene.create_entity();
    scene
}

#[test]
fn save_and_load_through_a_file() {
    let scene = level_scene();
    let path = std::env::temp_dir().join("scenefold_integration_scene.msgpack");

    save_to_file(&scene, &path).unwrap();
    let restored = load_from_file(&path, FoldersConfig::default()).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(restored.folders().folders(), scene.folders().folders());
    for e in scene.world().entities() {
        assert_eq!(restored.folders().folder_of(e), scene.folders().folder_of(e));
    }
    restored.folders().validate().unwrap();
}

#[test]
fn loaded_scene_keeps_working() {
    let scene = level_scene();
    let mut restored = from_bytes(&to_bytes(&scene).unwrap(), FoldersConfig::default()).unwrap();

    let e = restored.create_entity();
    let selected = restored.folders().selected_folder().unwrap();
    assert_eq!(restored.folders().folder_of(e), Some(selected));
    restored.folders().validate().unwrap();
}

#[test]
fn merge_then_unload() {
    let bytes = to_bytes(&level_scene()).unwrap();
    let mut scene = Scene::new(FoldersConfig::deterministic(11));
    let own = scene.create_entity();

    let loaded = scene.load_additive(&bytes).unwrap();
    assert_eq!(scene.world().entity_count(), 5);
    let [partition] = loaded.partitions[..] else {
        panic!("expected one partition, got {:?}", loaded.partitions);
    };
    let loaded_root = scene.folders().root(partition).unwrap();
    assert_eq!(scene.folders().children(loaded_root).count(), 1);

    scene.destroy_partition(partition).unwrap();

    assert_eq!(scene.world().entity_count(), 1);
    assert!(scene.world().exists(own));
    assert_eq!(scene.folders().len(), 1);
    scene.folders().validate().unwrap();
}

#[test]
fn merged_entities_are_not_filed_in_the_selection() {
    let bytes = to_bytes(&level_scene()).unwrap();
    let mut scene = Scene::new(FoldersConfig::deterministic(12));
    let root = scene.folders().root(PartitionHandle::DEFAULT).unwrap();

    scene.load_additive(&bytes).unwrap();

    assert_eq!(scene.folders().entities(root).count(), 0);
    assert!(!scene.folders().ignores_new_entities());
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_from_file("/nonexistent/scenefold.msgpack", FoldersConfig::default()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IoError(_)));
}
