mod common;

use std::fs;

use petal_classifiers::data_handling::{load_dataset, load_image};
use petal_classifiers::PetalError;

use common::{write_uniform_dataset, BLUE, RED};

#[test]
fn labels_follow_directories_and_stay_aligned() {
    let dir = tempfile::tempdir().unwrap();
    write_uniform_dataset(dir.path(), &[("rose", RED), ("bluebell", BLUE)], 3);
    // stray files at the root are not classes
    fs::write(dir.path().join("README.txt"), "not a class").unwrap();

    let data = load_dataset(dir.path(), (16, 16)).unwrap();
    assert_eq!(data.len(), 6);
    assert_eq!(data.images.len(), data.labels.len());
    assert_eq!(data.num_classes(), 2);
    // sorted directory order
    assert_eq!(&data.labels[..3], &["bluebell", "bluebell", "bluebell"]);
    assert!(data.images.iter().all(|img| img.dimensions() == (16, 16)));

    let blue_px = data.images[0].get_pixel(8, 8).0;
    assert!(blue_px[2] > blue_px[0]);
}

#[test]
fn corrupt_image_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_uniform_dataset(dir.path(), &[("rose", RED)], 2);
    fs::write(dir.path().join("rose").join("broken.jpg"), b"definitely not a jpeg").unwrap();

    let data = load_dataset(dir.path(), (16, 16)).unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data.labels, vec!["rose", "rose"]);
}

#[cfg(unix)]
#[test]
fn unreadable_class_directory_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    write_uniform_dataset(dir.path(), &[("locked", BLUE), ("rose", RED)], 2);
    let locked = dir.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // privileged users can still list the directory
    let listable = fs::read_dir(&locked).is_ok();
    let result = load_dataset(dir.path(), (16, 16));
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let data = result.unwrap();
    if listable {
        assert_eq!(data.len(), 4);
    } else {
        assert_eq!(data.labels, vec!["rose", "rose"]);
    }
}

#[test]
fn missing_root_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_dataset(dir.path().join("nope"), (16, 16)).unwrap_err();
    assert!(matches!(err, PetalError::Io { .. }));
}

#[test]
fn root_without_images_is_empty_dataset() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("empty_class")).unwrap();
    let err = load_dataset(dir.path(), (16, 16)).unwrap_err();
    assert!(matches!(err, PetalError::EmptyDataset(_)));
}

#[test]
fn single_image_loader_checks_extension_and_content() {
    let dir = tempfile::tempdir().unwrap();
    let txt = dir.path().join("notes.txt");
    fs::write(&txt, "hello").unwrap();
    assert!(matches!(
        load_image(&txt, (8, 8)),
        Err(PetalError::UnsupportedImageFormat(_))
    ));

    let fake = dir.path().join("fake.png");
    fs::write(&fake, "hello").unwrap();
    assert!(matches!(load_image(&fake, (8, 8)), Err(PetalError::ImageDecode { .. })));

    let real = dir.path().join("real.PNG");
    common::uniform_image(RED, 0, 20).save_with_format(&real, image::ImageFormat::Png).unwrap();
    assert_eq!(load_image(&real, (8, 8)).unwrap().dimensions(), (8, 8));
}
