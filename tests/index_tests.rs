use std::fs;
use std::path::Path;

use photo_frame_gallery::index::{FileIndex, md5_hex};
use photo_frame_gallery::schedule::ValidatedRead;
use tempfile::tempdir;

fn seed(root: &Path, rel: &str, bytes: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

#[test]
fn scan_collects_sorted_relative_paths() {
    let tmp = tempdir().unwrap();
    seed(tmp.path(), "2025/08/10/b.jpg", b"b");
    seed(tmp.path(), "2025/08/09/a.png", b"a");
    seed(tmp.path(), "2025/08/10/clip.mp4", b"v");
    seed(tmp.path(), "2025/08/10/notes.txt", b"t");
    seed(tmp.path(), "2025/08/10/.hidden.jpg", b"h");
    seed(tmp.path(), ".cache/thumb.jpg", b"c");

    let index = FileIndex::open(tmp.path()).unwrap();
    assert_eq!(
        index.scan(),
        vec![
            "2025/08/09/a.png".to_string(),
            "2025/08/10/b.jpg".to_string(),
            "2025/08/10/clip.mp4".to_string(),
        ]
    );
}

#[test]
fn owner_table_load_skips_comments_blanks_and_stale_entries() {
    let tmp = tempdir().unwrap();
    seed(tmp.path(), "2025/08/10/kept.jpg", b"k");
    fs::write(
        tmp.path().join(".owners.tsv"),
        "# generated\n\n2025/08/10/kept.jpg\talice\n2025/08/10/gone.jpg\tbob\nmalformed-line\n",
    )
    .unwrap();

    let index = FileIndex::open(tmp.path()).unwrap();
    assert_eq!(index.owner_of("2025/08/10/kept.jpg"), Some("alice"));
    assert_eq!(index.owner_of("2025/08/10/gone.jpg"), None);
}

#[test]
fn table_saves_are_full_sorted_rewrites() {
    let tmp = tempdir().unwrap();
    seed(tmp.path(), "2025/08/10/z.jpg", b"z");
    seed(tmp.path(), "2025/08/10/a.jpg", b"a");

    let mut index = FileIndex::open(tmp.path()).unwrap();
    index.record_owner("2025/08/10/z.jpg", "zoe");
    index.record_owner("2025/08/10/a.jpg", "ann");

    let text = fs::read_to_string(tmp.path().join(".owners.tsv")).unwrap();
    assert_eq!(
        text,
        "2025/08/10/a.jpg\tann\n2025/08/10/z.jpg\tzoe\n"
    );

    index.remove_entry("2025/08/10/a.jpg");
    let text = fs::read_to_string(tmp.path().join(".owners.tsv")).unwrap();
    assert_eq!(text, "2025/08/10/z.jpg\tzoe\n");
}

#[test]
fn first_read_establishes_the_trusted_hash() {
    let tmp = tempdir().unwrap();
    seed(tmp.path(), "2025/08/10/a.jpg", b"payload");

    let mut index = FileIndex::open(tmp.path()).unwrap();
    assert_eq!(index.read_validated("2025/08/10/a.jpg").as_deref(), Some(b"payload".as_slice()));

    let text = fs::read_to_string(tmp.path().join(".hashes.tsv")).unwrap();
    assert_eq!(text, format!("2025/08/10/a.jpg\t{}\n", md5_hex(b"payload")));
}

#[test]
fn recorded_hash_rejects_tampered_content() {
    let tmp = tempdir().unwrap();
    seed(tmp.path(), "2025/08/10/a.jpg", b"payload");

    let mut index = FileIndex::open(tmp.path()).unwrap();
    index.read_validated("2025/08/10/a.jpg").unwrap();

    fs::write(tmp.path().join("2025/08/10/a.jpg"), b"tampered").unwrap();
    assert_eq!(index.read_validated("2025/08/10/a.jpg"), None);
}

#[test]
fn hash_comparison_is_case_insensitive() {
    let tmp = tempdir().unwrap();
    seed(tmp.path(), "2025/08/10/a.jpg", b"payload");
    fs::write(
        tmp.path().join(".hashes.tsv"),
        format!("2025/08/10/a.jpg\t{}\n", md5_hex(b"payload").to_uppercase()),
    )
    .unwrap();

    let mut index = FileIndex::open(tmp.path()).unwrap();
    assert!(index.read_validated("2025/08/10/a.jpg").is_some());
}

#[test]
fn missing_or_blank_paths_read_as_invalid() {
    let tmp = tempdir().unwrap();
    let mut index = FileIndex::open(tmp.path()).unwrap();
    assert_eq!(index.read_validated(""), None);
    assert_eq!(index.read_validated("2025/08/10/nothing.jpg"), None);
}

#[test]
fn find_by_file_name_searches_the_whole_tree() {
    let tmp = tempdir().unwrap();
    seed(tmp.path(), "2025/08/10/deep/nested.jpg", b"n");

    let index = FileIndex::open(tmp.path()).unwrap();
    let found = index.find_by_file_name("nested.jpg").unwrap();
    assert!(found.ends_with("2025/08/10/deep/nested.jpg"));
    assert_eq!(index.find_by_file_name("absent.jpg"), None);
}
