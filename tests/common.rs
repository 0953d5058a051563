use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Fixture tree with one matching file at the root, one excluded by
/// extension, and one matching file in a subdirectory.
pub fn create_fixture_tree(root: &Path) -> Vec<PathBuf> {
    let a = root.join("a.png");
    let b = root.join("b.txt");
    let sub = root.join("sub");
    std::fs::create_dir(&sub).unwrap();
    let c = sub.join("c.jpg");

    write_bytes(&a, &vec![0u8; 4096]);
    write_bytes(&b, b"not an image");
    write_bytes(&c, &vec![0u8; 5120]);

    vec![a, b, c]
}

/// Files that no default scan should pick up.
pub fn create_excluded_files(root: &Path) {
    write_bytes(&root.join("notes.txt"), b"plain text");
    write_bytes(&root.join("archive.zip"), b"PK");
    write_bytes(&root.join("noextension"), b"binary");
}

pub fn write_bytes(path: &Path, bytes: &[u8]) {
    let mut file = File::create(path).unwrap();
    file.write_all(bytes).unwrap();
}
