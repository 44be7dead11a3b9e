use tempdir::TempDir;
use vfs_facade::{DirFS, Filesystem};

fn main() {
    // show mutations and cache activity
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let tmp = TempDir::new("hello_vfs").unwrap();
    std::fs::write(tmp.path().join("hello.txt"), b"Hello").unwrap();
    std::fs::write(tmp.path().join("world.txt"), b"World").unwrap();
    println!("Host root: {}", tmp.path().display());

    let fs = Filesystem::new(DirFS::new(tmp.path()).unwrap());

    // creates `<root>/docs` on host; the root listing repopulates on next use
    fs.mkdir("/docs").unwrap();
    fs.rename("/world.txt", "/planet.txt").unwrap();

    for entry in fs.rootdir().unwrap().listing().unwrap() {
        println!(
            "{:<12} {:<10} {:<12} {}",
            entry.leafname(),
            entry.format_filetype(),
            entry.format_size(),
            entry.format_timestamp()
        );
    }

    let first = fs.fileinfo("/hello.txt").unwrap().read_all().unwrap();
    let second = fs.fileinfo("/planet.txt").unwrap().read_all().unwrap();
    println!(
        "{}, {}!",
        String::from_utf8(first).unwrap(),
        String::from_utf8(second).unwrap()
    );

    fs.delete("/docs").unwrap();
    assert!(fs.fileinfo("/docs").unwrap_err().is_not_found());

    // `tmp` removes the host directory when it goes out of scope
}
