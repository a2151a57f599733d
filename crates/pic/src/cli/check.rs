//! The `pic check` command: verify stored checksums against the files.

use pic_core::worker::sha1_of_file;

/// Returns exit code 1 when any negative is missing or corrupted.
pub fn execute(repo: &str) -> anyhow::Result<u8> {
    let (loaded, _conn, root) = super::open_local(repo)?;

    let mut bad = 0usize;
    let mut checked = 0usize;
    for picture in loaded.index.iter() {
        let Some(stored) = &picture.checksum else {
            tracing::debug!(file = picture.filename(), "no stored checksum, skipped");
            continue;
        };
        checked += 1;
        match sha1_of_file(&root.join(picture.filename())) {
            Ok(actual) if &actual == stored => {}
            Ok(_) => {
                println!("{}: checksum mismatch", picture.filename());
                bad += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                println!("{}: missing", picture.filename());
                bad += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if bad > 0 {
        println!("{bad} of {checked} negative(s) failed verification");
        return Ok(1);
    }
    println!("{checked} negative(s) verified");
    Ok(0)
}
